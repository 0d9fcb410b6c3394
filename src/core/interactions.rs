use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MatchError;
use crate::models::{ProfileId, Relations};

/// Interaction verbs a party can issue about a counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Like,
    Dislike,
    Unlike,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Like => "like",
            Action::Dislike => "dislike",
            Action::Unlike => "unlike",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(Action::Like),
            "dislike" => Ok(Action::Dislike),
            "unlike" => Ok(Action::Unlike),
            other => Err(MatchError::InvalidAction(format!(
                "unknown action '{}', expected one of: like, dislike, unlike",
                other
            ))),
        }
    }
}

/// Relationship state of one (self, other) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    Neutral,
    Liked,
    Disliked,
    /// Asserted by reciprocal-like detection; never reached through [`Action`]s
    Matched,
}

/// State before and after an action. `from == to` means nothing changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: Interaction,
    pub to: Interaction,
}

impl Transition {
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

impl Relations {
    pub fn state_of(&self, other: &ProfileId) -> Interaction {
        if self.matches.contains(other) {
            Interaction::Matched
        } else if self.likes.contains(other) {
            Interaction::Liked
        } else if self.dislikes.contains(other) {
            Interaction::Disliked
        } else {
            Interaction::Neutral
        }
    }

    /// Neutral or disliked → liked. Liking twice is a no-op.
    pub fn like(&mut self, other: &ProfileId) -> Result<Transition, MatchError> {
        let from = self.unmatched_state(other, Action::Like)?;
        self.dislikes.remove(other);
        self.likes.insert(other.clone());
        Ok(Transition {
            from,
            to: Interaction::Liked,
        })
    }

    /// Neutral or liked → disliked. Disliking twice is a no-op.
    pub fn dislike(&mut self, other: &ProfileId) -> Result<Transition, MatchError> {
        let from = self.unmatched_state(other, Action::Dislike)?;
        self.likes.remove(other);
        self.dislikes.insert(other.clone());
        Ok(Transition {
            from,
            to: Interaction::Disliked,
        })
    }

    /// Liked → neutral; any other unmatched state is left as is.
    pub fn unlike(&mut self, other: &ProfileId) -> Result<Transition, MatchError> {
        let from = self.unmatched_state(other, Action::Unlike)?;
        let to = if self.likes.remove(other) {
            Interaction::Neutral
        } else {
            from
        };
        Ok(Transition { from, to })
    }

    pub fn apply(&mut self, action: Action, other: &ProfileId) -> Result<Transition, MatchError> {
        match action {
            Action::Like => self.like(other),
            Action::Dislike => self.dislike(other),
            Action::Unlike => self.unlike(other),
        }
    }

    /// Record a mutual match found by reciprocal-like detection.
    ///
    /// Matches are monotone: the id leaves likes/dislikes and stays matched.
    pub fn record_match(&mut self, other: &ProfileId) -> Transition {
        let from = self.state_of(other);
        self.likes.remove(other);
        self.dislikes.remove(other);
        self.matches.insert(other.clone());
        Transition {
            from,
            to: Interaction::Matched,
        }
    }

    fn unmatched_state(&self, other: &ProfileId, action: Action) -> Result<Interaction, MatchError> {
        match self.state_of(other) {
            Interaction::Matched => Err(MatchError::InvalidAction(format!(
                "cannot {} {}: already matched",
                action, other
            ))),
            state => Ok(state),
        }
    }
}
