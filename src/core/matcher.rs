use crate::core::{filters::CandidateFilter, party::Party, scoring::compatibility_score};
use crate::models::{Activity, MatchInfo, MatchView, Resolved, ScoredCandidate, Suggestion};

/// Default cap on the number of suggestions returned per call
pub const DEFAULT_MAX_LIMIT: usize = 100;

/// Result of the suggestion pipeline
#[derive(Debug)]
pub struct SuggestionResult<C> {
    pub suggestions: Vec<Suggestion<C>>,
    pub total_candidates: usize,
}

/// Suggestion orchestrator
///
/// # Pipeline Stages
/// 1. Drop candidates already liked, disliked or matched
/// 2. Apply the acting party's hard filters
/// 3. Score, measure distance and build the sort key
/// 4. Stable sort by score (descending)
///
/// Every call recomputes from the pool it is given; nothing is cached.
#[derive(Debug, Clone)]
pub struct Matcher {
    max_limit: usize,
}

impl Matcher {
    pub fn new(max_limit: usize) -> Self {
        Self {
            max_limit: max_limit.max(1),
        }
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Suggest counterparts for `me` out of `pool`
    ///
    /// # Arguments
    /// * `me` - The acting party, questionnaire resolved
    /// * `pool` - Every candidate of the opposite population
    /// * `limit` - Maximum number of suggestions, capped at the configured maximum
    ///
    /// # Returns
    /// Suggestions ordered by descending score. Ties keep pool order.
    pub fn suggestions<P: Party>(
        &self,
        me: &Resolved<P>,
        pool: Vec<Resolved<P::Counterpart>>,
        limit: Option<usize>,
    ) -> SuggestionResult<P::Counterpart> {
        let total_candidates = pool.len();
        let relations = me.profile.relations();
        let preferences = me.profile.preferences();

        let mut suggestions: Vec<Suggestion<P::Counterpart>> = pool
            .into_iter()
            // Stage 1: already interacted
            .filter(|candidate| !relations.has_interacted(candidate.profile.id()))
            // Stage 2: hard filters
            .filter(|candidate| match preferences.check(&candidate.profile) {
                Some(rejection) => {
                    tracing::trace!(
                        "{} {} rejected {} {}: {}",
                        P::KIND,
                        me.profile.id(),
                        <P::Counterpart as Party>::KIND,
                        candidate.profile.id(),
                        rejection
                    );
                    false
                }
                None => true,
            })
            // Stage 3: score and sort key
            .map(|candidate| {
                let score = compatibility_score(&me.questionnaire, &candidate.questionnaire);
                let sort_option = me.profile.sort_key(&candidate.profile, score);
                Suggestion {
                    candidate: candidate.profile,
                    score,
                    sort_option,
                }
            })
            .collect();

        // Stage 4: stable, score only
        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));

        let limit = limit.unwrap_or(self.max_limit).min(self.max_limit);
        suggestions.truncate(limit);

        tracing::debug!(
            "{} {}: {} suggestions from {} candidates",
            P::KIND,
            me.profile.id(),
            suggestions.len(),
            total_candidates
        );

        SuggestionResult {
            suggestions,
            total_candidates,
        }
    }

    /// Display cards for every matched counterpart, best score first
    pub fn matches<P: Party>(
        &self,
        me: &Resolved<P>,
        matched: Vec<Resolved<P::Counterpart>>,
    ) -> Vec<MatchView<P::Counterpart>> {
        let mut views: Vec<MatchView<P::Counterpart>> = matched
            .into_iter()
            .map(|other| {
                let score = compatibility_score(&me.questionnaire, &other.questionnaire);
                let match_info = MatchInfo {
                    headline: other.profile.headline(),
                    score,
                    distance: me.profile.distance_to(&other.profile),
                };
                MatchView {
                    candidate: other.profile,
                    match_info,
                }
            })
            .collect();

        views.sort_by(|a, b| b.match_info.score.total_cmp(&a.match_info.score));
        views
    }

    /// Liked and disliked counterparts paired with their scores, in list order
    pub fn activity<P: Party>(
        &self,
        me: &Resolved<P>,
        liked: Vec<Resolved<P::Counterpart>>,
        disliked: Vec<Resolved<P::Counterpart>>,
    ) -> Activity<P::Counterpart> {
        let score_all = |profiles: Vec<Resolved<P::Counterpart>>| {
            profiles
                .into_iter()
                .map(|other| ScoredCandidate {
                    score: compatibility_score(&me.questionnaire, &other.questionnaire),
                    candidate: other.profile,
                })
                .collect::<Vec<_>>()
        };

        Activity {
            likes: score_all(liked),
            dislikes: score_all(disliked),
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LIMIT)
    }
}
