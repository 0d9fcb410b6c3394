use std::sync::Arc;
use validator::Validate;

use crate::core::{Action, Matcher, Party, SuggestionResult, Transition};
use crate::error::MatchError;
use crate::models::{Activity, MatchView, ProfileId, Questionnaire, QuestionnaireUpdate, Resolved};
use crate::services::locks::ProfileLocks;
use crate::services::repository::Repository;
use crate::services::store::ProfileStore;

/// Entry point for every read and write a party makes
///
/// Reads recompute from the store on each call. Writes to a profile are
/// serialised through [`ProfileLocks`] and committed with a conditional save,
/// so concurrent requests for the same profile never lose an update.
pub struct ProfileService {
    repository: Repository,
    matcher: Matcher,
    locks: ProfileLocks,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, matcher: Matcher) -> Self {
        Self {
            repository: Repository::new(store),
            matcher,
            locks: ProfileLocks::new(),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Ranked counterparts `me` has not interacted with yet
    pub async fn suggestions<P: Party>(
        &self,
        me: &ProfileId,
        limit: Option<usize>,
    ) -> Result<SuggestionResult<P::Counterpart>, MatchError> {
        let (resolved, pool) = futures::try_join!(
            self.repository.load::<P>(me),
            self.repository.load_all::<P::Counterpart>()
        )?;

        Ok(self.matcher.suggestions(&resolved, pool, limit))
    }

    pub async fn matches<P: Party>(
        &self,
        me: &ProfileId,
    ) -> Result<Vec<MatchView<P::Counterpart>>, MatchError> {
        let resolved = self.repository.load::<P>(me).await?;
        let matched = self
            .repository
            .load_many::<P::Counterpart>(resolved.profile.relations().matches())
            .await?;

        Ok(self.matcher.matches(&resolved, matched))
    }

    pub async fn activity<P: Party>(
        &self,
        me: &ProfileId,
    ) -> Result<Activity<P::Counterpart>, MatchError> {
        let resolved = self.repository.load::<P>(me).await?;
        let relations = resolved.profile.relations();
        let (liked, disliked) = futures::try_join!(
            self.repository.load_many::<P::Counterpart>(relations.likes()),
            self.repository.load_many::<P::Counterpart>(relations.dislikes())
        )?;

        Ok(self.matcher.activity(&resolved, liked, disliked))
    }

    /// Apply a like/dislike/unlike from `me` towards `target`
    pub async fn act<P: Party>(
        &self,
        me: &ProfileId,
        target: &ProfileId,
        action: Action,
    ) -> Result<Transition, MatchError> {
        let _guard = self.locks.acquire(P::KIND, me).await;

        let mut resolved = self.repository.load::<P>(me).await?;
        if !self.repository.exists::<P::Counterpart>(target).await? {
            return Err(MatchError::not_found(
                <P::Counterpart as Party>::KIND.as_str(),
                target,
            ));
        }

        let transition = resolved.profile.relations_mut().apply(action, target)?;
        if transition.is_change() {
            self.repository.commit(&mut resolved).await?;
        }

        tracing::info!(
            "{} {} {} {} {}: {:?} -> {:?}",
            P::KIND,
            me,
            action,
            <P::Counterpart as Party>::KIND,
            target,
            transition.from,
            transition.to
        );

        Ok(transition)
    }

    /// Replace the hard filters of `me`
    pub async fn update_preferences<P: Party>(
        &self,
        me: &ProfileId,
        preferences: P::Preferences,
    ) -> Result<P, MatchError> {
        preferences.validate()?;

        let _guard = self.locks.acquire(P::KIND, me).await;
        let mut resolved: Resolved<P> = self.repository.load(me).await?;
        resolved.profile.set_preferences(preferences);
        self.repository.commit(&mut resolved).await?;

        tracing::info!("{} {} updated preferences", P::KIND, me);
        Ok(resolved.profile)
    }

    /// Replace the answers of the questionnaire `me` references
    pub async fn update_questionnaire<P: Party>(
        &self,
        me: &ProfileId,
        update: QuestionnaireUpdate,
    ) -> Result<Questionnaire, MatchError> {
        let _guard = self.locks.acquire(P::KIND, me).await;
        let resolved: Resolved<P> = self.repository.load(me).await?;
        let id = resolved.profile.questionnaire_id().clone();

        let questionnaire = update.into_questionnaire(id.clone());
        questionnaire.validate()?;

        let (_, version) = self
            .repository
            .questionnaire(&id)
            .await?
            .ok_or_else(|| MatchError::not_found("questionnaire", &id))?;
        self.repository
            .commit_questionnaire(&questionnaire, version)
            .await?;

        tracing::info!("{} {} updated questionnaire {}", P::KIND, me, id);
        Ok(questionnaire)
    }
}
