use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::{ValidationError, ValidationErrors};

use crate::core::Party;
use crate::error::MatchError;
use crate::models::{ProfileId, Questionnaire, QuestionnaireId, Resolved, QUESTIONNAIRES};
use crate::services::store::{Document, ProfileStore, StoreError, NEW_DOCUMENT};

/// Typed access to profiles and questionnaires on top of a [`ProfileStore`]
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn ProfileStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    /// Load a profile and resolve its questionnaire
    pub async fn load<P: Party>(&self, id: &ProfileId) -> Result<Resolved<P>, MatchError> {
        let document = self
            .store
            .fetch(P::KIND.collection(), id.as_str())
            .await?
            .ok_or_else(|| MatchError::not_found(P::KIND.as_str(), id))?;

        let profile: P = decode(P::KIND.collection(), &document)?;
        let (questionnaire, _) = self
            .questionnaire(profile.questionnaire_id())
            .await?
            .ok_or_else(|| MatchError::not_found("questionnaire", profile.questionnaire_id()))?;

        Ok(Resolved {
            profile,
            questionnaire,
            version: document.version,
        })
    }

    /// Load the profiles behind a set of references, in id order.
    ///
    /// References to profiles (or questionnaires) that no longer exist are
    /// skipped rather than failing the whole view.
    pub async fn load_many<P: Party>(
        &self,
        ids: &BTreeSet<ProfileId>,
    ) -> Result<Vec<Resolved<P>>, MatchError> {
        let loaded = try_join_all(ids.iter().map(|id| async move {
            match self.load::<P>(id).await {
                Ok(resolved) => Ok(Some(resolved)),
                Err(MatchError::NotFound { kind, id: missing }) => {
                    tracing::warn!("Skipping {} {}: {} {} not found", P::KIND, id, kind, missing);
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }))
        .await?;

        Ok(loaded.into_iter().flatten().collect())
    }

    /// Load a whole population with questionnaires resolved concurrently
    pub async fn load_all<P: Party>(&self) -> Result<Vec<Resolved<P>>, MatchError> {
        let documents = self.store.fetch_all(P::KIND.collection()).await?;

        let resolved = try_join_all(
            documents
                .into_iter()
                .map(|document| self.resolve_document::<P>(document)),
        )
        .await?;

        Ok(resolved.into_iter().flatten().collect())
    }

    async fn resolve_document<P: Party>(
        &self,
        document: Document,
    ) -> Result<Option<Resolved<P>>, MatchError> {
        let profile: P = decode(P::KIND.collection(), &document)?;
        match self.questionnaire(profile.questionnaire_id()).await? {
            Some((questionnaire, _)) => Ok(Some(Resolved {
                profile,
                questionnaire,
                version: document.version,
            })),
            None => {
                tracing::warn!(
                    "Skipping {} {}: questionnaire {} not found",
                    P::KIND,
                    profile.id(),
                    profile.questionnaire_id()
                );
                Ok(None)
            }
        }
    }

    pub async fn exists<P: Party>(&self, id: &ProfileId) -> Result<bool, MatchError> {
        Ok(self
            .store
            .fetch(P::KIND.collection(), id.as_str())
            .await?
            .is_some())
    }

    /// Persist a mutated profile, conditional on the version it was loaded at
    pub async fn commit<P: Party>(&self, resolved: &mut Resolved<P>) -> Result<(), MatchError> {
        let body = serde_json::to_value(&resolved.profile).map_err(StoreError::from)?;
        resolved.version = self
            .store
            .save(
                P::KIND.collection(),
                resolved.profile.id().as_str(),
                body,
                resolved.version,
            )
            .await?;
        Ok(())
    }

    /// A questionnaire and its stored version
    pub async fn questionnaire(
        &self,
        id: &QuestionnaireId,
    ) -> Result<Option<(Questionnaire, u64)>, MatchError> {
        match self.store.fetch(QUESTIONNAIRES, id.as_str()).await? {
            Some(document) => {
                let questionnaire = decode(QUESTIONNAIRES, &document)?;
                Ok(Some((questionnaire, document.version)))
            }
            None => Ok(None),
        }
    }

    pub async fn commit_questionnaire(
        &self,
        questionnaire: &Questionnaire,
        expected_version: u64,
    ) -> Result<u64, MatchError> {
        let version = self
            .store
            .save(
                QUESTIONNAIRES,
                questionnaire.id.as_str(),
                encode(questionnaire)?,
                expected_version,
            )
            .await?;
        Ok(version)
    }

    /// Store a brand new profile together with its questionnaire.
    ///
    /// An existing profile is rejected before anything is written. If the
    /// profile write still fails, the questionnaire written for it is removed
    /// again.
    pub async fn insert<P: Party>(
        &self,
        profile: &P,
        questionnaire: &Questionnaire,
    ) -> Result<Resolved<P>, MatchError> {
        if questionnaire.id != *profile.questionnaire_id() {
            let mut error = ValidationError::new("questionnaire_mismatch");
            error.message = Some(Cow::Owned(format!(
                "{} {} references questionnaire {}, got {}",
                P::KIND,
                profile.id(),
                profile.questionnaire_id(),
                questionnaire.id
            )));
            let mut errors = ValidationErrors::new();
            errors.add("questionnaire", error);
            return Err(errors.into());
        }

        let collection = P::KIND.collection();
        if let Some(existing) = self.store.fetch(collection, profile.id().as_str()).await? {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: profile.id().to_string(),
                expected: NEW_DOCUMENT,
                found: Some(existing.version),
            }
            .into());
        }

        let body = encode(profile)?;
        let questionnaire_version = self.commit_questionnaire(questionnaire, NEW_DOCUMENT).await?;

        let version = match self
            .store
            .save(collection, profile.id().as_str(), body, NEW_DOCUMENT)
            .await
        {
            Ok(version) => version,
            Err(e) => {
                if let Err(cleanup) = self
                    .store
                    .remove(QUESTIONNAIRES, questionnaire.id.as_str(), questionnaire_version)
                    .await
                {
                    tracing::error!(
                        "Failed to remove questionnaire {} after failed insert of {} {}: {}",
                        questionnaire.id,
                        P::KIND,
                        profile.id(),
                        cleanup
                    );
                }
                return Err(e.into());
            }
        };

        tracing::debug!("Inserted {} {}", P::KIND, profile.id());

        Ok(Resolved {
            profile: profile.clone(),
            questionnaire: questionnaire.clone(),
            version,
        })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, StoreError> {
    Ok(serde_json::to_value(value)?)
}

fn decode<T: DeserializeOwned>(collection: &str, document: &Document) -> Result<T, StoreError> {
    serde_json::from_value(document.body.clone())
        .map_err(|e| StoreError::Corrupt(format!("{}/{}: {}", collection, document.id, e)))
}
