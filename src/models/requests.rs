use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::models::domain::{Category, Questionnaire, QuestionnaireId};

/// Query string of the suggestions endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SuggestionsQuery {
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

/// Query string of the actions endpoint: `?action=like|dislike|unlike`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionQuery {
    #[serde(default)]
    pub action: String,
}

/// Replacement answers for the caller's own questionnaire.
///
/// The questionnaire id is never taken from the request; it is always the one
/// referenced by the acting profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionnaireUpdate {
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
}

impl QuestionnaireUpdate {
    pub fn into_questionnaire(self, id: QuestionnaireId) -> Questionnaire {
        Questionnaire {
            id,
            categories: self.categories,
        }
    }
}
