use serde::{Deserialize, Serialize};

use crate::core::interactions::{Action, Interaction, Transition};
use crate::models::domain::{ProfileId, Suggestion};

/// Response for the suggestions endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsResponse<C> {
    pub suggestions: Vec<Suggestion<C>>,
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Result of a like/dislike/unlike request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub message: String,
    pub action: Action,
    pub target_id: ProfileId,
    pub previous: Interaction,
    pub current: Interaction,
    pub changed: bool,
}

impl ActionResponse {
    pub fn new(action: Action, target_id: ProfileId, transition: Transition) -> Self {
        let message = if transition.is_change() {
            "Action successful"
        } else {
            "Nothing to change"
        };
        Self {
            message: message.to_string(),
            action,
            target_id,
            previous: transition.from,
            current: transition.to,
            changed: transition.is_change(),
        }
    }
}
