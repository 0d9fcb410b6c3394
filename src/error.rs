use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors surfaced by matching and interaction operations
#[derive(Debug, Error)]
pub enum MatchError {
    /// A referenced profile or questionnaire does not resolve
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Structurally invalid preferences or questionnaire
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Unrecognized interaction verb, or a verb not allowed in the current state
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Opaque failure at the storage boundary
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl MatchError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        MatchError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::NotFound { .. } => "not_found",
            MatchError::Validation(_) => "validation_error",
            MatchError::InvalidAction(_) => "invalid_action",
            MatchError::Persistence(_) => "persistence_failure",
        }
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::NotFound { .. } => StatusCode::NOT_FOUND,
            MatchError::Validation(_) | MatchError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            MatchError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            MatchError::Persistence(e) => {
                tracing::error!("Persistence failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MatchError::not_found("apartment", "a1").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            MatchError::InvalidAction("wink".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MatchError::Validation(ValidationErrors::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_persistence_message_is_generic() {
        let err = MatchError::Persistence(StoreError::Corrupt("apartments/a1".into()));
        assert_eq!(err.code(), "persistence_failure");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
