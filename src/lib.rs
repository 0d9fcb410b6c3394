//! nestmatch - Apartment and roommate matching service
//!
//! Two populations, apartments and roommates, are matched by scoring the
//! compatibility of their questionnaires and filtering candidates through each
//! party's hard preferences (age, rent, lease terms, search radius, ...).

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{compatibility_score, distance, passes, Action, Interaction, Matcher, Party, Transition};
pub use error::MatchError;
pub use models::{ApartmentProfile, Questionnaire, Resolved, RoommateProfile};
pub use services::{InMemoryProfileStore, ProfileService, ProfileStore};
