// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod interactions;
pub mod matcher;
pub mod party;
pub mod scoring;

pub use distance::{distance, is_within_radius};
pub use filters::{passes, CandidateFilter, Rejection};
pub use interactions::{Action, Interaction, Transition};
pub use matcher::{Matcher, SuggestionResult};
pub use party::Party;
pub use scoring::{compatibility_score, MAX_SCORE};
