// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Activity, Address, Answer, AnswerValue, ApartmentInfo, ApartmentPreferences, ApartmentProfile,
    Bounds, Category, Coordinates, Financials, Headline, LeasePreference, LeaseTerms, Location,
    MatchInfo, MatchView, Overview, PersonalInfo, ProfileId, ProfileKind, Questionnaire,
    QuestionnaireId, Relations, Resolved, RoommatePreferences, RoommateProfile, ScoredCandidate,
    SearchArea, SortKey, Specifications, Suggestion, QUESTIONNAIRES,
};
pub use requests::{ActionQuery, QuestionnaireUpdate, SuggestionsQuery};
pub use responses::{ActionResponse, ErrorResponse, HealthResponse, SuggestionsResponse};
