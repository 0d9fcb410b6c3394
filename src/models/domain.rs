use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use validator::{Validate, ValidationError, ValidationErrors};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of an apartment or roommate profile
    ProfileId
);
string_id!(
    /// Identifier of a questionnaire document
    QuestionnaireId
);

/// Which population a profile belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Apartment,
    Roommate,
}

impl ProfileKind {
    /// Document collection holding profiles of this kind
    pub fn collection(&self) -> &'static str {
        match self {
            ProfileKind::Apartment => "apartments",
            ProfileKind::Roommate => "roommates",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Apartment => "apartment",
            ProfileKind::Roommate => "roommate",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection holding questionnaire documents
pub const QUESTIONNAIRES: &str = "questionnaires";

/// Latitude/longitude-like pair. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates(pub [f64; 2]);

impl Coordinates {
    pub fn new(first: f64, second: f64) -> Self {
        Self([first, second])
    }

    fn is_finite(&self) -> bool {
        self.0.iter().all(|c| c.is_finite())
    }
}

/// Inclusive range where either end may be left open
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    #[inline]
    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if min > max)
    }
}

// ---------------------------------------------------------------------------
// Questionnaire
// ---------------------------------------------------------------------------

/// The value side of a questionnaire answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Choices(Vec<String>),
}

/// A single sub-attribute answer together with how much its owner cares about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub value: AnswerValue,
    #[serde(default = "default_importance")]
    pub importance: f64,
}

fn default_importance() -> f64 {
    1.0
}

impl Answer {
    pub fn new(value: AnswerValue, importance: f64) -> Self {
        Self { value, importance }
    }
}

/// Sub-attribute name to answer
pub type Category = BTreeMap<String, Answer>;

/// Structured questionnaire: category name to weighted sub-attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: QuestionnaireId,
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
}

impl Questionnaire {
    pub fn new(id: QuestionnaireId) -> Self {
        Self {
            id,
            categories: BTreeMap::new(),
        }
    }

    /// Builder-style insert of a single answer
    pub fn with_answer(
        mut self,
        category: &str,
        attribute: &str,
        value: AnswerValue,
        importance: f64,
    ) -> Self {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(attribute.to_string(), Answer::new(value, importance));
        self
    }
}

impl Validate for Questionnaire {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (name, category) in &self.categories {
            if name.trim().is_empty() {
                errors.add("categories", invalid("empty_name", "category names must not be empty".into()));
            }
            for (attribute, answer) in category {
                if attribute.trim().is_empty() {
                    errors.add(
                        "categories",
                        invalid("empty_name", format!("{name}: attribute names must not be empty")),
                    );
                }
                if !answer.importance.is_finite() || answer.importance < 0.0 {
                    errors.add(
                        "importance",
                        invalid(
                            "importance",
                            format!("{name}.{attribute}: importance must be a finite, non-negative number"),
                        ),
                    );
                }
                if let AnswerValue::Number(n) = answer.value {
                    if !n.is_finite() {
                        errors.add(
                            "value",
                            invalid("value", format!("{name}.{attribute}: numeric answers must be finite")),
                        );
                    }
                }
            }
        }

        into_result(errors)
    }
}

// ---------------------------------------------------------------------------
// Relationship sets
// ---------------------------------------------------------------------------

/// A party's likes, dislikes and matches over the opposite population.
///
/// The three sets are pairwise disjoint. Mutation goes through the interaction
/// transitions in `core::interactions`; deserialization rejects overlapping lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RelationLists", into = "RelationLists")]
pub struct Relations {
    pub(crate) likes: BTreeSet<ProfileId>,
    pub(crate) dislikes: BTreeSet<ProfileId>,
    pub(crate) matches: BTreeSet<ProfileId>,
}

impl Relations {
    pub fn likes(&self) -> &BTreeSet<ProfileId> {
        &self.likes
    }

    pub fn dislikes(&self) -> &BTreeSet<ProfileId> {
        &self.dislikes
    }

    pub fn matches(&self) -> &BTreeSet<ProfileId> {
        &self.matches
    }

    /// Whether `other` already appears in any of the three sets
    pub fn has_interacted(&self, other: &ProfileId) -> bool {
        self.likes.contains(other) || self.dislikes.contains(other) || self.matches.contains(other)
    }
}

/// Stored form of [`Relations`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationLists {
    #[serde(default)]
    pub likes: Vec<ProfileId>,
    #[serde(default)]
    pub dislikes: Vec<ProfileId>,
    #[serde(default)]
    pub matches: Vec<ProfileId>,
}

impl TryFrom<RelationLists> for Relations {
    type Error = String;

    fn try_from(lists: RelationLists) -> Result<Self, Self::Error> {
        let likes: BTreeSet<_> = lists.likes.into_iter().collect();
        let dislikes: BTreeSet<_> = lists.dislikes.into_iter().collect();
        let matches: BTreeSet<_> = lists.matches.into_iter().collect();

        let overlap = likes
            .intersection(&dislikes)
            .chain(likes.intersection(&matches))
            .chain(dislikes.intersection(&matches))
            .next();
        if let Some(id) = overlap {
            return Err(format!("profile {id} appears in more than one relationship list"));
        }

        Ok(Self {
            likes,
            dislikes,
            matches,
        })
    }
}

impl From<Relations> for RelationLists {
    fn from(relations: Relations) -> Self {
        Self {
            likes: relations.likes.into_iter().collect(),
            dislikes: relations.dislikes.into_iter().collect(),
            matches: relations.matches.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Apartment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    #[serde(default)]
    pub rent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specifications {
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub bathrooms: Option<u8>,
    #[serde(default)]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseTerms {
    /// Lease length in months
    #[serde(default)]
    pub duration: Option<u16>,
    #[serde(default)]
    pub available_from: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentInfo {
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub financials: Financials,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub lease_terms: LeaseTerms,
    #[serde(default)]
    pub images: Vec<String>,
}

/// An apartment looking for roommates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentProfile {
    pub id: ProfileId,
    #[serde(default)]
    pub info: ApartmentInfo,
    /// Feature flags such as `petsAllowed` or `furnished`
    #[serde(default)]
    pub details: BTreeMap<String, bool>,
    pub questionnaire: QuestionnaireId,
    #[serde(default)]
    pub preferences: ApartmentPreferences,
    #[serde(default)]
    pub relations: Relations,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ApartmentProfile {
    pub fn new(id: ProfileId, questionnaire: QuestionnaireId) -> Self {
        Self {
            id,
            info: ApartmentInfo::default(),
            details: BTreeMap::new(),
            questionnaire,
            preferences: ApartmentPreferences::default(),
            relations: Relations::default(),
            created_at: Some(Utc::now()),
        }
    }
}

/// What an apartment requires of roommates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApartmentPreferences {
    #[serde(default)]
    pub age_range: Bounds<u8>,
    #[serde(default, alias = "gender")]
    pub genders: BTreeSet<String>,
    #[serde(default)]
    pub occupations: BTreeSet<String>,
}

impl Validate for ApartmentPreferences {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.age_range.is_inverted() {
            errors.add("ageRange", invalid("range", "ageRange min must not exceed max".into()));
        }
        into_result(errors)
    }
}

// ---------------------------------------------------------------------------
// Roommate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
}

/// A person looking for an apartment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoommateProfile {
    pub id: ProfileId,
    pub name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub personal_info: PersonalInfo,
    pub questionnaire: QuestionnaireId,
    #[serde(default)]
    pub preferences: RoommatePreferences,
    #[serde(default)]
    pub relations: Relations,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RoommateProfile {
    pub fn new(id: ProfileId, name: impl Into<String>, questionnaire: QuestionnaireId) -> Self {
        Self {
            id,
            name: name.into(),
            profile_picture: None,
            personal_info: PersonalInfo::default(),
            questionnaire,
            preferences: RoommatePreferences::default(),
            relations: Relations::default(),
            created_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    #[serde(default)]
    pub rent_range: Bounds<f64>,
    #[serde(default)]
    pub bedrooms: Option<u8>,
    #[serde(default)]
    pub bathrooms: Option<u8>,
    #[serde(default)]
    pub min_size: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeasePreference {
    /// Minimum lease length in months
    #[serde(default)]
    pub duration: Option<u16>,
    #[serde(default, alias = "moveInDateStart")]
    pub move_in_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchArea {
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub radius: Option<f64>,
}

/// What a roommate requires of apartments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoommatePreferences {
    #[serde(default)]
    pub overview: Overview,
    /// Apartment details that must be present; `false` entries impose nothing
    #[serde(default)]
    pub details: BTreeMap<String, bool>,
    #[serde(default)]
    pub lease_duration: LeasePreference,
    #[serde(default)]
    pub location: SearchArea,
}

impl Validate for RoommatePreferences {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let overview = &self.overview;

        if overview.rent_range.is_inverted() {
            errors.add("rentRange", invalid("range", "rentRange min must not exceed max".into()));
        }
        let rent_ends = [overview.rent_range.min, overview.rent_range.max];
        if rent_ends.iter().flatten().any(|v| !v.is_finite() || *v < 0.0) {
            errors.add("rentRange", invalid("range", "rent bounds must be finite and non-negative".into()));
        }
        if overview.min_size.is_some_and(|s| !s.is_finite() || s < 0.0) {
            errors.add("minSize", invalid("range", "minSize must be finite and non-negative".into()));
        }
        if self.location.radius.is_some_and(|r| !r.is_finite() || r < 0.0) {
            errors.add("radius", invalid("range", "radius must be finite and non-negative".into()));
        }
        if self.location.coordinates.is_some_and(|c| !c.is_finite()) {
            errors.add("coordinates", invalid("coordinates", "coordinates must be finite".into()));
        }

        into_result(errors)
    }
}

// ---------------------------------------------------------------------------
// Pipeline output
// ---------------------------------------------------------------------------

/// A profile with its questionnaire dereferenced and the store version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<P> {
    pub profile: P,
    pub questionnaire: Questionnaire,
    pub version: u64,
}

/// Secondary fields exposed for client-side re-sorting.
///
/// Which fields are populated depends on the viewing side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SortKey {
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Suggestion pipeline entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion<C> {
    pub candidate: C,
    pub score: f64,
    pub sort_option: SortKey,
}

/// Display card for a matched counterpart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub image: Option<String>,
    pub title: String,
    pub sub_title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    #[serde(flatten)]
    pub headline: Headline,
    pub score: f64,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView<C> {
    #[serde(rename = "match")]
    pub candidate: C,
    pub match_info: MatchInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate<C> {
    pub candidate: C,
    pub score: f64,
}

/// Liked and disliked counterparts with their scores
#[derive(Debug, Clone, Serialize)]
pub struct Activity<C> {
    pub likes: Vec<ScoredCandidate<C>>,
    pub dislikes: Vec<ScoredCandidate<C>>,
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
