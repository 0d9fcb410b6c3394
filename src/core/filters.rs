use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::core::distance::is_within_radius;
use crate::models::{
    ApartmentPreferences, ApartmentProfile, Bounds, RoommatePreferences, RoommateProfile,
};

/// The predicate group that rejected a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Age,
    Gender,
    Occupation,
    Rent,
    Bedrooms,
    Bathrooms,
    Size,
    Details,
    LeaseDuration,
    MoveInDate,
    Radius,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Age => "age",
            Rejection::Gender => "gender",
            Rejection::Occupation => "occupation",
            Rejection::Rent => "rent",
            Rejection::Bedrooms => "bedrooms",
            Rejection::Bathrooms => "bathrooms",
            Rejection::Size => "size",
            Rejection::Details => "details",
            Rejection::LeaseDuration => "lease_duration",
            Rejection::MoveInDate => "move_in_date",
            Rejection::Radius => "radius",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hard filters one party applies to candidates of the opposite population.
///
/// Filtering is directional: `self` holds the filtering party's preferences,
/// `candidate` is the other party's profile.
pub trait CandidateFilter<C> {
    /// First predicate group the candidate fails, if any
    fn check(&self, candidate: &C) -> Option<Rejection>;

    #[inline]
    fn passes(&self, candidate: &C) -> bool {
        self.check(candidate).is_none()
    }
}

/// Whether `candidate` satisfies every constraint in `preferences`
#[inline]
pub fn passes<C, F>(preferences: &F, candidate: &C) -> bool
where
    F: CandidateFilter<C> + ?Sized,
{
    preferences.passes(candidate)
}

impl CandidateFilter<RoommateProfile> for ApartmentPreferences {
    fn check(&self, roommate: &RoommateProfile) -> Option<Rejection> {
        let info = &roommate.personal_info;

        if !within(&self.age_range, info.age) {
            return Some(Rejection::Age);
        }

        if !member_of(&self.genders, info.gender.as_deref()) {
            return Some(Rejection::Gender);
        }

        if !member_of(&self.occupations, info.occupation.as_deref()) {
            return Some(Rejection::Occupation);
        }

        None
    }
}

impl CandidateFilter<ApartmentProfile> for RoommatePreferences {
    fn check(&self, apartment: &ApartmentProfile) -> Option<Rejection> {
        let info = &apartment.info;
        let overview = &self.overview;
        let specs = &info.specifications;

        if !within(&overview.rent_range, info.financials.rent) {
            return Some(Rejection::Rent);
        }
        if !at_least(overview.bedrooms, specs.bedrooms) {
            return Some(Rejection::Bedrooms);
        }
        if !at_least(overview.bathrooms, specs.bathrooms) {
            return Some(Rejection::Bathrooms);
        }
        if !at_least(overview.min_size, specs.size) {
            return Some(Rejection::Size);
        }

        if !details_satisfied(&self.details, &apartment.details) {
            return Some(Rejection::Details);
        }

        let lease = &self.lease_duration;
        if !at_least(lease.duration, info.lease_terms.duration) {
            return Some(Rejection::LeaseDuration);
        }
        // Availability floor: the apartment must not open up before the requested move-in date
        if !at_least(lease.move_in_date, info.lease_terms.available_from) {
            return Some(Rejection::MoveInDate);
        }

        let area = &self.location;
        if let Some(radius) = area.radius {
            let center = area.coordinates.as_ref();
            // Unknown distance passes
            if is_within_radius(center, info.location.coordinates.as_ref(), radius) == Some(false) {
                return Some(Rejection::Radius);
            }
        }

        None
    }
}

/// Absent value or empty bounds pass
#[inline]
fn within<T: PartialOrd + Copy>(bounds: &Bounds<T>, value: Option<T>) -> bool {
    value.map_or(true, |v| bounds.contains(v))
}

/// Empty requirement set passes; a non-empty one needs a present, listed value
#[inline]
fn member_of(required: &BTreeSet<String>, value: Option<&str>) -> bool {
    required.is_empty() || value.is_some_and(|v| required.contains(v))
}

#[inline]
fn at_least<T: PartialOrd>(minimum: Option<T>, value: Option<T>) -> bool {
    match (minimum, value) {
        (Some(min), Some(v)) => v >= min,
        _ => true,
    }
}

fn details_satisfied(required: &BTreeMap<String, bool>, offered: &BTreeMap<String, bool>) -> bool {
    required
        .iter()
        .filter(|(_, wanted)| **wanted)
        .all(|(key, _)| offered.get(key).copied().unwrap_or(false))
}
