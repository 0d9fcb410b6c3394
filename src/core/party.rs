use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use validator::Validate;

use crate::core::distance::distance;
use crate::core::filters::CandidateFilter;
use crate::models::{
    ApartmentPreferences, ApartmentProfile, Headline, ProfileId, ProfileKind, QuestionnaireId,
    Relations, RoommatePreferences, RoommateProfile, SortKey,
};

/// One side of the two-sided market.
///
/// Implemented by [`ApartmentProfile`] (whose counterparts are roommates) and
/// [`RoommateProfile`] (whose counterparts are apartments), so that the
/// pipeline, the services and the routes are written once.
pub trait Party: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Profiles this party is matched against
    type Counterpart: Party;

    /// Hard filters this party applies to its counterparts
    type Preferences: CandidateFilter<Self::Counterpart>
        + Validate
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    const KIND: ProfileKind;

    fn id(&self) -> &ProfileId;

    fn questionnaire_id(&self) -> &QuestionnaireId;

    fn relations(&self) -> &Relations;

    fn relations_mut(&mut self) -> &mut Relations;

    fn preferences(&self) -> &Self::Preferences;

    fn set_preferences(&mut self, preferences: Self::Preferences);

    /// Proximity signal from this party's point of view, when both ends are known
    fn distance_to(&self, candidate: &Self::Counterpart) -> Option<f64>;

    /// Secondary sort fields this party's client can re-sort suggestions by
    fn sort_key(&self, candidate: &Self::Counterpart, score: f64) -> SortKey;

    /// How this profile is presented to a party it matched with
    fn headline(&self) -> Headline;
}

impl Party for ApartmentProfile {
    type Counterpart = RoommateProfile;
    type Preferences = ApartmentPreferences;

    const KIND: ProfileKind = ProfileKind::Apartment;

    fn id(&self) -> &ProfileId {
        &self.id
    }

    fn questionnaire_id(&self) -> &QuestionnaireId {
        &self.questionnaire
    }

    fn relations(&self) -> &Relations {
        &self.relations
    }

    fn relations_mut(&mut self) -> &mut Relations {
        &mut self.relations
    }

    fn preferences(&self) -> &ApartmentPreferences {
        &self.preferences
    }

    fn set_preferences(&mut self, preferences: ApartmentPreferences) {
        self.preferences = preferences;
    }

    fn distance_to(&self, _roommate: &RoommateProfile) -> Option<f64> {
        // Roommates carry no location of their own
        None
    }

    fn sort_key(&self, roommate: &RoommateProfile, score: f64) -> SortKey {
        SortKey {
            score,
            age: roommate.personal_info.age,
            date: roommate.created_at.map(|at| at.date_naive()),
            ..SortKey::default()
        }
    }

    fn headline(&self) -> Headline {
        let address = &self.info.location.address;
        let title = [address.street.as_deref(), address.city.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        let sub_title = self
            .info
            .financials
            .rent
            .map(|rent| format!("{} / month", rent))
            .unwrap_or_default();

        Headline {
            image: self.info.images.first().cloned(),
            title,
            sub_title,
        }
    }
}

impl Party for RoommateProfile {
    type Counterpart = ApartmentProfile;
    type Preferences = RoommatePreferences;

    const KIND: ProfileKind = ProfileKind::Roommate;

    fn id(&self) -> &ProfileId {
        &self.id
    }

    fn questionnaire_id(&self) -> &QuestionnaireId {
        &self.questionnaire
    }

    fn relations(&self) -> &Relations {
        &self.relations
    }

    fn relations_mut(&mut self) -> &mut Relations {
        &mut self.relations
    }

    fn preferences(&self) -> &RoommatePreferences {
        &self.preferences
    }

    fn set_preferences(&mut self, preferences: RoommatePreferences) {
        self.preferences = preferences;
    }

    fn distance_to(&self, apartment: &ApartmentProfile) -> Option<f64> {
        distance(
            self.preferences.location.coordinates.as_ref(),
            apartment.info.location.coordinates.as_ref(),
        )
    }

    fn sort_key(&self, apartment: &ApartmentProfile, score: f64) -> SortKey {
        SortKey {
            score,
            rent: apartment.info.financials.rent,
            distance: self.distance_to(apartment),
            date: apartment.info.lease_terms.available_from,
            ..SortKey::default()
        }
    }

    fn headline(&self) -> Headline {
        Headline {
            image: self.profile_picture.clone(),
            title: self.name.clone(),
            sub_title: self
                .personal_info
                .age
                .map(|age| format!("{} years old", age))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use chrono::NaiveDate;

    #[test]
    fn test_roommate_sort_key_exposes_rent_distance_date() {
        let mut roommate = RoommateProfile::new("r1".into(), "Noa", "qr".into());
        roommate.preferences.location.coordinates = Some(Coordinates::new(1.0, 1.0));

        let mut apartment = ApartmentProfile::new("a1".into(), "qa".into());
        apartment.info.financials.rent = Some(4200.0);
        apartment.info.location.coordinates = Some(Coordinates::new(1.5, 2.0));
        apartment.info.lease_terms.available_from = NaiveDate::from_ymd_opt(2024, 7, 1);

        let key = roommate.sort_key(&apartment, 77.0);
        assert_eq!(key.score, 77.0);
        assert_eq!(key.rent, Some(4200.0));
        assert_eq!(key.distance, Some(1.5));
        assert_eq!(key.date, NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(key.age, None);
    }

    #[test]
    fn test_apartment_sort_key_exposes_age() {
        let apartment = ApartmentProfile::new("a1".into(), "qa".into());
        let mut roommate = RoommateProfile::new("r1".into(), "Noa", "qr".into());
        roommate.personal_info.age = Some(27);

        let key = apartment.sort_key(&roommate, 50.0);
        assert_eq!(key.age, Some(27));
        assert!(key.date.is_some());
        assert_eq!(key.distance, None);
    }

    #[test]
    fn test_headlines() {
        let mut apartment = ApartmentProfile::new("a1".into(), "qa".into());
        apartment.info.location.address.street = Some("Dizengoff 100".into());
        apartment.info.location.address.city = Some("Tel Aviv".into());
        apartment.info.financials.rent = Some(5000.0);
        apartment.info.images = vec!["img-1".into(), "img-2".into()];

        let headline = apartment.headline();
        assert_eq!(headline.title, "Dizengoff 100, Tel Aviv");
        assert_eq!(headline.sub_title, "5000 / month");
        assert_eq!(headline.image.as_deref(), Some("img-1"));

        let mut roommate = RoommateProfile::new("r1".into(), "Noa", "qr".into());
        roommate.personal_info.age = Some(29);
        assert_eq!(roommate.headline().sub_title, "29 years old");
    }
}
