// Unit tests for the nestmatch core

use chrono::NaiveDate;
use nestmatch::core::{
    compatibility_score, distance, is_within_radius, passes, Action, CandidateFilter, Interaction,
    Matcher, Rejection, MAX_SCORE,
};
use nestmatch::models::{
    AnswerValue, ApartmentPreferences, ApartmentProfile, Bounds, Coordinates, ProfileId,
    Questionnaire, Relations, Resolved, RoommatePreferences, RoommateProfile,
};

fn create_roommate(id: &str, age: u8, occupation: &str) -> RoommateProfile {
    let mut roommate = RoommateProfile::new(ProfileId::from(id), format!("User {}", id), format!("q-{}", id).into());
    roommate.personal_info.age = Some(age);
    roommate.personal_info.occupation = Some(occupation.to_string());
    roommate
}

fn create_apartment(id: &str, rent: f64, coordinates: Coordinates) -> ApartmentProfile {
    let mut apartment = ApartmentProfile::new(ProfileId::from(id), format!("q-{}", id).into());
    apartment.info.financials.rent = Some(rent);
    apartment.info.specifications.bedrooms = Some(2);
    apartment.info.lease_terms.duration = Some(12);
    apartment.info.lease_terms.available_from = NaiveDate::from_ymd_opt(2024, 9, 1);
    apartment.info.location.coordinates = Some(coordinates);
    apartment
}

fn questionnaire(id: &str, smoker: bool, cleanliness: f64) -> Questionnaire {
    Questionnaire::new(id.into())
        .with_answer("lifestyle", "smoker", AnswerValue::Flag(smoker), 2.0)
        .with_answer("lifestyle", "cleanliness", AnswerValue::Number(cleanliness), 1.0)
}

#[test]
fn test_distance_properties() {
    let a = Coordinates::new(32.0, 34.5);
    let b = Coordinates::new(31.5, 35.0);

    assert_eq!(distance(Some(&a), Some(&a)), Some(0.0));
    assert_eq!(distance(Some(&a), Some(&b)), distance(Some(&b), Some(&a)));
    assert_eq!(distance(Some(&a), Some(&b)), Some(1.0));
    assert_eq!(distance(None, Some(&b)), None);
    assert_eq!(distance(Some(&a), None), None);
}

#[test]
fn test_radius_unknown_when_point_missing() {
    let center = Coordinates::new(0.0, 0.0);
    assert_eq!(is_within_radius(Some(&center), Some(&Coordinates::new(1.0, 1.0)), 2.0), Some(true));
    assert_eq!(is_within_radius(Some(&center), Some(&Coordinates::new(2.0, 1.0)), 2.0), Some(false));
    assert_eq!(is_within_radius(Some(&center), None, 2.0), None);
}

#[test]
fn test_empty_preferences_pass_everything() {
    let roommate = create_roommate("r1", 60, "pilot");
    assert!(passes(&ApartmentPreferences::default(), &roommate));

    let apartment = create_apartment("a1", 99_999.0, Coordinates::new(10.0, 10.0));
    assert!(passes(&RoommatePreferences::default(), &apartment));
}

#[test]
fn test_age_out_of_range_fails_regardless_of_occupation() {
    let preferences = ApartmentPreferences {
        age_range: Bounds::new(25, 35),
        occupations: ["engineer".to_string()].into_iter().collect(),
        ..ApartmentPreferences::default()
    };

    let too_old = create_roommate("r1", 40, "engineer");
    assert!(!passes(&preferences, &too_old));
    assert_eq!(preferences.check(&too_old), Some(Rejection::Age));

    let fits = create_roommate("r2", 30, "engineer");
    assert!(passes(&preferences, &fits));

    let wrong_job = create_roommate("r3", 30, "designer");
    assert_eq!(preferences.check(&wrong_job), Some(Rejection::Occupation));
}

#[test]
fn test_single_violated_range_fails() {
    let apartment = create_apartment("a1", 4000.0, Coordinates::new(32.0, 34.8));

    let mut preferences = RoommatePreferences::default();
    preferences.overview.rent_range = Bounds::new(2000.0, 3500.0);
    assert_eq!(preferences.check(&apartment), Some(Rejection::Rent));

    preferences.overview.rent_range = Bounds::new(2000.0, 4000.0);
    assert!(passes(&preferences, &apartment));

    preferences.overview.bedrooms = Some(3);
    assert_eq!(preferences.check(&apartment), Some(Rejection::Bedrooms));
}

#[test]
fn test_radius_filter() {
    let apartment = create_apartment("a1", 3000.0, Coordinates::new(32.0, 34.8));

    let mut preferences = RoommatePreferences::default();
    preferences.location.coordinates = Some(Coordinates::new(32.1, 34.7));
    preferences.location.radius = Some(0.5);
    assert!(passes(&preferences, &apartment));

    preferences.location.radius = Some(0.1);
    assert_eq!(preferences.check(&apartment), Some(Rejection::Radius));

    let mut unlocated = apartment.clone();
    unlocated.info.location.coordinates = None;
    assert!(passes(&preferences, &unlocated));
}

#[test]
fn test_move_in_floor() {
    let apartment = create_apartment("a1", 3000.0, Coordinates::new(0.0, 0.0));

    let mut preferences = RoommatePreferences::default();
    preferences.lease_duration.move_in_date = NaiveDate::from_ymd_opt(2024, 8, 1);
    assert!(passes(&preferences, &apartment));

    preferences.lease_duration.move_in_date = NaiveDate::from_ymd_opt(2024, 10, 1);
    assert_eq!(preferences.check(&apartment), Some(Rejection::MoveInDate));
}

#[test]
fn test_score_symmetry_and_self_maximum() {
    let a = questionnaire("a", false, 5.0)
        .with_answer("social", "hobbies", AnswerValue::Choices(vec!["climbing".into(), "cooking".into()]), 1.5);
    let b = questionnaire("b", true, 3.0)
        .with_answer("social", "hobbies", AnswerValue::Choices(vec!["cooking".into()]), 0.5);

    let ab = compatibility_score(&a, &b);
    assert_eq!(ab, compatibility_score(&b, &a));
    assert!(ab >= 0.0 && ab <= MAX_SCORE);
    assert_eq!(compatibility_score(&a, &a), MAX_SCORE);
    assert!(compatibility_score(&a, &a) >= ab);
}

#[test]
fn test_like_then_dislike_scenario() {
    let mut relations = Relations::default();
    let other = ProfileId::from("a1");

    relations.like(&other).unwrap();
    let transition = relations.dislike(&other).unwrap();

    assert_eq!(transition.from, Interaction::Liked);
    assert_eq!(transition.to, Interaction::Disliked);
    assert!(relations.dislikes().contains(&other));
    assert!(!relations.likes().contains(&other));
}

#[test]
fn test_action_sequences_keep_lists_exclusive() {
    let other = ProfileId::from("a1");
    let script = [
        Action::Like,
        Action::Like,
        Action::Dislike,
        Action::Unlike,
        Action::Like,
        Action::Unlike,
        Action::Dislike,
        Action::Dislike,
    ];

    let mut relations = Relations::default();
    for action in script {
        relations.apply(action, &other).unwrap();
        assert!(relations.likes().is_disjoint(relations.dislikes()));
    }
    assert_eq!(relations.state_of(&other), Interaction::Disliked);
}

#[test]
fn test_five_pool_two_liked_yields_three_sorted() {
    let matcher = Matcher::default();

    let mut me = ApartmentProfile::new("me".into(), "q-me".into());
    me.relations.like(&"r1".into()).unwrap();
    me.relations.like(&"r4".into()).unwrap();
    let me = Resolved {
        profile: me,
        questionnaire: questionnaire("q-me", false, 5.0),
        version: 1,
    };

    let cleanliness = [1.0, 2.0, 3.0, 4.0, 5.0];
    let pool: Vec<Resolved<RoommateProfile>> = cleanliness
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let id = format!("r{}", i);
            Resolved {
                profile: create_roommate(&id, 28, "engineer"),
                questionnaire: questionnaire(&format!("q-{}", id), false, c),
                version: 1,
            }
        })
        .collect();

    let result = matcher.suggestions(&me, pool, None);

    assert_eq!(result.total_candidates, 5);
    assert_eq!(result.suggestions.len(), 3);
    let ids: Vec<_> = result.suggestions.iter().map(|s| s.candidate.id.as_str()).collect();
    assert_eq!(ids, vec!["r3", "r2", "r0"]);
    assert!(result.suggestions.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_unknown_action_verb() {
    let err = "superlike".parse::<Action>().unwrap_err();
    assert_eq!(err.code(), "invalid_action");
}
