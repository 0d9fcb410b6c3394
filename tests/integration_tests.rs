// Integration tests for nestmatch: service layer and HTTP surface

use actix_web::{http::StatusCode, test, web, App};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;

use nestmatch::core::Matcher;
use nestmatch::models::{
    AnswerValue, ApartmentProfile, Coordinates, ProfileId, Questionnaire, RoommateProfile,
};
use nestmatch::routes::{configure_routes, AppState};
use nestmatch::services::{InMemoryProfileStore, ProfileService};

fn questionnaire(id: &str, smoker: bool, cleanliness: f64) -> Questionnaire {
    Questionnaire::new(id.into())
        .with_answer("lifestyle", "smoker", AnswerValue::Flag(smoker), 2.0)
        .with_answer("lifestyle", "cleanliness", AnswerValue::Number(cleanliness), 1.0)
}

/// Three apartments and three roommates
async fn seeded_service() -> Arc<ProfileService> {
    let service = ProfileService::new(Arc::new(InMemoryProfileStore::new()), Matcher::new(50));
    let repo = service.repository();

    let apartments = [
        ("a1", 3000.0, 32.08, 34.78, 5.0),
        ("a2", 4500.0, 32.07, 34.79, 3.0),
        ("a3", 6500.0, 31.77, 35.21, 4.0),
    ];
    for (id, rent, x, y, cleanliness) in apartments {
        let q = questionnaire(&format!("q-{}", id), false, cleanliness);
        let mut apartment = ApartmentProfile::new(id.into(), q.id.clone());
        apartment.info.financials.rent = Some(rent);
        apartment.info.location.coordinates = Some(Coordinates::new(x, y));
        apartment.info.location.address.street = Some(format!("{} Street", id));
        apartment.info.location.address.city = Some("Tel Aviv".into());
        apartment.info.lease_terms.available_from = NaiveDate::from_ymd_opt(2024, 9, 1);
        repo.insert(&apartment, &q).await.unwrap();
    }

    let roommates = [("r1", 26, 5.0), ("r2", 31, 2.0), ("r3", 45, 5.0)];
    for (id, age, cleanliness) in roommates {
        let q = questionnaire(&format!("q-{}", id), false, cleanliness);
        let mut roommate = RoommateProfile::new(id.into(), format!("Roommate {}", id), q.id.clone());
        roommate.personal_info.age = Some(age);
        roommate.preferences.location.coordinates = Some(Coordinates::new(32.08, 34.78));
        repo.insert(&roommate, &q).await.unwrap();
    }

    Arc::new(service)
}

fn state(service: Arc<ProfileService>) -> AppState {
    AppState {
        service,
        default_limit: 20,
    }
}

macro_rules! app {
    ($service:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(state($service)))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let app = app!(seeded_service().await);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_roommate_suggestions_sorted_with_sort_option() {
    let app = app!(seeded_service().await);

    let req = test::TestRequest::get()
        .uri("/api/v1/roommates/r1/suggestions")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["totalCandidates"], 3);

    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 3);
    assert_eq!(suggestions[0]["candidate"]["id"], "a1");
    assert_eq!(suggestions[0]["score"], 100.0);
    assert_eq!(suggestions[0]["sortOption"]["rent"], 3000.0);
    assert_eq!(suggestions[0]["sortOption"]["distance"], 0.0);
    assert_eq!(suggestions[0]["sortOption"]["date"], "2024-09-01");

    let scores: Vec<f64> = suggestions.iter().map(|s| s["score"].as_f64().unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[actix_web::test]
async fn test_suggestions_limit_and_validation() {
    let app = app!(seeded_service().await);

    let req = test::TestRequest::get()
        .uri("/api/v1/apartments/a1/suggestions?limit=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/apartments/a1/suggestions?limit=0")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");

    let req = test::TestRequest::get()
        .uri("/api/v1/apartments/a1/suggestions?limit=many")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_query");
}

#[actix_web::test]
async fn test_like_excludes_from_suggestions() {
    let service = seeded_service().await;
    let app = app!(service.clone());

    let req = test::TestRequest::post()
        .uri("/api/v1/apartments/a1/actions/r2?action=like")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["previous"], "neutral");
    assert_eq!(body["current"], "liked");
    assert_eq!(body["targetId"], "r2");

    // Liking again changes nothing
    let req = test::TestRequest::post()
        .uri("/api/v1/apartments/a1/actions/r2?action=like")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["changed"], false);

    let req = test::TestRequest::get()
        .uri("/api/v1/apartments/a1/suggestions")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<&str> = body["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["candidate"]["id"].as_str().unwrap())
        .collect();
    assert!(!ids.contains(&"r2"));
    assert_eq!(ids.len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/apartments/a1/activity")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["likes"][0]["candidate"]["id"], "r2");
    assert!(body["dislikes"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_action_errors() {
    let app = app!(seeded_service().await);

    let req = test::TestRequest::post()
        .uri("/api/v1/apartments/a1/actions/r2?action=superlike")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_action");

    let req = test::TestRequest::post()
        .uri("/api/v1/apartments/a1/actions/nobody?action=like")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/v1/roommates/nobody/suggestions")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["status_code"], 404);
}

#[actix_web::test]
async fn test_matched_pair_view_and_frozen_actions() {
    let service = seeded_service().await;

    // Reciprocal-like detection runs outside the service; record its result directly
    let repo = service.repository();
    let mut me = repo.load::<RoommateProfile>(&"r1".into()).await.unwrap();
    me.profile.relations.record_match(&ProfileId::from("a2"));
    repo.commit(&mut me).await.unwrap();

    let app = app!(service.clone());

    let req = test::TestRequest::get()
        .uri("/api/v1/roommates/r1/matches")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let matches = body.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["match"]["id"], "a2");
    assert_eq!(matches[0]["matchInfo"]["title"], "a2 Street, Tel Aviv");
    assert_eq!(matches[0]["matchInfo"]["subTitle"], "4500 / month");

    let req = test::TestRequest::post()
        .uri("/api/v1/roommates/r1/actions/a2?action=unlike")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Matched apartments never come back as suggestions
    let req = test::TestRequest::get()
        .uri("/api/v1/roommates/r1/suggestions")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_update_preferences_filters_suggestions() {
    let app = app!(seeded_service().await);

    let req = test::TestRequest::put()
        .uri("/api/v1/roommates/r1/preferences")
        .set_json(json!({
            "overview": { "rentRange": { "min": 2000, "max": 5000 } },
            "location": { "coordinates": [32.08, 34.78], "radius": 0.5 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/roommates/r1/suggestions")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<&str> = body["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["candidate"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);

    // Inverted range
    let req = test::TestRequest::put()
        .uri("/api/v1/roommates/r1/preferences")
        .set_json(json!({ "overview": { "rentRange": { "min": 5000, "max": 2000 } } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
}

#[actix_web::test]
async fn test_apartment_age_preferences() {
    let app = app!(seeded_service().await);

    let req = test::TestRequest::put()
        .uri("/api/v1/apartments/a1/preferences")
        .set_json(json!({ "ageRange": { "min": 25, "max": 35 } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/apartments/a1/suggestions")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0]["candidate"]["id"], "r1");
    assert_eq!(suggestions[0]["sortOption"]["age"], 26);
}

#[actix_web::test]
async fn test_malformed_json_body() {
    let app = app!(seeded_service().await);

    let req = test::TestRequest::put()
        .uri("/api/v1/apartments/a1/questionnaire")
        .insert_header(("content-type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_json");
}

#[actix_web::test]
async fn test_update_questionnaire_changes_scores() {
    let service = seeded_service().await;
    let app = app!(service.clone());

    let req = test::TestRequest::put()
        .uri("/api/v1/apartments/a1/questionnaire")
        .set_json(json!({
            "categories": {
                "lifestyle": {
                    "smoker": { "value": true, "importance": 2.0 },
                    "cleanliness": { "value": 5.0 }
                }
            }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], "q-a1");

    let stored = service
        .repository()
        .load::<ApartmentProfile>(&"a1".into())
        .await
        .unwrap();
    assert_eq!(
        stored.questionnaire.categories["lifestyle"]["smoker"].value,
        AnswerValue::Flag(true)
    );

    let req = test::TestRequest::put()
        .uri("/api/v1/apartments/a1/questionnaire")
        .set_json(json!({
            "categories": { "lifestyle": { "smoker": { "value": true, "importance": -1 } } }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_actions_from_both_sides() {
    let service = seeded_service().await;

    let mut handles = Vec::new();
    for target in ["r1", "r2", "r3"] {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .act::<ApartmentProfile>(&"a1".into(), &target.into(), nestmatch::Action::Like)
                .await
        }));
    }
    for target in ["a1", "a2", "a3"] {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .act::<RoommateProfile>(&"r1".into(), &target.into(), nestmatch::Action::Dislike)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let repo = service.repository();
    let a1 = repo.load::<ApartmentProfile>(&"a1".into()).await.unwrap();
    let r1 = repo.load::<RoommateProfile>(&"r1".into()).await.unwrap();
    assert_eq!(a1.profile.relations.likes().len(), 3);
    assert_eq!(r1.profile.relations.dislikes().len(), 3);
}
