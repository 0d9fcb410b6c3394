use actix_web::{web, HttpResponse};
use std::sync::Arc;
use validator::Validate;

use crate::core::{Action, Party};
use crate::error::MatchError;
use crate::models::{
    ActionQuery, ActionResponse, HealthResponse, ProfileId, QuestionnaireUpdate, SuggestionsQuery,
    SuggestionsResponse,
};
use crate::services::ProfileService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProfileService>,
    /// Suggestions returned when the request carries no `limit`
    pub default_limit: usize,
}

/// Routes of one side of the market, mounted under `/apartments` or `/roommates`
pub fn configure<P: Party>(cfg: &mut web::ServiceConfig) {
    cfg.route("/{id}/suggestions", web::get().to(suggestions::<P>))
        .route("/{id}/matches", web::get().to(matches::<P>))
        .route("/{id}/activity", web::get().to(activity::<P>))
        .route("/{id}/actions/{target_id}", web::post().to(act::<P>))
        .route("/{id}/preferences", web::put().to(update_preferences::<P>))
        .route("/{id}/questionnaire", web::put().to(update_questionnaire::<P>));
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let store = state.service.repository().store();
    let healthy = match store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /api/v1/{side}/{id}/suggestions?limit=N
async fn suggestions<P: Party>(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SuggestionsQuery>,
) -> Result<HttpResponse, MatchError> {
    query.validate()?;

    let me = ProfileId::from(path.into_inner());
    let limit = query.limit.map(usize::from).unwrap_or(state.default_limit);
    let start = std::time::Instant::now();

    let result = state.service.suggestions::<P>(&me, Some(limit)).await?;

    tracing::info!(
        "Suggestions for {} {}: {} of {} candidates in {}ms",
        P::KIND,
        me,
        result.suggestions.len(),
        result.total_candidates,
        start.elapsed().as_millis()
    );

    Ok(HttpResponse::Ok().json(SuggestionsResponse {
        suggestions: result.suggestions,
        total_candidates: result.total_candidates,
    }))
}

/// GET /api/v1/{side}/{id}/matches
async fn matches<P: Party>(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let me = ProfileId::from(path.into_inner());
    let views = state.service.matches::<P>(&me).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/v1/{side}/{id}/activity
async fn activity<P: Party>(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MatchError> {
    let me = ProfileId::from(path.into_inner());
    let activity = state.service.activity::<P>(&me).await?;
    Ok(HttpResponse::Ok().json(activity))
}

/// POST /api/v1/{side}/{id}/actions/{target_id}?action=like|dislike|unlike
async fn act<P: Party>(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<ActionQuery>,
) -> Result<HttpResponse, MatchError> {
    let (me, target) = path.into_inner();
    let (me, target) = (ProfileId::from(me), ProfileId::from(target));
    let action: Action = query.action.parse()?;

    let transition = state.service.act::<P>(&me, &target, action).await?;

    Ok(HttpResponse::Ok().json(ActionResponse::new(action, target, transition)))
}

/// PUT /api/v1/{side}/{id}/preferences
async fn update_preferences<P: Party>(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<P::Preferences>,
) -> Result<HttpResponse, MatchError> {
    let me = ProfileId::from(path.into_inner());
    let profile = state
        .service
        .update_preferences::<P>(&me, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/v1/{side}/{id}/questionnaire
async fn update_questionnaire<P: Party>(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<QuestionnaireUpdate>,
) -> Result<HttpResponse, MatchError> {
    let me = ProfileId::from(path.into_inner());
    let questionnaire = state
        .service
        .update_questionnaire::<P>(&me, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(questionnaire))
}
