use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;

use super::domain::{ScoreSubmission, SessionId, TemplateSnapshot};
use super::repository::{RepositoryError, SessionRepository, SessionStatusView};
use super::service::{ScoringServiceError, SessionScoringService};
use super::session::SessionError;

/// Router builder exposing the session scoring lifecycle over HTTP.
pub fn scoring_router<R>(service: Arc<SessionScoringService<R>>) -> Router
where
    R: SessionRepository + 'static,
{
    Router::new()
        .route("/api/v1/scoring/sessions", post(create_handler::<R>))
        .route(
            "/api/v1/scoring/sessions/:session_id",
            get(status_handler::<R>),
        )
        .route(
            "/api/v1/scoring/sessions/:session_id/start",
            post(start_handler::<R>),
        )
        .route(
            "/api/v1/scoring/sessions/:session_id/scores",
            put(submit_score_handler::<R>),
        )
        .route(
            "/api/v1/scoring/sessions/:session_id/complete",
            post(complete_handler::<R>),
        )
        .route(
            "/api/v1/scoring/sessions/:session_id/cancel",
            post(cancel_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<SessionScoringService<R>>>,
    axum::Json(snapshot): axum::Json<TemplateSnapshot>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.create_session(snapshot) {
        Ok(session) => {
            let view = SessionStatusView::from_session(&session);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<SessionScoringService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(session) => {
            let view = SessionStatusView::from_session(&session);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn start_handler<R>(
    State(service): State<Arc<SessionScoringService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.start(&SessionId(session_id)) {
        Ok(session) => {
            let view = SessionStatusView::from_session(&session);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_score_handler<R>(
    State(service): State<Arc<SessionScoringService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(submission): axum::Json<ScoreSubmission>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.submit_score(&SessionId(session_id), submission) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_handler<R>(
    State(service): State<Arc<SessionScoringService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.complete(&SessionId(session_id)) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<R>(
    State(service): State<Arc<SessionScoringService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.cancel(&SessionId(session_id)) {
        Ok(session) => {
            let view = SessionStatusView::from_session(&session);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ScoringServiceError) -> Response {
    match &error {
        ScoringServiceError::Session(SessionError::Transition(transition)) => {
            let payload = json!({
                "error": transition.to_string(),
                "status": transition.from.label(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        ScoringServiceError::Session(SessionError::Validation(validation)) => {
            let payload = json!({ "error": validation.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ScoringServiceError::Session(SessionError::MissingRequired(missing)) => {
            let payload = json!({
                "error": missing.to_string(),
                "missing_criteria": missing.missing,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ScoringServiceError::Session(SessionError::Configuration(config)) => {
            let payload = json!({ "error": config.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ScoringServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({ "error": "session not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ScoringServiceError::Repository(
            RepositoryError::Conflict | RepositoryError::StaleStatus,
        ) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        ScoringServiceError::Repository(RepositoryError::Unavailable(_)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
