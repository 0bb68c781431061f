//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use orrery_domain::{Event, Universe, UniverseId};

use crate::app::App;
use crate::use_cases::ProcessError;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/universes/{id}", get(get_universe))
        .route("/api/universes/{id}/commands", post(post_command))
}

async fn health() -> &'static str {
    "OK"
}

async fn get_universe(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<Universe>, ApiError> {
    let universe = app
        .repo
        .get(&UniverseId::from(id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(universe))
}

/// Response body for a processed command. Domain rejections ride along
/// in `events` under a 200; only pipeline failures map to error codes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandResponse {
    next_state: Universe,
    events: Vec<Event>,
}

async fn post_command(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    Json(envelope): Json<Value>,
) -> Result<Json<CommandResponse>, ApiError> {
    let outcome = app
        .processor
        .process(&UniverseId::from(id), envelope)
        .await?;
    Ok(Json(CommandResponse {
        next_state: outcome.next_state,
        events: outcome.events,
    }))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                )
                    .into_response()
            }
        }
    }
}

impl From<ProcessError> for ApiError {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::UniverseNotFound(_) => ApiError::NotFound,
            ProcessError::MalformedEnvelope(e) => ApiError::BadRequest(e.to_string()),
            ProcessError::Repo(e) => ApiError::Internal(e.to_string()),
        }
    }
}
