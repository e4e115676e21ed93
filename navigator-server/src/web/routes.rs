//! HTTP route handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::digitransit::{ConversionError, LegSource, convert_legs};
use crate::session::{RealtimeLegSession, SessionError};

use super::dto::*;
use super::state::{AppState, SessionId};

/// Create the application router.
pub fn create_router<S: LegSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session::<S>))
        .route(
            "/sessions/:id",
            get(get_session::<S>).delete(delete_session::<S>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Start tracking an itinerary.
async fn create_session<S: LegSource>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    // Parse JSON manually so we can log the body on failure
    let req: CreateSessionRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(&body), "invalid session request");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })?;

    let legs = convert_legs(&req.legs)?;
    state.evict_finished().await;

    let session = RealtimeLegSession::start(
        legs,
        state.source.clone(),
        state.clock.clone(),
        &state.session_config,
    )?;

    let snapshot = SnapshotResponse::from_snapshot(
        &session.snapshot(),
        None,
        &state.progress_config,
    )
    .map_err(AppError::internal)?;

    let id = state.next_session_id();
    state.sessions.write().await.insert(id, session);
    info!(session = %id, legs = req.legs.len(), "tracking session created");

    Ok((StatusCode::CREATED, Json(SessionResponse { id, snapshot })))
}

/// Current snapshot of a session, with progress for an optional position.
async fn get_session<S: LegSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
    Query(query): Query<PositionQuery>,
) -> Result<Json<SessionResponse>, AppError> {
    let id = SessionId(id);
    state.evict_finished().await;

    let mut snapshot = state
        .sessions
        .read()
        .await
        .get(&id)
        .map(|session| session.snapshot())
        .ok_or_else(|| AppError::not_found(id))?;

    // The ticker has exited, so move the snapshot on to now
    if snapshot.is_finished() {
        snapshot = Arc::new(snapshot.at(state.clock.now()));
    }

    let snapshot =
        SnapshotResponse::from_snapshot(&snapshot, query.position(), &state.progress_config)
            .map_err(AppError::internal)?;

    Ok(Json(SessionResponse { id, snapshot }))
}

/// Stop and forget a session.
async fn delete_session<S: LegSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    let id = SessionId(id);
    let session = state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| AppError::not_found(id))?;

    session.stop();
    info!(session = %id, "tracking session removed");

    Ok(StatusCode::NO_CONTENT)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl AppError {
    fn not_found(id: SessionId) -> Self {
        AppError::NotFound {
            message: format!("session {id} not found"),
        }
    }

    fn internal(e: impl std::fmt::Display) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(e: ConversionError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
