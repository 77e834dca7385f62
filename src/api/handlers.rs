//! HTTP request handlers

use super::assets::serve_asset;
use super::types::{ErrorResponse, FullscreenResponse, SendRequest, SendResponse, SessionResponse};
use super::AppState;
use crate::runtime::{ProductionSession, SessionError};
use crate::widget;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Widget snippet and its assets
        .route("/widget", get(get_widget))
        .route("/widget/inject", post(inject_widget))
        .route("/assets/*path", get(serve_asset))
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        // Widget actions
        .route("/api/sessions/:id/open", post(open_session))
        .route("/api/sessions/:id/close", post(close_session))
        .route("/api/sessions/:id/send", post(send_message))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/fullscreen", post(toggle_fullscreen))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Widget
// ============================================================

async fn get_widget(State(state): State<AppState>) -> Response {
    if state.sessions.is_none() {
        return StatusCode::NO_CONTENT.into_response();
    }
    Html(widget::snippet(&state.config)).into_response()
}

/// Return the posted page with the widget inserted. Pages pass through
/// untouched while the chat is disabled.
async fn inject_widget(State(state): State<AppState>, page: String) -> Html<String> {
    if state.sessions.is_none() {
        return Html(page);
    }
    Html(widget::inject(&page, &widget::snippet(&state.config)))
}

// ============================================================
// Sessions
// ============================================================

async fn session(state: &AppState, id: &str) -> Result<Arc<ProductionSession>, AppError> {
    let sessions = state.sessions.as_ref().ok_or(AppError::Disabled)?;
    sessions.get_or_create(id).await.map_err(AppError::from)
}

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    let sessions = state.sessions.as_ref().ok_or(AppError::Disabled)?;
    let session = sessions.create_session().await;
    Ok(Json(SessionResponse {
        session_id: session.id().to_string(),
        view: session.view(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let sessions = state.sessions.as_ref().ok_or(AppError::Disabled)?;
    let session = sessions.find(&id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(SessionResponse {
        session_id: session.id().to_string(),
        view: session.view(),
    }))
}

// ============================================================
// Widget actions
// ============================================================

/// Answers at once with the widget shown. A due corpus load runs in its own
/// task; the view reports `loading` until it lands.
async fn open_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session(&state, &id).await?;
    if session.show() {
        let task = session.clone();
        tokio::spawn(async move { task.load_documentation().await });
    }

    Ok(Json(SessionResponse {
        session_id: session.id().to_string(),
        view: session.view(),
    }))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session(&state, &id).await?;
    session.close();
    Ok(Json(SessionResponse {
        session_id: session.id().to_string(),
        view: session.view(),
    }))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendResponse>, AppError> {
    let session = session(&state, &id).await?;
    let task = session.clone();
    let outcome = tokio::spawn(async move { task.send(&req.text).await })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::debug!(session_id = %session.id(), ?outcome, "Message handled");
    Ok(Json(SendResponse {
        outcome,
        view: session.view(),
    }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session(&state, &id).await?;
    session.reset();
    Ok(Json(SessionResponse {
        session_id: session.id().to_string(),
        view: session.view(),
    }))
}

async fn toggle_fullscreen(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FullscreenResponse>, AppError> {
    let session = session(&state, &id).await?;
    Ok(Json(FullscreenResponse {
        fullscreen: session.toggle_fullscreen(),
    }))
}

async fn get_version() -> &'static str {
    concat!("docs-chat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound,
    Disabled,
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::InvalidId(_) => AppError::BadRequest(e.to_string()),
            SessionError::Storage(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Unknown session".to_string()),
            AppError::Disabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Chat is disabled: no API key configured".to_string(),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
