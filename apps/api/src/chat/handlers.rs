//! Axum route handlers for the chat API.
//!
//! Every command returns the session state it produced; the client decides
//! how and when to redraw.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::session::{MessageView, SessionSnapshot};
use crate::chat::store::SessionHandle;
use crate::chat::turn::{self, TurnOutcome};
use crate::errors::AppError;
use crate::routes::form::read_upload_form;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BeginEditRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct CommitEditRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub user: MessageView,
    pub assistant: MessageView,
    pub session: SessionSnapshot,
}

impl TurnResponse {
    fn new(outcome: &TurnOutcome, session: SessionSnapshot) -> Self {
        Self {
            user: outcome.user.view(),
            assistant: outcome.assistant.view(),
            session,
        }
    }
}

async fn session_handle(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let handle = state.sessions.create().await;
    let snapshot = handle.lock().await.snapshot();
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = session_handle(&state, id).await?;
    let snapshot = handle.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// POST /api/v1/sessions/:id/messages
///
/// `multipart/form-data` with a `text` field and any number of `files` parts.
pub async fn handle_submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<TurnResponse>, AppError> {
    let handle = session_handle(&state, id).await?;
    let mut form = read_upload_form(multipart).await?;
    let text = form.field("text").unwrap_or_default().to_string();
    let files = form.take_files("files");

    let mut session = handle.lock().await;
    let outcome = turn::submit(
        &mut session,
        state.gateway.as_ref(),
        &state.upload_policy,
        &text,
        files,
    )
    .await?;

    Ok(Json(TurnResponse::new(&outcome, session.snapshot())))
}

/// POST /api/v1/sessions/:id/edit
pub async fn handle_begin_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BeginEditRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = session_handle(&state, id).await?;
    let mut session = handle.lock().await;
    session.begin_edit(request.index)?;
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/sessions/:id/edit/commit
pub async fn handle_commit_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CommitEditRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let handle = session_handle(&state, id).await?;
    let mut session = handle.lock().await;
    let outcome = turn::commit_edit(
        &mut session,
        state.gateway.as_ref(),
        &state.upload_policy,
        &request.text,
    )
    .await?;

    Ok(Json(TurnResponse::new(&outcome, session.snapshot())))
}

/// POST /api/v1/sessions/:id/edit/cancel
pub async fn handle_cancel_edit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = session_handle(&state, id).await?;
    let mut session = handle.lock().await;
    session.cancel_edit();
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/sessions/:id/clear
pub async fn handle_clear(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = session_handle(&state, id).await?;
    let mut session = handle.lock().await;
    session.clear();
    Ok(Json(session.snapshot()))
}
