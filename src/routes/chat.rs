use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::info;
use uuid::Uuid;

use crate::models::{AppState, ChatRequest, ChatResponse, SessionCreated, SessionSnapshot};
use crate::session::{EventOutcome, SessionEvent};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/chat", post(post_chat))
        .route("/api/sessions/{id}/history", delete(clear_history))
        .with_state(state)
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SessionSnapshot>> {
    Ok(Json(state.sessions.snapshot(id).await?))
}

pub async fn post_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    if request.message.trim().is_empty() {
        return Err(AppError::InvalidRequest("message must not be empty".to_string()));
    }
    info!(session_id = %id, expert = ?request.expert, "Received chat request");

    if let Some(expert) = request.expert {
        state
            .sessions
            .dispatch(id, SessionEvent::SelectExpert(expert), &state.experts)
            .await?;
    }

    let (outcome, session) = state
        .sessions
        .dispatch(id, SessionEvent::Ask(request.message), &state.experts)
        .await?;

    match outcome {
        EventOutcome::Turn(Some(turn)) => Ok(Json(ChatResponse {
            reply: turn.reply,
            failed: turn.failed,
            history_len: session.history.len(),
        })),
        _ => Err(AppError::Internal("chat turn did not run".to_string())),
    }
}

async fn clear_history(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state
        .sessions
        .dispatch(id, SessionEvent::ClearHistory, &state.experts)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
