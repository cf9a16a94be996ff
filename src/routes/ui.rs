use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{AppState, Expert, Theme};
use crate::render::{render_ended_page, render_error_page, render_page};
use crate::session::SessionEvent;
use crate::types::AppError;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/sessions/{id}", get(show_session))
        .route("/sessions/{id}/ask", post(ask))
        .route("/sessions/{id}/expert", post(select_expert))
        .route("/sessions/{id}/clear", post(clear_history))
        .route("/sessions/{id}/end", post(end_session))
        .route("/sessions/{id}/theme", post(set_theme))
        .with_state(state)
}

/// Error shown as an HTML page instead of JSON
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(e: AppError) -> Self {
        HtmlError(e)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let title = match status {
            StatusCode::NOT_FOUND => "Session not found",
            StatusCode::BAD_REQUEST => "Bad request",
            _ => "Something went wrong",
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Page request failed");
        }
        (status, Html(render_error_page(title, &self.0.to_string()))).into_response()
    }
}

pub type PageResult = Result<Response, HtmlError>;

pub fn back_to(id: Uuid) -> Response {
    Redirect::to(&format!("/sessions/{}", id)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpertForm {
    pub expert: String,
}

#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    #[serde(default)]
    pub dark_mode: Option<String>,
}

async fn index(State(state): State<AppState>) -> Response {
    let id = state.sessions.create().await;
    back_to(id)
}

async fn show_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> PageResult {
    let session = state.sessions.get(id).await?;
    let mut guard = session.lock().await;
    guard.ensure_live()?;
    guard.touch();
    Ok(Html(render_page(&guard)).into_response())
}

async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<AskForm>,
) -> PageResult {
    info!(session_id = %id, "Question submitted");
    state
        .sessions
        .dispatch(id, SessionEvent::Ask(form.question), &state.experts)
        .await?;
    Ok(back_to(id))
}

async fn select_expert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ExpertForm>,
) -> PageResult {
    let expert = Expert::from_slug(&form.expert)
        .ok_or_else(|| AppError::InvalidRequest(format!("unknown expert: {}", form.expert)))?;
    state
        .sessions
        .dispatch(id, SessionEvent::SelectExpert(expert), &state.experts)
        .await?;
    Ok(back_to(id))
}

async fn clear_history(State(state): State<AppState>, Path(id): Path<Uuid>) -> PageResult {
    state
        .sessions
        .dispatch(id, SessionEvent::ClearHistory, &state.experts)
        .await?;
    Ok(back_to(id))
}

async fn end_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> PageResult {
    state
        .sessions
        .dispatch(id, SessionEvent::EndSession, &state.experts)
        .await?;
    Ok(Html(render_ended_page()).into_response())
}

async fn set_theme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<ThemeForm>,
) -> PageResult {
    let theme = match form.dark_mode.as_deref() {
        Some("on") | Some("true") => Theme::Dark,
        _ => Theme::Light,
    };
    state
        .sessions
        .dispatch(id, SessionEvent::SetTheme(theme), &state.experts)
        .await?;
    Ok(back_to(id))
}
