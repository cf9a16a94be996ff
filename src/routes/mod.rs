//! HTTP Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/` and `/sessions/{id}/...` - Server-rendered chat page and its form actions
//! - `/sessions/{id}/upload` - Document upload and summarization
//! - `/api/sessions` - JSON chat API
//! - `/api/health` - Health checks

pub mod chat;
pub mod files;
pub mod health;
pub mod ui;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
///
/// The JSON API carries the CORS layer; the HTML pages are same-origin only.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let api_router = Router::new()
        .merge(chat::router(state.clone()))
        .merge(health::router(state.clone()))
        .layer(cors_layer(&state.config.server.cors_allowed_origins));

    Router::new()
        .merge(ui::router(state.clone()))
        .merge(files::router(state))
        .merge(api_router)
        .layer(TraceLayer::new_for_http())
}
