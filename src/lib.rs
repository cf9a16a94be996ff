// Expert Chat - chat with tool-using expert agents and summarize documents

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // Wikipedia lookups for the agents
pub mod documents; // PDF / DOCX / text / CSV extraction
pub mod session;
pub mod render;    // Server-rendered chat page
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
