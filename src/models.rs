use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::ExpertAgents;
use crate::config::Config;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub experts: ExpertAgents,
}

impl AppState {
    pub fn new(config: Config, experts: ExpertAgents) -> Self {
        Self {
            config: Arc::new(config),
            sessions: SessionStore::default(),
            experts,
        }
    }
}

/// The preset experts a user can chat with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expert {
    #[default]
    #[serde(alias = "history")]
    HistoryExpert,
    #[serde(alias = "english")]
    EnglishExpert,
}

impl Expert {
    pub const ALL: [Expert; 2] = [Expert::HistoryExpert, Expert::EnglishExpert];

    pub fn label(&self) -> &'static str {
        match self {
            Expert::HistoryExpert => "History Expert",
            Expert::EnglishExpert => "English Expert",
        }
    }

    /// Short form used in form values and URLs
    pub fn slug(&self) -> &'static str {
        match self {
            Expert::HistoryExpert => "history",
            Expert::EnglishExpert => "english",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.slug() == slug)
    }
}

impl std::fmt::Display for Expert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// A file handed in through the uploader; consumed once by extraction
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Outcome of the last upload, shown in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum UploadOutcome {
    Summary(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadStatus {
    pub filename: String,
    pub outcome: UploadOutcome,
}

// API Request/Response types

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub expert: Option<Expert>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// True when the agent call failed and `reply` carries the error
    pub failed: bool,
    pub history_len: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: uuid::Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: uuid::Uuid,
    pub expert: Expert,
    pub theme: Theme,
    pub history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadStatus>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_active: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub sessions: usize,
}
