// Session events: every user interaction is one of these, applied to the
// session and followed by a re-render of the page.

use crate::agents::ExpertAgents;
use crate::models::{Expert, Theme, UploadedDocument};

use super::dispatch::{chat_turn, process_upload, TurnOutcome};
use super::Session;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    SelectExpert(Expert),
    Ask(String),
    ClearHistory,
    EndSession,
    Upload(UploadedDocument),
    SetTheme(Theme),
}

impl SessionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SelectExpert(_) => "select_expert",
            SessionEvent::Ask(_) => "ask",
            SessionEvent::ClearHistory => "clear_history",
            SessionEvent::EndSession => "end_session",
            SessionEvent::Upload(_) => "upload",
            SessionEvent::SetTheme(_) => "set_theme",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// State changed (or not); render the page again
    Updated,
    /// A chat turn ran; `None` when the question was blank
    Turn(Option<TurnOutcome>),
    /// The session is over and must not be used again
    Ended,
}

impl Session {
    pub async fn apply(&mut self, event: SessionEvent, agents: &ExpertAgents) -> EventOutcome {
        match event {
            SessionEvent::SelectExpert(expert) => {
                self.expert = expert;
                EventOutcome::Updated
            }
            SessionEvent::Ask(text) => EventOutcome::Turn(chat_turn(self, agents, &text).await),
            SessionEvent::ClearHistory => {
                self.history.clear();
                EventOutcome::Updated
            }
            SessionEvent::EndSession => EventOutcome::Ended,
            SessionEvent::Upload(document) => {
                process_upload(self, agents, document).await;
                EventOutcome::Updated
            }
            SessionEvent::SetTheme(theme) => {
                self.theme = theme;
                EventOutcome::Updated
            }
        }
    }
}
