//! Chat turns and upload handling for a single session

use tracing::{error, info, warn};

use crate::agents::{ask, summarize, ExpertAgents};
use crate::documents::extract_text;
use crate::models::{ChatMessage, UploadOutcome, UploadStatus, UploadedDocument};
use crate::types::{AppError, AppResult};

use super::Session;

/// Assistant entry written when a turn fails
pub const FAILED_REPLY_PREFIX: &str = "Sorry, something went wrong: ";

/// Sidebar message for any upload that did not produce a summary
pub const UPLOAD_FAILED: &str = "Could not extract text from the uploaded file.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub failed: bool,
}

/// Run one chat turn against the selected expert.
///
/// Blank input is ignored. Otherwise history grows by exactly two entries:
/// the question and either the answer or a visible error.
pub async fn chat_turn(session: &mut Session, agents: &ExpertAgents, text: &str) -> Option<TurnOutcome> {
    if text.trim().is_empty() {
        return None;
    }

    session.history.push(ChatMessage::user(text));
    info!(session_id = %session.id, expert = %session.expert, "Asking expert");

    let outcome = match answer(session, agents, text).await {
        Ok(reply) => TurnOutcome { reply, failed: false },
        Err(e) => {
            error!(session_id = %session.id, expert = %session.expert, error = %e, "Chat turn failed");
            TurnOutcome {
                reply: format!("{}{}", FAILED_REPLY_PREFIX, e),
                failed: true,
            }
        }
    };

    session.history.push(ChatMessage::assistant(outcome.reply.clone()));
    Some(outcome)
}

async fn answer(session: &Session, agents: &ExpertAgents, question: &str) -> AppResult<String> {
    let agent = agents.get(session.expert)?;
    ask(agent.as_ref(), question).await
}

/// Extract, summarize with the selected expert, and record the result for the sidebar
pub async fn process_upload(session: &mut Session, agents: &ExpertAgents, document: UploadedDocument) {
    let filename = document.filename.clone();
    info!(session_id = %session.id, filename = %filename, "Processing upload");

    let outcome = match summarize_upload(session, agents, document).await {
        Ok(summary) => UploadOutcome::Summary(summary),
        Err(AppError::Extraction(reason)) => {
            warn!(session_id = %session.id, filename = %filename, reason = %reason, "Upload not summarized");
            UploadOutcome::Failed(format!("{} ({})", UPLOAD_FAILED, reason))
        }
        Err(e) => {
            error!(session_id = %session.id, filename = %filename, error = %e, "Summarization failed");
            UploadOutcome::Failed(format!("Could not summarize the uploaded file: {}", e))
        }
    };

    session.upload = Some(UploadStatus { filename, outcome });
}

async fn summarize_upload(
    session: &Session,
    agents: &ExpertAgents,
    document: UploadedDocument,
) -> AppResult<String> {
    let extracted = tokio::task::spawn_blocking(move || extract_text(&document))
        .await
        .map_err(|e| AppError::Internal(format!("extraction task failed: {}", e)))??;

    let agent = agents.get(session.expert)?;
    summarize(agent.as_ref(), &extracted).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{ChatAgent, SUMMARY_PREFIX};
    use crate::models::{ChatRole, Expert};
    use crate::types::LLMMessage;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Answers with a fixed reply and remembers every conversation it was given
    struct StubAgent {
        reply: String,
        seen: Mutex<Vec<Vec<LLMMessage>>>,
    }

    impl StubAgent {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatAgent for StubAgent {
        async fn invoke(&self, messages: Vec<LLMMessage>) -> AppResult<Vec<LLMMessage>> {
            self.seen.lock().unwrap().push(messages);
            Ok(vec![
                LLMMessage::user("ignored"),
                LLMMessage::assistant(self.reply.clone()),
            ])
        }
    }

    struct BrokenAgent;

    #[async_trait]
    impl ChatAgent for BrokenAgent {
        async fn invoke(&self, _messages: Vec<LLMMessage>) -> AppResult<Vec<LLMMessage>> {
            Err(AppError::LLMApi("rate limited".to_string()))
        }
    }

    fn text_upload(filename: &str, content_type: &str, data: &[u8]) -> UploadedDocument {
        UploadedDocument {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_turn_appends_question_and_last_message() {
        let agent = StubAgent::new("The Battle of Plassey was fought in 1757.");
        let agents = ExpertAgents::uniform(agent.clone());
        let mut session = Session::new();
        session.history.push(ChatMessage::user("earlier"));
        session.history.push(ChatMessage::assistant("earlier reply"));

        let outcome = chat_turn(&mut session, &agents, "When was Plassey?").await.unwrap();

        assert!(!outcome.failed);
        assert_eq!(session.history.len(), 4);
        assert_eq!(session.history[2], ChatMessage::user("When was Plassey?"));
        assert_eq!(
            session.history[3],
            ChatMessage::assistant("The Battle of Plassey was fought in 1757.")
        );

        // stateless: only the new question goes to the agent
        let seen = agent.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec![LLMMessage::user("When was Plassey?")]);
    }

    #[tokio::test]
    async fn test_question_is_kept_verbatim() {
        let agent = StubAgent::new("A fourteen-line poem.");
        let agents = ExpertAgents::uniform(agent.clone());
        let mut session = Session::new();

        chat_turn(&mut session, &agents, "  What is a sonnet?  ").await.unwrap();

        assert_eq!(session.history[0], ChatMessage::user("  What is a sonnet?  "));
        let seen = agent.seen.lock().unwrap();
        assert_eq!(seen[0], vec![LLMMessage::user("  What is a sonnet?  ")]);
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let agents = ExpertAgents::uniform(StubAgent::new("unused"));
        let mut session = Session::new();

        assert!(chat_turn(&mut session, &agents, "   ").await.is_none());
        assert!(chat_turn(&mut session, &agents, "").await.is_none());
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_appends_visible_error() {
        let agents = ExpertAgents::uniform(Arc::new(BrokenAgent));
        let mut session = Session::new();

        let outcome = chat_turn(&mut session, &agents, "Who wrote Hamlet?").await.unwrap();

        assert!(outcome.failed);
        assert!(outcome.reply.starts_with(FAILED_REPLY_PREFIX));
        assert!(outcome.reply.contains("rate limited"));
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, ChatRole::User);
        assert_eq!(session.history[1].role, ChatRole::Assistant);
        assert_eq!(session.history[1].text, outcome.reply);
    }

    #[tokio::test]
    async fn test_turn_uses_selected_expert() {
        let agents = ExpertAgents::uniform(StubAgent::new("history answer"))
            .with_agent(Expert::EnglishExpert, StubAgent::new("english answer"));
        let mut session = Session::new();
        session.expert = Expert::EnglishExpert;

        let outcome = chat_turn(&mut session, &agents, "Define irony").await.unwrap();
        assert_eq!(outcome.reply, "english answer");
    }

    #[tokio::test]
    async fn test_upload_summary() {
        let agent = StubAgent::new("A note about Akbar.");
        let agents = ExpertAgents::uniform(agent.clone());
        let mut session = Session::new();

        process_upload(
            &mut session,
            &agents,
            text_upload("notes.txt", "text/plain", b"Akbar ruled from 1556."),
        )
        .await;

        let status = session.upload.clone().unwrap();
        assert_eq!(status.filename, "notes.txt");
        assert_eq!(status.outcome, UploadOutcome::Summary("A note about Akbar.".to_string()));
        assert!(session.history.is_empty());

        let seen = agent.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            vec![LLMMessage::user(format!("{}Akbar ruled from 1556.", SUMMARY_PREFIX))]
        );
    }

    #[tokio::test]
    async fn test_unsupported_upload_skips_summary() {
        let agent = StubAgent::new("unused");
        let agents = ExpertAgents::uniform(agent.clone());
        let mut session = Session::new();

        process_upload(&mut session, &agents, text_upload("cat.png", "image/png", &[0x89])).await;

        match session.upload.unwrap().outcome {
            UploadOutcome::Failed(message) => {
                assert!(message.starts_with(UPLOAD_FAILED));
                assert!(message.contains("Unsupported file format."));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(agent.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_upload_is_reported() {
        let agents = ExpertAgents::uniform(StubAgent::new("unused"));
        let mut session = Session::new();

        process_upload(
            &mut session,
            &agents,
            text_upload("report.pdf", "application/pdf", b"not a pdf"),
        )
        .await;

        assert!(matches!(
            session.upload.unwrap().outcome,
            UploadOutcome::Failed(ref m) if m.starts_with(UPLOAD_FAILED)
        ));
    }

    #[tokio::test]
    async fn test_summary_agent_failure_is_reported() {
        let agents = ExpertAgents::uniform(Arc::new(BrokenAgent));
        let mut session = Session::new();

        process_upload(&mut session, &agents, text_upload("a.txt", "text/plain", b"text")).await;

        match session.upload.unwrap().outcome {
            UploadOutcome::Failed(message) => assert!(message.contains("rate limited")),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
