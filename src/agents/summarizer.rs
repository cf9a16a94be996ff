//! Document summarization through the selected expert

use tracing::info;

use crate::agents::expert::{ask, ChatAgent};
use crate::documents::ExtractedText;
use crate::utils::truncate_chars;
use crate::types::{AppError, AppResult};

pub const SUMMARY_PREFIX: &str = "Summarize the following text: ";

/// Characters of extracted text included in the prompt
pub const SUMMARY_INPUT_CHARS: usize = 2000;

/// Prefix plus at most the first 2000 characters of `text`
pub fn build_summary_prompt(text: &str) -> String {
    format!("{}{}", SUMMARY_PREFIX, truncate_chars(text, SUMMARY_INPUT_CHARS))
}

/// Summarize extracted text, refusing the unsupported-format sentinel and empty text
pub async fn summarize(agent: &dyn ChatAgent, extracted: &ExtractedText) -> AppResult<String> {
    let text = match extracted {
        ExtractedText::Text(text) if !text.trim().is_empty() => text,
        ExtractedText::Text(_) => {
            return Err(AppError::Extraction("the file contains no text".to_string()));
        }
        ExtractedText::Unsupported => {
            return Err(AppError::Extraction(ExtractedText::UNSUPPORTED.to_string()));
        }
    };

    let prompt = build_summary_prompt(text);
    info!(input_chars = text.chars().count(), prompt_chars = prompt.chars().count(), "Summarizing document");
    ask(agent, &prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMMessage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingAgent {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatAgent for RecordingAgent {
        async fn invoke(&self, messages: Vec<LLMMessage>) -> AppResult<Vec<LLMMessage>> {
            assert_eq!(messages.len(), 1);
            self.prompts.lock().unwrap().push(messages[0].text().to_string());
            Ok(vec![LLMMessage::assistant("A short summary.")])
        }
    }

    #[test]
    fn test_prompt_truncated_to_2000_chars() {
        let text: String = "abcde".repeat(1000);
        assert_eq!(text.chars().count(), 5000);

        let prompt = build_summary_prompt(&text);
        assert_eq!(prompt, format!("{}{}", SUMMARY_PREFIX, &text[..2000]));
        assert_eq!(prompt.chars().count(), SUMMARY_PREFIX.chars().count() + 2000);
    }

    #[test]
    fn test_prompt_counts_characters_not_bytes() {
        let text = "é".repeat(2500);
        let prompt = build_summary_prompt(&text);
        assert_eq!(prompt.chars().count(), SUMMARY_PREFIX.chars().count() + 2000);
    }

    #[tokio::test]
    async fn test_summarize_sends_single_prompt() {
        let agent = RecordingAgent::default();
        let summary = summarize(&agent, &ExtractedText::Text("x".repeat(5000)))
            .await
            .unwrap();

        assert_eq!(summary, "A short summary.");
        let prompts = agent.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0], format!("{}{}", SUMMARY_PREFIX, "x".repeat(2000)));
    }

    #[tokio::test]
    async fn test_unsupported_is_not_summarized() {
        let agent = RecordingAgent::default();
        let err = summarize(&agent, &ExtractedText::Unsupported).await.unwrap_err();

        assert!(matches!(err, AppError::Extraction(_)));
        assert!(agent.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_text_is_not_summarized() {
        let agent = RecordingAgent::default();
        let err = summarize(&agent, &ExtractedText::Text("  \n".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Extraction(_)));
        assert!(agent.prompts.lock().unwrap().is_empty());
    }
}
