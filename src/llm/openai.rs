// OpenAI chat-completions adapter with function calling
// Works against any OpenAI-compatible endpoint: https://platform.openai.com/docs/api-reference/chat

use crate::llm::provider::{LLMAdapter, LLMProviderConfig};
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest, LLMResponse, TokenUsage, ToolSpec};
use crate::utils::with_retry;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

pub struct OpenAIAdapter {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [LLMMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolSpec],
}

fn no_tools(tools: &&[ToolSpec]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: LLMMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Deserialize)]
struct OpenAIError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// Failure of a single HTTP attempt, before it is mapped onto `AppError`
#[derive(Debug)]
enum AttemptError {
    Transport(reqwest::Error),
    Status(StatusCode, String),
    Decode(String),
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Transport(e) => write!(f, "request failed: {}", e),
            AttemptError::Status(status, message) => write!(f, "({}) {}", status, message),
            AttemptError::Decode(e) => write!(f, "failed to parse response: {}", e),
        }
    }
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        match self {
            AttemptError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AttemptError::Status(status, _) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            AttemptError::Decode(_) => false,
        }
    }

    fn into_app_error(self) -> AppError {
        match self {
            AttemptError::Status(status, message)
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                AppError::Config(format!("the model API rejected the credential ({}): {}", status, message))
            }
            other => AppError::LLMApi(format!("OpenAI {}", other)),
        }
    }
}

impl OpenAIAdapter {
    pub fn new(provider: &LLMProviderConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(provider.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: provider.api_key.clone(),
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            max_retries: provider.max_retries,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(&self, body: &OpenAIChatRequest<'_>) -> Result<OpenAIChatResponse, AttemptError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                Ok(parsed) => match parsed.error.error_type {
                    Some(kind) => format!("{} ({})", parsed.error.message, kind),
                    None => parsed.error.message,
                },
                Err(_) => error_text,
            };
            return Err(AttemptError::Status(status, message));
        }

        response
            .json::<OpenAIChatResponse>()
            .await
            .map_err(|e| AttemptError::Decode(e.to_string()))
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let body = OpenAIChatRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: &request.tools,
        };

        debug!(
            model = %request.model,
            message_count = request.messages.len(),
            tool_count = request.tools.len(),
            "Sending chat completion"
        );

        let response = with_retry(
            || self.send_once(&body),
            self.max_retries,
            RETRY_BASE_DELAY,
            AttemptError::is_transient,
        )
        .await
        .map_err(AttemptError::into_app_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLMApi("OpenAI returned no choices".to_string()))?;

        Ok(LLMResponse {
            message: choice.message,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage: response.usage,
        })
    }
}
