use crate::types::{AppError, AppResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub wikipedia: WikipediaConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct LLMConfig {
    pub openai_api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub max_agent_steps: u32,
}

// Hand-written so the credential never ends up in a log line
impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("openai_api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("max_agent_steps", &self.max_agent_steps)
            .finish()
    }
}

impl LLMConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    pub api_url: String,
    pub top_k_results: usize,
    pub doc_content_chars_max: usize,
    pub timeout_secs: u64,
}

impl WikipediaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            top_k_results: 1,
            doc_content_chars_max: 300,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions untouched for this long are dropped
    pub idle_secs: u64,
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY must be set".to_string()))?;

        let wiki_defaults = WikipediaConfig::default();
        let session_defaults = SessionConfig::default();

        Ok(Self {
            server: ServerConfig {
                port: parse("PORT", &var("PORT", "8501"))?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var("ALLOWED_ORIGINS", "http://localhost:8501")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                openai_api_key,
                base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1")
                    .trim_end_matches('/')
                    .to_string(),
                model: var("EXPERT_MODEL", "gpt-4o-mini"),
                temperature: 0.0,
                timeout_secs: parse("LLM_TIMEOUT_SECS", &var("LLM_TIMEOUT_SECS", "60"))?,
                max_retries: parse("LLM_MAX_RETRIES", &var("LLM_MAX_RETRIES", "1"))?,
                max_agent_steps: parse("AGENT_MAX_STEPS", &var("AGENT_MAX_STEPS", "12"))?,
            },
            wikipedia: WikipediaConfig {
                api_url: var("WIKIPEDIA_API_URL", &wiki_defaults.api_url),
                top_k_results: parse(
                    "WIKIPEDIA_TOP_K",
                    &var("WIKIPEDIA_TOP_K", &wiki_defaults.top_k_results.to_string()),
                )?,
                doc_content_chars_max: parse(
                    "WIKIPEDIA_MAX_CHARS",
                    &var("WIKIPEDIA_MAX_CHARS", &wiki_defaults.doc_content_chars_max.to_string()),
                )?,
                timeout_secs: parse(
                    "WIKIPEDIA_TIMEOUT_SECS",
                    &var("WIKIPEDIA_TIMEOUT_SECS", &wiki_defaults.timeout_secs.to_string()),
                )?,
            },
            session: SessionConfig {
                idle_secs: parse(
                    "SESSION_IDLE_SECS",
                    &var("SESSION_IDLE_SECS", &session_defaults.idle_secs.to_string()),
                )?,
                sweep_interval_secs: parse(
                    "SESSION_SWEEP_SECS",
                    &var("SESSION_SWEEP_SECS", &session_defaults.sweep_interval_secs.to_string()),
                )?,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse<T>(key: &str, raw: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{} has an invalid value {:?}: {}", key, raw, e)))
}
