//! Agent Tools
//!
//! Tools are callables the model may invoke mid-reasoning. Each tool
//! publishes a function spec for the chat-completions API and executes
//! JSON-encoded arguments into a text result.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::search::WikipediaClient;
use crate::types::{AppError, AppResult, ToolCall, ToolSpec};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn spec(&self) -> ToolSpec;

    /// Execute with the raw JSON arguments the model produced
    async fn call(&self, arguments: &str) -> AppResult<String>;
}

/// The set of tools an agent may call, looked up by function name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Specs sorted by name so requests are stable
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|t| t.spec()).collect();
        specs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        specs
    }

    /// Run one tool call. Failures are returned as text for the model to read.
    pub async fn execute(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();
        let outcome = match self.tools.get(name) {
            Some(tool) => tool.call(&call.function.arguments).await,
            None => Err(AppError::Tool(format!("{} is not a valid tool", name))),
        };

        match outcome {
            Ok(text) => {
                info!(tool = %name, result_len = text.len(), "Tool call succeeded");
                text
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                format!("Error: {}\n Please fix your mistakes.", e)
            }
        }
    }
}

#[derive(Deserialize)]
struct WikipediaArgs {
    query: String,
}

/// Wikipedia lookup exposed to the model as the `wikipedia` function
pub struct WikipediaTool {
    client: WikipediaClient,
}

impl WikipediaTool {
    pub const NAME: &'static str = "wikipedia";

    pub fn new(client: WikipediaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::function(
            Self::NAME,
            "A wrapper around Wikipedia. Useful for when you need to answer general questions about \
             people, places, companies, facts, historical events, or other subjects. \
             Input should be a search query.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "query to look up on wikipedia"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    async fn call(&self, arguments: &str) -> AppResult<String> {
        let args: WikipediaArgs = serde_json::from_str(arguments)
            .map_err(|e| AppError::Tool(format!("invalid arguments for {}: {}", Self::NAME, e)))?;
        Ok(self.client.run(&args.query).await?)
    }
}
