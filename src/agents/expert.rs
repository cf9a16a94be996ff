//! Expert Agent
//!
//! A tool-calling agent loop over the chat-completions API. Each step sends
//! the running conversation plus the tool specs; when the model asks for
//! tools, their results are appended and the model is asked again, until it
//! answers without tool calls.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agents::tools::{ToolRegistry, WikipediaTool};
use crate::config::Config;
use crate::llm::{LLMProviderConfig, LLM};
use crate::models::Expert;
use crate::search::WikipediaClient;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};

/// Anything that maps a conversation to response messages, the last of which is the answer
#[async_trait]
pub trait ChatAgent: Send + Sync {
    async fn invoke(&self, messages: Vec<LLMMessage>) -> AppResult<Vec<LLMMessage>>;
}

pub struct ExpertAgent {
    expert: Expert,
    llm: LLM,
    model: String,
    temperature: f32,
    tools: ToolRegistry,
    max_steps: u32,
}

impl ExpertAgent {
    pub fn new(expert: Expert, llm: LLM, model: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            expert,
            llm,
            model: model.into(),
            temperature: 0.0,
            tools,
            max_steps: 12,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn expert(&self) -> Expert {
        self.expert
    }
}

#[async_trait]
impl ChatAgent for ExpertAgent {
    async fn invoke(&self, messages: Vec<LLMMessage>) -> AppResult<Vec<LLMMessage>> {
        info!(expert = %self.expert, message_count = messages.len(), "Invoking agent");

        let specs = self.tools.specs();
        let mut conversation = messages;
        let mut produced = Vec::new();

        for step in 1..=self.max_steps {
            let request = LLMRequest {
                model: self.model.clone(),
                messages: conversation.clone(),
                max_tokens: None,
                temperature: Some(self.temperature),
                tools: specs.clone(),
            };

            let response = self.llm.create_chat_completion(&request).await?;
            let reply = response.message;

            if reply.tool_calls.is_empty() {
                debug!(step, finish_reason = %response.finish_reason, "Agent produced final answer");
                produced.push(reply);
                return Ok(produced);
            }

            debug!(step, tool_calls = reply.tool_calls.len(), "Agent requested tools");
            let calls = reply.tool_calls.clone();
            conversation.push(reply.clone());
            produced.push(reply);

            for call in &calls {
                let result = self.tools.execute(call).await;
                let tool_message = LLMMessage::tool(call.id.clone(), result);
                conversation.push(tool_message.clone());
                produced.push(tool_message);
            }
        }

        warn!(expert = %self.expert, max_steps = self.max_steps, "Agent hit its step limit");
        Err(AppError::Agent(format!(
            "no final answer after {} model calls",
            self.max_steps
        )))
    }
}

/// Build an expert agent: the configured model at temperature 0 with the Wikipedia tool.
///
/// Every expert is built the same way; the label only names the selection.
pub fn build_expert_agent(expert: Expert, config: &Config) -> AppResult<ExpertAgent> {
    let llm = LLM::new(LLMProviderConfig::openai(&config.llm))?;
    let wikipedia = WikipediaClient::new(&config.wikipedia)?;
    let tools = ToolRegistry::new().with_tool(Arc::new(WikipediaTool::new(wikipedia)));

    Ok(ExpertAgent::new(expert, llm, config.llm.model.clone(), tools)
        .with_temperature(config.llm.temperature)
        .with_max_steps(config.llm.max_agent_steps))
}

/// One agent per expert
#[derive(Clone)]
pub struct ExpertAgents {
    agents: HashMap<Expert, Arc<dyn ChatAgent>>,
}

impl ExpertAgents {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let mut agents: HashMap<Expert, Arc<dyn ChatAgent>> = HashMap::new();
        for expert in Expert::ALL {
            agents.insert(expert, Arc::new(build_expert_agent(expert, config)?));
        }
        Ok(Self { agents })
    }

    /// Use the same agent for every expert
    pub fn uniform(agent: Arc<dyn ChatAgent>) -> Self {
        let agents = Expert::ALL
            .into_iter()
            .map(|expert| (expert, agent.clone()))
            .collect();
        Self { agents }
    }

    pub fn with_agent(mut self, expert: Expert, agent: Arc<dyn ChatAgent>) -> Self {
        self.agents.insert(expert, agent);
        self
    }

    pub fn get(&self, expert: Expert) -> AppResult<Arc<dyn ChatAgent>> {
        self.agents
            .get(&expert)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("no agent configured for {}", expert)))
    }
}

/// Ask an agent a single stateless question and return the text of its last message
pub async fn ask(agent: &dyn ChatAgent, prompt: &str) -> AppResult<String> {
    let messages = agent.invoke(vec![LLMMessage::user(prompt)]).await?;
    messages
        .last()
        .map(|m| m.text().to_string())
        .ok_or_else(|| AppError::Agent("agent returned no messages".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::tools::Tool;
    use crate::llm::LLMAdapter;
    use crate::types::{FunctionCall, LLMResponse, ToolCall, ToolSpec};
    use std::sync::Mutex;

    /// Replays canned replies and records every request it sees
    struct ScriptedAdapter {
        replies: Mutex<Vec<LLMMessage>>,
        requests: Mutex<Vec<LLMRequest>>,
    }

    impl ScriptedAdapter {
        fn new(mut replies: Vec<LLMMessage>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMAdapter for ScriptedAdapter {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let message = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::LLMApi("script exhausted".to_string()))?;
            Ok(LLMResponse {
                message,
                finish_reason: "stop".to_string(),
                usage: None,
            })
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "wikipedia"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec::function("wikipedia", "lookup", serde_json::json!({"type": "object"}))
        }

        async fn call(&self, _arguments: &str) -> AppResult<String> {
            Err(AppError::Tool("network unreachable".to_string()))
        }
    }

    fn tool_call(id: &str, query: &str) -> LLMMessage {
        LLMMessage::assistant_tool_calls(
            None,
            vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: "wikipedia".to_string(),
                    arguments: serde_json::json!({ "query": query }).to_string(),
                },
            }],
        )
    }

    fn agent(adapter: Arc<ScriptedAdapter>) -> ExpertAgent {
        let tools = ToolRegistry::new().with_tool(Arc::new(FailingTool));
        ExpertAgent::new(
            Expert::HistoryExpert,
            LLM::with_adapter("scripted", adapter),
            "gpt-4o-mini",
            tools,
        )
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let adapter = ScriptedAdapter::new(vec![LLMMessage::assistant("Delhi.")]);
        let answer = ask(&agent(adapter.clone()), "Capital of India?").await.unwrap();

        assert_eq!(answer, "Delhi.");
        let requests = adapter.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages, vec![LLMMessage::user("Capital of India?")]);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert_eq!(requests[0].tools.len(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back_to_model() {
        let adapter = ScriptedAdapter::new(vec![
            tool_call("call_1", "Ashoka"),
            LLMMessage::assistant("Ashoka ruled the Maurya Empire."),
        ]);

        let messages = agent(adapter.clone())
            .invoke(vec![LLMMessage::user("Who was Ashoka?")])
            .await
            .unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, "tool");
        assert_eq!(messages[1].tool_call_id.as_deref(), Some("call_1"));
        assert!(messages[1].text().contains("network unreachable"));
        assert_eq!(messages[2].text(), "Ashoka ruled the Maurya Empire.");

        let requests = adapter.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_step_limit() {
        let adapter = ScriptedAdapter::new(vec![
            tool_call("c1", "a"),
            tool_call("c2", "b"),
            tool_call("c3", "c"),
        ]);

        let err = agent(adapter)
            .with_max_steps(2)
            .invoke(vec![LLMMessage::user("loop forever")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Agent(_)));
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let adapter = ScriptedAdapter::new(vec![]);
        let err = ask(&agent(adapter), "anything").await.unwrap_err();
        assert!(matches!(err, AppError::LLMApi(_)));
    }

    #[test]
    fn test_build_expert_agent_uses_config() {
        let config = Config::from_lookup(|key| match key {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "AGENT_MAX_STEPS" => Some("4".to_string()),
            _ => None,
        })
        .unwrap();

        let agent = build_expert_agent(Expert::EnglishExpert, &config).unwrap();
        assert_eq!(agent.expert(), Expert::EnglishExpert);
        assert_eq!(agent.max_steps, 4);
        assert_eq!(agent.temperature, 0.0);
        assert_eq!(agent.tools.len(), 1);

        let experts = ExpertAgents::from_config(&config).unwrap();
        assert!(experts.get(Expert::HistoryExpert).is_ok());
        assert!(experts.get(Expert::EnglishExpert).is_ok());
    }
}
