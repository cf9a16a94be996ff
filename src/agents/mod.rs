//! Agent System
//!
//! The experts a user can chat with, and what they can do:
//!
//! - **Expert Agent**: tool-calling loop over the chat model, one per [`Expert`]
//! - **Tools**: callables the model may invoke mid-reasoning (Wikipedia lookup)
//! - **Summarizer**: one-shot summary of an uploaded document
//!
//! ```text
//! User Message
//!      │
//!      ▼
//! ┌─────────────┐   tool calls   ┌─────────────┐
//! │   Expert    │ ─────────────► │  Wikipedia  │
//! │   Agent     │ ◄───────────── │    Tool     │
//! └─────────────┘   tool results └─────────────┘
//!      │
//!      ▼
//!   Reply
//! ```
//!
//! [`Expert`]: crate::models::Expert

pub mod expert;
pub mod summarizer;
pub mod tools;

pub use expert::{ask, build_expert_agent, ChatAgent, ExpertAgent, ExpertAgents};
pub use summarizer::{build_summary_prompt, summarize, SUMMARY_INPUT_CHARS, SUMMARY_PREFIX};
pub use tools::{Tool, ToolRegistry, WikipediaTool};
