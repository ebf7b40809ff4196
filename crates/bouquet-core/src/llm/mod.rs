//! Chat-completion client used to write wedding plans.
//!
//! [`ChatClient`] is the seam between plan generation and the network;
//! [`GroqClient`] talks to Groq's OpenAI-compatible API.

mod config;
mod error;
mod groq;
mod types;

pub use config::{ConfigError, LlmConfig, parse_timeout_secs};
pub use error::LlmError;
pub use groq::GroqClient;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role};

use async_trait::async_trait;

/// A provider that turns a chat request into a single completion.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Human-readable provider name (e.g. "groq"), used in logs.
    fn name(&self) -> &str;

    /// Request one completion for `request`.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn ChatClient) {}
};
