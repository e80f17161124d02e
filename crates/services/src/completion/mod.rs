//! Text-completion seam between the tutor and an LLM provider.

mod anthropic;

use async_trait::async_trait;
use tutor_core::model::ChatMessage;

use crate::error::CompletionError;

pub use anthropic::{AnthropicClient, AnthropicConfig};

/// Reply returned by `DryRunClient`.
pub const DRY_RUN_REPLY: &str = "This is a mock tutor response for testing purposes.";

/// One request: a system prompt plus the message history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(system: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system: system.into(),
            messages,
        }
    }

    /// A request with a single student message.
    #[must_use]
    pub fn single(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(system, vec![ChatMessage::user(prompt)])
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate the assistant reply for `request`.
    ///
    /// # Errors
    ///
    /// Returns `CompletionError` if the provider is unavailable or replies
    /// without text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError>;
}

/// Offline client that answers every request with `DRY_RUN_REPLY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunClient;

#[async_trait]
impl CompletionClient for DryRunClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
        Ok(DRY_RUN_REPLY.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_ignores_the_request() {
        let reply = DryRunClient
            .complete(CompletionRequest::single("system", "hello"))
            .await
            .unwrap();
        assert_eq!(reply, DRY_RUN_REPLY);
    }
}
