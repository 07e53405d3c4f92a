//! Model client trait definition
//!
//! Defines the single seam between vertices and a language model.
//! Implementations bridge to Rig agents (see `compat`) or replay scripted
//! replies for offline runs and tests.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::ChatMessage;

/// Errors returned by a model client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The provider call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Nothing to send
    #[error("Empty conversation")]
    EmptyConversation,

    /// A scripted client ran out of replies
    #[error("No scripted reply left")]
    Exhausted,

    /// The call did not finish in time
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),
}

impl ModelError {
    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}

/// Text generation over a conversation
///
/// Failures are local to the calling vertex; they never abort a run.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate the next assistant reply for a conversation
    async fn generate(&self, conversation: &[ChatMessage]) -> Result<String, ModelError>;

    /// Client name for logging
    fn name(&self) -> &str {
        "model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ModelClient for Echo {
        async fn generate(&self, conversation: &[ChatMessage]) -> Result<String, ModelError> {
            conversation
                .last()
                .map(|message| message.content.clone())
                .ok_or(ModelError::EmptyConversation)
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let client: Box<dyn ModelClient> = Box::new(Echo);
        assert_eq!(client.name(), "model");
        assert_eq!(
            client.generate(&[ChatMessage::user("ping")]).await.unwrap(),
            "ping"
        );
        assert_eq!(
            client.generate(&[]).await.unwrap_err(),
            ModelError::EmptyConversation
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ModelError::provider("rate limited").to_string(),
            "Provider error: rate limited"
        );
        assert_eq!(
            ModelError::Timeout(Duration::from_millis(1500)).to_string(),
            "Model call timed out after 1.5s"
        );
    }
}
