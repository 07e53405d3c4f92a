//! Scripted model client
//!
//! Replays queued replies in order, then falls back to a generator
//! function if one is set. Every conversation it receives is recorded so
//! tests can inspect what a vertex actually sent.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::provider::{ModelClient, ModelError};
use crate::state::ChatMessage;

/// Reply generator used once the queue is empty
pub type FallbackFn = fn(&[ChatMessage]) -> Result<String, ModelError>;

/// Model client returning predetermined replies
#[derive(Debug, Default)]
pub struct ScriptedModelClient {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    fallback: Option<FallbackFn>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModelClient {
    /// Create a client replaying these successful replies
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(replies.into_iter().map(|reply| Ok(reply.into())))
    }

    /// Create a client replaying replies that may be failures
    pub fn from_results(replies: impl IntoIterator<Item = Result<String, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Generate replies with `fallback` once the queue runs dry
    pub fn with_fallback(mut self, fallback: FallbackFn) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Conversations received so far, oldest first
    pub async fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn generate(&self, conversation: &[ChatMessage]) -> Result<String, ModelError> {
        if conversation.is_empty() {
            return Err(ModelError::EmptyConversation);
        }
        self.calls.lock().await.push(conversation.to_vec());

        if let Some(reply) = self.replies.lock().await.pop_front() {
            return reply;
        }
        match self.fallback {
            Some(fallback) => fallback(conversation),
            None => Err(ModelError::Exhausted),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_exhausts() {
        let client = ScriptedModelClient::new(["one", "two"]);
        let conversation = [ChatMessage::user("hi")];

        assert_eq!(client.generate(&conversation).await.unwrap(), "one");
        assert_eq!(client.generate(&conversation).await.unwrap(), "two");
        assert_eq!(
            client.generate(&conversation).await.unwrap_err(),
            ModelError::Exhausted
        );
        assert_eq!(client.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let client = ScriptedModelClient::from_results([Err(ModelError::provider("down"))]);
        let result = client.generate(&[ChatMessage::user("hi")]).await;
        assert_eq!(result.unwrap_err(), ModelError::Provider("down".into()));
    }

    #[tokio::test]
    async fn test_fallback_after_queue() {
        fn shout(conversation: &[ChatMessage]) -> Result<String, ModelError> {
            Ok(conversation
                .last()
                .map(|m| m.content.to_uppercase())
                .unwrap_or_default())
        }

        let client = ScriptedModelClient::new(["queued"]).with_fallback(shout);
        let conversation = [ChatMessage::user("quiet")];

        assert_eq!(client.generate(&conversation).await.unwrap(), "queued");
        assert_eq!(client.generate(&conversation).await.unwrap(), "QUIET");
    }

    #[tokio::test]
    async fn test_empty_conversation_rejected() {
        let client = ScriptedModelClient::new(["unused"]);
        assert_eq!(
            client.generate(&[]).await.unwrap_err(),
            ModelError::EmptyConversation
        );
        assert!(client.calls().await.is_empty());
    }
}
