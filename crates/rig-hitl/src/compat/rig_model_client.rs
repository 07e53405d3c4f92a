//! Adapter for using Rig Agents as a `ModelClient`
//!
//! `RigModelClient` wraps a Rig `Agent<M>` so any of Rig's providers can
//! back an analyst vertex. System turns of the conversation are merged into
//! the agent's preamble, the last turn becomes the prompt and everything in
//! between is sent as chat history.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rig::client::{CompletionClient, ProviderClient};
//! use rig::providers::ollama;
//! use rig_hitl::compat::RigModelClient;
//!
//! let client = ollama::Client::from_env();
//! let agent = client.agent("llama3.2").preamble("You are helpful.").build();
//! let model = RigModelClient::new(agent);
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use rig::agent::Agent;
use rig::completion::{Completion, CompletionModel, Message as RigMessage};
use rig::message::AssistantContent;
use rig::OneOrMany;

use crate::llm::{ModelClient, ModelError};
use crate::state::{ChatMessage, Role};

/// Adapter that wraps a Rig `Agent<M>` to implement `ModelClient`.
pub struct RigModelClient<M>
where
    M: CompletionModel + Send + Sync,
{
    agent: Arc<Agent<M>>,
    name: String,
}

impl<M> RigModelClient<M>
where
    M: CompletionModel + Send + Sync,
{
    /// Create a new adapter wrapping a Rig agent.
    pub fn new(agent: Agent<M>) -> Self {
        Self::with_name(agent, "rig-agent")
    }

    /// Create adapter with a custom name for logging.
    pub fn with_name(agent: Agent<M>, name: impl Into<String>) -> Self {
        Self {
            agent: Arc::new(agent),
            name: name.into(),
        }
    }

    /// Get a reference to the inner Rig agent.
    pub fn agent(&self) -> &Agent<M> {
        &self.agent
    }
}

#[async_trait]
impl<M> ModelClient for RigModelClient<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    async fn generate(&self, conversation: &[ChatMessage]) -> Result<String, ModelError> {
        let request = build_rig_conversation(conversation).ok_or(ModelError::EmptyConversation)?;

        let mut builder = self
            .agent
            .completion(request.prompt, request.history)
            .await
            .map_err(|e| ModelError::provider(format!("Rig agent error: {}", e)))?;

        if let Some(system_preamble) = request.preamble {
            let preamble = match self.agent.preamble.as_deref() {
                Some(agent_preamble) => format!("{}\n\n{}", agent_preamble, system_preamble),
                None => system_preamble,
            };
            builder = builder.preamble(preamble);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ModelError::provider(format!("Rig agent error: {}", e)))?;

        let text = text_from_rig_choice(&response.choice);
        tracing::debug!(client = %self.name, chars = text.len(), "Model replied");
        Ok(text)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct RigConversation {
    prompt: RigMessage,
    history: Vec<RigMessage>,
    preamble: Option<String>,
}

/// Split a conversation into preamble, history and prompt
///
/// Returns `None` when there is no user or assistant turn to send.
fn build_rig_conversation(conversation: &[ChatMessage]) -> Option<RigConversation> {
    let mut system_parts = Vec::new();
    let mut rig_messages = Vec::new();

    for message in conversation {
        match message.role {
            Role::System => {
                if !message.content.trim().is_empty() {
                    system_parts.push(message.content.clone());
                }
            }
            Role::User => rig_messages.push(RigMessage::user(message.content.clone())),
            Role::Assistant => rig_messages.push(RigMessage::assistant(message.content.clone())),
        }
    }

    let prompt = rig_messages.pop()?;
    let preamble = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    Some(RigConversation {
        prompt,
        history: rig_messages,
        preamble,
    })
}

fn text_from_rig_choice(choice: &OneOrMany<AssistantContent>) -> String {
    choice
        .iter()
        .filter_map(|item| match item {
            AssistantContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl<M> std::fmt::Debug for RigModelClient<M>
where
    M: CompletionModel + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigModelClient")
            .field("name", &self.name)
            .finish()
    }
}
