//! Analyst vertex backed by a model client

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::messages::{kinds, AgentResponse, InvestMessage};
use super::prompts::InvestPrompts;
use super::recommendation::InvestmentRecommendation;
use crate::llm::{ModelClient, ModelError};
use crate::pregel::{ComputeContext, MessageKind, PregelError, Vertex, VertexId};
use crate::state::{last_with_role, ChatMessage, Role};

/// Vertex answering agent requests with a language model
///
/// Keeps the whole thread: every request's user turns and the model's
/// reply are appended, so a refinement sees the earlier recommendation.
///
/// A model call is bounded by its own timeout. Keep it below the runtime's
/// vertex timeout: a slow model then still yields an [`AgentResponse`]
/// carrying [`ModelError::Timeout`] instead of a dropped handler.
pub struct AnalystVertex {
    id: VertexId,
    client: Arc<dyn ModelClient>,
    instructions: String,
    history: Vec<ChatMessage>,
    model_timeout: Duration,
}

impl AnalystVertex {
    pub fn new(id: impl Into<VertexId>, client: Arc<dyn ModelClient>) -> Self {
        Self {
            id: id.into(),
            client,
            instructions: InvestPrompts::analyst_instructions().to_string(),
            history: Vec::new(),
            model_timeout: Duration::from_secs(240),
        }
    }

    /// Limit for a single model call
    pub fn with_model_timeout(mut self, model_timeout: Duration) -> Self {
        self.model_timeout = model_timeout;
        self
    }

    /// Replace the system instructions
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Thread so far, without the system instructions
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    fn conversation(&self) -> Vec<ChatMessage> {
        let mut conversation = Vec::with_capacity(self.history.len() + 1);
        if !self.instructions.is_empty() {
            conversation.push(ChatMessage::system(self.instructions.clone()));
        }
        conversation.extend(self.history.iter().cloned());
        conversation
    }
}

#[async_trait]
impl Vertex<InvestMessage> for AnalystVertex {
    fn id(&self) -> &VertexId {
        &self.id
    }

    fn accepts(&self) -> &[MessageKind] {
        &[kinds::AGENT_REQUEST]
    }

    fn emits(&self) -> &[MessageKind] {
        &[kinds::AGENT_RESPONSE]
    }

    async fn handle(
        &mut self,
        message: InvestMessage,
        ctx: &mut ComputeContext<InvestMessage>,
    ) -> Result<(), PregelError> {
        let InvestMessage::AgentRequest(request) = message else {
            return Ok(());
        };

        self.history.extend(request.messages);
        let conversation = self.conversation();
        debug!(
            vertex = %self.id,
            client = self.client.name(),
            turns = conversation.len(),
            "Calling model"
        );

        let reply = timeout(self.model_timeout, self.client.generate(&conversation))
            .await
            .unwrap_or(Err(ModelError::Timeout(self.model_timeout)));

        let response = match reply {
            Ok(text) => {
                self.history.push(ChatMessage::assistant(text.clone()));
                AgentResponse::text(text)
            }
            Err(error) => {
                warn!(vertex = %self.id, error = %error, "Model call failed");
                AgentResponse::failed(error)
            }
        };

        ctx.send_message(InvestMessage::AgentResponse(response));
        Ok(())
    }
}

/// Canned analyst used when no model endpoint is configured
///
/// Produces a valid recommendation for the ticker named in the first
/// analysis request of the thread. A refinement echoes its feedback in the
/// rationale.
pub fn offline_reply(conversation: &[ChatMessage]) -> Result<String, ModelError> {
    let ticker = conversation
        .iter()
        .filter(|message| message.role == Role::User)
        .find_map(|message| InvestPrompts::ticker_from_analysis_request(&message.content))
        .unwrap_or("UNKNOWN");

    let feedback = last_with_role(conversation, Role::User)
        .and_then(|message| InvestPrompts::feedback_from_refinement_request(&message.content));

    let rationale = match feedback {
        Some(feedback) => format!(
            "Revised after review ({}): steady cash flow and a balanced risk profile support holding {}.",
            feedback, ticker
        ),
        None => format!(
            "Offline analysis: steady cash flow and a balanced risk profile support holding {}.",
            ticker
        ),
    };

    InvestmentRecommendation {
        ticker: ticker.to_string(),
        action: "HOLD".to_string(),
        rationale,
        confidence: "MEDIUM".to_string(),
    }
    .to_json()
    .map_err(|e| ModelError::provider(e.to_string()))
}
