//! Messages exchanged inside the investment approval workflow

use serde::{Deserialize, Serialize};

use crate::llm::ModelError;
use crate::pregel::{MessageKind, RequestPrompt, RequestResponse, VertexMessage};
use crate::state::ChatMessage;

/// Message kind tags
pub mod kinds {
    use crate::pregel::MessageKind;

    pub const TICKER: MessageKind = "ticker";
    pub const AGENT_REQUEST: MessageKind = "agent_request";
    pub const AGENT_RESPONSE: MessageKind = "agent_response";
    pub const HUMAN_FEEDBACK: MessageKind = "human_feedback";
}

/// Pending request shown to the human reviewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Formatted text to display
    pub prompt: String,
    /// Raw model output the prompt was built from
    pub recommendation: String,
    /// Ticker from the parsed recommendation; empty for a degraded prompt
    pub ticker: String,
}

impl RequestPrompt for ApprovalRequest {
    fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// New user turns for the analyst
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRequest {
    pub messages: Vec<ChatMessage>,
}

impl AgentRequest {
    /// Request with a single user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(text)],
        }
    }
}

/// What the analyst produced for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    /// Reply text, or the model failure
    pub reply: Result<String, ModelError>,
}

impl AgentResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
        }
    }

    pub fn failed(error: ModelError) -> Self {
        Self { reply: Err(error) }
    }
}

/// Every message of the investment workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvestMessage {
    /// Stock symbol that starts a run
    Ticker(String),
    AgentRequest(AgentRequest),
    AgentResponse(AgentResponse),
    /// Human answer to an [`ApprovalRequest`]
    HumanFeedback(RequestResponse<ApprovalRequest>),
}

impl VertexMessage for InvestMessage {
    type Request = ApprovalRequest;
    type Output = String;

    fn kind(&self) -> MessageKind {
        match self {
            InvestMessage::Ticker(_) => kinds::TICKER,
            InvestMessage::AgentRequest(_) => kinds::AGENT_REQUEST,
            InvestMessage::AgentResponse(_) => kinds::AGENT_RESPONSE,
            InvestMessage::HumanFeedback(_) => kinds::HUMAN_FEEDBACK,
        }
    }

    fn from_response(response: RequestResponse<ApprovalRequest>) -> Self {
        InvestMessage::HumanFeedback(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pregel::RequestId;

    #[test]
    fn test_kinds() {
        assert_eq!(InvestMessage::Ticker("AAPL".into()).kind(), "ticker");
        assert_eq!(
            InvestMessage::AgentRequest(AgentRequest::user("hi")).kind(),
            "agent_request"
        );
        assert_eq!(
            InvestMessage::AgentResponse(AgentResponse::failed(ModelError::Exhausted)).kind(),
            "agent_response"
        );
    }

    #[test]
    fn test_from_response_is_human_feedback() {
        let request = ApprovalRequest {
            prompt: "approve?".into(),
            recommendation: "{}".into(),
            ticker: "AAPL".into(),
        };
        let message = InvestMessage::from_response(RequestResponse::new(
            RequestId::from("r1"),
            request.clone(),
            "approve",
        ));

        assert_eq!(message.kind(), kinds::HUMAN_FEEDBACK);
        match message {
            InvestMessage::HumanFeedback(feedback) => {
                assert_eq!(feedback.original_request, request);
                assert_eq!(feedback.data, "approve");
            }
            other => panic!("Expected HumanFeedback, got {:?}", other),
        }
    }
}
