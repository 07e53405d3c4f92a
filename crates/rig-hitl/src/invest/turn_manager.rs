//! Turn coordination between the analyst and the human reviewer
//!
//! The turn manager owns the conversation flow of one run:
//!
//! ```text
//! AwaitStart ──ticker──▶ AwaitAgentResult ──agent reply──▶ AwaitHumanDecision
//!                              ▲                                 │
//!                              └──── refine / invalid reply ─────┤
//!                                                                │ approve
//!                                                                ▼
//!                                                            Completed
//! ```
//!
//! Every agent reply, parsed or not, becomes a pending request for the
//! reviewer. Unparseable replies produce a degraded prompt carrying the raw
//! text so the reviewer can still decide.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::decision::Decision;
use super::messages::{kinds, AgentRequest, AgentResponse, ApprovalRequest, InvestMessage};
use super::prompts::InvestPrompts;
use super::recommendation::{InvestmentRecommendation, RecommendationError};
use crate::pregel::{
    ComputeContext, MessageKind, PregelError, RequestResponse, Vertex, VertexId, VertexMessage,
};

/// Phase of the approval conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    AwaitStart,
    AwaitAgentResult,
    AwaitHumanDecision,
    Completed,
}

/// Vertex coordinating analyst turns and human decisions
pub struct TurnManager {
    id: VertexId,
    state: TurnState,
    /// Ticker the run was started with
    subject: Option<String>,
}

impl TurnManager {
    pub fn new(id: impl Into<VertexId>) -> Self {
        Self {
            id: id.into(),
            state: TurnState::AwaitStart,
            subject: None,
        }
    }

    /// Current phase
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Ticker the run was started with, if any
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn start(&mut self, ticker: String, ctx: &mut ComputeContext<InvestMessage>) {
        let ticker = ticker.trim().to_string();
        info!(vertex = %self.id, ticker = %ticker, "Starting analysis");

        ctx.send_message(InvestMessage::AgentRequest(AgentRequest::user(
            InvestPrompts::analysis_request(&ticker),
        )));
        self.subject = Some(ticker);
        self.state = TurnState::AwaitAgentResult;
    }

    fn present(&mut self, response: AgentResponse, ctx: &mut ComputeContext<InvestMessage>) {
        let request = match response.reply {
            Ok(text) => match InvestmentRecommendation::parse(&text) {
                Ok(rec) => {
                    debug!(vertex = %self.id, ticker = %rec.ticker, action = %rec.action, "Recommendation parsed");
                    ApprovalRequest {
                        prompt: InvestPrompts::recommendation_prompt(&rec),
                        ticker: rec.ticker,
                        recommendation: text,
                    }
                }
                Err(error) => self.degraded(text, error),
            },
            Err(error) => self.degraded(String::new(), RecommendationError::from(error)),
        };

        ctx.request_info(request);
        self.state = TurnState::AwaitHumanDecision;
    }

    fn degraded(&self, raw: String, error: RecommendationError) -> ApprovalRequest {
        warn!(vertex = %self.id, error = %error, "Agent reply is not a usable recommendation");
        ApprovalRequest {
            prompt: InvestPrompts::degraded_prompt(&raw, &error),
            recommendation: raw,
            ticker: String::new(),
        }
    }

    fn decide(
        &mut self,
        feedback: RequestResponse<ApprovalRequest>,
        ctx: &mut ComputeContext<InvestMessage>,
    ) {
        match Decision::parse(&feedback.data) {
            Decision::Approve => {
                let ticker = if feedback.original_request.ticker.is_empty() {
                    self.subject.clone().unwrap_or_default()
                } else {
                    feedback.original_request.ticker
                };
                info!(vertex = %self.id, ticker = %ticker, "Recommendation approved");
                ctx.yield_output(InvestPrompts::approval_output(&ticker));
                self.state = TurnState::Completed;
            }
            Decision::Refine(text) => {
                info!(vertex = %self.id, feedback = %text, "Refinement requested");
                ctx.send_message(InvestMessage::AgentRequest(AgentRequest::user(
                    InvestPrompts::refinement_request(&text),
                )));
                self.state = TurnState::AwaitAgentResult;
            }
            Decision::Exit | Decision::Invalid(_) => {
                warn!(vertex = %self.id, reply = %feedback.data, "Unrecognised reply, asking agent again");
                ctx.send_message(InvestMessage::AgentRequest(AgentRequest::user(
                    InvestPrompts::invalid_input_request(),
                )));
                self.state = TurnState::AwaitAgentResult;
            }
        }
    }
}

#[async_trait]
impl Vertex<InvestMessage> for TurnManager {
    fn id(&self) -> &VertexId {
        &self.id
    }

    fn accepts(&self) -> &[MessageKind] {
        &[kinds::TICKER, kinds::AGENT_RESPONSE, kinds::HUMAN_FEEDBACK]
    }

    fn emits(&self) -> &[MessageKind] {
        &[kinds::AGENT_REQUEST]
    }

    async fn handle(
        &mut self,
        message: InvestMessage,
        ctx: &mut ComputeContext<InvestMessage>,
    ) -> Result<(), PregelError> {
        match (self.state, message) {
            (TurnState::AwaitStart, InvestMessage::Ticker(ticker)) => self.start(ticker, ctx),
            (TurnState::AwaitAgentResult, InvestMessage::AgentResponse(response)) => {
                self.present(response, ctx)
            }
            (TurnState::AwaitHumanDecision, InvestMessage::HumanFeedback(feedback)) => {
                self.decide(feedback, ctx)
            }
            (state, message) => {
                warn!(
                    vertex = %self.id,
                    state = ?state,
                    kind = message.kind(),
                    "Ignoring unexpected message"
                );
            }
        }
        Ok(())
    }
}
