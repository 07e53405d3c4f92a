//! Investment approval workflow
//!
//! A worked example of the human-in-the-loop runtime: an analyst vertex
//! produces a structured recommendation and a turn manager asks a human to
//! approve it, refine it or walk away.
//!
//! - [`TurnManager`]: turn coordination state machine (entry vertex)
//! - [`AnalystVertex`]: model-backed analyst with conversation memory
//! - [`InvestPrompts`]: prompt texts and approval prompt layouts
//! - [`Decision`]: parsing of the reviewer's replies

pub mod analyst;
pub mod decision;
pub mod messages;
pub mod prompts;
pub mod recommendation;
pub mod turn_manager;
pub mod workflow;

pub use analyst::{offline_reply, AnalystVertex};
pub use decision::{Decision, DEFAULT_REFINEMENT};
pub use messages::{kinds, AgentRequest, AgentResponse, ApprovalRequest, InvestMessage};
pub use prompts::InvestPrompts;
pub use recommendation::{InvestmentRecommendation, RecommendationError};
pub use turn_manager::{TurnManager, TurnState};
pub use workflow::{InvestWorkflowBuilder, ANALYST, TURN_MANAGER};
