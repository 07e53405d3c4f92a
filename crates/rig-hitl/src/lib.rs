//! rig-hitl: resumable dataflow workflows with human-in-the-loop requests for Rig
//!
//! - Pregel runtime: vertices exchange typed messages in supersteps and can
//!   suspend a run by issuing pending requests to an external actor
//! - WorkflowGraph: builder for vertices and kind-filtered edges
//! - ModelClient: the seam between vertices and a language model
//! - RigModelClient: any Rig agent as a `ModelClient`
//! - invest: an investment recommendation workflow with human approval
//!
//! # Caller loop
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use rig_hitl::{InvestMessage, InvestWorkflowBuilder, ScriptedModelClient};
//!
//! let client = Arc::new(ScriptedModelClient::new(Vec::<String>::new()));
//! let mut runtime = InvestWorkflowBuilder::new(client).build_runtime()?;
//!
//! let mut events = runtime.start(InvestMessage::Ticker("AAPL".into())).await?;
//! while events.output().is_none() {
//!     let answers: HashMap<_, _> = events
//!         .request_infos()
//!         .into_iter()
//!         .map(|(id, _request)| (id.clone(), "approve".to_string()))
//!         .collect();
//!     events = runtime.resume(answers).await?;
//! }
//! ```

pub mod compat;
pub mod invest;
pub mod llm;
pub mod pregel;
pub mod state;
pub mod workflow;

// Re-exports for convenience
pub use compat::RigModelClient;
pub use llm::{ModelClient, ModelError, ScriptedModelClient};
pub use pregel::{
    drive, LoopOutcome, PregelConfig, PregelError, PregelRuntime, Reply, RequestId, Responder,
    RunEvents, RunState, ScriptedResponder, Vertex, VertexId, VertexMessage, WorkflowEvent,
};
pub use state::{ChatMessage, Role};
pub use workflow::{Graph, GraphBuildError, WorkflowGraph};

// Investment workflow exports
pub use invest::{
    ApprovalRequest, Decision, InvestMessage, InvestPrompts, InvestWorkflowBuilder,
    InvestmentRecommendation, RecommendationError, TurnManager,
};
