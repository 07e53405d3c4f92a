//! Pre-built investment approval workflow
//!
//! Two vertices joined by kind-filtered edges:
//!
//! ```text
//!            ticker
//!              │
//!              ▼
//! ┌─────────────────────────┐  agent_request   ┌──────────────────┐
//! │ investment_turn_manager │ ───────────────▶ │ investment_agent │
//! │        (entry)          │ ◀─────────────── │                  │
//! └─────────────────────────┘  agent_response  └──────────────────┘
//!        ▲        │
//!        │        └── pending request (approval prompt)
//!   human_feedback
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use rig_hitl::invest::{InvestMessage, InvestWorkflowBuilder};
//! use rig_hitl::llm::ScriptedModelClient;
//!
//! let client = Arc::new(ScriptedModelClient::new([r#"{"ticker":"AAPL", ...}"#]));
//! let mut runtime = InvestWorkflowBuilder::new(client).build_runtime()?;
//! let events = runtime.start(InvestMessage::Ticker("AAPL".into())).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::analyst::AnalystVertex;
use super::messages::{kinds, InvestMessage};
use super::prompts::InvestPrompts;
use super::turn_manager::TurnManager;
use crate::llm::ModelClient;
use crate::pregel::{PregelConfig, PregelRuntime};
use crate::workflow::{Graph, GraphBuildError, WorkflowGraph};

/// Id of the turn coordination vertex
pub const TURN_MANAGER: &str = "investment_turn_manager";

/// Id of the analyst vertex
pub const ANALYST: &str = "investment_agent";

/// Builder for the investment approval workflow
#[derive(Clone)]
pub struct InvestWorkflowBuilder {
    /// Name of the workflow
    name: String,

    /// Model behind the analyst
    client: Arc<dyn ModelClient>,

    /// Analyst system instructions
    instructions: String,

    /// Runtime limits
    config: PregelConfig,
}

impl InvestWorkflowBuilder {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            name: "investment_approval".to_string(),
            client,
            instructions: InvestPrompts::analyst_instructions().to_string(),
            config: PregelConfig::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the analyst instructions
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn config(mut self, config: PregelConfig) -> Self {
        self.config = config;
        self
    }

    /// Limit for one analyst model call
    ///
    /// Four fifths of the vertex timeout, leaving the analyst time to turn
    /// an expired call into a failed [`AgentResponse`](super::messages::AgentResponse).
    pub fn model_timeout(&self) -> Duration {
        self.config.vertex_timeout * 4 / 5
    }

    /// Build the workflow graph
    pub fn build(&self) -> Result<Graph<InvestMessage>, GraphBuildError> {
        let analyst = AnalystVertex::new(ANALYST, Arc::clone(&self.client))
            .with_instructions(self.instructions.clone())
            .with_model_timeout(self.model_timeout());

        WorkflowGraph::new()
            .name(self.name.clone())
            .vertex(Box::new(TurnManager::new(TURN_MANAGER)))
            .vertex(Box::new(analyst))
            .entry(TURN_MANAGER)
            .edge_for(TURN_MANAGER, ANALYST, &[kinds::AGENT_REQUEST])
            .edge_for(ANALYST, TURN_MANAGER, &[kinds::AGENT_RESPONSE])
            .build()
    }

    /// Build a runtime over a fresh graph
    pub fn build_runtime(&self) -> Result<PregelRuntime<InvestMessage>, GraphBuildError> {
        Ok(PregelRuntime::with_config(self.build()?, self.config.clone()))
    }
}

impl std::fmt::Debug for InvestWorkflowBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvestWorkflowBuilder")
            .field("name", &self.name)
            .field("client", &self.client.name())
            .field("config", &self.config)
            .finish()
    }
}
