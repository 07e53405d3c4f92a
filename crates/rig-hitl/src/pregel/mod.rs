//! Pregel Runtime for resumable, graph-based workflows
//!
//! This module implements a Pregel-inspired runtime in which vertices can
//! pause the run to ask an external actor for input. Key concepts:
//!
//! - **Vertex**: Computation unit owning private state, one handler per
//!   accepted message kind
//! - **Edge**: Directed route between vertices, optionally filtered by kind
//! - **Superstep**: Synchronized execution phase
//! - **Pending request**: Suspension point tracked by the broker until an
//!   answer arrives through `resume`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PregelRuntime                            │
//! │  start(input)                         resume(answers)       │
//! │  ┌─────────┐  ┌─────────┐            ┌─────────┐            │
//! │  │Superstep│→ │Superstep│→ idle ...  │Superstep│→ ...       │
//! │  │    0    │  │    1    │  (pending) │    2    │            │
//! │  └─────────┘  └─────────┘            └─────────┘            │
//! │       │            │                      │                 │
//! │       ▼            ▼                      ▼                 │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │ Per-Superstep: Deliver → Compute → Collect → Route  │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod broker;
pub mod config;
pub mod driver;
pub mod error;
pub mod event;
pub mod message;
pub mod runtime;
pub mod vertex;
pub mod visualization;

// Re-exports
pub use broker::{PendingRequest, RequestBroker, RequestId};
pub use config::PregelConfig;
pub use driver::{drive, LoopOutcome, Reply, Responder, ScriptedResponder};
pub use error::PregelError;
pub use event::{RunEvents, RunState, WorkflowEvent};
pub use message::{MessageKind, RequestPrompt, RequestResponse, Route, VertexMessage};
pub use runtime::PregelRuntime;
pub use vertex::{BoxedVertex, ComputeContext, Effects, Vertex, VertexId};
pub use visualization::{render_edge, render_graph, render_node, sanitize_id};
