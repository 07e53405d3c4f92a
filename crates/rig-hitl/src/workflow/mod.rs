//! Workflow graph construction
//!
//! [`WorkflowGraph`] collects vertices and edges; [`WorkflowGraph::build`]
//! validates them into the immutable [`Graph`] a runtime executes.

pub mod graph;

pub use graph::{Edge, Graph, GraphBuildError, GraphEdge, WorkflowGraph};
