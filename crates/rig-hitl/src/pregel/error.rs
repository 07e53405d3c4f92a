//! Error types for Pregel runtime
//!
//! Errors here either abort an invocation (configuration, protocol and limit
//! errors) or describe a local handler failure that the runtime turns into a
//! `Failed` event while the run carries on.

use super::broker::RequestId;
use super::vertex::VertexId;
use thiserror::Error;

/// Errors that can occur during Pregel runtime execution
#[derive(Debug, Error)]
pub enum PregelError {
    /// Maximum supersteps exceeded within one invocation
    #[error("Max supersteps exceeded: {0}")]
    MaxSuperstepsExceeded(usize),

    /// Vertex computation timed out
    #[error("Vertex timeout: {0:?}")]
    VertexTimeout(VertexId),

    /// Error during vertex computation
    #[error("Vertex error in {vertex_id:?}: {message}")]
    VertexError {
        vertex_id: VertexId,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A message had no edge to travel along
    #[error("Routing error in {vertex_id:?}: {detail}")]
    RoutingError { vertex_id: VertexId, detail: String },

    /// A response referenced a request that is not pending
    #[error("Unknown request id: {0}")]
    UnknownRequestId(RequestId),

    /// The run is in a state that does not allow the requested call
    #[error("Invalid run state: {0}")]
    InvalidRunState(String),

    /// Invalid workflow configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Workflow execution timed out
    #[error("Workflow timeout after {0:?}")]
    WorkflowTimeout(std::time::Duration),
}

impl PregelError {
    /// Create a vertex error with a message
    pub fn vertex_error(vertex_id: impl Into<VertexId>, message: impl Into<String>) -> Self {
        Self::VertexError {
            vertex_id: vertex_id.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a vertex error with source
    pub fn vertex_error_with_source(
        vertex_id: impl Into<VertexId>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::VertexError {
            vertex_id: vertex_id.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a routing error
    pub fn routing_error(vertex_id: impl Into<VertexId>, detail: impl Into<String>) -> Self {
        Self::RoutingError {
            vertex_id: vertex_id.into(),
            detail: detail.into(),
        }
    }

    /// Create a config error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an invalid run state error
    pub fn invalid_run_state(message: impl Into<String>) -> Self {
        Self::InvalidRunState(message.into())
    }

    /// Check if the error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            PregelError::VertexTimeout(_) | PregelError::WorkflowTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    // Ensure errors are Send + Sync (compile-time check)
    static_assertions::assert_impl_all!(super::PregelError: Send, Sync);
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PregelError::MaxSuperstepsExceeded(100);
        assert_eq!(format!("{}", err), "Max supersteps exceeded: 100");

        let err = PregelError::UnknownRequestId(RequestId::from("abc"));
        assert_eq!(format!("{}", err), "Unknown request id: abc");
    }

    #[test]
    fn test_vertex_error() {
        let err = PregelError::vertex_error("node1", "computation failed");
        match err {
            PregelError::VertexError {
                vertex_id,
                message,
                source,
            } => {
                assert_eq!(vertex_id.0, "node1");
                assert_eq!(message, "computation failed");
                assert!(source.is_none());
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_vertex_error_with_source() {
        let err = PregelError::vertex_error_with_source(
            "parser",
            "bad payload",
            std::io::Error::other("eof"),
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_timeout() {
        assert!(PregelError::VertexTimeout(VertexId::from("slow")).is_timeout());
        assert!(PregelError::WorkflowTimeout(std::time::Duration::from_secs(1)).is_timeout());
        assert!(!PregelError::invalid_run_state("done").is_timeout());
    }
}
