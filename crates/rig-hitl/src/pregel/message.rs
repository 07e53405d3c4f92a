//! Message types for Pregel vertex communication
//!
//! Vertices communicate by sending messages to each other. Messages are
//! delivered at the start of the next superstep. Responses from the external
//! actor re-enter the graph as ordinary messages built by
//! [`VertexMessage::from_response`].

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::broker::RequestId;
use super::vertex::VertexId;

/// Type tag of a message, used for handler dispatch and edge filtering
pub type MessageKind = &'static str;

/// Payload handed to the external actor with a pending request
pub trait RequestPrompt: Clone + Debug + Send + Sync + 'static {
    /// Text shown to whoever answers the request
    fn prompt(&self) -> &str;
}

/// Trait bound for vertex messages
///
/// A workflow defines one message enum; the associated types fix what its
/// vertices may ask the external actor and what the run finally produces.
pub trait VertexMessage: Clone + Debug + Send + Sync + 'static {
    /// Payload of a pending request
    type Request: RequestPrompt;

    /// Terminal value of a run
    type Output: Clone + Debug + Send + Sync + 'static;

    /// Type tag of this message
    fn kind(&self) -> MessageKind;

    /// Wrap an external answer so it can be delivered to the requesting vertex
    fn from_response(response: RequestResponse<Self::Request>) -> Self;
}

/// Delivery hint attached to every emitted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Every outgoing edge whose filter and target accept the message kind
    Edges,
    /// One specific edge target
    To(VertexId),
}

/// An external answer correlated with the request that asked for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResponse<R> {
    /// Id the broker issued for the request
    pub request_id: RequestId,
    /// The request as originally emitted
    pub original_request: R,
    /// Raw answer text
    pub data: String,
}

impl<R> RequestResponse<R> {
    /// Create a new response
    pub fn new(request_id: RequestId, original_request: R, data: impl Into<String>) -> Self {
        Self {
            request_id,
            original_request,
            data: data.into(),
        }
    }
}

/// A message in flight between supersteps
#[derive(Debug, Clone)]
pub(crate) struct Envelope<M> {
    pub source: Option<VertexId>,
    pub target: usize,
    pub message: M,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal request payload shared by the pregel unit tests
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct TestRequest {
        pub prompt: String,
    }

    impl TestRequest {
        pub fn new(prompt: impl Into<String>) -> Self {
            Self {
                prompt: prompt.into(),
            }
        }
    }

    impl RequestPrompt for TestRequest {
        fn prompt(&self) -> &str {
            &self.prompt
        }
    }

    /// Minimal message enum shared by the pregel unit tests
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum TestMsg {
        Text(String),
        Number(i64),
        Answer(RequestResponse<TestRequest>),
    }

    impl VertexMessage for TestMsg {
        type Request = TestRequest;
        type Output = String;

        fn kind(&self) -> MessageKind {
            match self {
                TestMsg::Text(_) => "text",
                TestMsg::Number(_) => "number",
                TestMsg::Answer(_) => "answer",
            }
        }

        fn from_response(response: RequestResponse<TestRequest>) -> Self {
            TestMsg::Answer(response)
        }
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(TestMsg::Text("a".into()).kind(), "text");
        assert_eq!(TestMsg::Number(1).kind(), "number");
    }

    #[test]
    fn test_from_response_keeps_correlation() {
        let id = RequestId::new();
        let msg = TestMsg::from_response(RequestResponse::new(
            id.clone(),
            TestRequest::new("continue?"),
            "yes",
        ));
        match msg {
            TestMsg::Answer(response) => {
                assert_eq!(response.request_id, id);
                assert_eq!(response.original_request.prompt(), "continue?");
                assert_eq!(response.data, "yes");
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_route_equality() {
        assert_eq!(Route::Edges, Route::Edges);
        assert_ne!(Route::To(VertexId::new("a")), Route::To(VertexId::new("b")));
    }
}
