//! Vertex (Node) abstractions for the Pregel runtime
//!
//! A Vertex is a computation unit in the workflow graph. It owns its private
//! state and reacts to one inbound message at a time. Everything a vertex
//! wants to do to the outside world goes through the [`ComputeContext`]
//! handed to that single invocation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::PregelError;
use super::message::{MessageKind, Route, VertexMessage};

/// Unique identifier for a vertex in the workflow graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub String);

impl VertexId {
    /// Create a new VertexId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VertexId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VertexId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&VertexId> for VertexId {
    fn from(id: &VertexId) -> Self {
        id.clone()
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability object for a single handler invocation
///
/// Provides:
/// - Outbox for messages routed along the graph's edges
/// - Pending request slots for input that only the external actor can give
/// - The terminal output slot
/// - Current superstep number
///
/// The context is created by the runtime right before `handle` and consumed
/// right after, so a vertex cannot keep it around.
pub struct ComputeContext<M: VertexMessage> {
    /// Current superstep number (0-indexed, counted across invocations of a run)
    pub superstep: usize,
    vertex_id: VertexId,
    outbox: Vec<(Route, M)>,
    requests: Vec<M::Request>,
    output: Option<M::Output>,
}

impl<M: VertexMessage> ComputeContext<M> {
    /// Create a new compute context
    pub fn new(vertex_id: VertexId, superstep: usize) -> Self {
        Self {
            superstep,
            vertex_id,
            outbox: Vec::new(),
            requests: Vec::new(),
            output: None,
        }
    }

    /// Get the current vertex ID
    pub fn id(&self) -> &VertexId {
        &self.vertex_id
    }

    /// Send a message along every outgoing edge that accepts its kind
    ///
    /// Messages will be delivered at the start of the next superstep.
    pub fn send_message(&mut self, message: M) {
        self.outbox.push((Route::Edges, message));
    }

    /// Send a message to one specific edge target
    pub fn send_message_to(&mut self, target: impl Into<VertexId>, message: M) {
        self.outbox.push((Route::To(target.into()), message));
    }

    /// Ask the external actor for input
    ///
    /// The runtime registers the request with the broker once this
    /// invocation succeeds; the answer comes back to this vertex as a
    /// response message on a later `resume`.
    pub fn request_info(&mut self, request: M::Request) {
        self.requests.push(request);
    }

    /// Produce the terminal output of the run
    ///
    /// A second call within the same invocation replaces the first value.
    pub fn yield_output(&mut self, output: M::Output) {
        self.output = Some(output);
    }

    /// Check if anything has been emitted so far
    pub fn is_empty(&self) -> bool {
        self.outbox.is_empty() && self.requests.is_empty() && self.output.is_none()
    }

    /// Consume the context and return everything the handler emitted
    pub fn into_effects(self) -> Effects<M> {
        Effects {
            messages: self.outbox,
            requests: self.requests,
            output: self.output,
        }
    }
}

/// Everything one successful handler invocation emitted
#[derive(Debug)]
pub struct Effects<M: VertexMessage> {
    pub messages: Vec<(Route, M)>,
    pub requests: Vec<M::Request>,
    pub output: Option<M::Output>,
}

impl<M: VertexMessage> Default for Effects<M> {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            requests: Vec::new(),
            output: None,
        }
    }
}

/// The core vertex trait for Pregel computation
///
/// Each vertex in the workflow graph implements this trait. The runtime calls
/// `handle` once per delivered message, in enqueue order, and never calls the
/// same vertex concurrently with itself.
///
/// # Type Parameters
///
/// - `M`: The message type used for vertex communication
///
/// # Example
///
/// ```ignore
/// struct UppercaseVertex {
///     id: VertexId,
/// }
///
/// #[async_trait]
/// impl Vertex<TextMessage> for UppercaseVertex {
///     fn id(&self) -> &VertexId {
///         &self.id
///     }
///
///     fn accepts(&self) -> &[MessageKind] {
///         &["text"]
///     }
///
///     fn emits(&self) -> &[MessageKind] {
///         &["text"]
///     }
///
///     async fn handle(
///         &mut self,
///         message: TextMessage,
///         ctx: &mut ComputeContext<TextMessage>,
///     ) -> Result<(), PregelError> {
///         if let TextMessage::Text(text) = message {
///             ctx.send_message(TextMessage::Text(text.to_uppercase()));
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Vertex<M>: Send + Sync
where
    M: VertexMessage,
{
    /// Get the vertex's unique identifier
    fn id(&self) -> &VertexId;

    /// Message kinds this vertex has a handler for
    fn accepts(&self) -> &[MessageKind];

    /// Message kinds this vertex may send along its edges
    ///
    /// Checked against the graph's edges at build time so that an
    /// unroutable kind fails construction instead of a run.
    fn emits(&self) -> &[MessageKind] {
        &[]
    }

    /// React to one inbound message
    ///
    /// Returning an error discards everything emitted during this call.
    async fn handle(&mut self, message: M, ctx: &mut ComputeContext<M>)
        -> Result<(), PregelError>;

    /// Check if this vertex has a handler for the given kind
    fn accepts_kind(&self, kind: MessageKind) -> bool {
        self.accepts().contains(&kind)
    }
}

/// Boxed vertex for dynamic dispatch
pub type BoxedVertex<M> = Box<dyn Vertex<M>>;
