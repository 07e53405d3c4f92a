//! WorkflowGraph builder DSL.
//!
//! Provides a fluent API for registering vertices, typed edges and the entry
//! point, then validates everything and freezes it into a [`Graph`] the
//! runtime can execute.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::pregel::message::{MessageKind, Route, VertexMessage};
use crate::pregel::vertex::{BoxedVertex, VertexId};

/// Edge definition collected by the builder.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    /// Message kinds allowed on this edge; `None` lets every kind through.
    pub kinds: Option<Vec<MessageKind>>,
}

/// Errors that can occur while building a workflow graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphBuildError {
    #[error("workflow entry point not set")]
    NoEntryPoint,
    #[error("unknown node id: {0}")]
    UnknownNode(String),
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("edge {from} -> {to} allows kind '{kind}' which {to} does not accept")]
    FilterRejected {
        from: String,
        to: String,
        kind: MessageKind,
    },
    #[error("node {vertex} emits kind '{kind}' but no edge delivers it")]
    UnroutedMessage { vertex: String, kind: MessageKind },
}

/// Builder for constructing workflow graphs with fluent API.
pub struct WorkflowGraph<M: VertexMessage> {
    name: String,
    vertices: Vec<BoxedVertex<M>>,
    edges: Vec<GraphEdge>,
    entry_point: Option<String>,
}

impl<M: VertexMessage> Default for WorkflowGraph<M> {
    fn default() -> Self {
        Self {
            name: String::new(),
            vertices: Vec::new(),
            edges: Vec::new(),
            entry_point: None,
        }
    }
}

impl<M: VertexMessage> WorkflowGraph<M> {
    /// Create a new workflow graph builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the workflow name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a vertex. Its id comes from [`Vertex::id`](crate::pregel::Vertex::id).
    pub fn vertex(mut self, vertex: BoxedVertex<M>) -> Self {
        self.vertices.push(vertex);
        self
    }

    /// Set the entry point node.
    pub fn entry(mut self, id: impl Into<String>) -> Self {
        self.entry_point = Some(id.into());
        self
    }

    /// Add an unfiltered edge between nodes.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(GraphEdge {
            from: from.into(),
            to: to.into(),
            kinds: None,
        });
        self
    }

    /// Add an edge that only carries the listed message kinds.
    pub fn edge_for(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        kinds: &[MessageKind],
    ) -> Self {
        self.edges.push(GraphEdge {
            from: from.into(),
            to: to.into(),
            kinds: Some(kinds.to_vec()),
        });
        self
    }

    /// Validate and build the workflow graph.
    pub fn build(self) -> Result<Graph<M>, GraphBuildError> {
        let entry_point = self.entry_point.ok_or(GraphBuildError::NoEntryPoint)?;

        let mut index: HashMap<VertexId, usize> = HashMap::new();
        let mut ids = Vec::with_capacity(self.vertices.len());
        let mut accepts = Vec::with_capacity(self.vertices.len());
        let mut emits = Vec::with_capacity(self.vertices.len());
        for (position, vertex) in self.vertices.iter().enumerate() {
            let id = vertex.id().clone();
            if index.insert(id.clone(), position).is_some() {
                return Err(GraphBuildError::DuplicateNode(id.0));
            }
            accepts.push(vertex.accepts().to_vec());
            emits.push(vertex.emits().to_vec());
            ids.push(id);
        }

        let entry = *index
            .get(&VertexId::new(entry_point.as_str()))
            .ok_or(GraphBuildError::UnknownNode(entry_point))?;

        let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); ids.len()];
        for edge in self.edges {
            let from = *index
                .get(&VertexId::new(edge.from.as_str()))
                .ok_or_else(|| GraphBuildError::UnknownNode(edge.from.clone()))?;
            let to = *index
                .get(&VertexId::new(edge.to.as_str()))
                .ok_or_else(|| GraphBuildError::UnknownNode(edge.to.clone()))?;

            if let Some(kinds) = &edge.kinds {
                if let Some(kind) = kinds.iter().find(|kind| !accepts[to].contains(*kind)) {
                    return Err(GraphBuildError::FilterRejected {
                        from: edge.from,
                        to: edge.to,
                        kind: *kind,
                    });
                }
            }

            adjacency[from].push(Edge {
                target: to,
                kinds: edge.kinds,
            });
        }

        for (position, kinds) in emits.iter().enumerate() {
            for kind in kinds {
                let routed = adjacency[position]
                    .iter()
                    .any(|edge| edge.allows(kind) && accepts[edge.target].contains(kind));
                if !routed {
                    return Err(GraphBuildError::UnroutedMessage {
                        vertex: ids[position].0.clone(),
                        kind: *kind,
                    });
                }
            }
        }

        let vertices = self
            .vertices
            .into_iter()
            .map(|vertex| Arc::new(Mutex::new(vertex)))
            .collect();

        Ok(Graph {
            name: self.name,
            vertices,
            ids,
            accepts,
            index,
            adjacency,
            entry,
        })
    }
}

/// Directed edge stored by target index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub target: usize,
    pub kinds: Option<Vec<MessageKind>>,
}

impl Edge {
    /// Check if the edge filter lets this kind through.
    pub fn allows(&self, kind: &str) -> bool {
        match &self.kinds {
            None => true,
            Some(kinds) => kinds.iter().any(|allowed| *allowed == kind),
        }
    }
}

/// Validated, immutable workflow graph.
///
/// Vertices live in an arena addressed by position. Each vertex sits behind
/// its own async mutex so one superstep can dispatch distinct vertices in
/// parallel while a single vertex is never entered twice at once.
pub struct Graph<M: VertexMessage> {
    name: String,
    vertices: Vec<Arc<Mutex<BoxedVertex<M>>>>,
    ids: Vec<VertexId>,
    /// Cached `accepts()` per vertex so routing never has to lock a vertex
    accepts: Vec<Vec<MessageKind>>,
    index: HashMap<VertexId, usize>,
    adjacency: Vec<Vec<Edge>>,
    entry: usize,
}

impl<M: VertexMessage> Graph<M> {
    /// Workflow name given to the builder.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of vertices; at least one once built.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Arena index of the entry vertex.
    pub fn entry(&self) -> usize {
        self.entry
    }

    /// Id of the entry vertex.
    pub fn entry_id(&self) -> &VertexId {
        &self.ids[self.entry]
    }

    /// Arena index of a vertex.
    pub fn index_of(&self, id: &VertexId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Id of the vertex at an arena index.
    pub fn vertex_id(&self, index: usize) -> &VertexId {
        &self.ids[index]
    }

    /// All vertex ids in arena order.
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.ids
    }

    /// Shared handle to the vertex at an arena index.
    pub fn vertex(&self, index: usize) -> Arc<Mutex<BoxedVertex<M>>> {
        Arc::clone(&self.vertices[index])
    }

    /// Check if the vertex at an arena index handles the given kind.
    pub fn accepts(&self, index: usize, kind: &str) -> bool {
        self.accepts[index].iter().any(|accepted| *accepted == kind)
    }

    /// Outgoing edges of the vertex at an arena index.
    pub fn edges(&self, index: usize) -> &[Edge] {
        &self.adjacency[index]
    }

    /// Resolve the delivery targets of a message emitted by `source`.
    ///
    /// Returns a human-readable reason when nothing would receive it.
    pub fn route(&self, source: usize, route: &Route, kind: &str) -> Result<Vec<usize>, String> {
        let deliverable =
            |edge: &&Edge| edge.allows(kind) && self.accepts(edge.target, kind);

        match route {
            Route::Edges => {
                let mut seen = HashSet::new();
                let targets: Vec<usize> = self.adjacency[source]
                    .iter()
                    .filter(deliverable)
                    .map(|edge| edge.target)
                    .filter(|target| seen.insert(*target))
                    .collect();
                if targets.is_empty() {
                    Err(format!("no outgoing edge delivers kind '{}'", kind))
                } else {
                    Ok(targets)
                }
            }
            Route::To(target) => {
                let target_index = self
                    .index_of(target)
                    .ok_or_else(|| format!("unknown target node '{}'", target))?;
                self.adjacency[source]
                    .iter()
                    .filter(deliverable)
                    .find(|edge| edge.target == target_index)
                    .map(|edge| vec![edge.target])
                    .ok_or_else(|| {
                        format!("no edge to '{}' delivers kind '{}'", target, kind)
                    })
            }
        }
    }
}

impl<M: VertexMessage> std::fmt::Debug for Graph<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.name)
            .field("vertices", &self.ids)
            .field("adjacency", &self.adjacency)
            .field("entry", &self.ids[self.entry])
            .finish()
    }
}
