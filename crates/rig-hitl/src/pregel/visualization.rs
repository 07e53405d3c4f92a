//! Mermaid diagram generation for workflow graphs
//!
//! # Node Shapes
//!
//! | Role            | Shape     | Mermaid Syntax |
//! |-----------------|-----------|----------------|
//! | Entry vertex    | Stadium   | `id([label])`  |
//! | Other vertices  | Rectangle | `id[label]`    |
//!
//! Edges with a kind filter render dotted and carry the allowed kinds as
//! their label. Vertices waiting on the external actor can be highlighted.

use std::fmt::Write;

use super::message::{MessageKind, VertexMessage};
use super::vertex::VertexId;
use crate::workflow::Graph;

// ============================================================================
// ID Sanitization
// ============================================================================

/// Sanitize a vertex ID for use as a Mermaid node identifier.
///
/// Mermaid node IDs must be alphanumeric (plus underscores).
/// This function replaces any invalid characters with underscores.
pub fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

// ============================================================================
// Node Rendering
// ============================================================================

/// Render a node declaration; the entry vertex gets the stadium shape.
pub fn render_node(id: &VertexId, is_entry: bool) -> String {
    let safe_id = sanitize_id(id.as_str());
    let label = id.as_str();

    if is_entry {
        format!("    {}([{}])", safe_id, label)
    } else {
        format!("    {}[{}]", safe_id, label)
    }
}

// ============================================================================
// Edge Rendering
// ============================================================================

/// Render an edge between two vertices.
///
/// - Unfiltered edges: solid arrow `-->`
/// - Filtered edges: dotted arrow labelled with the kinds `-. "a, b" .->`
pub fn render_edge(from: &VertexId, to: &VertexId, kinds: Option<&[MessageKind]>) -> String {
    let from_safe = sanitize_id(from.as_str());
    let to_safe = sanitize_id(to.as_str());

    match kinds {
        Some(kinds) => format!(
            "    {} -. \"{}\" .-> {}",
            from_safe,
            kinds.join(", "),
            to_safe
        ),
        None => format!("    {} --> {}", from_safe, to_safe),
    }
}

/// CSS class for vertices that have a pending request.
pub const STYLE_DEFS: &str = r#"
    classDef waiting fill:#FFE4B5,stroke:#FF8C00,stroke-width:2px
"#;

// ============================================================================
// Graph Rendering
// ============================================================================

/// Render a whole graph as a Mermaid flowchart.
///
/// Vertices listed in `waiting` get the `waiting` class.
pub fn render_graph<M: VertexMessage>(graph: &Graph<M>, waiting: &[VertexId]) -> String {
    let mut output = String::from("graph TD\n");

    for (index, id) in graph.vertex_ids().iter().enumerate() {
        let node = render_node(id, index == graph.entry());
        if waiting.contains(id) {
            let _ = writeln!(output, "{}:::waiting", node);
        } else {
            let _ = writeln!(output, "{}", node);
        }
    }

    output.push('\n');

    for (index, from) in graph.vertex_ids().iter().enumerate() {
        for edge in graph.edges(index) {
            let to = graph.vertex_id(edge.target);
            let _ = writeln!(output, "{}", render_edge(from, to, edge.kinds.as_deref()));
        }
    }

    if !waiting.is_empty() {
        output.push_str(STYLE_DEFS);
    }

    output
}

impl<M: VertexMessage> super::runtime::PregelRuntime<M> {
    /// Generate a Mermaid diagram of the workflow graph.
    ///
    /// # Example Output
    ///
    /// ```text
    /// graph TD
    ///     turn_manager([turn_manager])
    ///     analyst[analyst]
    ///
    ///     turn_manager -. "agent_request" .-> analyst
    ///     analyst -. "agent_response" .-> turn_manager
    /// ```
    pub fn to_mermaid(&self) -> String {
        render_graph(self.graph(), &[])
    }

    /// Generate a Mermaid diagram highlighting vertices with pending requests.
    pub fn to_mermaid_with_pending(&self) -> String {
        let waiting: Vec<VertexId> = self
            .pending_requests()
            .into_iter()
            .map(|request| request.origin.clone())
            .collect();
        render_graph(self.graph(), &waiting)
    }
}

// ============================================================================
// Tests
// ============================================================================
