//! Lifecycle events observed by the caller
//!
//! Each `start`/`resume` invocation produces an ordered list of events.
//! The caller reads pending request prompts out of it, watches status
//! transitions and stops once an output arrives.

use serde::{Deserialize, Serialize};

use super::broker::RequestId;
use super::message::VertexMessage;
use super::vertex::VertexId;

/// Externally observable lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing running and nothing pending
    #[default]
    Idle,
    /// Supersteps executing, no unresolved requests
    Running,
    /// Supersteps exhausted, at least one request awaits an answer
    IdleWithPendingRequests,
    /// Supersteps executing while requests remain unresolved
    InProgressPendingRequests,
    /// An output was produced; terminal
    Completed,
}

impl RunState {
    /// Check if supersteps are executing
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::Running | RunState::InProgressPendingRequests)
    }

    /// Check if the run waits for the external actor
    pub fn is_waiting(&self) -> bool {
        matches!(self, RunState::IdleWithPendingRequests)
    }

    /// Check if the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Idle => "IDLE",
            RunState::Running => "RUNNING",
            RunState::IdleWithPendingRequests => "IDLE_WITH_PENDING_REQUESTS",
            RunState::InProgressPendingRequests => "IN_PROGRESS_PENDING_REQUESTS",
            RunState::Completed => "COMPLETED",
        };
        f.write_str(name)
    }
}

/// Events emitted during one invocation
#[derive(Debug, Clone)]
pub enum WorkflowEvent<M: VertexMessage> {
    /// A vertex needs input from the external actor
    RequestInfo {
        request_id: RequestId,
        source: VertexId,
        data: M::Request,
    },

    /// The run moved to a new state
    Status { state: RunState },

    /// The run produced its terminal value
    Output { source: VertexId, value: M::Output },

    /// A handler failed; the rest of the run is unaffected
    Failed { source: VertexId, error: String },
}

impl<M: VertexMessage> WorkflowEvent<M> {
    /// Create a status event
    pub fn status(state: RunState) -> Self {
        Self::Status { state }
    }

    /// Check if this is the terminal output event
    pub fn is_output(&self) -> bool {
        matches!(self, WorkflowEvent::Output { .. })
    }
}

/// Ordered events of one invocation
#[derive(Debug, Clone)]
pub struct RunEvents<M: VertexMessage> {
    events: Vec<WorkflowEvent<M>>,
}

impl<M: VertexMessage> Default for RunEvents<M> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<M: VertexMessage> RunEvents<M> {
    /// Create an empty event list
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: WorkflowEvent<M>) {
        self.events.push(event);
    }

    /// All events in emission order
    pub fn events(&self) -> &[WorkflowEvent<M>] {
        &self.events
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the invocation produced nothing
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending requests raised during this invocation, in order
    pub fn request_infos(&self) -> Vec<(&RequestId, &M::Request)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::RequestInfo {
                    request_id, data, ..
                } => Some((request_id, data)),
                _ => None,
            })
            .collect()
    }

    /// Status transitions observed during this invocation, in order
    pub fn statuses(&self) -> Vec<RunState> {
        self.events
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::Status { state } => Some(*state),
                _ => None,
            })
            .collect()
    }

    /// The output value, if the run completed during this invocation
    pub fn output(&self) -> Option<&M::Output> {
        self.events.iter().find_map(|event| match event {
            WorkflowEvent::Output { value, .. } => Some(value),
            _ => None,
        })
    }

    /// Local handler failures reported during this invocation
    pub fn failures(&self) -> Vec<(&VertexId, &str)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::Failed { source, error } => Some((source, error.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Last status reported, i.e. the state the invocation ended in
    pub fn final_state(&self) -> Option<RunState> {
        self.statuses().last().copied()
    }
}

impl<M: VertexMessage> IntoIterator for RunEvents<M> {
    type Item = WorkflowEvent<M>;
    type IntoIter = std::vec::IntoIter<WorkflowEvent<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a, M: VertexMessage> IntoIterator for &'a RunEvents<M> {
    type Item = &'a WorkflowEvent<M>;
    type IntoIter = std::slice::Iter<'a, WorkflowEvent<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
