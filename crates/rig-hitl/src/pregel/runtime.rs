//! Pregel Runtime - Core execution engine for workflow graphs
//!
//! The runtime executes a run through synchronized supersteps. Each
//! superstep follows the sequence: Deliver → Compute → Collect → Route.
//! A run can suspend on pending requests and pick up again with
//! [`PregelRuntime::resume`]; all suspension state lives in the broker and
//! the run state, nothing is parked inside a handler.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::AbortHandle;
use tokio::time::timeout;

use super::broker::{PendingRequest, RequestBroker, RequestId};
use super::config::PregelConfig;
use super::error::PregelError;
use super::event::{RunEvents, RunState, WorkflowEvent};
use super::message::{Envelope, RequestResponse, VertexMessage};
use super::vertex::{BoxedVertex, ComputeContext, Effects, VertexId};
use crate::workflow::Graph;

/// Outcome of every handler call made for one vertex in one superstep
type Outcomes<M> = Vec<Result<Effects<M>, PregelError>>;

/// Aborts the dispatch tasks of a superstep when dropped
///
/// An invocation timeout drops `compute` mid-superstep; the handlers it
/// spawned must not keep running against vertex state afterwards.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Pregel Runtime for executing one resumable run over a workflow graph
///
/// Owns the graph, the request broker and the run state. Only one task
/// drives a runtime at a time (`start`/`resume` take `&mut self`), so the
/// broker is only touched between dispatch phases.
pub struct PregelRuntime<M: VertexMessage> {
    /// Configuration for the runtime
    config: PregelConfig,
    /// Validated graph whose vertices own their private state
    graph: Graph<M>,
    /// Unresolved requests of this run
    broker: RequestBroker<M::Request>,
    /// Externally observable lifecycle phase
    run_state: RunState,
    /// Supersteps executed across all invocations of this run
    superstep: usize,
    /// Unique identifier for this run (used in logs)
    workflow_id: String,
    /// Optional live copy of every event as it is emitted
    event_sink: Option<mpsc::UnboundedSender<WorkflowEvent<M>>>,
}

impl<M: VertexMessage> PregelRuntime<M> {
    /// Create a new runtime with default configuration
    pub fn new(graph: Graph<M>) -> Self {
        Self::with_config(graph, PregelConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(graph: Graph<M>, config: PregelConfig) -> Self {
        Self {
            config,
            graph,
            broker: RequestBroker::new(),
            run_state: RunState::Idle,
            superstep: 0,
            workflow_id: uuid::Uuid::new_v4().to_string(),
            event_sink: None,
        }
    }

    /// Forward every event to a channel as soon as it is emitted
    ///
    /// The returned [`RunEvents`] are unaffected; the sink only sees the
    /// same events earlier, which is useful for live progress output.
    pub fn with_event_sink(mut self, sink: mpsc::UnboundedSender<WorkflowEvent<M>>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Get the workflow ID
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Get the configuration
    pub fn config(&self) -> &PregelConfig {
        &self.config
    }

    /// Get the graph
    pub fn graph(&self) -> &Graph<M> {
        &self.graph
    }

    /// Current run state
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Supersteps executed so far across all invocations
    pub fn supersteps(&self) -> usize {
        self.superstep
    }

    /// Unresolved requests in the order they were raised
    pub fn pending_requests(&self) -> Vec<&PendingRequest<M::Request>> {
        self.broker.pending()
    }

    /// Total number of requests raised during the run
    pub fn requests_issued(&self) -> usize {
        self.broker.issued()
    }

    /// Start the run by delivering `input` to the entry vertex
    ///
    /// Fails with `ConfigError` if the entry vertex does not accept the
    /// input's kind, and with `InvalidRunState` if the run is completed or
    /// still waits for answers.
    pub async fn start(&mut self, input: M) -> Result<RunEvents<M>, PregelError> {
        if self.run_state.is_terminal() {
            return Err(PregelError::invalid_run_state(
                "run already completed; create a new runtime",
            ));
        }
        if !self.broker.is_empty() {
            return Err(PregelError::invalid_run_state(format!(
                "{} request(s) pending; call resume instead",
                self.broker.len()
            )));
        }

        let entry = self.graph.entry();
        if !self.graph.accepts(entry, input.kind()) {
            return Err(PregelError::config_error(format!(
                "entry node '{}' does not accept kind '{}'",
                self.graph.entry_id(),
                input.kind()
            )));
        }

        tracing::info!(
            workflow_id = %self.workflow_id,
            entry = %self.graph.entry_id(),
            vertices = self.graph.vertex_count(),
            kind = input.kind(),
            "Starting run"
        );

        let seed = vec![Envelope {
            source: None,
            target: entry,
            message: input,
        }];
        self.execute(seed).await
    }

    /// Continue the run with answers to pending requests
    ///
    /// Every key must name a pending request; otherwise `UnknownRequestId`
    /// is returned and no request is resolved. Each answer is delivered to
    /// the vertex that asked, in the order the requests were raised. After
    /// the run completed this is a no-op returning no events.
    pub async fn resume(
        &mut self,
        responses: HashMap<RequestId, String>,
    ) -> Result<RunEvents<M>, PregelError> {
        if self.run_state.is_terminal() {
            tracing::debug!(workflow_id = %self.workflow_id, "Resume after completion ignored");
            return Ok(RunEvents::new());
        }

        for request_id in responses.keys() {
            if !self.broker.contains(request_id) {
                return Err(PregelError::UnknownRequestId(request_id.clone()));
            }
        }

        let ordered: Vec<(RequestId, usize)> = self
            .broker
            .pending()
            .into_iter()
            .filter(|request| responses.contains_key(&request.id))
            .map(|request| -> Result<(RequestId, usize), PregelError> {
                let target = self.graph.index_of(&request.origin).ok_or_else(|| {
                    PregelError::config_error(format!(
                        "request origin '{}' is not part of the graph",
                        request.origin
                    ))
                })?;
                Ok((request.id.clone(), target))
            })
            .collect::<Result<_, PregelError>>()?;

        let mut responses = responses;
        let mut seed = Vec::with_capacity(ordered.len());
        for (request_id, target) in ordered {
            let request = self.broker.resolve(&request_id)?;
            let data = responses.remove(&request_id).unwrap_or_default();
            let message = M::from_response(RequestResponse::new(request.id, request.payload, data));
            if !self.graph.accepts(target, message.kind()) {
                tracing::warn!(
                    vertex = %request.origin,
                    kind = message.kind(),
                    "Requesting node does not accept response kind"
                );
            }
            seed.push(Envelope {
                source: None,
                target,
                message,
            });
        }

        tracing::info!(
            workflow_id = %self.workflow_id,
            answered = seed.len(),
            still_pending = self.broker.len(),
            "Resuming run"
        );

        self.execute(seed).await
    }

    /// Run supersteps under the invocation timeout
    async fn execute(&mut self, seed: Vec<Envelope<M>>) -> Result<RunEvents<M>, PregelError> {
        let invocation_timeout = self.config.invocation_timeout;
        let mut events = RunEvents::new();

        let result = match timeout(invocation_timeout, self.run_supersteps(seed, &mut events)).await
        {
            Ok(result) => result,
            Err(_) => Err(PregelError::WorkflowTimeout(invocation_timeout)),
        };

        match result {
            Ok(()) => Ok(events),
            Err(e) => {
                self.run_state = self.settled_state();
                tracing::warn!(
                    workflow_id = %self.workflow_id,
                    error = %e,
                    state = %self.run_state,
                    "Invocation aborted"
                );
                Err(e)
            }
        }
    }

    /// Internal superstep loop (extracted for timeout wrapping)
    async fn run_supersteps(
        &mut self,
        seed: Vec<Envelope<M>>,
        events: &mut RunEvents<M>,
    ) -> Result<(), PregelError> {
        self.run_state = if self.broker.is_empty() {
            RunState::Running
        } else {
            RunState::InProgressPendingRequests
        };
        self.emit(events, WorkflowEvent::status(self.run_state));

        let mut queue = seed;
        let mut executed = 0;

        while !queue.is_empty() {
            if executed >= self.config.max_supersteps {
                return Err(PregelError::MaxSuperstepsExceeded(executed));
            }

            let inboxes = Self::deliver(std::mem::take(&mut queue));
            tracing::debug!(
                superstep = self.superstep,
                vertices = inboxes.len(),
                "Executing superstep"
            );

            let results = self.compute(inboxes).await;
            let output = self.collect(results, &mut queue, events);

            self.superstep += 1;
            executed += 1;

            if let Some((source, value)) = output {
                if !queue.is_empty() {
                    tracing::debug!(dropped = queue.len(), "Output produced; discarding in-flight messages");
                }
                self.emit(events, WorkflowEvent::Output { source, value });
                self.run_state = RunState::Completed;
                self.emit(events, WorkflowEvent::status(RunState::Completed));
                tracing::info!(
                    workflow_id = %self.workflow_id,
                    supersteps = self.superstep,
                    "Run completed"
                );
                return Ok(());
            }

            if !queue.is_empty() && !self.broker.is_empty() && self.run_state == RunState::Running
            {
                self.run_state = RunState::InProgressPendingRequests;
                self.emit(events, WorkflowEvent::status(self.run_state));
            }
        }

        self.run_state = self.settled_state();
        self.emit(events, WorkflowEvent::status(self.run_state));
        tracing::info!(
            workflow_id = %self.workflow_id,
            state = %self.run_state,
            pending = self.broker.len(),
            "Run idle"
        );
        Ok(())
    }

    /// Group queued messages by destination, keeping enqueue order
    fn deliver(queue: Vec<Envelope<M>>) -> BTreeMap<usize, Vec<M>> {
        let mut inboxes: BTreeMap<usize, Vec<M>> = BTreeMap::new();
        for envelope in queue {
            tracing::trace!(from = ?envelope.source, to = envelope.target, "Delivering message");
            inboxes
                .entry(envelope.target)
                .or_default()
                .push(envelope.message);
        }
        inboxes
    }

    /// Run every inbox on its own task, bounded by the configured parallelism
    ///
    /// Results come back in arena order regardless of completion order.
    /// Tasks still running when the returned future is dropped are aborted.
    async fn compute(&self, inboxes: BTreeMap<usize, Vec<M>>) -> Vec<(usize, Outcomes<M>)> {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let vertex_timeout = self.config.vertex_timeout;
        let superstep = self.superstep;

        let mut targets = Vec::with_capacity(inboxes.len());
        let mut handles = Vec::with_capacity(inboxes.len());

        for (index, messages) in inboxes {
            let vertex = self.graph.vertex(index);
            let vid = self.graph.vertex_id(index).clone();
            let sem_clone = Arc::clone(&semaphore);
            targets.push((index, vid.clone()));

            handles.push(tokio::spawn(async move {
                // Semaphore is never closed, so the permit is always granted
                let _permit = sem_clone.acquire_owned().await.ok();
                let mut vertex = vertex.lock().await;

                let mut outcomes = Vec::with_capacity(messages.len());
                for message in messages {
                    outcomes.push(
                        invoke(&mut vertex, &vid, superstep, message, vertex_timeout).await,
                    );
                }
                outcomes
            }));
        }

        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());

        targets
            .into_iter()
            .zip(join_all(handles).await)
            .map(|((index, vid), joined)| {
                let outcomes = joined.unwrap_or_else(|e| {
                    vec![Err(PregelError::vertex_error_with_source(
                        vid,
                        "dispatch task failed",
                        std::io::Error::other(e.to_string()),
                    ))]
                });
                (index, outcomes)
            })
            .collect()
    }

    /// Apply effects in deterministic order and return the first output
    fn collect(
        &mut self,
        results: Vec<(usize, Outcomes<M>)>,
        queue: &mut Vec<Envelope<M>>,
        events: &mut RunEvents<M>,
    ) -> Option<(VertexId, M::Output)> {
        let mut output: Option<(VertexId, M::Output)> = None;

        for (index, outcomes) in results {
            let vid = self.graph.vertex_id(index).clone();

            for outcome in outcomes {
                let effects = match outcome {
                    Ok(effects) => effects,
                    Err(e) => {
                        tracing::warn!(vertex = %vid, error = %e, "Handler failed");
                        self.emit(
                            events,
                            WorkflowEvent::Failed {
                                source: vid.clone(),
                                error: e.to_string(),
                            },
                        );
                        continue;
                    }
                };

                for (route, message) in effects.messages {
                    match self.graph.route(index, &route, message.kind()) {
                        Ok(targets) => {
                            for target in targets {
                                queue.push(Envelope {
                                    source: Some(vid.clone()),
                                    target,
                                    message: message.clone(),
                                });
                            }
                        }
                        Err(detail) => {
                            let e = PregelError::routing_error(&vid, detail);
                            tracing::warn!(vertex = %vid, error = %e, "Message dropped");
                            self.emit(
                                events,
                                WorkflowEvent::Failed {
                                    source: vid.clone(),
                                    error: e.to_string(),
                                },
                            );
                        }
                    }
                }

                for request in effects.requests {
                    let request_id = self.broker.register(vid.clone(), request.clone());
                    tracing::debug!(vertex = %vid, request_id = %request_id, "Request registered");
                    self.emit(
                        events,
                        WorkflowEvent::RequestInfo {
                            request_id,
                            source: vid.clone(),
                            data: request,
                        },
                    );
                }

                if let Some(value) = effects.output {
                    if output.is_none() {
                        output = Some((vid.clone(), value));
                    } else {
                        tracing::warn!(vertex = %vid, "Run already produced an output; ignoring");
                    }
                }
            }
        }

        output
    }

    /// State to rest in once no supersteps are running
    fn settled_state(&self) -> RunState {
        if self.run_state.is_terminal() {
            RunState::Completed
        } else if self.broker.is_empty() {
            RunState::Idle
        } else {
            RunState::IdleWithPendingRequests
        }
    }

    fn emit(&self, events: &mut RunEvents<M>, event: WorkflowEvent<M>) {
        if let Some(sink) = &self.event_sink {
            // A dropped receiver only means nobody is watching live
            let _ = sink.send(event.clone());
        }
        events.push(event);
    }
}

/// Call one handler with a fresh context, isolating errors, panics and timeouts
async fn invoke<M: VertexMessage>(
    vertex: &mut BoxedVertex<M>,
    vid: &VertexId,
    superstep: usize,
    message: M,
    vertex_timeout: Duration,
) -> Result<Effects<M>, PregelError> {
    tracing::debug!(vertex = %vid, superstep, kind = message.kind(), "Dispatching");

    let mut ctx = ComputeContext::new(vid.clone(), superstep);
    let outcome = timeout(
        vertex_timeout,
        AssertUnwindSafe(vertex.handle(message, &mut ctx)).catch_unwind(),
    )
    .await;

    match outcome {
        Ok(Ok(Ok(()))) => Ok(ctx.into_effects()),
        Ok(Ok(Err(e))) => Err(e),
        Ok(Err(payload)) => Err(PregelError::vertex_error(
            vid,
            format!("handler panicked: {}", panic_message(payload.as_ref())),
        )),
        Err(_) => Err(PregelError::VertexTimeout(vid.clone())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
