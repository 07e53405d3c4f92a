//! Caller loop
//!
//! Drives a [`PregelRuntime`] from its first input to an output or an
//! abort: collect the pending requests, hand each one to a [`Responder`],
//! feed the answers back with `resume`, repeat.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;

use super::broker::RequestId;
use super::error::PregelError;
use super::event::{RunState, WorkflowEvent};
use super::message::{RequestPrompt, VertexMessage};
use super::runtime::PregelRuntime;

/// What the external actor said about one pending request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Free-form answer delivered to the requesting vertex
    Answer(String),
    /// Stop driving the run
    Abort,
}

/// How a driven run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome<O> {
    /// The run produced its output
    Completed(O),
    /// The responder aborted while requests were pending
    Cancelled,
    /// Nothing left to do and no output was produced
    Idle,
}

impl<O> LoopOutcome<O> {
    /// Check if the run produced an output
    pub fn is_completed(&self) -> bool {
        matches!(self, LoopOutcome::Completed(_))
    }

    /// The output, if any
    pub fn output(&self) -> Option<&O> {
        match self {
            LoopOutcome::Completed(output) => Some(output),
            _ => None,
        }
    }
}

/// Source of answers for pending requests
#[async_trait]
pub trait Responder<R: RequestPrompt>: Send {
    /// Answer one pending request
    async fn respond(&mut self, request_id: &RequestId, request: &R) -> Reply;

    /// Observe a status transition of the run
    fn on_status(&mut self, _state: RunState) {}
}

/// Drive a run until it completes, goes idle or the responder aborts
pub async fn drive<M, Rsp>(
    runtime: &mut PregelRuntime<M>,
    input: M,
    responder: &mut Rsp,
) -> Result<LoopOutcome<M::Output>, PregelError>
where
    M: VertexMessage,
    Rsp: Responder<M::Request> + ?Sized,
{
    let mut events = runtime.start(input).await?;
    let mut rounds = 0usize;

    loop {
        for event in &events {
            match event {
                WorkflowEvent::Status { state } => responder.on_status(*state),
                WorkflowEvent::Failed { source, error } => {
                    tracing::warn!(vertex = %source, error = %error, "Node failed during run");
                }
                _ => {}
            }
        }

        if let Some(output) = events.output() {
            tracing::info!(rounds, "Run completed");
            return Ok(LoopOutcome::Completed(output.clone()));
        }

        let pending: Vec<(RequestId, M::Request)> = runtime
            .pending_requests()
            .into_iter()
            .map(|request| (request.id.clone(), request.payload.clone()))
            .collect();

        if pending.is_empty() {
            tracing::info!(rounds, "Run went idle without output");
            return Ok(LoopOutcome::Idle);
        }

        let mut responses = HashMap::with_capacity(pending.len());
        for (request_id, request) in pending {
            match responder.respond(&request_id, &request).await {
                Reply::Answer(answer) => {
                    responses.insert(request_id, answer);
                }
                Reply::Abort => {
                    tracing::info!(rounds, request_id = %request_id, "Run aborted by responder");
                    return Ok(LoopOutcome::Cancelled);
                }
            }
        }

        rounds += 1;
        events = runtime.resume(responses).await?;
    }
}

/// Responder that replays a fixed list of answers
///
/// Aborts when the list runs out or when a reply equals the abort word
/// (compared case-insensitively after trimming).
#[derive(Debug, Clone, Default)]
pub struct ScriptedResponder {
    replies: VecDeque<String>,
    abort_word: Option<String>,
    seen: Vec<String>,
}

impl ScriptedResponder {
    /// Create a responder from replies in the order they will be given
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            abort_word: None,
            seen: Vec::new(),
        }
    }

    /// Treat this reply as an abort instead of an answer
    pub fn with_abort_word(mut self, word: impl Into<String>) -> Self {
        self.abort_word = Some(word.into());
        self
    }

    /// Prompts shown to this responder so far
    pub fn prompts(&self) -> &[String] {
        &self.seen
    }

    /// Replies not used yet
    pub fn remaining(&self) -> usize {
        self.replies.len()
    }

    /// Reply the next request will get, if any is left
    pub fn peek(&self) -> Option<&str> {
        self.replies.front().map(String::as_str)
    }
}

#[async_trait]
impl<R: RequestPrompt> Responder<R> for ScriptedResponder {
    async fn respond(&mut self, _request_id: &RequestId, request: &R) -> Reply {
        self.seen.push(request.prompt().to_string());

        let Some(reply) = self.replies.pop_front() else {
            return Reply::Abort;
        };
        let is_abort = self
            .abort_word
            .as_deref()
            .is_some_and(|word| reply.trim().eq_ignore_ascii_case(word));
        if is_abort {
            Reply::Abort
        } else {
            Reply::Answer(reply)
        }
    }
}
