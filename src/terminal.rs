//! # Terminal Module
//!
//! The human side of the approval loop. `TerminalResponder` shows each
//! pending request's prompt and reads the reviewer's decision;
//! `EchoResponder` replays scripted decisions and prints them as it goes.

use std::io::Write;

use async_trait::async_trait;
use rig_hitl::invest::{ApprovalRequest, Decision};
use rig_hitl::pregel::{Reply, RequestId, RequestPrompt, Responder, RunState, ScriptedResponder};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

/// Line printed when the run enters `state`
fn status_line(state: RunState) -> Option<&'static str> {
    if state.is_running() {
        Some("[Status: Processing agent response...]")
    } else if state.is_waiting() {
        Some("[Status: Awaiting human decision...]")
    } else {
        None
    }
}

/// Responder reading decisions line by line
///
/// Generic over its input and output so tests can script a session.
pub struct TerminalResponder<R, W> {
    lines: Lines<R>,
    out: W,
}

impl TerminalResponder<BufReader<Stdin>, std::io::Stdout> {
    /// Responder on the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout())
    }
}

impl<R, W> TerminalResponder<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    pub fn new(reader: R, out: W) -> Self {
        Self {
            lines: reader.lines(),
            out,
        }
    }

    /// Print `prompt` and read one line; `None` at end of input
    pub async fn read_line(&mut self, prompt: &str) -> Option<String> {
        let _ = write!(self.out, "{}", prompt);
        let _ = self.out.flush();

        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "Failed to read input");
                None
            }
        }
    }

    /// Print one line
    pub fn say(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }

    /// Consume the responder, returning its output
    pub fn into_writer(self) -> W {
        self.out
    }
}

#[async_trait]
impl<R, W> Responder<ApprovalRequest> for TerminalResponder<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn respond(&mut self, request_id: &RequestId, request: &ApprovalRequest) -> Reply {
        debug!(request_id = %request_id, "Awaiting decision");
        self.say(request.prompt());

        let Some(line) = self.read_line("Your decision: ").await else {
            return Reply::Abort;
        };
        if Decision::parse(&line).is_exit() {
            Reply::Abort
        } else {
            Reply::Answer(line)
        }
    }

    fn on_status(&mut self, state: RunState) {
        if let Some(line) = status_line(state) {
            self.say(line);
        }
    }
}

/// Scripted reviewer that prints the session while it runs
///
/// Output matches an interactive session, with each scripted reply shown
/// after the decision prompt.
pub struct EchoResponder<W> {
    script: ScriptedResponder,
    out: W,
}

impl<W: Write + Send> EchoResponder<W> {
    pub fn new(script: ScriptedResponder, out: W) -> Self {
        Self { script, out }
    }

    /// Consume the responder, returning its output
    pub fn into_writer(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> Responder<ApprovalRequest> for EchoResponder<W> {
    async fn respond(&mut self, request_id: &RequestId, request: &ApprovalRequest) -> Reply {
        let _ = writeln!(self.out, "{}", request.prompt());
        let _ = match self.script.peek() {
            Some(reply) => writeln!(self.out, "Your decision: {}", reply),
            None => writeln!(self.out, "Your decision: (no scripted reply left)"),
        };
        let _ = self.out.flush();

        self.script.respond(request_id, request).await
    }

    fn on_status(&mut self, state: RunState) {
        if let Some(line) = status_line(state) {
            let _ = writeln!(self.out, "{}", line);
        }
    }
}
