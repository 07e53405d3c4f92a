//! Integration Tests for the Investment Approval Workflow
//!
//! Drives the pre-built workflow through the caller loop API with a
//! scripted analyst:
//! - Happy path: recommendation approved on first sight
//! - Refinement loop: feedback reaches the analyst, a fresh request follows
//! - Invalid reply: the reviewer is asked again, nothing is produced
//! - Malformed analyst output: degraded prompt with the raw text
//! - Slow analyst: the model call expires before the vertex does

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_test::{assert_err, assert_ok};

use rig_hitl::invest::{
    offline_reply, ApprovalRequest, InvestMessage, InvestPrompts, InvestWorkflowBuilder,
};
use rig_hitl::llm::{ModelClient, ModelError, ScriptedModelClient};
use rig_hitl::pregel::{
    drive, LoopOutcome, PregelConfig, PregelError, PregelRuntime, RequestId, RunEvents,
    RunState, ScriptedResponder,
};
use rig_hitl::state::{ChatMessage, Role};

const AAPL: &str = r#"{"ticker":"AAPL","action":"BUY","rationale":"Services revenue keeps compounding","confidence":"HIGH"}"#;
const MSFT: &str = r#"{"ticker":"MSFT","action":"BUY","rationale":"Azure growth","confidence":"MEDIUM"}"#;
const MSFT_REFINED: &str = r#"{"ticker":"MSFT","action":"HOLD","rationale":"Azure growth offset by capex risk","confidence":"MEDIUM"}"#;
const TSLA: &str = r#"{"ticker":"TSLA","action":"SELL","rationale":"Margin compression","confidence":"LOW"}"#;

fn runtime_with(client: &Arc<ScriptedModelClient>) -> PregelRuntime<InvestMessage> {
    InvestWorkflowBuilder::new(client.clone())
        .build_runtime()
        .expect("workflow graph is valid")
}

/// The single pending request raised by an invocation
fn single_request(events: &RunEvents<InvestMessage>) -> (RequestId, ApprovalRequest) {
    let requests = events.request_infos();
    assert_eq!(requests.len(), 1, "expected exactly one pending request");
    (requests[0].0.clone(), requests[0].1.clone())
}

fn answer(id: &RequestId, reply: &str) -> HashMap<RequestId, String> {
    HashMap::from([(id.clone(), reply.to_string())])
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_happy_path_approve() {
    let client = Arc::new(ScriptedModelClient::new([AAPL]));
    let mut runtime = runtime_with(&client);

    let events = assert_ok!(runtime.start(InvestMessage::Ticker("AAPL".into())).await);
    assert_eq!(events.final_state(), Some(RunState::IdleWithPendingRequests));
    assert!(events.output().is_none());

    let (id, request) = single_request(&events);
    assert!(request.prompt.contains("Ticker: AAPL"));
    assert!(request.prompt.contains("Action: BUY"));
    assert!(request.prompt.contains("Confidence: HIGH"));
    assert!(request.prompt.contains("Rationale: Services revenue keeps compounding"));

    let events = assert_ok!(runtime.resume(answer(&id, "approve")).await);
    let output = events.output().expect("approval produces an output");
    assert!(output.contains("AAPL"));
    assert!(output.contains("approved"));
    assert_eq!(events.final_state(), Some(RunState::Completed));
    assert_eq!(runtime.run_state(), RunState::Completed);
    assert!(runtime.pending_requests().is_empty());
}

#[tokio::test]
async fn test_refine_loop() {
    let client = Arc::new(ScriptedModelClient::new([MSFT, MSFT_REFINED]));
    let mut runtime = runtime_with(&client);

    let events = assert_ok!(runtime.start(InvestMessage::Ticker("MSFT".into())).await);
    let (first_id, _) = single_request(&events);

    let events = assert_ok!(
        runtime
            .resume(answer(&first_id, "refine focus on risk"))
            .await
    );
    assert!(events.output().is_none());
    let (second_id, request) = single_request(&events);
    assert_ne!(first_id, second_id);
    assert!(request.prompt.contains("Action: HOLD"));

    let calls = client.calls().await;
    assert_eq!(calls.len(), 2);
    let refinement = calls[1].last().unwrap();
    assert_eq!(refinement.role, Role::User);
    assert!(refinement.content.contains("focus on risk"));
    // analyst memory: the first recommendation is part of the second call
    assert!(calls[1].iter().any(|m| m.role == Role::Assistant && m.content == MSFT));

    let events = assert_ok!(runtime.resume(answer(&second_id, "APPROVE")).await);
    assert!(events.output().unwrap().contains("MSFT"));
}

#[tokio::test]
async fn test_invalid_reply_reprompts() {
    let client = Arc::new(ScriptedModelClient::new([TSLA, TSLA]));
    let mut runtime = runtime_with(&client);

    let events = assert_ok!(runtime.start(InvestMessage::Ticker("TSLA".into())).await);
    let (first_id, _) = single_request(&events);

    let events = assert_ok!(runtime.resume(answer(&first_id, "maybe")).await);
    assert!(events.output().is_none());
    let (second_id, request) = single_request(&events);
    assert_ne!(first_id, second_id);
    assert!(request.prompt.contains("Ticker: TSLA"));
    assert_eq!(events.final_state(), Some(RunState::IdleWithPendingRequests));

    let calls = client.calls().await;
    assert_eq!(
        calls[1].last().unwrap().content,
        InvestPrompts::invalid_input_request()
    );
}

#[tokio::test]
async fn test_malformed_agent_output() {
    let raw = "I would probably buy some, the chart looks nice.";
    let client = Arc::new(ScriptedModelClient::new([raw]));
    let mut runtime = runtime_with(&client);

    let events = assert_ok!(runtime.start(InvestMessage::Ticker("GME".into())).await);
    let (_, request) = single_request(&events);

    assert!(request.prompt.contains("INVESTMENT ANALYSIS"));
    assert!(request.prompt.contains(raw));
    assert_eq!(request.recommendation, raw);
    assert!(events.failures().is_empty());
    assert_eq!(runtime.run_state(), RunState::IdleWithPendingRequests);
}

#[tokio::test]
async fn test_model_failure_is_local() {
    let client = Arc::new(ScriptedModelClient::from_results([Err(
        ModelError::provider("connection refused"),
    )]));
    let mut runtime = runtime_with(&client);

    let events = assert_ok!(runtime.start(InvestMessage::Ticker("AMD".into())).await);
    let (id, request) = single_request(&events);
    assert!(request.prompt.contains("connection refused"));

    let events = assert_ok!(runtime.resume(answer(&id, "approve")).await);
    assert!(events.output().unwrap().contains("AMD"));
}

/// Analyst that needs longer than the workflow allows
struct SlowModel {
    delay: Duration,
}

#[async_trait]
impl ModelClient for SlowModel {
    async fn generate(&self, _conversation: &[ChatMessage]) -> Result<String, ModelError> {
        tokio::time::sleep(self.delay).await;
        Ok(AAPL.to_string())
    }
}

#[tokio::test]
async fn test_slow_model_degrades_prompt() {
    let client = Arc::new(SlowModel {
        delay: Duration::from_millis(300),
    });
    let mut runtime = InvestWorkflowBuilder::new(client)
        .config(PregelConfig::default().with_vertex_timeout(Duration::from_millis(100)))
        .build_runtime()
        .expect("workflow graph is valid");

    let events = assert_ok!(runtime.start(InvestMessage::Ticker("AAPL".into())).await);
    assert!(events.failures().is_empty());
    assert_eq!(events.final_state(), Some(RunState::IdleWithPendingRequests));

    let (id, request) = single_request(&events);
    assert!(request.prompt.contains("timed out"));
    assert!(request.ticker.is_empty());

    // the reviewer can still approve the degraded prompt
    let events = assert_ok!(runtime.resume(answer(&id, "approve")).await);
    assert!(events.output().unwrap().contains("AAPL"));
    assert_eq!(runtime.run_state(), RunState::Completed);
}

// =============================================================================
// Protocol errors
// =============================================================================

#[tokio::test]
async fn test_stale_request_id_rejected() {
    let client = Arc::new(ScriptedModelClient::new([AAPL, AAPL]));
    let mut runtime = runtime_with(&client);

    let events = assert_ok!(runtime.start(InvestMessage::Ticker("AAPL".into())).await);
    let (id, _) = single_request(&events);

    let err = assert_err!(runtime.resume(answer(&RequestId::new(), "approve")).await);
    assert!(matches!(err, PregelError::UnknownRequestId(_)));
    assert_eq!(runtime.pending_requests().len(), 1);

    let events = assert_ok!(runtime.resume(answer(&id, "refine")).await);
    let err = assert_err!(runtime.resume(answer(&id, "approve")).await);
    assert!(matches!(err, PregelError::UnknownRequestId(_)));

    let (next_id, _) = single_request(&events);
    assert_ok!(runtime.resume(answer(&next_id, "approve")).await);
}

// =============================================================================
// Caller loop
// =============================================================================

#[tokio::test]
async fn test_drive_refine_then_approve() {
    let client = Arc::new(ScriptedModelClient::new([MSFT, MSFT_REFINED]));
    let mut runtime = runtime_with(&client);
    let mut responder = ScriptedResponder::new(["refine focus on risk", "approve"]);

    let outcome = assert_ok!(
        drive(&mut runtime, InvestMessage::Ticker("MSFT".into()), &mut responder).await
    );

    assert!(outcome.is_completed());
    assert!(outcome.output().unwrap().contains("MSFT"));
    assert_eq!(responder.prompts().len(), 2);
    assert!(responder.prompts()[1].contains("HOLD"));
}

#[tokio::test]
async fn test_drive_exit_cancels() {
    let client = Arc::new(ScriptedModelClient::new([AAPL]));
    let mut runtime = runtime_with(&client);
    let mut responder = ScriptedResponder::new(["Exit"]).with_abort_word("exit");

    let outcome = assert_ok!(
        drive(&mut runtime, InvestMessage::Ticker("AAPL".into()), &mut responder).await
    );

    assert_eq!(outcome, LoopOutcome::Cancelled);
    assert_eq!(runtime.run_state(), RunState::IdleWithPendingRequests);
}

#[tokio::test]
async fn test_offline_analyst_roundtrip() {
    let client =
        Arc::new(ScriptedModelClient::new(Vec::<String>::new()).with_fallback(offline_reply));
    let mut runtime = runtime_with(&client);
    let mut responder = ScriptedResponder::new(["refine compare with peers", "approve"]);

    let outcome = assert_ok!(
        drive(&mut runtime, InvestMessage::Ticker("NVDA".into()), &mut responder).await
    );

    assert!(outcome.output().unwrap().contains("NVDA"));
    assert!(responder.prompts()[1].contains("compare with peers"));
}
