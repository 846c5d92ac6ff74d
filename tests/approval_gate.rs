//! Approval gate tests.
//!
//! Covers tier-driven gating: denial semantics, handler consultation,
//! auto-approve, introspection bypass, and the denial text the model sees
//! when a gated call comes back through the tool-use loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_test::assert_ok;

use tabpilot::prelude::*;
use tabpilot::approval::{ApprovalGate, DEFAULT_APPROVAL_THRESHOLD};
use tabpilot::{Error, TierResolver};

// =============================================================================
// Mock ports
// =============================================================================

#[derive(Default)]
struct CountingExecutor {
    calls: Mutex<Vec<String>>,
}

impl CountingExecutor {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ToolExecutor for CountingExecutor {
    async fn execute(
        &self,
        name: &str,
        _input: Value,
        _target: &TabTarget,
    ) -> tabpilot::Result<ToolOutcome> {
        self.calls.lock().unwrap().push(name.to_string());
        Ok(ToolOutcome::ok(json!("executed")))
    }
}

struct ScriptedHandler {
    decision: ApprovalDecision,
    requests: Mutex<Vec<ApprovalRequest>>,
}

impl ScriptedHandler {
    fn approving() -> Arc<Self> {
        Arc::new(Self {
            decision: ApprovalDecision::Approved,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn denying() -> Arc<Self> {
        Arc::new(Self {
            decision: ApprovalDecision::Denied,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ApprovalHandler for ScriptedHandler {
    async fn request(&self, request: &ApprovalRequest) -> ApprovalDecision {
        self.requests.lock().unwrap().push(request.clone());
        self.decision
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn target() -> TabTarget {
    TabTarget::new("tab-1", "conv-1")
}

fn gate(executor: Arc<CountingExecutor>) -> ApprovalGate {
    init_tracing();
    ApprovalGate::new(executor, Arc::new(RuleTierResolver::default()))
}

// =============================================================================
// Denial semantics
// =============================================================================

#[tokio::test]
async fn test_missing_handler_denies_high_tier_calls() {
    let executor = CountingExecutor::new();
    let gate = gate(Arc::clone(&executor));

    let outcome = gate
        .execute("delete_row", json!({"row": 3}), &target())
        .await
        .unwrap();

    assert!(!outcome.success);
    let error = outcome.error.unwrap();
    assert!(error.contains("delete_row"));
    assert!(error.contains("denied"));
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_denied_call_never_reaches_executor() {
    let executor = CountingExecutor::new();
    let handler = ScriptedHandler::denying();
    let gate = gate(Arc::clone(&executor)).with_handler(handler.clone());

    let outcome = gate
        .execute("submit_form", json!({}), &target())
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("denied"));
    assert_eq!(executor.call_count(), 0);

    // the handler saw the resolved tier and the tool name
    let requests = handler.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tool_name, "submit_form");
    assert_eq!(requests[0].tier, DEFAULT_APPROVAL_THRESHOLD);
    assert!(requests[0].description.contains("submit_form"));
}

#[tokio::test]
async fn test_approved_call_executes() {
    let executor = CountingExecutor::new();
    let handler = ScriptedHandler::approving();
    let gate = gate(Arc::clone(&executor)).with_handler(handler.clone());

    let outcome = gate
        .execute("delete_row", json!({}), &target())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(executor.call_count(), 1);
    assert_eq!(handler.request_count(), 1);
}

// =============================================================================
// Bypass paths
// =============================================================================

#[tokio::test]
async fn test_low_tier_calls_skip_the_handler() {
    let executor = CountingExecutor::new();
    let handler = ScriptedHandler::denying();
    let gate = gate(Arc::clone(&executor)).with_handler(handler.clone());

    let outcome = gate
        .execute("read_table", json!({}), &target())
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(executor.call_count(), 1);
    assert_eq!(handler.request_count(), 0);
}

#[tokio::test]
async fn test_introspection_bypasses_tiers_entirely() {
    // a fallback tier well above the threshold, and a denying handler
    let executor = CountingExecutor::new();
    let resolver: Arc<dyn TierResolver> =
        Arc::new(RuleTierResolver::builder().fallback(5).build());
    let gate = ApprovalGate::new(Arc::clone(&executor) as Arc<dyn ToolExecutor>, resolver)
        .with_handler(ScriptedHandler::denying());

    let outcome = gate.execute("list_tools", json!({}), &target()).await.unwrap();
    assert!(outcome.success);

    let outcome = gate
        .execute("tools_changed", json!({}), &target())
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(executor.call_count(), 2);
}

#[tokio::test]
async fn test_auto_approve_bypasses_the_handler() {
    let executor = CountingExecutor::new();
    let handler = ScriptedHandler::denying();
    let gate = gate(Arc::clone(&executor)).with_handler(handler.clone());

    gate.set_auto_approve(true);
    let outcome = gate
        .execute("delete_row", json!({}), &target())
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(handler.request_count(), 0);

    // turning it back off restores gating
    gate.set_auto_approve(false);
    let outcome = gate
        .execute("delete_row", json!({}), &target())
        .await
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(handler.request_count(), 1);
}

#[tokio::test]
async fn test_threshold_override() {
    let executor = CountingExecutor::new();
    let gate = gate(Arc::clone(&executor)).with_threshold(1);

    // tier 1 now requires approval, and there is no handler
    let outcome = gate
        .execute("read_table", json!({}), &target())
        .await
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(executor.call_count(), 0);
}

#[tokio::test]
async fn test_custom_resolver_rules() {
    let executor = CountingExecutor::new();
    let resolver: Arc<dyn TierResolver> = Arc::new(
        RuleTierResolver::builder()
            .rule("^pay_", 3)
            .fallback(0)
            .build(),
    );
    let gate = ApprovalGate::new(Arc::clone(&executor) as Arc<dyn ToolExecutor>, resolver);

    // everything below the threshold auto-executes
    let outcome = gate
        .execute("delete_row", json!({}), &target())
        .await
        .unwrap();
    assert!(outcome.success);

    // the custom rule gates what the defaults would not
    let outcome = gate
        .execute("pay_invoice", json!({}), &target())
        .await
        .unwrap();
    assert!(!outcome.success);
}

// =============================================================================
// Denial text through the tool-use loop
// =============================================================================

struct OneShotChat {
    script: Mutex<VecDeque<CandidateResponse>>,
    requests: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatSession for OneShotChat {
    async fn send(&self, request: ChatRequest) -> tabpilot::Result<CandidateResponse> {
        self.requests.lock().unwrap().push(request.message);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::chat("scripted responses exhausted"))
    }

    async fn trim_history(&self, _max_turns: usize) {}
}

#[tokio::test]
async fn test_denial_feeds_back_to_the_model() {
    let chat = Arc::new(OneShotChat {
        script: Mutex::new(
            vec![
                CandidateResponse::default().with_tool_calls(vec![ToolUse::new(
                    "c1",
                    "delete_row",
                    json!({"row": 3}),
                )]),
                CandidateResponse::text("understood, leaving the row alone"),
            ]
            .into(),
        ),
        requests: Mutex::new(Vec::new()),
    });
    let executor = CountingExecutor::new();

    let orch = Orchestrator::builder()
        .chat(Arc::clone(&chat) as Arc<dyn ChatSession>)
        .executor(Arc::clone(&executor) as Arc<dyn ToolExecutor>)
        .approval_handler(ScriptedHandler::denying())
        .build()
        .unwrap();

    let ctx = RunContext::new(target());
    let result = assert_ok!(orch.run("clean up the table", ctx).await);

    assert_eq!(result.text, "understood, leaving the row alone");
    assert_eq!(executor.call_count(), 0);

    // the denial lands in the records and in the follow-up message
    assert_eq!(result.tool_calls.len(), 1);
    assert!(!result.tool_calls[0].success);
    let follow_up = &chat.requests.lock().unwrap()[1];
    assert!(follow_up.contains("delete_row"));
    assert!(follow_up.contains("denied"));
}
