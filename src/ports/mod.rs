//! Port traits for every external collaborator the engine consumes.
//!
//! The core is an in-process control-flow boundary: it sequences calls and
//! enforces limits, while page scanning, tool dispatch, and transcript
//! persistence live behind these traits.

use async_trait::async_trait;
use serde_json::Value;

use crate::approval::{ApprovalDecision, ApprovalRequest};
use crate::types::{
    CandidateResponse, ChatRequest, PageSnapshot, RunContext, TabTarget, ToolDefinition,
    ToolOutcome,
};

/// Conversation handle to the language-model chat service.
///
/// Errors from `send` are fatal to the current run and propagate to its
/// caller; there is no well-defined recovery at this layer.
#[async_trait]
pub trait ChatSession: Send + Sync {
    async fn send(&self, request: ChatRequest) -> crate::Result<CandidateResponse>;

    /// Drop conversation turns beyond `max_turns`.
    async fn trim_history(&self, max_turns: usize);
}

/// Dispatches a named tool call to its execution target.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(
        &self,
        name: &str,
        input: Value,
        target: &TabTarget,
    ) -> crate::Result<ToolOutcome>;
}

/// Re-scans a target after a navigation side effect.
///
/// Expected to tolerate partial failure by returning the previous tool set;
/// the loop additionally falls back to its last-known tools on `Err`.
#[async_trait]
pub trait PageRescanner: Send + Sync {
    async fn rescan(
        &self,
        target: &TabTarget,
        previous_tools: &[ToolDefinition],
    ) -> crate::Result<PageSnapshot>;
}

/// Step-plan collaborator. Infallible at this boundary: the collaborator
/// treats its own failures as no-ops.
#[async_trait]
pub trait PlanTracker: Send + Sync {
    async fn create_plan(&self, input: &Value);
    async fn update_plan(&self, input: &Value);
    async fn mark_step_done(&self, input: &Value);
    async fn mark_step_failed(&self, input: &Value);

    /// Called once per processed batch, not once per call.
    async fn advance_step(&self);
}

/// Human-approval callback, invoked only for tiers at or above the approval
/// threshold when auto-approve is off.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn request(&self, request: &ApprovalRequest) -> ApprovalDecision;
}

/// The run/dispose subset of the orchestrator contract.
///
/// The subagent manager drives children through this trait so that recursion
/// does not depend on the orchestrator's concrete wiring.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, goal: &str, ctx: RunContext) -> crate::Result<crate::agent::RunResult>;

    fn dispose(&self);
}

/// Builds a fresh child orchestrator for one delegated task.
pub trait OrchestratorFactory: Send + Sync {
    fn create(&self, depth: usize) -> Box<dyn AgentRunner>;
}
