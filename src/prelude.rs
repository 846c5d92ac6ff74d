//! Prelude module for convenient imports.
//!
//! ```rust
//! use tabpilot::prelude::*;
//! ```

// Core
pub use crate::Error;
pub use crate::Orchestrator;
pub use crate::OrchestratorBuilder;
pub use crate::OrchestratorConfig;
pub use crate::OrchestratorEvent;
pub use crate::Result;
pub use crate::RunResult;

// Ports
pub use crate::ports::{
    AgentRunner, ApprovalHandler, ChatSession, OrchestratorFactory, PageRescanner, PlanTracker,
    ToolExecutor,
};

// Approval
pub use crate::approval::{ApprovalDecision, ApprovalGate, ApprovalRequest, RuleTierResolver};

// Budget
pub use crate::budget::ContextBudgeter;

// Subagents
pub use crate::subagents::{SubagentConfig, SubagentManager, SubagentOutcome, SubagentTask};

// Types
pub use crate::types::{
    CandidateResponse, ChatRequest, ChatTurn, PageContext, RunContext, TabTarget, ToolCallRecord,
    ToolDefinition, ToolOutcome, ToolUse,
};
