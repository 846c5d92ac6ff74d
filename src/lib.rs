//! # tabpilot
//!
//! Agentic tool-use engine for browser-tab targets.
//!
//! Given a natural-language goal and a set of schema-described tools, the
//! engine drives a multi-turn conversation with a chat service, executes the
//! tools the model requests through an approval gate, feeds results back, and
//! repeats until the model produces a final answer or a resource limit is
//! hit. Sub-goals can be delegated to recursively spawned child agents under
//! strict depth and concurrency limits.
//!
//! The chat service, tool dispatch, page re-scanning, planning, and approval
//! UI are ports (see [`ports`]); the engine itself is the orchestration
//! control loop and its collaborators:
//!
//! - [`agent::Orchestrator`] — the turn-taking tool-use loop
//! - [`subagents::SubagentManager`] — bounded recursive delegation
//! - [`approval::ApprovalGate`] — security-tier gating of destructive calls
//! - [`budget::ContextBudgeter`] — token accounting and result offloading
//!
//! ## Configuration
//!
//! ```rust
//! use std::time::Duration;
//! use tabpilot::{OrchestratorConfig, RuleTierResolver};
//!
//! let config = OrchestratorConfig::default()
//!     .with_max_iterations(5)
//!     .with_timeout(Duration::from_secs(30))
//!     .with_navigation_tools(["navigate", "submit_form"]);
//!
//! let tiers = RuleTierResolver::builder()
//!     .rule("^delete_", 2)
//!     .fallback(1)
//!     .build();
//! # let _ = (config, tiers);
//! ```

#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod agent;
pub mod approval;
pub mod budget;
pub mod ports;
pub mod prelude;
pub mod subagents;
pub mod types;

// Re-exports for convenience
pub use agent::{
    CallClassifier, CallKind, EventBus, ListenerHandle, Orchestrator, OrchestratorBuilder,
    OrchestratorConfig, OrchestratorEvent, PlanAction, RunResult,
};
pub use approval::{
    ApprovalDecision, ApprovalGate, ApprovalRequest, RuleTierResolver, RuleTierResolverBuilder,
    TierResolver,
};
pub use budget::{ContextBudgeter, TokenUsage, estimate_tokens};
pub use ports::{
    AgentRunner, ApprovalHandler, ChatSession, OrchestratorFactory, PageRescanner, PlanTracker,
    ToolExecutor,
};
pub use subagents::{
    SubagentConfig, SubagentHandle, SubagentManager, SubagentOutcome, SubagentStatus, SubagentTask,
};
pub use types::{
    CandidateResponse, ChatConfig, ChatRequest, ChatTurn, MentionContext, PageContext,
    PageSnapshot, Role, RunContext, TabTarget, ToolCallRecord, ToolDefinition, ToolOutcome,
    ToolUse,
};

/// Error type for tabpilot operations.
///
/// Failures local to one tool call are never surfaced here; they are recorded
/// and fed back to the model. Only shared-infrastructure failures are fatal
/// to a run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Chat-service request failed. Fatal to the current run.
    #[error("Chat service failed: {message}")]
    Chat { message: String },

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The orchestrator was disposed before or during the call.
    #[error("Orchestrator has been disposed")]
    Disposed,
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration or setup errors
    Configuration,
    /// Errors that may succeed on retry
    Transient,
    /// Lifecycle and other stateful operation errors
    Stateful,
    /// Internal errors (JSON, unexpected states)
    Internal,
}

impl Error {
    pub fn chat(message: impl Into<String>) -> Self {
        Error::Chat {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Chat { .. } => ErrorCategory::Transient,
            Error::Config(_) => ErrorCategory::Configuration,
            Error::Disposed => ErrorCategory::Stateful,
            Error::Json(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }
}

pub type Result<T> = std::result::Result<T, Error>;
