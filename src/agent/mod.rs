//! The tool-use loop: a turn-taking state machine over the chat service.

mod builtin;
mod calls;
mod config;
mod events;
mod execution;
mod orchestrator;

pub use builtin::{delegate_tool, plan_tools};
pub use calls::{
    CallClassifier, CallKind, DEFAULT_NAVIGATION_TOOLS, DELEGATE_TOOL, PLAN_CREATE,
    PLAN_MARK_DONE, PLAN_MARK_FAILED, PLAN_UPDATE, PlanAction,
};
pub use config::OrchestratorConfig;
pub use events::{EventBus, ListenerHandle, OrchestratorEvent, RunResult};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
