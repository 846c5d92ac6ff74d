//! Shared data model for the orchestration engine.

mod chat;
mod context;
mod tool;

pub use chat::{CandidateResponse, ChatConfig, ChatRequest, ChatTurn, Role};
pub use context::{MentionContext, PageContext, PageSnapshot, RunContext, TabTarget};
pub use tool::{ToolCallRecord, ToolDefinition, ToolOutcome, ToolUse};
