//! Subagent delegation: bounded recursive spawning of child orchestrators.

mod manager;
mod types;

pub use manager::SubagentManager;
pub use types::{
    DESCRIPTION_LIMIT, SubagentConfig, SubagentHandle, SubagentOutcome, SubagentStatus,
    SubagentTask, truncate_description,
};
