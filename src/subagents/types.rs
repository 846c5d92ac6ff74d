//! Subagent task, handle, and outcome types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{RunContext, ToolDefinition};

/// Handle descriptions are truncated to this many characters.
pub const DESCRIPTION_LIMIT: usize = 64;

pub fn truncate_description(prompt: &str) -> String {
    if prompt.chars().count() <= DESCRIPTION_LIMIT {
        prompt.to_string()
    } else {
        let mut truncated: String = prompt.chars().take(DESCRIPTION_LIMIT).collect();
        truncated.push_str("...");
        truncated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubagentStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// One active child task. Owned exclusively by the manager; callers only see
/// snapshots returned by value.
#[derive(Debug, Clone, Serialize)]
pub struct SubagentHandle {
    pub id: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub status: SubagentStatus,
}

/// One delegated sub-goal.
#[derive(Debug, Clone)]
pub struct SubagentTask {
    pub prompt: String,
    pub context: Option<RunContext>,
    /// Restrict the child to this tool subset.
    pub tools: Option<Vec<ToolDefinition>>,
    /// Recursion depth; 0 at the root, parents pass `depth + 1`.
    pub depth: usize,
    pub timeout: Option<Duration>,
}

impl SubagentTask {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
            tools: None,
            depth: 0,
            timeout: None,
        }
    }

    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of one spawn call. Depth and concurrency rejections are structured
/// outcomes with `subagent_id: None`, never errors.
#[derive(Debug, Clone)]
pub struct SubagentOutcome {
    pub subagent_id: Option<String>,
    pub text: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub steps_completed: usize,
}

impl SubagentOutcome {
    pub fn completed(id: impl Into<String>, text: impl Into<String>, steps: usize) -> Self {
        Self {
            subagent_id: Some(id.into()),
            text: Some(text.into()),
            success: true,
            error: None,
            steps_completed: steps,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            subagent_id: Some(id.into()),
            text: None,
            success: false,
            error: Some(error.into()),
            steps_completed: 0,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            subagent_id: None,
            text: None,
            success: false,
            error: Some(error.into()),
            steps_completed: 0,
        }
    }
}

/// Delegation limits. Caps are per-manager and enforced at spawn time with
/// no queuing.
#[derive(Debug, Clone)]
pub struct SubagentConfig {
    /// Maximum recursion depth of delegation chains.
    pub max_depth: usize,
    /// Maximum simultaneously active children.
    pub max_concurrent: usize,
    /// Timeout applied when a task carries none.
    pub default_timeout: Duration,
}

impl Default for SubagentConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_concurrent: 3,
            default_timeout: Duration::from_secs(30),
        }
    }
}

impl SubagentConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}
