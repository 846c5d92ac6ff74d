//! Execution-target identity and page-state types.

use serde::{Deserialize, Serialize};

use super::chat::ChatTurn;
use super::tool::ToolDefinition;

/// Identity of one execution target: which browser tab tools act on and which
/// conversation identity owns the exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabTarget {
    pub tab_id: String,
    pub conversation_id: String,
}

impl TabTarget {
    pub fn new(tab_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            tab_id: tab_id.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

/// Snapshot of a target's page state at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl PageContext {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Result of a navigation re-scan: the fresh page state and the tool set
/// discovered on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub page: PageContext,
    pub tools: Vec<ToolDefinition>,
}

/// Another target whose page state and tools are merged read-only into one
/// run's initial turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionContext {
    pub target: TabTarget,
    pub page: PageContext,
    pub tools: Vec<ToolDefinition>,
}

/// Input to one orchestrator run. Immutable for the duration of the run; the
/// loop works on its own copies of the tool set and page state.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub target: TabTarget,
    pub tools: Vec<ToolDefinition>,
    pub page: PageContext,
    pub history: Vec<ChatTurn>,
    pub mentions: Vec<MentionContext>,
}

impl RunContext {
    pub fn new(target: TabTarget) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_page(mut self, page: PageContext) -> Self {
        self.page = page;
        self
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_mention(mut self, mention: MentionContext) -> Self {
        self.mentions.push(mention);
        self
    }
}
