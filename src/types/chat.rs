//! Chat-service request and response shapes.

use serde::{Deserialize, Serialize};

use super::tool::{ToolDefinition, ToolUse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior conversation turn used to prime a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-send configuration: system instructions plus the tool schemas
/// currently available to the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub tools: Vec<ToolDefinition>,
}

/// One message sent to the chat service. `history` primes the conversation on
/// the first turn of a run; follow-up turns carry only the new message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<ChatTurn>,
    pub config: ChatConfig,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, config: ChatConfig) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            config,
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

/// One turn's output from the chat service. Ephemeral; consumed within a
/// single loop iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolUse>,
}

impl CandidateResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolUse>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn wants_tool_use(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
