//! Tool definitions advertised for the plan-management and delegation
//! actions. Only advertised when the corresponding collaborator is wired.

use serde_json::json;

use super::calls::{DELEGATE_TOOL, PLAN_CREATE, PLAN_MARK_DONE, PLAN_MARK_FAILED, PLAN_UPDATE};
use crate::types::ToolDefinition;

/// Plan-management tool definitions, handled locally by the plan tracker.
pub fn plan_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            PLAN_CREATE,
            "Create a step-by-step plan for the current goal before acting on it.",
            json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Ordered plan steps"
                    }
                },
                "required": ["steps"]
            }),
        ),
        ToolDefinition::new(
            PLAN_UPDATE,
            "Replace the current plan when the approach changes.",
            json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Revised ordered plan steps"
                    }
                },
                "required": ["steps"]
            }),
        ),
        ToolDefinition::new(
            PLAN_MARK_DONE,
            "Mark the current plan step as completed.",
            json!({
                "type": "object",
                "properties": {
                    "note": {"type": "string", "description": "Optional completion note"}
                }
            }),
        ),
        ToolDefinition::new(
            PLAN_MARK_FAILED,
            "Mark the current plan step as failed.",
            json!({
                "type": "object",
                "properties": {
                    "reason": {"type": "string", "description": "Why the step failed"}
                }
            }),
        ),
    ]
}

/// Delegation tool definition, routed to the subagent manager.
pub fn delegate_tool() -> ToolDefinition {
    ToolDefinition::new(
        DELEGATE_TOOL,
        "Delegate a self-contained sub-goal to a child agent and wait for its result. \
         Use for work that can proceed independently of the current conversation.",
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Complete description of the sub-goal"
                },
                "timeout_secs": {
                    "type": "number",
                    "description": "Optional per-task timeout in seconds"
                }
            },
            "required": ["prompt"]
        }),
    )
}
