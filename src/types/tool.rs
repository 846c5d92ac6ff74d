//! Tool definition and call-outcome types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, schema-described action executable against a tab target.
///
/// The `input_schema` is pass-through JSON Schema: the engine advertises it to
/// the chat service and never validates arguments against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// One tool call requested by the model in a candidate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUse {
    /// Correlation id supplied by the chat service.
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl ToolUse {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Result of executing one tool call against its target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Persisted record of one executed tool call. Append-only across a run;
/// plan-management and delegation calls are accounted separately and never
/// appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub input: Value,
    pub call_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallRecord {
    pub fn from_outcome(call: &ToolUse, outcome: &ToolOutcome) -> Self {
        Self {
            tool_name: call.name.clone(),
            input: call.input.clone(),
            call_id: call.id.clone(),
            success: outcome.success,
            data: outcome.data.clone(),
            error: outcome.error.clone(),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_constructors() {
        let ok = ToolOutcome::ok(json!({"rows": 3}));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let err = ToolOutcome::err("element not found");
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("element not found"));
        assert!(err.data.is_none());
    }

    #[test]
    fn test_record_from_outcome() {
        let call = ToolUse::new("call-1", "click_button", json!({"selector": "#go"}));
        let record = ToolCallRecord::from_outcome(&call, &ToolOutcome::ok(json!("done")));
        assert_eq!(record.call_id, "call-1");
        assert_eq!(record.tool_name, "click_button");
        assert!(record.success);
    }

    #[test]
    fn test_record_skips_empty_fields_in_json() {
        let call = ToolUse::new("call-2", "read_table", json!({}));
        let record = ToolCallRecord::from_outcome(&call, &ToolOutcome::err("timed out"));
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("data").is_none());
        assert_eq!(value["error"], "timed out");
    }
}
