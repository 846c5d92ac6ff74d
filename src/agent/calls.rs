//! Closed-set classification of requested tool calls.
//!
//! Every call is resolved to exactly one category once, before execution, so
//! the loop's branches stay exhaustive and independent of naming conventions.

use std::collections::HashSet;

use crate::approval::is_introspection_tool;

pub const PLAN_CREATE: &str = "create_plan";
pub const PLAN_UPDATE: &str = "update_plan";
pub const PLAN_MARK_DONE: &str = "mark_step_done";
pub const PLAN_MARK_FAILED: &str = "mark_step_failed";
pub const DELEGATE_TOOL: &str = "delegate_task";

/// Default set of tools whose successful execution invalidates the current
/// page/tool snapshot.
pub const DEFAULT_NAVIGATION_TOOLS: &[&str] =
    &["navigate", "search", "open_url", "submit_form", "click_link"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    MarkStepDone,
    MarkStepFailed,
}

/// Category a requested call resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Plan-management action, handled locally by the plan tracker.
    Plan(PlanAction),
    /// Delegation to a subagent.
    Delegate,
    /// Executed normally; success triggers a navigation re-scan and aborts
    /// the rest of the batch.
    Navigation,
    /// Tool-listing and change-notification calls; bypass the approval gate.
    Introspection,
    Standard,
}

#[derive(Debug, Clone)]
pub struct CallClassifier {
    navigation_tools: HashSet<String>,
}

impl Default for CallClassifier {
    fn default() -> Self {
        Self {
            navigation_tools: DEFAULT_NAVIGATION_TOOLS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl CallClassifier {
    pub fn new(navigation_tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            navigation_tools: navigation_tools.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classify(&self, tool_name: &str) -> CallKind {
        match tool_name {
            PLAN_CREATE => CallKind::Plan(PlanAction::Create),
            PLAN_UPDATE => CallKind::Plan(PlanAction::Update),
            PLAN_MARK_DONE => CallKind::Plan(PlanAction::MarkStepDone),
            PLAN_MARK_FAILED => CallKind::Plan(PlanAction::MarkStepFailed),
            DELEGATE_TOOL => CallKind::Delegate,
            name if is_introspection_tool(name) => CallKind::Introspection,
            name if self.navigation_tools.contains(name) => CallKind::Navigation,
            _ => CallKind::Standard,
        }
    }
}
