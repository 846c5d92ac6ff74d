//! Approval-gated tool execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::tiers::TierResolver;
use crate::ports::{ApprovalHandler, ToolExecutor};
use crate::types::{TabTarget, ToolOutcome};

/// Tier at or above which human approval is required.
pub const DEFAULT_APPROVAL_THRESHOLD: u8 = 2;

/// Introspection calls always delegate straight through, unaffected by tier.
pub const INTROSPECTION_TOOLS: &[&str] = &["list_tools", "tools_changed"];

pub fn is_introspection_tool(tool_name: &str) -> bool {
    INTROSPECTION_TOOLS.contains(&tool_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approved,
    Denied,
}

impl ApprovalDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Payload handed to the approval callback.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalRequest {
    pub tool_name: String,
    pub input: Value,
    pub tier: u8,
    pub description: String,
}

/// Wraps the tool execution port with a security-tier check: auto-approves,
/// asks a human, or is bypassed in an explicit unsafe auto-approve mode.
pub struct ApprovalGate {
    executor: Arc<dyn ToolExecutor>,
    resolver: Arc<dyn TierResolver>,
    handler: Option<Arc<dyn ApprovalHandler>>,
    auto_approve: AtomicBool,
    threshold: u8,
}

impl ApprovalGate {
    pub fn new(executor: Arc<dyn ToolExecutor>, resolver: Arc<dyn TierResolver>) -> Self {
        Self {
            executor,
            resolver,
            handler: None,
            auto_approve: AtomicBool::new(false),
            threshold: DEFAULT_APPROVAL_THRESHOLD,
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn ApprovalHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn set_auto_approve(&self, enabled: bool) {
        self.auto_approve.store(enabled, Ordering::Relaxed);
    }

    pub fn is_auto_approve(&self) -> bool {
        self.auto_approve.load(Ordering::Relaxed)
    }

    /// Execute a tool call, gated by its resolved tier.
    ///
    /// A denial is a normal failed outcome, never an error: the model is
    /// expected to react to it conversationally.
    pub async fn execute(
        &self,
        tool_name: &str,
        input: Value,
        target: &TabTarget,
    ) -> crate::Result<ToolOutcome> {
        if is_introspection_tool(tool_name) {
            return self.executor.execute(tool_name, input, target).await;
        }

        let tier = self.resolver.resolve(tool_name, &input);
        if self.is_auto_approve() || tier < self.threshold {
            return self.executor.execute(tool_name, input, target).await;
        }

        let request = ApprovalRequest {
            tool_name: tool_name.to_string(),
            input: input.clone(),
            tier,
            description: self.resolver.describe(tool_name, &input),
        };

        match self.request_approval(&request).await {
            ApprovalDecision::Approved => {
                debug!(tool = %tool_name, tier, "Tool call approved");
                self.executor.execute(tool_name, input, target).await
            }
            ApprovalDecision::Denied => {
                warn!(tool = %tool_name, tier, "Tool call denied");
                Ok(ToolOutcome::err(format!(
                    "Tool '{}' was denied approval (tier {})",
                    tool_name, tier
                )))
            }
        }
    }

    /// Ask the approval callback. No configured handler means denial.
    pub async fn request_approval(&self, request: &ApprovalRequest) -> ApprovalDecision {
        match &self.handler {
            Some(handler) => handler.request(request).await,
            None => ApprovalDecision::Denied,
        }
    }
}
