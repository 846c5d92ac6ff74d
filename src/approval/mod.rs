//! Approval gate: security-tier classification and human-in-the-loop gating
//! for destructive tool calls.

mod gate;
mod tiers;

pub use gate::{
    ApprovalDecision, ApprovalGate, ApprovalRequest, DEFAULT_APPROVAL_THRESHOLD,
    INTROSPECTION_TOOLS, is_introspection_tool,
};
pub use tiers::{RuleTierResolver, RuleTierResolverBuilder, TierResolver, TierRule};
