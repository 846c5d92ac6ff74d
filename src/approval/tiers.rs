//! Security-tier resolution for tool calls.

use regex::Regex;
use serde_json::Value;

/// Resolves a tool call to an ordinal security tier.
///
/// The scale is open-ended: tiers 0 and 1 auto-execute under the default
/// threshold, tier 2 and above require approval.
pub trait TierResolver: Send + Sync {
    fn resolve(&self, tool_name: &str, input: &Value) -> u8;

    /// Human-readable description attached to approval requests.
    fn describe(&self, tool_name: &str, _input: &Value) -> String {
        format!("Execute tool '{}'", tool_name)
    }
}

/// One ordered rule mapping a tool-name pattern to a tier.
#[derive(Clone, Debug)]
pub struct TierRule {
    pub pattern: String,
    pub tier: u8,
    compiled: Option<Regex>,
}

impl TierRule {
    pub fn new(pattern: impl Into<String>, tier: u8) -> Self {
        Self {
            pattern: pattern.into(),
            tier,
            compiled: None,
        }
    }

    pub fn compile(&mut self) -> Result<(), regex::Error> {
        self.compiled = Some(Regex::new(&self.pattern)?);
        Ok(())
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        if let Some(ref regex) = self.compiled {
            regex.is_match(tool_name)
        } else if let Ok(regex) = Regex::new(&self.pattern) {
            regex.is_match(tool_name)
        } else {
            self.pattern == tool_name
        }
    }
}

/// Ordered-rule tier resolver: first matching rule wins, otherwise the
/// fallback tier applies.
#[derive(Clone, Debug)]
pub struct RuleTierResolver {
    rules: Vec<TierRule>,
    fallback: u8,
}

impl Default for RuleTierResolver {
    /// Conservative defaults: introspection is free, destructive verbs and
    /// form submission require approval, everything else auto-executes.
    fn default() -> Self {
        Self::builder()
            .rule("^(list_tools|tools_changed)$", 0)
            .rule("^(delete|remove|clear)_", 2)
            .rule("^submit_", 2)
            .rule("_(delete|destroy)$", 2)
            .fallback(1)
            .build()
    }
}

impl RuleTierResolver {
    pub fn builder() -> RuleTierResolverBuilder {
        RuleTierResolverBuilder::default()
    }
}

impl TierResolver for RuleTierResolver {
    fn resolve(&self, tool_name: &str, _input: &Value) -> u8 {
        self.rules
            .iter()
            .find(|rule| rule.matches(tool_name))
            .map(|rule| rule.tier)
            .unwrap_or(self.fallback)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RuleTierResolverBuilder {
    rules: Vec<TierRule>,
    fallback: u8,
}

impl RuleTierResolverBuilder {
    pub fn rule(mut self, pattern: impl Into<String>, tier: u8) -> Self {
        self.rules.push(TierRule::new(pattern, tier));
        self
    }

    pub fn fallback(mut self, tier: u8) -> Self {
        self.fallback = tier;
        self
    }

    pub fn build(mut self) -> RuleTierResolver {
        for rule in &mut self.rules {
            let _ = rule.compile();
        }
        RuleTierResolver {
            rules: self.rules,
            fallback: self.fallback,
        }
    }
}
