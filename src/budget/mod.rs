//! Context budgeting: token accounting and oversized-result offloading.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

/// Rough chars-per-token heuristic used for all estimates.
pub const CHARS_PER_TOKEN: usize = 4;

/// Default offload threshold in estimated tokens.
pub const DEFAULT_OFFLOAD_THRESHOLD: u64 = 2_000;

/// Estimate token count from text length.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() / CHARS_PER_TOKEN) as u64
}

/// Running token usage for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Tracks cumulative token usage and offloads oversized tool results behind
/// opaque `ref-<uuid>` tokens before they re-enter the conversation.
#[derive(Debug)]
pub struct ContextBudgeter {
    offload_threshold: u64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    store: DashMap<String, String>,
}

impl Default for ContextBudgeter {
    fn default() -> Self {
        Self {
            offload_threshold: DEFAULT_OFFLOAD_THRESHOLD,
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            store: DashMap::new(),
        }
    }
}

impl ContextBudgeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offload_threshold(mut self, tokens: u64) -> Self {
        self.offload_threshold = tokens;
        self
    }

    pub fn record_input(&self, tokens: u64) {
        self.input_tokens.fetch_add(tokens, Ordering::Relaxed);
    }

    pub fn record_output(&self, tokens: u64) {
        self.output_tokens.fetch_add(tokens, Ordering::Relaxed);
    }

    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }

    /// Replace an oversized string result with a short substitute carrying an
    /// opaque reference. Non-string values pass through untouched.
    pub fn offload(&self, tool_name: &str, value: Value) -> Value {
        let Value::String(text) = value else {
            return value;
        };

        let estimated = estimate_tokens(&text);
        if estimated <= self.offload_threshold {
            return Value::String(text);
        }

        let reference = format!("ref-{}", uuid::Uuid::new_v4());
        let substitute = format!(
            "Result from {} ({} chars, ~{} tokens) stored as {}. \
             Request it by reference if the full content is needed.",
            tool_name,
            text.len(),
            estimated,
            reference
        );
        debug!(tool = %tool_name, %reference, estimated, "Offloaded oversized tool result");
        self.store.insert(reference, text);
        Value::String(substitute)
    }

    /// Resolve a reference back to the offloaded content.
    pub fn lookup(&self, reference: &str) -> Option<String> {
        self.store.get(reference).map(|entry| entry.clone())
    }

    /// Clear the offload store and usage counters. Called once per new run.
    pub fn reset(&self) {
        self.store.clear();
        self.input_tokens.store(0, Ordering::Relaxed);
        self.output_tokens.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_accumulates() {
        let budgeter = ContextBudgeter::new();
        budgeter.record_input(100);
        budgeter.record_input(50);
        budgeter.record_output(25);

        let usage = budgeter.usage();
        assert_eq!(usage.input_tokens, 150);
        assert_eq!(usage.output_tokens, 25);
        assert_eq!(usage.total(), 175);
    }

    #[test]
    fn test_small_results_pass_through() {
        let budgeter = ContextBudgeter::new().with_offload_threshold(10);
        let value = budgeter.offload("read_table", json!("short"));
        assert_eq!(value, json!("short"));
    }

    #[test]
    fn test_non_string_passes_through() {
        let budgeter = ContextBudgeter::new().with_offload_threshold(0);
        let value = budgeter.offload("read_table", json!({"rows": [1, 2, 3]}));
        assert_eq!(value, json!({"rows": [1, 2, 3]}));
    }

    #[test]
    fn test_offload_and_lookup() {
        let budgeter = ContextBudgeter::new().with_offload_threshold(4);
        let original = "x".repeat(100);
        let value = budgeter.offload("extract_text", Value::String(original.clone()));

        let substitute = value.as_str().unwrap();
        assert!(substitute.contains("extract_text"));
        let reference = substitute
            .split_whitespace()
            .find(|word| word.starts_with("ref-"))
            .unwrap()
            .trim_end_matches('.');
        assert_eq!(budgeter.lookup(reference), Some(original));
    }

    #[test]
    fn test_reset_clears_store_and_counters() {
        let budgeter = ContextBudgeter::new().with_offload_threshold(1);
        let value = budgeter.offload("extract_text", Value::String("y".repeat(50)));
        let reference = value
            .as_str()
            .unwrap()
            .split_whitespace()
            .find(|word| word.starts_with("ref-"))
            .unwrap()
            .trim_end_matches('.')
            .to_string();
        budgeter.record_input(10);

        budgeter.reset();
        assert_eq!(budgeter.lookup(&reference), None);
        assert_eq!(budgeter.usage().total(), 0);
    }
}
