//! Orchestrator configuration.

use std::time::Duration;

use super::calls::DEFAULT_NAVIGATION_TOOLS;

/// Tool-use loop configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum loop iterations; 0 means unlimited.
    pub max_iterations: usize,
    /// Wall-clock timeout measured from loop entry; `None` means unlimited.
    pub timeout: Option<Duration>,
    /// Trim chat history to this many turns before each follow-up send.
    pub trim_history_turns: Option<usize>,
    /// System instructions passed on every send.
    pub system_prompt: Option<String>,
    /// Tools whose successful execution triggers a navigation re-scan.
    pub navigation_tools: Vec<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            timeout: Some(Duration::from_secs(60)),
            trim_history_turns: None,
            system_prompt: None,
            navigation_tools: DEFAULT_NAVIGATION_TOOLS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            None
        } else {
            Some(timeout)
        };
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn with_trim_history(mut self, max_turns: usize) -> Self {
        self.trim_history_turns = Some(max_turns);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_navigation_tools(
        mut self,
        tools: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.navigation_tools = tools.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.timeout, Some(Duration::from_secs(60)));
        assert!(config.trim_history_turns.is_none());
        assert!(config.navigation_tools.contains(&"navigate".to_string()));
    }

    #[test]
    fn test_zero_timeout_means_unlimited() {
        let config = OrchestratorConfig::default().with_timeout(Duration::ZERO);
        assert!(config.timeout.is_none());
    }
}
