//! Orchestrator events, run results, and the per-instance listener registry.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::types::{PageContext, ToolCallRecord, ToolDefinition};

/// Events emitted to subscribers during a run.
///
/// Fire-and-forget notifications: a failing subscriber never aborts the run,
/// and events are not part of the [`RunResult`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    ToolCall {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        id: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    ToolError {
        id: String,
        name: String,
        error: String,
    },
    AiResponse {
        text: String,
    },
    Navigation {
        tool: String,
    },
    SubagentStarted {
        id: String,
        description: String,
    },
    SubagentCompleted {
        id: String,
        steps_completed: usize,
    },
    SubagentFailed {
        id: String,
        error: String,
    },
    Timeout {
        elapsed_ms: u64,
    },
    MaxIterations {
        limit: usize,
    },
}

/// Terminal output of one `run` call. Created exactly once, at the point a
/// terminal condition is reached.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub text: String,
    pub reasoning: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Tool set after any navigation re-scan.
    pub tools: Vec<ToolDefinition>,
    /// Page context after any navigation re-scan.
    pub page: PageContext,
    /// Candidate responses consumed: each processed batch and the final
    /// answer count as one step.
    pub steps_completed: usize,
}

impl RunResult {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn succeeded_calls(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(|record| record.success)
    }

    pub fn failed_calls(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(|record| !record.success)
    }
}

type Listener = Arc<dyn Fn(&OrchestratorEvent) + Send + Sync>;

/// Per-instance listener registry. Cloning shares the underlying registry so
/// the subagent manager can emit through its parent orchestrator's bus.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<HashMap<u64, Listener>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&OrchestratorEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .insert(id, Arc::new(listener));
        ListenerHandle {
            id,
            listeners: Arc::clone(&self.listeners),
        }
    }

    /// Invoke every listener with the event.
    ///
    /// Listeners are snapshotted before invocation so a callback may register
    /// or remove listeners without deadlocking; panics are isolated per
    /// listener.
    pub fn emit(&self, event: &OrchestratorEvent) {
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock().expect("listener registry poisoned");
            listeners.values().cloned().collect()
        };

        for listener in snapshot {
            if std::panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                warn!(event = ?event, "Event listener panicked");
            }
        }
    }

    pub fn clear(&self) {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .len()
    }
}

/// Subscription handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle leaves the subscription active; call
/// [`ListenerHandle::unsubscribe`] to remove it.
pub struct ListenerHandle {
    id: u64,
    listeners: Arc<Mutex<HashMap<u64, Listener>>>,
}

impl ListenerHandle {
    pub fn unsubscribe(self) {
        self.listeners
            .lock()
            .expect("listener registry poisoned")
            .remove(&self.id);
    }
}
