//! Bounded recursive delegation with timeout-driven cancellation.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tokio::sync::{RwLock, oneshot};
use tracing::{debug, info, warn};

use super::types::{
    SubagentConfig, SubagentHandle, SubagentOutcome, SubagentStatus, SubagentTask,
    truncate_description,
};
use crate::agent::{EventBus, OrchestratorEvent, RunResult};
use crate::ports::OrchestratorFactory;

struct ActiveSubagent {
    handle: SubagentHandle,
    cancel_tx: Option<oneshot::Sender<()>>,
}

enum Settled {
    Finished(crate::Result<RunResult>),
    Panicked,
    TimedOut,
    Cancelled,
}

/// Spawns fresh orchestrator instances as child tasks, enforcing a maximum
/// recursion depth and a concurrency cap.
///
/// The active-handle table is owned exclusively by the manager; events are
/// emitted through the bus shared with the parent orchestrator.
pub struct SubagentManager {
    config: SubagentConfig,
    factory: Arc<dyn OrchestratorFactory>,
    active: Arc<RwLock<HashMap<String, ActiveSubagent>>>,
    events: EventBus,
}

impl SubagentManager {
    pub fn new(factory: Arc<dyn OrchestratorFactory>) -> Self {
        Self {
            config: SubagentConfig::default(),
            factory,
            active: Arc::new(RwLock::new(HashMap::new())),
            events: EventBus::new(),
        }
    }

    pub fn with_config(mut self, config: SubagentConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an event bus, usually the parent orchestrator's.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &SubagentConfig {
        &self.config
    }

    /// Run one delegated task to completion, failure, or cancellation.
    ///
    /// A child cancelled by timeout may still be running detached in the
    /// background; its result is discarded, not guaranteed stopped. The child
    /// orchestrator is disposed best-effort on every path.
    pub async fn spawn(&self, task: SubagentTask) -> SubagentOutcome {
        if task.depth >= self.config.max_depth {
            debug!(depth = task.depth, "Rejecting spawn at depth limit");
            return SubagentOutcome::rejected(format!(
                "delegation depth limit reached: depth {} with a configured maximum of {}",
                task.depth, self.config.max_depth
            ));
        }

        let (id, description, mut cancel_rx) = {
            let mut active = self.active.write().await;
            if active.len() >= self.config.max_concurrent {
                debug!(active = active.len(), "Rejecting spawn at concurrency cap");
                return SubagentOutcome::rejected(format!(
                    "concurrent subagent cap reached: {} active with a configured maximum of {}",
                    active.len(),
                    self.config.max_concurrent
                ));
            }

            let id = uuid::Uuid::new_v4().to_string();
            let description = truncate_description(&task.prompt);
            let (cancel_tx, cancel_rx) = oneshot::channel();
            active.insert(
                id.clone(),
                ActiveSubagent {
                    handle: SubagentHandle {
                        id: id.clone(),
                        description: description.clone(),
                        started_at: chrono::Utc::now(),
                        status: SubagentStatus::Running,
                    },
                    cancel_tx: Some(cancel_tx),
                },
            );
            (id, description, cancel_rx)
        };

        self.events.emit(&OrchestratorEvent::SubagentStarted {
            id: id.clone(),
            description,
        });
        info!(subagent = %id, depth = task.depth, "Subagent started");

        let timeout = task.timeout.unwrap_or(self.config.default_timeout);
        let child: Arc<dyn crate::ports::AgentRunner> = Arc::from(self.factory.create(task.depth));

        let mut ctx = task.context.unwrap_or_default();
        if let Some(tools) = task.tools {
            ctx.tools = tools;
        }
        let prompt = task.prompt;
        let runner = Arc::clone(&child);
        let mut run = tokio::spawn(async move { runner.run(&prompt, ctx).await });

        let settled = tokio::select! {
            joined = &mut run => match joined {
                Ok(result) => Settled::Finished(result),
                Err(_) => Settled::Panicked,
            },
            _ = tokio::time::sleep(timeout) => Settled::TimedOut,
            _ = &mut cancel_rx => Settled::Cancelled,
        };

        let outcome = match settled {
            Settled::Finished(Ok(result)) => {
                self.set_status(&id, SubagentStatus::Completed).await;
                self.events.emit(&OrchestratorEvent::SubagentCompleted {
                    id: id.clone(),
                    steps_completed: result.steps_completed,
                });
                info!(subagent = %id, steps = result.steps_completed, "Subagent completed");
                SubagentOutcome::completed(&id, result.text, result.steps_completed)
            }
            Settled::Finished(Err(err)) => {
                self.fail(&id, SubagentStatus::Failed, err.to_string()).await
            }
            Settled::Panicked => {
                self.fail(&id, SubagentStatus::Failed, "subagent task panicked".to_string())
                    .await
            }
            Settled::TimedOut => {
                self.fail(
                    &id,
                    SubagentStatus::Cancelled,
                    format!("subagent timed out after {:.1}s", timeout.as_secs_f64()),
                )
                .await
            }
            Settled::Cancelled => {
                self.fail(&id, SubagentStatus::Cancelled, "subagent cancelled".to_string())
                    .await
            }
        };

        if std::panic::catch_unwind(AssertUnwindSafe(|| child.dispose())).is_err() {
            warn!(subagent = %id, "Child disposal panicked");
        }
        self.active.write().await.remove(&id);

        outcome
    }

    /// Snapshot of the currently active handles.
    pub async fn active_subagents(&self) -> Vec<SubagentHandle> {
        self.active
            .read()
            .await
            .values()
            .map(|entry| entry.handle.clone())
            .collect()
    }

    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Trigger the cancellation path for a still-active handle. No-op for
    /// unknown or already-finished ids.
    pub async fn cancel(&self, id: &str) {
        let mut active = self.active.write().await;
        if let Some(entry) = active.get_mut(id)
            && let Some(tx) = entry.cancel_tx.take()
        {
            debug!(subagent = %id, "Cancelling subagent");
            let _ = tx.send(());
        }
    }

    async fn set_status(&self, id: &str, status: SubagentStatus) {
        let mut active = self.active.write().await;
        if let Some(entry) = active.get_mut(id) {
            entry.handle.status = status;
        }
    }

    async fn fail(&self, id: &str, status: SubagentStatus, error: String) -> SubagentOutcome {
        self.set_status(id, status).await;
        self.events.emit(&OrchestratorEvent::SubagentFailed {
            id: id.to_string(),
            error: error.clone(),
        });
        warn!(subagent = %id, %error, "Subagent did not complete");
        SubagentOutcome::failed(id, error)
    }
}
