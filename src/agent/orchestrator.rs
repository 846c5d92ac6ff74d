//! Orchestrator wiring: construction, event subscription, disposal.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::calls::CallClassifier;
use super::config::OrchestratorConfig;
use super::events::{EventBus, ListenerHandle, OrchestratorEvent, RunResult};
use crate::approval::{ApprovalGate, RuleTierResolver, TierResolver};
use crate::budget::ContextBudgeter;
use crate::ports::{
    AgentRunner, ApprovalHandler, ChatSession, PageRescanner, PlanTracker, ToolExecutor,
};
use crate::subagents::SubagentManager;
use crate::types::RunContext;

/// The tool-use loop: drives a multi-turn conversation with the chat service,
/// executes requested tools through the approval gate, and delegates
/// sub-goals to the subagent manager.
pub struct Orchestrator {
    pub(super) chat: Mutex<Option<Arc<dyn ChatSession>>>,
    pub(super) gate: ApprovalGate,
    pub(super) rescanner: Option<Arc<dyn PageRescanner>>,
    pub(super) planner: Option<Arc<dyn PlanTracker>>,
    pub(super) subagents: Option<Arc<SubagentManager>>,
    pub(super) budgeter: Arc<ContextBudgeter>,
    pub(super) classifier: CallClassifier,
    pub(super) config: OrchestratorConfig,
    pub(super) depth: usize,
    pub(super) events: EventBus,
    /// Serializes runs: each run owns its own conversation state and the
    /// budgeter is per-run state.
    pub(super) run_guard: tokio::sync::Mutex<()>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Subscribe to orchestrator events. Dropping the returned handle leaves
    /// the subscription active.
    pub fn on_event<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&OrchestratorEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Release the chat-service handle and clear all event subscribers.
    ///
    /// Idempotent; callable whether or not a run is in flight. An in-flight
    /// run keeps operating on its own clone of the chat handle.
    pub fn dispose(&self) {
        self.chat.lock().expect("chat handle poisoned").take();
        self.events.clear();
    }

    pub fn set_auto_approve(&self, enabled: bool) {
        self.gate.set_auto_approve(enabled);
    }

    pub fn is_auto_approve(&self) -> bool {
        self.gate.is_auto_approve()
    }

    pub fn budgeter(&self) -> &Arc<ContextBudgeter> {
        &self.budgeter
    }

    pub fn subagent_manager(&self) -> Option<&Arc<SubagentManager>> {
        self.subagents.as_ref()
    }

    pub(super) fn chat_handle(&self) -> crate::Result<Arc<dyn ChatSession>> {
        self.chat
            .lock()
            .expect("chat handle poisoned")
            .clone()
            .ok_or(crate::Error::Disposed)
    }

    pub(super) fn emit(&self, event: &OrchestratorEvent) {
        self.events.emit(event);
    }
}

#[async_trait]
impl AgentRunner for Orchestrator {
    async fn run(&self, goal: &str, ctx: RunContext) -> crate::Result<RunResult> {
        Orchestrator::run(self, goal, ctx).await
    }

    fn dispose(&self) {
        Orchestrator::dispose(self);
    }
}

/// Builder for [`Orchestrator`]. A chat session and a tool executor are
/// required; every other collaborator is optional.
#[derive(Default)]
pub struct OrchestratorBuilder {
    chat: Option<Arc<dyn ChatSession>>,
    executor: Option<Arc<dyn ToolExecutor>>,
    resolver: Option<Arc<dyn TierResolver>>,
    approval_handler: Option<Arc<dyn ApprovalHandler>>,
    approval_threshold: Option<u8>,
    auto_approve: bool,
    rescanner: Option<Arc<dyn PageRescanner>>,
    planner: Option<Arc<dyn PlanTracker>>,
    subagents: Option<SubagentManager>,
    budgeter: Option<Arc<ContextBudgeter>>,
    config: Option<OrchestratorConfig>,
    depth: usize,
}

impl OrchestratorBuilder {
    pub fn chat(mut self, chat: Arc<dyn ChatSession>) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn tier_resolver(mut self, resolver: Arc<dyn TierResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn approval_handler(mut self, handler: Arc<dyn ApprovalHandler>) -> Self {
        self.approval_handler = Some(handler);
        self
    }

    pub fn approval_threshold(mut self, threshold: u8) -> Self {
        self.approval_threshold = Some(threshold);
        self
    }

    /// Unsafe auto-approve mode: every tier executes without asking.
    pub fn auto_approve(mut self, enabled: bool) -> Self {
        self.auto_approve = enabled;
        self
    }

    pub fn rescanner(mut self, rescanner: Arc<dyn PageRescanner>) -> Self {
        self.rescanner = Some(rescanner);
        self
    }

    pub fn planner(mut self, planner: Arc<dyn PlanTracker>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Wire a subagent manager. It shares this orchestrator's event bus.
    pub fn subagent_manager(mut self, manager: SubagentManager) -> Self {
        self.subagents = Some(manager);
        self
    }

    pub fn budgeter(mut self, budgeter: Arc<ContextBudgeter>) -> Self {
        self.budgeter = Some(budgeter);
        self
    }

    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Recursion depth of this instance; a parent passes `depth + 1` when
    /// delegating.
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn build(self) -> crate::Result<Orchestrator> {
        let chat = self
            .chat
            .ok_or_else(|| crate::Error::Config("a chat session is required".into()))?;
        let executor = self
            .executor
            .ok_or_else(|| crate::Error::Config("a tool executor is required".into()))?;

        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(RuleTierResolver::default()));
        let mut gate = ApprovalGate::new(executor, resolver);
        if let Some(handler) = self.approval_handler {
            gate = gate.with_handler(handler);
        }
        if let Some(threshold) = self.approval_threshold {
            gate = gate.with_threshold(threshold);
        }
        gate.set_auto_approve(self.auto_approve);

        let events = EventBus::new();
        let subagents = self
            .subagents
            .map(|manager| Arc::new(manager.with_events(events.clone())));

        let config = self.config.unwrap_or_default();
        let classifier = CallClassifier::new(config.navigation_tools.iter().cloned());

        Ok(Orchestrator {
            chat: Mutex::new(Some(chat)),
            gate,
            rescanner: self.rescanner,
            planner: self.planner,
            subagents,
            budgeter: self.budgeter.unwrap_or_default(),
            classifier,
            config,
            depth: self.depth,
            events,
            run_guard: tokio::sync::Mutex::new(()),
        })
    }
}
