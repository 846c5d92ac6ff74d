//! The run loop: turn-taking, batch execution, navigation interrupts, and
//! limit handling.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::builtin;
use super::calls::{CallKind, PlanAction};
use super::events::{OrchestratorEvent, RunResult};
use super::orchestrator::Orchestrator;
use crate::budget::estimate_tokens;
use crate::subagents::SubagentTask;
use crate::types::{
    CandidateResponse, ChatConfig, ChatRequest, MentionContext, PageContext, RunContext,
    ToolCallRecord, ToolDefinition, ToolOutcome, ToolUse,
};

/// Working state for one run: the loop's own copies of the tool set and page
/// context, replaced on navigation re-scan.
struct RunState {
    tools: Vec<ToolDefinition>,
    page: PageContext,
    records: Vec<ToolCallRecord>,
    steps_completed: usize,
}

impl Orchestrator {
    /// Drive the conversation until the model produces a final answer or a
    /// resource limit is hit.
    ///
    /// Limit exhaustion is a structured result, never an error; only
    /// chat-service failures propagate.
    #[instrument(skip(self, goal, ctx), fields(tab = %ctx.target.tab_id, depth = self.depth))]
    pub async fn run(&self, goal: &str, ctx: RunContext) -> crate::Result<RunResult> {
        let chat = self.chat_handle()?;
        let _guard = self.run_guard.lock().await;
        self.budgeter.reset();

        let mut state = RunState {
            tools: ctx.tools.clone(),
            page: ctx.page.clone(),
            records: Vec::new(),
            steps_completed: 0,
        };
        let mut iterations = 0usize;
        let start = Instant::now();

        info!(
            goal_len = goal.len(),
            tools = state.tools.len(),
            "Starting run"
        );

        let message = initial_message(goal, &state.page, &ctx.mentions);
        self.budgeter.record_input(estimate_tokens(&message));
        let request = ChatRequest::new(message, self.chat_config(&state.tools, &ctx.mentions))
            .with_history(ctx.history.clone());
        let mut response = chat.send(request).await?;

        loop {
            if let Some(text) = &response.text {
                self.budgeter.record_output(estimate_tokens(text));
            }

            if let Some(timeout) = self.config.timeout
                && start.elapsed() >= timeout
            {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                self.emit(&OrchestratorEvent::Timeout { elapsed_ms });
                warn!(elapsed_ms, "Run timed out");
                return Ok(self.limit_result(
                    format!(
                        "Run timed out after {:.1}s before reaching a final answer",
                        timeout.as_secs_f64()
                    ),
                    &response,
                    state,
                ));
            }

            if !response.wants_tool_use() {
                state.steps_completed += 1;
                let text = response.text.clone().unwrap_or_default();
                self.emit(&OrchestratorEvent::AiResponse { text: text.clone() });
                info!(
                    steps = state.steps_completed,
                    tool_calls = state.records.len(),
                    "Run completed"
                );
                return Ok(RunResult {
                    text,
                    reasoning: response.reasoning.clone(),
                    tool_calls: state.records,
                    tools: state.tools,
                    page: state.page,
                    steps_completed: state.steps_completed,
                });
            }

            if self.config.max_iterations > 0 && iterations >= self.config.max_iterations {
                let limit = self.config.max_iterations;
                self.emit(&OrchestratorEvent::MaxIterations { limit });
                warn!(limit, "Max iterations reached");
                return Ok(self.limit_result(
                    format!("Reached the maximum of {} iterations without a final answer", limit),
                    &response,
                    state,
                ));
            }

            iterations += 1;
            state.steps_completed += 1;

            let batch = std::mem::take(&mut response.tool_calls);
            let responses = self.process_batch(goal, &ctx, &mut state, &batch).await;

            if let Some(planner) = &self.planner {
                planner.advance_step().await;
            }
            if let Some(max_turns) = self.config.trim_history_turns {
                chat.trim_history(max_turns).await;
            }

            let message = serde_json::to_string(&responses)?;
            self.budgeter.record_input(estimate_tokens(&message));
            debug!(iteration = iterations, batch = batch.len(), "Sending tool responses");
            let request = ChatRequest::new(message, self.chat_config(&state.tools, &[]));
            response = chat.send(request).await?;
        }
    }

    /// Execute one batch in request order, returning the synthesized tool
    /// responses for the next turn.
    ///
    /// A successful navigation call aborts the remainder of the batch: the
    /// model's assumptions about later calls no longer hold, so each skipped
    /// call gets a synthesized response instead of being executed.
    async fn process_batch(
        &self,
        goal: &str,
        ctx: &RunContext,
        state: &mut RunState,
        batch: &[ToolUse],
    ) -> Vec<Value> {
        let mut responses = Vec::with_capacity(batch.len());
        let mut executed = 0usize;

        for call in batch {
            executed += 1;
            let kind = self.classifier.classify(&call.name);

            match kind {
                CallKind::Plan(action) if self.planner.is_some() => {
                    responses.push(self.handle_plan_call(call, action).await);
                    continue;
                }
                CallKind::Delegate if self.subagents.is_some() => {
                    responses.push(self.handle_delegate_call(goal, ctx, state, call).await);
                    continue;
                }
                _ => {}
            }

            let (outcome, response) = self.execute_gated(ctx, state, call).await;
            responses.push(response);

            if outcome.success && kind == CallKind::Navigation {
                self.emit(&OrchestratorEvent::Navigation {
                    tool: call.name.clone(),
                });
                self.rescan_after_navigation(ctx, state).await;
                break;
            }
        }

        for skipped in &batch[executed..] {
            debug!(tool = %skipped.name, "Skipping call after navigation");
            responses.push(json!({
                "id": skipped.id,
                "name": skipped.name,
                "skipped": "page navigated",
            }));
        }

        responses
    }

    async fn handle_plan_call(&self, call: &ToolUse, action: PlanAction) -> Value {
        let planner = self.planner.as_ref().expect("plan call without planner");
        let ack = match action {
            PlanAction::Create => {
                planner.create_plan(&call.input).await;
                "plan created"
            }
            PlanAction::Update => {
                planner.update_plan(&call.input).await;
                "plan updated"
            }
            PlanAction::MarkStepDone => {
                planner.mark_step_done(&call.input).await;
                "step marked done"
            }
            PlanAction::MarkStepFailed => {
                planner.mark_step_failed(&call.input).await;
                "step marked failed"
            }
        };
        debug!(tool = %call.name, ack, "Handled plan call locally");
        json!({
            "id": call.id,
            "name": call.name,
            "result": {"status": ack},
        })
    }

    /// Route a delegation call to the subagent manager. Not appended to the
    /// tool-call records; delegation is accounted through subagent events.
    async fn handle_delegate_call(
        &self,
        goal: &str,
        ctx: &RunContext,
        state: &RunState,
        call: &ToolUse,
    ) -> Value {
        let manager = self.subagents.as_ref().expect("delegate call without manager");
        let prompt = call
            .input
            .get("prompt")
            .and_then(Value::as_str)
            .unwrap_or(goal)
            .to_string();

        let child_ctx = RunContext {
            target: ctx.target.clone(),
            tools: state.tools.clone(),
            page: state.page.clone(),
            history: Vec::new(),
            mentions: Vec::new(),
        };
        let mut task = SubagentTask::new(prompt)
            .with_depth(self.depth + 1)
            .with_context(child_ctx);
        if let Some(secs) = call.input.get("timeout_secs").and_then(Value::as_f64) {
            task = task.with_timeout(Duration::from_secs_f64(secs));
        }

        let outcome = manager.spawn(task).await;
        if outcome.success {
            json!({
                "id": call.id,
                "name": call.name,
                "result": outcome.text.unwrap_or_default(),
            })
        } else {
            json!({
                "id": call.id,
                "name": call.name,
                "error": outcome.error.unwrap_or_else(|| "subagent failed".into()),
            })
        }
    }

    /// Execute one call through the approval gate, record it, and synthesize
    /// its tool response. Per-call failures never abort the batch.
    async fn execute_gated(
        &self,
        ctx: &RunContext,
        state: &mut RunState,
        call: &ToolUse,
    ) -> (ToolOutcome, Value) {
        self.emit(&OrchestratorEvent::ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        });

        let execution = self.gate.execute(&call.name, call.input.clone(), &ctx.target);
        let outcome = match AssertUnwindSafe(execution).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => ToolOutcome::err(err.to_string()),
            Err(_) => ToolOutcome::err(format!("tool '{}' panicked during execution", call.name)),
        };

        state
            .records
            .push(ToolCallRecord::from_outcome(call, &outcome));

        let response = if outcome.success {
            self.emit(&OrchestratorEvent::ToolResult {
                id: call.id.clone(),
                name: call.name.clone(),
                data: outcome.data.clone(),
            });
            let payload = self
                .budgeter
                .offload(&call.name, outcome.data.clone().unwrap_or(Value::Null));
            json!({"id": call.id, "name": call.name, "result": payload})
        } else {
            let error = outcome
                .error
                .clone()
                .unwrap_or_else(|| "tool execution failed".into());
            self.emit(&OrchestratorEvent::ToolError {
                id: call.id.clone(),
                name: call.name.clone(),
                error: error.clone(),
            });
            debug!(tool = %call.name, %error, "Tool call failed");
            json!({"id": call.id, "name": call.name, "error": error})
        };

        (outcome, response)
    }

    /// Refresh the working page context and tool set after a navigation side
    /// effect. A failed re-scan keeps the last-known tool set; it never fails
    /// the run.
    async fn rescan_after_navigation(&self, ctx: &RunContext, state: &mut RunState) {
        let Some(rescanner) = &self.rescanner else {
            return;
        };
        match rescanner.rescan(&ctx.target, &state.tools).await {
            Ok(snapshot) => {
                info!(
                    url = %snapshot.page.url,
                    tools = snapshot.tools.len(),
                    "Page re-scanned after navigation"
                );
                state.page = snapshot.page;
                state.tools = snapshot.tools;
            }
            Err(err) => {
                warn!(error = %err, "Navigation re-scan failed, keeping last-known tools");
            }
        }
    }

    fn limit_result(
        &self,
        text: String,
        last_response: &CandidateResponse,
        state: RunState,
    ) -> RunResult {
        RunResult {
            text,
            reasoning: last_response
                .reasoning
                .clone()
                .or_else(|| last_response.text.clone()),
            tool_calls: state.records,
            tools: state.tools,
            page: state.page,
            steps_completed: state.steps_completed,
        }
    }

    fn chat_config(&self, tools: &[ToolDefinition], mentions: &[MentionContext]) -> ChatConfig {
        let mut advertised = tools.to_vec();
        if self.planner.is_some() {
            advertised.extend(builtin::plan_tools());
        }
        if self.subagents.is_some() {
            advertised.push(builtin::delegate_tool());
        }
        for mention in mentions {
            advertised.extend(mention.tools.iter().cloned());
        }
        ChatConfig {
            system: self.config.system_prompt.clone(),
            tools: advertised,
        }
    }
}

fn initial_message(goal: &str, page: &PageContext, mentions: &[MentionContext]) -> String {
    let mut message = format!("## Goal\n{}\n", goal);

    if !page.url.is_empty() || !page.title.is_empty() {
        message.push_str(&format!("\n## Current page\n{} ({})\n", page.title, page.url));
        if let Some(summary) = &page.summary {
            message.push_str(summary);
            message.push('\n');
        }
    }

    for mention in mentions {
        message.push_str(&format!(
            "\n## Mentioned tab\n{} ({})\n",
            mention.page.title, mention.page.url
        ));
        if let Some(summary) = &mention.page.summary {
            message.push_str(summary);
            message.push('\n');
        }
    }

    message
}
