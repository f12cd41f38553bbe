// ABOUTME: The plan runner - executes ordered action steps sequentially with
// ABOUTME: dedup, retry + exponential backoff, policy gating, and sticky abort.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::abort::AbortToken;
use super::gate::{AllowAll, GateVerdict, StepGate};
use super::handler::{ActionHandler, HandlerRegistry};
use super::step::{ActionLogEntry, ActionResult, ActionStatus, ActionStep, LogStatus};
use crate::time::epoch_ms;

/// Retry tuning for one executor instance.
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// Maximum handler invocations per step. Minimum 1.
    pub max_attempts: u32,

    /// First backoff interval; doubles after each failed attempt.
    pub base_backoff_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 250,
        }
    }
}

/// Sequential, single-process plan runner.
///
/// Steps execute strictly in the caller-supplied order, never in parallel.
/// Per-instance state - the set of ids that ever succeeded, the in-flight
/// set, and the append-only log - lives for the executor's lifetime and is
/// cleared only by [`ActionExecutor::reset`].
pub struct ActionExecutor {
    handlers: HandlerRegistry,
    gate: Arc<dyn StepGate>,
    config: ExecutorConfig,
    executed: HashSet<String>,
    executing: HashSet<String>,
    log: Vec<ActionLogEntry>,
    abort: AbortToken,
}

impl ActionExecutor {
    /// Create an executor over a handler registry with default config and an
    /// allow-everything gate.
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self::with_config(handlers, ExecutorConfig::default())
    }

    /// Create an executor with explicit retry tuning.
    pub fn with_config(handlers: HandlerRegistry, config: ExecutorConfig) -> Self {
        Self {
            handlers,
            gate: Arc::new(AllowAll),
            config,
            executed: HashSet::new(),
            executing: HashSet::new(),
            log: Vec::new(),
            abort: AbortToken::new(),
        }
    }

    /// Replace the policy gate.
    pub fn set_policy_gate(&mut self, gate: Arc<dyn StepGate>) {
        self.gate = gate;
    }

    /// A handle that can abort the current plan from another task.
    pub fn abort_handle(&self) -> AbortToken {
        self.abort.clone()
    }

    /// Raise the sticky abort flag.
    ///
    /// Cooperative: takes effect at the executor's own checkpoints (step
    /// boundaries, post-invocation), never preempts a handler mid-await.
    /// The flag stays set until the start of the next `execute_plan` call.
    pub fn abort(&self) {
        self.abort.trigger();
    }

    /// Abort, then clear the executed/executing sets and the log.
    pub fn reset(&mut self) {
        self.abort.trigger();
        self.executed.clear();
        self.executing.clear();
        self.log.clear();
    }

    /// Whether `id` ever succeeded on this instance.
    pub fn has_executed(&self, id: &str) -> bool {
        self.executed.contains(id)
    }

    /// The append-only audit log.
    pub fn log(&self) -> &[ActionLogEntry] {
        &self.log
    }

    /// Run an ordered list of steps, returning one result per step.
    ///
    /// Per step: sticky-abort sweep, dedup skip, policy gate (which may
    /// reject or rewrite), handler resolution, then up to `max_attempts`
    /// invocations with exponential backoff. One step's failure never stops
    /// the plan; only abort does.
    pub async fn execute_plan(&mut self, steps: &[ActionStep]) -> Vec<ActionResult> {
        // Sticky flag from a previous plan is cleared here, never mid-plan.
        self.abort.clear();

        let mut results = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            if self.abort.is_aborted() {
                for remaining in &steps[index..] {
                    self.push_log(remaining, LogStatus::Aborted, 0, Some("plan aborted"));
                    results.push(ActionResult {
                        id: remaining.id.clone(),
                        action: remaining.action.clone(),
                        status: ActionStatus::Aborted,
                        attempts: 0,
                        reason: Some("plan aborted".into()),
                    });
                }
                break;
            }

            results.push(self.execute_step(step).await);
        }

        results
    }

    async fn execute_step(&mut self, step: &ActionStep) -> ActionResult {
        if self.executed.contains(&step.id) {
            self.push_log(step, LogStatus::Skipped, 0, Some("step already executed"));
            return self.terminal(step, ActionStatus::Skipped, 0, Some("step already executed"));
        }
        if self.executing.contains(&step.id) {
            self.push_log(step, LogStatus::Skipped, 0, Some("step already in flight"));
            return self.terminal(step, ActionStatus::Skipped, 0, Some("step already in flight"));
        }

        // Policy gate: rejection is terminal, the handler is never invoked.
        // The gate fails closed on its own errors.
        let verdict = match self.gate.check_step(step).await {
            Ok(verdict) => verdict,
            Err(e) => GateVerdict::deny(format!("policy gate error: {e}")),
        };
        if !verdict.allowed {
            let reason = verdict.reason.as_deref().unwrap_or("rejected by policy gate");
            self.push_log(step, LogStatus::Failed, 0, Some(reason));
            return self.terminal(step, ActionStatus::Failed, 0, Some(reason));
        }
        let step = verdict.step.unwrap_or_else(|| step.clone());

        let Some(handler) = self.handlers.get(&step.action).await else {
            let reason = format!("unsupported action: {}", step.action);
            self.push_log(&step, LogStatus::Failed, 0, Some(reason.as_str()));
            return self.terminal(&step, ActionStatus::Failed, 0, Some(reason.as_str()));
        };

        self.executing.insert(step.id.clone());
        self.push_log(&step, LogStatus::Started, 0, None);

        let result = self.run_with_retry(&step, handler).await;

        self.executing.remove(&step.id);
        if result.status == ActionStatus::Success {
            self.executed.insert(step.id.clone());
        }

        result
    }

    /// Invoke the handler up to `max_attempts` times.
    ///
    /// Each failed attempt before the last logs `retry`; the last logs
    /// `failed`. Backoff between attempts is `base * 2^(attempt-1)`. The
    /// abort flag is checked right after each invocation and exits the loop
    /// early with `aborted` instead of retrying.
    async fn run_with_retry(
        &mut self,
        step: &ActionStep,
        handler: Arc<dyn ActionHandler>,
    ) -> ActionResult {
        let max_attempts = self.config.max_attempts.max(1);
        let abort = self.abort.clone();

        for attempt in 1..=max_attempts {
            match handler.execute(step, &abort).await {
                Ok(()) => {
                    self.push_log(step, LogStatus::Success, attempt, None);
                    tracing::debug!(id = %step.id, action = %step.action, attempt, "step succeeded");
                    return self.terminal(step, ActionStatus::Success, attempt, None);
                }
                Err(e) => {
                    let reason = e.to_string();

                    if abort.is_aborted() {
                        self.push_log(step, LogStatus::Aborted, attempt, Some(reason.as_str()));
                        return self.terminal(
                            step,
                            ActionStatus::Aborted,
                            attempt,
                            Some("aborted during execution"),
                        );
                    }

                    if attempt == max_attempts {
                        self.push_log(step, LogStatus::Failed, attempt, Some(reason.as_str()));
                        tracing::debug!(id = %step.id, action = %step.action, attempt, %reason, "step failed");
                        return self.terminal(step, ActionStatus::Failed, attempt, Some(reason.as_str()));
                    }

                    self.push_log(step, LogStatus::Retry, attempt, Some(reason.as_str()));
                    let backoff = self
                        .config
                        .base_backoff_ms
                        .saturating_mul(2u64.saturating_pow(attempt - 1));
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
            }
        }

        // max_attempts >= 1, so the loop always returns.
        unreachable!("retry loop exits via return")
    }

    fn terminal(
        &self,
        step: &ActionStep,
        status: ActionStatus,
        attempts: u32,
        reason: Option<&str>,
    ) -> ActionResult {
        ActionResult {
            id: step.id.clone(),
            action: step.action.clone(),
            status,
            attempts,
            reason: reason.map(str::to_string),
        }
    }

    fn push_log(&mut self, step: &ActionStep, status: LogStatus, attempts: u32, reason: Option<&str>) {
        self.log.push(ActionLogEntry {
            id: step.id.clone(),
            action: step.action.clone(),
            status,
            attempts,
            reason: reason.map(str::to_string),
            description: step.description.clone(),
            timestamp: epoch_ms(),
        });
    }
}
