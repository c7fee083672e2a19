//! Execution Orchestrator
//!
//! Drives the configured passes in declared order and, within each pass,
//! runs the listed agents as concurrent tasks with a join barrier before
//! anything downstream sees their output.
//!
//! Per agent, in order: allowlist check, branch-policy check, cache
//! lookup, budget gate, execution, outcome classification. A structurally
//! valid cache hit costs nothing and is served even when the budget is
//! exhausted; the gate applies only to the cache-missed agents that would
//! actually run. A required pass's failure is fatal for the whole run; an
//! optional pass's failure is recorded and skipped. Every skipped agent
//! and its reason is accumulated for the final summary, even when the run
//! succeeds.

pub mod outcome;

use std::sync::Arc;

use review_cascade_core::{AgentContext, AgentResult, ReviewAgent};

use crate::models::config::{PassConfig, ReviewConfig};
use crate::models::execution::{AbortKind, ExecuteResult, RunAbort, SkippedAgent};
use crate::services::agents::AgentRegistry;
use crate::services::budget::{needs_budget_gate, BudgetTracker};
use crate::services::cache::{CacheKey, ResultCache};
use crate::services::execution::outcome::{classify, PassDirective, SettledRun};
use crate::services::policy::BranchPolicy;

/// Orchestrates one review run across all configured passes.
pub struct ExecutionOrchestrator {
    config: Arc<ReviewConfig>,
    registry: Arc<AgentRegistry>,
    budget: Arc<BudgetTracker>,
    policy: BranchPolicy,
    cache: Option<Arc<ResultCache>>,
}

impl ExecutionOrchestrator {
    pub fn new(
        config: Arc<ReviewConfig>,
        registry: Arc<AgentRegistry>,
        budget: Arc<BudgetTracker>,
    ) -> Self {
        Self {
            config,
            registry,
            budget,
            policy: BranchPolicy::default_policy(),
            cache: None,
        }
    }

    /// Use a result cache for lookups and stores.
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the branch policy.
    pub fn with_policy(mut self, policy: BranchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every enabled pass in declared order.
    ///
    /// Passes are never reordered or overlapped: a later pass's budget and
    /// cache decisions may depend on an earlier pass's spend and writes.
    pub async fn execute(&self, ctx: &AgentContext) -> Result<ExecuteResult, RunAbort> {
        let mut out = ExecuteResult::default();

        for pass in self.config.enabled_passes() {
            tracing::info!(pass = %pass.name, required = pass.required, "starting pass");
            self.execute_pass(pass, ctx, &mut out).await?;
        }

        Ok(out)
    }

    async fn execute_pass(
        &self,
        pass: &PassConfig,
        ctx: &AgentContext,
        out: &mut ExecuteResult,
    ) -> Result<(), RunAbort> {
        // Resolve ids against the allowlist and apply the branch policy.
        let mut runnable: Vec<Arc<dyn ReviewAgent>> = Vec::new();
        for id in &pass.agents {
            let Some(agent) = self.registry.get(id) else {
                // Security rejection: never executed, never given the
                // context. Non-fatal regardless of the pass policy.
                tracing::warn!(pass = %pass.name, agent = %id, "unknown agent id rejected");
                out.skipped_agents.push(SkippedAgent::new(
                    id,
                    id,
                    format!("Agent '{}' is not in the configured allowlist", id),
                ));
                continue;
            };

            if self.policy.blocks(ctx.trigger, &ctx.branch, agent.id()) {
                out.skipped_agents.push(SkippedAgent::new(
                    agent.id(),
                    agent.name(),
                    format!("Not permitted on direct pushes to '{}'", ctx.branch),
                ));
                continue;
            }

            if !agent.supports(ctx) {
                out.skipped_agents.push(SkippedAgent::new(
                    agent.id(),
                    agent.name(),
                    "No supported files in this change",
                ));
                continue;
            }

            runnable.push(agent);
        }

        if runnable.is_empty() {
            return Ok(());
        }

        // Cache phase: a structurally valid hit replaces execution. Hits
        // are resolved before the budget gate because a cached result
        // incurs no spend.
        let mut settled: Vec<(Arc<dyn ReviewAgent>, SettledRun, bool)> = Vec::new();
        let mut to_run: Vec<Arc<dyn ReviewAgent>> = Vec::new();
        for agent in runnable {
            match self.cache_lookup(ctx, agent.id()) {
                Some(cached) => {
                    tracing::info!(pass = %pass.name, agent = %agent.id(), "cache hit");
                    settled.push((agent, SettledRun::Settled(cached), true));
                }
                None => to_run.push(agent),
            }
        }

        // Budget gate over the agents that would actually run: only paid
        // agents other than the designated free local agent can block a
        // pass.
        if self.budget.is_exhausted() && needs_budget_gate(&to_run) {
            if pass.required {
                let blocking_agent = to_run
                    .iter()
                    .find(|a| a.uses_paid_inference())
                    .map(|a| a.id().to_string())
                    .unwrap_or_default();
                tracing::error!(pass = %pass.name, "budget exhausted on a required pass");
                return Err(RunAbort {
                    pass: pass.name.clone(),
                    agent_id: blocking_agent,
                    kind: AbortKind::Budget,
                    message: "Budget limit exceeded".to_string(),
                });
            }
            for agent in to_run.drain(..) {
                tracing::warn!(pass = %pass.name, agent = %agent.id(), "skipped: budget limit exceeded");
                out.skipped_agents.push(SkippedAgent::new(
                    agent.id(),
                    agent.name(),
                    "Budget limit exceeded",
                ));
            }
        }

        // Agents within one pass are independent; run them concurrently.
        // The join below is a barrier: every outcome is collected and
        // classified before any downstream stage runs, and no per-agent
        // failure propagates past it.
        let handles: Vec<_> = to_run
            .iter()
            .map(|agent| {
                let agent = Arc::clone(agent);
                let task_ctx = ctx.clone();
                tokio::spawn(async move { agent.run(&task_ctx).await })
            })
            .collect();
        let joined = futures_util::future::join_all(handles).await;

        for (agent, join_result) in to_run.into_iter().zip(joined) {
            let run = match join_result {
                Ok(result) => SettledRun::Settled(result),
                Err(e) if e.is_panic() => SettledRun::Crashed(panic_message(e)),
                Err(e) => SettledRun::Crashed(format!("task aborted: {e}")),
            };
            settled.push((agent, run, false));
        }

        // Classification and the single skip-or-abort decision point.
        for (agent, run, from_cache) in settled {
            let effects = classify(&pass.name, pass.required, agent.id(), agent.name(), run);

            if !from_cache {
                // A cached result was paid for by an earlier run; only
                // fresh spend counts toward this run's ceilings.
                self.budget.record(effects.result.metrics());
                if effects.result.is_success() {
                    self.cache_store(ctx, agent.id(), &effects.result);
                }
            }

            out.complete_findings.extend(effects.complete);
            out.partial_findings.extend(effects.partial);
            if let Some(skipped) = effects.skipped {
                out.skipped_agents.push(skipped);
            }
            out.all_results.push(effects.result);

            if let PassDirective::Abort(abort) = effects.directive {
                return Err(abort);
            }
        }

        Ok(())
    }

    fn cache_key(&self, ctx: &AgentContext, agent_id: &str) -> Option<CacheKey> {
        if !self.config.cache.enabled {
            return None;
        }
        Some(CacheKey {
            pr_number: ctx.pr_number?,
            head_commit: ctx.head_commit.clone()?,
            config_hash: ctx.config_hash.clone(),
            agent_id: agent_id.to_string(),
        })
    }

    fn cache_lookup(&self, ctx: &AgentContext, agent_id: &str) -> Option<AgentResult> {
        let cache = self.cache.as_ref()?;
        let key = self.cache_key(ctx, agent_id)?;
        cache.get(&key, ctx.now)
    }

    fn cache_store(&self, ctx: &AgentContext, agent_id: &str, result: &AgentResult) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let Some(key) = self.cache_key(ctx, agent_id) else {
            return;
        };
        if let Err(e) = cache.set(&key, result, ctx.now) {
            // A broken cache never breaks the run.
            tracing::warn!(agent = %agent_id, "failed to store cache entry: {e}");
        }
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_string()
    }
}
