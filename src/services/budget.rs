//! Budget Tracking & Gating
//!
//! Pure budget predicates consumed by the execution orchestrator. A pass
//! is gated only when at least one of its agents uses a paid inference
//! service and is not the designated free local agent; passes made of
//! static analyzers or the free local agent alone always run.

use std::sync::Arc;
use std::sync::Mutex;

use review_cascade_core::{AgentMetrics, ReviewAgent, FREE_LOCAL_AGENT_ID};

use crate::models::config::LimitsConfig;

/// Whether a set of agents is subject to budget gating at all.
pub fn needs_budget_gate(agents: &[Arc<dyn ReviewAgent>]) -> bool {
    agents
        .iter()
        .any(|a| a.uses_paid_inference() && a.id() != FREE_LOCAL_AGENT_ID)
}

/// Accumulates spend across one run and answers the exhaustion question.
///
/// Ceilings of zero (or below) disable that ceiling. Thread-safe so the
/// orchestrator can record costs from its collection loop while tests poke
/// at it freely.
pub struct BudgetTracker {
    max_usd_per_run: f64,
    monthly_budget_usd: f64,
    max_tokens_per_run: u32,
    /// USD already spent this month before the run started
    monthly_spent_usd: f64,
    state: Mutex<SpendState>,
}

#[derive(Default)]
struct SpendState {
    run_usd: f64,
    run_tokens: u64,
    /// Set when something outside cost arithmetic (e.g. an oversized diff)
    /// declares the budget exhausted for the rest of the run
    forced_reason: Option<String>,
}

impl BudgetTracker {
    /// Build a tracker from the configured limits and the month-to-date
    /// spend reported by the host.
    pub fn new(limits: &LimitsConfig, monthly_spent_usd: f64) -> Self {
        Self {
            max_usd_per_run: limits.max_usd_per_pr,
            monthly_budget_usd: limits.monthly_budget_usd,
            max_tokens_per_run: limits.max_tokens_per_pr,
            monthly_spent_usd,
            state: Mutex::new(SpendState::default()),
        }
    }

    /// A tracker with every ceiling disabled.
    pub fn unlimited() -> Self {
        Self {
            max_usd_per_run: 0.0,
            monthly_budget_usd: 0.0,
            max_tokens_per_run: 0,
            monthly_spent_usd: 0.0,
            state: Mutex::new(SpendState::default()),
        }
    }

    /// Record the spend of one settled agent run.
    pub fn record(&self, metrics: &AgentMetrics) {
        let mut state = self.state.lock().expect("budget state poisoned");
        state.run_usd += metrics.cost_usd;
        state.run_tokens += u64::from(metrics.input_tokens) + u64::from(metrics.output_tokens);
    }

    /// Declare the budget exhausted regardless of spend, e.g. when the diff
    /// exceeds the configured size limits.
    pub fn mark_exhausted(&self, reason: impl Into<String>) {
        let mut state = self.state.lock().expect("budget state poisoned");
        state.forced_reason = Some(reason.into());
    }

    /// Whether gated passes must stop running.
    pub fn is_exhausted(&self) -> bool {
        let state = self.state.lock().expect("budget state poisoned");
        if state.forced_reason.is_some() {
            return true;
        }
        if self.max_usd_per_run > 0.0 && state.run_usd >= self.max_usd_per_run {
            return true;
        }
        if self.monthly_budget_usd > 0.0
            && self.monthly_spent_usd + state.run_usd >= self.monthly_budget_usd
        {
            return true;
        }
        if self.max_tokens_per_run > 0 && state.run_tokens >= u64::from(self.max_tokens_per_run) {
            return true;
        }
        false
    }

    /// USD spent by this run so far.
    pub fn run_spent_usd(&self) -> f64 {
        self.state.lock().expect("budget state poisoned").run_usd
    }
}
