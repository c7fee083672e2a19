//! Budget Gate Integration Tests
//!
//! The budget exemption rule through the full pipeline: passes made of
//! static analyzers or the designated free local agent always run, any
//! other paid-inference agent gates the pass when the budget is gone.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use review_cascade::models::{AbortKind, PassConfig, ReviewConfig};
use review_cascade::run_review;
use review_cascade::services::agents::AgentRegistry;
use review_cascade::services::budget::BudgetTracker;
use review_cascade::ExecutionOrchestrator;
use review_cascade_core::{
    AgentContext, AgentMetrics, AgentResult, ChangeStatus, DiffFile, Finding, ReviewAgent,
    Severity, FREE_LOCAL_AGENT_ID,
};

// ============================================================================
// Helper Functions
// ============================================================================

struct InferenceAgent {
    id: String,
    paid: bool,
    runs: Arc<AtomicUsize>,
}

impl InferenceAgent {
    fn new(id: &str, paid: bool) -> (Arc<Self>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                id: id.to_string(),
                paid,
                runs: Arc::clone(&runs),
            }),
            runs,
        )
    }
}

#[async_trait]
impl ReviewAgent for InferenceAgent {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.id
    }
    fn uses_paid_inference(&self) -> bool {
        self.paid
    }
    async fn run(&self, _ctx: &AgentContext) -> AgentResult {
        self.runs.fetch_add(1, Ordering::SeqCst);
        AgentResult::success(
            &self.id,
            vec![Finding::new(Severity::Info, "a.rs", format!("{} ran", self.id), &self.id)],
            AgentMetrics::with_duration(1),
        )
    }
}

fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn ctx() -> AgentContext {
    let file = DiffFile {
        path: "a.rs".to_string(),
        previous_path: None,
        status: ChangeStatus::Modified,
        hunks: vec![],
        patch: None,
    };
    AgentContext::new(vec![file], "cfg", frozen_now())
}

fn exhausted_orchestrator(
    agents: Vec<Arc<dyn ReviewAgent>>,
    pass_agents: Vec<&str>,
    required: bool,
) -> ExecutionOrchestrator {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry.register(agent);
    }

    let mut config = ReviewConfig::default();
    config.passes = vec![PassConfig {
        name: "inference".to_string(),
        agents: pass_agents.into_iter().map(String::from).collect(),
        enabled: true,
        required,
    }];

    let budget = BudgetTracker::unlimited();
    budget.mark_exhausted("monthly ceiling reached");

    ExecutionOrchestrator::new(Arc::new(config), Arc::new(registry), Arc::new(budget))
}

// ============================================================================
// Exemption Tests
// ============================================================================

#[tokio::test]
async fn test_free_local_agent_runs_on_exhausted_budget() {
    let (local, runs) = InferenceAgent::new(FREE_LOCAL_AGENT_ID, true);
    let orch = exhausted_orchestrator(vec![local], vec![FREE_LOCAL_AGENT_ID], false);

    let config = ReviewConfig::default();
    let report = run_review(&orch, &config, &ctx()).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(report.complete_findings.len(), 1);
    assert!(report.skipped_agents.is_empty());
}

#[tokio::test]
async fn test_static_only_pass_runs_on_exhausted_budget() {
    let (scan, runs) = InferenceAgent::new("pattern-scan", false);
    let orch = exhausted_orchestrator(vec![scan], vec!["pattern-scan"], false);

    let config = ReviewConfig::default();
    let report = run_review(&orch, &config, &ctx()).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(report.skipped_agents.is_empty());
}

#[tokio::test]
async fn test_paid_optional_pass_is_skipped_with_reason() {
    let (paid, runs) = InferenceAgent::new("llm-review", true);
    let orch = exhausted_orchestrator(vec![paid], vec!["llm-review"], false);

    let config = ReviewConfig::default();
    let report = run_review(&orch, &config, &ctx()).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(report.skipped_agents.len(), 1);
    assert_eq!(report.skipped_agents[0].reason, "Budget limit exceeded");
    assert!(report.verdict.passed);
}

#[tokio::test]
async fn test_paid_required_pass_aborts_the_run() {
    let (paid, runs) = InferenceAgent::new("llm-review", true);
    let orch = exhausted_orchestrator(vec![paid], vec!["llm-review"], true);

    let config = ReviewConfig::default();
    let abort = run_review(&orch, &config, &ctx()).await.unwrap_err();

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(abort.kind, AbortKind::Budget);
    assert_eq!(abort.message, "Budget limit exceeded");
}

#[tokio::test]
async fn test_one_paid_agent_gates_a_mixed_pass() {
    // The free local agent cannot shield a sibling paid agent; the whole
    // pass is skipped.
    let (local, local_runs) = InferenceAgent::new(FREE_LOCAL_AGENT_ID, true);
    let (paid, paid_runs) = InferenceAgent::new("llm-review", true);
    let orch = exhausted_orchestrator(
        vec![local, paid],
        vec![FREE_LOCAL_AGENT_ID, "llm-review"],
        false,
    );

    let config = ReviewConfig::default();
    let report = run_review(&orch, &config, &ctx()).await.unwrap();

    assert_eq!(local_runs.load(Ordering::SeqCst), 0);
    assert_eq!(paid_runs.load(Ordering::SeqCst), 0);
    assert_eq!(report.skipped_agents.len(), 2);
}
