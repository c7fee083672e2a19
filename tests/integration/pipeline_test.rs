//! Review Pipeline Integration Tests
//!
//! Drives the orchestrator and the reconciliation stages together through
//! the public library API, with scripted stub agents standing in for the
//! real analyzers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use review_cascade::models::{AbortKind, PassConfig, ReviewConfig};
use review_cascade::run_review;
use review_cascade::services::agents::AgentRegistry;
use review_cascade::services::budget::BudgetTracker;
use review_cascade::ExecutionOrchestrator;
use review_cascade_core::{
    AgentContext, AgentMetrics, AgentResult, ChangeStatus, DiffFile, DiffHunk, FailureStage,
    Finding, Provenance, ReviewAgent, Severity,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Agent that replays a fixed result.
struct ScriptedAgent {
    id: String,
    result: AgentResult,
}

impl ScriptedAgent {
    fn new(id: &str, result: AgentResult) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            result,
        })
    }
}

#[async_trait]
impl ReviewAgent for ScriptedAgent {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.id
    }
    fn uses_paid_inference(&self) -> bool {
        false
    }
    async fn run(&self, _ctx: &AgentContext) -> AgentResult {
        self.result.clone()
    }
}

/// Agent whose own code throws.
struct PanickingAgent;

#[async_trait]
impl ReviewAgent for PanickingAgent {
    fn id(&self) -> &str {
        "unstable"
    }
    fn name(&self) -> &str {
        "Unstable"
    }
    fn uses_paid_inference(&self) -> bool {
        false
    }
    async fn run(&self, _ctx: &AgentContext) -> AgentResult {
        panic!("slice index out of range")
    }
}

fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn diff() -> Vec<DiffFile> {
    vec![DiffFile {
        path: "src/lib.rs".to_string(),
        previous_path: None,
        status: ChangeStatus::Modified,
        hunks: vec![DiffHunk {
            old_start: 10,
            old_lines: 5,
            new_start: 10,
            new_lines: 5,
        }],
        patch: None,
    }]
}

fn finding(agent: &str, line: Option<u32>, message: &str) -> Finding {
    let mut f = Finding::new(Severity::Warning, "src/lib.rs", message, agent);
    f.line = line;
    f
}

fn config_with_pass(agents: Vec<&str>, required: bool) -> Arc<ReviewConfig> {
    let mut config = ReviewConfig::default();
    config.passes = vec![PassConfig {
        name: "review".to_string(),
        agents: agents.into_iter().map(String::from).collect(),
        enabled: true,
        required,
    }];
    Arc::new(config)
}

fn orchestrator(
    config: &Arc<ReviewConfig>,
    agents: Vec<Arc<dyn ReviewAgent>>,
) -> ExecutionOrchestrator {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry.register(agent);
    }
    ExecutionOrchestrator::new(
        Arc::clone(config),
        Arc::new(registry),
        Arc::new(BudgetTracker::unlimited()),
    )
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_pipeline_collapses_cross_agent_duplicates() {
    // Two healthy agents report the same issue at the same location; the
    // final report carries it once.
    let first = ScriptedAgent::new(
        "scan-a",
        AgentResult::success(
            "scan-a",
            vec![finding("scan-a", Some(12), "shadowed variable")],
            AgentMetrics::with_duration(5),
        ),
    );
    let second = ScriptedAgent::new(
        "scan-b",
        AgentResult::success(
            "scan-b",
            vec![
                finding("scan-b", Some(12), "shadowed variable"),
                finding("scan-b", Some(13), "unused import"),
            ],
            AgentMetrics::with_duration(5),
        ),
    );

    let config = config_with_pass(vec!["scan-a", "scan-b"], false);
    let orch = orchestrator(&config, vec![first, second]);
    let ctx = AgentContext::new(diff(), "cfg", frozen_now());

    let report = run_review(&orch, &config, &ctx).await.unwrap();

    assert_eq!(report.complete_findings.len(), 2);
    assert!(report
        .complete_findings
        .iter()
        .all(|f| f.provenance == Some(Provenance::Complete)));
    assert!(report
        .complete_findings
        .iter()
        .all(|f| f.fingerprint.is_some()));
    assert!(report.verdict.passed); // warnings stay below the default threshold
}

#[tokio::test]
async fn test_partial_findings_stay_separate_from_complete() {
    let healthy = ScriptedAgent::new(
        "solid",
        AgentResult::success(
            "solid",
            vec![finding("solid", Some(11), "confirmed issue")],
            AgentMetrics::default(),
        ),
    );
    let flaky = ScriptedAgent::new(
        "flaky",
        AgentResult::failure_with_partials(
            "flaky",
            "timed out after 120s",
            FailureStage::Execution,
            vec![finding("flaky", Some(11), "confirmed issue")],
            AgentMetrics::default(),
        ),
    );

    let config = config_with_pass(vec!["solid", "flaky"], false);
    let orch = orchestrator(&config, vec![healthy, flaky]);
    let ctx = AgentContext::new(diff(), "cfg", frozen_now());

    let report = run_review(&orch, &config, &ctx).await.unwrap();

    // The salvaged copy never conflates with the trustworthy one.
    assert_eq!(report.complete_findings.len(), 1);
    assert_eq!(report.partial_findings.len(), 1);
    assert_eq!(
        report.partial_findings[0].provenance,
        Some(Provenance::Partial)
    );
    assert_eq!(report.skipped_agents.len(), 1);
    assert_eq!(report.skipped_agents[0].reason, "timed out after 120s");
}

#[tokio::test]
async fn test_required_crash_aborts_the_run() {
    let config = config_with_pass(vec!["unstable"], true);
    let orch = orchestrator(&config, vec![Arc::new(PanickingAgent)]);
    let ctx = AgentContext::new(diff(), "cfg", frozen_now());

    let abort = run_review(&orch, &config, &ctx).await.unwrap_err();
    assert_eq!(abort.kind, AbortKind::Crashed);
    assert_eq!(abort.agent_id, "unstable");
    assert!(abort.message.contains("slice index out of range"));
    // The display string is what the binary logs before exiting non-zero.
    assert!(abort.to_string().contains("crashed"));
}

#[tokio::test]
async fn test_required_explicit_failure_reads_failed_not_crashed() {
    let gate = ScriptedAgent::new(
        "gate",
        AgentResult::failure("gate", "linter exited with code 2", FailureStage::Execution),
    );
    let config = config_with_pass(vec!["gate"], true);
    let orch = orchestrator(&config, vec![gate]);
    let ctx = AgentContext::new(diff(), "cfg", frozen_now());

    let abort = run_review(&orch, &config, &ctx).await.unwrap_err();
    assert_eq!(abort.kind, AbortKind::Failed);
    assert!(abort.to_string().contains("failed"));
    assert!(!abort.to_string().contains("crashed"));
}

#[tokio::test]
async fn test_unknown_agent_reaches_the_final_summary() {
    let healthy = ScriptedAgent::new(
        "solid",
        AgentResult::success("solid", vec![], AgentMetrics::default()),
    );
    let config = config_with_pass(vec!["solid", "not-registered"], true);
    let orch = orchestrator(&config, vec![healthy]);
    let ctx = AgentContext::new(diff(), "cfg", frozen_now());

    // The unknown id is a non-fatal security rejection even in a
    // required pass, and its reason survives into the report.
    let report = run_review(&orch, &config, &ctx).await.unwrap();
    assert!(report.verdict.passed);
    assert_eq!(report.skipped_agents.len(), 1);
    assert_eq!(report.skipped_agents[0].id, "not-registered");
    assert!(report.skipped_agents[0].reason.contains("allowlist"));
}

#[tokio::test]
async fn test_error_finding_fails_the_verdict() {
    let agent = ScriptedAgent::new(
        "scan",
        AgentResult::success(
            "scan",
            vec![Finding::new(Severity::Error, "src/lib.rs", "broken invariant", "scan").with_line(12)],
            AgentMetrics::default(),
        ),
    );
    let config = config_with_pass(vec!["scan"], false);
    let orch = orchestrator(&config, vec![agent]);
    let ctx = AgentContext::new(diff(), "cfg", frozen_now());

    let report = run_review(&orch, &config, &ctx).await.unwrap();
    assert!(!report.verdict.passed);
    assert_eq!(report.verdict.failing_count, 1);
}

#[tokio::test]
async fn test_report_orders_findings_for_adapters() {
    let agent = ScriptedAgent::new(
        "scan",
        AgentResult::success(
            "scan",
            vec![
                finding("scan", Some(14), "later warning"),
                Finding::new(Severity::Error, "src/lib.rs", "the error", "scan").with_line(13),
                finding("scan", Some(11), "earlier warning"),
            ],
            AgentMetrics::default(),
        ),
    );
    let config = config_with_pass(vec!["scan"], false);
    let orch = orchestrator(&config, vec![agent]);
    let ctx = AgentContext::new(diff(), "cfg", frozen_now());

    let report = run_review(&orch, &config, &ctx).await.unwrap();
    let order: Vec<(Severity, Option<u32>)> = report
        .complete_findings
        .iter()
        .map(|f| (f.severity, f.line))
        .collect();
    assert_eq!(
        order,
        vec![
            (Severity::Error, Some(13)),
            (Severity::Warning, Some(11)),
            (Severity::Warning, Some(14)),
        ]
    );
}
