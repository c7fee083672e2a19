//! Review Cascade - Automated Pull-Request Review Orchestrator
//!
//! This library drives a configurable set of independent analysis agents
//! (static analyzers and LLM-based reviewers) against a diff and turns
//! their raw output into one reconciled report:
//! - Per-agent execution with cache, budget, and branch-policy gating
//! - Diff-relative line resolution and drift detection
//! - Two-mode deduplication (complete vs salvaged-partial findings)
//! - A pass/fail verdict handed to host-specific reporting adapters
//!
//! `run_review` wires the stages together; the pieces are individually
//! usable through the `services` modules.

pub mod models;
pub mod services;
pub mod utils;

pub use models::{
    DriftLevel, DriftSignal, ExecuteResult, ReviewConfig, RunAbort, SkippedAgent, ValidationStats,
};
pub use services::execution::ExecutionOrchestrator;
pub use services::gating::GatingVerdict;
pub use services::report::{ReportAdapter, ReviewReport, SummaryAdapter, SummaryTarget};

use review_cascade_core::{AgentContext, DiffFile, Finding, Provenance};

use crate::services::line_resolution::LineResolver;
use crate::services::{dedup, gating};

/// Run every configured pass and reconcile the output into the final
/// report.
///
/// The error carries the single fatal condition a run can hit: a required
/// pass losing an agent (or being blocked by the budget gate). No partial
/// report exists in that case.
pub async fn run_review(
    orchestrator: &ExecutionOrchestrator,
    config: &ReviewConfig,
    ctx: &AgentContext,
) -> Result<ReviewReport, RunAbort> {
    let executed = orchestrator.execute(ctx).await?;
    Ok(reconcile(executed, config, &ctx.files))
}

/// Reconcile raw execution output against the diff.
///
/// Resolves every finding's line anchor in one sweep (drift statistics
/// cover complete and partial findings alike), splits the sets back apart
/// by provenance, applies the matching deduplication policy to each, and
/// computes the gating verdict from the deduplicated complete set and the
/// inline drift signal.
pub fn reconcile(
    executed: ExecuteResult,
    config: &ReviewConfig,
    files: &[DiffFile],
) -> ReviewReport {
    let resolver = LineResolver::new(files, config.resolution.clone());

    let mut findings = executed.complete_findings;
    findings.extend(executed.partial_findings);
    let outcome = resolver.resolve_all(findings);

    let (partial, complete): (Vec<Finding>, Vec<Finding>) = outcome
        .findings
        .into_iter()
        .partition(|f| f.provenance == Some(Provenance::Partial));

    let complete = dedup::dedup_complete(complete);
    let partial = dedup::dedup_partial(partial);

    let verdict = gating::evaluate(&complete, &config.gating, Some(&outcome.inline));

    ReviewReport::assemble(
        complete,
        partial,
        outcome.overall,
        outcome.inline,
        outcome.stats,
        verdict,
        executed.skipped_agents,
    )
}
