//! Reporting
//!
//! The report payload emitted by the core pipeline and the adapter
//! contract host-specific publishers implement. Adapters own idempotent
//! posting (skipping comments whose fingerprint already appears in prior
//! output) and check-run lifecycle transitions; none of that lives here.

mod summary;

pub use summary::{SummaryAdapter, SummaryTarget};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use review_cascade_core::Finding;

use crate::models::execution::SkippedAgent;
use crate::models::validation::{DriftSignal, ValidationStats};
use crate::services::gating::GatingVerdict;
use crate::utils::error::AppResult;

/// The two drift scopes, always emitted together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    /// Signal over all findings
    pub overall: DriftSignal,
    /// Signal over originally line-anchored findings; drives gating
    pub inline: DriftSignal,
}

/// Everything the core hands to reporting adapters. Findings are
/// deduplicated and ordered by severity, then file, then line; they are
/// read-only from here on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub complete_findings: Vec<Finding>,
    pub partial_findings: Vec<Finding>,
    pub drift: DriftReport,
    pub validation_stats: ValidationStats,
    pub verdict: GatingVerdict,
    pub skipped_agents: Vec<SkippedAgent>,
}

impl ReviewReport {
    /// Assemble the final report, applying the adapter ordering to both
    /// finding sets.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        mut complete_findings: Vec<Finding>,
        mut partial_findings: Vec<Finding>,
        overall: DriftSignal,
        inline: DriftSignal,
        validation_stats: ValidationStats,
        verdict: GatingVerdict,
        skipped_agents: Vec<SkippedAgent>,
    ) -> Self {
        sort_findings(&mut complete_findings);
        sort_findings(&mut partial_findings);
        Self {
            complete_findings,
            partial_findings,
            drift: DriftReport { overall, inline },
            validation_stats,
            verdict,
            skipped_agents,
        }
    }
}

/// Severity-descending, then file, then line ordering for adapter output.
fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.unwrap_or(0).cmp(&b.line.unwrap_or(0)))
    });
}

/// Contract for host-specific report publishers.
#[async_trait]
pub trait ReportAdapter: Send + Sync {
    /// Adapter name for logs.
    fn name(&self) -> &'static str;

    /// Publish the report. Must be idempotent with respect to prior runs.
    async fn publish(&self, report: &ReviewReport) -> AppResult<()>;
}
