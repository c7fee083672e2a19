//! Execution Results
//!
//! Aggregate output of one orchestrated run: the complete and partial
//! finding sets, every raw agent result, and the agents that never ran
//! together with the reason they were skipped.

use serde::{Deserialize, Serialize};

use review_cascade_core::{AgentResult, Finding};

/// An agent that was configured to run but did not, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedAgent {
    /// Agent id as it appeared in the pass configuration
    pub id: String,
    /// Human-readable agent name, falls back to the id for unknown agents
    pub name: String,
    /// Human-readable reason, always surfaced in the final summary
    pub reason: String,
}

impl SkippedAgent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Why a run had to be terminated before producing a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbortKind {
    /// A required agent reported an explicit failure
    Failed,
    /// A required agent threw an unexpected error
    Crashed,
    /// A required pass was blocked by the budget gate
    Budget,
}

/// Fatal, run-terminating condition from a required pass.
///
/// Produced at exactly one decision point in the orchestrator loop; the
/// binary maps it to a non-zero exit status. No partial report is emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAbort {
    /// Pass that triggered the abort
    pub pass: String,
    /// Agent the abort is attributed to
    pub agent_id: String,
    /// What went wrong
    pub kind: AbortKind,
    /// Human-readable description
    pub message: String,
}

impl std::fmt::Display for RunAbort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            AbortKind::Failed => "failed",
            AbortKind::Crashed => "crashed",
            AbortKind::Budget => "budget exceeded",
        };
        write!(
            f,
            "required pass '{}' aborted the run: agent '{}' {} ({})",
            self.pass, self.agent_id, kind, self.message
        )
    }
}

impl std::error::Error for RunAbort {}

/// Everything the orchestrator hands to the reconciliation stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResult {
    /// Findings from agents that finished successfully
    pub complete_findings: Vec<Finding>,
    /// Findings salvaged from agents that failed
    pub partial_findings: Vec<Finding>,
    /// Raw per-agent results, in settlement order
    pub all_results: Vec<AgentResult>,
    /// Agents that never ran, accumulated across the whole run
    pub skipped_agents: Vec<SkippedAgent>,
}
