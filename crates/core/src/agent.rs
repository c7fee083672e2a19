//! Agent Contract
//!
//! Defines the interface every analysis agent implements and the tagged
//! result type their runs settle into. An agent is a pure function of an
//! execution context to an `AgentResult`; failures are data, not panics.
//!
//! The `status` discriminant on `AgentResult` is load-bearing: any
//! serialized object lacking it (for example an older `{"success": true}`
//! shape) is invalid and must be rejected wherever results are
//! deserialized. There is no partial or best-effort decoding path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::AgentContext;
use crate::error::{CoreError, CoreResult};
use crate::finding::Finding;

/// Id of the designated free local-inference agent, exempt from budget
/// gating even when it reports paid-inference usage.
pub const FREE_LOCAL_AGENT_ID: &str = "local-review";

/// Where in its lifecycle a failed agent gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// The agent could not start at all (missing dependency, no provider)
    Preflight,
    /// The agent started, then errored or timed out
    Execution,
    /// The agent ran but could not turn its output into findings
    Postprocess,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Preflight => write!(f, "preflight"),
            FailureStage::Execution => write!(f, "execution"),
            FailureStage::Postprocess => write!(f, "postprocess"),
        }
    }
}

/// Resource accounting for a single agent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
    /// Prompt tokens consumed, zero for non-LLM agents
    pub input_tokens: u32,
    /// Completion tokens consumed, zero for non-LLM agents
    pub output_tokens: u32,
    /// Estimated cost of the run in USD
    pub cost_usd: f64,
}

impl AgentMetrics {
    /// Metrics for a run that only consumed wall-clock time.
    pub fn with_duration(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            ..Default::default()
        }
    }
}

/// Settled outcome of one agent run.
///
/// Serialized with an explicit `status` tag so that cache entries and
/// network replies can be validated strictly on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AgentResult {
    /// The agent finished and its findings are trustworthy.
    #[serde(rename_all = "camelCase")]
    Success {
        /// Id of the agent that produced this result
        agent_id: String,
        /// Findings reported by the agent
        findings: Vec<Finding>,
        /// Resource accounting for the run
        metrics: AgentMetrics,
    },
    /// The agent failed; any findings it produced are low-confidence salvage.
    #[serde(rename_all = "camelCase")]
    Failure {
        /// Id of the agent that produced this result
        agent_id: String,
        /// Human-readable failure description
        error: String,
        /// Lifecycle stage the agent failed in
        failure_stage: FailureStage,
        /// Findings salvaged before the failure
        #[serde(default)]
        partial_findings: Vec<Finding>,
        /// Resource accounting up to the failure
        #[serde(default)]
        metrics: AgentMetrics,
    },
}

impl AgentResult {
    /// Build a success result.
    pub fn success(agent_id: impl Into<String>, findings: Vec<Finding>, metrics: AgentMetrics) -> Self {
        Self::Success {
            agent_id: agent_id.into(),
            findings,
            metrics,
        }
    }

    /// Build a failure result with no salvaged findings.
    pub fn failure(
        agent_id: impl Into<String>,
        error: impl Into<String>,
        failure_stage: FailureStage,
    ) -> Self {
        Self::Failure {
            agent_id: agent_id.into(),
            error: error.into(),
            failure_stage,
            partial_findings: Vec::new(),
            metrics: AgentMetrics::default(),
        }
    }

    /// Build a failure result carrying salvaged findings.
    pub fn failure_with_partials(
        agent_id: impl Into<String>,
        error: impl Into<String>,
        failure_stage: FailureStage,
        partial_findings: Vec<Finding>,
        metrics: AgentMetrics,
    ) -> Self {
        Self::Failure {
            agent_id: agent_id.into(),
            error: error.into(),
            failure_stage,
            partial_findings,
            metrics,
        }
    }

    /// Id of the agent that produced this result.
    pub fn agent_id(&self) -> &str {
        match self {
            Self::Success { agent_id, .. } | Self::Failure { agent_id, .. } => agent_id,
        }
    }

    /// Whether the run completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Resource accounting for the run.
    pub fn metrics(&self) -> &AgentMetrics {
        match self {
            Self::Success { metrics, .. } | Self::Failure { metrics, .. } => metrics,
        }
    }

    /// Strictly decode a result from a JSON value.
    ///
    /// Rejects any shape without the `status` discriminant. Used at every
    /// deserialization boundary (cache load, network reply); callers decide
    /// whether rejection is a miss or an error.
    pub fn from_json_value(value: serde_json::Value) -> CoreResult<Self> {
        if value.get("status").and_then(|s| s.as_str()).is_none() {
            return Err(CoreError::validation(
                "agent result is missing the 'status' discriminant",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| CoreError::validation(format!("invalid agent result shape: {e}")))
    }

    /// Strictly decode a result from serialized JSON text.
    pub fn from_json_str(text: &str) -> CoreResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| CoreError::parse(format!("agent result is not valid JSON: {e}")))?;
        Self::from_json_value(value)
    }
}

/// Contract implemented by every analysis agent.
///
/// Agents are mutually independent: they share no state, receive an
/// isolated context, and self-enforce their own timeouts. `run` must never
/// panic across the orchestrator boundary; operational problems are
/// reported as `AgentResult::Failure` with the stage they occurred in.
#[async_trait]
pub trait ReviewAgent: Send + Sync {
    /// Stable identifier used in pass configuration and cache keys.
    fn id(&self) -> &str;

    /// Human-readable name for summaries and logs.
    fn name(&self) -> &str;

    /// Whether running this agent consumes a paid inference service.
    fn uses_paid_inference(&self) -> bool;

    /// Whether the agent can do useful work on this context.
    fn supports(&self, ctx: &AgentContext) -> bool {
        !ctx.files.is_empty()
    }

    /// Analyze the change and settle into a result.
    async fn run(&self, ctx: &AgentContext) -> AgentResult;
}
