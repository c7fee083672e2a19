//! Agent Outcome Classification
//!
//! Turns one settled agent run into its downstream effects: provenance-
//! tagged findings, a skipped-agent record when the agent failed, and the
//! skip-or-abort directive. The directive is consumed at exactly one point
//! in the orchestrator loop; nothing here terminates the process.

use review_cascade_core::{AgentResult, FailureStage, Finding, Provenance};

use crate::models::execution::{AbortKind, RunAbort, SkippedAgent};

/// How one agent's task ended at the join barrier.
#[derive(Debug)]
pub enum SettledRun {
    /// The agent returned a result, success or explicit failure
    Settled(AgentResult),
    /// The agent's own code threw an unexpected error
    Crashed(String),
}

/// Whether the run may continue after this agent's outcome.
#[derive(Debug)]
pub enum PassDirective {
    /// Proceed to the next agent
    Continue,
    /// Fatal: a required pass lost an agent
    Abort(RunAbort),
}

/// Everything the orchestrator folds into the running execute result.
#[derive(Debug)]
pub struct OutcomeEffects {
    /// The (possibly crash-normalized) raw result
    pub result: AgentResult,
    /// Findings tagged `complete`, empty unless the run succeeded
    pub complete: Vec<Finding>,
    /// Findings tagged `partial`, salvaged from a failed run
    pub partial: Vec<Finding>,
    /// Skip record for the summary when the agent did not complete
    pub skipped: Option<SkippedAgent>,
    /// Continue or abort
    pub directive: PassDirective,
}

fn tag(mut findings: Vec<Finding>, provenance: Provenance) -> Vec<Finding> {
    for finding in &mut findings {
        finding.provenance = Some(provenance);
    }
    findings
}

/// Classify one settled run.
///
/// A crash is normalized into the same failure shape as an explicit
/// failure but logged with distinguishing wording, and carries no
/// salvageable findings.
pub fn classify(
    pass_name: &str,
    pass_required: bool,
    agent_id: &str,
    agent_name: &str,
    settled: SettledRun,
) -> OutcomeEffects {
    match settled {
        SettledRun::Settled(AgentResult::Success {
            agent_id,
            findings,
            metrics,
        }) => {
            tracing::info!(
                pass = pass_name,
                agent = %agent_id,
                findings = findings.len(),
                "agent completed"
            );
            let complete = tag(findings.clone(), Provenance::Complete);
            OutcomeEffects {
                result: AgentResult::Success {
                    agent_id,
                    findings,
                    metrics,
                },
                complete,
                partial: Vec::new(),
                skipped: None,
                directive: PassDirective::Continue,
            }
        }
        SettledRun::Settled(AgentResult::Failure {
            agent_id,
            error,
            failure_stage,
            partial_findings,
            metrics,
        }) => {
            if pass_required {
                tracing::error!(
                    pass = pass_name,
                    agent = %agent_id,
                    stage = %failure_stage,
                    "required agent failed: {error}"
                );
            } else {
                tracing::warn!(
                    pass = pass_name,
                    agent = %agent_id,
                    stage = %failure_stage,
                    "agent failed: {error}"
                );
            }

            let partial = tag(partial_findings.clone(), Provenance::Partial);
            let directive = if pass_required {
                PassDirective::Abort(RunAbort {
                    pass: pass_name.to_string(),
                    agent_id: agent_id.clone(),
                    kind: AbortKind::Failed,
                    message: error.clone(),
                })
            } else {
                PassDirective::Continue
            };

            OutcomeEffects {
                skipped: Some(SkippedAgent::new(&agent_id, agent_name, &error)),
                result: AgentResult::Failure {
                    agent_id,
                    error,
                    failure_stage,
                    partial_findings,
                    metrics,
                },
                complete: Vec::new(),
                partial,
                directive,
            }
        }
        SettledRun::Crashed(message) => {
            // Normalized into the failure shape, logged distinctly.
            if pass_required {
                tracing::error!(pass = pass_name, agent = agent_id, "required agent crashed: {message}");
            } else {
                tracing::warn!(pass = pass_name, agent = agent_id, "agent crashed: {message}");
            }

            let agent_id = agent_id.to_string();
            let directive = if pass_required {
                PassDirective::Abort(RunAbort {
                    pass: pass_name.to_string(),
                    agent_id: agent_id.clone(),
                    kind: AbortKind::Crashed,
                    message: message.clone(),
                })
            } else {
                PassDirective::Continue
            };

            OutcomeEffects {
                result: AgentResult::Failure {
                    agent_id: agent_id.clone(),
                    error: message.clone(),
                    failure_stage: FailureStage::Execution,
                    partial_findings: Vec::new(),
                    metrics: Default::default(),
                },
                complete: Vec::new(),
                partial: Vec::new(),
                skipped: Some(SkippedAgent::new(&agent_id, agent_name, &message)),
                directive,
            }
        }
    }
}
