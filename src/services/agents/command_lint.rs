//! Command Lint Agent
//!
//! Adapts an external linter subprocess to the agent contract. The
//! command receives the combined patch on stdin and must emit findings as
//! a JSON array on stdout; exit codes are ignored as long as the output
//! parses, since linters conventionally exit non-zero when they find
//! anything.
//!
//! Failure stages:
//! - command not found in PATH -> preflight
//! - spawn error, I/O error, timeout -> execution
//! - unparseable stdout -> postprocess

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use review_cascade_core::{
    AgentContext, AgentMetrics, AgentResult, FailureStage, Finding, ReviewAgent, Severity,
};

use crate::models::config::LintConfig;

/// Finding shape the adapted linter emits.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFinding {
    file: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    end_line: Option<u32>,
    severity: Severity,
    message: String,
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
}

/// External linter subprocess adapter.
pub struct CommandLintAgent {
    config: LintConfig,
}

impl CommandLintAgent {
    pub fn new(config: LintConfig) -> Self {
        Self { config }
    }

    /// Check if the configured command exists in PATH.
    async fn command_exists(&self) -> bool {
        #[cfg(windows)]
        let probe = "where";
        #[cfg(not(windows))]
        let probe = "which";

        Command::new(probe)
            .arg(&self.config.command)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn wire_to_finding(&self, wire: WireFinding) -> Finding {
        let mut finding = Finding::new(wire.severity, wire.file, wire.message, self.id());
        finding.line = wire.line;
        finding.end_line = wire.end_line;
        finding.rule_id = wire.rule_id;
        finding.suggestion = wire.suggestion;
        finding
    }
}

#[async_trait]
impl ReviewAgent for CommandLintAgent {
    fn id(&self) -> &str {
        "command-lint"
    }

    fn name(&self) -> &str {
        "Command Lint"
    }

    fn uses_paid_inference(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &AgentContext) -> AgentResult {
        let start = Instant::now();

        if !self.command_exists().await {
            return AgentResult::failure(
                self.id(),
                format!("Command '{}' not found in PATH", self.config.command),
                FailureStage::Preflight,
            );
        }

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return AgentResult::failure(
                    self.id(),
                    format!("Failed to spawn '{}': {}", self.config.command, e),
                    FailureStage::Execution,
                );
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let patch = ctx.combined_patch();
            if let Err(e) = stdin.write_all(patch.as_bytes()).await {
                return AgentResult::failure(
                    self.id(),
                    format!("Failed to write patch to linter stdin: {}", e),
                    FailureStage::Execution,
                );
            }
            // Closing stdin lets the linter see EOF.
            drop(stdin);
        }

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let output = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return AgentResult::failure(
                    self.id(),
                    format!("Linter I/O error: {}", e),
                    FailureStage::Execution,
                );
            }
            Err(_) => {
                return AgentResult::failure(
                    self.id(),
                    format!("Timed out after {}s", self.config.timeout_secs),
                    FailureStage::Execution,
                );
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let stdout = String::from_utf8_lossy(&output.stdout);

        match serde_json::from_str::<Vec<WireFinding>>(stdout.trim()) {
            Ok(wire_findings) => {
                let findings = wire_findings
                    .into_iter()
                    .map(|w| self.wire_to_finding(w))
                    .collect();
                AgentResult::success(self.id(), findings, AgentMetrics::with_duration(duration_ms))
            }
            Err(parse_err) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    AgentResult::failure(
                        self.id(),
                        format!(
                            "Linter exited with code {}: {}",
                            output.status.code().unwrap_or(-1),
                            stderr.trim()
                        ),
                        FailureStage::Execution,
                    )
                } else {
                    AgentResult::failure(
                        self.id(),
                        format!("Could not parse linter output: {}", parse_err),
                        FailureStage::Postprocess,
                    )
                }
            }
        }
    }
}
