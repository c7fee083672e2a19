//! Review Configuration
//!
//! TOML-backed configuration for a review run: resource limits, gating
//! thresholds, the ordered pass list, reconciliation knobs, and reporting
//! mode. Every field has a serde default so a minimal config file stays
//! minimal.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use review_cascade_core::Severity;

use crate::utils::error::{AppError, AppResult};

/// Resource ceilings for one review run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum changed files a diff may have before paid passes are gated
    pub max_files: u32,
    /// Maximum new-side diff lines before paid passes are gated
    pub max_diff_lines: u32,
    /// Token ceiling across all LLM agents in one run
    pub max_tokens_per_pr: u32,
    /// USD ceiling for one run; 0 disables the ceiling
    pub max_usd_per_pr: f64,
    /// USD ceiling for the calendar month; 0 disables the ceiling
    pub monthly_budget_usd: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_files: 200,
            max_diff_lines: 5000,
            max_tokens_per_pr: 200_000,
            max_usd_per_pr: 2.0,
            monthly_budget_usd: 50.0,
        }
    }
}

/// Pass/fail verdict configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatingConfig {
    /// Whether gating produces a verdict at all
    pub enabled: bool,
    /// Findings at or above this severity fail the verdict
    pub fail_on_severity: Severity,
    /// Whether the inline drift signal may suppress inline comments
    pub drift_gate: bool,
    /// Whether an inline drift `fail` also fails the verdict
    pub drift_gate_blocks: bool,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_on_severity: Severity::Error,
            drift_gate: false,
            drift_gate_blocks: false,
        }
    }
}

/// One named, ordered group of agents sharing a required/optional policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    /// Pass name used in logs and abort messages
    pub name: String,
    /// Agent ids to run, in declared order
    pub agents: Vec<String>,
    /// Disabled passes are ignored entirely
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// A required pass's failure aborts the whole run
    #[serde(default)]
    pub required: bool,
}

fn default_enabled() -> bool {
    true
}

/// How adapters should publish the report. Interpreted only by adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingMode {
    /// Only update the commit status / check run
    StatusOnly,
    /// Only post review threads
    ThreadsOnly,
    /// Both status and threads
    Both,
}

/// Reporting toggles passed through to adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    pub mode: ReportingMode,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            mode: ReportingMode::Both,
        }
    }
}

/// Line-resolution knobs for the drift engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Shifts up to this many lines snap onto the nearest hunk boundary
    pub normalization_threshold: u32,
    /// Shifts beyond the snap window but within this bound demote the
    /// finding to a file-level comment; anything further is unmappable
    pub max_line_shift: u32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            normalization_threshold: 2,
            max_line_shift: 10,
        }
    }
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether cached results are consulted at all
    pub enabled: bool,
    /// Entry lifetime in seconds
    pub ttl_secs: u64,
    /// Cache database path; in-memory when absent
    pub path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 86_400,
            path: None,
        }
    }
}

/// LLM endpoint settings for the reviewer agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model served by the paid endpoint
    pub model: String,
    /// Environment variable holding the paid endpoint's API key
    pub api_key_env: String,
    /// Paid endpoint override; provider default when absent
    pub base_url: Option<String>,
    /// Model served by the free local endpoint
    pub local_model: String,
    /// Free local endpoint (OpenAI-compatible)
    pub local_base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
            local_model: "qwen2.5-coder".to_string(),
            local_base_url: "http://localhost:11434/v1/chat/completions".to_string(),
        }
    }
}

/// External linter adapter settings for the command-lint agent.
///
/// The command reads the combined patch on stdin and emits findings as a
/// JSON array on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Executable to run
    pub command: String,
    /// Arguments passed to the executable
    pub args: Vec<String>,
    /// Timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            command: "review-lint".to_string(),
            args: Vec::new(),
            timeout_secs: 120,
        }
    }
}

/// Complete review configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub limits: LimitsConfig,
    pub gating: GatingConfig,
    pub passes: Vec<PassConfig>,
    pub reporting: ReportingConfig,
    pub resolution: ResolutionConfig,
    pub cache: CacheConfig,
    pub llm: LlmConfig,
    pub lint: LintConfig,
}

impl ReviewConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml(text: &str) -> AppResult<Self> {
        let config: ReviewConfig = toml::from_str(text)
            .map_err(|e| AppError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a run. Fatal before any
    /// execution happens.
    pub fn validate(&self) -> AppResult<()> {
        for pass in &self.passes {
            if pass.name.trim().is_empty() {
                return Err(AppError::config("pass with an empty name"));
            }
            if pass.agents.is_empty() {
                return Err(AppError::config(format!(
                    "pass '{}' lists no agents",
                    pass.name
                )));
            }
            for agent_id in &pass.agents {
                if agent_id.trim().is_empty() {
                    return Err(AppError::config(format!(
                        "pass '{}' lists an empty agent id",
                        pass.name
                    )));
                }
            }
        }
        if self.resolution.normalization_threshold > self.resolution.max_line_shift {
            return Err(AppError::config(
                "resolution.normalization_threshold exceeds resolution.max_line_shift",
            ));
        }
        Ok(())
    }

    /// Stable hash of the effective configuration, part of every cache key.
    pub fn config_hash(&self) -> String {
        // Serialization order is struct declaration order, so equal configs
        // always hash equal.
        let canonical = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// The passes that will actually run, in declared order.
    pub fn enabled_passes(&self) -> impl Iterator<Item = &PassConfig> {
        self.passes.iter().filter(|p| p.enabled)
    }
}
