//! Gating Engine
//!
//! Converts the deduplicated complete finding set and the inline drift
//! signal into the pass/fail verdict consumed by reporting adapters, and
//! decides whether inline comments must be suppressed for the run.

use serde::{Deserialize, Serialize};

use review_cascade_core::Finding;

use crate::models::config::GatingConfig;
use crate::models::validation::{DriftLevel, DriftSignal};

/// Pass/fail verdict for the change under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatingVerdict {
    /// Whether the change passes review
    pub passed: bool,
    /// Findings at or above the configured severity threshold
    pub failing_count: usize,
    /// Whether inline comments are suppressed for this run
    pub suppress_inline: bool,
    /// Human-readable explanation
    pub message: String,
}

/// Inline comments are suppressed if and only if the drift gate is
/// explicitly enabled and the inline drift signal's level is `fail`.
/// `warn` never suppresses; an absent signal never suppresses; a disabled
/// gate never suppresses regardless of signal.
pub fn should_suppress_inline_comments(
    config: &GatingConfig,
    inline: Option<&DriftSignal>,
) -> bool {
    if !config.drift_gate {
        return false;
    }
    matches!(inline, Some(signal) if signal.level == DriftLevel::Fail)
}

/// Compute the verdict for a deduplicated complete finding set.
pub fn evaluate(
    findings: &[Finding],
    config: &GatingConfig,
    inline: Option<&DriftSignal>,
) -> GatingVerdict {
    let suppress_inline = should_suppress_inline_comments(config, inline);

    if !config.enabled {
        return GatingVerdict {
            passed: true,
            failing_count: 0,
            suppress_inline,
            message: "Gating disabled".to_string(),
        };
    }

    let failing_count = findings
        .iter()
        .filter(|f| f.severity.at_least(config.fail_on_severity))
        .count();

    let drift_blocks = config.drift_gate_blocks
        && config.drift_gate
        && matches!(inline, Some(signal) if signal.level == DriftLevel::Fail);

    let passed = failing_count == 0 && !drift_blocks;
    let message = if !passed && failing_count > 0 {
        format!(
            "{} finding(s) at or above '{}'",
            failing_count, config.fail_on_severity
        )
    } else if drift_blocks {
        "Inline drift gate failed".to_string()
    } else {
        "No findings at or above the failure threshold".to_string()
    };

    GatingVerdict {
        passed,
        failing_count,
        suppress_inline,
        message,
    }
}
