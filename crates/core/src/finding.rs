//! Review Findings
//!
//! A `Finding` is a single issue reported by an analysis agent: a severity,
//! a location in the changed code, a message, and bookkeeping fields used by
//! the reconciliation pipeline (fingerprint, provenance).

use serde::{Deserialize, Serialize};

/// Severity of a finding, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note, never blocks a review
    Info,
    /// Should be looked at, may block depending on configuration
    Warning,
    /// Definite problem, blocks under the default gating threshold
    Error,
}

impl Severity {
    /// Whether this severity meets or exceeds a configured threshold.
    pub fn at_least(&self, threshold: Severity) -> bool {
        *self >= threshold
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// How a finding reached the final set.
///
/// Assigned once at collection time and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Reported by an agent that finished successfully
    Complete,
    /// Salvaged from an agent that failed or timed out
    Partial,
}

/// A single issue reported against the change under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Severity of the issue
    pub severity: Severity,
    /// Path of the file the issue is in, relative to the repository root
    pub file: String,
    /// New-side line the issue is anchored to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Last line of a multi-line anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// Human-readable description of the issue
    pub message: String,
    /// Id of the agent that reported the issue
    pub source_agent: String,
    /// Rule that produced the issue, when the agent has a rule taxonomy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Stable content hash, filled in by the deduplication engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Suggested replacement code, if the agent proposed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Free-form agent-specific metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Complete vs partial origin, assigned at collection time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

impl Finding {
    /// Create a new finding with the required fields.
    pub fn new(
        severity: Severity,
        file: impl Into<String>,
        message: impl Into<String>,
        source_agent: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            file: file.into(),
            line: None,
            end_line: None,
            message: message.into(),
            source_agent: source_agent.into(),
            rule_id: None,
            fingerprint: None,
            suggestion: None,
            metadata: serde_json::Map::new(),
            provenance: None,
        }
    }

    /// Anchor the finding to a line.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Extend the anchor to a line range.
    pub fn with_end_line(mut self, end_line: u32) -> Self {
        self.end_line = Some(end_line);
        self
    }

    /// Attach a rule id.
    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Attach a suggested fix.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Whether the finding carries an inline anchor.
    pub fn is_inline(&self) -> bool {
        self.line.is_some()
    }

    /// Drop the inline anchor, keeping the message as a file-level comment.
    pub fn demote_to_file_level(&mut self) {
        self.line = None;
        self.end_line = None;
    }
}
