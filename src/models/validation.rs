//! Validation Statistics & Drift Signals
//!
//! Counters describing how well agent-reported line numbers mapped onto
//! the current diff, and the degradation signal derived from them.
//!
//! The inline-only counters exist because aggregate percentages can be
//! diluted by file-level findings that never needed line resolution: a run
//! where every line-anchored finding failed to resolve can still look
//! healthy overall if most findings were file-level to begin with.

use serde::{Deserialize, Serialize};

/// Counters over one line-resolution sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    /// Findings examined
    pub total: u32,
    /// Findings whose anchor (or absence of one) was already valid
    pub valid: u32,
    /// Findings snapped onto a nearby hunk boundary
    pub normalized: u32,
    /// Findings demoted to file-level comments
    pub downgraded: u32,
    /// Findings whose anchor could not be mapped at all
    pub dropped: u32,
    /// Findings that originally carried a line number
    pub inline_total: u32,
    /// Inline findings that lost their anchor (demoted or unmappable)
    pub inline_downgraded: u32,
}

impl ValidationStats {
    /// Combine counters from two sweeps over disjoint finding sets.
    pub fn merged(a: &Self, b: &Self) -> Self {
        Self {
            total: a.total + b.total,
            valid: a.valid + b.valid,
            normalized: a.normalized + b.normalized,
            downgraded: a.downgraded + b.downgraded,
            dropped: a.dropped + b.dropped,
            inline_total: a.inline_total + b.inline_total,
            inline_downgraded: a.inline_downgraded + b.inline_downgraded,
        }
    }

    /// Share of all findings that lost their inline anchor.
    pub fn overall_degradation_percent(&self) -> f64 {
        percent(self.downgraded + self.dropped, self.total)
    }

    /// Share of originally-inline findings that lost their anchor.
    pub fn inline_degradation_percent(&self) -> f64 {
        percent(self.inline_downgraded, self.inline_total)
    }

    /// Share of all findings repaired by snapping.
    pub fn overall_auto_fix_percent(&self) -> f64 {
        percent(self.normalized, self.total)
    }

    /// Share of originally-inline findings repaired by snapping.
    pub fn inline_auto_fix_percent(&self) -> f64 {
        percent(self.normalized, self.inline_total)
    }
}

fn percent(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

/// Drift severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftLevel {
    /// Degradation below 25%
    Ok,
    /// Degradation in 25%..50%
    Warn,
    /// Degradation at or above 50%
    Fail,
}

impl DriftLevel {
    /// Classify a degradation percentage. 25 and 50 are the warn/fail
    /// entry points, not midpoints.
    pub fn from_percent(percent: f64) -> Self {
        if percent < 25.0 {
            DriftLevel::Ok
        } else if percent < 50.0 {
            DriftLevel::Warn
        } else {
            DriftLevel::Fail
        }
    }
}

impl std::fmt::Display for DriftLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriftLevel::Ok => write!(f, "ok"),
            DriftLevel::Warn => write!(f, "warn"),
            DriftLevel::Fail => write!(f, "fail"),
        }
    }
}

/// Degradation signal in one scope (overall or inline-only).
///
/// The two scopes are independent values computed from the same stats,
/// never derived from each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSignal {
    pub level: DriftLevel,
    pub degradation_percent: f64,
    pub auto_fix_percent: f64,
    pub message: String,
    /// Messages of a few degraded findings, for human triage
    pub sample_findings: Vec<String>,
}

impl DriftSignal {
    /// Signal over all findings.
    pub fn overall(stats: &ValidationStats, sample_findings: Vec<String>) -> Self {
        let degradation = stats.overall_degradation_percent();
        Self {
            level: DriftLevel::from_percent(degradation),
            degradation_percent: degradation,
            auto_fix_percent: stats.overall_auto_fix_percent(),
            message: format!(
                "{}/{} findings lost their inline anchor ({:.1}%)",
                stats.downgraded + stats.dropped,
                stats.total,
                degradation
            ),
            sample_findings,
        }
    }

    /// Signal restricted to findings that originally carried a line number.
    pub fn inline(stats: &ValidationStats, sample_findings: Vec<String>) -> Self {
        let degradation = stats.inline_degradation_percent();
        Self {
            level: DriftLevel::from_percent(degradation),
            degradation_percent: degradation,
            auto_fix_percent: stats.inline_auto_fix_percent(),
            message: format!(
                "{}/{} line-anchored findings lost their anchor ({:.1}%)",
                stats.inline_downgraded, stats.inline_total, degradation
            ),
            sample_findings,
        }
    }
}
