//! Line Resolution & Drift Detection
//!
//! Maps agent-reported line numbers onto the current diff's new-side
//! coordinate space and measures how badly they have drifted.
//!
//! Per finding with a line number:
//! - inside an added/context range → valid, used as-is
//! - within the snap window of a hunk boundary → normalized onto it
//! - beyond the snap window but within the maximum shift → downgraded to a
//!   file-level comment
//! - unmappable (outside every hunk, deleted file, stale rename path) →
//!   dropped for inline-positioning purposes
//!
//! A downgraded or dropped finding keeps its message; only the inline
//! anchor is removed. Findings without a line number are inherently valid
//! file-level comments and stay out of the inline statistics.

use std::collections::{HashMap, HashSet};

use review_cascade_core::diff::is_stale_rename_path;
use review_cascade_core::{DiffFile, Finding};

use crate::models::config::ResolutionConfig;
use crate::models::validation::{DriftSignal, ValidationStats};

/// How many degraded findings to quote in the drift signal.
const SAMPLE_LIMIT: usize = 3;

/// What happened to one finding's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Valid,
    Normalized,
    Downgraded,
    Dropped,
}

/// Output of one resolution sweep.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// The findings with anchors resolved, demoted, or removed
    pub findings: Vec<Finding>,
    /// Counters over the sweep
    pub stats: ValidationStats,
    /// Degradation signal over all findings
    pub overall: DriftSignal,
    /// Degradation signal over originally line-anchored findings only.
    /// This is the signal gating decisions use: the overall one can be
    /// diluted to `ok` by file-level findings even when every
    /// line-anchored finding failed to resolve.
    pub inline: DriftSignal,
}

/// Resolves finding anchors against one diff.
pub struct LineResolver {
    files: HashMap<String, DiffFile>,
    stale_rename_paths: HashSet<String>,
    config: ResolutionConfig,
}

impl LineResolver {
    /// Build a resolver over the diff under review.
    pub fn new(files: &[DiffFile], config: ResolutionConfig) -> Self {
        let stale_rename_paths = files
            .iter()
            .filter_map(|f| f.previous_path.clone())
            .filter(|p| is_stale_rename_path(files, p))
            .collect();
        Self {
            files: files.iter().map(|f| (f.path.clone(), f.clone())).collect(),
            stale_rename_paths,
            config,
        }
    }

    /// Resolve every finding and compute both drift signals.
    pub fn resolve_all(&self, findings: Vec<Finding>) -> ResolutionOutcome {
        let mut stats = ValidationStats::default();
        let mut samples: Vec<String> = Vec::new();
        let mut resolved = Vec::with_capacity(findings.len());

        for mut finding in findings {
            let was_inline = finding.is_inline();
            let disposition = self.resolve_one(&mut finding);

            stats.total += 1;
            if was_inline {
                stats.inline_total += 1;
            }
            match disposition {
                Disposition::Valid => stats.valid += 1,
                Disposition::Normalized => stats.normalized += 1,
                Disposition::Downgraded => {
                    stats.downgraded += 1;
                    if was_inline {
                        stats.inline_downgraded += 1;
                    }
                    if samples.len() < SAMPLE_LIMIT {
                        samples.push(finding.message.clone());
                    }
                }
                Disposition::Dropped => {
                    stats.dropped += 1;
                    if was_inline {
                        stats.inline_downgraded += 1;
                    }
                    if samples.len() < SAMPLE_LIMIT {
                        samples.push(finding.message.clone());
                    }
                }
            }
            resolved.push(finding);
        }

        let overall = DriftSignal::overall(&stats, samples.clone());
        let inline = DriftSignal::inline(&stats, samples);

        ResolutionOutcome {
            findings: resolved,
            stats,
            overall,
            inline,
        }
    }

    fn resolve_one(&self, finding: &mut Finding) -> Disposition {
        let Some(line) = finding.line else {
            // File-level comment, nothing to resolve.
            return Disposition::Valid;
        };

        if self.stale_rename_paths.contains(&finding.file) {
            // The file moved; the old path has no unambiguous new-side
            // target.
            finding.demote_to_file_level();
            return Disposition::Dropped;
        }

        let Some(file) = self.files.get(&finding.file) else {
            finding.demote_to_file_level();
            return Disposition::Dropped;
        };

        if file.contains_new_line(line) {
            return Disposition::Valid;
        }

        match file.nearest_new_line(line) {
            Some((snapped, shift)) if shift <= self.config.normalization_threshold => {
                let delta = i64::from(snapped) - i64::from(line);
                finding.line = Some(snapped);
                if let Some(end) = finding.end_line {
                    let shifted = i64::from(end) + delta;
                    finding.end_line = Some(shifted.max(i64::from(snapped)) as u32);
                }
                Disposition::Normalized
            }
            Some((_, shift)) if shift <= self.config.max_line_shift => {
                finding.demote_to_file_level();
                Disposition::Downgraded
            }
            _ => {
                finding.demote_to_file_level();
                Disposition::Dropped
            }
        }
    }
}
