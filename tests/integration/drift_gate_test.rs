//! Drift Gate Integration Tests
//!
//! Exercises line resolution and the drift signals through `reconcile`:
//! the inline/overall dilution scenario, the warn/fail threshold entry
//! points, and the inline-comment suppression rule.

use review_cascade::models::{DriftLevel, ExecuteResult, ReviewConfig, ValidationStats};
use review_cascade::reconcile;
use review_cascade::services::gating::should_suppress_inline_comments;
use review_cascade_core::{ChangeStatus, DiffFile, DiffHunk, Finding, Provenance, Severity};

// ============================================================================
// Helper Functions
// ============================================================================

fn diff() -> Vec<DiffFile> {
    vec![DiffFile {
        path: "src/server.rs".to_string(),
        previous_path: None,
        status: ChangeStatus::Modified,
        hunks: vec![DiffHunk {
            old_start: 100,
            old_lines: 10,
            new_start: 100,
            new_lines: 10,
        }],
        patch: None,
    }]
}

fn tagged(message: &str, line: Option<u32>) -> Finding {
    let mut f = Finding::new(Severity::Warning, "src/server.rs", message, "scan");
    f.line = line;
    f.provenance = Some(Provenance::Complete);
    f
}

/// Finding with a message unique to its anchor, so deduplication stays
/// out of these resolution-focused scenarios.
fn complete_finding(line: Option<u32>) -> Finding {
    match line {
        Some(l) => tagged(&format!("note at {l}"), line),
        None => tagged("file-level note", None),
    }
}

fn executed(findings: Vec<Finding>) -> ExecuteResult {
    ExecuteResult {
        complete_findings: findings,
        partial_findings: vec![],
        all_results: vec![],
        skipped_agents: vec![],
    }
}

// ============================================================================
// Dilution & Threshold Tests
// ============================================================================

#[test]
fn test_file_level_majority_dilutes_only_the_overall_signal() {
    // Ten file-level findings resolve trivially; the two line-anchored
    // ones both miss every hunk. Overall stays ok, inline fails.
    let mut findings: Vec<Finding> = (0..10)
        .map(|i| tagged(&format!("file-level note {i}"), None))
        .collect();
    findings.push(complete_finding(Some(900)));
    findings.push(complete_finding(Some(901)));

    let config = ReviewConfig::default();
    let report = reconcile(executed(findings), &config, &diff());

    let stats = &report.validation_stats;
    assert_eq!(stats.total, 12);
    assert_eq!(stats.valid, 10);
    assert_eq!(stats.inline_total, 2);
    assert_eq!(stats.inline_downgraded, 2);

    assert!((report.drift.overall.degradation_percent - 100.0 * 2.0 / 12.0).abs() < 0.1);
    assert_eq!(report.drift.overall.level, DriftLevel::Ok);
    assert_eq!(report.drift.inline.degradation_percent, 100.0);
    assert_eq!(report.drift.inline.level, DriftLevel::Fail);

    // Messages survive the lost anchors as file-level comments.
    assert_eq!(report.complete_findings.len(), 12);
    assert!(report.complete_findings.iter().all(|f| f.line.is_none()));
}

#[test]
fn test_quarter_degradation_enters_warn_not_fail() {
    // 3 of 4 inline findings resolve, one is unmappable: exactly 25%.
    let findings = vec![
        complete_finding(Some(101)),
        complete_finding(Some(102)),
        complete_finding(Some(103)),
        complete_finding(Some(900)),
    ];
    let config = ReviewConfig::default();
    let report = reconcile(executed(findings), &config, &diff());

    assert_eq!(report.drift.inline.degradation_percent, 25.0);
    assert_eq!(report.drift.inline.level, DriftLevel::Warn);
}

#[test]
fn test_half_degradation_enters_fail() {
    let findings = vec![
        complete_finding(Some(101)),
        complete_finding(Some(900)),
    ];
    let config = ReviewConfig::default();
    let report = reconcile(executed(findings), &config, &diff());

    assert_eq!(report.drift.inline.degradation_percent, 50.0);
    assert_eq!(report.drift.inline.level, DriftLevel::Fail);
}

#[test]
fn test_small_shift_normalizes_instead_of_degrading() {
    // Line 98 is two below the hunk start; the default snap window
    // repairs it, so nothing degrades.
    let findings = vec![complete_finding(Some(98))];
    let config = ReviewConfig::default();
    let report = reconcile(executed(findings), &config, &diff());

    assert_eq!(report.validation_stats.normalized, 1);
    assert_eq!(report.drift.inline.level, DriftLevel::Ok);
    assert_eq!(report.complete_findings[0].line, Some(100));
}

// ============================================================================
// Suppression Tests
// ============================================================================

#[test]
fn test_suppression_only_at_enabled_gate_and_fail_level() {
    let mut config = ReviewConfig::default();
    let all_lost = vec![complete_finding(Some(900)), complete_finding(Some(901))];

    // Disabled gate: a failing signal never suppresses.
    config.gating.drift_gate = false;
    let report = reconcile(executed(all_lost.clone()), &config, &diff());
    assert_eq!(report.drift.inline.level, DriftLevel::Fail);
    assert!(!report.verdict.suppress_inline);

    // Enabled gate, failing signal: suppress, but the severity-based
    // verdict is untouched.
    config.gating.drift_gate = true;
    let report = reconcile(executed(all_lost), &config, &diff());
    assert!(report.verdict.suppress_inline);
    assert!(report.verdict.passed);

    // Enabled gate, warn-level signal: never suppresses.
    let quarter = vec![
        complete_finding(Some(101)),
        complete_finding(Some(102)),
        complete_finding(Some(103)),
        complete_finding(Some(900)),
    ];
    let report = reconcile(executed(quarter), &config, &diff());
    assert_eq!(report.drift.inline.level, DriftLevel::Warn);
    assert!(!report.verdict.suppress_inline);
}

#[test]
fn test_absent_signal_never_suppresses() {
    let mut config = ReviewConfig::default();
    config.gating.drift_gate = true;
    assert!(!should_suppress_inline_comments(&config.gating, None));
}

#[test]
fn test_drift_gate_blocks_flips_the_verdict_when_configured() {
    let mut config = ReviewConfig::default();
    config.gating.drift_gate = true;
    config.gating.drift_gate_blocks = true;

    let all_lost = vec![complete_finding(Some(900)), complete_finding(Some(901))];
    let report = reconcile(executed(all_lost), &config, &diff());
    assert!(report.verdict.suppress_inline);
    assert!(!report.verdict.passed);
}

// ============================================================================
// Reference Scenario
// ============================================================================

#[test]
fn test_reference_stats_reproduce_both_scopes_exactly() {
    // 12 findings, 10 valid, 2 downgraded; only 2 carried a line and both
    // were downgraded.
    let stats = ValidationStats {
        total: 12,
        valid: 10,
        normalized: 0,
        downgraded: 2,
        dropped: 0,
        inline_total: 2,
        inline_downgraded: 2,
    };

    let overall = stats.overall_degradation_percent();
    assert!((overall - 16.7).abs() < 0.05);
    assert_eq!(DriftLevel::from_percent(overall), DriftLevel::Ok);

    let inline = stats.inline_degradation_percent();
    assert_eq!(inline, 100.0);
    assert_eq!(DriftLevel::from_percent(inline), DriftLevel::Fail);
}
