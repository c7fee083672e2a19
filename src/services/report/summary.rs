//! Summary Adapter
//!
//! Renders the review report as a markdown summary and writes it to
//! stdout or a file. This is the reference adapter; host-specific
//! publishers (check runs, review threads) live outside the core.

use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;

use review_cascade_core::Finding;

use crate::services::report::{ReportAdapter, ReviewReport};
use crate::utils::error::AppResult;

/// Where the rendered summary goes.
#[derive(Debug, Clone)]
pub enum SummaryTarget {
    Stdout,
    File(PathBuf),
}

/// Markdown summary renderer.
pub struct SummaryAdapter {
    target: SummaryTarget,
}

impl SummaryAdapter {
    pub fn new(target: SummaryTarget) -> Self {
        Self { target }
    }

    /// Render the whole report as markdown.
    pub fn render_markdown(report: &ReviewReport) -> String {
        let mut out = String::new();

        let verdict = if report.verdict.passed {
            "PASSED"
        } else {
            "FAILED"
        };
        let _ = writeln!(out, "## Review {verdict}");
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", report.verdict.message);
        let _ = writeln!(out);

        if report.verdict.suppress_inline {
            let _ = writeln!(
                out,
                "> Inline comments suppressed: line positions drifted too far from the current diff."
            );
            let _ = writeln!(out);
        }

        if !report.complete_findings.is_empty() {
            let _ = writeln!(out, "### Findings ({})", report.complete_findings.len());
            let _ = writeln!(out);
            render_findings_table(&mut out, &report.complete_findings);
        }

        if !report.partial_findings.is_empty() {
            let _ = writeln!(
                out,
                "### Salvaged from failed agents ({})",
                report.partial_findings.len()
            );
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "These findings come from agents that did not finish; treat them as low-confidence."
            );
            let _ = writeln!(out);
            render_findings_table(&mut out, &report.partial_findings);
        }

        let _ = writeln!(out, "### Line resolution");
        let _ = writeln!(out);
        let stats = &report.validation_stats;
        let _ = writeln!(
            out,
            "- {} finding(s): {} valid, {} normalized, {} downgraded, {} dropped",
            stats.total, stats.valid, stats.normalized, stats.downgraded, stats.dropped
        );
        let _ = writeln!(
            out,
            "- Drift: overall {} ({:.1}%), inline {} ({:.1}%)",
            report.drift.overall.level,
            report.drift.overall.degradation_percent,
            report.drift.inline.level,
            report.drift.inline.degradation_percent
        );
        let _ = writeln!(out);

        // The skipped section is always rendered, even when empty, so a
        // reader can tell "nothing skipped" from "section missing".
        let _ = writeln!(out, "### Skipped agents ({})", report.skipped_agents.len());
        let _ = writeln!(out);
        if report.skipped_agents.is_empty() {
            let _ = writeln!(out, "None.");
        } else {
            for skipped in &report.skipped_agents {
                let _ = writeln!(out, "- **{}**: {}", skipped.id, skipped.reason);
            }
        }

        out
    }
}

fn render_findings_table(out: &mut String, findings: &[Finding]) {
    let _ = writeln!(out, "| Severity | Location | Source | Message |");
    let _ = writeln!(out, "|---|---|---|---|");
    for finding in findings {
        let location = match finding.line {
            Some(line) => format!("{}:{}", finding.file, line),
            None => finding.file.clone(),
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            finding.severity,
            location,
            finding.source_agent,
            finding.message.replace('|', "\\|").replace('\n', " ")
        );
    }
    let _ = writeln!(out);
}

#[async_trait]
impl ReportAdapter for SummaryAdapter {
    fn name(&self) -> &'static str {
        "summary"
    }

    async fn publish(&self, report: &ReviewReport) -> AppResult<()> {
        let markdown = Self::render_markdown(report);
        match &self.target {
            SummaryTarget::Stdout => {
                println!("{markdown}");
            }
            SummaryTarget::File(path) => {
                std::fs::write(path, markdown)?;
                tracing::info!(path = %path.display(), "summary written");
            }
        }
        Ok(())
    }
}
