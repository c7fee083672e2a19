//! Pattern Scan Agent
//!
//! Static analyzer over the added lines of the diff. Walks each file's
//! patch text, tracks new-side line numbers from the hunk headers, and
//! matches a small table of rules against every added line. Cheap, local,
//! and free of inference costs.

use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;

use review_cascade_core::{
    AgentContext, AgentMetrics, AgentResult, Finding, ReviewAgent, Severity,
};

/// Longest line the style rule tolerates.
const MAX_LINE_WIDTH: usize = 160;

/// One scan rule: a compiled pattern with its reporting metadata.
struct PatternRule {
    id: &'static str,
    severity: Severity,
    message: &'static str,
    pattern: Regex,
}

/// Regex-table static analyzer.
pub struct PatternScanAgent {
    rules: Vec<PatternRule>,
}

impl PatternScanAgent {
    pub fn new() -> Self {
        let rules = vec![
            PatternRule {
                id: "debug-print",
                severity: Severity::Warning,
                message: "Debug print left in changed code",
                pattern: Regex::new(r"\b(dbg!|console\.(log|debug)|print\s*\()").unwrap(),
            },
            PatternRule {
                id: "todo-marker",
                severity: Severity::Info,
                message: "Unresolved TODO/FIXME marker",
                pattern: Regex::new(r"\b(TODO|FIXME|XXX)\b").unwrap(),
            },
            PatternRule {
                id: "hardcoded-credential",
                severity: Severity::Error,
                message: "Possible hardcoded credential",
                pattern: Regex::new(
                    r#"(?i)(api[_-]?key|secret|password|token)\s*[:=]\s*["'][A-Za-z0-9/+=_-]{12,}["']"#,
                )
                .unwrap(),
            },
            PatternRule {
                id: "merge-conflict-marker",
                severity: Severity::Error,
                message: "Unresolved merge conflict marker",
                pattern: Regex::new(r"^(<{7}|={7}|>{7})").unwrap(),
            },
        ];
        Self { rules }
    }
}

impl Default for PatternScanAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewAgent for PatternScanAgent {
    fn id(&self) -> &str {
        "pattern-scan"
    }

    fn name(&self) -> &str {
        "Pattern Scan"
    }

    fn uses_paid_inference(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &AgentContext) -> AgentResult {
        let start = Instant::now();
        let mut findings = Vec::new();

        for file in ctx.files.iter() {
            let Some(patch) = &file.patch else { continue };
            for (line_number, content) in added_lines(patch) {
                for rule in &self.rules {
                    if rule.pattern.is_match(content) {
                        findings.push(
                            Finding::new(rule.severity, &file.path, rule.message, self.id())
                                .with_line(line_number)
                                .with_rule(rule.id),
                        );
                    }
                }
                if content.len() > MAX_LINE_WIDTH {
                    findings.push(
                        Finding::new(
                            Severity::Info,
                            &file.path,
                            format!("Line exceeds {} characters", MAX_LINE_WIDTH),
                            self.id(),
                        )
                        .with_line(line_number)
                        .with_rule("long-line"),
                    );
                }
            }
        }

        AgentResult::success(
            self.id(),
            findings,
            AgentMetrics::with_duration(start.elapsed().as_millis() as u64),
        )
    }
}

/// Iterate the added lines of a unified patch, yielding each with its
/// new-side line number. Hunk headers reset the counter; context lines
/// advance it; removed lines do not.
fn added_lines(patch: &str) -> Vec<(u32, &str)> {
    let header = Regex::new(r"^@@ -\d+(?:,\d+)? \+(\d+)(?:,\d+)? @@").unwrap();
    let mut out = Vec::new();
    let mut new_line: Option<u32> = None;

    for raw in patch.lines() {
        if let Some(caps) = header.captures(raw) {
            new_line = caps[1].parse::<u32>().ok();
            continue;
        }
        let Some(counter) = new_line.as_mut() else {
            continue;
        };
        if let Some(content) = raw.strip_prefix('+') {
            out.push((*counter, content));
            *counter += 1;
        } else if raw.starts_with('-') {
            // Old-side line, new counter unchanged.
        } else {
            *counter += 1;
        }
    }
    out
}
