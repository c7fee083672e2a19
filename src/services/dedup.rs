//! Deduplication Engine
//!
//! Collapses equivalent findings under two distinct policies:
//!
//! - **Complete findings** deduplicate across agents: the fingerprint
//!   deliberately excludes the source agent, so the same real issue
//!   reported by two different agents collapses to one survivor.
//! - **Partial findings** deduplicate per agent: the same apparent issue
//!   salvaged from two different failed agents is preserved as two
//!   findings, since each is independently low-confidence; only exact
//!   repeats from the same agent collapse.
//!
//! Both policies are idempotent and produce the same final set regardless
//! of input order; only the arbitrary survivor of a duplicate group may
//! vary.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use review_cascade_core::Finding;

/// Field separator inside the fingerprint preimage. A control character
/// keeps `("a", "bc")` and `("ab", "c")` from colliding.
const SEP: char = '\u{1f}';

/// Stable content hash identifying semantically equivalent findings.
///
/// Covers file, line (0 when absent), rule id, message, and severity —
/// never the source agent. Deterministic across process restarts and JSON
/// round-trips.
pub fn fingerprint(finding: &Finding) -> String {
    let mut hasher = Sha256::new();
    hasher.update(finding.file.as_bytes());
    hasher.update(SEP.to_string().as_bytes());
    hasher.update(finding.line.unwrap_or(0).to_string().as_bytes());
    hasher.update(SEP.to_string().as_bytes());
    hasher.update(finding.rule_id.as_deref().unwrap_or("").as_bytes());
    hasher.update(SEP.to_string().as_bytes());
    hasher.update(finding.message.as_bytes());
    hasher.update(SEP.to_string().as_bytes());
    hasher.update(finding.severity.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fill in the fingerprint field when the agent did not supply one.
pub fn ensure_fingerprint(finding: &mut Finding) {
    if finding.fingerprint.is_none() {
        finding.fingerprint = Some(fingerprint(finding));
    }
}

fn line_key(finding: &Finding) -> String {
    finding
        .line
        .map_or_else(|| "-".to_string(), |l| l.to_string())
}

/// Deduplicate successfully-completed findings.
///
/// Key = fingerprint + file + line. First-seen survivor; input order of the
/// survivors is preserved.
pub fn dedup_complete(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(findings.len());
    for mut finding in findings {
        ensure_fingerprint(&mut finding);
        let key = format!(
            "{}{SEP}{}{SEP}{}",
            finding.fingerprint.as_deref().unwrap_or(""),
            finding.file,
            line_key(&finding)
        );
        if seen.insert(key) {
            out.push(finding);
        }
    }
    out
}

/// Deduplicate salvaged partial findings.
///
/// Key = source agent + fingerprint + file + line, so findings from
/// different failed agents never conflate.
pub fn dedup_partial(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(findings.len());
    for mut finding in findings {
        ensure_fingerprint(&mut finding);
        let key = format!(
            "{}{SEP}{}{SEP}{}{SEP}{}",
            finding.source_agent,
            finding.fingerprint.as_deref().unwrap_or(""),
            finding.file,
            line_key(&finding)
        );
        if seen.insert(key) {
            out.push(finding);
        }
    }
    out
}
