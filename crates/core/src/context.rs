//! Agent Execution Context
//!
//! The isolated, read-only context handed to each agent run. Carries the
//! diff under review, the identifiers that key the result cache, and an
//! injected "current time" so prompt-building agents stay deterministic
//! under test without global clock overrides.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::DiffFile;

/// What kicked off the review run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    /// A pull request was opened or updated
    PullRequest,
    /// A direct push to a branch
    Push,
    /// Invoked by hand, e.g. from a developer machine
    Manual,
}

impl std::fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunTrigger::PullRequest => write!(f, "pull_request"),
            RunTrigger::Push => write!(f, "push"),
            RunTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Read-only execution context shared by all agents in a run.
///
/// Cloning is cheap: the diff is behind an `Arc` and everything else is
/// small. Each agent receives its own clone, so no two agents ever share
/// mutable state.
#[derive(Debug, Clone)]
pub struct AgentContext {
    /// Pull request number, when the trigger supplies one
    pub pr_number: Option<u64>,
    /// Head commit the diff was computed against
    pub head_commit: Option<String>,
    /// Branch the change targets or was pushed to
    pub branch: String,
    /// What started the run
    pub trigger: RunTrigger,
    /// The change under review
    pub files: Arc<Vec<DiffFile>>,
    /// Hash of the effective configuration, part of the cache key
    pub config_hash: String,
    /// Injected current time for deterministic prompt building
    pub now: DateTime<Utc>,
}

impl AgentContext {
    /// Create a context for a manual run over a diff.
    pub fn new(files: Vec<DiffFile>, config_hash: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            pr_number: None,
            head_commit: None,
            branch: "main".to_string(),
            trigger: RunTrigger::Manual,
            files: Arc::new(files),
            config_hash: config_hash.into(),
            now,
        }
    }

    /// Set the pull request number.
    pub fn with_pr(mut self, pr_number: u64) -> Self {
        self.pr_number = Some(pr_number);
        self
    }

    /// Set the head commit.
    pub fn with_head_commit(mut self, head_commit: impl Into<String>) -> Self {
        self.head_commit = Some(head_commit.into());
        self
    }

    /// Set the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the trigger.
    pub fn with_trigger(mut self, trigger: RunTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Whether both identifiers needed for cache keying are known.
    pub fn cache_key_known(&self) -> bool {
        self.pr_number.is_some() && self.head_commit.is_some()
    }

    /// Total new-side lines across all changed files.
    pub fn total_diff_lines(&self) -> u32 {
        self.files.iter().map(|f| f.new_line_count()).sum()
    }

    /// Concatenated patch text of every file that carries one, used by
    /// agents that analyze content rather than coordinates.
    pub fn combined_patch(&self) -> String {
        let mut out = String::new();
        for file in self.files.iter() {
            if let Some(patch) = &file.patch {
                out.push_str("--- ");
                out.push_str(&file.path);
                out.push('\n');
                out.push_str(patch);
                if !patch.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out
    }
}
