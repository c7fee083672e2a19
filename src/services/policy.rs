//! Branch Policy
//!
//! Pure predicate deciding which agents may not run for a given trigger
//! and branch. Direct pushes to the protected branch skip the agents in
//! the forbidden set unconditionally, before any budget consideration.

use std::collections::HashSet;

use review_cascade_core::{RunTrigger, FREE_LOCAL_AGENT_ID};

/// Agents barred from running on direct pushes to the protected branch.
#[derive(Debug, Clone)]
pub struct BranchPolicy {
    protected_branch: String,
    forbidden_on_protected: HashSet<String>,
}

impl BranchPolicy {
    /// Policy with an explicit forbidden set.
    pub fn new<I, S>(protected_branch: impl Into<String>, forbidden: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected_branch: protected_branch.into(),
            forbidden_on_protected: forbidden.into_iter().map(Into::into).collect(),
        }
    }

    /// Default policy: LLM reviewers stay off direct pushes to `main`.
    pub fn default_policy() -> Self {
        Self::new("main", ["llm-review", FREE_LOCAL_AGENT_ID])
    }

    /// The branch this policy protects.
    pub fn protected_branch(&self) -> &str {
        &self.protected_branch
    }

    /// Whether this agent must be skipped for the given trigger/branch.
    pub fn blocks(&self, trigger: RunTrigger, branch: &str, agent_id: &str) -> bool {
        trigger == RunTrigger::Push
            && branch == self.protected_branch
            && self.forbidden_on_protected.contains(agent_id)
    }
}

impl Default for BranchPolicy {
    fn default() -> Self {
        Self::default_policy()
    }
}
