//! Analysis Agents
//!
//! The built-in agent implementations and the registry that doubles as the
//! run's agent allowlist. Every agent satisfies the `ReviewAgent` contract
//! from the core crate: a pure async function of a context to an
//! `AgentResult`, with failures reported as data rather than panics.

mod command_lint;
mod llm_review;
mod pattern_scan;
mod registry;

pub use command_lint::CommandLintAgent;
pub use llm_review::LlmReviewAgent;
pub use pattern_scan::PatternScanAgent;
pub use registry::AgentRegistry;
