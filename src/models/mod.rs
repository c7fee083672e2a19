//! Data Models
//!
//! Application-level models: configuration, execution results, and the
//! validation/drift statistics produced by line resolution. The review
//! domain primitives (findings, diffs, agent results) live in
//! `review-cascade-core`.

pub mod config;
pub mod execution;
pub mod validation;

pub use config::{
    CacheConfig, GatingConfig, LimitsConfig, LintConfig, LlmConfig, PassConfig,
    ReportingConfig, ReportingMode, ResolutionConfig, ReviewConfig,
};
pub use execution::{AbortKind, ExecuteResult, RunAbort, SkippedAgent};
pub use validation::{DriftLevel, DriftSignal, ValidationStats};
