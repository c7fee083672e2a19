//! Services
//!
//! The execution-and-reconciliation pipeline and its collaborators:
//! agent registry and built-in agents, orchestration, result caching,
//! budget and branch-policy gates, line resolution, deduplication,
//! verdict gating, and report assembly.

pub mod agents;
pub mod budget;
pub mod cache;
pub mod dedup;
pub mod execution;
pub mod gating;
pub mod line_resolution;
pub mod policy;
pub mod report;
