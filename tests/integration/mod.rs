//! Integration Tests Module
//!
//! End-to-end coverage of the review pipeline through the public library
//! API. Tests cover orchestration and failure semantics, line resolution
//! and drift gating, the two deduplication policies, cache shape
//! validation, and budget exemptions.

// Full pipeline runs with stub agents
mod pipeline_test;

// Line resolution, drift signals, and inline suppression
mod drift_gate_test;

// Complete vs partial deduplication policies and fingerprints
mod dedup_policy_test;

// Result cache lookups, expiry, and strict shape validation
mod cache_validation_test;

// Budget gating and the free local-inference exemption
mod budget_gate_test;
