//! Cache Validation Integration Tests
//!
//! Strict shape validation at the cache boundary: legacy or corrupted
//! entries and expired rows are all treated as misses, never as errors,
//! and a valid hit replaces agent execution entirely.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use review_cascade::models::{PassConfig, ReviewConfig};
use review_cascade::run_review;
use review_cascade::services::agents::AgentRegistry;
use review_cascade::services::budget::BudgetTracker;
use review_cascade::services::cache::{CacheKey, ResultCache};
use review_cascade::ExecutionOrchestrator;
use review_cascade_core::{
    AgentContext, AgentMetrics, AgentResult, ChangeStatus, DiffFile, Finding, ReviewAgent,
    Severity,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Agent that counts how often it actually ran.
struct CountingAgent {
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl ReviewAgent for CountingAgent {
    fn id(&self) -> &str {
        "counting"
    }
    fn name(&self) -> &str {
        "Counting"
    }
    fn uses_paid_inference(&self) -> bool {
        false
    }
    async fn run(&self, _ctx: &AgentContext) -> AgentResult {
        self.runs.fetch_add(1, Ordering::SeqCst);
        AgentResult::success(
            "counting",
            vec![Finding::new(Severity::Info, "a.rs", "fresh run", "counting")],
            AgentMetrics::with_duration(1),
        )
    }
}

fn frozen_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn diff() -> Vec<DiffFile> {
    vec![DiffFile {
        path: "a.rs".to_string(),
        previous_path: None,
        status: ChangeStatus::Modified,
        hunks: vec![],
        patch: None,
    }]
}

fn key() -> CacheKey {
    CacheKey {
        pr_number: 42,
        head_commit: "abc123".to_string(),
        config_hash: "cfg".to_string(),
        agent_id: "counting".to_string(),
    }
}

fn setup(
    cache: Arc<ResultCache>,
) -> (ExecutionOrchestrator, Arc<ReviewConfig>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = AgentRegistry::new();
    registry.register(Arc::new(CountingAgent {
        runs: Arc::clone(&runs),
    }));

    let mut config = ReviewConfig::default();
    config.passes = vec![PassConfig {
        name: "static".to_string(),
        agents: vec!["counting".to_string()],
        enabled: true,
        required: false,
    }];
    let config = Arc::new(config);

    let orch = ExecutionOrchestrator::new(
        Arc::clone(&config),
        Arc::new(registry),
        Arc::new(BudgetTracker::unlimited()),
    )
    .with_cache(cache);

    (orch, config, runs)
}

fn ctx() -> AgentContext {
    AgentContext::new(diff(), "cfg", frozen_now())
        .with_pr(42)
        .with_head_commit("abc123")
}

// ============================================================================
// Shape Validation Tests
// ============================================================================

#[test]
fn test_legacy_boolean_shape_is_a_miss_never_an_error() {
    let cache = ResultCache::in_memory(3600).unwrap();
    cache
        .set_raw_json(
            &key(),
            r#"{"success": true, "agentId": "counting", "findings": []}"#,
            frozen_now(),
        )
        .unwrap();

    assert!(cache.get(&key(), frozen_now()).is_none());
}

#[test]
fn test_garbage_entry_is_a_miss_never_an_error() {
    let cache = ResultCache::in_memory(3600).unwrap();
    cache
        .set_raw_json(&key(), "{ truncated json", frozen_now())
        .unwrap();
    assert!(cache.get(&key(), frozen_now()).is_none());
}

#[test]
fn test_expired_entry_is_a_miss() {
    let cache = ResultCache::in_memory(60).unwrap();
    let result = AgentResult::success("counting", vec![], AgentMetrics::default());
    cache.set(&key(), &result, frozen_now()).unwrap();

    assert!(cache.get(&key(), frozen_now()).is_some());
    assert!(cache
        .get(&key(), frozen_now() + Duration::seconds(120))
        .is_none());
}

// ============================================================================
// Pipeline Interaction Tests
// ============================================================================

#[tokio::test]
async fn test_valid_hit_replaces_execution_in_the_report() {
    let cache = Arc::new(ResultCache::in_memory(3600).unwrap());
    let cached = AgentResult::success(
        "counting",
        vec![Finding::new(Severity::Info, "a.rs", "from cache", "counting")],
        AgentMetrics::default(),
    );
    cache.set(&key(), &cached, frozen_now()).unwrap();

    let (orch, config, runs) = setup(Arc::clone(&cache));
    let report = run_review(&orch, &config, &ctx()).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(report.complete_findings.len(), 1);
    assert_eq!(report.complete_findings[0].message, "from cache");
}

#[tokio::test]
async fn test_legacy_hit_falls_back_to_execution_and_heals() {
    let cache = Arc::new(ResultCache::in_memory(3600).unwrap());
    cache
        .set_raw_json(&key(), r#"{"success": true}"#, frozen_now())
        .unwrap();

    let (orch, config, runs) = setup(Arc::clone(&cache));
    let report = run_review(&orch, &config, &ctx()).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(report.complete_findings[0].message, "fresh run");
    // The fresh success overwrote the legacy row.
    assert!(cache.get(&key(), frozen_now()).unwrap().is_success());
}

#[tokio::test]
async fn test_without_pr_identifiers_cache_is_bypassed() {
    let cache = Arc::new(ResultCache::in_memory(3600).unwrap());
    let (orch, config, runs) = setup(Arc::clone(&cache));

    // Manual run with neither PR number nor head commit.
    let local_ctx = AgentContext::new(diff(), "cfg", frozen_now());
    run_review(&orch, &config, &local_ctx).await.unwrap();

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(cache.count().unwrap(), 0);
}
