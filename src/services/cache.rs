//! Result Cache
//!
//! Content-addressed agent result cache keyed by
//! (pr_number, head_commit, config_hash, agent_id) in a SQLite table.
//!
//! Expired and shape-invalid entries are treated identically to a miss; a
//! shape-invalid entry additionally emits a warning-level diagnostic.
//! Lookups never raise: any storage-level problem degrades to a miss so a
//! broken cache can never break a review run. Same-key races resolve
//! last-write-wins without locking, since a cached result is a pure
//! function of its key.

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use review_cascade_core::AgentResult;

use crate::utils::error::{AppError, AppResult};

/// Cache key for one agent's result on one head commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Pull request number
    pub pr_number: u64,
    /// Head commit the diff was computed against
    pub head_commit: String,
    /// Hash of the effective configuration
    pub config_hash: String,
    /// Agent the result belongs to
    pub agent_id: String,
}

/// Agent result cache backed by SQLite.
pub struct ResultCache {
    pool: Pool<SqliteConnectionManager>,
    ttl_secs: u64,
}

impl ResultCache {
    /// Create a cache with the given database pool and entry lifetime.
    pub fn new(pool: Pool<SqliteConnectionManager>, ttl_secs: u64) -> AppResult<Self> {
        let cache = Self { pool, ttl_secs };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache, used by tests and cacheless runs.
    pub fn in_memory(ttl_secs: u64) -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::cache(format!("failed to build pool: {e}")))?;
        Self::new(pool, ttl_secs)
    }

    /// Open (or create) a cache database at a path.
    pub fn open(path: &str, ttl_secs: u64) -> AppResult<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .build(manager)
            .map_err(|e| AppError::cache(format!("failed to build pool: {e}")))?;
        Self::new(pool, ttl_secs)
    }

    /// Initialize the cache table schema.
    fn init_schema(&self) -> AppResult<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AppError::cache(format!("failed to get connection: {e}")))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS review_result_cache (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pr_number INTEGER NOT NULL,
                head_commit TEXT NOT NULL,
                config_hash TEXT NOT NULL,
                agent_id TEXT NOT NULL,
                result_json TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                UNIQUE(pr_number, head_commit, config_hash, agent_id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_review_cache_key
             ON review_result_cache(pr_number, head_commit, config_hash, agent_id)",
            [],
        )?;

        Ok(())
    }

    /// Look up a cached result.
    ///
    /// Returns `None` for absent, expired, and shape-invalid entries alike.
    /// Never raises.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<AgentResult> {
        let row = match self.fetch_row(key) {
            Ok(row) => row?,
            Err(e) => {
                tracing::warn!(agent_id = %key.agent_id, "cache lookup failed, treating as miss: {e}");
                return None;
            }
        };

        let (result_json, expires_at) = row;
        if expires_at <= now.timestamp() {
            tracing::debug!(agent_id = %key.agent_id, "cache entry expired");
            return None;
        }

        match AgentResult::from_json_str(&result_json) {
            Ok(result) => Some(result),
            Err(e) => {
                // Corrupted or legacy-shaped entry. Diagnosed, never fatal.
                tracing::warn!(
                    agent_id = %key.agent_id,
                    "cache entry failed shape validation, treating as miss: {e}"
                );
                None
            }
        }
    }

    fn fetch_row(&self, key: &CacheKey) -> AppResult<Option<(String, i64)>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AppError::cache(format!("failed to get connection: {e}")))?;

        let result = conn.query_row(
            "SELECT result_json, expires_at FROM review_result_cache
             WHERE pr_number = ?1 AND head_commit = ?2 AND config_hash = ?3 AND agent_id = ?4",
            params![
                key.pr_number as i64,
                key.head_commit,
                key.config_hash,
                key.agent_id
            ],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        );

        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Sqlite(e)),
        }
    }

    /// Store a result under a key. Last write wins.
    pub fn set(&self, key: &CacheKey, result: &AgentResult, now: DateTime<Utc>) -> AppResult<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AppError::cache(format!("failed to get connection: {e}")))?;

        let result_json = serde_json::to_string(result)?;
        let created_at = now.timestamp();
        let expires_at = created_at + self.ttl_secs as i64;

        conn.execute(
            "INSERT OR REPLACE INTO review_result_cache
             (pr_number, head_commit, config_hash, agent_id, result_json, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                key.pr_number as i64,
                key.head_commit,
                key.config_hash,
                key.agent_id,
                result_json,
                created_at,
                expires_at,
            ],
        )?;

        Ok(())
    }

    /// Remove every cached entry.
    pub fn clear(&self) -> AppResult<u64> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AppError::cache(format!("failed to get connection: {e}")))?;

        let count = conn.execute("DELETE FROM review_result_cache", [])?;
        Ok(count as u64)
    }

    /// Number of cached entries, expired ones included.
    pub fn count(&self) -> AppResult<u64> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AppError::cache(format!("failed to get connection: {e}")))?;

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM review_result_cache", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Store a raw JSON payload under a key, bypassing result validation.
    /// Exists so tests can plant legacy-shaped entries; production code
    /// always goes through `set`.
    #[doc(hidden)]
    pub fn set_raw_json(&self, key: &CacheKey, json: &str, now: DateTime<Utc>) -> AppResult<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| AppError::cache(format!("failed to get connection: {e}")))?;

        conn.execute(
            "INSERT OR REPLACE INTO review_result_cache
             (pr_number, head_commit, config_hash, agent_id, result_json, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                key.pr_number as i64,
                key.head_commit,
                key.config_hash,
                key.agent_id,
                json,
                now.timestamp(),
                now.timestamp() + self.ttl_secs as i64,
            ],
        )?;
        Ok(())
    }
}
