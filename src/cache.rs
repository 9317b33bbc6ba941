//! Cached completeness results with explicit invalidation
//!
//! The cache sits in front of `CompletenessCalculator`: reads go through
//! `get`, and every write path touching a registered field calls
//! `invalidate`. A TTL ceiling bounds staleness when an invalidation is
//! missed. The backing store is an injected abstraction so the engine is
//! testable without a real cache backend; the default is an in-process
//! `DashMap`.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completeness::{CompletenessCalculator, CompletenessReport};
use crate::error::InsightsError;

/// Staleness ceiling applied when no TTL is configured (1 hour)
pub const DEFAULT_TTL_SECS: i64 = 3600;

// ============================================================================
// Store Abstraction
// ============================================================================

/// Minimal key-value store the cache runs against
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn delete(&self, key: &str);
}

/// In-process store backed by a concurrent hash map
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, String>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}

// ============================================================================
// Cache Engine
// ============================================================================

/// Cached payload: the report plus when it was computed
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedReport {
    computed_at: String,
    report: CompletenessReport,
}

/// Per-user completeness cache over an injected store
pub struct CompletenessCache {
    store: Arc<dyn CacheStore>,
    calculator: CompletenessCalculator,
    ttl: Duration,
}

impl CompletenessCache {
    /// Cache over the default in-process store with the 1 hour TTL ceiling
    pub fn new(calculator: CompletenessCalculator) -> Self {
        Self {
            store: Arc::new(MemoryCache::new()),
            calculator,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }

    /// Swap in a different backing store
    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = store;
        self
    }

    /// Override the TTL ceiling
    pub fn with_ttl_secs(mut self, secs: i64) -> Self {
        self.ttl = Duration::seconds(secs);
        self
    }

    pub fn calculator(&self) -> &CompletenessCalculator {
        &self.calculator
    }

    /// Cache key, namespaced per user id
    fn key(user_id: i64) -> String {
        format!("completeness:{}", user_id)
    }

    /// Get the completeness report for a user, computing and storing it on
    /// miss or expiry
    ///
    /// Unreadable cache payloads degrade to a direct computation rather
    /// than failing the caller.
    pub fn get(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<CompletenessReport, InsightsError> {
        let key = Self::key(user_id);

        if let Some(raw) = self.store.get(&key) {
            match serde_json::from_str::<CachedReport>(&raw) {
                Ok(cached) => {
                    let computed_at = DateTime::parse_from_rfc3339(&cached.computed_at)
                        .map(|dt| dt.with_timezone(&Utc));
                    match computed_at {
                        Ok(at) if Utc::now() - at < self.ttl => {
                            debug!("Completeness cache hit for user {}", user_id);
                            return Ok(cached.report);
                        }
                        Ok(_) => debug!("Completeness cache expired for user {}", user_id),
                        Err(e) => warn!("Bad cache timestamp for user {}: {}", user_id, e),
                    }
                }
                Err(e) => warn!("Unreadable cache payload for user {}: {}", user_id, e),
            }
        }

        let report = self.calculator.calculate(conn, user_id)?;

        match serde_json::to_string(&CachedReport {
            computed_at: Utc::now().to_rfc3339(),
            report: report.clone(),
        }) {
            Ok(payload) => self.store.set(&key, payload),
            Err(e) => warn!("Failed to serialize cache payload for user {}: {}", user_id, e),
        }

        Ok(report)
    }

    /// Drop the cached report for a user; the next read recomputes
    pub fn invalidate(&self, user_id: i64) {
        self.store.delete(&Self::key(user_id));
        debug!("Invalidated completeness cache for user {}", user_id);
    }
}
