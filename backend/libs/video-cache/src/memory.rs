//! Process-local cache backend
//!
//! Entries live in a `DashMap` and expire on the tokio clock, so tests can
//! pause time and step past a TTL.

use crate::{CacheEvent, CacheMetrics, CacheOperations, CacheResult};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedEntry {
    payload: String,
    expires_at: Instant,
}

impl CachedEntry {
    fn new(payload: String, ttl_secs: u64) -> Self {
        Self {
            payload,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        }
    }

    #[inline]
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory TTL cache
///
/// Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, CachedEntry>>,
    metrics: CacheMetrics,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    fn insert(&self, key: &str, payload: String, ttl_secs: u64) {
        if ttl_secs == 0 {
            self.entries.remove(key);
            return;
        }
        self.entries
            .insert(key.to_string(), CachedEntry::new(payload, ttl_secs));
        self.metrics.record(key, CacheEvent::Write);
    }
}

#[async_trait::async_trait]
impl CacheOperations for MemoryCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let payload = self
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.payload.clone());

        match payload {
            Some(payload) => {
                debug!(key = %key, "Cache hit");
                self.metrics.record(key, CacheEvent::Hit);
                Ok(Some(payload))
            }
            None => {
                // Lazily evict an expired entry; the guard above is dropped here
                self.entries.remove_if(key, |_, entry| entry.is_expired());
                debug!(key = %key, "Cache miss");
                self.metrics.record(key, CacheEvent::Miss);
                Ok(None)
            }
        }
    }

    async fn set_raw(&self, key: &str, payload: String, ttl_secs: u64) -> CacheResult<()> {
        self.insert(key, payload, ttl_secs);
        debug!(key = %key, ttl = ttl_secs, "Cache set");
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        debug!(key = %key, "Cache delete");
        self.metrics.record(key, CacheEvent::Invalidation);
        Ok(())
    }

    async fn pipeline_set(&self, items: &[(String, String)], ttl_secs: u64) -> CacheResult<()> {
        for (key, payload) in items {
            self.insert(key, payload.clone(), ttl_secs);
        }
        debug!(count = items.len(), "Cache pipeline set");
        Ok(())
    }

    async fn pipeline_del(&self, keys: &[String]) -> CacheResult<()> {
        for key in keys {
            self.entries.remove(key);
            self.metrics.record(key, CacheEvent::Invalidation);
        }
        debug!(count = keys.len(), "Cache pipeline delete");
        Ok(())
    }
}
