//! Video catalog caching layer
//!
//! Read-mostly list caches that absorb polling from admin UIs:
//! - `VideoListCache`: the full video list plus the set of its ids
//! - `SegmentListCache`: one segment list per video
//! - `CacheInvalidator`: mutation hook that clears both on every write
//!
//! Caches are pass-through: a miss never populates anything. Callers query
//! the store and `set` the result themselves. Any TTL key-value backend that
//! implements [`CacheOperations`] can sit underneath; [`MemoryCache`] and
//! [`RedisCache`] are provided.

mod error;
mod keys;
mod memory;
mod metrics;
mod redis_cache;

pub mod invalidation;
pub mod segment_list;
pub mod video_list;

pub use error::{CacheError, CacheResult};
pub use invalidation::{CacheInvalidator, ChangeKind, DataChange, MutationHook, NoopHook};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::MemoryCache;
pub use metrics::{CacheEvent, CacheMetrics};
pub use redis_cache::{RedisCache, SharedRedis};
pub use segment_list::SegmentListCache;
pub use video_list::VideoListCache;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Default TTL values (seconds)
pub mod ttl {
    pub const VIDEO_LIST: u64 = 300; // 5 minutes
    pub const SEGMENT_LIST: u64 = 300; // 5 minutes
}

/// Cache backend shared by every list cache in the process
pub type SharedCache = Arc<dyn CacheOperations>;

/// Core cache operations over raw string payloads
#[async_trait::async_trait]
pub trait CacheOperations: Send + Sync {
    /// Get a value, `None` when absent or expired
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value with TTL. A zero TTL removes the key instead.
    async fn set_raw(&self, key: &str, payload: String, ttl_secs: u64) -> CacheResult<()>;

    /// Delete a key from cache
    async fn del(&self, key: &str) -> CacheResult<()>;

    /// Set several keys with the same TTL in one round trip, in order
    async fn pipeline_set(&self, items: &[(String, String)], ttl_secs: u64) -> CacheResult<()>;

    /// Delete several keys in one round trip
    async fn pipeline_del(&self, keys: &[String]) -> CacheResult<()>;
}

/// Outcome of a cache read. A miss means "unknown", never "empty".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
}

impl<T> CacheLookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, CacheLookup::Miss)
    }

    /// The cached value, if any
    pub fn hit(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            CacheLookup::Miss => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CacheLookup<U> {
        match self {
            CacheLookup::Hit(value) => CacheLookup::Hit(f(value)),
            CacheLookup::Miss => CacheLookup::Miss,
        }
    }
}

impl<T> From<Option<T>> for CacheLookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => CacheLookup::Hit(value),
            None => CacheLookup::Miss,
        }
    }
}

/// Read and decode a JSON payload. Undecodable entries are evicted and
/// reported as a miss.
pub(crate) async fn get_json<T: DeserializeOwned>(
    cache: &dyn CacheOperations,
    key: &str,
) -> CacheResult<CacheLookup<T>> {
    let Some(payload) = cache.get_raw(key).await? else {
        return Ok(CacheLookup::Miss);
    };

    match serde_json::from_str::<T>(&payload) {
        Ok(value) => Ok(CacheLookup::Hit(value)),
        Err(e) => {
            warn!(key = %key, error = %e, "Cache deserialization failed");
            if let Err(e) = cache.del(key).await {
                warn!(key = %key, error = %e, "Failed to evict corrupted cache entry");
            }
            Ok(CacheLookup::Miss)
        }
    }
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    serde_json::to_string(value).map_err(CacheError::Serialization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_helpers() {
        let hit = CacheLookup::Hit(3);
        assert!(hit.is_hit());
        assert_eq!(hit.clone().map(|v| v * 2), CacheLookup::Hit(6));
        assert_eq!(hit.hit(), Some(3));

        let miss: CacheLookup<i32> = CacheLookup::Miss;
        assert!(miss.is_miss());
        assert_eq!(miss.map(|v| v * 2), CacheLookup::Miss);
    }

    #[test]
    fn test_lookup_from_option() {
        assert_eq!(CacheLookup::from(Some(false)), CacheLookup::Hit(false));
        assert_eq!(CacheLookup::<bool>::from(None), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_get_json_evicts_corrupted_payload() {
        let cache = MemoryCache::new();
        cache
            .set_raw("v1:videos:all", "{not json".to_string(), 60)
            .await
            .unwrap();

        let lookup: CacheLookup<Vec<i64>> = get_json(&cache, "v1:videos:all").await.unwrap();
        assert!(lookup.is_miss());
        assert_eq!(cache.get_raw("v1:videos:all").await.unwrap(), None);
    }
}
