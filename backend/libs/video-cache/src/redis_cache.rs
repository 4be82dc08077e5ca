//! Redis cache backend

use crate::{CacheError, CacheEvent, CacheMetrics, CacheOperations, CacheResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Pipeline};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Shared Redis connection manager
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

/// Redis-backed cache client
#[derive(Clone)]
pub struct RedisCache {
    redis: SharedRedis,
    metrics: CacheMetrics,
}

impl RedisCache {
    pub fn new(redis: SharedRedis) -> Self {
        Self {
            redis,
            metrics: CacheMetrics::new(),
        }
    }

    /// Open a managed connection to `redis_url`
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url).map_err(CacheError::Redis)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(CacheError::Redis)?;
        Ok(Self::new(Arc::new(Mutex::new(manager))))
    }
}

#[async_trait::async_trait]
impl CacheOperations for RedisCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.redis.lock().await;

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => {
                debug!(key = %key, "Cache hit");
                self.metrics.record(key, CacheEvent::Hit);
                Ok(Some(data))
            }
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                self.metrics.record(key, CacheEvent::Miss);
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Redis get error");
                self.metrics.record(key, CacheEvent::Error);
                Err(CacheError::Redis(e))
            }
        }
    }

    async fn set_raw(&self, key: &str, payload: String, ttl_secs: u64) -> CacheResult<()> {
        if ttl_secs == 0 {
            return self.del(key).await;
        }

        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(key, payload, ttl_secs)
            .await
            .map_err(|e| {
                self.metrics.record(key, CacheEvent::Error);
                CacheError::Redis(e)
            })?;

        debug!(key = %key, ttl = ttl_secs, "Cache set");
        self.metrics.record(key, CacheEvent::Write);
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.redis.lock().await;
        conn.del::<_, ()>(key).await.map_err(|e| {
            self.metrics.record(key, CacheEvent::Error);
            CacheError::Redis(e)
        })?;

        debug!(key = %key, "Cache delete");
        self.metrics.record(key, CacheEvent::Invalidation);
        Ok(())
    }

    async fn pipeline_set(&self, items: &[(String, String)], ttl_secs: u64) -> CacheResult<()> {
        if items.is_empty() {
            return Ok(());
        }
        if ttl_secs == 0 {
            let keys: Vec<String> = items.iter().map(|(key, _)| key.clone()).collect();
            return self.pipeline_del(&keys).await;
        }

        let mut conn = self.redis.lock().await;
        // MULTI/EXEC so readers never see one key without the other
        let mut pipe = Pipeline::new();
        pipe.atomic();

        for (key, payload) in items {
            pipe.set_ex(key, payload, ttl_secs).ignore();
        }

        if let Err(e) = pipe.query_async::<_, ()>(&mut *conn).await {
            warn!(count = items.len(), error = %e, "Redis pipeline set error");
            for (key, _) in items {
                self.metrics.record(key, CacheEvent::Error);
            }
            return Err(CacheError::Redis(e));
        }

        for (key, _) in items {
            self.metrics.record(key, CacheEvent::Write);
        }
        debug!(count = items.len(), "Cache pipeline set");
        Ok(())
    }

    async fn pipeline_del(&self, keys: &[String]) -> CacheResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut conn = self.redis.lock().await;
        let mut pipe = Pipeline::new();
        pipe.atomic();

        for key in keys {
            pipe.del(key).ignore();
        }

        if let Err(e) = pipe.query_async::<_, ()>(&mut *conn).await {
            warn!(count = keys.len(), error = %e, "Redis pipeline delete error");
            for key in keys {
                self.metrics.record(key, CacheEvent::Error);
            }
            return Err(CacheError::Redis(e));
        }

        for key in keys {
            self.metrics.record(key, CacheEvent::Invalidation);
        }
        debug!(count = keys.len(), "Cache pipeline delete");
        Ok(())
    }
}
