//! Startup wiring
//!
//! Builds the cache, the invalidation hook, the store and the catalog in
//! that order. The cache is an explicit instance handed to everything that
//! needs it.

use crate::catalog::VideoCatalog;
use crate::config::Config;
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use video_cache::{
    CacheInvalidator, MemoryCache, RedisCache, SegmentListCache, SharedCache, VideoListCache,
};
use video_store::{MemoryVideoStore, PgVideoStore, VideoStore};

/// Redis when configured, otherwise an in-process cache
pub async fn connect_cache(config: &Config) -> anyhow::Result<SharedCache> {
    match &config.redis_url {
        Some(url) => {
            let cache = RedisCache::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            info!("Using Redis list cache");
            Ok(Arc::new(cache))
        }
        None => {
            info!("CATALOG_REDIS_URL not set; using in-process list cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

/// Invalidator over `cache` using the configured TTL
pub fn invalidator(cache: &SharedCache, ttl_secs: u64) -> CacheInvalidator {
    CacheInvalidator::new(
        VideoListCache::with_ttl(cache.clone(), ttl_secs),
        SegmentListCache::with_ttl(cache.clone(), ttl_secs),
    )
}

/// Connect to PostgreSQL and Redis (or the in-process cache) and wire the catalog
pub async fn build(config: &Config) -> anyhow::Result<VideoCatalog> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let cache = connect_cache(config).await?;
    let hook = Arc::new(invalidator(&cache, config.cache_ttl_secs));
    let store: Arc<dyn VideoStore> = Arc::new(PgVideoStore::new(pool, hook));

    Ok(VideoCatalog::new(
        store,
        cache,
        config.cache_ttl_secs,
        config.base_url_videos.clone(),
    ))
}

/// Fully in-process catalog, for tests and local tooling
pub fn in_memory(ttl_secs: u64, base_url_videos: &str) -> VideoCatalog {
    let cache: SharedCache = Arc::new(MemoryCache::new());
    let hook = Arc::new(invalidator(&cache, ttl_secs));
    let store: Arc<dyn VideoStore> = Arc::new(MemoryVideoStore::new(hook));
    VideoCatalog::new(store, cache, ttl_secs, base_url_videos)
}
