//! Per-video segment list caching

use crate::{get_json, to_json, ttl, CacheKey, CacheLookup, CacheResult, SharedCache};
use tracing::debug;
use video_core::{VideoId, VideoSegment};

/// Cache for "segments of one video" listings, one key per video
#[derive(Clone)]
pub struct SegmentListCache {
    cache: SharedCache,
    ttl_secs: u64,
}

impl SegmentListCache {
    pub fn new(cache: SharedCache) -> Self {
        Self::with_ttl(cache, ttl::SEGMENT_LIST)
    }

    pub fn with_ttl(cache: SharedCache, ttl_secs: u64) -> Self {
        Self { cache, ttl_secs }
    }

    pub async fn get(&self, video_id: VideoId) -> CacheResult<CacheLookup<Vec<VideoSegment>>> {
        get_json(self.cache.as_ref(), &CacheKey::video_segments(video_id)).await
    }

    pub async fn set(&self, video_id: VideoId, segments: &[VideoSegment]) -> CacheResult<()> {
        let key = CacheKey::video_segments(video_id);
        self.cache
            .set_raw(&key, to_json(segments)?, self.ttl_secs)
            .await?;

        debug!(video_id, count = segments.len(), "Cached segment list");
        Ok(())
    }

    /// Evict one video's list; other videos are untouched
    pub async fn clear(&self, video_id: VideoId) -> CacheResult<()> {
        self.cache.del(&CacheKey::video_segments(video_id)).await
    }
}
