//! Video list caching
//!
//! Two keys populated together: the full list (newest first) and the set of
//! ids it contains, so membership checks avoid decoding every video.

use crate::{get_json, to_json, ttl, CacheKey, CacheLookup, CacheResult, SharedCache};
use std::collections::BTreeSet;
use tracing::debug;
use video_core::{Video, VideoId};

/// Cache for the "all videos" listing
#[derive(Clone)]
pub struct VideoListCache {
    cache: SharedCache,
    ttl_secs: u64,
}

impl VideoListCache {
    pub fn new(cache: SharedCache) -> Self {
        Self::with_ttl(cache, ttl::VIDEO_LIST)
    }

    pub fn with_ttl(cache: SharedCache, ttl_secs: u64) -> Self {
        Self { cache, ttl_secs }
    }

    /// Cached list, in the order it was stored
    pub async fn get(&self) -> CacheResult<CacheLookup<Vec<Video>>> {
        get_json(self.cache.as_ref(), &CacheKey::all_videos()).await
    }

    /// Whether `video_id` is in the cached list.
    ///
    /// Consults only the id-set key. `Miss` means the set is not cached and
    /// membership is unknown; it is never reported as `Hit(false)`.
    pub async fn has_id(&self, video_id: VideoId) -> CacheResult<CacheLookup<bool>> {
        let ids: CacheLookup<BTreeSet<VideoId>> =
            get_json(self.cache.as_ref(), &CacheKey::all_video_ids()).await?;
        Ok(ids.map(|ids| ids.contains(&video_id)))
    }

    /// Store the list and its id set.
    ///
    /// Both keys go out in one pipeline with the list first, so if the write
    /// is cut short the list key is the one that landed.
    pub async fn set(&self, videos: &[Video]) -> CacheResult<()> {
        let ids: BTreeSet<VideoId> = videos.iter().map(|v| v.video_id).collect();
        let items = vec![
            (CacheKey::all_videos(), to_json(videos)?),
            (CacheKey::all_video_ids(), to_json(&ids)?),
        ];
        self.cache.pipeline_set(&items, self.ttl_secs).await?;

        debug!(count = videos.len(), "Cached video list");
        Ok(())
    }

    /// Evict both keys
    pub async fn clear(&self) -> CacheResult<()> {
        self.cache
            .pipeline_del(&[CacheKey::all_videos(), CacheKey::all_video_ids()])
            .await
    }
}
