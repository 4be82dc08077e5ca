//! Read-through catalog
//!
//! List reads consult the cache first and repopulate it from the store on a
//! miss. Writes go straight to the store, whose mutation hook clears the
//! affected lists. A cache that errors is logged and bypassed; the store
//! always has the final word.

use crate::error::{AppError, Result};
use std::sync::Arc;
use tracing::{debug, warn};
use video_cache::{CacheLookup, SegmentListCache, SharedCache, VideoListCache};
use video_core::{
    NewVideo, NewVideoSegment, SegmentId, UpdateVideo, UpdateVideoSegment, Video, VideoId,
    VideoSegment, VideoSegmentView, VideoView,
};
use video_store::VideoStore;

/// Totals from a cache warmup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupSummary {
    pub videos: usize,
    pub segments: usize,
}

#[derive(Clone)]
pub struct VideoCatalog {
    store: Arc<dyn VideoStore>,
    videos: VideoListCache,
    segments: SegmentListCache,
    base_url_videos: String,
}

impl VideoCatalog {
    pub fn new(
        store: Arc<dyn VideoStore>,
        cache: SharedCache,
        ttl_secs: u64,
        base_url_videos: impl Into<String>,
    ) -> Self {
        Self {
            store,
            videos: VideoListCache::with_ttl(cache.clone(), ttl_secs),
            segments: SegmentListCache::with_ttl(cache, ttl_secs),
            base_url_videos: base_url_videos.into(),
        }
    }

    /// All videos, newest first
    pub async fn list_videos(&self) -> Result<Vec<Video>> {
        match self.videos.get().await {
            Ok(CacheLookup::Hit(videos)) => return Ok(videos),
            Ok(CacheLookup::Miss) => {}
            Err(e) => warn!(error = %e, "Video list cache read failed, using store"),
        }

        let videos = self.store.list_videos_by_created_desc().await?;
        if let Err(e) = self.videos.set(&videos).await {
            warn!(error = %e, "Failed to cache video list");
        }
        debug!(count = videos.len(), "Video list loaded from store");
        Ok(videos)
    }

    pub async fn list_video_views(&self) -> Result<Vec<VideoView>> {
        Ok(self.list_videos().await?.iter().map(VideoView::from).collect())
    }

    /// Membership check against the cached id set. On a miss the list is
    /// reloaded (and cached) rather than reporting "absent".
    pub async fn video_exists(&self, video_id: VideoId) -> Result<bool> {
        match self.videos.has_id(video_id).await {
            Ok(CacheLookup::Hit(exists)) => return Ok(exists),
            Ok(CacheLookup::Miss) => {}
            Err(e) => warn!(video_id, error = %e, "Video id cache read failed, using store"),
        }

        let videos = self.list_videos().await?;
        Ok(videos.iter().any(|v| v.video_id == video_id))
    }

    pub async fn get_video(&self, video_id: VideoId) -> Result<Video> {
        self.store
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {video_id} doesn't exist")))
    }

    /// Public base URL of a video's assets
    pub fn video_base_url(&self, video: &Video) -> String {
        video.base_url(&self.base_url_videos)
    }

    /// Segments of one video, by ascending segment id
    pub async fn list_segments(&self, video_id: VideoId) -> Result<Vec<VideoSegment>> {
        match self.segments.get(video_id).await {
            Ok(CacheLookup::Hit(segments)) => return Ok(segments),
            Ok(CacheLookup::Miss) => {}
            Err(e) => warn!(video_id, error = %e, "Segment list cache read failed, using store"),
        }

        let segments = self.store.list_segments(video_id).await?;
        if let Err(e) = self.segments.set(video_id, &segments).await {
            warn!(video_id, error = %e, "Failed to cache segment list");
        }
        Ok(segments)
    }

    pub async fn list_segment_views(&self, video_id: VideoId) -> Result<Vec<VideoSegmentView>> {
        Ok(self
            .list_segments(video_id)
            .await?
            .iter()
            .map(VideoSegmentView::from)
            .collect())
    }

    pub async fn get_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
    ) -> Result<VideoSegment> {
        self.store
            .get_segment(video_id, segment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Segment ({video_id}, {segment_id}) doesn't exist"))
            })
    }

    pub async fn create_video(&self, input: NewVideo) -> Result<Video> {
        Ok(self.store.insert_video(input).await?)
    }

    pub async fn update_video(&self, video_id: VideoId, patch: UpdateVideo) -> Result<Video> {
        Ok(self.store.update_video(video_id, patch).await?)
    }

    /// Delete a video with its segments; returns the number of segments removed
    pub async fn delete_video(&self, video_id: VideoId) -> Result<usize> {
        Ok(self.store.delete_video(video_id).await?)
    }

    pub async fn register_segment(&self, input: NewVideoSegment) -> Result<VideoSegment> {
        Ok(self.store.insert_segment(input).await?)
    }

    pub async fn update_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
        patch: UpdateVideoSegment,
    ) -> Result<VideoSegment> {
        Ok(self.store.update_segment(video_id, segment_id, patch).await?)
    }

    pub async fn delete_segment(&self, video_id: VideoId, segment_id: SegmentId) -> Result<()> {
        Ok(self.store.delete_segment(video_id, segment_id).await?)
    }

    /// Load the video list and every video's segment list into the cache
    pub async fn warm(&self) -> Result<WarmupSummary> {
        let videos = self.store.list_videos_by_created_desc().await?;
        self.videos.set(&videos).await?;

        let mut summary = WarmupSummary {
            videos: videos.len(),
            segments: 0,
        };
        for video in &videos {
            let segments = self.store.list_segments(video.video_id).await?;
            self.segments.set(video.video_id, &segments).await?;
            summary.segments += segments.len();
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap;
    use video_core::VideoType;

    #[tokio::test]
    async fn test_get_video_not_found() {
        let catalog = bootstrap::in_memory(300, "http://localhost:5000/videos");
        let err = catalog.get_video(404).await.unwrap_err();
        assert_eq!(err.to_string(), "Not found: Video 404 doesn't exist");
        assert!(matches!(
            catalog.get_segment(404, 0).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_video_base_url() {
        let catalog = bootstrap::in_memory(300, "https://cdn.example.com/videos/");
        let video = catalog
            .create_video(NewVideo::new("demo", VideoType::Vod))
            .await
            .unwrap();
        assert_eq!(
            catalog.video_base_url(&video),
            format!("https://cdn.example.com/videos/{}", video.video_id)
        );
    }

    #[tokio::test]
    async fn test_warm_counts() {
        let catalog = bootstrap::in_memory(300, "http://localhost:5000/videos");
        for title in ["a", "b"] {
            let video = catalog
                .create_video(NewVideo::new(title, VideoType::Vod))
                .await
                .unwrap();
            for segment_id in 0..3 {
                catalog
                    .register_segment(NewVideoSegment::new(video.video_id, segment_id, "mp4"))
                    .await
                    .unwrap();
            }
        }

        let summary = catalog.warm().await.unwrap();
        assert_eq!(summary, WarmupSummary { videos: 2, segments: 6 });
        assert!(catalog.videos.get().await.unwrap().is_hit());
    }
}
