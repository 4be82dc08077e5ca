//! Read-through behaviour of the catalog

use async_trait::async_trait;
use catalog_service::{AppError, VideoCatalog};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use video_cache::{
    CacheError, CacheInvalidator, CacheOperations, CacheResult, MemoryCache, SharedCache,
};
use video_core::{
    NewVideo, NewVideoSegment, RepresentationSlot, SegmentId, SegmentStatus, UpdateVideo,
    UpdateVideoSegment, Video, VideoId, VideoSegment, VideoStatus, VideoType,
};
use video_store::{MemoryVideoStore, StoreResult, VideoStore};

const BASE_URL: &str = "http://localhost:5000/videos";

/// Store wrapper counting list queries
struct CountingStore {
    inner: MemoryVideoStore,
    video_lists: AtomicUsize,
    segment_lists: AtomicUsize,
}

impl CountingStore {
    fn video_lists(&self) -> usize {
        self.video_lists.load(Ordering::SeqCst)
    }

    fn segment_lists(&self) -> usize {
        self.segment_lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoStore for CountingStore {
    async fn get_video(&self, video_id: VideoId) -> StoreResult<Option<Video>> {
        self.inner.get_video(video_id).await
    }

    async fn list_videos_by_created_desc(&self) -> StoreResult<Vec<Video>> {
        self.video_lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_videos_by_created_desc().await
    }

    async fn get_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
    ) -> StoreResult<Option<VideoSegment>> {
        self.inner.get_segment(video_id, segment_id).await
    }

    async fn list_segments(&self, video_id: VideoId) -> StoreResult<Vec<VideoSegment>> {
        self.segment_lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_segments(video_id).await
    }

    async fn insert_video(&self, input: NewVideo) -> StoreResult<Video> {
        self.inner.insert_video(input).await
    }

    async fn update_video(&self, video_id: VideoId, patch: UpdateVideo) -> StoreResult<Video> {
        self.inner.update_video(video_id, patch).await
    }

    async fn delete_video(&self, video_id: VideoId) -> StoreResult<usize> {
        self.inner.delete_video(video_id).await
    }

    async fn insert_segment(&self, input: NewVideoSegment) -> StoreResult<VideoSegment> {
        self.inner.insert_segment(input).await
    }

    async fn update_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
        patch: UpdateVideoSegment,
    ) -> StoreResult<VideoSegment> {
        self.inner.update_segment(video_id, segment_id, patch).await
    }

    async fn delete_segment(&self, video_id: VideoId, segment_id: SegmentId) -> StoreResult<()> {
        self.inner.delete_segment(video_id, segment_id).await
    }
}

/// Cache backend that is always down
struct UnavailableCache;

#[async_trait]
impl CacheOperations for UnavailableCache {
    async fn get_raw(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::InvalidData("cache unavailable".to_string()))
    }

    async fn set_raw(&self, _key: &str, _payload: String, _ttl_secs: u64) -> CacheResult<()> {
        Err(CacheError::InvalidData("cache unavailable".to_string()))
    }

    async fn del(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::InvalidData("cache unavailable".to_string()))
    }

    async fn pipeline_set(&self, _items: &[(String, String)], _ttl_secs: u64) -> CacheResult<()> {
        Err(CacheError::InvalidData("cache unavailable".to_string()))
    }

    async fn pipeline_del(&self, _keys: &[String]) -> CacheResult<()> {
        Err(CacheError::InvalidData("cache unavailable".to_string()))
    }
}

fn counting_catalog(cache: SharedCache) -> (VideoCatalog, Arc<CountingStore>, CacheInvalidator) {
    let invalidator = CacheInvalidator::from_cache(cache.clone());
    let store = Arc::new(CountingStore {
        inner: MemoryVideoStore::new(Arc::new(invalidator.clone())),
        video_lists: AtomicUsize::new(0),
        segment_lists: AtomicUsize::new(0),
    });
    let catalog = VideoCatalog::new(store.clone(), cache, 300, BASE_URL);
    (catalog, store, invalidator)
}

#[tokio::test]
async fn test_second_list_is_served_from_cache() {
    let (catalog, store, _) = counting_catalog(Arc::new(MemoryCache::new()));
    catalog
        .create_video(NewVideo::new("first", VideoType::Vod))
        .await
        .unwrap();

    let first = catalog.list_videos().await.unwrap();
    let second = catalog.list_videos().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.video_lists(), 1);

    catalog
        .create_video(NewVideo::new("second", VideoType::Vod))
        .await
        .unwrap();
    let third = catalog.list_videos().await.unwrap();
    assert_eq!(store.video_lists(), 2);
    assert_eq!(third.len(), 2);
    assert_eq!(third[0].title, "second");
}

#[tokio::test]
async fn test_video_views_expose_representation_names() {
    let (catalog, store, _) = counting_catalog(Arc::new(MemoryCache::new()));
    let video = catalog
        .create_video(NewVideo::with_default_representations("demo", VideoType::Vod))
        .await
        .unwrap();
    catalog
        .update_video(
            video.video_id,
            UpdateVideo {
                representation_3: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let views = catalog.list_video_views().await.unwrap();
    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.video_id, video.video_id);
    assert_eq!(view.status, VideoStatus::Empty);
    assert_eq!(
        view.representation_1_id.as_deref(),
        video.representation(RepresentationSlot::First).map(|r| r.name())
    );
    assert!(view.representation_2_id.is_some());
    assert!(view.representation_3_id.is_none());

    catalog.list_video_views().await.unwrap();
    assert_eq!(store.video_lists(), 1);
}

#[tokio::test]
async fn test_segment_update_refreshes_segment_list() {
    let (catalog, store, _) = counting_catalog(Arc::new(MemoryCache::new()));
    let video = catalog
        .create_video(NewVideo::with_default_representations("demo", VideoType::Vod))
        .await
        .unwrap();
    catalog
        .register_segment(NewVideoSegment::new(video.video_id, 0, "mp4"))
        .await
        .unwrap();

    let before = catalog.list_segment_views(video.video_id).await.unwrap();
    assert_eq!(before[0].representation_1_status, SegmentStatus::Nil);
    catalog.list_segments(video.video_id).await.unwrap();
    assert_eq!(store.segment_lists(), 1);

    catalog
        .update_segment(
            video.video_id,
            0,
            UpdateVideoSegment::representation_status(RepresentationSlot::First, SegmentStatus::Ok),
        )
        .await
        .unwrap();

    let after = catalog.list_segment_views(video.video_id).await.unwrap();
    assert_eq!(after[0].representation_1_status, SegmentStatus::Ok);
    assert_eq!(store.segment_lists(), 2);
}

#[tokio::test]
async fn test_video_exists_repopulates_on_miss() {
    let (catalog, store, _) = counting_catalog(Arc::new(MemoryCache::new()));
    let video = catalog
        .create_video(NewVideo::new("demo", VideoType::Live))
        .await
        .unwrap();

    assert!(catalog.video_exists(video.video_id).await.unwrap());
    assert_eq!(store.video_lists(), 1);

    assert!(!catalog.video_exists(video.video_id + 1).await.unwrap());
    assert_eq!(store.video_lists(), 1);
}

#[tokio::test]
async fn test_delete_video_empties_segment_list() {
    let (catalog, _, invalidator) = counting_catalog(Arc::new(MemoryCache::new()));
    let video = catalog
        .create_video(NewVideo::new("demo", VideoType::Vod))
        .await
        .unwrap();
    for segment_id in 0..3 {
        catalog
            .register_segment(NewVideoSegment::new(video.video_id, segment_id, "mp4"))
            .await
            .unwrap();
    }
    assert_eq!(catalog.list_segments(video.video_id).await.unwrap().len(), 3);

    assert_eq!(catalog.delete_video(video.video_id).await.unwrap(), 3);
    assert!(catalog.list_segments(video.video_id).await.unwrap().is_empty());
    assert!(!catalog.video_exists(video.video_id).await.unwrap());
    assert_eq!(invalidator.failures(), 0);
}

#[tokio::test]
async fn test_unavailable_cache_is_bypassed() {
    let (catalog, store, invalidator) = counting_catalog(Arc::new(UnavailableCache));

    let video = catalog
        .create_video(NewVideo::new("demo", VideoType::Vod))
        .await
        .unwrap();
    assert_eq!(invalidator.failures(), 1);

    let updated = catalog
        .update_video(
            video.video_id,
            UpdateVideo {
                status: Some(VideoStatus::Uploading),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, VideoStatus::Uploading);

    assert_eq!(catalog.list_videos().await.unwrap().len(), 1);
    assert_eq!(catalog.list_videos().await.unwrap().len(), 1);
    assert_eq!(store.video_lists(), 2);
    assert!(catalog.video_exists(video.video_id).await.unwrap());
}

#[tokio::test]
async fn test_store_errors_surface() {
    let (catalog, _, _) = counting_catalog(Arc::new(MemoryCache::new()));

    let err = catalog
        .register_segment(NewVideoSegment::new(77, 0, "mp4"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = catalog
        .update_video(77, UpdateVideo::default())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let video = catalog
        .create_video(NewVideo::new("demo", VideoType::Vod))
        .await
        .unwrap();
    catalog
        .register_segment(NewVideoSegment::new(video.video_id, 0, "mp4"))
        .await
        .unwrap();
    let err = catalog
        .register_segment(NewVideoSegment::new(video.video_id, 0, "mp4"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test(start_paused = true)]
async fn test_list_reloads_after_ttl() {
    let (catalog, store, _) = counting_catalog(Arc::new(MemoryCache::new()));
    catalog
        .create_video(NewVideo::new("demo", VideoType::Vod))
        .await
        .unwrap();

    catalog.list_videos().await.unwrap();
    tokio::time::advance(Duration::from_secs(301)).await;
    catalog.list_videos().await.unwrap();
    assert_eq!(store.video_lists(), 2);
}
