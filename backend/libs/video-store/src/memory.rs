//! In-process video store

use crate::{notify_video_deleted, StoreError, StoreResult, VideoStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use video_cache::{ChangeKind, DataChange, MutationHook, NoopHook};
use video_core::{
    NewVideo, NewVideoSegment, SegmentId, UpdateVideo, UpdateVideoSegment, Video, VideoId,
    VideoSegment,
};

#[derive(Default)]
struct Tables {
    next_video_id: VideoId,
    videos: BTreeMap<VideoId, Video>,
    segments: BTreeMap<(VideoId, SegmentId), VideoSegment>,
}

/// Video store backed by in-memory tables.
///
/// Writes are serialized by one write lock; the hook runs after the lock is
/// released so it can read the store again.
#[derive(Clone)]
pub struct MemoryVideoStore {
    tables: Arc<RwLock<Tables>>,
    hook: Arc<dyn MutationHook>,
}

impl Default for MemoryVideoStore {
    fn default() -> Self {
        Self::new(Arc::new(NoopHook))
    }
}

impl MemoryVideoStore {
    pub fn new(hook: Arc<dyn MutationHook>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            hook,
        }
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn get_video(&self, video_id: VideoId) -> StoreResult<Option<Video>> {
        Ok(self.tables.read().await.videos.get(&video_id).cloned())
    }

    async fn list_videos_by_created_desc(&self) -> StoreResult<Vec<Video>> {
        let tables = self.tables.read().await;
        let mut videos: Vec<Video> = tables.videos.values().cloned().collect();
        videos.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.video_id.cmp(&a.video_id))
        });
        Ok(videos)
    }

    async fn get_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
    ) -> StoreResult<Option<VideoSegment>> {
        let tables = self.tables.read().await;
        Ok(tables.segments.get(&(video_id, segment_id)).cloned())
    }

    async fn list_segments(&self, video_id: VideoId) -> StoreResult<Vec<VideoSegment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .segments
            .range((video_id, SegmentId::MIN)..=(video_id, SegmentId::MAX))
            .map(|(_, segment)| segment.clone())
            .collect())
    }

    async fn insert_video(&self, input: NewVideo) -> StoreResult<Video> {
        let video = {
            let mut tables = self.tables.write().await;
            let video = Video::create(tables.next_video_id + 1, Utc::now(), &input)?;
            tables.next_video_id = video.video_id;
            tables.videos.insert(video.video_id, video.clone());
            video
        };

        info!(video_id = video.video_id, title = %video.title, "Video inserted");
        self.hook
            .on_data_changed(DataChange::video(video.video_id, ChangeKind::Inserted))
            .await;
        Ok(video)
    }

    async fn update_video(&self, video_id: VideoId, patch: UpdateVideo) -> StoreResult<Video> {
        let video = {
            let mut tables = self.tables.write().await;
            let video = tables
                .videos
                .get_mut(&video_id)
                .ok_or_else(|| StoreError::video_not_found(video_id))?;
            patch.apply(video)?;
            video.clone()
        };

        info!(video_id, status = %video.status, "Video updated");
        self.hook
            .on_data_changed(DataChange::video(video_id, ChangeKind::Updated))
            .await;
        Ok(video)
    }

    async fn delete_video(&self, video_id: VideoId) -> StoreResult<usize> {
        let segment_ids: Vec<SegmentId> = {
            let mut tables = self.tables.write().await;
            if tables.videos.remove(&video_id).is_none() {
                return Err(StoreError::video_not_found(video_id));
            }
            let keys: Vec<(VideoId, SegmentId)> = tables
                .segments
                .range((video_id, SegmentId::MIN)..=(video_id, SegmentId::MAX))
                .map(|(key, _)| *key)
                .collect();
            for key in &keys {
                tables.segments.remove(key);
            }
            keys.into_iter().map(|(_, segment_id)| segment_id).collect()
        };

        info!(video_id, segments = segment_ids.len(), "Video deleted");
        notify_video_deleted(self.hook.as_ref(), video_id, &segment_ids).await;
        Ok(segment_ids.len())
    }

    async fn insert_segment(&self, input: NewVideoSegment) -> StoreResult<VideoSegment> {
        let segment = {
            let mut tables = self.tables.write().await;
            if !tables.videos.contains_key(&input.video_id) {
                return Err(StoreError::ReferentialIntegrity {
                    video_id: input.video_id,
                });
            }
            if tables
                .segments
                .contains_key(&(input.video_id, input.segment_id))
            {
                return Err(StoreError::DuplicateSegment {
                    video_id: input.video_id,
                    segment_id: input.segment_id,
                });
            }
            let segment = VideoSegment::create(&input)?;
            tables.segments.insert(segment.key(), segment.clone());
            segment
        };

        info!(
            video_id = segment.video_id,
            segment_id = segment.segment_id,
            "Segment inserted"
        );
        self.hook
            .on_data_changed(DataChange::segment(
                segment.video_id,
                segment.segment_id,
                ChangeKind::Inserted,
            ))
            .await;
        Ok(segment)
    }

    async fn update_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
        patch: UpdateVideoSegment,
    ) -> StoreResult<VideoSegment> {
        let segment = {
            let mut tables = self.tables.write().await;
            if !tables.videos.contains_key(&video_id) {
                return Err(StoreError::ReferentialIntegrity { video_id });
            }
            let segment = tables
                .segments
                .get_mut(&(video_id, segment_id))
                .ok_or_else(|| StoreError::segment_not_found(video_id, segment_id))?;
            patch.apply(segment)?;
            segment.clone()
        };

        info!(video_id, segment_id, status = %segment.status, "Segment updated");
        self.hook
            .on_data_changed(DataChange::segment(
                video_id,
                segment_id,
                ChangeKind::Updated,
            ))
            .await;
        Ok(segment)
    }

    async fn delete_segment(&self, video_id: VideoId, segment_id: SegmentId) -> StoreResult<()> {
        {
            let mut tables = self.tables.write().await;
            if tables.segments.remove(&(video_id, segment_id)).is_none() {
                if !tables.videos.contains_key(&video_id) {
                    return Err(StoreError::ReferentialIntegrity { video_id });
                }
                return Err(StoreError::segment_not_found(video_id, segment_id));
            }
        }

        info!(video_id, segment_id, "Segment deleted");
        self.hook
            .on_data_changed(DataChange::segment(
                video_id,
                segment_id,
                ChangeKind::Deleted,
            ))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use video_core::{RepresentationSlot, SegmentStatus, VideoStatus, VideoType};

    #[tokio::test]
    async fn test_ids_are_assigned_sequentially() {
        let store = MemoryVideoStore::default();
        let first = store.insert_video(NewVideo::new("a", VideoType::Vod)).await.unwrap();
        let second = store.insert_video(NewVideo::new("b", VideoType::Live)).await.unwrap();
        assert_eq!(first.video_id, 1);
        assert_eq!(second.video_id, 2);
        assert_eq!(first.status, VideoStatus::Empty);
        assert_eq!(first.segment_count, -1);
    }

    #[tokio::test]
    async fn test_list_videos_ties_break_by_id_desc() {
        let store = MemoryVideoStore::default();
        for title in ["a", "b", "c"] {
            store.insert_video(NewVideo::new(title, VideoType::Vod)).await.unwrap();
        }
        {
            let mut tables = store.tables.write().await;
            let stamp = Utc::now();
            for video in tables.videos.values_mut() {
                video.created_at = stamp;
            }
        }

        let ids: Vec<VideoId> = store
            .list_videos_by_created_desc()
            .await
            .unwrap()
            .iter()
            .map(|v| v.video_id)
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_list_segments_is_scoped_and_ordered() {
        let store = MemoryVideoStore::default();
        let a = store.insert_video(NewVideo::new("a", VideoType::Vod)).await.unwrap();
        let b = store.insert_video(NewVideo::new("b", VideoType::Vod)).await.unwrap();
        for segment_id in [2, 0, 1] {
            store
                .insert_segment(NewVideoSegment::new(a.video_id, segment_id, "mp4"))
                .await
                .unwrap();
        }
        store
            .insert_segment(NewVideoSegment::new(b.video_id, 0, "mp4"))
            .await
            .unwrap();

        let ids: Vec<SegmentId> = store
            .list_segments(a.video_id)
            .await
            .unwrap()
            .iter()
            .map(|s| s.segment_id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(store.list_segments(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_segment_status() {
        let store = MemoryVideoStore::default();
        let video = store.insert_video(NewVideo::new("a", VideoType::Vod)).await.unwrap();
        store
            .insert_segment(NewVideoSegment::new(video.video_id, 0, "mp4"))
            .await
            .unwrap();

        let segment = store
            .update_segment(
                video.video_id,
                0,
                UpdateVideoSegment::representation_status(
                    RepresentationSlot::Second,
                    SegmentStatus::Ok,
                ),
            )
            .await
            .unwrap();
        assert_eq!(segment.representation_2_status, SegmentStatus::Ok);
        assert_eq!(segment.status, SegmentStatus::Nil);
        assert_eq!(
            store.get_segment(video.video_id, 0).await.unwrap(),
            Some(segment)
        );
    }

    #[tokio::test]
    async fn test_invalid_patch_leaves_record_unchanged() {
        let store = MemoryVideoStore::default();
        let video = store.insert_video(NewVideo::new("a", VideoType::Vod)).await.unwrap();

        let patch = UpdateVideo {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        let err = store.update_video(video.video_id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Model(_)));
        assert_eq!(store.get_video(video.video_id).await.unwrap(), Some(video));
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryVideoStore::default();
        assert!(store.get_video(42).await.unwrap().is_none());
        assert!(store.get_segment(42, 0).await.unwrap().is_none());
        assert!(store
            .update_video(42, UpdateVideo::default())
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.delete_video(42).await.unwrap_err().is_not_found());
        assert!(matches!(
            store.delete_segment(42, 0).await.unwrap_err(),
            StoreError::ReferentialIntegrity { video_id: 42 }
        ));
    }
}
