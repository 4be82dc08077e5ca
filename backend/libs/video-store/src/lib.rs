//! Authoritative store for videos and their segments
//!
//! Every write calls the injected [`MutationHook`] once per affected record,
//! strictly after the change is durable. Rejected writes never reach the hook.
//! Deleting a video cascades to its segments and reports each of them.
//!
//! Two implementations share the same contract:
//! - [`MemoryVideoStore`]: process-local tables, for tests and tooling
//! - [`PgVideoStore`]: PostgreSQL via sqlx, one transaction per write

use async_trait::async_trait;
use video_core::{
    NewVideo, NewVideoSegment, SegmentId, UpdateVideo, UpdateVideoSegment, Video, VideoId,
    VideoSegment,
};

mod error;
mod memory;
mod postgres;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryVideoStore;
pub use postgres::PgVideoStore;
pub use video_cache::{ChangeKind, DataChange, MutationHook, NoopHook};

/// Video store interface
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_video(&self, video_id: VideoId) -> StoreResult<Option<Video>>;

    /// All videos, newest first; equal timestamps order by id descending
    async fn list_videos_by_created_desc(&self) -> StoreResult<Vec<Video>>;

    async fn get_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
    ) -> StoreResult<Option<VideoSegment>>;

    /// Segments of one video by ascending `segment_id`; empty for an
    /// unknown video
    async fn list_segments(&self, video_id: VideoId) -> StoreResult<Vec<VideoSegment>>;

    /// Insert a video; the store assigns its id and creation time
    async fn insert_video(&self, input: NewVideo) -> StoreResult<Video>;

    async fn update_video(&self, video_id: VideoId, patch: UpdateVideo) -> StoreResult<Video>;

    /// Delete a video and all of its segments, returning how many segments
    /// went with it
    async fn delete_video(&self, video_id: VideoId) -> StoreResult<usize>;

    async fn insert_segment(&self, input: NewVideoSegment) -> StoreResult<VideoSegment>;

    async fn update_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
        patch: UpdateVideoSegment,
    ) -> StoreResult<VideoSegment>;

    async fn delete_segment(&self, video_id: VideoId, segment_id: SegmentId) -> StoreResult<()>;
}

/// Fire `hook` for a cascade delete: every removed segment, then the video
pub(crate) async fn notify_video_deleted(
    hook: &dyn MutationHook,
    video_id: VideoId,
    segment_ids: &[SegmentId],
) {
    for &segment_id in segment_ids {
        hook.on_data_changed(DataChange::segment(video_id, segment_id, ChangeKind::Deleted))
            .await;
    }
    hook.on_data_changed(DataChange::video(video_id, ChangeKind::Deleted))
        .await;
}
