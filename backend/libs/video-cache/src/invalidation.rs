//! Mutation hook and the invalidation rule behind it
//!
//! Stores call [`MutationHook::on_data_changed`] once per affected record,
//! after the change is durable. [`CacheInvalidator`] is the hook that keeps
//! the list caches honest:
//!
//! ```text
//! any change            -> clear video list + id set
//! video deleted         -> clear that video's segment list
//! segment changed       -> clear the owning video's segment list
//! ```

use crate::{CacheResult, SegmentListCache, SharedCache, VideoListCache};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};
use video_core::{SegmentId, VideoId};

/// What happened to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Inserted => "inserted",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed change to a tracked record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChange {
    Video {
        video_id: VideoId,
        kind: ChangeKind,
    },
    Segment {
        video_id: VideoId,
        segment_id: SegmentId,
        kind: ChangeKind,
    },
}

impl DataChange {
    pub fn video(video_id: VideoId, kind: ChangeKind) -> Self {
        DataChange::Video { video_id, kind }
    }

    pub fn segment(video_id: VideoId, segment_id: SegmentId, kind: ChangeKind) -> Self {
        DataChange::Segment {
            video_id,
            segment_id,
            kind,
        }
    }

    /// Video the change belongs to
    pub fn video_id(&self) -> VideoId {
        match self {
            DataChange::Video { video_id, .. } | DataChange::Segment { video_id, .. } => *video_id,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            DataChange::Video { kind, .. } | DataChange::Segment { kind, .. } => *kind,
        }
    }

    /// Whether the owning video's segment list must be evicted
    pub fn clears_segment_list(&self) -> bool {
        match self {
            DataChange::Video { kind, .. } => *kind == ChangeKind::Deleted,
            DataChange::Segment { .. } => true,
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            DataChange::Video { .. } => "video",
            DataChange::Segment { .. } => "segment",
        }
    }
}

/// Called by a store after every committed insert, update or delete
#[async_trait::async_trait]
pub trait MutationHook: Send + Sync {
    async fn on_data_changed(&self, change: DataChange);
}

/// Hook that does nothing, for stores running without a cache
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

#[async_trait::async_trait]
impl MutationHook for NoopHook {
    async fn on_data_changed(&self, _change: DataChange) {}
}

/// Clears list caches in response to data changes
#[derive(Clone)]
pub struct CacheInvalidator {
    videos: VideoListCache,
    segments: SegmentListCache,
    failures: Arc<AtomicU64>,
}

impl CacheInvalidator {
    pub fn new(videos: VideoListCache, segments: SegmentListCache) -> Self {
        Self {
            videos,
            segments,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Invalidator over default-TTL caches on `cache`
    pub fn from_cache(cache: SharedCache) -> Self {
        Self::new(
            VideoListCache::new(cache.clone()),
            SegmentListCache::new(cache),
        )
    }

    /// Apply the invalidation rule for one change.
    ///
    /// Both clears are attempted even if the first fails; the first error
    /// is returned.
    pub async fn invalidate(&self, change: DataChange) -> CacheResult<()> {
        let video_list = self.videos.clear().await;

        let segment_list = if change.clears_segment_list() {
            self.segments.clear(change.video_id()).await
        } else {
            Ok(())
        };

        debug!(
            entity = change.entity(),
            video_id = change.video_id(),
            kind = %change.kind(),
            segments_cleared = change.clears_segment_list(),
            "Invalidated list caches"
        );

        video_list.and(segment_list)
    }

    /// Number of invalidations that failed since construction
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl MutationHook for CacheInvalidator {
    async fn on_data_changed(&self, change: DataChange) {
        if let Err(e) = self.invalidate(change).await {
            self.failures.fetch_add(1, Ordering::Relaxed);
            error!(
                entity = change.entity(),
                video_id = change.video_id(),
                kind = %change.kind(),
                error = %e,
                "Cache invalidation failed; entries will expire by TTL"
            );
        }
    }
}
