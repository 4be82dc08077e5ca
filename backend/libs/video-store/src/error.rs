//! Error types for the video store

use thiserror::Error;
use video_core::{ModelError, SegmentId, VideoId};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by [`crate::VideoStore`] writes and lookups
#[derive(Error, Debug)]
pub enum StoreError {
    /// Update or delete targeted a record that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Segment write referencing a video that does not exist
    #[error("video {video_id} does not exist")]
    ReferentialIntegrity { video_id: VideoId },

    /// A segment with this key is already registered
    #[error("segment ({video_id}, {segment_id}) already exists")]
    DuplicateSegment {
        video_id: VideoId,
        segment_id: SegmentId,
    },

    /// Record failed model validation
    #[error("Invalid record: {0}")]
    Model(#[from] ModelError),

    /// Database operation failed (connection, query execution, etc.)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn video_not_found(video_id: VideoId) -> Self {
        StoreError::NotFound {
            entity: "video",
            id: video_id.to_string(),
        }
    }

    pub fn segment_not_found(video_id: VideoId, segment_id: SegmentId) -> Self {
        StoreError::NotFound {
            entity: "segment",
            id: format!("{video_id}/{segment_id}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if error is transient (caller may retry)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}
