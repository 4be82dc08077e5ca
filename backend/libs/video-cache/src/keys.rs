//! Cache key schema
//!
//! Key format: v{VERSION}:{entity}:{identifier}

use video_core::VideoId;

/// Cache schema version - increment when changing key formats or payloads
pub const CACHE_VERSION: u32 = 1;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Full video list, newest first
    /// Format: v1:videos:all
    pub fn all_videos() -> String {
        format!("v{}:videos:all", CACHE_VERSION)
    }

    /// Ids of the videos in the cached list
    /// Format: v1:videos:ids
    pub fn all_video_ids() -> String {
        format!("v{}:videos:ids", CACHE_VERSION)
    }

    /// Segment list of one video
    /// Format: v1:segments:{video_id}
    pub fn video_segments(video_id: VideoId) -> String {
        format!("v{}:segments:{}", CACHE_VERSION, video_id)
    }

    /// Extract entity type from key
    pub fn entity_type(key: &str) -> Option<&str> {
        let mut parts = key.split(':');
        match (parts.next(), parts.next()) {
            (Some(_), Some(entity)) => Some(entity),
            _ => None,
        }
    }
}
