//! Video catalog constants

/// `segment_count` value for a video whose segment total is not known yet.
/// The count only becomes available once every segment has been uploaded.
pub const UNKNOWN_SEGMENT_COUNT: i32 = -1;

/// Target segment duration in milliseconds
pub const DEFAULT_SEGMENT_DURATION: i32 = 3000;

/// Duration recorded for a segment that has not been measured yet
pub const DEFAULT_SEGMENT_MEASURED_DURATION: i32 = 0;

/// Prefix used to derive a video's public base URL
pub const DEFAULT_BASE_URL_VIDEOS: &str = "http://localhost:5000/videos";

/// Maximum length of a video title (column is VARCHAR(255))
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length of an original file extension (column is VARCHAR(50))
pub const MAX_EXTENSION_LENGTH: usize = 50;

/// Maximum length of a representation name (column is VARCHAR(64))
pub const MAX_REPRESENTATION_NAME_LENGTH: usize = 64;
