//! Read shapes handed to the resource layer

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{SegmentId, SegmentStatus, Video, VideoId, VideoSegment, VideoStatus, VideoType};
use crate::representation::RepresentationSlot;

/// Externally visible video fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoView {
    pub video_id: VideoId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub video_type: VideoType,
    pub status: VideoStatus,
    pub segment_count: i32,
    pub segment_duration: i32,
    /// Representation name of slot 1, absent when the tier is not offered
    pub representation_1_id: Option<String>,
    pub representation_2_id: Option<String>,
    pub representation_3_id: Option<String>,
    pub uri_mpd: Option<String>,
    pub uri_m3u8: Option<String>,
}

impl From<&Video> for VideoView {
    fn from(video: &Video) -> Self {
        let representation_id =
            |slot: RepresentationSlot| video.representation(slot).map(|r| r.name().to_string());

        Self {
            video_id: video.video_id,
            title: video.title.clone(),
            created_at: video.created_at,
            video_type: video.video_type,
            status: video.status,
            segment_count: video.segment_count,
            segment_duration: video.segment_duration,
            representation_1_id: representation_id(RepresentationSlot::First),
            representation_2_id: representation_id(RepresentationSlot::Second),
            representation_3_id: representation_id(RepresentationSlot::Third),
            uri_mpd: video.uri_mpd.clone(),
            uri_m3u8: video.uri_m3u8.clone(),
        }
    }
}

/// Externally visible segment fields. The playlist URIs carry the
/// segment's media fragment names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoSegmentView {
    pub segment_id: SegmentId,
    pub video_id: VideoId,
    pub representation_1_status: SegmentStatus,
    pub representation_2_status: SegmentStatus,
    pub representation_3_status: SegmentStatus,
    pub uri_mpd: Option<String>,
    pub uri_m3u8: Option<String>,
}

impl From<&VideoSegment> for VideoSegmentView {
    fn from(segment: &VideoSegment) -> Self {
        Self {
            segment_id: segment.segment_id,
            video_id: segment.video_id,
            representation_1_status: segment.representation_1_status,
            representation_2_status: segment.representation_2_status,
            representation_3_status: segment.representation_3_status,
            uri_mpd: segment.media_mpd.clone(),
            uri_m3u8: segment.media_m3u8.clone(),
        }
    }
}
