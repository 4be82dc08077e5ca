//! Core video catalog data models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SEGMENT_DURATION, DEFAULT_SEGMENT_MEASURED_DURATION, MAX_EXTENSION_LENGTH,
    MAX_TITLE_LENGTH, UNKNOWN_SEGMENT_COUNT,
};
use crate::error::{ModelError, ModelResult};
use crate::representation::{DefaultRepresentations, Representation, RepresentationSlot};

/// Video primary key (BIGSERIAL)
pub type VideoId = i64;

/// Segment index within a video, assigned by the uploader
pub type SegmentId = i32;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )+
                    other => Err(ModelError::UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Delivery type of a video
    VideoType, "video type" {
        Vod => "VOD",
        Live => "LIVE",
    }
}

wire_enum! {
    /// Video ingestion lifecycle status
    VideoStatus, "video status" {
        Empty => "EMPTY",
        Uploading => "UPLOADING",
        Ok => "OK",
        Error => "ERROR",
    }
}

wire_enum! {
    /// Processing status of a segment, overall or for one representation
    SegmentStatus, "segment status" {
        Nil => "NIL",
        Processing => "PROCESSING",
        Ok => "OK",
        Error => "ERROR",
    }
}

impl Default for VideoType {
    fn default() -> Self {
        VideoType::Live
    }
}

impl Default for VideoStatus {
    fn default() -> Self {
        VideoStatus::Empty
    }
}

impl Default for SegmentStatus {
    fn default() -> Self {
        SegmentStatus::Nil
    }
}

/// Core video metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub video_id: VideoId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub video_type: VideoType,
    pub status: VideoStatus,
    pub segment_count: i32,
    pub segment_duration: i32,
    pub representation_1: Option<Representation>,
    pub representation_2: Option<Representation>,
    pub representation_3: Option<Representation>,
    pub uri_mpd: Option<String>,
    pub uri_m3u8: Option<String>,
    pub uri_thumbnail: Option<String>,
}

impl Video {
    /// Materialize a freshly inserted video. Store implementations supply
    /// the assigned id and creation time.
    pub fn create(
        video_id: VideoId,
        created_at: DateTime<Utc>,
        input: &NewVideo,
    ) -> ModelResult<Self> {
        input.validate()?;

        Ok(Self {
            video_id,
            title: input.title.clone(),
            created_at,
            video_type: input.video_type,
            status: VideoStatus::default(),
            segment_count: UNKNOWN_SEGMENT_COUNT,
            segment_duration: input.segment_duration.unwrap_or(DEFAULT_SEGMENT_DURATION),
            representation_1: input.representation_1.clone(),
            representation_2: input.representation_2.clone(),
            representation_3: input.representation_3.clone(),
            uri_mpd: None,
            uri_m3u8: None,
            uri_thumbnail: None,
        })
    }

    pub fn representation(&self, slot: RepresentationSlot) -> Option<&Representation> {
        match slot {
            RepresentationSlot::First => self.representation_1.as_ref(),
            RepresentationSlot::Second => self.representation_2.as_ref(),
            RepresentationSlot::Third => self.representation_3.as_ref(),
        }
    }

    /// Whether the total segment count has been resolved yet
    pub fn segment_count_known(&self) -> bool {
        self.segment_count != UNKNOWN_SEGMENT_COUNT
    }

    /// Public base URL for this video's assets. Derived, never persisted.
    pub fn base_url(&self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.video_id)
    }

    fn validate(&self) -> ModelResult<()> {
        validate_title(&self.title)?;
        if self.segment_count < UNKNOWN_SEGMENT_COUNT {
            return Err(ModelError::Validation(format!(
                "segment_count must be {UNKNOWN_SEGMENT_COUNT} or a non-negative count, got {}",
                self.segment_count
            )));
        }
        validate_segment_duration(self.segment_duration)
    }
}

/// One time-slice of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSegment {
    pub video_id: VideoId,
    pub segment_id: SegmentId,
    pub original_path: Option<String>,
    pub original_extension: String,
    pub status: SegmentStatus,
    pub duration: i32,
    pub representation_1_status: SegmentStatus,
    pub representation_2_status: SegmentStatus,
    pub representation_3_status: SegmentStatus,
    pub media_mpd: Option<String>,
    pub media_m3u8: Option<String>,
}

impl VideoSegment {
    pub fn create(input: &NewVideoSegment) -> ModelResult<Self> {
        input.validate()?;

        Ok(Self {
            video_id: input.video_id,
            segment_id: input.segment_id,
            original_path: input.original_path.clone(),
            original_extension: input.extension().to_string(),
            status: SegmentStatus::default(),
            duration: DEFAULT_SEGMENT_MEASURED_DURATION,
            representation_1_status: SegmentStatus::default(),
            representation_2_status: SegmentStatus::default(),
            representation_3_status: SegmentStatus::default(),
            media_mpd: None,
            media_m3u8: None,
        })
    }

    pub fn key(&self) -> (VideoId, SegmentId) {
        (self.video_id, self.segment_id)
    }

    pub fn representation_status(&self, slot: RepresentationSlot) -> SegmentStatus {
        match slot {
            RepresentationSlot::First => self.representation_1_status,
            RepresentationSlot::Second => self.representation_2_status,
            RepresentationSlot::Third => self.representation_3_status,
        }
    }

    /// Record one representation's status. The overall status and the other
    /// slots are left untouched.
    pub fn set_representation_status(&mut self, slot: RepresentationSlot, status: SegmentStatus) {
        match slot {
            RepresentationSlot::First => self.representation_1_status = status,
            RepresentationSlot::Second => self.representation_2_status = status,
            RepresentationSlot::Third => self.representation_3_status = status,
        }
    }
}

/// Request to create a new video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideo {
    pub title: String,
    #[serde(rename = "type", default)]
    pub video_type: VideoType,
    #[serde(default)]
    pub segment_duration: Option<i32>,
    #[serde(default)]
    pub representation_1: Option<Representation>,
    #[serde(default)]
    pub representation_2: Option<Representation>,
    #[serde(default)]
    pub representation_3: Option<Representation>,
}

impl NewVideo {
    /// A video with no representation slots filled
    pub fn new(title: impl Into<String>, video_type: VideoType) -> Self {
        Self {
            title: title.into(),
            video_type,
            segment_duration: None,
            representation_1: None,
            representation_2: None,
            representation_3: None,
        }
    }

    /// A video offering the standard high / medium / low tiers
    pub fn with_default_representations(title: impl Into<String>, video_type: VideoType) -> Self {
        Self {
            representation_1: Some(DefaultRepresentations::high()),
            representation_2: Some(DefaultRepresentations::medium()),
            representation_3: Some(DefaultRepresentations::low()),
            ..Self::new(title, video_type)
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        validate_title(&self.title)?;
        if let Some(duration) = self.segment_duration {
            validate_segment_duration(duration)?;
        }
        Ok(())
    }
}

/// Patch for an existing video. `None` leaves a field unchanged.
///
/// Representation slots take `Some(None)` to clear the slot.
#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub video_type: Option<VideoType>,
    pub status: Option<VideoStatus>,
    pub segment_count: Option<i32>,
    pub segment_duration: Option<i32>,
    pub representation_1: Option<Option<Representation>>,
    pub representation_2: Option<Option<Representation>>,
    pub representation_3: Option<Option<Representation>>,
    pub uri_mpd: Option<String>,
    pub uri_m3u8: Option<String>,
    pub uri_thumbnail: Option<String>,
}

impl UpdateVideo {
    /// Apply the patch. On error `video` is left as it was.
    pub fn apply(&self, video: &mut Video) -> ModelResult<()> {
        let mut patched = video.clone();

        if let Some(title) = &self.title {
            patched.title = title.clone();
        }
        if let Some(video_type) = self.video_type {
            patched.video_type = video_type;
        }
        if let Some(status) = self.status {
            patched.status = status;
        }
        if let Some(segment_count) = self.segment_count {
            patched.segment_count = segment_count;
        }
        if let Some(segment_duration) = self.segment_duration {
            patched.segment_duration = segment_duration;
        }
        if let Some(slot) = &self.representation_1 {
            patched.representation_1 = slot.clone();
        }
        if let Some(slot) = &self.representation_2 {
            patched.representation_2 = slot.clone();
        }
        if let Some(slot) = &self.representation_3 {
            patched.representation_3 = slot.clone();
        }
        if let Some(uri) = &self.uri_mpd {
            patched.uri_mpd = Some(uri.clone());
        }
        if let Some(uri) = &self.uri_m3u8 {
            patched.uri_m3u8 = Some(uri.clone());
        }
        if let Some(uri) = &self.uri_thumbnail {
            patched.uri_thumbnail = Some(uri.clone());
        }

        patched.validate()?;
        *video = patched;
        Ok(())
    }
}

/// Request to register a segment of an existing video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVideoSegment {
    pub video_id: VideoId,
    pub segment_id: SegmentId,
    #[serde(default)]
    pub original_path: Option<String>,
    pub original_extension: String,
}

impl NewVideoSegment {
    pub fn new(
        video_id: VideoId,
        segment_id: SegmentId,
        original_extension: impl Into<String>,
    ) -> Self {
        Self {
            video_id,
            segment_id,
            original_path: None,
            original_extension: original_extension.into(),
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.segment_id < 0 {
            return Err(ModelError::Validation(format!(
                "segment_id must not be negative, got {}",
                self.segment_id
            )));
        }
        let extension = self.extension();
        if extension.is_empty() {
            return Err(ModelError::Validation(
                "original_extension must not be empty".to_string(),
            ));
        }
        if extension.chars().count() > MAX_EXTENSION_LENGTH {
            return Err(ModelError::Validation(format!(
                "original_extension exceeds {MAX_EXTENSION_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Extension as stored, without surrounding whitespace
    pub fn extension(&self) -> &str {
        self.original_extension.trim()
    }
}

/// Patch for an existing segment. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateVideoSegment {
    pub original_path: Option<String>,
    pub status: Option<SegmentStatus>,
    pub duration: Option<i32>,
    pub representation_1_status: Option<SegmentStatus>,
    pub representation_2_status: Option<SegmentStatus>,
    pub representation_3_status: Option<SegmentStatus>,
    pub media_mpd: Option<String>,
    pub media_m3u8: Option<String>,
}

impl UpdateVideoSegment {
    /// Patch that only reports one representation's status
    pub fn representation_status(slot: RepresentationSlot, status: SegmentStatus) -> Self {
        let mut patch = Self::default();
        match slot {
            RepresentationSlot::First => patch.representation_1_status = Some(status),
            RepresentationSlot::Second => patch.representation_2_status = Some(status),
            RepresentationSlot::Third => patch.representation_3_status = Some(status),
        }
        patch
    }

    /// Apply the patch. On error `segment` is left as it was.
    pub fn apply(&self, segment: &mut VideoSegment) -> ModelResult<()> {
        if let Some(duration) = self.duration {
            if duration < 0 {
                return Err(ModelError::Validation(format!(
                    "duration must not be negative, got {duration}"
                )));
            }
        }

        if let Some(path) = &self.original_path {
            segment.original_path = Some(path.clone());
        }
        if let Some(status) = self.status {
            segment.status = status;
        }
        if let Some(duration) = self.duration {
            segment.duration = duration;
        }
        if let Some(status) = self.representation_1_status {
            segment.representation_1_status = status;
        }
        if let Some(status) = self.representation_2_status {
            segment.representation_2_status = status;
        }
        if let Some(status) = self.representation_3_status {
            segment.representation_3_status = status;
        }
        if let Some(media) = &self.media_mpd {
            segment.media_mpd = Some(media.clone());
        }
        if let Some(media) = &self.media_m3u8 {
            segment.media_m3u8 = Some(media.clone());
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> ModelResult<()> {
    if title.trim().is_empty() {
        return Err(ModelError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ModelError::Validation(format!(
            "title exceeds {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_segment_duration(duration: i32) -> ModelResult<()> {
    if duration <= 0 {
        return Err(ModelError::Validation(format!(
            "segment_duration must be positive, got {duration}"
        )));
    }
    Ok(())
}
