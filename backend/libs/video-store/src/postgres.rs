//! PostgreSQL video store
//!
//! Tables `cs_videos` / `cs_segments` (see `migrations/`). Status columns are
//! TEXT holding the wire names; representation slots are four nullable
//! columns each.

use crate::{notify_video_deleted, StoreError, StoreResult, VideoStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info};
use video_cache::{ChangeKind, DataChange, MutationHook};
use video_core::{
    ModelError, NewVideo, NewVideoSegment, Representation, SegmentId, UpdateVideo,
    UpdateVideoSegment, Video, VideoId, VideoSegment,
};

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

macro_rules! video_columns {
    () => {
        "video_id, title, created_at, video_type, status, segment_count, segment_duration,
         representation_1_name, representation_1_bandwidth,
         representation_1_width, representation_1_height,
         representation_2_name, representation_2_bandwidth,
         representation_2_width, representation_2_height,
         representation_3_name, representation_3_bandwidth,
         representation_3_width, representation_3_height,
         uri_mpd, uri_m3u8, uri_thumbnail"
    };
}

macro_rules! segment_columns {
    () => {
        "video_id, segment_id, original_path, original_extension, status, duration,
         representation_1_status, representation_2_status, representation_3_status,
         media_mpd, media_m3u8"
    };
}

/// PostgreSQL-based video store
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
    hook: Arc<dyn MutationHook>,
}

impl PgVideoStore {
    pub fn new(pool: PgPool, hook: Arc<dyn MutationHook>) -> Self {
        Self { pool, hook }
    }

    async fn video_exists(
        tx: &mut Transaction<'_, Postgres>,
        video_id: VideoId,
    ) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cs_videos WHERE video_id = $1)")
                .bind(video_id)
                .fetch_one(&mut **tx)
                .await?;
        Ok(exists)
    }

    /// Row-lock the video so concurrent segment inserts wait for this transaction
    async fn lock_video(
        tx: &mut Transaction<'_, Postgres>,
        video_id: VideoId,
    ) -> StoreResult<bool> {
        let locked: Option<VideoId> =
            sqlx::query_scalar("SELECT video_id FROM cs_videos WHERE video_id = $1 FOR UPDATE")
                .bind(video_id)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(locked.is_some())
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn get_video(&self, video_id: VideoId) -> StoreResult<Option<Video>> {
        let row = sqlx::query_as::<_, VideoRow>(concat!(
            "SELECT ",
            video_columns!(),
            " FROM cs_videos WHERE video_id = $1"
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Video::try_from).transpose()?)
    }

    async fn list_videos_by_created_desc(&self) -> StoreResult<Vec<Video>> {
        let rows = sqlx::query_as::<_, VideoRow>(concat!(
            "SELECT ",
            video_columns!(),
            " FROM cs_videos ORDER BY created_at DESC, video_id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let videos = rows
            .into_iter()
            .map(Video::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = videos.len(), "Listed videos from database");
        Ok(videos)
    }

    async fn get_segment(
        &self,
        video_id: VideoId,
        segment_id: SegmentId,
    ) -> StoreResult<Option<VideoSegment>> {
        let row = sqlx::query_as::<_, SegmentRow>(concat!(
            "SELECT ",
            segment_columns!(),
            " FROM cs_segments WHERE video_id = $1 AND segment_id = $2"
        ))
        .bind(video_id)
        .bind(segment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VideoSegment::try_from).transpose()?)
    }

    async fn list_segments(&self, video_id: VideoId) -> StoreResult<Vec<VideoSegment>> {
        let rows = sqlx::query_as::<_, SegmentRow>(concat!(
            "SELECT ",
            segment_columns!(),
            " FROM cs_segments WHERE video_id = $1 ORDER BY segment_id ASC"
        ))
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        let segments = rows
            .into_iter()
            .map(VideoSegment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(segments)
    }

    async fn insert_video(&self, input: NewVideo) -> StoreResult<Video> {
        // Id and created_at in the draft are placeholders; the row assigns both
        let draft = Video::create(0, Utc::now(), &input)?;

        let mut tx = self.pool.begin().await?;
        let row = bind_video_columns(
            sqlx::query_as::<_, VideoRow>(concat!(
                "INSERT INTO cs_videos (
                    title, video_type, status, segment_count, segment_duration,
                    representation_1_name, representation_1_bandwidth,
                    representation_1_width, representation_1_height,
                    representation_2_name, representation_2_bandwidth,
                    representation_2_width, representation_2_height,
                    representation_3_name, representation_3_bandwidth,
                    representation_3_width, representation_3_height,
                    uri_mpd, uri_m3u8, uri_thumbnail
                )
                VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
                )
                RETURNING ",
                video_columns!()
            )),
            &draft,
        )
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let video = Video::try_from(row)?;
        info!(video_id = video.video_id, title = %video.title, "Video inserted");
        self.hook
            .on_data_changed(DataChange::video(video.video_id, ChangeKind::Inserted))
            .await;
        Ok(video)
    }

    async fn update_video(&self, video_id: VideoId, patch: UpdateVideo) -> StoreResult<Video> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, VideoRow>(concat!(
            "SELECT ",
            video_columns!(),
            " FROM cs_videos WHERE video_id = $1 FOR UPDATE"
        ))
        .bind(video_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::video_not_found(video_id))?;

        let mut video = Video::try_from(current)?;
        patch.apply(&mut video)?;

        let row = bind_video_columns(
            sqlx::query_as::<_, VideoRow>(concat!(
                "UPDATE cs_videos SET
                    title = $1, video_type = $2, status = $3, segment_count = $4,
                    segment_duration = $5,
                    representation_1_name = $6, representation_1_bandwidth = $7,
                    representation_1_width = $8, representation_1_height = $9,
                    representation_2_name = $10, representation_2_bandwidth = $11,
                    representation_2_width = $12, representation_2_height = $13,
                    representation_3_name = $14, representation_3_bandwidth = $15,
                    representation_3_width = $16, representation_3_height = $17,
                    uri_mpd = $18, uri_m3u8 = $19, uri_thumbnail = $20
                WHERE video_id = $21
                RETURNING ",
                video_columns!()
            )),
            &video,
        )
        .bind(video_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let video = Video::try_from(row)?;
        info!(video_id, status = %video.status, "Video updated");
        self.hook
            .on_data_changed(DataChange::video(video_id, ChangeKind::Updated))
            .await;
        Ok(video)
    }

    async fn delete_video(&self, video_id: VideoId) -> StoreResult<usize> {
        let mut tx = self.pool.begin().await?;

        if !Self::lock_video(&mut tx, video_id).await? {
            return Err(StoreError::video_not_found(video_id));
        }

        // Segments are removed explicitly so each one can be reported
        let segment_ids: Vec<SegmentId> = sqlx::query_scalar(
            "DELETE FROM cs_segments WHERE video_id = $1 RETURNING segment_id",
        )
        .bind(video_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cs_videos WHERE video_id = $1")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(video_id, segments = segment_ids.len(), "Video deleted");
        notify_video_deleted(self.hook.as_ref(), video_id, &segment_ids).await;
        Ok(segment_ids.len())
    }

    async fn insert_segment(&self, input: NewVideoSegment) -> StoreResult<VideoSegment> {
        let draft = VideoSegment::create(&input)?;

        let mut tx = self.pool.begin().await?;
        let row = bind_segment_columns(
            sqlx::query_as::<_, SegmentRow>(concat!(
                "INSERT INTO cs_segments (
                    video_id, segment_id, original_path, original_extension, status, duration,
                    representation_1_status, representation_2_status, representation_3_status,
                    media_mpd, media_m3u8
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING ",
                segment_columns!()
            )),
            &draft,
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_segment_write_error(e, input.video_id, input.segment_id))?;
        tx.commit().await?;

        let segment = VideoSegment::try_from(row)?;
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
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, SegmentRow>(concat!(
            "SELECT ",
            segment_columns!(),
            " FROM cs_segments WHERE video_id = $1 AND segment_id = $2 FOR UPDATE"
        ))
        .bind(video_id)
        .bind(segment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            if !Self::video_exists(&mut tx, video_id).await? {
                return Err(StoreError::ReferentialIntegrity { video_id });
            }
            return Err(StoreError::segment_not_found(video_id, segment_id));
        };

        let mut segment = VideoSegment::try_from(current)?;
        patch.apply(&mut segment)?;

        let row = bind_segment_columns(
            sqlx::query_as::<_, SegmentRow>(concat!(
                "UPDATE cs_segments SET
                    original_path = $3, original_extension = $4, status = $5, duration = $6,
                    representation_1_status = $7, representation_2_status = $8,
                    representation_3_status = $9, media_mpd = $10, media_m3u8 = $11
                WHERE video_id = $1 AND segment_id = $2
                RETURNING ",
                segment_columns!()
            )),
            &segment,
        )
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        let segment = VideoSegment::try_from(row)?;
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
        let mut tx = self.pool.begin().await?;
        let result =
            sqlx::query("DELETE FROM cs_segments WHERE video_id = $1 AND segment_id = $2")
                .bind(video_id)
                .bind(segment_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            if !Self::video_exists(&mut tx, video_id).await? {
                return Err(StoreError::ReferentialIntegrity { video_id });
            }
            return Err(StoreError::segment_not_found(video_id, segment_id));
        }
        tx.commit().await?;

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

type PgQueryAs<'q, R> = sqlx::query::QueryAs<'q, Postgres, R, sqlx::postgres::PgArguments>;

/// Bind $1..$20: every persisted video column except id and created_at
fn bind_video_columns<'q>(
    query: PgQueryAs<'q, VideoRow>,
    video: &Video,
) -> PgQueryAs<'q, VideoRow> {
    let mut query = query
        .bind(video.title.clone())
        .bind(video.video_type.as_str())
        .bind(video.status.as_str())
        .bind(video.segment_count)
        .bind(video.segment_duration);

    for slot in [
        &video.representation_1,
        &video.representation_2,
        &video.representation_3,
    ] {
        let (name, bandwidth, width, height) = Representation::into_parts(slot.as_ref());
        query = query
            .bind(name.map(str::to_owned))
            .bind(bandwidth)
            .bind(width)
            .bind(height);
    }

    query
        .bind(video.uri_mpd.clone())
        .bind(video.uri_m3u8.clone())
        .bind(video.uri_thumbnail.clone())
}

/// Bind $1..$11 in column order
fn bind_segment_columns<'q>(
    query: PgQueryAs<'q, SegmentRow>,
    segment: &VideoSegment,
) -> PgQueryAs<'q, SegmentRow> {
    query
        .bind(segment.video_id)
        .bind(segment.segment_id)
        .bind(segment.original_path.clone())
        .bind(segment.original_extension.clone())
        .bind(segment.status.as_str())
        .bind(segment.duration)
        .bind(segment.representation_1_status.as_str())
        .bind(segment.representation_2_status.as_str())
        .bind(segment.representation_3_status.as_str())
        .bind(segment.media_mpd.clone())
        .bind(segment.media_m3u8.clone())
}

fn map_segment_write_error(
    err: sqlx::Error,
    video_id: VideoId,
    segment_id: SegmentId,
) -> StoreError {
    let code = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned());

    match code.as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => StoreError::ReferentialIntegrity { video_id },
        Some(UNIQUE_VIOLATION) => StoreError::DuplicateSegment {
            video_id,
            segment_id,
        },
        _ => StoreError::Database(err),
    }
}

// Database row representations
#[derive(sqlx::FromRow)]
struct VideoRow {
    video_id: i64,
    title: String,
    created_at: DateTime<Utc>,
    video_type: String,
    status: String,
    segment_count: i32,
    segment_duration: i32,
    representation_1_name: Option<String>,
    representation_1_bandwidth: Option<i32>,
    representation_1_width: Option<i32>,
    representation_1_height: Option<i32>,
    representation_2_name: Option<String>,
    representation_2_bandwidth: Option<i32>,
    representation_2_width: Option<i32>,
    representation_2_height: Option<i32>,
    representation_3_name: Option<String>,
    representation_3_bandwidth: Option<i32>,
    representation_3_width: Option<i32>,
    representation_3_height: Option<i32>,
    uri_mpd: Option<String>,
    uri_m3u8: Option<String>,
    uri_thumbnail: Option<String>,
}

impl TryFrom<VideoRow> for Video {
    type Error = ModelError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        Ok(Video {
            video_id: row.video_id,
            title: row.title,
            created_at: row.created_at,
            video_type: row.video_type.parse()?,
            status: row.status.parse()?,
            segment_count: row.segment_count,
            segment_duration: row.segment_duration,
            representation_1: Representation::from_parts(
                row.representation_1_name,
                row.representation_1_bandwidth,
                row.representation_1_width,
                row.representation_1_height,
            )?,
            representation_2: Representation::from_parts(
                row.representation_2_name,
                row.representation_2_bandwidth,
                row.representation_2_width,
                row.representation_2_height,
            )?,
            representation_3: Representation::from_parts(
                row.representation_3_name,
                row.representation_3_bandwidth,
                row.representation_3_width,
                row.representation_3_height,
            )?,
            uri_mpd: row.uri_mpd,
            uri_m3u8: row.uri_m3u8,
            uri_thumbnail: row.uri_thumbnail,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SegmentRow {
    video_id: i64,
    segment_id: i32,
    original_path: Option<String>,
    original_extension: String,
    status: String,
    duration: i32,
    representation_1_status: String,
    representation_2_status: String,
    representation_3_status: String,
    media_mpd: Option<String>,
    media_m3u8: Option<String>,
}

impl TryFrom<SegmentRow> for VideoSegment {
    type Error = ModelError;

    fn try_from(row: SegmentRow) -> Result<Self, Self::Error> {
        Ok(VideoSegment {
            video_id: row.video_id,
            segment_id: row.segment_id,
            original_path: row.original_path,
            original_extension: row.original_extension,
            status: row.status.parse()?,
            duration: row.duration,
            representation_1_status: row.representation_1_status.parse()?,
            representation_2_status: row.representation_2_status.parse()?,
            representation_3_status: row.representation_3_status.parse()?,
            media_mpd: row.media_mpd,
            media_m3u8: row.media_m3u8,
        })
    }
}
