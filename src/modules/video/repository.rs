use super::model::{ProcessedVideo, VideoJob};
use crate::infrastructure::db::pool::DbPool;
use crate::modules::transcode::ports::JobStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct VideoRepository;

impl VideoRepository {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<VideoJob>> {
        let video = sqlx::query_as::<_, VideoJob>(
            r#"
            SELECT id, user_id, title, description, raw_key, processed,
                   hls_path, thumbnail_path, duration, created_at, updated_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| anyhow!("Failed to fetch video: {}", e))?;

        Ok(video)
    }

    /// Marks the video processed. The `processed = FALSE` filter keeps a
    /// concurrent redelivery from writing twice; `false` is returned when
    /// nothing matched.
    pub async fn mark_processed(pool: &PgPool, id: Uuid, update: &ProcessedVideo) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET
                processed = TRUE,
                hls_path = $1,
                duration = $2,
                thumbnail_path = COALESCE($3, thumbnail_path),
                updated_at = NOW()
            WHERE id = $4 AND processed = FALSE
            "#,
        )
        .bind(&update.hls_path)
        .bind(&update.duration)
        .bind(&update.thumbnail_path)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| anyhow!("Failed to update video: {}", e))?;

        Ok(result.rows_affected() > 0)
    }
}

/// [`JobStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn find(&self, id: Uuid) -> Result<Option<VideoJob>> {
        VideoRepository::find_by_id(&self.pool, id).await
    }

    async fn mark_processed(&self, id: Uuid, update: &ProcessedVideo) -> Result<bool> {
        VideoRepository::mark_processed(&self.pool, id, update).await
    }
}
