use super::VideoRepositoryTrait;
use crate::models::{NewVideo, Video, VideoChanges};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, thumbnail_url, \
                             duration, is_published, created_at, updated_at";

/// Repository for Video rows
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepositoryTrait for VideoRepository {
    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert(&self, video: NewVideo) -> Result<Video, sqlx::Error> {
        sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos (owner_id, title, description, video_url, thumbnail_url, duration)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(video.owner)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_url)
        .bind(&video.thumbnail_url)
        .bind(video.duration)
        .fetch_one(&self.pool)
        .await
    }

    async fn update(
        &self,
        video_id: Uuid,
        changes: VideoChanges,
    ) -> Result<Option<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(&format!(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail_url = COALESCE($4, thumbnail_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(video_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.thumbnail_url)
        .fetch_optional(&self.pool)
        .await
    }

    async fn toggle_published(&self, video_id: Uuid) -> Result<Option<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(&format!(
            r#"
            UPDATE videos
            SET is_published = NOT is_published, updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, video_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM likes
            WHERE (target_kind = 'video' AND target_id = $1)
               OR (target_kind = 'comment'
                   AND target_id IN (SELECT id FROM comments WHERE video_id = $1))
            "#,
        )
        .bind(video_id)
        .execute(&mut *tx)
        .await?;

        // Comments go with the video through the foreign key.
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
