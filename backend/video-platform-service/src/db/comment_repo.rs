use super::CommentRepositoryTrait;
use crate::models::{Comment, CommentWithVideoOwner};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Comment rows
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepositoryTrait for CommentRepository {
    async fn find_with_video_owner(
        &self,
        comment_id: Uuid,
    ) -> Result<Option<CommentWithVideoOwner>, sqlx::Error> {
        sqlx::query_as::<_, CommentWithVideoOwner>(
            r#"
            SELECT c.id, c.content, c.video_id, c.owner_id, c.created_at, c.updated_at,
                   v.owner_id AS video_owner_id
            FROM comments c
            JOIN videos v ON v.id = c.video_id
            WHERE c.id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert(
        &self,
        video_id: Uuid,
        owner_id: Uuid,
        content: &str,
    ) -> Result<Comment, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (video_id, owner_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, content, video_id, owner_id, created_at, updated_at
            "#,
        )
        .bind(video_id)
        .bind(owner_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_content(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, content, video_id, owner_id, created_at, updated_at
            "#,
        )
        .bind(comment_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, comment_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'comment' AND target_id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
