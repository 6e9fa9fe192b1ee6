use super::TweetRepositoryTrait;
use crate::models::Tweet;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for Tweet rows
#[derive(Clone)]
pub struct TweetRepository {
    pool: PgPool,
}

impl TweetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TweetRepositoryTrait for TweetRepository {
    async fn find_by_id(&self, tweet_id: Uuid) -> Result<Option<Tweet>, sqlx::Error> {
        sqlx::query_as::<_, Tweet>(
            "SELECT id, content, owner_id, created_at, updated_at FROM tweets WHERE id = $1",
        )
        .bind(tweet_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert(&self, owner_id: Uuid, content: &str) -> Result<Tweet, sqlx::Error> {
        sqlx::query_as::<_, Tweet>(
            r#"
            INSERT INTO tweets (owner_id, content)
            VALUES ($1, $2)
            RETURNING id, content, owner_id, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_content(
        &self,
        tweet_id: Uuid,
        content: &str,
    ) -> Result<Option<Tweet>, sqlx::Error> {
        sqlx::query_as::<_, Tweet>(
            r#"
            UPDATE tweets
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, content, owner_id, created_at, updated_at
            "#,
        )
        .bind(tweet_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, tweet_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE target_kind = 'tweet' AND target_id = $1")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
