use super::{LikeRepositoryTrait, TOGGLE_ATTEMPTS};
use crate::models::{Like, LikeTarget, LikeTargetKind, Toggled};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct LikeRow {
    id: Uuid,
    owner_id: Uuid,
    target_kind: String,
    target_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<LikeRow> for Like {
    type Error = sqlx::Error;

    fn try_from(row: LikeRow) -> Result<Self, Self::Error> {
        let kind = LikeTargetKind::parse(&row.target_kind).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown like target kind '{}'", row.target_kind).into())
        })?;

        Ok(Like {
            id: row.id,
            owner: row.owner_id,
            target: LikeTarget::new(kind, row.target_id),
            created_at: row.created_at,
        })
    }
}

/// Repository for Like operations
#[derive(Clone)]
pub struct LikeRepository {
    pool: PgPool,
}

impl LikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeRepositoryTrait for LikeRepository {
    async fn target_exists(&self, target: LikeTarget) -> Result<bool, sqlx::Error> {
        let sql = match target {
            LikeTarget::Video(_) => "SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)",
            LikeTarget::Comment(_) => "SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)",
            LikeTarget::Tweet(_) => "SELECT EXISTS(SELECT 1 FROM tweets WHERE id = $1)",
        };

        sqlx::query_scalar(sql)
            .bind(target.id())
            .fetch_one(&self.pool)
            .await
    }

    /// Delete first; only when nothing was removed is an insert attempted. The
    /// unique constraint turns a concurrent duplicate insert into a no-op, in
    /// which case the row that won is reported as added. If that row is removed
    /// again before it can be read back, the toggle starts over.
    async fn toggle(
        &self,
        owner_id: Uuid,
        target: LikeTarget,
    ) -> Result<Toggled<Like>, sqlx::Error> {
        let kind = target.kind().as_str();

        for _ in 0..TOGGLE_ATTEMPTS {
            let removed = sqlx::query_as::<_, LikeRow>(
                r#"
                DELETE FROM likes
                WHERE owner_id = $1 AND target_kind = $2 AND target_id = $3
                RETURNING id, owner_id, target_kind, target_id, created_at
                "#,
            )
            .bind(owner_id)
            .bind(kind)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = removed {
                return Ok(Toggled::Removed(row.try_into()?));
            }

            let inserted = sqlx::query_as::<_, LikeRow>(
                r#"
                INSERT INTO likes (owner_id, target_kind, target_id)
                VALUES ($1, $2, $3)
                ON CONFLICT (owner_id, target_kind, target_id) DO NOTHING
                RETURNING id, owner_id, target_kind, target_id, created_at
                "#,
            )
            .bind(owner_id)
            .bind(kind)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = inserted {
                return Ok(Toggled::Added(row.try_into()?));
            }

            let existing = sqlx::query_as::<_, LikeRow>(
                r#"
                SELECT id, owner_id, target_kind, target_id, created_at
                FROM likes
                WHERE owner_id = $1 AND target_kind = $2 AND target_id = $3
                "#,
            )
            .bind(owner_id)
            .bind(kind)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;

            if let Some(row) = existing {
                return Ok(Toggled::Added(row.try_into()?));
            }
            tracing::debug!(%owner_id, target_id = %target.id(), "like vanished during toggle, retrying");
        }

        Err(sqlx::Error::Protocol(format!(
            "like toggle did not settle after {TOGGLE_ATTEMPTS} attempts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str) -> LikeRow {
        LikeRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            target_kind: kind.to_string(),
            target_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_into_tagged_target() {
        let row = row("tweet");
        let target_id = row.target_id;
        let like = Like::try_from(row).unwrap();
        assert_eq!(like.target, LikeTarget::Tweet(target_id));
    }

    #[test]
    fn unknown_kind_is_a_decode_error() {
        assert!(matches!(
            Like::try_from(row("playlist")),
            Err(sqlx::Error::Decode(_))
        ));
    }
}
