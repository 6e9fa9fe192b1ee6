use super::{SubscriptionRepositoryTrait, TOGGLE_ATTEMPTS};
use crate::models::{Subscription, Toggled};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for channel subscriptions
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepositoryTrait for SubscriptionRepository {
    /// Same delete-then-insert scheme as like toggles.
    async fn toggle(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<Toggled<Subscription>, sqlx::Error> {
        for _ in 0..TOGGLE_ATTEMPTS {
            let removed = sqlx::query_as::<_, Subscription>(
                r#"
                DELETE FROM subscriptions
                WHERE subscriber_id = $1 AND channel_id = $2
                RETURNING id, subscriber_id, channel_id, created_at
                "#,
            )
            .bind(subscriber_id)
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(subscription) = removed {
                return Ok(Toggled::Removed(subscription));
            }

            let inserted = sqlx::query_as::<_, Subscription>(
                r#"
                INSERT INTO subscriptions (subscriber_id, channel_id)
                VALUES ($1, $2)
                ON CONFLICT (subscriber_id, channel_id) DO NOTHING
                RETURNING id, subscriber_id, channel_id, created_at
                "#,
            )
            .bind(subscriber_id)
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(subscription) = inserted {
                return Ok(Toggled::Added(subscription));
            }

            let existing = sqlx::query_as::<_, Subscription>(
                r#"
                SELECT id, subscriber_id, channel_id, created_at
                FROM subscriptions
                WHERE subscriber_id = $1 AND channel_id = $2
                "#,
            )
            .bind(subscriber_id)
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(subscription) = existing {
                return Ok(Toggled::Added(subscription));
            }
            tracing::debug!(%subscriber_id, %channel_id, "subscription vanished during toggle, retrying");
        }

        Err(sqlx::Error::Protocol(format!(
            "subscription toggle did not settle after {TOGGLE_ATTEMPTS} attempts"
        )))
    }
}
