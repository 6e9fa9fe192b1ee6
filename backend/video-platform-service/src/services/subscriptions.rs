/// Subscription service - channel subscriptions and the listings over them
use super::{non_empty, ListOptions};
use crate::db::collections::SUBSCRIPTIONS;
use crate::db::{DocumentStore, SubscriptionRepositoryTrait, UserRepositoryTrait};
use crate::error::{AppError, Result};
use crate::metrics::record_toggle;
use crate::models::{parse_id, Caller, Subscription, Toggled};
use crate::pipelines;
use query_pipeline::{PageLabels, Paginated, Sort};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const SUBSCRIBER_LABELS: PageLabels = PageLabels::new("subscribers", "totalSubscribers");
pub const CHANNEL_LABELS: PageLabels = PageLabels::new("channels", "totalChannels");

pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    documents: Arc<dyn DocumentStore>,
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            subscriptions,
            users,
            documents,
        }
    }

    /// Subscribe to a channel, or unsubscribe when already subscribed.
    pub async fn toggle_subscription(
        &self,
        caller: &Caller,
        channel_id: &str,
    ) -> Result<Toggled<Subscription>> {
        let channel_id = parse_id(channel_id, "channel ID")?;
        if channel_id == caller.user_id {
            return Err(AppError::validation(
                "You cannot subscribe to your own channel",
            ));
        }
        self.require_user(channel_id, "Channel not found").await?;

        let toggled = self
            .subscriptions
            .toggle(caller.user_id, channel_id)
            .await?;
        record_toggle("subscription", toggled.outcome());

        info!(
            %channel_id,
            caller = %caller.user_id,
            outcome = toggled.outcome(),
            "subscription toggled"
        );
        Ok(toggled)
    }

    pub async fn list_channel_subscribers(
        &self,
        channel_id: &str,
        options: &ListOptions,
    ) -> Result<Paginated<Value>> {
        let channel_id = parse_id(channel_id, "channel ID")?;
        let sort = self.sort(options)?;
        self.require_user(channel_id, "Channel not found").await?;

        let pipeline = pipelines::channel_subscribers(channel_id, sort);
        let page = self
            .documents
            .aggregate_paginate(&pipeline, options.page)
            .await?;
        non_empty(page.with_labels(SUBSCRIBER_LABELS), "No subscribers found")
    }

    pub async fn list_subscribed_channels(
        &self,
        subscriber_id: &str,
        options: &ListOptions,
    ) -> Result<Paginated<Value>> {
        let subscriber_id = parse_id(subscriber_id, "subscriber ID")?;
        let sort = self.sort(options)?;
        self.require_user(subscriber_id, "Subscriber not found")
            .await?;

        let pipeline = pipelines::subscribed_channels(subscriber_id, sort);
        let page = self
            .documents
            .aggregate_paginate(&pipeline, options.page)
            .await?;
        non_empty(page.with_labels(CHANNEL_LABELS), "No subscribed channels found")
    }

    fn sort(&self, options: &ListOptions) -> Result<Sort> {
        Ok(Sort::from_params(
            &SUBSCRIPTIONS,
            options.sort_by.as_deref(),
            options.sort_type.as_deref(),
            "createdAt",
        )?)
    }

    async fn require_user(&self, user_id: Uuid, message: &str) -> Result<()> {
        if self.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(message.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MockDocumentStore, MockSubscriptionRepositoryTrait, MockUserRepositoryTrait};
    use crate::services::test_support::page_of;
    use chrono::Utc;
    use serde_json::json;

    fn subscription(subscriber: Uuid, channel: Uuid) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            subscriber,
            channel,
            created_at: Utc::now(),
        }
    }

    fn service(
        subscriptions: MockSubscriptionRepositoryTrait,
        users: MockUserRepositoryTrait,
        documents: MockDocumentStore,
    ) -> SubscriptionService {
        SubscriptionService::new(Arc::new(subscriptions), Arc::new(users), Arc::new(documents))
    }

    fn existing_users() -> MockUserRepositoryTrait {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_exists().returning(|_| Ok(true));
        users
    }

    #[tokio::test]
    async fn self_subscription_always_fails_validation() {
        let mut subscriptions = MockSubscriptionRepositoryTrait::new();
        subscriptions.expect_toggle().never();
        let mut users = MockUserRepositoryTrait::new();
        users.expect_exists().never();

        let caller = Caller::new(Uuid::new_v4());
        let err = service(subscriptions, users, MockDocumentStore::new())
            .toggle_subscription(&caller, &caller.user_id.to_string())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You cannot subscribe to your own channel");
    }

    #[tokio::test]
    async fn subscribing_to_unknown_channel_is_not_found() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_exists().returning(|_| Ok(false));

        let err = service(
            MockSubscriptionRepositoryTrait::new(),
            users,
            MockDocumentStore::new(),
        )
        .toggle_subscription(&Caller::new(Uuid::new_v4()), &Uuid::new_v4().to_string())
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn toggle_reports_outcome() {
        let caller = Caller::new(Uuid::new_v4());
        let channel = Uuid::new_v4();

        let mut subscriptions = MockSubscriptionRepositoryTrait::new();
        subscriptions
            .expect_toggle()
            .withf(move |subscriber, ch| *subscriber == caller.user_id && *ch == channel)
            .returning(|subscriber, channel| {
                Ok(Toggled::Removed(subscription(subscriber, channel)))
            });

        let toggled = service(subscriptions, existing_users(), MockDocumentStore::new())
            .toggle_subscription(&caller, &channel.to_string())
            .await
            .unwrap();
        assert_eq!(toggled.outcome(), "removed");
    }

    #[tokio::test]
    async fn malformed_ids_never_reach_storage() {
        let svc = service(
            MockSubscriptionRepositoryTrait::new(),
            MockUserRepositoryTrait::new(),
            MockDocumentStore::new(),
        );
        assert!(matches!(
            svc.list_channel_subscribers("nope", &ListOptions::default())
                .await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            svc.list_subscribed_channels("nope", &ListOptions::default())
                .await,
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            svc.toggle_subscription(&Caller::new(Uuid::new_v4()), "nope")
                .await,
            Err(AppError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn channel_without_subscribers_is_not_found() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_aggregate_paginate()
            .returning(|_, request| Ok(page_of(Vec::new(), 0, request)));

        let err = service(
            MockSubscriptionRepositoryTrait::new(),
            existing_users(),
            documents,
        )
        .list_channel_subscribers(&Uuid::new_v4().to_string(), &ListOptions::default())
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "No subscribers found");
    }

    #[tokio::test]
    async fn subscribed_channels_use_channel_labels() {
        let mut documents = MockDocumentStore::new();
        documents
            .expect_aggregate_paginate()
            .returning(|_, request| Ok(page_of(vec![json!({"channel": {}})], 1, request)));

        let page = service(
            MockSubscriptionRepositoryTrait::new(),
            existing_users(),
            documents,
        )
        .list_subscribed_channels(&Uuid::new_v4().to_string(), &ListOptions::default())
        .await
        .unwrap();
        let body = serde_json::to_value(&page).unwrap();
        assert_eq!(body["totalChannels"], 1);
        assert!(body["channels"].is_array());
    }
}
