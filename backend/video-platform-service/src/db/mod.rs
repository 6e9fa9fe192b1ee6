/// Database access layer
///
/// Each resource has a repository trait with a PostgreSQL implementation. Services
/// hold the traits as `Arc<dyn ...>` so that unit tests can swap in mocks.
/// Listings do not go through the repositories: they are pipelines executed by a
/// `DocumentStore`.
use crate::models::{
    Comment, CommentWithVideoOwner, Like, LikeTarget, NewVideo, Subscription, Toggled, Tweet,
    Video, VideoChanges,
};
use async_trait::async_trait;
use query_pipeline::{PageRequest, Paginated, Pipeline, PipelineError};
use uuid::Uuid;

pub mod collections;
pub mod comment_repo;
pub mod document_store;
pub mod like_repo;
pub mod pool;
pub mod subscription_repo;
pub mod tweet_repo;
pub mod user_repo;
pub mod video_repo;

pub use comment_repo::CommentRepository;
pub use document_store::PgDocumentStore;
pub use like_repo::LikeRepository;
pub use pool::{create_pool, run_migrations};
pub use subscription_repo::SubscriptionRepository;
pub use tweet_repo::TweetRepository;
pub use user_repo::UserRepository;
pub use video_repo::VideoRepository;

/// Rounds a toggle may take when concurrent toggles keep removing the row it
/// conflicted with.
pub const TOGGLE_ATTEMPTS: usize = 5;

/// Executes aggregation pipelines
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn aggregate(&self, pipeline: &Pipeline)
        -> Result<Vec<serde_json::Value>, PipelineError>;

    async fn aggregate_paginate(
        &self,
        pipeline: &Pipeline,
        request: PageRequest,
    ) -> Result<Paginated<serde_json::Value>, PipelineError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn exists(&self, user_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<Video>, sqlx::Error>;

    async fn insert(&self, video: NewVideo) -> Result<Video, sqlx::Error>;

    /// Apply a partial update; `None` when the video does not exist.
    async fn update(
        &self,
        video_id: Uuid,
        changes: VideoChanges,
    ) -> Result<Option<Video>, sqlx::Error>;

    /// Flip `is_published` in place.
    async fn toggle_published(&self, video_id: Uuid) -> Result<Option<Video>, sqlx::Error>;

    /// Delete the video, its comments and every like on either.
    async fn delete(&self, video_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepositoryTrait: Send + Sync {
    async fn find_with_video_owner(
        &self,
        comment_id: Uuid,
    ) -> Result<Option<CommentWithVideoOwner>, sqlx::Error>;

    async fn insert(
        &self,
        video_id: Uuid,
        owner_id: Uuid,
        content: &str,
    ) -> Result<Comment, sqlx::Error>;

    async fn update_content(
        &self,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<Comment>, sqlx::Error>;

    /// Delete the comment and the likes on it.
    async fn delete(&self, comment_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TweetRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, tweet_id: Uuid) -> Result<Option<Tweet>, sqlx::Error>;

    async fn insert(&self, owner_id: Uuid, content: &str) -> Result<Tweet, sqlx::Error>;

    async fn update_content(
        &self,
        tweet_id: Uuid,
        content: &str,
    ) -> Result<Option<Tweet>, sqlx::Error>;

    /// Delete the tweet and the likes on it.
    async fn delete(&self, tweet_id: Uuid) -> Result<bool, sqlx::Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LikeRepositoryTrait: Send + Sync {
    async fn target_exists(&self, target: LikeTarget) -> Result<bool, sqlx::Error>;

    /// Remove the like if present, otherwise insert it.
    async fn toggle(&self, owner_id: Uuid, target: LikeTarget)
        -> Result<Toggled<Like>, sqlx::Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepositoryTrait: Send + Sync {
    /// Remove the subscription if present, otherwise insert it.
    async fn toggle(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<Toggled<Subscription>, sqlx::Error>;
}
