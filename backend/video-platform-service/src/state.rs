use crate::{
    config::Config,
    db::{
        CommentRepository, LikeRepository, PgDocumentStore, SubscriptionRepository,
        TweetRepository, UserRepository, VideoRepository,
    },
    media::MediaUploader,
    services::{CommentService, LikeService, SubscriptionService, TweetService, VideoService},
};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state, cloned into every worker
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub videos: Arc<VideoService>,
    pub comments: Arc<CommentService>,
    pub tweets: Arc<TweetService>,
    pub likes: Arc<LikeService>,
    pub subscriptions: Arc<SubscriptionService>,
    /// Where multipart uploads are spooled before they go to object storage
    pub upload_dir: PathBuf,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(pool: PgPool, media: Arc<dyn MediaUploader>, config: &Config) -> Self {
        let users = Arc::new(UserRepository::new(pool.clone()));
        let videos = Arc::new(VideoRepository::new(pool.clone()));
        let documents = Arc::new(PgDocumentStore::new(pool.clone()));

        Self {
            videos: Arc::new(VideoService::new(
                videos.clone(),
                documents.clone(),
                media,
            )),
            comments: Arc::new(CommentService::new(
                Arc::new(CommentRepository::new(pool.clone())),
                videos,
                documents.clone(),
            )),
            tweets: Arc::new(TweetService::new(
                Arc::new(TweetRepository::new(pool.clone())),
                users.clone(),
                documents.clone(),
            )),
            likes: Arc::new(LikeService::new(
                Arc::new(LikeRepository::new(pool.clone())),
                documents.clone(),
            )),
            subscriptions: Arc::new(SubscriptionService::new(
                Arc::new(SubscriptionRepository::new(pool.clone())),
                users,
                documents,
            )),
            upload_dir: PathBuf::from(&config.media.upload_dir),
            max_upload_bytes: config.media.max_upload_bytes,
            db: pool,
        }
    }
}
