/// Like service - toggling likes on videos, comments and tweets
use super::{non_empty, ListOptions};
use crate::db::collections::LIKES;
use crate::db::{DocumentStore, LikeRepositoryTrait};
use crate::error::{AppError, Result};
use crate::metrics::record_toggle;
use crate::models::{parse_id, Caller, Like, LikeTarget, LikeTargetKind, Toggled};
use crate::pipelines;
use query_pipeline::{PageLabels, Paginated, Sort};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub const LIKED_VIDEO_LABELS: PageLabels = PageLabels::new("likedVideos", "totalLikedVideos");

pub struct LikeService {
    likes: Arc<dyn LikeRepositoryTrait>,
    documents: Arc<dyn DocumentStore>,
}

impl LikeService {
    pub fn new(likes: Arc<dyn LikeRepositoryTrait>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { likes, documents }
    }

    pub async fn toggle_video_like(&self, caller: &Caller, video_id: &str) -> Result<Toggled<Like>> {
        self.toggle(caller, LikeTargetKind::Video, video_id).await
    }

    pub async fn toggle_comment_like(
        &self,
        caller: &Caller,
        comment_id: &str,
    ) -> Result<Toggled<Like>> {
        self.toggle(caller, LikeTargetKind::Comment, comment_id)
            .await
    }

    pub async fn toggle_tweet_like(&self, caller: &Caller, tweet_id: &str) -> Result<Toggled<Like>> {
        self.toggle(caller, LikeTargetKind::Tweet, tweet_id).await
    }

    /// Videos the caller liked, newest like first by default.
    pub async fn list_liked_videos(
        &self,
        caller: &Caller,
        options: &ListOptions,
    ) -> Result<Paginated<Value>> {
        let sort = Sort::from_params(
            &LIKES,
            options.sort_by.as_deref(),
            options.sort_type.as_deref(),
            "createdAt",
        )?;

        let pipeline = pipelines::liked_videos(caller, sort);
        let page = self
            .documents
            .aggregate_paginate(&pipeline, options.page)
            .await?;
        non_empty(page.with_labels(LIKED_VIDEO_LABELS), "No liked videos found")
    }

    async fn toggle(
        &self,
        caller: &Caller,
        kind: LikeTargetKind,
        raw_id: &str,
    ) -> Result<Toggled<Like>> {
        let target = LikeTarget::new(kind, parse_id(raw_id, &format!("{kind} ID"))?);

        if !self.likes.target_exists(target).await? {
            return Err(AppError::NotFound(format!("{} not found", capitalized(kind))));
        }

        let toggled = self.likes.toggle(caller.user_id, target).await?;
        record_toggle(kind.as_str(), toggled.outcome());

        info!(
            target_kind = %kind,
            target_id = %target.id(),
            caller = %caller.user_id,
            outcome = toggled.outcome(),
            "like toggled"
        );
        Ok(toggled)
    }
}

fn capitalized(kind: LikeTargetKind) -> &'static str {
    match kind {
        LikeTargetKind::Video => "Video",
        LikeTargetKind::Comment => "Comment",
        LikeTargetKind::Tweet => "Tweet",
    }
}
