/// Comment service - comments under videos
use super::{non_empty, require_text, ListOptions, MAX_COMMENT_CHARS};
use crate::db::collections::COMMENTS;
use crate::db::{CommentRepositoryTrait, DocumentStore, VideoRepositoryTrait};
use crate::error::{AppError, Result};
use crate::middleware::{check_comment_deletion, check_comment_update};
use crate::models::{parse_id, Caller, Comment, CommentWithVideoOwner};
use crate::pipelines;
use query_pipeline::{PageLabels, Paginated, Sort};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const COMMENT_LABELS: PageLabels = PageLabels::new("comments", "totalComments");

pub struct CommentService {
    comments: Arc<dyn CommentRepositoryTrait>,
    videos: Arc<dyn VideoRepositoryTrait>,
    documents: Arc<dyn DocumentStore>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepositoryTrait>,
        videos: Arc<dyn VideoRepositoryTrait>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            comments,
            videos,
            documents,
        }
    }

    pub async fn list_video_comments(
        &self,
        caller: Option<&Caller>,
        video_id: &str,
        options: &ListOptions,
    ) -> Result<Paginated<Value>> {
        let video_id = parse_id(video_id, "video ID")?;
        let sort = Sort::from_params(
            &COMMENTS,
            options.sort_by.as_deref(),
            options.sort_type.as_deref(),
            "createdAt",
        )?;

        let pipeline = pipelines::video_comments(video_id, caller, sort);
        let page = self
            .documents
            .aggregate_paginate(&pipeline, options.page)
            .await?;
        non_empty(
            page.with_labels(COMMENT_LABELS),
            "No comments found for this video",
        )
    }

    /// Comment on a video the caller can see.
    pub async fn add_comment(
        &self,
        caller: &Caller,
        video_id: &str,
        content: &str,
    ) -> Result<Comment> {
        let video_id = parse_id(video_id, "video ID")?;
        let content = require_text(content, "Comment content", MAX_COMMENT_CHARS)?;

        let video = self
            .videos
            .find_by_id(video_id)
            .await?
            .filter(|v| v.is_published || v.owner == caller.user_id)
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        let comment = self
            .comments
            .insert(video.id, caller.user_id, &content)
            .await?;

        info!(comment_id = %comment.id, %video_id, caller = %caller.user_id, "comment added");
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        caller: &Caller,
        comment_id: &str,
        content: &str,
    ) -> Result<Comment> {
        let comment_id = parse_id(comment_id, "comment ID")?;
        let content = require_text(content, "Comment content", MAX_COMMENT_CHARS)?;

        let existing = self.find_comment(comment_id).await?;
        check_comment_update(caller, &existing.comment)?;

        let comment = self
            .comments
            .update_content(comment_id, &content)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        info!(%comment_id, caller = %caller.user_id, "comment updated");
        Ok(comment)
    }

    /// The comment author or the owner of the video may delete a comment.
    pub async fn delete_comment(&self, caller: &Caller, comment_id: &str) -> Result<()> {
        let comment_id = parse_id(comment_id, "comment ID")?;

        let existing = self.find_comment(comment_id).await?;
        check_comment_deletion(caller, &existing.comment, existing.video_owner_id)?;

        if !self.comments.delete(comment_id).await? {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        info!(%comment_id, caller = %caller.user_id, "comment deleted");
        Ok(())
    }

    async fn find_comment(&self, comment_id: Uuid) -> Result<CommentWithVideoOwner> {
        self.comments
            .find_with_video_owner(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))
    }
}
