/// Video service - publishing, retrieval, updates and the draft/published lifecycle
use super::{optional_text, require_text, ListOptions, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS};
use crate::db::collections::VIDEOS;
use crate::db::{DocumentStore, VideoRepositoryTrait};
use crate::error::{AppError, Result};
use crate::media::{MediaKind, MediaUploader};
use crate::middleware::check_video_ownership;
use crate::models::{parse_id, Caller, NewVideo, Video, VideoChanges};
use crate::pipelines::{self, VideoScope};
use query_pipeline::{PageLabels, Paginated, Sort};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const VIDEO_LABELS: PageLabels = PageLabels::new("videos", "totalVideos");

/// Input of `publish_video`; files are spooled uploads on local disk.
#[derive(Debug, Clone, Default)]
pub struct PublishVideo {
    pub title: String,
    pub description: String,
    pub video_file: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
}

/// Input of `update_video`; absent fields stay unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<PathBuf>,
}

pub struct VideoService {
    videos: Arc<dyn VideoRepositoryTrait>,
    documents: Arc<dyn DocumentStore>,
    media: Arc<dyn MediaUploader>,
}

impl VideoService {
    pub fn new(
        videos: Arc<dyn VideoRepositoryTrait>,
        documents: Arc<dyn DocumentStore>,
        media: Arc<dyn MediaUploader>,
    ) -> Self {
        Self {
            videos,
            documents,
            media,
        }
    }

    /// Published videos, optionally scoped to one channel. Never fails with not found.
    pub async fn list_videos(
        &self,
        caller: Option<&Caller>,
        user_id: Option<&str>,
        options: &ListOptions,
    ) -> Result<Paginated<Value>> {
        let owner = user_id
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_id(raw, "user ID"))
            .transpose()?;
        let sort = Sort::from_params(
            &VIDEOS,
            options.sort_by.as_deref(),
            options.sort_type.as_deref(),
            "createdAt",
        )?;

        let pipeline = pipelines::video_listing(VideoScope::for_request(owner, caller), sort);
        let page = self
            .documents
            .aggregate_paginate(&pipeline, options.page)
            .await?;
        Ok(page.with_labels(VIDEO_LABELS))
    }

    /// Upload the video and thumbnail, then store the video as a draft.
    pub async fn publish_video(&self, caller: &Caller, input: PublishVideo) -> Result<Video> {
        let title = require_text(&input.title, "Title", MAX_TITLE_CHARS)?;
        let description = require_text(&input.description, "Description", MAX_DESCRIPTION_CHARS)?;
        let (Some(video_file), Some(thumbnail)) = (input.video_file, input.thumbnail) else {
            return Err(AppError::validation(
                "Video file and thumbnail are required",
            ));
        };

        let video = self
            .media
            .upload(&video_file, MediaKind::Video)
            .await
            .map_err(|e| AppError::upload("Error while uploading video", e))?;
        // The uploader has no delete, so a stored video whose thumbnail fails is
        // left in object storage. Log its URL for manual cleanup.
        let thumbnail = match self.media.upload(&thumbnail, MediaKind::Image).await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                warn!(
                    caller = %caller.user_id,
                    orphaned_url = %video.url,
                    "thumbnail upload failed after video upload"
                );
                return Err(AppError::upload("Error while uploading thumbnail", e));
            }
        };

        let created = self
            .videos
            .insert(NewVideo {
                owner: caller.user_id,
                title,
                description,
                video_url: video.url,
                thumbnail_url: thumbnail.url,
                duration: video.duration.unwrap_or_default(),
            })
            .await?;

        info!(video_id = %created.id, caller = %caller.user_id, "video published");
        Ok(created)
    }

    /// Video detail with owner, like and subscription figures. Drafts are only
    /// visible to their owner.
    pub async fn get_video(&self, caller: Option<&Caller>, video_id: &str) -> Result<Value> {
        let video_id = parse_id(video_id, "video ID")?;

        let pipeline = pipelines::video_detail(video_id, caller);
        self.documents
            .aggregate(&pipeline)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    pub async fn update_video(
        &self,
        caller: &Caller,
        video_id: &str,
        input: UpdateVideo,
    ) -> Result<Video> {
        let video_id = parse_id(video_id, "video ID")?;
        let title = optional_text(input.title.as_deref(), "Title", MAX_TITLE_CHARS)?;
        let description = optional_text(
            input.description.as_deref(),
            "Description",
            MAX_DESCRIPTION_CHARS,
        )?;
        if title.is_none() && description.is_none() && input.thumbnail.is_none() {
            return Err(AppError::validation(
                "At least one of title, description or thumbnail is required",
            ));
        }

        let existing = self.find_video(video_id).await?;
        check_video_ownership(caller, &existing)?;

        let thumbnail_url = match input.thumbnail {
            Some(path) => Some(
                self.media
                    .upload(&path, MediaKind::Image)
                    .await
                    .map_err(|e| AppError::upload("Error while uploading thumbnail", e))?
                    .url,
            ),
            None => None,
        };

        let changes = VideoChanges {
            title,
            description,
            thumbnail_url,
        };
        let updated = self
            .videos
            .update(video_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        info!(%video_id, caller = %caller.user_id, "video updated");
        Ok(updated)
    }

    /// Delete the video together with its comments and likes.
    pub async fn delete_video(&self, caller: &Caller, video_id: &str) -> Result<()> {
        let video_id = parse_id(video_id, "video ID")?;
        let existing = self.find_video(video_id).await?;
        check_video_ownership(caller, &existing)?;

        if !self.videos.delete(video_id).await? {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        info!(%video_id, caller = %caller.user_id, "video deleted");
        Ok(())
    }

    /// Move a video between draft and published.
    pub async fn toggle_publish_status(&self, caller: &Caller, video_id: &str) -> Result<Video> {
        let video_id = parse_id(video_id, "video ID")?;
        let existing = self.find_video(video_id).await?;
        check_video_ownership(caller, &existing)?;

        let video = self
            .videos
            .toggle_published(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        info!(
            %video_id,
            caller = %caller.user_id,
            is_published = video.is_published,
            "video publish status toggled"
        );
        Ok(video)
    }

    async fn find_video(&self, video_id: uuid::Uuid) -> Result<Video> {
        self.videos
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }
}
