/// Comment handlers - HTTP endpoints for comments under videos
use super::ListQuery;
use crate::error::Result;
use crate::middleware::MaybeCaller;
use crate::models::Caller;
use crate::response;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub content: String,
}

pub async fn list_video_comments(
    state: web::Data<AppState>,
    MaybeCaller(caller): MaybeCaller,
    video_id: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let page = state
        .comments
        .list_video_comments(caller.as_ref(), &video_id, &query.options())
        .await?;
    Ok(response::ok(page, "Comments retrieved successfully"))
}

pub async fn add_comment(
    state: web::Data<AppState>,
    caller: Caller,
    video_id: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let comment = state
        .comments
        .add_comment(&caller, &video_id, &req.content)
        .await?;
    Ok(response::created(comment, "Comment added successfully"))
}

pub async fn update_comment(
    state: web::Data<AppState>,
    caller: Caller,
    comment_id: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let comment = state
        .comments
        .update_comment(&caller, &comment_id, &req.content)
        .await?;
    Ok(response::ok(comment, "Comment updated successfully"))
}

pub async fn delete_comment(
    state: web::Data<AppState>,
    caller: Caller,
    comment_id: web::Path<String>,
) -> Result<HttpResponse> {
    state.comments.delete_comment(&caller, &comment_id).await?;
    Ok(response::ok(serde_json::json!({}), "Comment deleted successfully"))
}
