/// Like handlers - toggles answer 201 when a like is added and 200 when removed
use super::ListQuery;
use crate::error::Result;
use crate::models::{Caller, Like, Toggled};
use crate::response;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

fn toggled(result: Toggled<Like>, resource: &str) -> HttpResponse {
    match result {
        Toggled::Added(like) => response::created(like, format!("{resource} liked successfully")),
        Toggled::Removed(like) => response::ok(like, format!("{resource} unliked successfully")),
    }
}

pub async fn toggle_video_like(
    state: web::Data<AppState>,
    caller: Caller,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state.likes.toggle_video_like(&caller, &video_id).await?;
    Ok(toggled(result, "Video"))
}

pub async fn toggle_comment_like(
    state: web::Data<AppState>,
    caller: Caller,
    comment_id: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state
        .likes
        .toggle_comment_like(&caller, &comment_id)
        .await?;
    Ok(toggled(result, "Comment"))
}

pub async fn toggle_tweet_like(
    state: web::Data<AppState>,
    caller: Caller,
    tweet_id: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state.likes.toggle_tweet_like(&caller, &tweet_id).await?;
    Ok(toggled(result, "Tweet"))
}

pub async fn list_liked_videos(
    state: web::Data<AppState>,
    caller: Caller,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let page = state
        .likes
        .list_liked_videos(&caller, &query.options())
        .await?;
    Ok(response::ok(page, "Liked videos fetched successfully"))
}
