/// Tweet handlers - HTTP endpoints for tweets
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
pub struct TweetRequest {
    #[serde(default, deserialize_with = "super::trimmed")]
    #[validate(length(max = 280, message = "must be at most 280 characters"))]
    pub content: String,
}

pub async fn create_tweet(
    state: web::Data<AppState>,
    caller: Caller,
    req: web::Json<TweetRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let tweet = state.tweets.create_tweet(&caller, &req.content).await?;
    Ok(response::created(tweet, "Tweet created successfully"))
}

pub async fn list_user_tweets(
    state: web::Data<AppState>,
    MaybeCaller(caller): MaybeCaller,
    user_id: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let page = state
        .tweets
        .list_user_tweets(caller.as_ref(), &user_id, &query.options())
        .await?;
    Ok(response::ok(page, "Tweets fetched successfully"))
}

pub async fn update_tweet(
    state: web::Data<AppState>,
    caller: Caller,
    tweet_id: web::Path<String>,
    req: web::Json<TweetRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let tweet = state
        .tweets
        .update_tweet(&caller, &tweet_id, &req.content)
        .await?;
    Ok(response::ok(tweet, "Tweet updated successfully"))
}

pub async fn delete_tweet(
    state: web::Data<AppState>,
    caller: Caller,
    tweet_id: web::Path<String>,
) -> Result<HttpResponse> {
    state.tweets.delete_tweet(&caller, &tweet_id).await?;
    Ok(response::ok(serde_json::json!({}), "Tweet deleted successfully"))
}
