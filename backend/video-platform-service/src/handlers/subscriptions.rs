/// Subscription handlers - HTTP endpoints for channel subscriptions
use super::ListQuery;
use crate::error::Result;
use crate::models::{Caller, Toggled};
use crate::response;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub async fn toggle_subscription(
    state: web::Data<AppState>,
    caller: Caller,
    channel_id: web::Path<String>,
) -> Result<HttpResponse> {
    let result = state
        .subscriptions
        .toggle_subscription(&caller, &channel_id)
        .await?;

    Ok(match result {
        Toggled::Added(subscription) => response::ok(
            json!({"subscribed": true, "subscription": subscription}),
            "Subscribed successfully",
        ),
        Toggled::Removed(subscription) => response::ok(
            json!({"subscribed": false, "subscription": subscription}),
            "Subscription removed successfully",
        ),
    })
}

pub async fn list_channel_subscribers(
    state: web::Data<AppState>,
    channel_id: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let page = state
        .subscriptions
        .list_channel_subscribers(&channel_id, &query.options())
        .await?;
    Ok(response::ok(page, "Subscribers fetched successfully"))
}

pub async fn list_subscribed_channels(
    state: web::Data<AppState>,
    subscriber_id: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let page = state
        .subscriptions
        .list_subscribed_channels(&subscriber_id, &query.options())
        .await?;
    Ok(response::ok(page, "Subscribed channels fetched successfully"))
}
