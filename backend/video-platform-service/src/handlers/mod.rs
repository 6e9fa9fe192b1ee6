/// HTTP request handlers and route registration
///
/// Handlers extract the caller, path, query and body, delegate to a service and wrap
/// the result in the response envelope. They hold no business rules.
pub mod comments;
pub mod health;
pub mod likes;
pub mod multipart;
pub mod subscriptions;
pub mod tweets;
pub mod videos;

pub use health::{health_summary, liveness_check, readiness_check};

use crate::error::AppError;
use crate::services::ListOptions;
use actix_web::web;
use query_pipeline::PageQuery;
use serde::{Deserialize, Deserializer};

/// Query string of listing endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    /// Channel scope of the video listing
    pub user_id: Option<String>,
}

impl ListQuery {
    pub fn options(&self) -> ListOptions {
        let page = PageQuery {
            page: self.page.clone(),
            limit: self.limit.clone(),
        };
        ListOptions::new(page.request()).sorted_by(self.sort_by.clone(), self.sort_type.clone())
    }
}

/// Deserialize a string with surrounding whitespace removed, so length limits
/// apply to the text that is stored.
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

/// Rejected JSON bodies are rendered through the error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::validation(format!("Invalid JSON body: {err}")).into())
}

/// Register every resource route. Mounted under `/api/v1` by the server.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::scope("/videos")
                .service(
                    web::resource("")
                        .route(web::get().to(videos::list_videos))
                        .route(web::post().to(videos::publish_video)),
                )
                .route(
                    "/toggle/publish/{video_id}",
                    web::patch().to(videos::toggle_publish_status),
                )
                .service(
                    web::resource("/{video_id}")
                        .route(web::get().to(videos::get_video))
                        .route(web::patch().to(videos::update_video))
                        .route(web::delete().to(videos::delete_video)),
                ),
        )
        .service(
            web::scope("/comments")
                .service(
                    web::resource("/c/{comment_id}")
                        .route(web::patch().to(comments::update_comment))
                        .route(web::delete().to(comments::delete_comment)),
                )
                .service(
                    web::resource("/{video_id}")
                        .route(web::get().to(comments::list_video_comments))
                        .route(web::post().to(comments::add_comment)),
                ),
        )
        .service(
            web::scope("/tweets")
                .service(web::resource("").route(web::post().to(tweets::create_tweet)))
                .route("/user/{user_id}", web::get().to(tweets::list_user_tweets))
                .service(
                    web::resource("/{tweet_id}")
                        .route(web::patch().to(tweets::update_tweet))
                        .route(web::delete().to(tweets::delete_tweet)),
                ),
        )
        .service(
            web::scope("/likes")
                .route("/toggle/v/{video_id}", web::post().to(likes::toggle_video_like))
                .route(
                    "/toggle/c/{comment_id}",
                    web::post().to(likes::toggle_comment_like),
                )
                .route("/toggle/t/{tweet_id}", web::post().to(likes::toggle_tweet_like))
                .route("/videos", web::get().to(likes::list_liked_videos)),
        )
        .service(
            web::scope("/subscriptions")
                .service(
                    web::resource("/c/{channel_id}")
                        .route(web::post().to(subscriptions::toggle_subscription))
                        .route(web::get().to(subscriptions::list_channel_subscribers)),
                )
                .route(
                    "/u/{subscriber_id}",
                    web::get().to(subscriptions::list_subscribed_channels),
                ),
        );
}
