/// Video handlers - HTTP endpoints for video operations
use super::multipart::read_form;
use super::ListQuery;
use crate::error::Result;
use crate::middleware::MaybeCaller;
use crate::models::Caller;
use crate::response;
use crate::services::{PublishVideo, UpdateVideo};
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

/// List published videos, optionally for one channel (`userId`)
pub async fn list_videos(
    state: web::Data<AppState>,
    MaybeCaller(caller): MaybeCaller,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let page = state
        .videos
        .list_videos(caller.as_ref(), query.user_id.as_deref(), &query.options())
        .await?;
    Ok(response::ok(page, "Videos fetched successfully"))
}

/// Publish a video from a multipart form (`title`, `description`, `videoFile`, `thumbnail`)
pub async fn publish_video(
    state: web::Data<AppState>,
    caller: Caller,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_form(
        payload,
        &state.upload_dir,
        &["videoFile", "thumbnail"],
        state.max_upload_bytes,
    )
    .await?;

    let input = PublishVideo {
        title: form.text("title").unwrap_or_default().to_string(),
        description: form.text("description").unwrap_or_default().to_string(),
        video_file: form.file("videoFile").map(|f| f.path().to_path_buf()),
        thumbnail: form.file("thumbnail").map(|f| f.path().to_path_buf()),
    };
    let video = state.videos.publish_video(&caller, input).await?;

    Ok(response::created(video, "Video published successfully"))
}

pub async fn get_video(
    state: web::Data<AppState>,
    MaybeCaller(caller): MaybeCaller,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    let video = state.videos.get_video(caller.as_ref(), &video_id).await?;
    Ok(response::ok(video, "Video fetched successfully"))
}

/// Partial update from a multipart form (`title?`, `description?`, `thumbnail?`)
pub async fn update_video(
    state: web::Data<AppState>,
    caller: Caller,
    video_id: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_form(
        payload,
        &state.upload_dir,
        &["thumbnail"],
        state.max_upload_bytes,
    )
    .await?;

    let input = UpdateVideo {
        title: form.text("title").map(str::to_owned),
        description: form.text("description").map(str::to_owned),
        thumbnail: form.file("thumbnail").map(|f| f.path().to_path_buf()),
    };
    let video = state
        .videos
        .update_video(&caller, &video_id, input)
        .await?;

    Ok(response::ok(video, "Video updated successfully"))
}

pub async fn delete_video(
    state: web::Data<AppState>,
    caller: Caller,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    state.videos.delete_video(&caller, &video_id).await?;
    Ok(response::ok(serde_json::json!({}), "Video deleted successfully"))
}

pub async fn toggle_publish_status(
    state: web::Data<AppState>,
    caller: Caller,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    let video = state
        .videos
        .toggle_publish_status(&caller, &video_id)
        .await?;
    Ok(response::ok(video, "Video status toggled successfully"))
}

#[cfg(test)]
mod tests {
    use crate::handlers::multipart::tests::{body, content_type};
    use crate::handlers::test_support::{app, bearer, Mocks};
    use crate::media::{MediaKind, UploadedMedia};
    use crate::models::Video;
    use crate::services::test_support::page_of;
    use actix_web::http::{header, StatusCode};
    use actix_web::test;
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    #[actix_web::test]
    async fn listing_coerces_paging_and_labels_docs() {
        let mut mocks = Mocks::default();
        mocks
            .documents
            .expect_aggregate_paginate()
            .withf(|_, request| request.page() == 1 && request.limit() == 10)
            .returning(|_, request| Ok(page_of(vec![json!({"title": "a"})], 1, request)));
        let app = test::init_service(app(mocks.into_state())).await;

        let req = test::TestRequest::get()
            .uri("/api/v1/videos?page=abc&limit=0")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["totalVideos"], 1);
        assert_eq!(body["data"]["videos"][0]["title"], "a");
        assert_eq!(body["data"]["limit"], 10);
    }

    #[actix_web::test]
    async fn invalid_sort_key_is_bad_request() {
        let app = test::init_service(app(Mocks::default().into_state())).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/videos?sortBy=password")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn malformed_video_id_renders_error_envelope() {
        let app = test::init_service(app(Mocks::default().into_state())).await;
        let req = test::TestRequest::get()
            .uri("/api/v1/videos/not-a-uuid")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["message"], "Invalid video ID");
    }

    #[actix_web::test]
    async fn toggle_publish_requires_authentication() {
        let app = test::init_service(app(Mocks::default().into_state())).await;
        let req = test::TestRequest::patch()
            .uri(&format!("/api/v1/videos/toggle/publish/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn publish_uploads_files_and_returns_created() {
        let owner = Uuid::new_v4();
        let mut mocks = Mocks::default();
        mocks.media.expect_upload().times(2).returning(|path, kind| {
            assert!(path.exists());
            Ok(UploadedMedia {
                url: format!("https://cdn/{}", kind.resource_type()),
                duration: (kind == MediaKind::Video).then_some(3.5),
            })
        });
        mocks.videos.expect_insert().returning(|v| {
            Ok(Video {
                id: Uuid::new_v4(),
                owner: v.owner,
                title: v.title,
                description: v.description,
                video_url: v.video_url,
                thumbnail_url: v.thumbnail_url,
                duration: v.duration,
                is_published: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        });
        let app = test::init_service(app(mocks.into_state())).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/videos")
            .insert_header(bearer(owner))
            .insert_header((header::CONTENT_TYPE, content_type()))
            .set_payload(body(
                &[("title", "My video"), ("description", "About it")],
                &[
                    ("videoFile", "clip.mp4", b"video-bytes"),
                    ("thumbnail", "thumb.png", b"png"),
                ],
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["owner"], owner.to_string());
        assert_eq!(body["data"]["videoUrl"], "https://cdn/video");
        assert_eq!(body["data"]["duration"], 3.5);
        assert_eq!(body["data"]["isPublished"], false);
    }

    #[actix_web::test]
    async fn publish_without_files_is_bad_request() {
        let app = test::init_service(app(Mocks::default().into_state())).await;
        let req = test::TestRequest::post()
            .uri("/api/v1/videos")
            .insert_header(bearer(Uuid::new_v4()))
            .insert_header((header::CONTENT_TYPE, content_type()))
            .set_payload(body(&[("title", "t"), ("description", "d")], &[]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
