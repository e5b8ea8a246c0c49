use std::sync::atomic::Ordering;

use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::common::{CDN, TestApp, file_part, routes};

const CLIP: &[u8] = b"\x00\x00\x00\x18ftypmp42 launch film";
const COVER: &[u8] = b"\x89PNG\r\n\x1a\n cover";

fn video_form(title: &str, category: &str) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("category", category.to_string())
}

fn field_names(body: &Value) -> Vec<String> {
    body["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .map(|f| f["field"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

async fn add_by_url(app: &TestApp, token: &str, title: &str, category: &str) {
    let form = video_form(title, category).text("video_url", format!("https://vimeo.test/{title}"));
    let res = app
        .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(token))
        .await;
    assert_eq!(res.status, 201, "Submission failed: {}", res.text);
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn empty_portfolio_lists_nothing() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::VIDEOS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 0);
        assert_eq!(res.body["stale"], false);
        assert_eq!(res.body["videos"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn videos_are_listed_newest_first_and_filterable() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        add_by_url(&app, &token, "first-reel", "Reels").await;
        add_by_url(&app, &token, "app-redesign", "UI/UX").await;

        let res = app.get_without_token(routes::VIDEOS).await;
        assert_eq!(res.body["total"], 2);
        assert_eq!(res.body["videos"][0]["title"], "app-redesign");
        assert_eq!(res.body["videos"][1]["title"], "first-reel");

        let res = app.get_without_token(&routes::videos_in("UI/UX")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["videos"][0]["category"], "UI/UX");

        let res = app.get_without_token(&routes::videos_in("All")).await;
        assert_eq!(res.body["total"], 2);
    }

    #[tokio::test]
    async fn unknown_category_filter_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::videos_in("Podcasts")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unreachable_row_store_serves_the_last_listing_as_stale() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        add_by_url(&app, &token, "kept", "Animation").await;

        app.videos.fail_list.store(true, Ordering::SeqCst);
        let res = app.get_without_token(routes::VIDEOS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["stale"], true);
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["videos"][0]["title"], "kept");
    }

    #[tokio::test]
    async fn admin_listing_requires_a_session() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ADMIN_VIDEOS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "SESSION_REQUIRED");
    }
}

mod submission {
    use super::*;

    #[tokio::test]
    async fn submission_requires_a_session() {
        let app = TestApp::spawn().await;
        let form = video_form("Launch Film", "Animation").text("video_url", "https://vimeo.test/1");

        let res = app.multipart_with_token(routes::ADMIN_VIDEOS, form, None).await;

        assert_eq!(res.status, 401);
        assert_eq!(app.videos.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn uploads_files_then_inserts_the_row() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = video_form("Launch Film", "Animation")
            .text("description", "Product launch")
            .part("video", file_part("launch.mp4", CLIP, "video/mp4"))
            .part("thumbnail", file_part("cover.png", COVER, "image/png"));

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 201, "Submission failed: {}", res.text);
        assert_eq!(res.body["message"], "Video added successfully!");

        let uploads = app.objects.uploads();
        assert_eq!(uploads.len(), 2);
        let (video, thumb) = (&uploads[0], &uploads[1]);
        assert_eq!(video.bucket, "videos");
        assert!(video.key.ends_with(".mp4"), "got {}", video.key);
        assert_eq!(video.len, CLIP.len());
        assert_eq!(video.options.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(video.options.cache_control_secs, 3600);
        assert!(!video.options.upsert);
        assert_eq!(thumb.bucket, "images");
        assert!(thumb.key.starts_with("thumb-"), "got {}", thumb.key);
        assert!(thumb.key.ends_with(".png"), "got {}", thumb.key);

        let record = &res.body["video"];
        assert_eq!(record["title"], "Launch Film");
        assert_eq!(record["description"], "Product launch");
        assert_eq!(record["category"], "Animation");
        assert_eq!(
            record["video_url"],
            format!("{CDN}/videos/{}", video.key).as_str()
        );
        assert_eq!(
            record["thumbnail_url"],
            format!("{CDN}/images/{}", thumb.key).as_str()
        );

        assert_eq!(res.body["videos"].as_array().map(Vec::len), Some(1));
        assert_eq!(res.body["videos"][0]["id"], record["id"]);
    }

    #[tokio::test]
    async fn video_url_is_stored_verbatim_without_uploading() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let url = "https://player.vimeo.test/video/42?h=abc";
        let form = video_form("Linked", "CGI")
            .text("video_url", url)
            .text("thumbnail_url", "https://img.test/cover.jpg");

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 201, "Submission failed: {}", res.text);
        assert_eq!(res.body["video"]["video_url"], url);
        assert_eq!(res.body["video"]["thumbnail_url"], "https://img.test/cover.jpg");
        assert_eq!(res.body["video"]["category"], "CGI");
        assert!(app.objects.uploads().is_empty());
    }

    #[tokio::test]
    async fn entered_url_text_is_not_rewritten() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let url = " https://player.vimeo.test/video/42 ";
        let form = video_form("Padded", "Reels").text("video_url", url);

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 201, "Submission failed: {}", res.text);
        assert_eq!(res.body["video"]["video_url"], url);
    }

    #[tokio::test]
    async fn missing_fields_are_reported_before_any_call() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = Form::new().text("description", "no title");

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let fields = field_names(&res.body);
        for expected in ["title", "category", "video"] {
            assert!(fields.iter().any(|f| f == expected), "missing {expected} in {fields:?}");
        }
        assert!(app.objects.uploads().is_empty());
        assert_eq!(app.videos.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn file_and_url_for_the_same_slot_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = video_form("Both", "Reels")
            .text("video_url", "https://vimeo.test/both")
            .part("video", file_part("both.mp4", CLIP, "video/mp4"));

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["fields"][0]["message"],
            "Provide either a video file or a video URL, not both"
        );
        assert!(app.objects.uploads().is_empty());
    }

    #[tokio::test]
    async fn wrong_file_type_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let form = video_form("Notes", "Reels").part("video", file_part("notes.txt", b"hello", "text/plain"));

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["fields"][0]["field"], "video");
        assert_eq!(res.body["fields"][0]["message"], "File must be a video");
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let big = Part::bytes(vec![0u8; 1024 * 1024 + 1])
            .file_name("big.mp4")
            .mime_str("video/mp4")
            .expect("Failed to set MIME type");
        let form = video_form("Big", "Reels").part("video", big);

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["fields"][0]["message"], "File exceeds the 1 MB upload limit");
        assert!(app.objects.uploads().is_empty());
    }

    #[tokio::test]
    async fn empty_file_part_is_ignored() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let empty = Part::bytes(Vec::new()).file_name("");
        let form = video_form("Linked", "Reels")
            .part("thumbnail", empty)
            .text("video_url", "https://vimeo.test/linked");

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 201, "Submission failed: {}", res.text);
        assert!(res.body["video"]["thumbnail_url"].is_null());
    }

    #[tokio::test]
    async fn storage_failure_stops_before_the_insert() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.objects.fail.store(true, Ordering::SeqCst);
        let form = video_form("Launch Film", "Animation")
            .part("video", file_part("launch.mp4", CLIP, "video/mp4"));

        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_ERROR");
        assert_eq!(
            res.body["message"],
            "Error uploading video. Please check your storage configuration."
        );
        assert_eq!(app.videos.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_insert_leaves_the_listing_unchanged() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        add_by_url(&app, &token, "existing", "Reels").await;

        app.videos.fail_insert.store(true, Ordering::SeqCst);
        let form = video_form("Rejected", "Reels").text("video_url", "https://vimeo.test/rejected");
        let res = app
            .multipart_with_token(routes::ADMIN_VIDEOS, form, Some(&token))
            .await;
        assert_eq!(res.status, 502);

        let res = app.get_with_token(routes::ADMIN_VIDEOS, &token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["videos"][0]["title"], "existing");
    }
}
