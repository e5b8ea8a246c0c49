use std::sync::atomic::Ordering;

use serde_json::json;

use crate::common::{TestApp, routes};

mod case_studies {
    use super::*;

    #[tokio::test]
    async fn admin_can_add_a_case_study() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::ADMIN_CASE_STUDIES,
                &json!({
                    "title": "  Luxury Rebrand ",
                    "client": "Maison Aurelle",
                    "category": "Branding",
                    "year": 2024,
                    "overview": "   "
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "Create failed: {}", res.text);
        assert_eq!(res.body["message"], "Case study added successfully!");
        assert_eq!(res.body["case_study"]["title"], "Luxury Rebrand");
        assert_eq!(res.body["case_study"]["year"], 2024);
        assert!(res.body["case_study"]["overview"].is_null());
        assert_eq!(res.body["case_studies"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn case_studies_are_public_and_fetchable_by_id() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        let created = app
            .post_with_token(
                routes::ADMIN_CASE_STUDIES,
                &json!({"title": "Harbor Launch", "client": "Harbor", "category": "Campaign"}),
                &token,
            )
            .await;
        let id = created.body["case_study"]["id"]
            .as_str()
            .expect("created case study should have an id")
            .to_string();

        let res = app.get_without_token(routes::CASE_STUDIES).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["case_studies"][0]["client"], "Harbor");

        let res = app.get_without_token(&routes::case_study(&id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Harbor Launch");
    }

    #[tokio::test]
    async fn unknown_case_study_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&routes::case_study("0192f0c1-7b1e-7000-8000-000000000000"))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(res.body["message"], "Case study not found");
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::case_study("not-a-uuid")).await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn invalid_case_study_is_not_stored() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::ADMIN_CASE_STUDIES,
                &json!({"title": "", "client": "", "category": "Branding", "year": 1850}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["fields"].as_array().map(Vec::len), Some(3));
        assert_eq!(app.case_studies.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn adding_requires_a_session() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::ADMIN_CASE_STUDIES,
                &json!({"title": "T", "client": "C", "category": "Branding"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(app.case_studies.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejected_insert_is_an_upstream_error() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.case_studies.fail_insert.store(true, Ordering::SeqCst);

        let res = app
            .post_with_token(
                routes::ADMIN_CASE_STUDIES,
                &json!({"title": "T", "client": "C", "category": "Branding"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_ERROR");
    }
}

mod showcase {
    use super::*;

    #[tokio::test]
    async fn admin_can_add_a_showcase_item() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::ADMIN_SHOWCASE,
                &json!({
                    "title": "Behind the scenes",
                    "item_type": "image",
                    "media_url": "https://cdn.test/images/bts.jpg",
                    "category": "Studio"
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "Create failed: {}", res.text);
        assert_eq!(res.body["message"], "Showcase item added successfully!");
        assert_eq!(res.body["item"]["item_type"], "image");
        assert_eq!(res.body["items"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn item_type_defaults_to_video() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::ADMIN_SHOWCASE,
                &json!({"title": "Reel", "media_url": "https://cdn.test/videos/reel.mp4"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "Create failed: {}", res.text);
        assert_eq!(res.body["item"]["item_type"], "video");

        let res = app.get_without_token(routes::SHOWCASE).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["items"][0]["title"], "Reel");
    }

    #[tokio::test]
    async fn non_http_media_url_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::ADMIN_SHOWCASE,
                &json!({"title": "Local", "media_url": "file:///tmp/reel.mp4"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["fields"][0]["field"], "media_url");
        assert_eq!(res.body["fields"][0]["message"], "Media URL must be an http(s) URL");
        assert_eq!(app.showcase.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_store_marks_the_listing_stale() {
        let app = TestApp::spawn().await;
        app.showcase.fail_list.store(true, Ordering::SeqCst);

        let res = app.get_without_token(routes::SHOWCASE).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["stale"], true);
        assert_eq!(res.body["total"], 0);
    }
}
