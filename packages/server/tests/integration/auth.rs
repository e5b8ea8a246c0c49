use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;

use crate::common::{ADMIN_EMAIL, ADMIN_PASSWORD, SILENT_EMAIL, TestApp, TestResponse, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn admin_can_sign_in_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "Login failed: {}", res.text);
        assert_eq!(res.body["email"], ADMIN_EMAIL);
        assert_eq!(res.body["redirect_to"], "/admin");
        assert!(res.body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

        let cookie = res.set_cookie.expect("login should set the session cookie");
        assert!(cookie.starts_with("studio-access-token="), "got {cookie}");
        assert!(cookie.contains("HttpOnly"), "got {cookie}");
        assert!(cookie.contains("SameSite=Lax"), "got {cookie}");
        assert!(cookie.contains("Path=/"), "got {cookie}");
    }

    #[tokio::test]
    async fn wrong_password_shows_the_provider_message() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": ADMIN_EMAIL, "password": "wrong-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
        assert_eq!(res.body["message"], "Invalid login credentials");
        assert!(res.set_cookie.is_none());
    }

    #[tokio::test]
    async fn refusal_without_a_message_uses_the_generic_text() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": SILENT_EMAIL, "password": "anything"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(
            res.body["message"],
            "Failed to sign in. Please check your credentials."
        );
    }

    #[tokio::test]
    async fn malformed_credentials_never_reach_the_provider() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "not-an-email", "password": ""}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let fields: Vec<_> = res.body["fields"]
            .as_array()
            .expect("fields should be listed")
            .iter()
            .map(|f| f["field"].as_str().unwrap_or_default().to_string())
            .collect();
        assert!(fields.contains(&"email".to_string()), "got {fields:?}");
        assert!(fields.contains(&"password".to_string()), "got {fields:?}");
        assert_eq!(app.auth.sign_in_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_outage_is_reported_as_upstream_error() {
        let app = TestApp::spawn().await;
        app.auth.unavailable.store(true, Ordering::SeqCst);

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "UPSTREAM_ERROR");
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn anonymous_caller_is_signed_out() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::SESSION).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["signed_in"], false);
        assert!(res.body["email"].is_null());
    }

    #[tokio::test]
    async fn bearer_token_resolves_to_the_signed_in_admin() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(routes::SESSION, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["signed_in"], true);
        assert_eq!(res.body["email"], ADMIN_EMAIL);
    }

    #[tokio::test]
    async fn unknown_token_is_signed_out() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::SESSION, "forged-token").await;

        assert_eq!(res.body["signed_in"], false);
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.post_with_token(routes::LOGOUT, &json!({}), &token).await;
        assert_eq!(res.status, 204);
        let cookie = res.set_cookie.expect("logout should clear the cookie");
        assert!(cookie.starts_with("studio-access-token=;"), "got {cookie}");
        assert!(cookie.contains("Max-Age=0"), "got {cookie}");
        assert!(cookie.contains("Path=/"), "got {cookie}");

        let res = app.get_with_token(routes::SESSION, &token).await;
        assert_eq!(res.body["signed_in"], false);

        let res = app.get_with_token(routes::ADMIN_VIDEOS, &token).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "SESSION_REQUIRED");
    }

    #[tokio::test]
    async fn logout_without_a_session_succeeds() {
        let app = TestApp::spawn().await;

        let res = app.post_without_token(routes::LOGOUT, &json!({})).await;

        assert_eq!(res.status, 204);
        let cookie = res.set_cookie.expect("logout should clear the cookie");
        assert!(cookie.contains("Max-Age=0"), "got {cookie}");
    }

    #[tokio::test]
    async fn browser_logout_drops_the_session_cookie() {
        let app = TestApp::spawn().await;
        let browser = app.browser();

        let res = browser
            .post(app.url(routes::LOGIN))
            .json(&json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}))
            .send()
            .await
            .expect("Failed to send login request");
        assert_eq!(res.status().as_u16(), 200);

        let res = browser
            .post(app.url(routes::LOGOUT))
            .send()
            .await
            .expect("Failed to send logout request");
        assert_eq!(res.status().as_u16(), 204);

        let res = browser
            .get(app.url(routes::ADMIN_HOME))
            .send()
            .await
            .expect("Failed to send GET request");
        let res = TestResponse::from_response(res).await;
        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some("/admin/login"));
    }

    #[tokio::test]
    async fn provider_side_expiry_ends_the_session() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        app.auth.expire(&token);

        let res = app.get_with_token(routes::ADMIN_VIDEOS, &token).await;
        assert_eq!(res.status, 401);
    }
}

mod guard {
    use super::*;

    #[tokio::test]
    async fn signed_out_visitor_is_redirected_to_login() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ADMIN_HOME).await;

        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some("/admin/login"));
    }

    #[tokio::test]
    async fn signed_in_admin_sees_the_overview() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let res = app.get_with_token(routes::ADMIN_HOME, &token).await;

        assert_eq!(res.status, 200, "Overview failed: {}", res.text);
        assert_eq!(res.body["signed_in_as"], ADMIN_EMAIL);
        assert_eq!(res.body["videos"], 0);
        assert_eq!(res.body["case_studies"], 0);
        assert_eq!(res.body["showcase_items"], 0);
    }

    #[tokio::test]
    async fn session_cookie_opens_the_admin_surface() {
        let app = TestApp::spawn().await;
        let browser = app.browser();

        let res = browser
            .post(app.url(routes::LOGIN))
            .json(&json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}))
            .send()
            .await
            .expect("Failed to send login request");
        assert_eq!(res.status().as_u16(), 200);

        let res = browser
            .get(app.url(routes::ADMIN_HOME))
            .send()
            .await
            .expect("Failed to send GET request");
        let res = TestResponse::from_response(res).await;
        assert_eq!(res.status, 200, "Overview failed: {}", res.text);

        let res = browser
            .get(app.url(routes::ADMIN_LOGIN))
            .send()
            .await
            .expect("Failed to send GET request");
        let res = TestResponse::from_response(res).await;
        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some("/admin"));
    }

    #[tokio::test]
    async fn login_entry_describes_where_to_sign_in() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ADMIN_LOGIN).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["login_endpoint"], "/api/v1/auth/login");
        assert_eq!(res.body["redirect_to"], "/admin");
    }

    #[tokio::test]
    async fn failed_session_lookup_is_treated_as_signed_out() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;
        app.auth.fail_lookups.store(true, Ordering::SeqCst);

        let res = app.get_with_token(routes::ADMIN_HOME, &token).await;

        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some("/admin/login"));
    }
}

mod events {
    use super::*;

    /// Read the event stream until `marker` appears.
    async fn read_until(res: &mut reqwest::Response, seen: &mut String, marker: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !seen.contains(marker) {
                let chunk = res
                    .chunk()
                    .await
                    .expect("Failed to read event stream")
                    .unwrap_or_else(|| panic!("stream ended before {marker}: {seen}"));
                seen.push_str(&String::from_utf8_lossy(&chunk));
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {marker}: {seen}"));
    }

    #[tokio::test]
    async fn stream_reports_sign_in_then_sign_out() {
        let app = TestApp::spawn().await;
        let token = app.admin_token().await;

        let mut res = app
            .client
            .get(app.url(routes::SESSION_EVENTS))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to open event stream");
        assert_eq!(res.status().as_u16(), 200);

        let mut seen = String::new();
        read_until(&mut res, &mut seen, r#""state":"signed_in""#).await;
        assert!(seen.contains("event: session"), "got {seen}");
        assert!(seen.contains(r#""decision":"render""#), "got {seen}");

        let out = app.post_with_token(routes::LOGOUT, &json!({}), &token).await;
        assert_eq!(out.status, 204);

        read_until(&mut res, &mut seen, r#""state":"signed_out""#).await;
        assert!(seen.contains(r#""redirect_to":"/admin/login""#), "got {seen}");

        let end = tokio::time::timeout(Duration::from_secs(5), res.chunk())
            .await
            .expect("stream should close after signing out");
        assert!(matches!(end, Ok(None)), "stream kept going: {end:?}");
    }

    #[tokio::test]
    async fn anonymous_stream_ends_signed_out() {
        let app = TestApp::spawn().await;

        let mut res = app
            .client
            .get(app.url(routes::SESSION_EVENTS))
            .send()
            .await
            .expect("Failed to open event stream");

        let mut seen = String::new();
        read_until(&mut res, &mut seen, r#""state":"signed_out""#).await;
        assert!(seen.contains(r#""decision":"redirect""#), "got {seen}");
    }
}
