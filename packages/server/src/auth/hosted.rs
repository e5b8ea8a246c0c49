use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{AuthError, AuthProvider, Session, SessionEvent, token_fingerprint};
use crate::utils::jwt;

const EVENT_CAPACITY: usize = 64;

/// Auth provider reached over its REST API (`{endpoint}/auth/v1`).
///
/// With a JWT secret configured, access tokens are verified locally instead
/// of asking the provider on every request.
pub struct HostedAuth {
    http: Client,
    endpoint: String,
    anon_key: String,
    jwt_secret: Option<String>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserResponse,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize, Default)]
struct ProviderError {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl ProviderError {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

impl HostedAuth {
    pub fn new(
        http: Client,
        endpoint: &str,
        anon_key: impl Into<String>,
        jwt_secret: Option<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            jwt_secret: jwt_secret.filter(|s| !s.is_empty()),
            events,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.endpoint)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn verify_locally(&self, secret: &str, access_token: &str) -> Option<Session> {
        match jwt::verify(access_token, secret) {
            Ok(claims) => Some(Session {
                expires_at: claims.expires_at(),
                user_id: claims.sub,
                email: claims.email,
                access_token: access_token.to_string(),
            }),
            Err(e) => {
                debug!("Access token failed local verification: {}", e);
                None
            }
        }
    }
}

async fn rejection(res: Response) -> AuthError {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    if status.is_client_error() {
        let parsed: ProviderError = serde_json::from_str(&body).unwrap_or_default();
        AuthError::Rejected(parsed.into_message())
    } else {
        AuthError::Unexpected {
            status: status.as_u16(),
            body,
        }
    }
}

fn expiry(token: &TokenResponse) -> Option<DateTime<Utc>> {
    match (token.expires_at, token.expires_in) {
        (Some(at), _) => DateTime::from_timestamp(at, 0),
        (None, Some(secs)) => Some(Utc::now() + chrono::Duration::seconds(secs)),
        (None, None) => None,
    }
}

#[async_trait]
impl AuthProvider for HostedAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let res = self
            .http
            .post(self.url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(rejection(res).await);
        }

        let token: TokenResponse = res.json().await?;
        let session = Session {
            expires_at: expiry(&token),
            user_id: token.user.id,
            email: token.user.email,
            access_token: token.access_token,
        };

        info!(subject = %session.subject(), "Signed in");
        self.publish(SessionEvent::SignedIn {
            subject: session.subject().to_string(),
        });
        Ok(session)
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        if let Some(secret) = &self.jwt_secret {
            return Ok(self.verify_locally(secret, access_token));
        }

        let res = self
            .http
            .get(self.url("user"))
            .bearer_auth(access_token)
            .header("apikey", &self.anon_key)
            .send()
            .await?;

        match res.status() {
            s if s.is_success() => {
                let user: UserResponse = res.json().await?;
                Ok(Some(Session {
                    user_id: user.id,
                    email: user.email,
                    access_token: access_token.to_string(),
                    expires_at: None,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            _ => Err(rejection(res).await),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let expires_at = self
            .jwt_secret
            .as_deref()
            .and_then(|secret| jwt::verify(access_token, secret).ok())
            .and_then(|claims| claims.expires_at());

        let res = self
            .http
            .post(self.url("logout"))
            .bearer_auth(access_token)
            .header("apikey", &self.anon_key)
            .send()
            .await?;

        let status = res.status();
        // An already-ended session is still signed out.
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let err = rejection(res).await;
            warn!("Provider sign-out failed: {}", err);
            return Err(err);
        }

        self.publish(SessionEvent::SignedOut {
            fingerprint: token_fingerprint(access_token),
            expires_at,
        });
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
