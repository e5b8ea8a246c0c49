//! Auth provider boundary.

mod hosted;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::broadcast;

pub use hosted::HostedAuth;

/// A session issued by the auth provider. The provider owns it; the server
/// only observes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Provider user id.
    pub user_id: String,
    pub email: Option<String>,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Identifier shown for the signed-in user: the email when known.
    pub fn subject(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.user_id)
    }

    pub fn fingerprint(&self) -> String {
        token_fingerprint(&self.access_token)
    }
}

/// Session-change notification published by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { subject: String },
    /// The session identified by `fingerprint` has ended.
    SignedOut {
        fingerprint: String,
        expires_at: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider refused the request, optionally saying why.
    #[error("{}", .0.as_deref().unwrap_or("request rejected by auth provider"))]
    Rejected(Option<String>),

    #[error("auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("auth provider returned {status}: {body}")]
    Unexpected { status: u16, body: String },
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange an email and password for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, AuthError>;

    /// Resolve the session an access token belongs to. `Ok(None)` when the
    /// token is unknown, expired or invalid.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError>;

    /// End the session server-side.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Subscribe to session changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

/// Hex SHA-256 of an access token, used to refer to a session without
/// keeping the token itself around.
pub fn token_fingerprint(access_token: &str) -> String {
    hex::encode(Sha256::digest(access_token.as_bytes()))
}
