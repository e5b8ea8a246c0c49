//! Session guard for the admin surface.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthProvider, Session, SessionEvent, token_fingerprint};

/// What the guard knows about a caller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// Resolution has not completed yet.
    Pending,
    SignedIn(Session),
    SignedOut,
}

/// What the admin surface should do for a given [`GuardState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show nothing and do not redirect.
    Loading,
    Redirect(String),
    Render { subject: String },
}

impl GuardState {
    pub fn decide(&self, login_path: &str) -> GuardDecision {
        match self {
            GuardState::Pending => GuardDecision::Loading,
            GuardState::SignedOut => GuardDecision::Redirect(login_path.to_string()),
            GuardState::SignedIn(session) => GuardDecision::Render {
                subject: session.subject().to_string(),
            },
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            GuardState::SignedIn(session) => Some(session),
            _ => None,
        }
    }
}

pub struct SessionGuard {
    provider: Arc<dyn AuthProvider>,
    login_path: String,
    /// Fingerprints of ended sessions, with the token expiry when known.
    revoked: DashMap<String, Option<DateTime<Utc>>>,
    revocations: broadcast::Sender<String>,
}

impl SessionGuard {
    /// Build the guard and start listening to the provider's session events.
    pub fn spawn(provider: Arc<dyn AuthProvider>, login_path: impl Into<String>) -> Arc<Self> {
        let events = provider.subscribe();
        let (revocations, _) = broadcast::channel(64);
        let guard = Arc::new(Self {
            provider,
            login_path: login_path.into(),
            revoked: DashMap::new(),
            revocations,
        });
        tokio::spawn(listen(Arc::downgrade(&guard), events));
        guard
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn provider(&self) -> &Arc<dyn AuthProvider> {
        &self.provider
    }

    /// Resolve the session behind an access token.
    ///
    /// Missing, revoked, expired and unknown tokens, and provider failures,
    /// all resolve to [`GuardState::SignedOut`].
    pub async fn resolve(&self, access_token: Option<&str>) -> GuardState {
        let Some(token) = access_token.filter(|t| !t.is_empty()) else {
            return GuardState::SignedOut;
        };

        if self.is_revoked(token) {
            debug!("Rejected revoked access token");
            return GuardState::SignedOut;
        }

        match self.provider.get_session(token).await {
            Ok(Some(session)) if session.expires_at.is_none_or(|at| at > Utc::now()) => {
                GuardState::SignedIn(session)
            }
            Ok(_) => GuardState::SignedOut,
            Err(e) => {
                warn!("Session lookup failed, treating caller as signed out: {}", e);
                GuardState::SignedOut
            }
        }
    }

    /// Follow a token's guard state: `Pending`, then the resolution, then
    /// `SignedOut` if the session ends while watched.
    pub fn watch(self: &Arc<Self>, access_token: Option<String>) -> watch::Receiver<GuardState> {
        let (tx, rx) = watch::channel(GuardState::Pending);
        let guard = Arc::clone(self);
        // Subscribe before resolving so a sign-out racing the lookup is seen.
        let mut revocations = self.revocations.subscribe();

        tokio::spawn(async move {
            let state = guard.resolve(access_token.as_deref()).await;
            let fingerprint = state.session().map(Session::fingerprint);
            if tx.send(state).is_err() {
                return;
            }
            let Some(fingerprint) = fingerprint else {
                return;
            };
            if guard.revoked.contains_key(&fingerprint) {
                let _ = tx.send(GuardState::SignedOut);
                return;
            }

            loop {
                tokio::select! {
                    _ = tx.closed() => return,
                    msg = revocations.recv() => match msg {
                        Ok(revoked) if revoked == fingerprint => {
                            let _ = tx.send(GuardState::SignedOut);
                            return;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(_)) => {
                            if guard.revoked.contains_key(&fingerprint) {
                                let _ = tx.send(GuardState::SignedOut);
                                return;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    },
                }
            }
        });

        rx
    }

    /// Sign the session out at the provider and revoke it locally.
    ///
    /// The token is revoked locally even when the provider call fails.
    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let result = self.provider.sign_out(&session.access_token).await;
        self.revoke(session.fingerprint(), session.expires_at);
        result
    }

    pub fn is_revoked(&self, access_token: &str) -> bool {
        self.revoked.contains_key(&token_fingerprint(access_token))
    }

    fn revoke(&self, fingerprint: String, expires_at: Option<DateTime<Utc>>) {
        let now = Utc::now();
        // Expired tokens fail resolution anyway.
        self.revoked
            .retain(|_, exp| exp.is_none_or(|at| at > now));
        if self.revoked.insert(fingerprint.clone(), expires_at).is_none() {
            let _ = self.revocations.send(fingerprint);
        }
    }
}

async fn listen(guard: Weak<SessionGuard>, mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Session listener missed {} events", n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };
        let Some(guard) = guard.upgrade() else {
            return;
        };
        match event {
            SessionEvent::SignedIn { subject } => info!(%subject, "Session started"),
            SessionEvent::SignedOut {
                fingerprint,
                expires_at,
            } => guard.revoke(fingerprint, expires_at),
        }
    }
}
