//! Session-expired notifications.
//!
//! When a token refresh fails the client clears the stored credentials and
//! tells the embedding application to send the user back to the login
//! route. Delivery is fire-and-forget: handlers must not block and their
//! failures never reach the caller of `send`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

/// Why a refresh could not produce a usable access token
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExpiryReason {
    #[error("no refresh token stored")]
    MissingRefreshToken,

    #[error("refresh request failed: {0}")]
    Network(String),

    #[error("refresh rejected with status {0}")]
    Rejected(u16),

    #[error("malformed refresh response: {0}")]
    MalformedResponse(String),

    #[error("token store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionExpired {
    pub login_route: String,
    pub reason: ExpiryReason,
    pub at: DateTime<Utc>,
}

impl SessionExpired {
    pub fn new(login_route: impl Into<String>, reason: ExpiryReason) -> Self {
        Self {
            login_route: login_route.into(),
            reason,
            at: Utc::now(),
        }
    }
}

pub trait SessionExpiredHandler: Send + Sync {
    fn session_expired(&self, event: &SessionExpired);
}

impl<F> SessionExpiredHandler for F
where
    F: Fn(&SessionExpired) + Send + Sync,
{
    fn session_expired(&self, event: &SessionExpired) {
        self(event)
    }
}

/// Forwards events into an unbounded channel; a dropped receiver is ignored
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<SessionExpired>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::UnboundedSender<SessionExpired>) -> Self {
        Self { sender }
    }

    /// Create a notifier together with the receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionExpired>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl SessionExpiredHandler for ChannelNotifier {
    fn session_expired(&self, event: &SessionExpired) {
        let _ = self.sender.send(event.clone());
    }
}

/// Default handler: only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnly;

impl SessionExpiredHandler for LogOnly {
    fn session_expired(&self, event: &SessionExpired) {
        warn!(
            login_route = %event.login_route,
            reason = %event.reason,
            "Session expired, login required"
        );
    }
}
