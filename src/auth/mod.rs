//! Auth session types and the provider seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store mirrors whatever an `AuthProvider` reports, and the route
//! guard reads sessions through `SessionSource`. The GoTrue provider and the
//! test fakes share the same `Listeners` registry, so event delivery is
//! synchronous and ordered by subscription in both.

pub mod gotrue;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

pub use store::SessionStore;

// =============================================================================
// SESSION
// =============================================================================

/// Identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Provider-issued proof of authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub user: SessionUser,
}

/// State-change notifications pushed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl AuthEvent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
            Self::PasswordRecovery => "PASSWORD_RECOVERY",
        }
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No auth provider is configured for this deployment.
    #[error("auth provider not configured")]
    NotConfigured,

    #[error("auth request failed: {0}")]
    Request(String),

    #[error("auth API error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("auth response parse failed: {0}")]
    Parse(String),

    /// The operation needs a signed-in session and there is none.
    #[error("no active session")]
    NoSession,

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// PROVIDER SEAM
// =============================================================================

/// Callback invoked for every provider event with the event's session payload.
pub type AuthListener = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

/// External identity provider.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Current session as the provider sees it, `None` when signed out.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Register `listener` for state-change events until the handle is dropped.
    fn subscribe(&self, listener: AuthListener) -> Subscription;
}

/// Anything the route guard can ask for "the session right now".
#[async_trait::async_trait]
pub trait SessionSource: Send + Sync {
    async fn session(&self) -> Result<Option<Session>, AuthError>;
}

/// Unsubscribe handle. Dropping it removes the listener.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Listener registry with deterministic delivery order.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: Arc<Mutex<BTreeMap<u64, AuthListener>>>,
}

impl Listeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: AuthListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.entries).insert(id, listener);

        let entries = Arc::downgrade(&self.entries);
        Subscription::new(move || {
            if let Some(entries) = entries.upgrade() {
                lock(&entries).remove(&id);
            }
        })
    }

    /// Deliver `event` to every listener, oldest subscription first.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        // Snapshot so a listener may unsubscribe while being called.
        let snapshot: Vec<AuthListener> = lock(&self.entries).values().cloned().collect();
        for listener in snapshot {
            listener(event, session);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
