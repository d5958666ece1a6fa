//! Reactive mirror of the provider's current session.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `SessionStore` per application instance, owned by whoever boots the
//! app and passed down explicitly. Writes come from the initial fetch and the
//! provider event listener; the last write wins. Readers either take a
//! snapshot with `current()` or follow changes through `watch()`.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use super::{AuthEvent, AuthError, AuthProvider, Session, SessionSource, Subscription, lock};

pub struct SessionStore {
    cell: Arc<watch::Sender<Option<Session>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        let (cell, _) = watch::channel(None);
        Self { cell: Arc::new(cell), subscription: Mutex::new(None) }
    }

    /// Snapshot of the mirrored session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.cell.borrow().clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Receiver that observes every subsequent write.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.cell.subscribe()
    }

    /// Fetch the provider's current session and store it.
    ///
    /// A failed fetch leaves the cell untouched. No retry.
    pub async fn initialize(&self, provider: &dyn AuthProvider) {
        match provider.get_session().await {
            Ok(session) => {
                self.cell.send_replace(session);
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial session fetch failed; keeping current value");
            }
        }
    }

    /// Mirror provider events into the cell. Replaces any earlier subscription.
    pub fn listen(&self, provider: &dyn AuthProvider) {
        let cell = Arc::clone(&self.cell);
        let subscription = provider.subscribe(Arc::new(move |event: AuthEvent, session: Option<&Session>| {
            tracing::debug!(%event, signed_in = session.is_some(), "auth event");
            cell.send_replace(session.cloned());
        }));
        *lock(&self.subscription) = Some(subscription);
    }

    /// Application boot: subscribe, then load the current session.
    pub async fn start(&self, provider: &dyn AuthProvider) {
        self.listen(provider);
        self.initialize(provider).await;
    }

    /// Stop mirroring. The last observed value stays in the cell.
    pub fn stop(&self) {
        lock(&self.subscription).take();
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        lock(&self.subscription).is_some()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionSource for SessionStore {
    async fn session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.current())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
