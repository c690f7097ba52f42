use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::store::{KeyValueStore, StoreError};

/// Storage key the session token is persisted under
pub const TOKEN_KEY: &str = "Token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Startup restore has not finished yet
    #[default]
    Initializing,
    LoggedOut,
    LoggedIn,
}

/// Read-only snapshot of the session, published on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub status: SessionStatus,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.status == SessionStatus::LoggedIn
    }

    /// True only while the startup restore is running
    pub fn loading(&self) -> bool {
        self.status == SessionStatus::Initializing
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Refusing to store an empty session token")]
    EmptyToken,

    #[error("Failed to persist session token: {0}")]
    Persist(#[source] StoreError),

    #[error("Failed to clear local storage: {0}")]
    Clear(#[source] StoreError),
}

struct Inner<S> {
    store: S,
    state: watch::Sender<SessionState>,
    // Held across each store call and its matching state change
    op_lock: Mutex<()>,
    restored: AtomicBool,
}

/// Owner of the session state and the persisted token.
///
/// Clone is cheap and every clone refers to the same session. The store
/// write or clear always completes before the state changes, and
/// operations run one at a time, so subscribers never observe a
/// `LoggedIn` state without a persisted token.
pub struct SessionManager<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                store,
                state,
                op_lock: Mutex::new(()),
                restored: AtomicBool::new(false),
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().is_logged_in()
    }

    pub fn loading(&self) -> bool {
        self.state().loading()
    }

    /// Receive every state transition from now on
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Restore the session from storage. Only the first call has an effect.
    ///
    /// A storage read failure is treated as "no session".
    pub async fn restore_session(&self) -> SessionState {
        if self.inner.restored.swap(true, Ordering::SeqCst) {
            warn!("Session restore already ran, ignoring");
            return self.state();
        }

        let _guard = self.inner.op_lock.lock().await;

        let has_token = match self.inner.store.get(TOKEN_KEY).await {
            Ok(Some(token)) => !token.is_empty(),
            Ok(None) => false,
            Err(e) => {
                error!(error = %e, "Failed to read session token, starting logged out");
                false
            }
        };

        // A login or logout that beat the restore has already decided the state
        if self.state().loading() {
            let status = if has_token {
                SessionStatus::LoggedIn
            } else {
                SessionStatus::LoggedOut
            };
            self.transition(status);
        }

        self.state()
    }

    /// Persist the token, then mark the session logged in
    pub async fn login(&self, token: &str) -> Result<(), SessionError> {
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let _guard = self.inner.op_lock.lock().await;

        self.inner
            .store
            .set(TOKEN_KEY, token)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to persist session token");
                SessionError::Persist(e)
            })?;

        self.transition(SessionStatus::LoggedIn);
        Ok(())
    }

    /// Wipe all local storage, then mark the session logged out
    pub async fn logout(&self) -> Result<(), SessionError> {
        let _guard = self.inner.op_lock.lock().await;

        self.inner.store.clear().await.map_err(|e| {
            error!(error = %e, "Failed to clear local storage");
            SessionError::Clear(e)
        })?;

        self.transition(SessionStatus::LoggedOut);
        Ok(())
    }

    fn transition(&self, status: SessionStatus) {
        let previous = self.inner.state.send_replace(SessionState { status });
        if previous.status != status {
            info!(from = ?previous.status, to = ?status, "Session state changed");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
