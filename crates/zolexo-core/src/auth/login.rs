//! Login flow: validate the form, call the auth service, store the token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{ApiError, AuthClient, GENERIC_FAILURE_MESSAGE};
use crate::store::KeyValueStore;

use super::{Credentials, SessionError, SessionManager};

/// Title of every blocking login alert
pub const ALERT_TITLE: &str = "Error";

/// Alert text when phone number or password is missing
pub const MISSING_FIELDS_MESSAGE: &str = "Please enter both phone number and password.";

#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Please enter both phone number and password.")]
    MissingFields,

    #[error("A login request is already in progress")]
    InFlight,

    #[error("Login request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Could not save session: {0}")]
    Session(#[from] SessionError),
}

impl LoginError {
    /// Text for the blocking alert, or `None` when nothing should be shown
    pub fn alert_message(&self) -> Option<String> {
        match self {
            LoginError::MissingFields => Some(MISSING_FIELDS_MESSAGE.to_string()),
            LoginError::InFlight => None,
            LoginError::Api(e) => Some(e.user_message()),
            LoginError::Session(_) => Some(GENERIC_FAILURE_MESSAGE.to_string()),
        }
    }
}

/// Clears the in-flight flag when the attempt finishes or is dropped.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Runs login attempts against the auth service and hands the token to
/// the session. At most one attempt is in flight at a time.
pub struct LoginController<S> {
    client: AuthClient,
    session: SessionManager<S>,
    in_flight: Arc<AtomicBool>,
}

impl<S> Clone for LoginController<S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            session: self.session.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<S: KeyValueStore> LoginController<S> {
    pub fn new(client: AuthClient, session: SessionManager<S>) -> Self {
        Self {
            client,
            session,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &SessionManager<S> {
        &self.session
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit the login form.
    ///
    /// Missing fields fail before any request is sent. On success the
    /// token is persisted and the session is logged in; on failure the
    /// session is left untouched.
    pub async fn submit(&self, credentials: Credentials) -> Result<(), LoginError> {
        if !credentials.is_complete() {
            warn!("Login submitted with missing phone number or password");
            return Err(LoginError::MissingFields);
        }

        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            warn!("Login already in flight, ignoring submit");
            LoginError::InFlight
        })?;

        let token = match self.client.login(&credentials).await {
            Ok(token) => token,
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(e.into());
            }
        };

        self.session.login(&token).await?;
        info!("Login successful");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TOKEN_KEY;
    use crate::store::MemoryStore;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn controller_for(server: &MockServer) -> LoginController<MemoryStore> {
        let session = SessionManager::new(MemoryStore::new());
        session.restore_session().await;
        LoginController::new(AuthClient::new(server.uri()).unwrap(), session)
    }

    #[test]
    fn test_alert_messages() {
        assert_eq!(
            LoginError::MissingFields.alert_message().as_deref(),
            Some("Please enter both phone number and password.")
        );
        assert_eq!(LoginError::InFlight.alert_message(), None);
        assert_eq!(
            LoginError::Session(SessionError::EmptyToken).alert_message().as_deref(),
            Some("Login failed")
        );
    }

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        let guard = InFlightGuard::acquire(&flag).unwrap();
        assert!(InFlightGuard::acquire(&flag).is_none());
        drop(guard);
        assert!(InFlightGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn test_missing_fields_sends_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        let err = controller
            .submit(Credentials::new("", "x", "device-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::MissingFields));

        let err = controller
            .submit(Credentials::new("9998887776", "", "device-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::MissingFields));
        assert!(!controller.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_success_logs_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "abc123"})))
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        controller
            .submit(Credentials::new("9998887776", "secret", ""))
            .await
            .unwrap();

        assert!(controller.session().is_logged_in());
        assert_eq!(
            controller.session().store().get(TOKEN_KEY).await.unwrap().as_deref(),
            Some("abc123")
        );
        assert!(!controller.is_in_flight());
    }

    #[tokio::test]
    async fn test_rejection_keeps_session_logged_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"message": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        let err = controller
            .submit(Credentials::new("9998887776", "wrong", "device-1"))
            .await
            .unwrap_err();

        assert_eq!(err.alert_message().as_deref(), Some("Invalid credentials"));
        assert!(!controller.session().is_logged_in());
        assert!(controller.session().store().is_empty());
    }

    #[tokio::test]
    async fn test_double_submit_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"token": "abc123"}))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        let creds = Credentials::new("9998887776", "secret", "device-1");

        let first = controller.submit(creds.clone());
        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.submit(creds.clone()).await
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(LoginError::InFlight)));
        assert!(controller.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_aborted_attempt_releases_guard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"token": "abc123"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let controller = controller_for(&server).await;
        let task = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller
                    .submit(Credentials::new("9998887776", "secret", "device-1"))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(controller.is_in_flight());

        task.abort();
        let _ = task.await;

        assert!(!controller.is_in_flight());
        assert!(!controller.session().is_logged_in());
    }
}
