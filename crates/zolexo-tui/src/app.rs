//! Application state management for the sign-in front-end.
//!
//! This module contains the `App` struct that owns the session handle, the
//! screen navigator, the login form and the background login task.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use futures::future::{AbortHandle, Abortable};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use zolexo_core::auth::ALERT_TITLE;
use zolexo_core::device::resolve_device_id;
use zolexo_core::{
    AuthClient, Config, Credentials, DeviceIdSource, FileStore, LoginController, LoginError,
    SessionManager, SessionState, SessionStatus,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for phone number input.
/// E.164 numbers are at most 15 digits; 20 leaves room for separators.
const MAX_PHONE_LENGTH: usize = 20;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Alert text when clearing local storage fails on sign out
const LOGOUT_FAILED_MESSAGE: &str = "Could not sign out. Please try again.";

// ============================================================================
// Navigation
// ============================================================================

/// Screen shown by the navigator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Splash,
    Login,
    Home,
}

impl Screen {
    pub fn for_state(state: SessionState) -> Self {
        match state.status {
            SessionStatus::Initializing => Screen::Splash,
            SessionStatus::LoggedOut => Screen::Login,
            SessionStatus::LoggedIn => Screen::Home,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingAlert,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Phone,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Phone => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Phone,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Phone => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Phone,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

/// Blocking message shown over the current screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Login View
// ============================================================================

/// Login form state. Exists only while the login screen is mounted.
pub struct LoginView {
    pub phone_number: String,
    pub password: String,
    pub device_id: String,
    pub show_password: bool,
    pub focus: LoginFocus,
    submission: Option<Submission>,
}

/// An in-flight login attempt
struct Submission {
    id: u64,
    abort: AbortHandle,
}

impl LoginView {
    /// Mount the form, querying the device identifier once
    pub fn mount(device_source: &dyn DeviceIdSource) -> Self {
        Self {
            phone_number: String::new(),
            password: String::new(),
            device_id: resolve_device_id(device_source),
            show_password: false,
            focus: LoginFocus::Phone,
            submission: None,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.phone_number, &self.password, &self.device_id)
    }

    pub fn is_submitting(&self) -> bool {
        self.submission.is_some()
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    /// Cancel any in-flight attempt
    fn unmount(&mut self) {
        if let Some(submission) = self.submission.take() {
            debug!(attempt = submission.id, "Cancelling in-flight login");
            submission.abort.abort();
        }
    }
}

impl Drop for LoginView {
    fn drop(&mut self) {
        self.unmount();
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Outcome of a login attempt, sent back from the spawned task
struct LoginResult {
    attempt: u64,
    outcome: Result<(), LoginError>,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub session: SessionManager<FileStore>,
    controller: LoginController<FileStore>,
    device_source: Box<dyn DeviceIdSource>,
    session_rx: watch::Receiver<SessionState>,

    // UI state
    pub state: AppState,
    pub screen: Screen,
    pub login: Option<LoginView>,
    pub alert: Option<Alert>,
    pub signed_in_at: Option<DateTime<Local>>,

    // Background task channel
    login_rx: mpsc::Receiver<LoginResult>,
    login_tx: mpsc::Sender<LoginResult>,
    next_attempt: u64,
}

impl App {
    /// Create a new application instance from configuration
    pub fn new(config: Config) -> Result<Self> {
        let session = Self::open_session(&config)?;
        let client = AuthClient::with_timeout(&config.base_url, config.request_timeout())
            .context("Failed to create auth client")?;
        let device_source = config.device_id_source();
        Ok(Self::with_parts(config, session, client, device_source))
    }

    pub fn with_parts(
        config: Config,
        session: SessionManager<FileStore>,
        client: AuthClient,
        device_source: Box<dyn DeviceIdSource>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = session.subscribe();
        let screen = Screen::for_state(session.state());
        let controller = LoginController::new(client, session.clone());
        let login = (screen == Screen::Login).then(|| LoginView::mount(device_source.as_ref()));

        Self {
            config,
            session,
            controller,
            device_source,
            session_rx,

            state: AppState::Normal,
            screen,
            login,
            alert: None,
            signed_in_at: None,

            login_rx: rx,
            login_tx: tx,
            next_attempt: 0,
        }
    }

    /// Open the on-disk session store named by the configuration
    pub fn open_session(config: &Config) -> Result<SessionManager<FileStore>> {
        let storage_path = config
            .storage_path()
            .context("Could not determine storage location")?;
        debug!(path = %storage_path.display(), "Using local storage");
        Ok(SessionManager::new(FileStore::new(storage_path)))
    }

    /// Kick off the one-time session restore in the background
    pub fn start(&mut self) {
        let session = self.session.clone();
        tokio::spawn(async move {
            let state = session.restore_session().await;
            debug!(?state, "Session restore finished");
        });
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Apply any session change since the last call. Returns true if the
    /// screen changed.
    pub fn sync_session(&mut self) -> bool {
        match self.session_rx.has_changed() {
            Ok(true) => {}
            Ok(false) | Err(_) => return false,
        }
        let state = *self.session_rx.borrow_and_update();
        self.navigate(Screen::for_state(state))
    }

    fn navigate(&mut self, screen: Screen) -> bool {
        if screen == self.screen && (screen != Screen::Login || self.login.is_some()) {
            return false;
        }
        info!(from = ?self.screen, to = ?screen, "Navigating");

        // Dropping the view cancels any in-flight attempt
        self.login = None;

        match screen {
            Screen::Login => {
                self.login = Some(LoginView::mount(self.device_source.as_ref()));
                self.signed_in_at = None;
            }
            Screen::Home => {
                self.signed_in_at = Some(Local::now());
            }
            Screen::Splash => {}
        }

        self.screen = screen;
        true
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Submit the login form as a cancellable background task
    pub fn submit_login(&mut self) {
        let Some(view) = self.login.as_mut() else {
            return;
        };
        if view.is_submitting() {
            debug!("Login already in progress, ignoring submit");
            return;
        }

        self.next_attempt += 1;
        let attempt = self.next_attempt;
        let credentials = view.credentials();
        let controller = self.controller.clone();
        let tx = self.login_tx.clone();
        let (abort, registration) = AbortHandle::new_pair();

        tokio::spawn(async move {
            match Abortable::new(controller.submit(credentials), registration).await {
                Ok(outcome) => {
                    if tx.send(LoginResult { attempt, outcome }).await.is_err() {
                        warn!(attempt, "Login result dropped, app is shutting down");
                    }
                }
                Err(_aborted) => debug!(attempt, "Login attempt aborted"),
            }
        });

        view.submission = Some(Submission { id: attempt, abort });
    }

    /// Wipe local storage and return to the login screen
    pub async fn logout(&mut self) {
        if let Err(e) = self.session.logout().await {
            warn!(error = %e, "Logout failed");
            self.show_alert(Alert::error(LOGOUT_FAILED_MESSAGE));
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.login_rx.try_recv() {
            self.process_login_result(result);
        }
    }

    fn process_login_result(&mut self, result: LoginResult) {
        let Some(view) = self.login.as_mut() else {
            debug!(attempt = result.attempt, "Login view gone, dropping result");
            return;
        };
        match view.submission {
            Some(ref submission) if submission.id == result.attempt => {}
            _ => {
                debug!(attempt = result.attempt, "Stale login result, ignoring");
                return;
            }
        }
        view.submission = None;

        match result.outcome {
            Ok(()) => {
                view.password.clear();
            }
            Err(e) => {
                if let Some(message) = e.alert_message() {
                    self.show_alert(Alert::error(message));
                }
            }
        }
    }

    // =========================================================================
    // Alerts
    // =========================================================================

    pub fn show_alert(&mut self, alert: Alert) {
        self.alert = Some(alert);
        self.state = AppState::ShowingAlert;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
        self.state = AppState::Normal;
    }

    /// Tear down mounted views before exit
    pub fn shutdown(&mut self) {
        self.login = None;
        self.state = AppState::Quitting;
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a phone number character should be accepted
pub fn can_add_phone_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PHONE_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
