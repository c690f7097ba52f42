//! Authentication module for the session lifecycle and the login flow.
//!
//! This module provides:
//! - `SessionManager`: Restores, logs in and logs out the persisted session
//! - `LoginController`: Validates credentials and exchanges them for a token
//! - `Credentials`: Phone number, password and device identifier
//!
//! The session token has no expiry; it stays valid until logout.

pub mod credentials;
pub mod login;
pub mod session;

pub use credentials::Credentials;
pub use login::{LoginController, LoginError, ALERT_TITLE, MISSING_FIELDS_MESSAGE};
pub use session::{SessionError, SessionManager, SessionState, SessionStatus, TOKEN_KEY};
