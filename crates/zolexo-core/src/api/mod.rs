//! REST client module for the Zolexomart authentication service.
//!
//! This module provides the `AuthClient` used by the login flow to trade
//! a phone number, password and device identifier for a session token.

pub mod client;
pub mod error;

pub use client::{AuthClient, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, GENERIC_FAILURE_MESSAGE};
