//! Core library for the Zolexomart sign-in front-end.
//!
//! This crate owns everything below the view layer:
//!
//! - `store`: Persistent key-value storage for the session token
//! - `api`: HTTP client for the remote authentication endpoint
//! - `auth`: Session lifecycle (restore/login/logout) and the login flow
//! - `device`: Per-install device identifier lookup
//! - `config`: Application configuration and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod device;
pub mod store;

pub use api::{ApiError, AuthClient};
pub use auth::{
    Credentials, LoginController, LoginError, SessionError, SessionManager, SessionState,
    SessionStatus,
};
pub use config::{Config, ConfigError};
pub use device::{resolve_device_id, DeviceIdError, DeviceIdSource, FixedDeviceId, MachineIdSource};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
