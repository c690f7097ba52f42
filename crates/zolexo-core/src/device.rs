//! Device identifier lookup.
//!
//! The login request carries an identifier unique to this installation.
//! Lookup is best effort: callers fall back to an empty identifier.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, error};

/// Locations of the per-install machine identifier, tried in order
const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

#[derive(Error, Debug)]
pub enum DeviceIdError {
    #[error("No device identifier source available")]
    NotFound,

    #[error("Failed to read device identifier from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Device identifier at {0} is empty")]
    Empty(PathBuf),
}

pub trait DeviceIdSource: Send + Sync {
    fn device_id(&self) -> Result<String, DeviceIdError>;
}

/// Reads the platform machine identifier from well-known files.
pub struct MachineIdSource {
    paths: Vec<PathBuf>,
}

impl Default for MachineIdSource {
    fn default() -> Self {
        Self {
            paths: MACHINE_ID_PATHS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl MachineIdSource {
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl DeviceIdSource for MachineIdSource {
    fn device_id(&self) -> Result<String, DeviceIdError> {
        let mut last_error = DeviceIdError::NotFound;

        for path in &self.paths {
            match std::fs::read_to_string(path) {
                Ok(contents) => {
                    let id = contents.trim();
                    if id.is_empty() {
                        last_error = DeviceIdError::Empty(path.clone());
                        continue;
                    }
                    return Ok(id.to_string());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    last_error = DeviceIdError::Io {
                        path: path.clone(),
                        source: e,
                    };
                }
            }
        }

        Err(last_error)
    }
}

/// Identifier supplied by configuration
pub struct FixedDeviceId(pub String);

impl DeviceIdSource for FixedDeviceId {
    fn device_id(&self) -> Result<String, DeviceIdError> {
        Ok(self.0.clone())
    }
}

/// Query the device identifier, logging and returning `""` on failure
pub fn resolve_device_id(source: &dyn DeviceIdSource) -> String {
    match source.device_id() {
        Ok(id) => {
            debug!(device_id = %id, "Device ID resolved");
            id
        }
        Err(e) => {
            error!(error = %e, "Error fetching device ID");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_machine_id_reads_first_available() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let present = dir.path().join("machine-id");
        std::fs::write(&present, "4f1c2e\n").unwrap();

        let source = MachineIdSource::with_paths(vec![missing, present]);
        assert_eq!(source.device_id().unwrap(), "4f1c2e");
    }

    #[test]
    fn test_machine_id_skips_empty_file() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        let present = dir.path().join("machine-id");
        std::fs::write(&empty, "  \n").unwrap();
        std::fs::write(&present, "abc").unwrap();

        let source = MachineIdSource::with_paths(vec![empty.clone(), present]);
        assert_eq!(source.device_id().unwrap(), "abc");

        let only_empty = MachineIdSource::with_paths(vec![empty]);
        assert!(matches!(only_empty.device_id(), Err(DeviceIdError::Empty(_))));
    }

    #[test]
    fn test_resolve_falls_back_to_empty() {
        let source = MachineIdSource::with_paths(vec![PathBuf::from("/nonexistent/machine-id")]);
        assert_eq!(resolve_device_id(&source), "");
        assert_eq!(resolve_device_id(&FixedDeviceId("dev-7".to_string())), "dev-7");
    }
}
