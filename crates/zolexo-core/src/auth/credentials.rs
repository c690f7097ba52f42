use std::fmt;

/// Credentials for a single login attempt. Held in memory only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub phone_number: String,
    pub password: String,
    pub device_id: String,
}

impl Credentials {
    pub fn new(
        phone_number: impl Into<String>,
        password: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            phone_number: phone_number.into(),
            password: password.into(),
            device_id: device_id.into(),
        }
    }

    /// Both phone number and password were entered
    pub fn is_complete(&self) -> bool {
        !self.phone_number.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("phone_number", &self.phone_number)
            .field("password", &"<redacted>")
            .field("device_id", &self.device_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_complete() {
        assert!(Credentials::new("9998887776", "secret", "").is_complete());
        assert!(!Credentials::new("", "x", "device").is_complete());
        assert!(!Credentials::new("9998887776", "", "device").is_complete());
        assert!(!Credentials::default().is_complete());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("9998887776", "hunter2", "device-1");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("9998887776"));
        assert!(!debug.contains("hunter2"));
    }
}
