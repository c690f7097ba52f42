use thiserror::Error;

/// Fallback alert text when the server gives no usable message
pub const GENERIC_FAILURE_MESSAGE: &str = "Login failed";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request rejected with status {status}: {body}")]
    Rejected {
        status: u16,
        message: Option<String>,
        body: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        // Only a string `message` is shown; other shapes fall back to the generic text
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty());

        ApiError::Rejected {
            status: status.as_u16(),
            message,
            body: Self::truncate_body(body),
        }
    }

    /// Message supplied by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text shown to the user in the failure alert
    pub fn user_message(&self) -> String {
        self.server_message()
            .unwrap_or(GENERIC_FAILURE_MESSAGE)
            .to_string()
    }
}
