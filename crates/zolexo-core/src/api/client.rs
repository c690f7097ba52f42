//! HTTP client for the Zolexomart authentication service.
//!
//! Only one call is made: `POST {base_url}/auth/login` with the phone
//! number, password and device identifier. The response carries an opaque
//! bearer token.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Credentials;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path of the login endpoint, relative to the base URL
const LOGIN_PATH: &str = "/auth/login";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    phone_number: &'a str,
    password: &'a str,
    #[serde(rename = "deviceID")]
    device_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// Client for the authentication endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a client with the default request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.base_url, LOGIN_PATH)
    }

    /// Exchange credentials for a session token
    pub async fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = self.login_url();
        let body = LoginRequest {
            phone_number: &credentials.phone_number,
            password: &credentials.password,
            device_id: &credentials.device_id,
        };

        debug!(url = %url, has_device_id = !credentials.device_id.is_empty(), "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let parsed: LoginResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse login response: {}", e)))?;

        match parsed.token {
            Some(token) if !token.is_empty() => {
                debug!(token_len = token.len(), "Login response contained token");
                Ok(token)
            }
            _ => {
                warn!("Login response did not contain a token");
                Err(ApiError::InvalidResponse(
                    "Login response did not contain a token".to_string(),
                ))
            }
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}
