//! API client for the application backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ApiError;
use crate::auth::CookieJar;

/// Path of the endpoint that records a newly registered user.
pub const REGISTER_USER_PATH: &str = "/register-user";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Body of a `POST /register-user` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub uid: String,
    pub email: Option<String>,
}

/// Client for same-origin backend calls.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    cookies: Arc<dyn CookieJar>,
}

impl BackendClient {
    pub fn new(base_url: &str, cookies: Arc<dyn CookieJar>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookies,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cookie_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        let cookie = self.cookies.cookie_string();
        if !cookie.is_empty() {
            headers.insert(header::COOKIE, header::HeaderValue::from_str(&cookie)?);
        }
        Ok(headers)
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

    /// Record a newly created account with the backend.
    ///
    /// Any success status is accepted; the response body is ignored.
    pub async fn register_user(&self, token: &str, registration: &Registration) -> Result<(), ApiError> {
        let url = format!("{}{}", self.base_url, REGISTER_USER_PATH);
        debug!(url = %url, uid = %registration.uid, "Sending user to backend");

        let response = self
            .client
            .post(&url)
            .headers(self.cookie_headers()?)
            .bearer_auth(token)
            .json(registration)
            .send()
            .await?;

        info!(status = response.status().as_u16(), "Register-user response");
        Self::check_response(response).await?;
        Ok(())
    }
}
