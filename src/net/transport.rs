//! HTTP transport seam: request/response values and the wire trait.
//!
//! DESIGN
//! ======
//! [`HttpTransport`] returns `Ok` for *any* HTTP response, whatever the
//! status; `Err` means no response arrived at all. The client layer maps
//! non-success statuses to errors. Keeping that split here makes the
//! transient/terminal classification a pure function of the error.
//!
//! [`ApiRequest`] carries an explicit `attempt` counter instead of a hidden
//! mutable retried flag, so the single-refresh-per-request rule is visible
//! in the value itself.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// One outbound API call, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Bearer credential attached by the client layer; absent when no
    /// access token is stored.
    pub bearer: Option<String>,
    /// 0 for the original issue, 1 after the refresh-and-retry cycle.
    pub attempt: u32,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, None)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path, Some(body))
    }

    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path, Some(body))
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path, None)
    }

    fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        Self { method, path: path.into(), body, bearer: None, attempt: 0 }
    }

    #[must_use]
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// The same request, marked as having been through one recovery cycle.
    #[must_use]
    pub fn retried(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

/// A received HTTP response, status and raw body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// The wire seam. Production uses [`ReqwestTransport`]; tests inject a
/// scripted fake.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue the request and return whatever response arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] only when no HTTP response was
    /// received (connect failure, timeout, broken body stream).
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Production transport over a shared `reqwest` client.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build the transport with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
