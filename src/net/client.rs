//! The session client: bearer attachment and refresh recovery.
//!
//! ARCHITECTURE
//! ============
//! Every outbound request goes through [`ApiClient::send`], which attaches
//! the stored access token as a bearer credential. A 401 on an original
//! request triggers at most one refresh exchange against
//! `/auth/login/refresh/` followed by one re-issue of the failed request;
//! a 401 on the retried request propagates unchanged. Irrecoverable auth
//! failures clear the token store and broadcast [`SessionInvalidated`] so
//! the hosting shell can navigate to its login entry point.
//!
//! The refresh exchange goes straight to the transport, bypassing `send`,
//! so it is never itself intercepted.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::net::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::net::types::{REFRESH_PATH, RefreshRequest, RefreshResponse};
use crate::session::store::TokenStore;

const INVALIDATED_CHANNEL_CAPACITY: usize = 16;

/// Why the session was force-terminated. Shells subscribed via
/// [`ApiClient::subscribe`] should discard all session-scoped state and
/// show the login entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInvalidated {
    /// A request came back 401 and no refresh token was stored.
    MissingRefreshToken,
    /// The refresh exchange itself failed.
    RefreshFailed,
    /// The user logged out deliberately.
    LoggedOut,
}

/// Shared HTTP client for the backend API.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    invalidated_tx: broadcast::Sender<SessionInvalidated>,
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, tokens: Arc<dyn TokenStore>) -> Self {
        let (invalidated_tx, _) = broadcast::channel(INVALIDATED_CHANNEL_CAPACITY);
        Self { transport, tokens, invalidated_tx }
    }

    /// Build a client over the production transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be
    /// constructed.
    pub fn from_config(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Ok(Self::new(transport, tokens))
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Subscribe to forced-invalidation events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionInvalidated> {
        self.invalidated_tx.subscribe()
    }

    pub(crate) fn notify_invalidated(&self, reason: SessionInvalidated) {
        // No receivers is fine: headless tests and short-lived tools.
        let _ = self.invalidated_tx.send(reason);
    }

    /// Issue a request with credential attachment and refresh recovery.
    ///
    /// # Errors
    ///
    /// Propagates transport failures and non-success statuses as
    /// [`ApiError`]; a 401 recovered by the refresh cycle is invisible to
    /// the caller.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = request.with_bearer(self.tokens.access_token());
        match self.execute_checked(&request).await {
            Err(err) if err.is_unauthorized() && request.attempt == 0 => {
                self.refresh_and_retry(request, err).await
            }
            other => other,
        }
    }

    /// GET `path` and deserialize the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; additionally [`ApiError::Parse`] on a
    /// malformed body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await?.json()
    }

    /// POST `body` to `path` and deserialize the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get_json`].
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::post(path, to_body(body))).await?.json()
    }

    /// POST `body` to `path`, discarding the response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_unit(&self, path: &str, body: &impl Serialize) -> Result<(), ApiError> {
        self.send(ApiRequest::post(path, to_body(body))).await?;
        Ok(())
    }

    async fn execute_checked(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.transport.execute(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status { status: response.status, body: response.body })
        }
    }

    async fn refresh_and_retry(
        &self,
        request: ApiRequest,
        original: ApiError,
    ) -> Result<ApiResponse, ApiError> {
        let Some(refresh) = self.tokens.refresh_token() else {
            warn!(path = %request.path, "unauthorized with no refresh token; forcing logout");
            self.tokens.clear();
            self.notify_invalidated(SessionInvalidated::MissingRefreshToken);
            return Err(original);
        };

        match self.exchange_refresh(&refresh).await {
            Ok(access) => {
                self.tokens.set_access_token(&access);
                debug!(path = %request.path, "access token refreshed; retrying request");
                let retry = request.retried().with_bearer(Some(access));
                self.execute_checked(&retry).await
            }
            Err(refresh_err) => {
                warn!(error = %refresh_err, "token refresh failed; forcing logout");
                self.tokens.clear();
                self.notify_invalidated(SessionInvalidated::RefreshFailed);
                Err(refresh_err)
            }
        }
    }

    /// Exchange the refresh token for a new access token. Plain transport
    /// call: no bearer, no interception, no recursion.
    async fn exchange_refresh(&self, refresh: &str) -> Result<String, ApiError> {
        let request = ApiRequest::post(REFRESH_PATH, to_body(&RefreshRequest { refresh }));
        let response = self.transport.execute(&request).await?;
        if !response.is_success() {
            return Err(ApiError::Status { status: response.status, body: response.body });
        }
        let parsed: RefreshResponse = response.json()?;
        Ok(parsed.access)
    }
}

fn to_body(body: &impl Serialize) -> serde_json::Value {
    serde_json::to_value(body).unwrap_or_else(|_| serde_json::json!({}))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
