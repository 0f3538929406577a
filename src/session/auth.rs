//! Auth context: process-wide session state with a defined lifecycle.
//!
//! STATE MACHINE
//! =============
//! `bootstrapping` (loading, no user) is the initial state. [`AuthContext::bootstrap`]
//! transitions to `authenticated` (user present) when a persisted token
//! validates against `/auth/me/`, or to `anonymous` otherwise. A stale or
//! invalid persisted token never surfaces an error — it clears the session
//! and degrades to `anonymous`. Shells must not render protected content
//! while `loading` is true.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::net::client::{ApiClient, SessionInvalidated};
use crate::net::types::{LOGIN_PATH, LoginRequest, LoginResponse, ME_PATH, REGISTER_PATH, RegisterRequest, User};

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for AuthState {
    /// The pre-bootstrap state: loading, no user.
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

/// Owns the session lifecycle over a shared [`ApiClient`].
pub struct AuthContext {
    client: Arc<ApiClient>,
    state: Mutex<AuthState>,
}

impl AuthContext {
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client, state: Mutex::new(AuthState::default()) }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.lock().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    #[must_use]
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Validate any persisted session at app start.
    ///
    /// No persisted access token settles to anonymous without a network
    /// call. A failing `/auth/me/` clears both tokens and settles to
    /// anonymous; bootstrap itself never fails.
    pub async fn bootstrap(&self) {
        if self.client.tokens().access_token().is_none() {
            self.settle(None);
            return;
        }

        match self.client.get_json::<User>(ME_PATH).await {
            Ok(user) => {
                debug!(username = %user.username, "session validated");
                self.settle(Some(user));
            }
            Err(err) => {
                warn!(error = %err, "session validation failed; clearing stored tokens");
                self.client.tokens().clear();
                self.settle(None);
            }
        }
    }

    /// Authenticate, persist the issued token pair, and load the user.
    ///
    /// # Errors
    ///
    /// Propagates the failing call; session state is left unchanged when
    /// the login endpoint rejects the credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let issued: LoginResponse = self
            .client
            .post_json(LOGIN_PATH, &LoginRequest { username, password })
            .await?;
        self.client.tokens().set_tokens(&issued.access, &issued.refresh);

        // The login claims echo role/username, but /auth/me/ is the
        // authoritative user object.
        let user: User = self.client.get_json(ME_PATH).await?;
        self.settle(Some(user.clone()));
        Ok(user)
    }

    /// Create an account. Does not log the new user in or touch session
    /// state.
    ///
    /// # Errors
    ///
    /// Propagates the registration call's failure for UI handling.
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.client.post_unit(REGISTER_PATH, request).await
    }

    /// Destroy the session and notify the shell to discard all
    /// session-scoped state.
    pub fn logout(&self) {
        self.client.tokens().clear();
        self.settle(None);
        self.client.notify_invalidated(SessionInvalidated::LoggedOut);
    }

    fn settle(&self, user: Option<User>) {
        let mut state = self.lock();
        state.user = user;
        state.loading = false;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
