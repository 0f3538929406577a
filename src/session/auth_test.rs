use std::sync::Arc;

use super::*;
use crate::net::mock::MockTransport;
use crate::net::transport::HttpTransport;
use crate::net::types::Role;
use crate::session::store::{MemoryTokenStore, TokenStore};

struct Harness {
    transport: Arc<MockTransport>,
    tokens: Arc<MemoryTokenStore>,
    auth: AuthContext,
}

fn harness() -> Harness {
    let transport = Arc::new(MockTransport::new());
    let tokens = Arc::new(MemoryTokenStore::new());
    let t: Arc<dyn HttpTransport> = transport.clone();
    let s: Arc<dyn TokenStore> = tokens.clone();
    let auth = AuthContext::new(Arc::new(ApiClient::new(t, s)));
    Harness { transport, tokens, auth }
}

fn user_json(id: i64, username: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "role": "learner"
    })
}

// =============================================================================
// initial state
// =============================================================================

#[test]
fn initial_state_is_bootstrapping() {
    let h = harness();
    let state = h.auth.state();
    assert!(state.loading);
    assert!(state.user.is_none());
    assert!(!state.is_authenticated());
}

// =============================================================================
// bootstrap
// =============================================================================

#[tokio::test]
async fn bootstrap_without_token_settles_anonymous_with_no_network() {
    let h = harness();
    h.auth.bootstrap().await;

    let state = h.auth.state();
    assert!(!state.loading);
    assert!(state.user.is_none());
    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn bootstrap_with_valid_token_authenticates() {
    let h = harness();
    h.tokens.set_tokens("a1", "r1");
    h.transport.push_json(200, user_json(4, "alice"));

    h.auth.bootstrap().await;

    let state = h.auth.state();
    assert!(!state.loading);
    assert_eq!(state.user.as_ref().map(|u| u.id), Some(4));
    assert!(state.is_authenticated());
}

#[tokio::test]
async fn bootstrap_with_stale_token_degrades_to_anonymous() {
    let h = harness();
    // Access token present but refresh missing: the client's recovery
    // path clears the store, and bootstrap must swallow the error.
    h.tokens.set_access_token("stale");
    h.transport.push_json(401, serde_json::json!({"detail": "token expired"}));

    h.auth.bootstrap().await;

    let state = h.auth.state();
    assert!(!state.loading);
    assert!(state.user.is_none());
    assert!(h.tokens.access_token().is_none());
    assert!(h.tokens.refresh_token().is_none());
}

#[tokio::test]
async fn bootstrap_network_failure_clears_tokens_without_panic() {
    let h = harness();
    h.tokens.set_tokens("a1", "r1");
    h.transport.push_transport_error("connection refused");

    h.auth.bootstrap().await;

    let state = h.auth.state();
    assert!(!state.loading);
    assert!(state.user.is_none());
    assert!(h.tokens.access_token().is_none());
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_persists_tokens_and_returns_fetched_user() {
    let h = harness();
    h.transport.push_json(
        200,
        serde_json::json!({"access": "a1", "refresh": "r1", "role": "learner", "username": "alice"}),
    );
    h.transport.push_json(200, user_json(4, "alice"));

    let user = h.auth.login("alice", "secret").await.unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::Learner);
    assert_eq!(h.tokens.access_token().as_deref(), Some("a1"));
    assert_eq!(h.tokens.refresh_token().as_deref(), Some("r1"));
    assert_eq!(h.auth.current_user().map(|u| u.id), Some(4));

    let requests = h.transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, LOGIN_PATH);
    assert_eq!(requests[0].body.as_ref().unwrap()["username"], "alice");
    assert_eq!(requests[1].path, ME_PATH);
    // The me-call carries the freshly issued token.
    assert_eq!(requests[1].bearer.as_deref(), Some("a1"));
}

#[tokio::test]
async fn login_failure_leaves_state_unchanged() {
    let h = harness();
    h.transport.push_json(400, serde_json::json!({"detail": "Invalid credentials"}));

    let err = h.auth.login("alice", "wrong").await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(h.tokens.access_token().is_none());
    assert!(h.auth.current_user().is_none());
}

// =============================================================================
// register
// =============================================================================

#[tokio::test]
async fn register_does_not_mutate_session() {
    let h = harness();
    h.transport.push_json(201, serde_json::json!({"id": 11}));

    let request = RegisterRequest {
        username: "new".into(),
        email: "new@example.com".into(),
        password: "pw".into(),
        first_name: String::new(),
        last_name: String::new(),
        role: Role::Learner,
    };
    h.auth.register(&request).await.unwrap();

    assert!(h.tokens.access_token().is_none());
    assert!(h.auth.current_user().is_none());
    assert_eq!(h.transport.requests()[0].path, REGISTER_PATH);
}

#[tokio::test]
async fn register_failure_propagates() {
    let h = harness();
    h.transport.push_json(400, serde_json::json!({"detail": "username taken"}));

    let request = RegisterRequest {
        username: "dup".into(),
        email: "dup@example.com".into(),
        password: "pw".into(),
        first_name: String::new(),
        last_name: String::new(),
        role: Role::Manager,
    };
    let err = h.auth.register(&request).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_clears_session_and_notifies_shell() {
    let h = harness();
    h.tokens.set_tokens("a1", "r1");
    h.transport.push_json(200, user_json(4, "alice"));
    h.auth.bootstrap().await;
    assert!(h.auth.state().is_authenticated());

    let mut invalidated = h.auth.client().subscribe();
    h.auth.logout();

    assert!(h.tokens.access_token().is_none());
    assert!(h.tokens.refresh_token().is_none());
    let state = h.auth.state();
    assert!(state.user.is_none());
    assert!(!state.loading);
    assert_eq!(invalidated.try_recv().unwrap(), SessionInvalidated::LoggedOut);
}
