//! # learnboard
//!
//! Headless session and data-fetch core for the Learnboard LMS frontend.
//! The backend is a REST API; this crate owns everything between that API
//! and the rendering layer:
//!
//! - [`net`] — the authenticated API client: bearer attachment on every
//!   outbound request and transparent refresh-and-retry on expired access
//!   tokens, exactly once per request.
//! - [`session`] — process-wide auth state (current user + loading flag)
//!   with the bootstrap / login / register / logout lifecycle, backed by an
//!   injectable token store.
//! - [`poll`] — the reusable polling fetch-state machine: load now, retry
//!   transient failures with exponential backoff, re-poll on an interval,
//!   expose staleness.
//! - [`analytics`] — concrete pollers for the manager dashboards.
//! - [`telemetry`] — completion-pulse tracking and tracing setup.
//!
//! ARCHITECTURE
//! ============
//! Hosting shells (a WASM app, a TUI, a test harness) construct an
//! [`net::ApiClient`] over a [`session::TokenStore`], wrap it in a
//! [`session::AuthContext`], and subscribe to the client's
//! session-invalidated channel to handle forced logout. Dashboards spawn
//! [`poll::Poller`]s per data source. Nothing here renders or navigates;
//! irrecoverable auth failures surface as events, not redirects.

pub mod analytics;
pub mod config;
pub mod error;
pub mod net;
pub mod poll;
pub mod session;
pub mod telemetry;

pub use config::ApiConfig;
pub use error::{ApiError, ErrorDetail};
pub use net::{ApiClient, SessionInvalidated};
pub use poll::{FetchState, Poller};
pub use session::{AuthContext, AuthState, TokenStore};
