//! Process-wide session state: token persistence and the auth lifecycle.

pub mod auth;
pub mod store;

pub use auth::{AuthContext, AuthState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
