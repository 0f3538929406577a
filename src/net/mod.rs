//! Outbound HTTP communication with the backend REST API.
//!
//! ARCHITECTURE
//! ============
//! [`transport`] owns the wire: an object-safe [`HttpTransport`] trait with
//! a production `reqwest` implementation. [`client`] layers the session
//! contract on top — bearer attachment and single refresh-and-retry on
//! expired access tokens. [`types`] is the backend's JSON contract.

pub mod client;
pub mod transport;
pub mod types;

pub use client::{ApiClient, SessionInvalidated};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};

#[cfg(test)]
pub(crate) mod mock;
