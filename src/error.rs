//! API error taxonomy and the error shape surfaced to the UI.
//!
//! ERROR HANDLING
//! ==============
//! Transport-level failures bubble as [`ApiError`]; hooks and the auth
//! context lower them into [`ErrorDetail`] values for display. Transient
//! failures (no response, or 5xx) are eligible for automatic retry by the
//! polling layer; 4xx failures are terminal and surface immediately.

use serde_json::Value;
use time::OffsetDateTime;

/// Fallback message when the server supplies no usable error body.
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to load data";

/// Errors produced by API client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request produced no HTTP response (connect failure, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// HTTP status of the failing response, if one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the failure is plausibly temporary and worth retrying:
    /// no response at all, or a server-side (5xx) status.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 500..=599, .. })
    }

    /// Lower this error to the shape dashboards render.
    ///
    /// Prefers the server-supplied `error` then `detail` body fields,
    /// falling back to a generic message.
    #[must_use]
    pub fn detail(&self) -> ErrorDetail {
        let message = match self {
            Self::Status { body, .. } => extract_server_message(body),
            _ => None,
        };
        ErrorDetail {
            message: message.unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string()),
            status: self.status(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Structured error state surfaced to the UI by hooks and contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: String,
    pub status: Option<u16>,
    pub timestamp: OffsetDateTime,
}

fn extract_server_message(body: &str) -> Option<String> {
    let root: Value = serde_json::from_str(body).ok()?;
    root.get("error")
        .or_else(|| root.get("detail"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
