//! Completion pulses and tracing setup.
//!
//! A completion pulse marks a learner finishing a resource. Pulses are
//! fire-and-forget from the caller's point of view: failures are logged
//! and returned, but callers are expected not to block UX on them. Each
//! pulse carries a `_trace` millisecond timestamp so the backend can
//! measure client-to-server latency.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::net::client::ApiClient;
use crate::net::transport::ApiRequest;

/// Record a resource completion for the current user.
///
/// `extra` is merged into the pulse body as-is; a `_trace` timestamp in
/// epoch milliseconds is added on top.
///
/// # Errors
///
/// Propagates the underlying request failure after logging it. A 401
/// here means the refresh cycle already gave up, so the pulse is dropped
/// rather than retried.
pub async fn track_completion(
    client: &Arc<ApiClient>,
    module_id: i64,
    resource_id: i64,
    extra: serde_json::Value,
) -> Result<(), ApiError> {
    let path = completion_path(module_id, resource_id);
    let mut body = match extra {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    body.insert("_trace".into(), serde_json::json!(now_epoch_millis()));

    match client.send(ApiRequest::post(&path, body.into())).await {
        Ok(_) => {
            debug!(module_id, resource_id, "completion pulse delivered");
            Ok(())
        }
        Err(err) if err.is_unauthorized() => {
            warn!(module_id, resource_id, "completion pulse blocked by expired token");
            Err(err)
        }
        Err(err) => {
            error!(module_id, resource_id, error = %err, "completion pulse failed");
            Err(err)
        }
    }
}

fn completion_path(module_id: i64, resource_id: i64) -> String {
    format!("/modules/{module_id}/resources/{resource_id}/complete/")
}

#[allow(clippy::cast_possible_truncation)]
fn now_epoch_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Install the process-wide log subscriber. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

#[cfg(test)]
#[path = "telemetry_test.rs"]
mod tests;
