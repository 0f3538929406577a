//! Reusable polling fetch-state machine for dashboard data sources.
//!
//! DESIGN
//! ======
//! A [`Poller`] owns one background task per data source: fetch once at
//! spawn, then re-fetch on a fixed interval. Transient failures (no
//! response, or 5xx) retry up to three times with exponential backoff
//! before surfacing a persistent error; 4xx failures surface immediately.
//! Cycles are serialized on the poll task — an interval tick never
//! overlaps a running cycle — and dropping the poller aborts the task,
//! which cancels any in-flight request at its next await point.
//!
//! Consumers read [`FetchState`] snapshots; `is_stale`/`data_age` expose
//! freshness so dashboards can render a staleness affordance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

use crate::error::{ApiError, ErrorDetail};

pub const MAX_FETCH_RETRIES: u32 = 3;
pub const RETRY_BASE_MS: u64 = 1000;
pub const RETRY_CAP_MS: u64 = 10_000;
/// Data older than this is considered stale.
pub const STALE_AFTER: Duration = Duration::from_secs(120);

pub type FetchFuture<T> = BoxFuture<'static, Result<T, ApiError>>;
pub type FetchFn<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// Wrap an async closure as a [`FetchFn`].
pub fn fetch_fn<T, F, Fut>(f: F) -> FetchFn<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Snapshot of one data source's fetch lifecycle.
#[derive(Debug, Clone)]
pub struct FetchState<T> {
    pub data: Option<T>,
    /// True only while a (non-retry) request is outstanding.
    pub loading: bool,
    pub error: Option<ErrorDetail>,
    /// Completion instant of the last successful fetch.
    pub last_updated: Option<Instant>,
    /// Transient-retry attempts since the last success or manual refresh.
    pub retry_count: u32,
}

impl<T> Default for FetchState<T> {
    /// Pre-first-fetch state: loading, no data.
    fn default() -> Self {
        Self { data: None, loading: true, error: None, last_updated: None, retry_count: 0 }
    }
}

impl<T> FetchState<T> {
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// True once the last success is older than [`STALE_AFTER`]. Never
    /// stale before the first success (there is nothing to be stale).
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.last_updated
            .is_some_and(|at| at.elapsed() > STALE_AFTER)
    }

    /// Whole seconds since the last success, or `None` if never fetched.
    #[must_use]
    pub fn data_age_secs(&self) -> Option<u64> {
        self.last_updated.map(|at| at.elapsed().as_secs())
    }
}

/// Background poller for one data source.
pub struct Poller<T> {
    state: Arc<Mutex<FetchState<T>>>,
    fetch: FetchFn<T>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Clone + Send + 'static> Poller<T> {
    /// Fetch immediately, then every `interval` until [`Poller::stop`] or
    /// drop. `None` (or a zero interval) disables auto-polling.
    #[must_use]
    pub fn spawn(fetch: FetchFn<T>, interval: Option<Duration>) -> Self {
        let state = Arc::new(Mutex::new(FetchState::default()));
        let task = tokio::spawn(poll_loop(state.clone(), fetch.clone(), interval));
        Self { state, fetch, task: Mutex::new(Some(task)) }
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> FetchState<T> {
        lock(&self.state).clone()
    }

    /// Manual re-fetch, independent of the poll schedule. Resets the
    /// retry budget first.
    pub async fn refresh(&self) {
        lock(&self.state).retry_count = 0;
        debug!("manual refresh triggered");
        run_cycle(&self.state, &self.fetch).await;
    }

    /// Stop auto-polling. In-flight work is cancelled at its next await
    /// point; no state updates occur afterwards.
    pub fn stop(&self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }
    }
}

async fn poll_loop<T: Send + 'static>(
    state: Arc<Mutex<FetchState<T>>>,
    fetch: FetchFn<T>,
    interval: Option<Duration>,
) {
    run_cycle(&state, &fetch).await;

    let Some(every) = interval.filter(|d| !d.is_zero()) else {
        return;
    };
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the spawn fetch covered it.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        debug!("auto-refresh tick");
        run_cycle(&state, &fetch).await;
    }
}

/// One fetch cycle: attempt, then transient retries with backoff until
/// success, a terminal error, or an exhausted retry budget.
async fn run_cycle<T>(state: &Mutex<FetchState<T>>, fetch: &FetchFn<T>) {
    let mut is_retry = false;
    loop {
        {
            let mut s = lock(state);
            if !is_retry {
                s.loading = true;
            }
            s.error = None;
        }

        match fetch().await {
            Ok(data) => {
                let mut s = lock(state);
                s.data = Some(data);
                s.loading = false;
                s.error = None;
                s.last_updated = Some(Instant::now());
                s.retry_count = 0;
                debug!("fetch cycle succeeded");
                return;
            }
            Err(err) => {
                let detail = err.detail();
                let retry_count = {
                    let mut s = lock(state);
                    s.loading = false;
                    s.error = Some(detail);
                    s.retry_count
                };

                if err.is_transient() && retry_count < MAX_FETCH_RETRIES {
                    let delay = backoff_delay(retry_count);
                    lock(state).retry_count = retry_count + 1;
                    warn!(
                        attempt = retry_count + 1,
                        total = MAX_FETCH_RETRIES,
                        delay_ms = delay.as_millis() as u64,
                        "transient fetch failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    is_retry = true;
                    continue;
                }

                error!(error = %err, "fetch failed");
                return;
            }
        }
    }
}

/// 1s, 2s, 4s, ... capped at 10s.
fn backoff_delay(retry_count: u32) -> Duration {
    let ms = RETRY_BASE_MS
        .checked_shl(retry_count)
        .unwrap_or(RETRY_CAP_MS)
        .min(RETRY_CAP_MS);
    Duration::from_millis(ms)
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
