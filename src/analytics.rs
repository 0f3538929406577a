//! Manager analytics data sources, wired to the polling machine.
//!
//! Each dashboard gets its own [`Poller`] instance: the manager overview
//! fetches the team summary and the learner list concurrently per cycle;
//! the intelligence dashboard fetches a single overview snapshot. The
//! backend stamps `computed_at`; rows that arrive without it are
//! backfilled with the fetch time so freshness displays never go blank.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::ApiError;
use crate::net::client::ApiClient;
use crate::poll::{FetchFn, Poller, fetch_fn};

pub const TEAM_SUMMARY_PATH: &str = "/analytics/manager/team-summary/";
pub const LEARNERS_PATH: &str = "/analytics/manager/learners/";
pub const INTELLIGENCE_OVERVIEW_PATH: &str = "/analytics/intelligence/overview/";

/// Default dashboard auto-refresh cadence.
pub const ANALYTICS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Team-wide rollup for the manager overview top bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub total_learners: u32,
    pub total_completions: u32,
    pub completion_rate: f64,
    pub avg_quiz_score: f64,
    #[serde(default)]
    pub assignments_pending: u32,
    #[serde(default)]
    pub total_assignments: u32,
    #[serde(default)]
    pub computed_at: Option<String>,
}

/// Per-learner row in the manager overview table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerOverview {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub modules_completed: u32,
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub last_active: Option<String>,
    #[serde(default)]
    pub computed_at: Option<String>,
}

/// Combined result of one manager-overview poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagerAnalytics {
    pub team_summary: TeamSummary,
    pub learners: Vec<LearnerOverview>,
}

/// Team snapshot from the intelligence engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceOverview {
    pub active_24h: u32,
    pub inactive_72h: u32,
    pub avg_focus_mins: f64,
    pub avg_accuracy: f64,
    pub assignment_rate: f64,
    pub at_risk_count: u32,
    #[serde(default)]
    pub computed_at: Option<String>,
}

/// Poll the manager overview: team summary and learner list, fetched
/// concurrently each cycle.
#[must_use]
pub fn spawn_manager_analytics(
    client: Arc<ApiClient>,
    interval: Option<Duration>,
) -> Poller<ManagerAnalytics> {
    Poller::spawn(manager_analytics_fetch(client), interval)
}

/// Poll the intelligence overview snapshot.
#[must_use]
pub fn spawn_intelligence_overview(
    client: Arc<ApiClient>,
    interval: Option<Duration>,
) -> Poller<IntelligenceOverview> {
    let fetch = fetch_fn(move || {
        let client = client.clone();
        async move {
            let mut overview: IntelligenceOverview =
                client.get_json(INTELLIGENCE_OVERVIEW_PATH).await?;
            if overview.computed_at.is_none() {
                overview.computed_at = Some(now_rfc3339());
            }
            Ok(overview)
        }
    });
    Poller::spawn(fetch, interval)
}

fn manager_analytics_fetch(client: Arc<ApiClient>) -> FetchFn<ManagerAnalytics> {
    fetch_fn(move || {
        let client = client.clone();
        async move {
            let (mut team_summary, mut learners) = futures::try_join!(
                client.get_json::<TeamSummary>(TEAM_SUMMARY_PATH),
                client.get_json::<Vec<LearnerOverview>>(LEARNERS_PATH),
            )?;

            let stamp = now_rfc3339();
            if team_summary.computed_at.is_none() {
                team_summary.computed_at = Some(stamp.clone());
            }
            for learner in &mut learners {
                if learner.computed_at.is_none() {
                    learner.computed_at = Some(stamp.clone());
                }
            }
            Ok::<_, ApiError>(ManagerAnalytics { team_summary, learners })
        }
    })
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
