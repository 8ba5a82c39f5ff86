//! Cache status and refresh DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CacheStatus, RefreshSummary, RunType};
use crate::services::{FULL_SCHEDULE, INCREMENTAL_SCHEDULE};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/cache/refresh`.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Which refresh to run: `"full"` or `"incremental"`.
    #[schema(value_type = String)]
    pub mode: RunType,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Response for `GET /v1/cache/status`.
///
/// Mirrors the refresh bookkeeping row plus derived freshness fields, so a
/// dashboard can render staleness without knowing the schedule.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatusResponse {
    /// Cached record count as of the last completed refresh.
    pub record_count: u64,
    /// Completion time of the last successful refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = String)]
    pub last_update: Option<DateTime<Utc>>,
    /// Minutes since the last successful refresh, rounded to one decimal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_minutes: Option<f64>,
    /// Whether a refresh is currently running.
    pub running: bool,
    /// Error from the most recent failed refresh; cleared on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Kind of the last completed refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = String)]
    pub last_run_type: Option<RunType>,
    /// Human-readable full refresh schedule.
    pub next_full_refresh: String,
    /// Human-readable incremental refresh schedule.
    pub next_incremental_refresh: String,
}

impl CacheStatusResponse {
    /// Builds the status payload, deriving `age_minutes` from `now`.
    pub fn from_status(status: &CacheStatus, now: DateTime<Utc>) -> Self {
        let age_minutes = status.last_update.map(|ts| {
            let minutes = (now - ts).num_seconds() as f64 / 60.0;
            (minutes * 10.0).round() / 10.0
        });

        Self {
            record_count: status.total_records,
            last_update: status.last_update,
            age_minutes,
            running: status.running,
            last_error: status.last_error.clone(),
            last_run_type: status.last_run_type,
            next_full_refresh: FULL_SCHEDULE.to_string(),
            next_incremental_refresh: INCREMENTAL_SCHEDULE.to_string(),
        }
    }
}

/// Response for `POST /v1/cache/refresh` (202).
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshAcceptedResponse {
    /// Which refresh ran.
    #[schema(value_type = String)]
    pub mode: RunType,
    /// Cached record count after the run committed.
    pub total: u64,
}

impl From<RefreshSummary> for RefreshAcceptedResponse {
    fn from(summary: RefreshSummary) -> Self {
        Self {
            mode: summary.mode,
            total: summary.total,
        }
    }
}

/// Response for `POST /v1/cache/invalidate`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateResponse {
    /// How many cached records were deleted.
    pub cleared: u64,
}
