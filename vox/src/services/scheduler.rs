use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime, Timelike, Weekday};
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::models::{RefreshSummary, RunType};

use super::assignment::TeamAssignmentService;
use super::refresh::RefreshEngine;

/// Human-readable schedule strings for the status endpoint.
pub const FULL_SCHEDULE: &str = "Sundays at 11:59 PM server time";
pub const INCREMENTAL_SCHEDULE: &str = "Hourly 9 AM - 6 PM server time, Monday-Friday";

/// Calendar policy, separated from the clock so it can be tested with fixed
/// timestamps. Full refresh wins when both rules would match.
pub struct ScheduleDecision;

impl ScheduleDecision {
    /// Full refresh Sundays at 23:59; incremental at the top of every hour
    /// from 9 to 18 on weekdays.
    pub fn evaluate(now: NaiveDateTime) -> Option<RunType> {
        if now.weekday() == Weekday::Sun && now.hour() == 23 && now.minute() == 59 {
            return Some(RunType::Full);
        }

        let is_weekday = !matches!(now.weekday(), Weekday::Sat | Weekday::Sun);
        if is_weekday && (9..=18).contains(&now.hour()) && now.minute() == 0 {
            return Some(RunType::Incremental);
        }

        None
    }
}

/// Background driver for scheduled refreshes. The loop itself lives in
/// `main.rs`; this type owns one tick's worth of work.
#[derive(Clone)]
pub struct RefreshScheduler {
    engine: RefreshEngine,
    assignment: TeamAssignmentService,
    tick_secs: u64,
    error_cooldown_secs: u64,
}

impl RefreshScheduler {
    pub fn new(
        engine: RefreshEngine,
        assignment: TeamAssignmentService,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            assignment,
            tick_secs: config.tick_secs,
            error_cooldown_secs: config.error_cooldown_secs,
        }
    }

    /// Evaluates the policy against the local clock and fires at most one
    /// refresh. Returns `Ok(None)` when nothing was due. A failed refresh
    /// propagates so the caller can apply the error cooldown.
    pub async fn run_once(&self) -> Result<Option<RefreshSummary>> {
        let Some(mode) = ScheduleDecision::evaluate(Local::now().naive_local()) else {
            return Ok(None);
        };

        info!(mode = %mode, "Starting scheduled refresh");
        let summary = match mode {
            RunType::Full => self.engine.refresh_full().await?,
            RunType::Incremental => self.engine.refresh_incremental(None).await?,
        };
        info!(
            total = summary.total,
            mode = %summary.mode,
            "Scheduled refresh complete"
        );

        // Route whatever the run brought in. Assignment failures are logged
        // and do not fail the tick.
        match self.assignment.assign_pending().await {
            Ok(routed) if routed > 0 => info!(routed, "Routed new feedback after refresh"),
            Ok(_) => {}
            Err(error) => warn!(error = %error, "Post-refresh assignment pass failed"),
        }

        Ok(Some(summary))
    }

    /// How long to sleep before the next `run_once` call: until just past
    /// the next schedule boundary, but never longer than the configured
    /// tick. A one-second cushion puts the wake-up inside the boundary
    /// minute rather than a hair before it.
    pub fn next_tick_delay(&self, now: NaiveDateTime) -> Duration {
        let secs = secs_until_boundary(now) + 1;
        Duration::from_secs(secs.min(self.tick_secs.max(1)))
    }

    /// How long the loop backs off after a failed tick.
    pub fn error_cooldown_secs(&self) -> u64 {
        self.error_cooldown_secs
    }
}

/// Seconds until the next instant the policy could match: the top of the
/// next hour, or 23:59 when that comes first. Always strictly positive, so
/// a wake-up inside a boundary minute targets the following boundary.
fn secs_until_boundary(now: NaiveDateTime) -> u64 {
    let to_next_hour = u64::from((59 - now.minute()) * 60 + (60 - now.second()));
    if now.hour() == 23 && now.minute() < 59 {
        u64::from((58 - now.minute()) * 60 + (60 - now.second()))
    } else {
        to_next_hour
    }
}
