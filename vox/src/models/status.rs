use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which kind of refresh a run performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Full,
    Incremental,
}

impl std::fmt::Display for RunType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Incremental => write!(f, "incremental"),
        }
    }
}

impl std::str::FromStr for RunType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "incremental" => Ok(Self::Incremental),
            _ => Err(format!("Unknown run type: {s}")),
        }
    }
}

/// Singleton refresh bookkeeping row.
///
/// `last_update` doubles as the `since` bound for the next incremental run.
/// `running` is persisted for observability; mutual exclusion itself is
/// enforced in-process by the refresh engine, so a stale `true` left behind
/// by a crash is cleared at startup rather than trusted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStatus {
    pub last_update: Option<DateTime<Utc>>,
    pub total_records: u64,
    pub last_error: Option<String>,
    pub last_run_type: Option<RunType>,
    pub running: bool,
}

/// Outcome of one completed refresh run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshSummary {
    pub total: u64,
    pub mode: RunType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_type_display_round_trip() {
        assert_eq!(RunType::Full.to_string(), "full");
        assert_eq!(RunType::Incremental.to_string(), "incremental");
        assert_eq!("full".parse::<RunType>().unwrap(), RunType::Full);
        assert_eq!(
            "Incremental".parse::<RunType>().unwrap(),
            RunType::Incremental
        );
        assert!("weekly".parse::<RunType>().is_err());
    }

    #[test]
    fn test_cache_status_default_is_idle() {
        let status = CacheStatus::default();
        assert!(status.last_update.is_none());
        assert_eq!(status.total_records, 0);
        assert!(status.last_error.is_none());
        assert!(!status.running);
    }
}
