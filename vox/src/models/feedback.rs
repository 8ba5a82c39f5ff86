use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FieldMap;

/// One cached upstream feedback item. `created_at`/`modified_at` come from
/// the upstream source and drive incremental fetch bounds; everything
/// domain-specific lives in the opaque `fields` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub fields: FieldMap,
}

impl FeedbackRecord {
    /// Read-time projection for API consumers. Display labels (priority,
    /// environment, description fallback) are derived here, never stored.
    pub fn to_view(&self) -> FeedbackView {
        FeedbackView {
            id: self.id.clone(),
            description: self.fields.description().to_string(),
            priority: self.fields.priority_label().to_string(),
            team: self.fields.team().unwrap_or("Triage").to_string(),
            environment: self.fields.environment_label().to_string(),
            area_impacted: self
                .fields
                .str_field("area_impacted")
                .unwrap_or("Bug")
                .to_string(),
            created: self.created_at,
            status: self.fields.str_field("status").unwrap_or("New").to_string(),
            issue_number: self.fields.str_field("issue_number").map(str::to_string),
            reporter_email: self.fields.str_field("reporter_email").map(str::to_string),
            slack_thread: self.fields.str_field("slack_thread").map(str::to_string),
        }
    }
}

/// Projected record served by the read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackView {
    pub id: String,
    pub description: String,
    pub priority: String,
    pub team: String,
    pub environment: String,
    pub area_impacted: String,
    pub created: DateTime<Utc>,
    pub status: String,
    pub issue_number: Option<String>,
    pub reporter_email: Option<String>,
    pub slack_thread: Option<String>,
}

/// Read-layer filter predicates. All comparisons run against projected
/// display values, so `priority=High` matches however upstream encoded it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackFilter {
    pub team: Option<String>,
    pub priority: Option<String>,
    pub environment: Option<String>,
}

impl FeedbackFilter {
    pub fn matches(&self, view: &FeedbackView) -> bool {
        if let Some(team) = &self.team {
            if !view.team.eq_ignore_ascii_case(team) {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if !view.priority.eq_ignore_ascii_case(priority) {
                return false;
            }
        }
        if let Some(environment) = &self.environment {
            if !view.environment.eq_ignore_ascii_case(environment) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.team.is_none() && self.priority.is_none() && self.environment.is_none()
    }
}
