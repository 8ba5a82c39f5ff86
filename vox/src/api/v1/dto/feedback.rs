//! Feedback read DTOs for the v1 API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FeedbackFilter, FeedbackView};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /v1/feedback`.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    /// Filter by routed team (case-insensitive).
    pub team: Option<String>,
    /// Filter by priority label (`Critical`, `High`, `Medium`, `Low`).
    pub priority: Option<String>,
    /// Filter by environment label.
    pub environment: Option<String>,
}

impl From<FeedbackQuery> for FeedbackFilter {
    fn from(query: FeedbackQuery) -> Self {
        Self {
            team: query.team,
            priority: query.priority,
            environment: query.environment,
        }
    }
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Projected feedback record served by the read endpoints.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItemResponse {
    /// Upstream record ID.
    pub id: String,
    /// Display description; never empty, defaults applied at projection.
    pub description: String,
    /// Display priority label.
    pub priority: String,
    /// Routed team; `Triage` when not yet routed.
    pub team: String,
    /// Display environment label.
    pub environment: String,
    /// Impacted area classification.
    pub area_impacted: String,
    /// Upstream creation time.
    #[schema(value_type = String)]
    pub created: DateTime<Utc>,
    /// Workflow status.
    pub status: String,
    /// Linked issue number, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<String>,
    /// Reporter email, when upstream captured one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_email: Option<String>,
    /// Slack thread link, when upstream captured one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_thread: Option<String>,
}

impl From<FeedbackView> for FeedbackItemResponse {
    fn from(view: FeedbackView) -> Self {
        Self {
            id: view.id,
            description: view.description,
            priority: view.priority,
            team: view.team,
            environment: view.environment,
            area_impacted: view.area_impacted,
            created: view.created,
            status: view.status,
            issue_number: view.issue_number,
            reporter_email: view.reporter_email,
            slack_thread: view.slack_thread,
        }
    }
}

/// Feedback list response wrapper.
///
/// The item count rides on the envelope's `meta.total`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListFeedbackResponse {
    pub feedback: Vec<FeedbackItemResponse>,
}
