//! Chat assistant DTOs for the v1 API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::{ChatAnswer, RelatedFeedback, RelatedTicket};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/chat`.
#[derive(Debug, Clone, Deserialize, Validate, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The question to answer against cached feedback and reference tickets.
    /// Max 2000 characters; an empty question gets a canned reply, not an error.
    #[validate(length(max = 2000))]
    pub question: String,
    /// Optional team scope; restricts feedback retrieval to one team.
    pub team: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Feedback record cited in a chat answer.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFeedbackItem {
    pub id: String,
    /// Description preview, truncated for display.
    pub description: String,
    pub priority: String,
    pub team: String,
    /// Relevance score in `[0, 1]`, three decimals.
    pub similarity: f32,
}

impl From<RelatedFeedback> for RelatedFeedbackItem {
    fn from(item: RelatedFeedback) -> Self {
        Self {
            id: item.id,
            description: item.description,
            priority: item.priority,
            team: item.team,
            similarity: item.similarity,
        }
    }
}

/// Reference ticket cited in a chat answer.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelatedTicketItem {
    pub id: String,
    /// Summary preview, truncated for display.
    pub summary: String,
    /// Relevance score in `[0, 1]`, three decimals.
    pub similarity: f32,
    pub assignee: String,
    pub team: String,
}

impl From<RelatedTicket> for RelatedTicketItem {
    fn from(item: RelatedTicket) -> Self {
        Self {
            id: item.id,
            summary: item.summary,
            similarity: item.similarity,
            assignee: item.assignee,
            team: item.team,
        }
    }
}

/// Response body for `POST /v1/chat`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// The generated (or canned fallback) answer.
    pub answer: String,
    /// Feedback records that grounded the answer, strongest first.
    pub related_feedback: Vec<RelatedFeedbackItem>,
    /// Reference tickets that grounded the answer, strongest first.
    pub related_tickets: Vec<RelatedTicketItem>,
}

impl From<ChatAnswer> for ChatResponse {
    fn from(answer: ChatAnswer) -> Self {
        Self {
            answer: answer.answer,
            related_feedback: answer
                .related_feedback
                .into_iter()
                .map(Into::into)
                .collect(),
            related_tickets: answer.related_tickets.into_iter().map(Into::into).collect(),
        }
    }
}
