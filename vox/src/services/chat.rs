use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::DatabaseBackend;
use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::error::{Result, VoxError};
use crate::llm::prompts::{chat_analysis_prompt, CHAT_SYSTEM_PROMPT};
use crate::llm::{CompletionOptions, LlmProvider};
use crate::models::ReferenceTicket;

const FEEDBACK_MATCHES: usize = 5;
const TICKET_MATCHES: usize = 3;
/// Only the strongest feedback matches go into the prompt; the full list is
/// still returned to the caller.
const FEEDBACK_CONTEXT_LIMIT: usize = 3;
const DESCRIPTION_PREVIEW: usize = 200;
const SUMMARY_PREVIEW: usize = 150;
const CHAT_TEMPERATURE: f32 = 0.3;
const CHAT_MAX_TOKENS: u32 = 400;

const EMPTY_QUESTION_ANSWER: &str = "Please ask a specific question about the feedback data.";
const NO_CONTEXT_ANSWER: &str = "I couldn't find any relevant feedback or tickets related to \
     your question. Try rephrasing or asking about a different topic.";

/// Feedback record surfaced alongside a chat answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedFeedback {
    pub id: String,
    pub description: String,
    pub priority: String,
    pub team: String,
    pub similarity: f32,
}

/// Reference ticket surfaced alongside a chat answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedTicket {
    pub id: String,
    pub summary: String,
    pub similarity: f32,
    pub assignee: String,
    pub team: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub related_feedback: Vec<RelatedFeedback>,
    pub related_tickets: Vec<RelatedTicket>,
}

/// Grounded Q&A over the cached feedback and the reference-ticket corpus.
/// Retrieval runs in-process; only the final answer needs the LLM.
#[derive(Clone)]
pub struct ChatService {
    db: Arc<dyn DatabaseBackend>,
    embeddings: EmbeddingProvider,
    llm: LlmProvider,
}

impl ChatService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        embeddings: EmbeddingProvider,
        llm: LlmProvider,
    ) -> Self {
        Self {
            db,
            embeddings,
            llm,
        }
    }

    /// Answers a question grounded in retrieved records. An empty question
    /// and an empty retrieval both short-circuit with a fixed answer; an
    /// unconfigured LLM surfaces as `LlmUnavailable` only when there was
    /// context worth summarizing.
    pub async fn ask(&self, question: &str, team: Option<&str>) -> Result<ChatAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Ok(ChatAnswer {
                answer: EMPTY_QUESTION_ANSWER.to_string(),
                related_feedback: Vec::new(),
                related_tickets: Vec::new(),
            });
        }

        let related_feedback = self.related_feedback(question, team).await?;
        let related_tickets = self.related_tickets(question).await?;

        if related_feedback.is_empty() && related_tickets.is_empty() {
            return Ok(ChatAnswer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                related_feedback,
                related_tickets,
            });
        }

        if !self.llm.is_available() {
            return Err(VoxError::LlmUnavailable(
                "Chat requires an LLM provider; none is configured".to_string(),
            ));
        }

        let context = build_context(&related_feedback, &related_tickets);
        let prompt = chat_analysis_prompt(question, &context);
        let options = CompletionOptions {
            temperature: Some(CHAT_TEMPERATURE),
            max_tokens: Some(CHAT_MAX_TOKENS),
            ..Default::default()
        };

        let answer = match self
            .llm
            .complete(&prompt, Some(CHAT_SYSTEM_PROMPT), Some(&options))
            .await
        {
            Ok(answer) => answer,
            Err(error) => {
                // Retrieval succeeded, so degrade instead of failing the
                // whole request.
                warn!(error = %error, "Chat completion failed");
                format!(
                    "I found relevant data but couldn't generate a detailed response. Error: {error}"
                )
            }
        };

        Ok(ChatAnswer {
            answer,
            related_feedback,
            related_tickets,
        })
    }

    /// Keyword search over cached feedback, strongest matches first. The
    /// optional team narrows the candidate set before scoring.
    async fn related_feedback(
        &self,
        question: &str,
        team: Option<&str>,
    ) -> Result<Vec<RelatedFeedback>> {
        let keywords = keywords(question);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.db.list_feedback().await?;
        let mut matches: Vec<RelatedFeedback> = Vec::new();

        for record in &records {
            let view = record.to_view();
            if let Some(team) = team {
                if !view.team.eq_ignore_ascii_case(team) {
                    continue;
                }
            }

            let text = format!(
                "{} {}",
                record.fields.str_field("initial_description").unwrap_or(""),
                record.fields.str_field("notes").unwrap_or("")
            )
            .to_lowercase();

            let score: usize = keywords.iter().map(|k| text.matches(k.as_str()).count()).sum();
            if score == 0 {
                continue;
            }

            matches.push(RelatedFeedback {
                id: view.id,
                description: truncate_preview(&view.description, DESCRIPTION_PREVIEW),
                priority: view.priority,
                team: view.team,
                similarity: round3((score as f32 / 5.0).min(1.0)),
            });
        }

        sort_by_similarity(&mut matches, |m| m.similarity);
        matches.truncate(FEEDBACK_MATCHES);
        Ok(matches)
    }

    /// Reference-ticket search: cosine over stored vectors when the corpus
    /// has any and the provider is reachable, keyword matching otherwise.
    async fn related_tickets(&self, question: &str) -> Result<Vec<RelatedTicket>> {
        let tickets = self.db.list_tickets().await?;
        if tickets.is_empty() {
            return Ok(Vec::new());
        }

        let has_vectors = tickets.iter().any(|t| t.embedding.is_some());
        let mut matches = if has_vectors && self.embeddings.is_available() {
            match self.semantic_ticket_matches(question, &tickets).await {
                Ok(found) => found,
                Err(error) => {
                    warn!(error = %error, "Semantic ticket search failed, using keyword search");
                    lexical_ticket_matches(question, &tickets)
                }
            }
        } else {
            lexical_ticket_matches(question, &tickets)
        };

        sort_by_similarity(&mut matches, |m| m.similarity);
        matches.truncate(TICKET_MATCHES);
        Ok(matches)
    }

    async fn semantic_ticket_matches(
        &self,
        question: &str,
        tickets: &[ReferenceTicket],
    ) -> Result<Vec<RelatedTicket>> {
        let query = self.embeddings.embed_single(question).await?;

        Ok(tickets
            .iter()
            .filter_map(|ticket| {
                ticket.embedding.as_ref().map(|embedding| RelatedTicket {
                    id: ticket.id.clone(),
                    summary: truncate_preview(&ticket.summary, SUMMARY_PREVIEW),
                    similarity: round3(cosine_similarity(&query, embedding)),
                    assignee: ticket.assignee.clone(),
                    team: ticket.team_name.clone(),
                })
            })
            .collect())
    }
}

/// Keyword ticket matching over routed tickets only; unrouted tickets carry
/// no team context worth surfacing.
fn lexical_ticket_matches(question: &str, tickets: &[ReferenceTicket]) -> Vec<RelatedTicket> {
    let keywords = keywords(question);
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for ticket in tickets.iter().filter(|t| t.has_team()) {
        let text = ticket.matching_text().to_lowercase();
        let score: usize = keywords.iter().map(|k| text.matches(k.as_str()).count()).sum();
        if score == 0 {
            continue;
        }

        matches.push(RelatedTicket {
            id: ticket.id.clone(),
            summary: truncate_preview(&ticket.summary, SUMMARY_PREVIEW),
            similarity: round3((score as f32 / 10.0).min(1.0)),
            assignee: ticket.assignee.clone(),
            team: ticket.team_name.clone(),
        });
    }
    matches
}

fn build_context(feedback: &[RelatedFeedback], tickets: &[RelatedTicket]) -> String {
    let mut context = String::new();

    if !feedback.is_empty() {
        context.push_str("Related Customer Feedback:\n");
        for (i, item) in feedback.iter().take(FEEDBACK_CONTEXT_LIMIT).enumerate() {
            context.push_str(&format!(
                "{}. [{}] {} (Team: {}, Priority: {})\n",
                i + 1,
                item.id,
                item.description,
                item.team,
                item.priority
            ));
        }
    }

    if !tickets.is_empty() {
        context.push_str("\nRelated Tickets:\n");
        for (i, item) in tickets.iter().enumerate() {
            context.push_str(&format!(
                "{}. [{}] {} (Team: {})\n",
                i + 1,
                item.id,
                item.summary,
                item.team
            ));
        }
    }

    context
}

fn keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

fn sort_by_similarity<T>(items: &mut [T], similarity: impl Fn(&T) -> f32) {
    items.sort_by(|a, b| {
        similarity(b)
            .partial_cmp(&similarity(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Codepoint-based truncation so multi-byte text never splits mid-character.
fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut preview: String = text.chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    } else {
        text.to_string()
    }
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tempfile::NamedTempFile;

    use crate::config::DatabaseConfig;
    use crate::db::{Database, LibSqlBackend};
    use crate::models::{FeedbackRecord, FieldMap};

    async fn setup() -> (ChatService, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let config = DatabaseConfig {
            url: temp_file.path().to_str().unwrap().to_string(),
            ..DatabaseConfig::default()
        };
        let db = Database::new(&config).await.unwrap();
        let backend: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
        let service = ChatService::new(
            backend,
            EmbeddingProvider::unavailable("test"),
            LlmProvider::unavailable("test"),
        );
        (service, temp_file)
    }

    fn record(id: &str, fields: serde_json::Value) -> FeedbackRecord {
        FeedbackRecord {
            id: id.to_string(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            fields: FieldMap::normalize(fields.as_object().unwrap()),
        }
    }

    fn ticket(id: &str, summary: &str, team: &str) -> ReferenceTicket {
        ReferenceTicket {
            id: id.to_string(),
            summary: summary.to_string(),
            description: String::new(),
            resolution: String::new(),
            assignee: "sam".to_string(),
            team_name: team.to_string(),
            embedding: None,
        }
    }

    #[tokio::test]
    async fn test_empty_question_short_circuits() {
        let (service, _temp) = setup().await;
        let answer = service.ask("   ", None).await.unwrap();
        assert_eq!(answer.answer, EMPTY_QUESTION_ANSWER);
        assert!(answer.related_feedback.is_empty());
        assert!(answer.related_tickets.is_empty());
    }

    #[tokio::test]
    async fn test_no_matches_answers_without_llm() {
        let (service, _temp) = setup().await;
        // The LLM is unavailable; an empty retrieval must still answer.
        let answer = service.ask("quantum blockchain", None).await.unwrap();
        assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
    }

    #[tokio::test]
    async fn test_matches_without_llm_surface_unavailable() {
        let (service, _temp) = setup().await;
        service
            .db
            .upsert_feedback(&record(
                "rec1",
                json!({"Initial Description": "billing page crashed"}),
            ))
            .await
            .unwrap();

        let result = service.ask("billing crashed", None).await;
        assert!(matches!(result, Err(VoxError::LlmUnavailable(_))));
    }

    #[tokio::test]
    async fn test_feedback_retrieval_scores_and_projects() {
        let (service, _temp) = setup().await;
        service
            .db
            .upsert_feedback(&record(
                "rec1",
                json!({"Initial Description": "billing page crashed", "Priority": 1, "Team Routed": "Billing Team"}),
            ))
            .await
            .unwrap();
        service
            .db
            .upsert_feedback(&record(
                "rec2",
                json!({"Initial Description": "portal login slow"}),
            ))
            .await
            .unwrap();

        let matches = service
            .related_feedback("billing crashed", None)
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "rec1");
        assert_eq!(matches[0].priority, "High");
        assert_eq!(matches[0].team, "Billing Team");
        // Two keyword hits, normalized by 5.
        assert!((matches[0].similarity - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_feedback_retrieval_honors_team_filter() {
        let (service, _temp) = setup().await;
        service
            .db
            .upsert_feedback(&record(
                "rec1",
                json!({"Initial Description": "billing issue", "Team Routed": "Billing Team"}),
            ))
            .await
            .unwrap();
        service
            .db
            .upsert_feedback(&record(
                "rec2",
                json!({"Initial Description": "billing issue too", "Team Routed": "Portal Team"}),
            ))
            .await
            .unwrap();

        let matches = service
            .related_feedback("billing", Some("portal team"))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "rec2");
    }

    #[tokio::test]
    async fn test_ticket_retrieval_skips_unrouted() {
        let (service, _temp) = setup().await;
        service
            .db
            .upsert_tickets(&[
                ticket("t1", "billing export broken", "Billing Team"),
                ticket("t2", "billing import broken", ""),
            ])
            .await
            .unwrap();

        let matches = service.related_tickets("billing broken").await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "t1");
        assert_eq!(matches[0].assignee, "sam");
    }

    #[test]
    fn test_truncate_preview_appends_ellipsis() {
        let long = "x".repeat(201);
        let preview = truncate_preview(&long, 200);
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));

        assert_eq!(truncate_preview("short", 200), "short");
    }

    #[test]
    fn test_context_limits_feedback_to_top_three() {
        let feedback: Vec<RelatedFeedback> = (0..5)
            .map(|i| RelatedFeedback {
                id: format!("rec{i}"),
                description: "desc".to_string(),
                priority: "High".to_string(),
                team: "Billing Team".to_string(),
                similarity: 0.9,
            })
            .collect();

        let context = build_context(&feedback, &[]);
        assert!(context.contains("Related Customer Feedback:"));
        assert!(context.contains("[rec2]"));
        assert!(!context.contains("[rec3]"));
    }
}
