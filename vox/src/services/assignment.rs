use std::collections::HashMap;
use std::sync::Arc;

use nanoid::nanoid;
use tracing::{debug, info, warn};

use crate::config::AssignmentConfig;
use crate::db::DatabaseBackend;
use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::error::{Result, VoxError};
use crate::models::{ReferenceTicket, VectorizationStatus};

/// Catch-all team when no evidence points anywhere better.
pub const TRIAGE_TEAM: &str = "Triage";

/// Keyword families for rule-based routing: a family key that appears in a
/// team's name is matched against its area phrasings in the feedback text.
const KEYWORD_FAMILIES: &[(&str, &[&str])] = &[
    ("salesforce", &["crm sf", "salesforce"]),
    ("portal", &["client portal", "agent portal", "portal"]),
    ("billing", &["billing", "payment", "digital payments"]),
    ("quotes", &["quotes", "quote"]),
    ("application", &["application"]),
    ("policies", &["policies", "policy"]),
    ("documents", &["documents", "document"]),
    ("workflows", &["workflows", "workflow"]),
    ("onboarding", &["onboarding", "user onboarding"]),
    ("data", &["data"]),
    ("iam", &["iam", "identity", "access management"]),
    ("affinities", &["affinities", "us affinities"]),
    ("integrations", &["integration", "market integrations", "billing integrations"]),
    ("orchestration", &["orchestration", "connect 3rd party"]),
    ("checkout", &["checkout"]),
];

/// How many best-scoring tickets feed the selection policy.
const TOP_MATCHES: usize = 3;

/// Tickets are embedded in slices this large so progress persists between
/// upstream calls; a failure mid-corpus only loses the current slice.
const VECTORIZE_CHUNK: usize = 50;

#[derive(Debug, Clone)]
struct TicketMatch {
    score: f32,
    ticket_id: String,
    team: String,
}

/// Routes feedback records to teams by similarity against the reference
/// ticket corpus, with lexical and rule-based fallbacks. Classification is
/// total: every input gets a team, worst case `"Triage"`.
#[derive(Clone)]
pub struct TeamAssignmentService {
    db: Arc<dyn DatabaseBackend>,
    embeddings: EmbeddingProvider,
    high_confidence: f32,
    medium_confidence: f32,
}

impl TeamAssignmentService {
    pub fn new(
        db: Arc<dyn DatabaseBackend>,
        embeddings: EmbeddingProvider,
        config: &AssignmentConfig,
    ) -> Self {
        Self {
            db,
            embeddings,
            high_confidence: config.high_confidence,
            medium_confidence: config.medium_confidence,
        }
    }

    /// Picks the responsible team for a piece of feedback text.
    ///
    /// Policy: best match above the high-confidence threshold wins outright;
    /// otherwise matches above the medium threshold vote with their scores
    /// summed per team; otherwise keyword rules against known team names;
    /// otherwise `"Triage"`. Never fails: scoring errors degrade through
    /// the same chain.
    pub async fn assign_team(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return TRIAGE_TEAM.to_string();
        }

        let (matches, team_names) = match self.score_corpus(text).await {
            Ok(scored) => scored,
            Err(error) => {
                warn!(error = %error, "Corpus scoring failed, using rule fallback");
                (Vec::new(), Vec::new())
            }
        };

        if let Some(best) = matches.first() {
            if best.score > self.high_confidence && !best.team.is_empty() {
                debug!(
                    ticket = %best.ticket_id,
                    score = best.score,
                    team = %best.team,
                    "High-confidence ticket match"
                );
                return best.team.clone();
            }

            if best.score > self.medium_confidence {
                let mut votes: HashMap<&str, f32> = HashMap::new();
                for m in &matches {
                    if m.score > self.medium_confidence && !m.team.is_empty() {
                        *votes.entry(m.team.as_str()).or_insert(0.0) += m.score;
                    }
                }
                if let Some((team, score)) = votes
                    .into_iter()
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                {
                    debug!(team = %team, score, "Team chosen by weighted vote");
                    return team.to_string();
                }
            }
        }

        match rule_based_team(text, &team_names) {
            Some(team) => team,
            None => TRIAGE_TEAM.to_string(),
        }
    }

    /// Routes every cached record that has no team yet. Returns how many
    /// records were routed.
    pub async fn assign_pending(&self) -> Result<u64> {
        let records = self.db.list_unrouted_feedback().await?;
        if records.is_empty() {
            return Ok(0);
        }

        let mut routed = 0u64;
        for record in records {
            let team = self.assign_team(&record.fields.assignment_text()).await;
            self.db.set_feedback_team(&record.id, &team).await?;
            debug!(id = %record.id, team = %team, "Routed feedback record");
            routed += 1;
        }

        info!(routed, "Assignment pass complete");
        Ok(routed)
    }

    /// Bulk-loads reference tickets. Entries without an id get a generated
    /// one; stored embeddings survive re-imports.
    pub async fn import_corpus(&self, mut tickets: Vec<ReferenceTicket>) -> Result<u64> {
        tickets.retain(|t| !t.matching_text().is_empty() || !t.team_name.is_empty());
        for ticket in &mut tickets {
            if ticket.id.is_empty() {
                ticket.id = nanoid!();
            }
        }
        let imported = self.db.upsert_tickets(&tickets).await?;
        info!(imported, "Imported reference tickets");
        Ok(imported)
    }

    /// Embeds every reference ticket that does not have a vector yet.
    /// `force` clears all stored vectors first. Returns how many tickets
    /// were embedded in this run.
    pub async fn vectorize_reference_corpus(&self, force: bool) -> Result<u64> {
        if force {
            let cleared = self.db.clear_ticket_embeddings().await?;
            info!(cleared, "Cleared stored embeddings for re-vectorization");
        }

        let pending = self.db.list_unvectorized_tickets().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        if !self.embeddings.is_available() {
            return Err(VoxError::Embedding(format!(
                "Cannot vectorize {} tickets: embedding provider unavailable",
                pending.len()
            )));
        }

        let mut embedded = 0u64;
        for chunk in pending.chunks(VECTORIZE_CHUNK) {
            let texts: Vec<String> = chunk.iter().map(|t| t.matching_text()).collect();
            let vectors = self.embeddings.embed(texts).await?;
            for (ticket, vector) in chunk.iter().zip(vectors.iter()) {
                self.db.set_ticket_embedding(&ticket.id, vector).await?;
                embedded += 1;
            }
        }

        info!(embedded, "Vectorized reference tickets");
        Ok(embedded)
    }

    pub async fn vectorization_status(&self) -> Result<VectorizationStatus> {
        let (total, vectorized) = self.db.count_tickets().await?;
        Ok(VectorizationStatus::new(
            total,
            vectorized,
            self.embeddings.is_available(),
        ))
    }

    /// Scores the text against the routed corpus. Returns the top matches
    /// (best first) and the distinct team names seen, for the rule fallback.
    async fn score_corpus(&self, text: &str) -> Result<(Vec<TicketMatch>, Vec<String>)> {
        let tickets = self.db.list_routed_tickets().await?;
        if tickets.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut team_names: Vec<String> = Vec::new();
        for ticket in &tickets {
            if !team_names.contains(&ticket.team_name) {
                team_names.push(ticket.team_name.clone());
            }
        }

        let has_vectors = tickets.iter().any(|t| t.embedding.is_some());
        let mut matches = if has_vectors && self.embeddings.is_available() {
            match self.semantic_scores(text, &tickets).await {
                Ok(scored) => scored,
                Err(error) => {
                    warn!(error = %error, "Semantic scoring failed, falling back to lexical");
                    lexical_scores(text, &tickets)
                }
            }
        } else {
            lexical_scores(text, &tickets)
        };

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(TOP_MATCHES);

        Ok((matches, team_names))
    }

    async fn semantic_scores(
        &self,
        text: &str,
        tickets: &[ReferenceTicket],
    ) -> Result<Vec<TicketMatch>> {
        let query = self.embeddings.embed_single(text).await?;

        Ok(tickets
            .iter()
            .filter_map(|ticket| {
                ticket.embedding.as_ref().map(|embedding| TicketMatch {
                    score: cosine_similarity(&query, embedding),
                    ticket_id: ticket.id.clone(),
                    team: ticket.team_name.clone(),
                })
            })
            .collect())
    }
}

/// Keyword-count scoring: occurrences of each query word (longer than two
/// characters) in the ticket text, normalized into [0, 1] to stay comparable
/// with cosine scores.
fn lexical_scores(text: &str, tickets: &[ReferenceTicket]) -> Vec<TicketMatch> {
    let needle = text.to_lowercase();
    let keywords: Vec<&str> = needle.split_whitespace().filter(|w| w.len() > 2).collect();
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for ticket in tickets {
        let haystack = ticket.matching_text().to_lowercase();
        let mut score = 0usize;
        for keyword in &keywords {
            score += haystack.matches(keyword).count();
        }
        if score > 0 {
            matches.push(TicketMatch {
                score: (score as f32 / 10.0).min(1.0),
                ticket_id: ticket.id.clone(),
                team: ticket.team_name.clone(),
            });
        }
    }
    matches
}

/// Maps area/description phrasing onto a known team via keyword families,
/// then via significant words from the team name itself.
fn rule_based_team(text: &str, team_names: &[String]) -> Option<String> {
    let haystack = text.to_lowercase();

    for team in team_names {
        let team_lower = team.to_lowercase();

        for (family, variations) in KEYWORD_FAMILIES {
            if team_lower.contains(family)
                && variations.iter().any(|v| haystack.contains(v))
            {
                return Some(team.clone());
            }
        }

        if team_lower
            .split_whitespace()
            .filter(|word| word.len() > 3)
            .any(|word| haystack.contains(word))
        {
            return Some(team.clone());
        }
    }

    None
}
