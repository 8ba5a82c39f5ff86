use serde::{Deserialize, Serialize};

/// Historical support ticket used as a similarity anchor for team routing.
///
/// Tickets are bulk-loaded from an offline export and never change
/// afterwards; embeddings are computed lazily and kept once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceTicket {
    pub id: String,
    pub summary: String,
    pub description: String,
    pub resolution: String,
    pub assignee: String,
    pub team_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ReferenceTicket {
    /// Text used both for embedding and for lexical scoring.
    pub fn matching_text(&self) -> String {
        format!("{} {}", self.summary, self.description)
            .trim()
            .to_string()
    }

    /// Tickets without a team cannot vote and are skipped by scoring.
    pub fn has_team(&self) -> bool {
        !self.team_name.is_empty()
    }
}

/// One row of the offline ticket export. Export tooling has shipped several
/// header spellings over time, so every field accepts its known aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketImport {
    #[serde(
        default,
        alias = "Issue id",
        alias = "Issue ID",
        alias = "Key",
        alias = "Issue Key"
    )]
    pub id: String,
    #[serde(default, alias = "Summary", alias = "Title")]
    pub summary: String,
    #[serde(default, alias = "Description", alias = "Issue Description")]
    pub description: String,
    #[serde(default, alias = "Resolution")]
    pub resolution: String,
    #[serde(default, alias = "Assignee", alias = "Assigned To")]
    pub assignee: String,
    #[serde(default, alias = "Team Name", alias = "Team", alias = "Component/s")]
    pub team_name: String,
}

impl From<TicketImport> for ReferenceTicket {
    fn from(import: TicketImport) -> Self {
        Self {
            id: import.id.trim().to_string(),
            summary: import.summary.trim().to_string(),
            description: import.description.trim().to_string(),
            resolution: import.resolution.trim().to_string(),
            assignee: import.assignee.trim().to_string(),
            team_name: import.team_name.trim().to_string(),
            embedding: None,
        }
    }
}

/// Progress of the lazy reference-corpus vectorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizationStatus {
    pub total: u64,
    pub vectorized: u64,
    pub percentage: f64,
    pub provider_available: bool,
    pub ready: bool,
}

impl VectorizationStatus {
    pub fn new(total: u64, vectorized: u64, provider_available: bool) -> Self {
        let percentage = if total > 0 {
            (vectorized as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            total,
            vectorized,
            percentage,
            provider_available,
            ready: vectorized > 0 && provider_available,
        }
    }
}
