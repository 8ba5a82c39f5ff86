use std::sync::Arc;

use crate::airtable::AirtableClient;
use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::embeddings::EmbeddingProvider;
use crate::llm::LlmProvider;
use crate::services::{ChatService, FeedbackService, RefreshEngine, TeamAssignmentService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub embeddings: EmbeddingProvider,
    pub llm: LlmProvider,
    pub engine: RefreshEngine,
    pub feedback: FeedbackService,
    pub assignment: TeamAssignmentService,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        airtable: AirtableClient,
        embeddings: EmbeddingProvider,
        llm: LlmProvider,
    ) -> Self {
        let config = Arc::new(config);
        let engine = RefreshEngine::new(db.clone(), airtable);
        let feedback = FeedbackService::new(db.clone());
        let assignment =
            TeamAssignmentService::new(db.clone(), embeddings.clone(), &config.assignment);
        let chat = ChatService::new(db.clone(), embeddings.clone(), llm.clone());

        Self {
            config,
            db,
            embeddings,
            llm,
            engine,
            feedback,
            assignment,
            chat,
        }
    }
}
