use std::sync::Arc;

use crate::db::DatabaseBackend;
use crate::error::{Result, VoxError};
use crate::models::{FeedbackFilter, FeedbackView};

/// Read layer over the cached feedback table. Serves projected views only;
/// it never talks to the upstream source.
#[derive(Clone)]
pub struct FeedbackService {
    db: Arc<dyn DatabaseBackend>,
}

impl FeedbackService {
    pub fn new(db: Arc<dyn DatabaseBackend>) -> Self {
        Self { db }
    }

    /// All cached records matching the filter, newest first. Filters compare
    /// against projected display values, so `priority=High` matches records
    /// stored with the numeric upstream encoding.
    pub async fn list(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackView>> {
        let records = self.db.list_feedback().await?;
        Ok(records
            .iter()
            .map(|record| record.to_view())
            .filter(|view| filter.matches(view))
            .collect())
    }

    pub async fn get(&self, id: &str) -> Result<FeedbackView> {
        match self.db.get_feedback(id).await? {
            Some(record) => Ok(record.to_view()),
            None => Err(VoxError::NotFound(format!("Feedback record '{id}'"))),
        }
    }

    pub async fn count(&self) -> Result<u64> {
        self.db.count_feedback().await
    }
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

    async fn setup() -> (FeedbackService, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let config = DatabaseConfig {
            url: temp_file.path().to_str().unwrap().to_string(),
            ..DatabaseConfig::default()
        };
        let db = Database::new(&config).await.unwrap();
        let backend: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(db));
        (FeedbackService::new(backend), temp_file)
    }

    fn record(id: &str, fields: serde_json::Value) -> FeedbackRecord {
        FeedbackRecord {
            id: id.to_string(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            fields: FieldMap::normalize(fields.as_object().unwrap()),
        }
    }

    #[tokio::test]
    async fn test_list_applies_filters_to_projected_values() {
        let (service, _temp) = setup().await;
        service
            .db
            .upsert_feedback(&record(
                "rec1",
                json!({"Priority": 1, "Team Routed": "Billing Team"}),
            ))
            .await
            .unwrap();
        service
            .db
            .upsert_feedback(&record(
                "rec2",
                json!({"Priority": 3, "Team Routed": "Portal Team"}),
            ))
            .await
            .unwrap();

        let all = service.list(&FeedbackFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let filter = FeedbackFilter {
            priority: Some("High".to_string()),
            ..Default::default()
        };
        let high = service.list(&filter).await.unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, "rec1");

        let filter = FeedbackFilter {
            team: Some("portal team".to_string()),
            ..Default::default()
        };
        let portal = service.list(&filter).await.unwrap();
        assert_eq!(portal.len(), 1);
        assert_eq!(portal[0].id, "rec2");
    }

    #[tokio::test]
    async fn test_get_returns_projection_or_not_found() {
        let (service, _temp) = setup().await;
        service
            .db
            .upsert_feedback(&record("rec1", json!({"Initial Description": "billed twice"})))
            .await
            .unwrap();

        let view = service.get("rec1").await.unwrap();
        assert_eq!(view.description, "billed twice");

        let missing = service.get("rec9").await;
        assert!(matches!(missing, Err(VoxError::NotFound(_))));
    }
}
