use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

/// Like [`parse_env_or`] but for settings restricted to a fixed set of
/// keywords, normalized to uppercase.
fn choice_env_or(var: &str, allowed: &[&str], default: &str) -> String {
    match env::var(var) {
        Ok(val) => {
            let upper = val.trim().to_uppercase();
            if allowed.contains(&upper.as_str()) {
                upper
            } else {
                tracing::warn!(
                    "Invalid value '{}' for {}: expected one of {:?}. Using default.",
                    val,
                    var,
                    allowed
                );
                default.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub airtable: AirtableConfig,
    pub scheduler: SchedulerConfig,
    pub assignment: AssignmentConfig,
    pub embeddings: EmbeddingsConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
}

/// Local store settings. `url` accepts a file path, `:memory:`, or a
/// `libsql://` remote; the pragma fields only apply where the backend
/// honors them.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
    pub busy_timeout_ms: u64,
    pub journal_mode: String,
    pub synchronous: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "file:vox.db".to_string(),
            auth_token: None,
            local_path: None,
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
        }
    }
}

/// Upstream Airtable connection. `base_url` is overridable so tests can point
/// the client at a mock server.
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableConfig {
    pub api_key: Option<String>,
    pub base_id: String,
    pub table_name: String,
    pub base_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Background refresh cadence. The calendar policy itself (which day/hour
/// fires which refresh kind) lives in the scheduler.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub tick_secs: u64,
    pub error_cooldown_secs: u64,
}

/// Thresholds for similarity-based team routing. The defaults match the
/// hand-tuned values the routing corpus was calibrated against.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentConfig {
    pub high_confidence: f32,
    pub medium_confidence: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub dimensions: usize,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// LLM configuration for the chat assistant
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("VOX_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("VOX_PORT", 8000),
                api_keys: env::var("VOX_API_KEYS")
                    .map(|keys| keys.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:vox.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
                busy_timeout_ms: parse_env_or("DATABASE_BUSY_TIMEOUT_MS", 5000),
                journal_mode: choice_env_or(
                    "DATABASE_JOURNAL_MODE",
                    &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"],
                    "WAL",
                ),
                synchronous: choice_env_or(
                    "DATABASE_SYNCHRONOUS",
                    &["OFF", "NORMAL", "FULL", "EXTRA"],
                    "NORMAL",
                ),
            },
            airtable: AirtableConfig {
                api_key: env::var("AIRTABLE_API_KEY").ok(),
                base_id: env::var("AIRTABLE_BASE_ID").unwrap_or_default(),
                table_name: env::var("AIRTABLE_TABLE_NAME")
                    .unwrap_or_else(|_| "Imported table".to_string()),
                base_url: env::var("AIRTABLE_BASE_URL")
                    .unwrap_or_else(|_| "https://api.airtable.com/v0".to_string()),
                page_size: parse_env_or("AIRTABLE_PAGE_SIZE", 100),
                timeout_secs: parse_env_or("AIRTABLE_TIMEOUT", 30),
                max_retries: parse_env_or("AIRTABLE_MAX_RETRIES", 3),
            },
            scheduler: SchedulerConfig {
                enabled: parse_env_or("SCHEDULER_ENABLED", true),
                tick_secs: parse_env_or("SCHEDULER_TICK_SECS", 3600),
                error_cooldown_secs: parse_env_or("SCHEDULER_ERROR_COOLDOWN_SECS", 300),
            },
            assignment: AssignmentConfig {
                high_confidence: parse_env_or("ASSIGN_HIGH_CONFIDENCE", 0.7),
                medium_confidence: parse_env_or("ASSIGN_MEDIUM_CONFIDENCE", 0.5),
            },
            embeddings: EmbeddingsConfig {
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                api_key: env::var("EMBEDDING_API_KEY")
                    .ok()
                    .or_else(|| env::var("OPENAI_API_KEY").ok()),
                base_url: env::var("EMBEDDING_BASE_URL").ok(),
                dimensions: parse_env_or("EMBEDDING_DIMENSIONS", 1536),
                batch_size: parse_env_or("EMBEDDING_BATCH_SIZE", 64),
                timeout_secs: parse_env_or("EMBEDDING_TIMEOUT", 30),
                max_retries: parse_env_or("EMBEDDING_MAX_RETRIES", 3),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY")
                    .ok()
                    .or_else(|| env::var("OPENAI_API_KEY").ok()),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
                max_tokens: parse_env_or("LLM_MAX_TOKENS", 500),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        std::env::remove_var("VOX_HOST");
        std::env::remove_var("VOX_PORT");
        std::env::remove_var("VOX_API_KEYS");

        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert!(config.server.api_keys.is_empty());
    }

    #[test]
    #[serial]
    fn test_airtable_config_defaults() {
        std::env::remove_var("AIRTABLE_API_KEY");
        std::env::remove_var("AIRTABLE_TABLE_NAME");
        std::env::remove_var("AIRTABLE_BASE_URL");

        let config = Config::default();
        assert!(config.airtable.api_key.is_none());
        assert_eq!(config.airtable.table_name, "Imported table");
        assert_eq!(config.airtable.base_url, "https://api.airtable.com/v0");
        assert_eq!(config.airtable.page_size, 100);
        assert_eq!(config.airtable.timeout_secs, 30);
        assert_eq!(config.airtable.max_retries, 3);
    }

    #[test]
    #[serial]
    fn test_airtable_config_from_env() {
        std::env::set_var("AIRTABLE_API_KEY", "key-123");
        std::env::set_var("AIRTABLE_BASE_ID", "appTest");
        std::env::set_var("AIRTABLE_TABLE_NAME", "Feedback");
        std::env::set_var("AIRTABLE_MAX_RETRIES", "5");

        let config = Config::default();
        assert_eq!(config.airtable.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.airtable.base_id, "appTest");
        assert_eq!(config.airtable.table_name, "Feedback");
        assert_eq!(config.airtable.max_retries, 5);

        std::env::remove_var("AIRTABLE_API_KEY");
        std::env::remove_var("AIRTABLE_BASE_ID");
        std::env::remove_var("AIRTABLE_TABLE_NAME");
        std::env::remove_var("AIRTABLE_MAX_RETRIES");
    }

    #[test]
    #[serial]
    fn test_database_config_defaults_and_pragma_override() {
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("DATABASE_BUSY_TIMEOUT_MS");
        std::env::remove_var("DATABASE_JOURNAL_MODE");
        std::env::remove_var("DATABASE_SYNCHRONOUS");

        let config = Config::default();
        assert_eq!(config.database.url, "file:vox.db");
        assert_eq!(config.database.busy_timeout_ms, 5000);
        assert_eq!(config.database.journal_mode, "WAL");
        assert_eq!(config.database.synchronous, "NORMAL");

        std::env::set_var("DATABASE_JOURNAL_MODE", "delete");
        std::env::set_var("DATABASE_SYNCHRONOUS", "not-a-mode");
        let config = Config::default();
        assert_eq!(config.database.journal_mode, "DELETE");
        assert_eq!(config.database.synchronous, "NORMAL");

        std::env::remove_var("DATABASE_JOURNAL_MODE");
        std::env::remove_var("DATABASE_SYNCHRONOUS");
    }

    #[test]
    #[serial]
    fn test_scheduler_config_defaults() {
        std::env::remove_var("SCHEDULER_ENABLED");
        std::env::remove_var("SCHEDULER_TICK_SECS");
        std::env::remove_var("SCHEDULER_ERROR_COOLDOWN_SECS");

        let config = Config::default();
        assert!(config.scheduler.enabled);
        assert_eq!(config.scheduler.tick_secs, 3600);
        assert_eq!(config.scheduler.error_cooldown_secs, 300);
    }

    #[test]
    #[serial]
    fn test_assignment_thresholds_default_and_override() {
        std::env::remove_var("ASSIGN_HIGH_CONFIDENCE");
        std::env::remove_var("ASSIGN_MEDIUM_CONFIDENCE");
        let config = Config::default();
        assert_eq!(config.assignment.high_confidence, 0.7);
        assert_eq!(config.assignment.medium_confidence, 0.5);

        std::env::set_var("ASSIGN_HIGH_CONFIDENCE", "0.8");
        let config = Config::default();
        assert_eq!(config.assignment.high_confidence, 0.8);
        std::env::remove_var("ASSIGN_HIGH_CONFIDENCE");
    }

    #[test]
    #[serial]
    fn test_llm_config_absent_without_model() {
        std::env::remove_var("LLM_MODEL");
        let config = Config::default();
        assert!(config.llm.is_none());

        std::env::set_var("LLM_MODEL", "gpt-4o-mini");
        let config = Config::default();
        let llm = config.llm.unwrap();
        assert_eq!(llm.model, "gpt-4o-mini");
        assert_eq!(llm.timeout_secs, 30);
        assert_eq!(llm.max_retries, 3);
        assert_eq!(llm.max_tokens, 500);

        std::env::remove_var("LLM_MODEL");
    }

    #[test]
    #[serial]
    fn test_embeddings_api_key_falls_back_to_openai() {
        std::env::remove_var("EMBEDDING_API_KEY");
        std::env::set_var("OPENAI_API_KEY", "sk-shared");
        let config = Config::default();
        assert_eq!(config.embeddings.api_key.as_deref(), Some("sk-shared"));
        std::env::remove_var("OPENAI_API_KEY");
    }

    #[test]
    #[serial]
    fn test_parse_env_or_invalid_value_uses_default() {
        std::env::set_var("__TEST_VOX_PORT", "not-a-number");
        let result: u16 = parse_env_or("__TEST_VOX_PORT", 8000);
        assert_eq!(result, 8000);
        std::env::remove_var("__TEST_VOX_PORT");
    }
}
