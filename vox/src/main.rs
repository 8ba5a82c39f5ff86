use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vox::airtable::AirtableClient;
use vox::api::{create_router, AppState};
use vox::config::{Config, SchedulerConfig};
use vox::db::{Database, DatabaseBackend, LibSqlBackend};
use vox::embeddings::EmbeddingProvider;
use vox::llm::LlmProvider;
use vox::models::{ReferenceTicket, TicketImport};
use vox::services::RefreshScheduler;

#[derive(Parser)]
#[command(name = "vox")]
#[command(about = "Self-hostable voice-of-customer hub")]
struct Args {
    /// Bulk-load the reference ticket corpus from a JSON export before serving
    #[arg(long, value_name = "PATH")]
    import_tickets: Option<PathBuf>,

    /// Recompute reference ticket embeddings even where they are already stored
    #[arg(long)]
    revectorize: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();

    if config.server.api_keys.is_empty() {
        tracing::warn!("VOX_API_KEYS not set; accepting unauthenticated requests");
    }

    tracing::info!("Opening local store...");
    let database = Database::new(&config.database).await?;
    let db: Arc<dyn DatabaseBackend> = Arc::new(LibSqlBackend::new(database));

    let airtable = AirtableClient::new(config.airtable.clone())?;
    if !airtable.is_configured() {
        tracing::warn!(
            "Airtable credentials missing - refreshes will fail until AIRTABLE_API_KEY and AIRTABLE_BASE_ID are set"
        );
    }

    let embeddings = EmbeddingProvider::new(&config.embeddings);
    if embeddings.is_available() {
        tracing::info!("Embedding provider ready: {}", config.embeddings.model);
    } else {
        tracing::warn!("Embeddings unavailable - team routing falls back to lexical scoring");
    }

    let llm = LlmProvider::new(config.llm.as_ref());
    match (&config.llm, llm.is_available()) {
        (Some(llm_config), true) => tracing::info!("LLM provider ready: {}", llm_config.model),
        _ => tracing::warn!(
            "LLM unavailable - grounded chat answers are disabled until LLM_MODEL is set"
        ),
    }

    let state = AppState::new(config.clone(), db, airtable, embeddings, llm);

    if let Some(path) = &args.import_tickets {
        import_reference_tickets(&state, path).await?;
    }

    if args.revectorize {
        tracing::info!("Revectorizing reference corpus...");
        let embedded = state.assignment.vectorize_reference_corpus(true).await?;
        tracing::info!(embedded, "Reference corpus revectorized");
    }

    let cancel_token = CancellationToken::new();

    if config.scheduler.enabled {
        spawn_scheduler(&state, &config.scheduler, &cancel_token);
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Vox listening on http://{addr}");
    tracing::info!("  health:  http://{addr}/health");
    tracing::info!("  docs:    http://{addr}/api/v1/docs");
    tracing::info!("  openapi: http://{addr}/api/v1/openapi.json");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vox=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn import_reference_tickets(state: &AppState, path: &Path) -> anyhow::Result<()> {
    tracing::info!(path = %path.display(), "Importing reference tickets...");
    let raw = std::fs::read_to_string(path)?;
    let imports: Vec<TicketImport> = serde_json::from_str(&raw)?;
    let tickets: Vec<ReferenceTicket> = imports.into_iter().map(Into::into).collect();
    let imported = state.assignment.import_corpus(tickets).await?;
    tracing::info!(imported, "Reference ticket import complete");
    Ok(())
}

/// Runs the calendar scheduler until cancelled. Each iteration sleeps until
/// the next tick boundary, then fires whatever refresh the calendar policy
/// selects for that wall-clock slot.
fn spawn_scheduler(state: &AppState, config: &SchedulerConfig, cancel_token: &CancellationToken) {
    tracing::info!("Starting refresh scheduler...");
    let scheduler = RefreshScheduler::new(state.engine.clone(), state.assignment.clone(), config);
    let token = cancel_token.child_token();

    tokio::spawn(async move {
        loop {
            let delay = scheduler.next_tick_delay(chrono::Local::now().naive_local());
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Refresh scheduler stopped");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = scheduler.run_once().await {
                        tracing::error!("Scheduled refresh failed: {}", e);
                        tokio::time::sleep(Duration::from_secs(scheduler.error_cooldown_secs()))
                            .await;
                    }
                }
            }
        }
    });
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
        }
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received, stopping background tasks...");
    cancel_token.cancel();
}
