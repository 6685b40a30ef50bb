use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use geofed_nlq_backend::api::handlers::AppState;
use geofed_nlq_backend::api::routes::create_router_with_state;
use geofed_nlq_backend::config::Config;
use geofed_nlq_backend::services::nlq::{catalog, NlqTranslator};
use geofed_nlq_backend::services::{FederatedQueryService, GenerationClient, LlmService};
use geofed_nlq_backend::storage::SqliteAuditLog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so RUST_LOG from .env reaches the filter
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting server on {}", config.server_address());

    let llm = Arc::new(LlmService::new(&config.llm));
    if llm.is_available() {
        info!("LLM available, model {}", llm.model());
    } else if config.llm.fallback_enabled {
        warn!("LLM_API_KEY not set, questions will use rule-based fallback");
    } else {
        warn!("LLM_API_KEY not set and fallback disabled, questions will not be translated");
    }

    let catalog = catalog::builtin();
    info!(
        "Loaded schema catalog {} with {} entries",
        catalog.version,
        catalog.entries.len()
    );
    let translator = Arc::new(NlqTranslator::new(catalog, llm));

    let executor = Arc::new(FederatedQueryService::new(&config.engine)?);
    info!("Federated query engine at {}", executor.endpoint());

    let audit = Arc::new(
        SqliteAuditLog::new(&config.audit.database_url)
            .await
            .map_err(|e| {
                error!("Failed to initialize audit database: {}", e);
                e
            })?,
    );

    let state = AppState {
        config: config.clone(),
        translator,
        executor,
        audit,
    };
    let app: Router = create_router_with_state(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
