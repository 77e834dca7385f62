//! Docs Chat - documentation-site chat widget service
//!
//! Hosts one chat session per browser session. Each session lazily loads
//! the crawled documentation, keeps the conversation transcript, and asks
//! Gemini to answer with the whole documentation as context.

mod api;
mod config;
mod corpus;
mod db;
mod llm;
mod render;
mod runtime;
mod state_machine;
mod storage;
mod system_prompt;
mod widget;

use api::{create_router, AppState};
use config::ChatConfig;
use corpus::{CorpusSource, HttpCorpusSource};
use db::Database;
use llm::{GeminiService, LlmService, LoggingService};
use runtime::{LlmClient, ServiceLlmClient, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docs_chat=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ChatConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let purged = db.purge_older_than(config.session_ttl)?;
    if purged > 0 {
        tracing::info!(purged, "Expired stale session data");
    }

    let sessions = match &config.api_key {
        Some(api_key) => {
            let gemini = GeminiService::new(
                api_key.clone(),
                &config.model,
                config.api_base.as_deref(),
                config.request_timeout,
            )?;
            let service: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));
            let llm_client: Arc<dyn LlmClient> = Arc::new(ServiceLlmClient::new(service));
            let corpus_source: Arc<dyn CorpusSource> = Arc::new(HttpCorpusSource::new(
                config.content_url.clone(),
                config.request_timeout,
            )?);

            tracing::info!(
                model = %config.model,
                content_url = %config.content_url,
                "Chat enabled"
            );
            let manager = Arc::new(SessionManager::new(
                db,
                corpus_source,
                llm_client,
                config.initial_prompt.clone(),
            ));
            manager.spawn_sweeper(config.session_ttl);
            Some(manager)
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set. The chat widget will be disabled.");
            None
        }
    };

    let port = config.port;
    let state = AppState::new(sessions, config);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Docs chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
