mod config;
mod errors;
mod extraction;
mod interview;
mod llm_client;
mod models;
mod questions;
mod report;
mod routes;
mod scoring;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::scoring::RubricScorer;
use crate::session::registry::SessionRegistry;
use crate::session::store::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cadence API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the LLM client shared by question generation and scoring
    let oracle = LlmClient::new(
        config.anthropic_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    );
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Answer scorer: LLM rubric with deterministic lexical fallback
    let scorer = Arc::new(RubricScorer::new(oracle.clone()));

    // Session store + registry (revives persisted sessions on lookup miss)
    let store = SessionStore::new(&config.data_dir)?;
    std::fs::create_dir_all(&config.reports_dir)?;
    let sessions = SessionRegistry::new(store);
    info!("Session store at {}", config.data_dir.display());

    // Build app state
    let state = AppState {
        config: config.clone(),
        oracle,
        scorer,
        sessions,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
