mod classification;
mod config;
mod errors;
mod llm_client;
mod reference;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::AssistantClient;
use crate::reference::descriptions::DescriptionTable;
use crate::reference::ReferenceTable;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Classification API v{}", env!("CARGO_PKG_VERSION"));

    // Reference data: loaded once, read-only for the life of the process
    let reference = ReferenceTable::load(&config.reference_table_path).with_context(|| {
        format!(
            "Failed to load reference table from {}",
            config.reference_table_path.display()
        )
    })?;
    if reference.is_empty() {
        warn!("Reference table is empty; every candidate will be discarded");
    }
    let descriptions = DescriptionTable::load_optional(&config.descriptions_path)?;

    // Initialize agent gateway
    let agent = AssistantClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.assistant_id.clone(),
        config.agent_poll_interval,
    )?;
    info!(
        "Agent gateway initialized (assistant: {}, timeout: {}s)",
        agent.assistant_id(),
        config.agent_timeout.as_secs()
    );

    let state = AppState {
        reference: Arc::new(reference),
        descriptions: descriptions.map(Arc::new),
        agent: Arc::new(agent),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the form UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
