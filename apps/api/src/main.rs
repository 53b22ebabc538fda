mod chat;
mod config;
mod errors;
mod llm_client;
mod recommend;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::chat::prompt::UploadPolicy;
use crate::chat::store::SessionStore;
use crate::config::Config;
use crate::llm_client::{GeminiClient, ModelGateway};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting chat API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the model gateway
    let gemini = GeminiClient::new(&config.gemini_api_base, config.generation.clone())?;
    match config.gemini_api_key.as_deref() {
        Some(api_key) => {
            gemini
                .configure(config.generation.clone(), Some(api_key))
                .await?;
        }
        None => warn!(
            "GEMINI_API_KEY is not set — generation is disabled until a key is supplied via PUT /api/v1/config"
        ),
    }

    let upload_policy = UploadPolicy::new(config.inline_pdf_limit_bytes);
    info!(
        "PDFs of {} bytes or more are uploaded instead of inlined",
        config.inline_pdf_limit_bytes
    );

    let sessions = match config.session_idle_ttl {
        Some(ttl) => {
            info!("Sessions idle for {} minutes are evicted", ttl.num_minutes());
            SessionStore::with_idle_ttl(ttl)
        }
        None => SessionStore::new(),
    };

    // Build app state
    let state = AppState {
        sessions,
        gateway: Arc::new(gemini),
        upload_policy,
    };

    // Build router
    let app = build_router(state, config.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins to the deployed chat UI

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
