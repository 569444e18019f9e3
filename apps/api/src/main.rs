mod assessment;
mod auth;
mod config;
mod errors;
mod llm_client;
mod routes;
mod sheets;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::sheets::{GoogleSheetsSink, LogOnlySink, SheetSink};
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

    info!("Starting Interview Assessor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())
        .context("Failed to build LLM HTTP client")?;
    info!("LLM client initialized (model: {})", config.llm_model);

    // Initialize sheet sink
    let sheet: Arc<dyn SheetSink> = match &config.sheet {
        Some(sheet) => Arc::new(
            GoogleSheetsSink::new(
                sheet.spreadsheet_id.clone(),
                sheet.range.clone(),
                sheet.access_token.clone(),
            )
            .context("Failed to build Sheets HTTP client")?,
        ),
        None => {
            warn!("GOOGLE_SHEETS_SPREADSHEET_ID not set; rows will be logged, not saved");
            Arc::new(LogOnlySink)
        }
    };
    info!("Sheet sink: {}", sheet.describe());

    if config.credentials.is_enabled() {
        info!("Staff login gate enabled ({} users)", config.credentials.user_count());
    } else {
        warn!("STAFF_CREDENTIALS not set; login gate disabled");
    }
    info!("Default prompt template: {}", config.default_template.as_str());

    // Build app state
    let state = AppState {
        model: Arc::new(llm),
        sheet,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the form has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
