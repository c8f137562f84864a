mod config;
mod dispatch;
mod errors;
mod models;
mod process;
mod reconcile;
mod regeneration;
mod routes;
mod sheets;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::DispatchTrigger;
use crate::reconcile::rows::Session;
use crate::regeneration::subprocess::SubprocessRegenerator;
use crate::routes::build_router;
use crate::sheets::cache::TokioClock;
use crate::sheets::client::GoogleSheetsClient;
use crate::sheets::source::SpreadsheetSource;
use crate::state::AppState;
use crate::store::ContentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
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

    info!("Starting Outreach API v{}", env!("CARGO_PKG_VERSION"));

    // Spreadsheet source
    let reader = GoogleSheetsClient::new(
        config.sheets_api_base.clone(),
        config.sheet_id.clone(),
        config.sheets_auth.clone(),
        config.sheets_timeout,
    )?;
    let sheets = SpreadsheetSource::new(
        Arc::new(reader),
        config.sheet_name.clone(),
        config.sheet_cache_ttl,
        Arc::new(TokioClock),
    );
    info!(
        "Sheets client initialized (sheet: {}, cache: {}s)",
        config.sheet_name,
        config.sheet_cache_ttl.as_secs()
    );

    // Draft store
    let store = ContentStore::open(&config.baseline_path, config.overlay_path.clone()).await;
    info!("Overlay file: {}", config.overlay_path.display());

    // Regeneration and dispatch
    let regenerator = Arc::new(SubprocessRegenerator::new(
        config.generator_program.clone(),
        config.generator_script.clone(),
        config.generator_output_path.clone(),
        config.generation_timeout,
    ));
    let dispatcher = DispatchTrigger::new(
        config.dispatch_program.clone(),
        config.dispatch_script.clone(),
    );

    // Build app state
    let state = AppState {
        sheets: Arc::new(sheets),
        store: Arc::new(store),
        regenerator,
        dispatcher,
        session: Arc::new(Session::default()),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
