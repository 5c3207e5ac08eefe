//! ==============================================================================
//! main.rs - temperature monitor entry point
//! ==============================================================================
//!
//! purpose:
//!     a single-page dashboard for a remote temperature-reporting service.
//!     every page request fetches the current reading plus the raw, hourly
//!     and daily series, then renders them as charts and tables.
//!
//! responsibilities:
//!     - load configuration (monitor.toml + command line / env overrides)
//!     - initialize logging
//!     - build the upstream client once
//!     - serve the dashboard and a json snapshot of the same data
//!
//! relationships:
//!     - uses: config.rs (settings), fetcher.rs (upstream client)
//!     - uses: dashboard.rs (collect + render_page per request)
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                  rust host (this file)                   │
//!     │   GET /  ──────┐                    ┌──── GET /api/...   │
//!     │                ▼                    ▼                    │
//!     │          ┌──────────────────────────────┐                │
//!     │          │ dashboard::collect (4 GETs,  │ <- dashboard.rs│
//!     │          │ one after another)           │                │
//!     │          └──────────────┬───────────────┘                │
//!     │                         │ reqwest                        │
//!     └─────────────────────────┼────────────────────────────────┘
//!                               ▼
//!              temperature service (/current, /all_readings,
//!                   /hourly_average, /daily_average)
//!
//!     nothing is kept between requests: reloading the page re-runs the
//!     whole pipeline.
//!
//! ==============================================================================

mod config;
mod dashboard;
mod error;
mod fetcher;
mod render;
mod series;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{DashboardConfig, MonitorConfig};
use fetcher::DataFetcher;

// ==============================================================================
// command line
// ==============================================================================

#[derive(Parser, Debug)]
#[clap(author, about, long_about = None)]
struct Args {
    /// Path to monitor.toml. Without it config/monitor.toml and
    /// ../config/monitor.toml are tried, then built-in defaults.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Base url of the temperature service, e.g. http://localhost:8080
    #[clap(env = "MONITOR_BASE_URL", long)]
    base_url: Option<String>,

    /// A socket address for serving the dashboard.
    #[clap(env = "MONITOR_LISTEN_ADDR", long)]
    listen_addr: Option<SocketAddr>,
}

// ==============================================================================
// shared state
// ==============================================================================
// read-only for the lifetime of the process. the http client pools
// connections internally; no readings are kept here.

pub struct AppState {
    pub fetcher: DataFetcher,
    pub dashboard: DashboardConfig,
}

// ==============================================================================
// main entry point
// ==============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // step 1: load configuration
    let (mut config, origin) = MonitorConfig::load_or_default(args.config.as_deref())?;
    config.apply_overrides(args.base_url, args.listen_addr)?;

    // step 2: logging, RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &origin {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => info!("no config file found, using defaults"),
    }
    info!(
        upstream = %config.upstream.base_url,
        timeout_s = config.upstream.timeout_seconds,
        refresh_s = config.dashboard.refresh_seconds,
        "temperature monitor starting"
    );

    // step 3: upstream client, built once
    let fetcher = DataFetcher::new(&config.upstream)?;

    // step 4: serve until stopped
    let state = Arc::new(AppState {
        fetcher,
        dashboard: config.dashboard.clone(),
    });
    run_server(state, config.server.listen_addr).await
}

// ==============================================================================
// web server
// ==============================================================================

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/snapshot", get(snapshot_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn run_server(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "dashboard live");

    axum::serve(listener, router(state)).await.context("web server error")?;
    Ok(())
}

/// the dashboard page, rebuilt from scratch on every request
async fn dashboard_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let page = dashboard::collect(&state.fetcher).await;
    Html(dashboard::render_page(&page, &state.dashboard))
}

/// json api endpoint for programmatic access
/// returns the same sections as the page, each as ok or error
async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<dashboard::Snapshot> {
    let page = dashboard::collect(&state.fetcher).await;
    Json(page.snapshot())
}
