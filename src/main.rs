// =============================================================================
// Cycle-Top — Main Entry Point
// =============================================================================
//
// `Once` evaluates a single time and prints the report as JSON.
// `Service` serves the REST API and re-evaluates on a fixed schedule until
// Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod cache;
mod engine;
mod error;
mod history;
mod indicators;
mod runtime_config;
mod signals;
mod sources;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::history::{CsvHistory, HistoryRecorder, MemoryHistory};
use crate::runtime_config::{
    RuntimeConfig, DEFAULT_CONFIG_PATH, ENV_COINGECKO_KEY, ENV_CONFIG_PATH, ENV_SERPAPI_KEY,
};
use crate::sources::{CoinGeckoClient, FearGreedClient, SignalCollector, TrendsClient};
use crate::types::RunMode;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut config = match RuntimeConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "failed to load config, using defaults");
            let cfg = RuntimeConfig::default();
            if !Path::new(&config_path).exists() {
                if let Err(e) = cfg.save(&config_path) {
                    warn!(error = %e, "could not write default config");
                }
            }
            cfg
        }
    };
    config.apply_overrides(|key| std::env::var(key).ok());

    info!(
        asset = %config.asset_id,
        run_mode = %config.run_mode,
        persist_history = config.persist_history,
        "cycle-top starting"
    );

    // ── 2. Sources ───────────────────────────────────────────────────────
    let http = sources::http_client(config.http_timeout()).context("failed to build HTTP client")?;

    let coingecko_key = std::env::var(ENV_COINGECKO_KEY).ok();
    let serpapi_key = std::env::var(ENV_SERPAPI_KEY).ok();
    if serpapi_key.is_none() {
        warn!("no SerpApi key configured; trend signal disabled");
    }

    let collector = SignalCollector::new(
        Arc::new(CoinGeckoClient::new(http.clone(), &config, coingecko_key)),
        Arc::new(FearGreedClient::new(http.clone())),
        Arc::new(TrendsClient::new(http, config.trend.clone(), serpapi_key)),
        config.cache_ttls.clone(),
    );

    // ── 3. History store ─────────────────────────────────────────────────
    let history: Arc<dyn HistoryRecorder> = if config.persist_history {
        let csv = CsvHistory::new(&config.history_path);
        info!(path = %csv.path().display(), "recording score history to CSV");
        Arc::new(csv)
    } else {
        Arc::new(MemoryHistory::new())
    };

    let state = Arc::new(AppState::new(config, collector, history));

    match state.config.run_mode {
        RunMode::Once => run_once(&state).await,
        RunMode::Service => run_service(state).await,
    }
}

async fn run_once(state: &AppState) -> anyhow::Result<()> {
    let report = state.run_evaluation().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_service(state: Arc<AppState>) -> anyhow::Result<()> {
    // ── API server ───────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {}", state.config.bind_addr))?;
    info!(addr = %state.config.bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── Scheduled evaluations ────────────────────────────────────────────
    let sched_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sched_state.config.schedule_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            // Failures are already logged and counted by the state.
            let _ = sched_state.run_evaluation().await;
        }
    });

    info!(
        interval_secs = state.config.schedule_interval().as_secs(),
        "scheduler running. Press Ctrl+C to stop."
    );

    // ── Graceful shutdown ────────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    let stats = state.stats();
    warn!(
        evaluations = stats.evaluations,
        failed = stats.failed_evaluations,
        "shutdown signal received"
    );
    Ok(())
}
