// =============================================================================
// Runtime Configuration — engine settings with atomic save
// =============================================================================
//
// Every tunable lives here: which asset to query, how long fetched data stays
// fresh, retry policy for rate-limited sources, where history goes, and how
// the process runs.
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry serde
// defaults so that adding new fields never breaks loading an older file.
//
// API keys are read from the environment in `main`, never from this file.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::indicators::MacdParams;
use crate::types::RunMode;

pub const DEFAULT_CONFIG_PATH: &str = "cycle_top_config.json";

pub const ENV_CONFIG_PATH: &str = "CYCLE_TOP_CONFIG";
pub const ENV_COINGECKO_KEY: &str = "COINGECKO_API_KEY";
pub const ENV_SERPAPI_KEY: &str = "SERPAPI_API_KEY";
pub const ENV_BIND_ADDR: &str = "CYCLE_TOP_BIND_ADDR";
pub const ENV_HISTORY_PATH: &str = "CYCLE_TOP_HISTORY_PATH";
pub const ENV_RUN_MODE: &str = "CYCLE_TOP_RUN_MODE";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_asset_id() -> String {
    "bitcoin".to_string()
}

fn default_asset_symbol() -> String {
    "btc".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_history_days() -> String {
    "max".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_rsi_period() -> usize {
    crate::indicators::rsi::DEFAULT_PERIOD
}

fn default_history_path() -> String {
    "score_history.csv".to_string()
}

fn default_schedule_interval_secs() -> u64 {
    3600
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_chart_points() -> usize {
    500
}

fn default_price_ttl() -> u64 {
    60
}

fn default_history_ttl() -> u64 {
    86_400
}

fn default_market_ttl() -> u64 {
    300
}

fn default_slow_ttl() -> u64 {
    3600
}

fn default_trend_keyword() -> String {
    "bitcoin".to_string()
}

fn default_trend_timeframe() -> String {
    "today 3-m".to_string()
}

fn default_trend_max_attempts() -> u32 {
    3
}

fn default_trend_backoff_ms() -> u64 {
    2000
}

// =============================================================================
// CacheTtls
// =============================================================================

/// How long each fetched input stays fresh, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTtls {
    #[serde(default = "default_price_ttl")]
    pub price_secs: u64,

    /// Daily history barely changes intraday.
    #[serde(default = "default_history_ttl")]
    pub history_secs: u64,

    #[serde(default = "default_market_ttl")]
    pub volume_secs: u64,

    #[serde(default = "default_market_ttl")]
    pub dominance_secs: u64,

    #[serde(default = "default_slow_ttl")]
    pub sentiment_secs: u64,

    #[serde(default = "default_slow_ttl")]
    pub trend_secs: u64,
}

impl CacheTtls {
    pub fn price(&self) -> Duration {
        Duration::from_secs(self.price_secs)
    }

    pub fn history(&self) -> Duration {
        Duration::from_secs(self.history_secs)
    }

    pub fn volume(&self) -> Duration {
        Duration::from_secs(self.volume_secs)
    }

    pub fn dominance(&self) -> Duration {
        Duration::from_secs(self.dominance_secs)
    }

    pub fn sentiment(&self) -> Duration {
        Duration::from_secs(self.sentiment_secs)
    }

    pub fn trend(&self) -> Duration {
        Duration::from_secs(self.trend_secs)
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            price_secs: default_price_ttl(),
            history_secs: default_history_ttl(),
            volume_secs: default_market_ttl(),
            dominance_secs: default_market_ttl(),
            sentiment_secs: default_slow_ttl(),
            trend_secs: default_slow_ttl(),
        }
    }
}

// =============================================================================
// TrendSettings
// =============================================================================

/// Search-interest query and its retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSettings {
    #[serde(default = "default_trend_keyword")]
    pub keyword: String,

    /// Region code; empty means worldwide.
    #[serde(default)]
    pub geo: String,

    #[serde(default = "default_trend_timeframe")]
    pub timeframe: String,

    /// Total attempts when the provider answers 429.
    #[serde(default = "default_trend_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay; doubled after every rate-limited attempt.
    #[serde(default = "default_trend_backoff_ms")]
    pub backoff_base_ms: u64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            keyword: default_trend_keyword(),
            geo: String::new(),
            timeframe: default_trend_timeframe(),
            max_attempts: default_trend_max_attempts(),
            backoff_base_ms: default_trend_backoff_ms(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the cycle-top engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Process -----------------------------------------------------------

    #[serde(default)]
    pub run_mode: RunMode,

    /// Seconds between scheduled evaluations in service mode.
    #[serde(default = "default_schedule_interval_secs")]
    pub schedule_interval_secs: u64,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Points served by the Pi Cycle chart endpoint.
    #[serde(default = "default_chart_points")]
    pub chart_points: usize,

    // --- Data sources ------------------------------------------------------

    /// Provider id of the tracked asset.
    #[serde(default = "default_asset_id")]
    pub asset_id: String,

    /// Ticker used to look up market-cap dominance.
    #[serde(default = "default_asset_symbol")]
    pub asset_symbol: String,

    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,

    /// Price history window in days, or "max".
    #[serde(default = "default_history_days")]
    pub history_days: String,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Static dominance percentage.  When set the dominance endpoint is
    /// never called.
    #[serde(default)]
    pub dominance_override: Option<f64>,

    #[serde(default)]
    pub cache_ttls: CacheTtls,

    #[serde(default)]
    pub trend: TrendSettings,

    // --- Scoring -----------------------------------------------------------

    #[serde(default = "default_true")]
    pub include_rsi: bool,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// MACD is added to the score unscaled, in quote-currency units, so it is
    /// opt-in.
    #[serde(default)]
    pub include_macd: bool,

    #[serde(default)]
    pub macd: MacdParams,

    /// Abort the run instead of scoring without a spot price.
    #[serde(default = "default_true")]
    pub require_price: bool,

    /// Label the Pi Cycle from the unfloored gap.  Off: the floored distance
    /// is classified, so an inactive indicator reads "close".
    #[serde(default)]
    pub classify_raw_pi_gap: bool,

    // --- History -----------------------------------------------------------

    #[serde(default = "default_true")]
    pub persist_history: bool,

    #[serde(default = "default_history_path")]
    pub history_path: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Once,
            schedule_interval_secs: default_schedule_interval_secs(),
            bind_addr: default_bind_addr(),
            chart_points: default_chart_points(),
            asset_id: default_asset_id(),
            asset_symbol: default_asset_symbol(),
            vs_currency: default_vs_currency(),
            history_days: default_history_days(),
            http_timeout_secs: default_http_timeout_secs(),
            dominance_override: None,
            cache_ttls: CacheTtls::default(),
            trend: TrendSettings::default(),
            include_rsi: true,
            rsi_period: default_rsi_period(),
            include_macd: false,
            macd: MacdParams::default(),
            require_price: true,
            classify_raw_pi_gap: false,
            persist_history: true,
            history_path: default_history_path(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            asset = %config.asset_id,
            run_mode = %config.run_mode,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `CYCLE_TOP_*` overrides.  `lookup` is normally
    /// `|k| std::env::var(k).ok()`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(ENV_BIND_ADDR).filter(|s| !s.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(path) = lookup(ENV_HISTORY_PATH).filter(|s| !s.trim().is_empty()) {
            self.history_path = path.trim().to_string();
        }
        if let Some(mode) = lookup(ENV_RUN_MODE) {
            match mode.parse() {
                Ok(m) => self.run_mode = m,
                Err(e) => warn!(error = %e, var = ENV_RUN_MODE, "ignoring run mode override"),
            }
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs.max(1))
    }
}
