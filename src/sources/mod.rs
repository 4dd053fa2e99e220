// =============================================================================
// Data Sources — external providers behind async trait seams
// =============================================================================
//
//   PriceSource     — spot price, daily history, volume, dominance (CoinGecko)
//   SentimentSource — Fear & Greed index (alternative.me)
//   TrendSource     — search-interest score (Google Trends via SerpApi)
//
// Every call returns a value or a `SourceError`.  Retry and rate-limit policy
// lives inside the individual clients; the collector turns failures into
// absent signals and caches successes.

pub mod coingecko;
pub mod collector;
pub mod fear_greed;
pub mod trends;

pub use coingecko::CoinGeckoClient;
pub use collector::{MarketSnapshot, SignalCollector};
pub use fear_greed::FearGreedClient;
pub use trends::TrendsClient;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::types::{PriceSeries, SentimentReading, VolumeStats};

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current spot price in the quote currency.
    async fn spot_price(&self) -> Result<f64, SourceError>;

    /// Daily price history, oldest first.
    async fn price_history(&self) -> Result<PriceSeries, SourceError>;

    /// Latest 24h volume and its trailing 7-day average.
    async fn volume_stats(&self) -> Result<VolumeStats, SourceError>;

    /// Asset share of total market cap, percent.
    async fn dominance(&self) -> Result<f64, SourceError>;
}

#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn fear_greed(&self) -> Result<SentimentReading, SourceError>;
}

#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn trend_score(&self) -> Result<f64, SourceError>;
}

/// Build the shared outbound HTTP client.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("cycle-top/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

/// Send `request`, map non-2xx statuses to `SourceError::Status`, and decode
/// the JSON body.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SourceError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body: String = resp.text().await.unwrap_or_default().chars().take(256).collect();
        return Err(SourceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SourceError::Malformed(e.to_string()))
}

impl SourceError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. } | Self::RateLimited { .. })
    }
}
