// =============================================================================
// CoinGecko client — price, history, volume, dominance
// =============================================================================
//
// Endpoints:
//   /simple/price?ids={id}&vs_currencies={cur}        spot price
//   /coins/{id}/market_chart?vs_currency=..&days=..   prices + total_volumes
//   /global                                           market_cap_percentage
//
// A pro API key switches to the pro host and is sent as `x-cg-pro-api-key`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::SourceError;
use crate::runtime_config::RuntimeConfig;
use crate::sources::{fetch_json, PriceSource};
use crate::types::{PricePoint, PriceSeries, VolumeStats};

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
const COINGECKO_PRO_API_URL: &str = "https://pro-api.coingecko.com/api/v3";
const PRO_KEY_HEADER: &str = "x-cg-pro-api-key";

/// Days of daily volume used for the trailing average.
const VOLUME_WINDOW_DAYS: &str = "7";

#[derive(Debug, Deserialize)]
pub(crate) struct MarketChart {
    #[serde(default)]
    pub prices: Vec<[f64; 2]>,
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    market_cap_percentage: HashMap<String, f64>,
}

/// CoinGecko REST client for a single asset.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    asset_id: String,
    asset_symbol: String,
    vs_currency: String,
    history_days: String,
    dominance_override: Option<f64>,
}

impl CoinGeckoClient {
    pub fn new(client: reqwest::Client, config: &RuntimeConfig, api_key: Option<String>) -> Self {
        let base_url = if api_key.is_some() {
            COINGECKO_PRO_API_URL
        } else {
            COINGECKO_API_URL
        };
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
            asset_id: config.asset_id.clone(),
            asset_symbol: config.asset_symbol.to_lowercase(),
            vs_currency: config.vs_currency.to_lowercase(),
            history_days: config.history_days.clone(),
            dominance_override: config.dominance_override,
        }
    }

    /// Point the client at a local test server.
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.client.get(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => req.header(PRO_KEY_HEADER, key),
            None => req,
        }
    }

    async fn market_chart(&self, days: &str, daily: bool) -> Result<MarketChart, SourceError> {
        let path = format!("/coins/{}/market_chart", self.asset_id);
        let mut query = vec![("vs_currency", self.vs_currency.as_str()), ("days", days)];
        if daily {
            query.push(("interval", "daily"));
        }
        fetch_json(self.get(&path).query(&query)).await
    }
}

/// Convert `[[ms, price], ...]` into a validated series.  Upstream repeats the
/// latest intraday point, so duplicates are collapsed.
pub(crate) fn series_from_chart(chart: &MarketChart) -> Result<PriceSeries, SourceError> {
    let mut points = Vec::with_capacity(chart.prices.len());
    for [ms, price] in &chart.prices {
        let ts = DateTime::<Utc>::from_timestamp_millis(*ms as i64)
            .ok_or_else(|| SourceError::Malformed(format!("bad timestamp {ms}")))?;
        points.push(PricePoint::new(ts, *price));
    }
    PriceSeries::from_unordered(points).map_err(|e| SourceError::Malformed(e.to_string()))
}

/// Latest daily volume against the mean of the days before it.
pub(crate) fn volume_from_chart(chart: &MarketChart) -> Result<VolumeStats, SourceError> {
    let volumes: Vec<f64> = chart
        .total_volumes
        .iter()
        .map(|[_, v]| *v)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect();
    let (latest, prior) = volumes
        .split_last()
        .filter(|(_, prior)| !prior.is_empty())
        .ok_or_else(|| SourceError::Malformed("need at least two volume points".into()))?;
    let latest = *latest;
    let average = prior.iter().sum::<f64>() / prior.len() as f64;
    Ok(VolumeStats {
        latest_volume: latest,
        average_volume: average,
    })
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    #[instrument(skip(self), name = "coingecko::spot_price")]
    async fn spot_price(&self) -> Result<f64, SourceError> {
        let body: HashMap<String, HashMap<String, f64>> = fetch_json(
            self.get("/simple/price")
                .query(&[("ids", self.asset_id.as_str()), ("vs_currencies", self.vs_currency.as_str())]),
        )
        .await?;

        let price = body
            .get(&self.asset_id)
            .and_then(|m| m.get(&self.vs_currency))
            .copied()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| SourceError::Malformed("spot price missing from response".into()))?;

        debug!(price, "spot price fetched");
        Ok(price)
    }

    #[instrument(skip(self), name = "coingecko::price_history")]
    async fn price_history(&self) -> Result<PriceSeries, SourceError> {
        let chart = self.market_chart(&self.history_days, false).await?;
        let series = series_from_chart(&chart)?;
        debug!(points = series.len(), "price history fetched");
        Ok(series)
    }

    #[instrument(skip(self), name = "coingecko::volume_stats")]
    async fn volume_stats(&self) -> Result<VolumeStats, SourceError> {
        let chart = self.market_chart(VOLUME_WINDOW_DAYS, true).await?;
        let stats = volume_from_chart(&chart)?;
        debug!(
            latest = stats.latest_volume,
            average = stats.average_volume,
            "volume stats fetched"
        );
        Ok(stats)
    }

    #[instrument(skip(self), name = "coingecko::dominance")]
    async fn dominance(&self) -> Result<f64, SourceError> {
        if let Some(fixed) = self.dominance_override {
            return Ok(fixed);
        }
        let body: GlobalResponse = fetch_json(self.get("/global")).await?;
        let pct = body
            .data
            .market_cap_percentage
            .get(&self.asset_symbol)
            .copied()
            .ok_or_else(|| {
                SourceError::Malformed(format!("no dominance entry for {}", self.asset_symbol))
            })?;
        debug!(dominance = pct, "dominance fetched");
        Ok(pct)
    }
}
