// =============================================================================
// Search Trends — Google Trends interest via SerpApi
// =============================================================================
//
// GET /search.json?engine=google_trends&q=..&data_type=TIMESERIES&date=..
//   { "interest_over_time": { "timeline_data": [
//       { "values": [ { "query": "bitcoin", "extracted_value": 45 } ] }, ... ] } }
//
// The score is the latest timeline value.  HTTP 429 is retried with
// exponential backoff up to `max_attempts`; anything else fails immediately.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::SourceError;
use crate::runtime_config::TrendSettings;
use crate::sources::{fetch_json, TrendSource};

const SERPAPI_URL: &str = "https://serpapi.com";

#[derive(Debug, Deserialize)]
struct TrendsResponse {
    interest_over_time: Option<InterestOverTime>,
}

#[derive(Debug, Deserialize)]
struct InterestOverTime {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    #[serde(default)]
    values: Vec<TimelineValue>,
}

#[derive(Debug, Deserialize)]
struct TimelineValue {
    extracted_value: Option<f64>,
}

/// SerpApi-backed trend source.
#[derive(Clone)]
pub struct TrendsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    settings: TrendSettings,
}

impl TrendsClient {
    pub fn new(client: reqwest::Client, settings: TrendSettings, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: SERPAPI_URL.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            settings,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_once(&self, api_key: &str) -> Result<f64, SourceError> {
        let url = format!("{}/search.json", self.base_url);
        let mut query = vec![
            ("engine", "google_trends"),
            ("data_type", "TIMESERIES"),
            ("q", self.settings.keyword.as_str()),
            ("date", self.settings.timeframe.as_str()),
            ("api_key", api_key),
        ];
        if !self.settings.geo.is_empty() {
            query.push(("geo", self.settings.geo.as_str()));
        }
        let resp: TrendsResponse = fetch_json(self.client.get(url).query(&query)).await?;
        latest_interest(resp)
    }

    /// Delay before retry number `attempt` (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.settings.backoff_base_ms.saturating_mul(factor))
    }
}

fn latest_interest(resp: TrendsResponse) -> Result<f64, SourceError> {
    resp.interest_over_time
        .and_then(|i| {
            i.timeline_data
                .iter()
                .rev()
                .find_map(|p| p.values.first().and_then(|v| v.extracted_value))
        })
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| SourceError::Malformed("no interest_over_time values".into()))
}

#[async_trait]
impl TrendSource for TrendsClient {
    #[instrument(skip(self), name = "trends::fetch")]
    async fn trend_score(&self) -> Result<f64, SourceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceError::Disabled("no SerpApi key configured".into()))?;

        let attempts = self.settings.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.fetch_once(api_key).await {
                Ok(score) => {
                    debug!(score, attempt, "trend score fetched");
                    return Ok(score);
                }
                Err(e) if e.is_rate_limited() && attempt < attempts => {
                    let delay = self.backoff(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "trend source rate limited, backing off");
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_rate_limited() => {
                    return Err(SourceError::RateLimited { attempts });
                }
                Err(e) => return Err(e),
            }
        }
        Err(SourceError::RateLimited { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::serve;
    use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn settings(max_attempts: u32) -> TrendSettings {
        TrendSettings {
            max_attempts,
            backoff_base_ms: 1,
            ..TrendSettings::default()
        }
    }

    fn timeline() -> serde_json::Value {
        json!({"interest_over_time": {"timeline_data": [
            {"values": [{"query": "bitcoin", "value": "40", "extracted_value": 40}]},
            {"values": [{"query": "bitcoin", "value": "62", "extracted_value": 62}]}
        ]}})
    }

    /// Server that answers 429 for the first `failures` requests.
    async fn flaky_server(failures: u32) -> (String, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/search.json",
            get(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < failures {
                        StatusCode::TOO_MANY_REQUESTS.into_response()
                    } else {
                        Json(timeline()).into_response()
                    }
                }
            }),
        );
        (serve(app).await, hits)
    }

    #[test]
    fn latest_value_is_used() {
        let resp: TrendsResponse = serde_json::from_value(timeline()).unwrap();
        assert_eq!(latest_interest(resp).unwrap(), 62.0);
    }

    #[test]
    fn missing_timeline_is_malformed() {
        let resp: TrendsResponse = serde_json::from_value(json!({"error": "nope"})).unwrap();
        assert!(latest_interest(resp).is_err());
    }

    #[test]
    fn backoff_doubles() {
        let client = TrendsClient::new(
            reqwest::Client::new(),
            TrendSettings { backoff_base_ms: 100, ..TrendSettings::default() },
            None,
        );
        assert_eq!(client.backoff(1), Duration::from_millis(100));
        assert_eq!(client.backoff(2), Duration::from_millis(200));
        assert_eq!(client.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn disabled_without_key() {
        let client = TrendsClient::new(reqwest::Client::new(), settings(3), Some("  ".into()));
        assert!(matches!(client.trend_score().await, Err(SourceError::Disabled(_))));
    }

    #[tokio::test]
    async fn retries_through_rate_limit() {
        let (base, hits) = flaky_server(2).await;
        let client = TrendsClient::new(reqwest::Client::new(), settings(3), Some("k".into()))
            .with_base_url(base);
        assert_eq!(client.trend_score().await.unwrap(), 62.0);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let (base, hits) = flaky_server(10).await;
        let client = TrendsClient::new(reqwest::Client::new(), settings(2), Some("k".into()))
            .with_base_url(base);
        assert!(matches!(
            client.trend_score().await,
            Err(SourceError::RateLimited { attempts: 2 })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
