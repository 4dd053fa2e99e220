// =============================================================================
// Fear & Greed Index — alternative.me
// =============================================================================
//
// GET /fng/?limit=1 =>
//   { "data": [ { "value": "75", "value_classification": "Greed", ... } ] }
//
// The value arrives as a string; it must parse to a number in [0, 100].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::SourceError;
use crate::sources::{fetch_json, SentimentSource};
use crate::types::SentimentReading;

const FEAR_GREED_API_URL: &str = "https://api.alternative.me";

#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: String,
    value_classification: String,
}

/// Client for the alternative.me Fear & Greed index.
#[derive(Clone)]
pub struct FearGreedClient {
    client: reqwest::Client,
    base_url: String,
}

impl FearGreedClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: FEAR_GREED_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn reading_from(resp: FngResponse) -> Result<SentimentReading, SourceError> {
    let entry = resp
        .data
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::Malformed("fear & greed response has no data".into()))?;

    let value: f64 = entry
        .value
        .trim()
        .parse()
        .map_err(|_| SourceError::Malformed(format!("fear & greed value {:?}", entry.value)))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(SourceError::Malformed(format!("fear & greed value {value} out of range")));
    }

    Ok(SentimentReading {
        value,
        label: entry.value_classification,
    })
}

#[async_trait]
impl SentimentSource for FearGreedClient {
    #[instrument(skip(self), name = "fear_greed::fetch")]
    async fn fear_greed(&self) -> Result<SentimentReading, SourceError> {
        let url = format!("{}/fng/", self.base_url);
        let resp: FngResponse = fetch_json(self.client.get(url).query(&[("limit", "1")])).await?;
        let reading = reading_from(resp)?;
        debug!(value = reading.value, label = %reading.label, "fear & greed fetched");
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::serve;
    use axum::{routing::get, Json, Router};
    use serde_json::json;

    fn parse(v: serde_json::Value) -> Result<SentimentReading, SourceError> {
        reading_from(serde_json::from_value(v).unwrap())
    }

    #[test]
    fn parses_string_value() {
        let r = parse(json!({"data": [{"value": "75", "value_classification": "Greed"}]})).unwrap();
        assert_eq!(r.value, 75.0);
        assert_eq!(r.label, "Greed");
    }

    #[test]
    fn rejects_empty_and_out_of_range() {
        assert!(parse(json!({"data": []})).is_err());
        assert!(parse(json!({"data": [{"value": "140", "value_classification": "?"}]})).is_err());
        assert!(parse(json!({"data": [{"value": "n/a", "value_classification": "?"}]})).is_err());
    }

    #[tokio::test]
    async fn fetches_from_server() {
        let app = Router::new().route(
            "/fng/",
            get(|| async {
                Json(json!({"name": "Fear and Greed Index",
                    "data": [{"value": "21", "value_classification": "Extreme Fear", "timestamp": "1700000000"}]}))
            }),
        );
        let base = serve(app).await;
        let r = FearGreedClient::new(reqwest::Client::new())
            .with_base_url(base)
            .fear_greed()
            .await
            .unwrap();
        assert_eq!(r.value, 21.0);
        assert_eq!(r.label, "Extreme Fear");
    }
}
