// =============================================================================
// Signal Collector — one snapshot of every external input
// =============================================================================
//
// Fetches all sources concurrently through per-input freshness caches.  A
// failing source is logged and its field left `None`; collection itself never
// fails.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::FreshnessCache;
use crate::error::SourceError;
use crate::runtime_config::CacheTtls;
use crate::sources::{PriceSource, SentimentSource, TrendSource};
use crate::types::{PriceSeries, SentimentReading, VolumeStats};

const KEY_PRICE: &str = "spot_price";
const KEY_DOMINANCE: &str = "dominance";
const KEY_TREND: &str = "trend_score";
const KEY_HISTORY: &str = "price_history";
const KEY_VOLUME: &str = "volume_stats";
const KEY_SENTIMENT: &str = "fear_greed";

/// Raw inputs gathered for one evaluation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketSnapshot {
    pub price: Option<f64>,
    #[serde(skip)]
    pub history: Option<PriceSeries>,
    pub volume: Option<VolumeStats>,
    pub dominance: Option<f64>,
    pub sentiment: Option<SentimentReading>,
    pub trend: Option<f64>,
    /// Names of sources that failed during collection.
    pub unavailable: Vec<String>,
}

/// Gathers a [`MarketSnapshot`] from the configured sources.
pub struct SignalCollector {
    prices: Arc<dyn PriceSource>,
    sentiment: Arc<dyn SentimentSource>,
    trend: Arc<dyn TrendSource>,
    ttls: CacheTtls,
    scalars: FreshnessCache<f64>,
    history: FreshnessCache<PriceSeries>,
    volume: FreshnessCache<VolumeStats>,
    readings: FreshnessCache<SentimentReading>,
}

/// Log a failed source and turn it into an absent value.
fn available<T>(name: &str, result: Result<T, SourceError>, unavailable: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(source = name, error = %e, "signal source unavailable");
            unavailable.push(name.to_string());
            None
        }
    }
}

impl SignalCollector {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        sentiment: Arc<dyn SentimentSource>,
        trend: Arc<dyn TrendSource>,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            prices,
            sentiment,
            trend,
            ttls,
            scalars: FreshnessCache::new(),
            history: FreshnessCache::new(),
            volume: FreshnessCache::new(),
            readings: FreshnessCache::new(),
        }
    }

    /// Fetch every input, serving fresh cached values where possible.
    pub async fn collect(&self) -> MarketSnapshot {
        let (price, history, volume, dominance, sentiment, trend) = tokio::join!(
            self.scalars
                .get_or_fetch(KEY_PRICE, self.ttls.price(), || self.prices.spot_price()),
            self.history
                .get_or_fetch(KEY_HISTORY, self.ttls.history(), || self.prices.price_history()),
            self.volume
                .get_or_fetch(KEY_VOLUME, self.ttls.volume(), || self.prices.volume_stats()),
            self.scalars
                .get_or_fetch(KEY_DOMINANCE, self.ttls.dominance(), || self.prices.dominance()),
            self.readings
                .get_or_fetch(KEY_SENTIMENT, self.ttls.sentiment(), || self.sentiment.fear_greed()),
            self.scalars
                .get_or_fetch(KEY_TREND, self.ttls.trend(), || self.trend.trend_score()),
        );

        let mut unavailable = Vec::new();
        let snapshot = MarketSnapshot {
            price: available(KEY_PRICE, price, &mut unavailable),
            history: available(KEY_HISTORY, history, &mut unavailable),
            volume: available(KEY_VOLUME, volume, &mut unavailable),
            dominance: available(KEY_DOMINANCE, dominance, &mut unavailable),
            sentiment: available(KEY_SENTIMENT, sentiment, &mut unavailable),
            trend: available(KEY_TREND, trend, &mut unavailable),
            unavailable,
        };

        info!(
            price = ?snapshot.price,
            history_points = snapshot.history.as_ref().map_or(0, PriceSeries::len),
            unavailable = ?snapshot.unavailable,
            "market snapshot collected"
        );
        snapshot
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use std::sync::atomic::Ordering;

    fn collector(prices: Arc<FakePrices>, sentiment: Option<SentimentReading>, trend: Option<f64>) -> SignalCollector {
        SignalCollector::new(
            prices,
            Arc::new(FakeSentiment(sentiment)),
            Arc::new(FakeTrend(trend)),
            CacheTtls::default(),
        )
    }

    #[tokio::test]
    async fn failures_become_absent_fields() {
        let prices = Arc::new(FakePrices {
            price: Some(50_000.0),
            dominance: Some(48.0),
            ..FakePrices::default()
        });
        let snap = collector(prices, None, Some(33.0)).collect().await;

        assert_eq!(snap.price, Some(50_000.0));
        assert_eq!(snap.dominance, Some(48.0));
        assert_eq!(snap.trend, Some(33.0));
        assert!(snap.history.is_none());
        assert!(snap.volume.is_none());
        assert!(snap.sentiment.is_none());
        assert_eq!(snap.unavailable, vec![KEY_HISTORY, KEY_VOLUME, KEY_SENTIMENT]);
    }

    #[tokio::test]
    async fn everything_down_still_collects() {
        let snap = collector(Arc::new(FakePrices::default()), None, None).collect().await;
        assert!(snap.price.is_none());
        assert_eq!(snap.unavailable.len(), 6);
    }

    #[tokio::test]
    async fn cached_price_is_not_refetched() {
        let prices = Arc::new(FakePrices {
            price: Some(1.0),
            ..FakePrices::default()
        });
        let c = collector(prices.clone(), None, None);
        c.collect().await;
        c.collect().await;
        assert_eq!(prices.calls.load(Ordering::SeqCst), 1);
    }
}
