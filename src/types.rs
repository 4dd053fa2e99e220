// =============================================================================
// Shared types used across the cycle-top engine
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A single observation of the asset price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// An ordered, validated price history.
///
/// Timestamps are strictly increasing and every price is finite and positive.
/// The series is immutable once built; indicators return derived columns as
/// new vectors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points that are already in timestamp order.
    ///
    /// Rejects duplicate or out-of-order timestamps and non-positive prices.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, EngineError> {
        for (i, p) in points.iter().enumerate() {
            if !p.price.is_finite() || p.price <= 0.0 {
                return Err(EngineError::InvalidSeries(format!(
                    "price at index {i} is not a positive number: {}",
                    p.price
                )));
            }
        }
        if let Some(i) = points
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(EngineError::InvalidSeries(format!(
                "timestamps not strictly increasing at index {}",
                i + 1
            )));
        }
        Ok(Self { points })
    }

    /// Sort by timestamp and keep the last observation for each duplicate
    /// timestamp before validating. Upstream feeds often repeat the final
    /// (intraday) point.
    pub fn from_unordered(mut points: Vec<PricePoint>) -> Result<Self, EngineError> {
        points.sort_by_key(|p| p.timestamp);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for p in points {
            match deduped.last_mut() {
                Some(last) if last.timestamp == p.timestamp => *last = p,
                _ => deduped.push(p),
            }
        }
        Self::new(deduped)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Price column, oldest first.
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Fear & Greed reading as published by the sentiment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    /// Index value in [0, 100].
    pub value: f64,
    /// Qualitative label, e.g. "Greed".
    pub label: String,
}

/// Latest 24h volume against its trailing 7-day average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub latest_volume: f64,
    pub average_volume: f64,
}

impl VolumeStats {
    /// `latest / average`, or `None` when the average is not positive.
    pub fn ratio(&self) -> Option<f64> {
        if self.average_volume > 0.0 && self.latest_volume.is_finite() {
            let ratio = self.latest_volume / self.average_volume;
            ratio.is_finite().then_some(ratio)
        } else {
            None
        }
    }
}

/// One entry in the append-only score history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub timestamp: DateTime<Utc>,
    pub score: u8,
}

impl ScoreRecord {
    pub fn new(timestamp: DateTime<Utc>, score: u8) -> Self {
        Self { timestamp, score }
    }
}

/// Whether the process evaluates once and exits or keeps running with the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    Once,
    Service,
}

impl Default for RunMode {
    fn default() -> Self {
        Self::Once
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Once => write!(f, "Once"),
            Self::Service => write!(f, "Service"),
        }
    }
}

impl std::str::FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "service" => Ok(Self::Service),
            other => Err(format!("unknown run mode: {other}")),
        }
    }
}
