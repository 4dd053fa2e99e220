// =============================================================================
// Central Application State — Cycle-Top Service
// =============================================================================
//
// Ties the engine, its collector and the history store together for the
// scheduler loop and the REST API.
//
// Thread safety:
//   - Atomic counters for lock-free run statistics.
//   - parking_lot::RwLock for the latest report and price series.
//   - A tokio Mutex as the run lock: evaluations never overlap, whether
//     triggered by the schedule or by `POST /api/v1/refresh`.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;

use crate::engine::{CycleReport, CycleTopEngine, EngineSettings};
use crate::error::EngineError;
use crate::history::HistoryRecorder;
use crate::indicators::{pi_cycle_series, PiCycleState};
use crate::runtime_config::RuntimeConfig;
use crate::sources::SignalCollector;
use crate::types::PriceSeries;

/// Shared state for all async tasks via `Arc<AppState>`.
pub struct AppState {
    pub config: RuntimeConfig,
    pub engine: CycleTopEngine,
    pub collector: SignalCollector,
    pub history: Arc<dyn HistoryRecorder>,

    // ── Latest results ──────────────────────────────────────────────────
    latest_report: RwLock<Option<CycleReport>>,
    latest_series: RwLock<Option<PriceSeries>>,

    // ── Run statistics ──────────────────────────────────────────────────
    run_lock: tokio::sync::Mutex<()>,
    evaluations: AtomicU64,
    failed_evaluations: AtomicU64,

    /// Instant the service started; used for uptime.
    pub start_time: std::time::Instant,
}

/// Counters exposed through the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RunStats {
    pub evaluations: u64,
    pub failed_evaluations: u64,
    pub uptime_secs: u64,
}

impl AppState {
    pub fn new(config: RuntimeConfig, collector: SignalCollector, history: Arc<dyn HistoryRecorder>) -> Self {
        let engine = CycleTopEngine::new(EngineSettings::from(&config));
        Self {
            config,
            engine,
            collector,
            history,
            latest_report: RwLock::new(None),
            latest_series: RwLock::new(None),
            run_lock: tokio::sync::Mutex::new(()),
            evaluations: AtomicU64::new(0),
            failed_evaluations: AtomicU64::new(0),
            start_time: std::time::Instant::now(),
        }
    }

    /// Run one evaluation under the run lock and publish its result.
    pub async fn run_evaluation(&self) -> Result<CycleReport, EngineError> {
        let _guard = self.run_lock.lock().await;
        self.evaluations.fetch_add(1, Ordering::SeqCst);

        match self.engine.run_once(&self.collector, self.history.as_ref()).await {
            Ok((report, snapshot)) => {
                if let Some(series) = snapshot.history {
                    *self.latest_series.write() = Some(series);
                }
                *self.latest_report.write() = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                self.failed_evaluations.fetch_add(1, Ordering::SeqCst);
                warn!(error = %e, "evaluation aborted");
                Err(e)
            }
        }
    }

    pub fn latest_report(&self) -> Option<CycleReport> {
        self.latest_report.read().clone()
    }

    /// Pi Cycle chart for the last `limit` points of the most recent history.
    pub fn pi_cycle_chart(&self, limit: usize) -> Vec<PiCycleState> {
        let series = self.latest_series.read();
        let Some(series) = series.as_ref() else {
            return Vec::new();
        };
        let mut states = pi_cycle_series(series);
        let skip = states.len().saturating_sub(limit);
        states.drain(..skip);
        states
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            evaluations: self.evaluations.load(Ordering::SeqCst),
            failed_evaluations: self.failed_evaluations.load(Ordering::SeqCst),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::history::MemoryHistory;
    use crate::runtime_config::CacheTtls;
    use crate::sources::collector::fakes::{FakePrices, FakeSentiment, FakeTrend};
    use crate::types::PricePoint;
    use chrono::{Duration, TimeZone, Utc};

    /// `n` daily prices compounding at `rate`.
    pub fn geometric(n: usize, rate: f64) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let points = (0..n)
            .map(|i| PricePoint::new(start + Duration::days(i as i64), 100.0 * (1.0 + rate).powi(i as i32)))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    /// State backed by fake sources and in-memory history.
    pub fn state_with(prices: FakePrices) -> Arc<AppState> {
        let collector = SignalCollector::new(
            Arc::new(prices),
            Arc::new(FakeSentiment(None)),
            Arc::new(FakeTrend(None)),
            CacheTtls::default(),
        );
        Arc::new(AppState::new(
            RuntimeConfig::default(),
            collector,
            Arc::new(MemoryHistory::new()),
        ))
    }
}
