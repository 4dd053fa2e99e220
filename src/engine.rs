// =============================================================================
// Cycle-Top Engine — snapshot in, classified score out
// =============================================================================
//
// Pipeline per evaluation:
//   1. Derive Pi Cycle, RSI and MACD from the price history.
//   2. Assemble the typed `SignalSet`.
//   3. Normalize + sum + clamp (`CompositeScorer`).
//   4. Classify the Pi Cycle gap and the score.
//   5. Append a `ScoreRecord` to history (failure is logged, not fatal).
//
// Steps 1-4 are pure given the snapshot.  The only policy decision is whether
// a missing spot price aborts the run (`require_price`).
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::history::HistoryRecorder;
use crate::indicators::{self, pi_cycle, MacdParams, PiCycleState};
use crate::runtime_config::RuntimeConfig;
use crate::signals::{
    classify_pi_gap, CompositeScorer, PiCycleCategory, ScoringResult, SignalKind, SignalSet,
};
use crate::sources::{MarketSnapshot, SignalCollector};
use crate::types::{PriceSeries, ScoreRecord};

/// Scoring-relevant subset of the runtime configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub include_rsi: bool,
    pub rsi_period: usize,
    pub include_macd: bool,
    pub macd: MacdParams,
    pub require_price: bool,
    pub classify_raw_pi_gap: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&RuntimeConfig::default())
    }
}

impl From<&RuntimeConfig> for EngineSettings {
    fn from(cfg: &RuntimeConfig) -> Self {
        Self {
            include_rsi: cfg.include_rsi,
            rsi_period: cfg.rsi_period,
            include_macd: cfg.include_macd,
            macd: cfg.macd,
            require_price: cfg.require_price,
            classify_raw_pi_gap: cfg.classify_raw_pi_gap,
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub signals: SignalSet,
    pub pi_cycle_category: Option<PiCycleCategory>,
    pub scoring: ScoringResult,
    /// Signals switched off in configuration; they always contribute 0.
    pub disabled_signals: Vec<SignalKind>,
    /// Sources that failed and therefore contributed nothing.
    pub unavailable_sources: Vec<String>,
    pub history_recorded: bool,
}

impl CycleReport {
    pub fn pi_cycle(&self) -> Option<&PiCycleState> {
        self.signals.pi_cycle.as_ref()
    }
}

/// The scoring pipeline.
#[derive(Debug, Clone, Default)]
pub struct CycleTopEngine {
    settings: EngineSettings,
    scorer: CompositeScorer,
}

impl CycleTopEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            scorer: CompositeScorer::new(),
        }
    }

    fn disabled_signals(&self) -> Vec<SignalKind> {
        let mut disabled = Vec::new();
        if !self.settings.include_rsi {
            disabled.push(SignalKind::Rsi);
        }
        if !self.settings.include_macd {
            disabled.push(SignalKind::Macd);
        }
        disabled
    }

    /// Category of the Pi Cycle gap; the floored distance unless configured
    /// to use the raw gap.
    fn categorize(&self, pi: &PiCycleState) -> PiCycleCategory {
        if self.settings.classify_raw_pi_gap {
            classify_pi_gap(pi.raw_gap)
        } else {
            classify_pi_gap(pi.distance_value)
        }
    }

    /// Derive the indicator-based signals and merge them with the raw inputs.
    pub fn build_signals(&self, snapshot: &MarketSnapshot) -> SignalSet {
        let closes = snapshot.history.as_ref().map(PriceSeries::prices);

        let pi_cycle = snapshot.history.as_ref().and_then(|series| {
            let state = indicators::latest_pi_cycle(series);
            if state.is_none() {
                let err = EngineError::InsufficientHistory {
                    required: pi_cycle::LONG_WINDOW,
                    available: series.len(),
                };
                info!(reason = %err, "pi cycle unavailable");
            }
            state
        });

        let rsi = closes
            .as_deref()
            .filter(|_| self.settings.include_rsi)
            .and_then(|c| indicators::latest_rsi(c, self.settings.rsi_period));

        let macd_average = closes
            .as_deref()
            .filter(|_| self.settings.include_macd)
            .and_then(|c| indicators::latest_macd(c, self.settings.macd))
            .map(|m| m.signal);

        SignalSet {
            price: snapshot.price,
            fear_greed_index: snapshot.sentiment.as_ref().map(|s| s.value),
            fear_greed_label: snapshot.sentiment.as_ref().map(|s| s.label.clone()),
            trend_score: snapshot.trend,
            volume_ratio: snapshot.volume.and_then(|v| v.ratio()),
            dominance_percent: snapshot.dominance,
            rsi,
            macd_average,
            pi_cycle,
        }
    }

    /// Score a snapshot.  Pure apart from the supplied timestamp and run id.
    pub fn evaluate(&self, snapshot: &MarketSnapshot, at: DateTime<Utc>) -> Result<CycleReport, EngineError> {
        if self.settings.require_price && snapshot.price.is_none() {
            return Err(EngineError::ScoreUnavailable(
                "spot price unavailable".to_string(),
            ));
        }

        let signals = self.build_signals(snapshot);
        let scoring = self.scorer.score(&signals);
        let pi_cycle_category = signals.pi_cycle.as_ref().map(|p| self.categorize(p));

        for c in &scoring.signal_contributions {
            debug!(signal = c.signal.as_str(), raw = ?c.raw, contribution = c.contribution, "signal contribution");
        }
        debug!(
            present = signals.present_count(),
            raw_total = scoring.raw_total,
            "signals scored"
        );

        Ok(CycleReport {
            run_id: Uuid::new_v4(),
            generated_at: at,
            signals,
            pi_cycle_category,
            scoring,
            disabled_signals: self.disabled_signals(),
            unavailable_sources: snapshot.unavailable.clone(),
            history_recorded: false,
        })
    }

    /// Append the report's score to `history`.  Failures are logged and
    /// reflected in `history_recorded`; they never fail the run.
    pub fn record(&self, report: &mut CycleReport, history: &dyn HistoryRecorder) {
        let record = ScoreRecord::new(report.generated_at, report.scoring.score);
        match history.append(&record) {
            Ok(()) => report.history_recorded = true,
            Err(e) => {
                warn!(error = %e, score = record.score, "score history append failed");
                report.history_recorded = false;
            }
        }
    }

    /// Collect, evaluate and record once.  Returns the snapshot alongside the
    /// report so callers can keep the price history for charting.
    pub async fn run_once(
        &self,
        collector: &SignalCollector,
        history: &dyn HistoryRecorder,
    ) -> Result<(CycleReport, MarketSnapshot), EngineError> {
        let snapshot = collector.collect().await;
        let mut report = self.evaluate(&snapshot, Utc::now())?;
        self.record(&mut report, history);

        info!(
            run_id = %report.run_id,
            score = report.scoring.score,
            risk = %report.scoring.risk_level,
            pi_active = ?report.pi_cycle().map(|p| p.signal_active),
            pi_distance = ?report.pi_cycle().map(|p| p.distance_value),
            pi_category = ?report.pi_cycle_category.map(|c| c.label()),
            recorded = report.history_recorded,
            "cycle-top evaluation complete"
        );
        Ok((report, snapshot))
    }
}
