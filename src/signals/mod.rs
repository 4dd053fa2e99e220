// =============================================================================
// Signals Module
// =============================================================================
//
// Scoring pipeline over one snapshot of market signals:
// - Typed snapshot with an optional value per signal
// - Normalization into capped contributions
// - Composite sum / clamp / truncate
// - Classification of the Pi Cycle gap and the final score

pub mod classifier;
pub mod normalizer;
pub mod scorer;
pub mod snapshot;

pub use classifier::{classify_pi_gap, PiCycleCategory};
pub use normalizer::SignalKind;
pub use scorer::{CompositeScorer, ScoringResult};
pub use snapshot::SignalSet;
