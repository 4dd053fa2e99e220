// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator implementations over a price column.
// Public functions return `Option<T>` (or an empty / `None`-padded vector) so
// callers must handle insufficient data instead of receiving a misleading
// partial average.

pub mod ema;
pub mod macd;
pub mod pi_cycle;
pub mod rsi;
pub mod sma;

pub use macd::{latest_macd, MacdParams};
pub use pi_cycle::{latest_pi_cycle, pi_cycle_series, PiCycleState};
pub use rsi::latest_rsi;
