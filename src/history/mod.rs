// =============================================================================
// Score History — append-only log of computed scores
// =============================================================================
//
// The engine only ever appends.  Stores serialise appends internally so two
// evaluations can never interleave a write.

pub mod csv_file;
pub mod memory;

pub use csv_file::CsvHistory;
pub use memory::MemoryHistory;

use crate::error::EngineError;
use crate::types::ScoreRecord;

/// Append-only persistence for [`ScoreRecord`]s.
pub trait HistoryRecorder: Send + Sync {
    /// Persist one record.  There is no update or delete.
    fn append(&self, record: &ScoreRecord) -> Result<(), EngineError>;

    /// All records, oldest first.
    fn records(&self) -> Result<Vec<ScoreRecord>, EngineError>;
}
