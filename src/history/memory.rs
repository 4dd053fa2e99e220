// =============================================================================
// In-memory score history
// =============================================================================

use parking_lot::RwLock;

use crate::error::EngineError;
use crate::history::HistoryRecorder;
use crate::types::ScoreRecord;

/// Process-local history, used when persistence is disabled and in tests.
#[derive(Default)]
pub struct MemoryHistory {
    records: RwLock<Vec<ScoreRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryRecorder for MemoryHistory {
    fn append(&self, record: &ScoreRecord) -> Result<(), EngineError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<ScoreRecord>, EngineError> {
        Ok(self.records.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn append_then_read_back() {
        let history = MemoryHistory::new();
        assert!(history.records().unwrap().is_empty());
        let r = ScoreRecord::new(Utc::now(), 42);
        history.append(&r).unwrap();
        history.append(&r).unwrap();
        assert_eq!(history.records().unwrap(), vec![r.clone(), r]);
    }
}
