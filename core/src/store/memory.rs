use super::RecordStore;
use crate::error::{PulmolensError, Result};
use crate::types::DiagnosisRecord;
use std::sync::Mutex;

/// Volatile store backed by a vector
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<DiagnosisRecord>>,
}

impl MemoryRecordStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, record: &DiagnosisRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| PulmolensError::Persistence("record store lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<DiagnosisRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| PulmolensError::Persistence("record store lock poisoned".to_string()))?;
        Ok(records.clone())
    }
}
