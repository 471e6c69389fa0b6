//! Record persistence
//!
//! A [`RecordStore`] keeps one [`DiagnosisRecord`] per prediction. Records are
//! append-only: there is no update or delete. Listing returns every record
//! with no filtering, pagination or ordering guarantee.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use crate::error::Result;
use crate::types::DiagnosisRecord;

/// Append-only store of diagnosis records
///
/// Every call is an independent blocking round trip; implementations do no
/// batching, caching or retrying.
pub trait RecordStore: Send + Sync {
    /// Persists one record
    ///
    /// # Errors
    ///
    /// Returns [`crate::PulmolensError::Persistence`] if the store is
    /// unreachable or rejects the write.
    fn insert(&self, record: &DiagnosisRecord) -> Result<()>;

    /// Returns all records
    fn list_all(&self) -> Result<Vec<DiagnosisRecord>>;
}
