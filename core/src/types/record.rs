use super::Diagnosis;
use chrono::{DateTime, Utc};

/// One persisted outcome of a single prediction request
///
/// Records are immutable once created. `diagnosis` and `confidence` are
/// derived together from one probability (see [`crate::decision::decide`]).
/// The store's internal identifier is never part of this type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DiagnosisRecord {
    /// Externally supplied patient identifier, not checked for uniqueness
    pub patient_id: String,

    /// Patient age in years; no range is enforced
    pub age: i32,

    /// Free-form gender category
    pub gender: String,

    /// Original upload filename, informational only
    pub image_name: String,

    pub diagnosis: Diagnosis,

    /// Certainty in the chosen label, in percent and unrounded
    pub confidence: f64,

    /// Narrative template for `diagnosis`
    pub report_text: String,

    /// Insertion time (UTC)
    pub created_at: DateTime<Utc>,
}

impl DiagnosisRecord {
    /// Returns the calendar date (UTC) the record was created on
    pub fn created_on(&self) -> chrono::NaiveDate {
        self.created_at.date_naive()
    }
}
