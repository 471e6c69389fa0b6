use crate::types::{Diagnosis, DiagnosisRecord};

/// Filter applied to the record history before display or analytics
///
/// All filters use exact matching; an unset filter matches everything.
///
/// # Example
///
/// ```
/// use pulmolens_core::{Diagnosis, RecordFilter};
///
/// let filter = RecordFilter::default()
///     .with_patient_id("P-001")
///     .with_diagnosis(Diagnosis::Pneumonia);
///
/// assert_eq!(filter.patient_id.as_deref(), Some("P-001"));
/// assert_eq!(filter.diagnosis, Some(Diagnosis::Pneumonia));
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecordFilter {
    /// Only records for this exact patient identifier
    pub patient_id: Option<String>,

    /// Only records with this diagnosis
    pub diagnosis: Option<Diagnosis>,
}

impl RecordFilter {
    /// Builder: restrict to one patient
    pub fn with_patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Builder: restrict to one diagnosis
    pub fn with_diagnosis(mut self, diagnosis: Diagnosis) -> Self {
        self.diagnosis = Some(diagnosis);
        self
    }

    /// Checks whether a single record passes the filter
    pub fn matches(&self, record: &DiagnosisRecord) -> bool {
        if let Some(pid) = &self.patient_id {
            if &record.patient_id != pid {
                return false;
            }
        }
        if let Some(diagnosis) = self.diagnosis {
            if record.diagnosis != diagnosis {
                return false;
            }
        }
        true
    }

    /// Returns the matching records, newest first
    pub fn apply(&self, records: &[DiagnosisRecord]) -> Vec<DiagnosisRecord> {
        let mut selected: Vec<DiagnosisRecord> = records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
    }
}
