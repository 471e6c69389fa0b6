//! Core type definitions for chest X-ray screening
//!
//! This module provides the fundamental types used throughout the pulmolens library:
//! - [`Diagnosis`]: The two diagnosis labels (NORMAL, PNEUMONIA)
//! - [`DiagnosisRecord`]: One persisted screening outcome
//! - [`SubmissionForm`] / [`PatientSubmission`]: Raw and validated prediction requests
//! - [`RecordFilter`]: Selection of records for history views

mod diagnosis;
mod filter;
mod record;
mod submission;

pub use diagnosis::Diagnosis;
pub use filter::RecordFilter;
pub use record::DiagnosisRecord;
pub use submission::{PatientSubmission, SubmissionForm};
