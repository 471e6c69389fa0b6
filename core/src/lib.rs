//! Chest X-ray pneumonia screening
//!
//! An uploaded radiograph flows through [`preprocess`], a [`Classifier`],
//! [`decide`] and [`generate_report`]; [`ScreeningService`] runs that
//! sequence and records the outcome in a [`RecordStore`].

pub mod api;
pub mod cli;
pub mod decision;
pub mod error;
pub mod history;
pub mod imaging;
pub mod model;
pub mod report;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{Assessment, PersistencePolicy, ScreeningService};
pub use decision::{decide, round_confidence, Decision, PNEUMONIA_THRESHOLD};
pub use error::{PulmolensError, Result};
pub use history::HistorySummary;
pub use imaging::{preprocess, preprocess_with_size, ImageTensor, IMAGE_SIZE};
pub use model::{BurnClassifier, Classifier, ClassifierConfig};
pub use report::generate_report;
pub use store::{MemoryRecordStore, RecordStore, SqliteRecordStore};
pub use types::*;
