use crate::decision::decide;
use crate::error::Result;
use crate::imaging::preprocess_with_size;
use crate::model::Classifier;
use crate::report::generate_report;
use crate::store::RecordStore;
use crate::types::{Diagnosis, DiagnosisRecord, PatientSubmission};
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;

/// What to do when a record cannot be written after a successful prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistencePolicy {
    /// Log the failure and still return the assessment
    #[default]
    BestEffort,

    /// Return the persistence failure to the caller
    Required,
}

/// Main entry point for screening chest radiographs
///
/// Runs Preprocessor → Classifier → Decision → Report, then persists the
/// outcome. The classifier and the store are injected, so tests can
/// substitute doubles for either.
///
/// # Example
///
/// ```no_run
/// use pulmolens_core::{
///     BurnClassifier, ClassifierConfig, PersistencePolicy, ScreeningService,
///     SqliteRecordStore,
/// };
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let classifier = BurnClassifier::load(
///     Path::new("ml_model/pneumonia_model.mpk"),
///     ClassifierConfig::default(),
/// )
/// .unwrap();
/// let store = SqliteRecordStore::open(Path::new("pulmolens.sqlite")).unwrap();
/// let service = ScreeningService::new(
///     Arc::new(classifier),
///     Arc::new(store),
///     PersistencePolicy::BestEffort,
/// );
///
/// let bytes = std::fs::read("chest.png").unwrap();
/// let assessment = service.assess(&bytes).unwrap();
/// println!("{} ({:.2}%)", assessment.diagnosis, assessment.confidence);
/// ```
pub struct ScreeningService {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn RecordStore>,
    policy: PersistencePolicy,
}

impl ScreeningService {
    /// Creates a service from its collaborators
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn RecordStore>,
        policy: PersistencePolicy,
    ) -> Self {
        Self {
            classifier,
            store,
            policy,
        }
    }

    /// Classifies an image without persisting anything
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The bytes are not a supported image (`Decode`)
    /// - The forward pass fails (`Inference`)
    pub fn assess(&self, image: &[u8]) -> Result<Assessment> {
        let tensor = preprocess_with_size(image, self.classifier.input_size())?;
        let probability = self.classifier.predict(&tensor)?;
        let decision = decide(f64::from(probability));

        info!(
            "Prediction: {} ({:.2}%), raw output {:.6}",
            decision.diagnosis, decision.confidence, probability
        );

        Ok(Assessment {
            probability,
            diagnosis: decision.diagnosis,
            confidence: decision.confidence,
            report: generate_report(decision.diagnosis),
        })
    }

    /// Classifies a submission and records the outcome
    ///
    /// The diagnosis is always computed before persistence is attempted.
    /// Under [`PersistencePolicy::BestEffort`] a failed write is logged and
    /// the assessment is still returned.
    pub fn submit(&self, submission: &PatientSubmission) -> Result<Assessment> {
        let assessment = self.assess(&submission.image)?;
        let record = assessment.to_record(submission);

        if let Err(e) = self.store.insert(&record) {
            match self.policy {
                PersistencePolicy::BestEffort => {
                    error!(
                        "Failed to store record for patient {}: {}",
                        submission.patient_id, e
                    );
                }
                PersistencePolicy::Required => return Err(e),
            }
        }

        Ok(assessment)
    }

    /// Returns every stored record
    pub fn records(&self) -> Result<Vec<DiagnosisRecord>> {
        self.store.list_all()
    }
}

/// Outcome of classifying one image
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    /// Raw sigmoid output
    pub probability: f32,

    pub diagnosis: Diagnosis,

    /// Certainty in `diagnosis`, in percent
    pub confidence: f64,

    /// Narrative template for `diagnosis`
    pub report: &'static str,
}

impl Assessment {
    /// Builds the record to persist for this assessment, stamped now
    pub fn to_record(&self, submission: &PatientSubmission) -> DiagnosisRecord {
        DiagnosisRecord {
            patient_id: submission.patient_id.clone(),
            age: submission.age,
            gender: submission.gender.clone(),
            image_name: submission.image_name.clone(),
            diagnosis: self.diagnosis,
            confidence: self.confidence,
            report_text: self.report.to_string(),
            created_at: Utc::now(),
        }
    }
}
