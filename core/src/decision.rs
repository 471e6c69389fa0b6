//! Threshold policy turning a probability into a label and a confidence

use crate::types::Diagnosis;

/// Probabilities strictly above this value are classified as pneumonia
pub const PNEUMONIA_THRESHOLD: f64 = 0.5;

/// Label and certainty derived from one probability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub diagnosis: Diagnosis,

    /// Certainty in `diagnosis`, in percent
    pub confidence: f64,
}

/// Applies the decision threshold
///
/// `confidence` always expresses certainty in the chosen label:
/// `p * 100` for pneumonia and `(1 - p) * 100` for normal. A probability of
/// exactly 0.5 resolves to `NORMAL` with confidence 50.
///
/// # Example
///
/// ```
/// use pulmolens_core::{decide, Diagnosis};
///
/// let decision = decide(0.9);
/// assert_eq!(decision.diagnosis, Diagnosis::Pneumonia);
/// assert!((decision.confidence - 90.0).abs() < 1e-9);
/// ```
pub fn decide(probability: f64) -> Decision {
    if probability > PNEUMONIA_THRESHOLD {
        Decision {
            diagnosis: Diagnosis::Pneumonia,
            confidence: probability * 100.0,
        }
    } else {
        Decision {
            diagnosis: Diagnosis::Normal,
            confidence: (1.0 - probability) * 100.0,
        }
    }
}

/// Rounds a confidence to two decimals for presentation
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}
