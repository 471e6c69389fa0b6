use crate::error::{PulmolensError, Result};

/// Raw fields of a prediction request, as received from the transport
///
/// Every field is optional here; [`SubmissionForm::validate`] turns the form
/// into a [`PatientSubmission`] or rejects it.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub patient_id: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub image_name: Option<String>,
    pub image: Option<Vec<u8>>,
}

/// A validated prediction request
#[derive(Debug, Clone, PartialEq)]
pub struct PatientSubmission {
    pub patient_id: String,
    pub age: i32,
    pub gender: String,
    pub image_name: String,
    pub image: Vec<u8>,
}

impl SubmissionForm {
    /// Validates the raw form
    ///
    /// # Errors
    ///
    /// Returns [`PulmolensError::Validation`] if:
    /// - the image part is missing or empty
    /// - `patient_id` or `gender` is missing or blank
    /// - `age` is missing or not an integer
    pub fn validate(self) -> Result<PatientSubmission> {
        let image = match self.image {
            Some(bytes) if !bytes.is_empty() => bytes,
            Some(_) => return Err(validation("image is empty")),
            None => return Err(validation("image is required")),
        };

        let patient_id = required_text(self.patient_id, "patient_id")?;
        let gender = required_text(self.gender, "gender")?;

        let age_raw = required_text(self.age, "age")?;
        let age = age_raw
            .trim()
            .parse::<i32>()
            .map_err(|_| validation(&format!("age must be an integer, got '{}'", age_raw)))?;

        Ok(PatientSubmission {
            patient_id,
            age,
            gender,
            image_name: self.image_name.unwrap_or_default(),
            image,
        })
    }
}

/// Rejects missing or blank values; the value itself is kept as sent
fn required_text(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| validation(&format!("{} is required", field)))
}

fn validation(message: &str) -> PulmolensError {
    PulmolensError::Validation(message.to_string())
}
