use super::error::ApiError;
use super::AppState;
use crate::types::{DiagnosisRecord, SubmissionForm};
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use log::debug;
use serde::Serialize;
use serde_json::value::RawValue;

/// Body of a successful `/predict` call
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub diagnosis: String,
    /// Percent, written with exactly two decimals
    pub confidence: Box<RawValue>,
    pub report: String,
}

pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let form = read_form(multipart?).await?;
    let submission = form.validate()?;

    let service = state.service.clone();
    let assessment = tokio::task::spawn_blocking(move || service.submit(&submission)).await??;

    let confidence = RawValue::from_string(format!("{:.2}", assessment.confidence))
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(PredictResponse {
        diagnosis: assessment.diagnosis.to_string(),
        confidence,
        report: assessment.report.to_string(),
    }))
}

pub async fn get_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<DiagnosisRecord>>, ApiError> {
    let service = state.service.clone();
    let records = tokio::task::spawn_blocking(move || service.records()).await??;
    Ok(Json(records))
}

async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                form.image_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(ApiError::multipart)?;
                debug!(
                    "Received image '{}' ({} bytes)",
                    form.image_name.as_deref().unwrap_or(""),
                    bytes.len()
                );
                form.image = Some(bytes.to_vec());
            }
            "patient_id" => form.patient_id = Some(text(field).await?),
            "age" => form.age = Some(text(field).await?),
            "gender" => form.gender = Some(text(field).await?),
            other => debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(form)
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(ApiError::multipart)
}
