use crate::error::PulmolensError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, error};
use serde_json::json;

/// Failure of a request, rendered as `{"error": "<message>"}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn multipart(e: MultipartError) -> Self {
        Self::new(e.status(), e.body_text())
    }
}

#[must_use]
pub(crate) fn error_status(err: &PulmolensError) -> StatusCode {
    match err {
        PulmolensError::Validation(_) => StatusCode::BAD_REQUEST,
        PulmolensError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PulmolensError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        PulmolensError::ModelLoad(_) | PulmolensError::Inference(_) | PulmolensError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<PulmolensError> for ApiError {
    fn from(err: PulmolensError) -> Self {
        let status = error_status(&err);
        if err.is_client_error() {
            debug!("Rejected request: {}", err);
        } else {
            error!("Request failed: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("Blocking task failed: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
