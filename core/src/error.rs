use thiserror::Error;

/// Result type for pulmolens operations
pub type Result<T> = std::result::Result<T, PulmolensError>;

/// Error types for pulmolens operations
#[derive(Error, Debug)]
pub enum PulmolensError {
    /// Uploaded bytes are not an image in a supported container format
    #[error("Decode error: {0}")]
    Decode(String),

    /// Weights artifact missing, unreadable or not matching the network topology
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Forward pass failed or produced an unusable probability
    #[error("Inference error: {0}")]
    Inference(String),

    /// Record store unreachable or write rejected
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Missing or malformed submission field
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PulmolensError {
    /// Returns true when the failure was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(self, PulmolensError::Decode(_) | PulmolensError::Validation(_))
    }
}

impl From<image::ImageError> for PulmolensError {
    fn from(e: image::ImageError) -> Self {
        PulmolensError::Decode(format!("{}", e))
    }
}

impl From<rusqlite::Error> for PulmolensError {
    fn from(e: rusqlite::Error) -> Self {
        PulmolensError::Persistence(format!("{}", e))
    }
}
