//! Test doubles shared by the unit tests

use crate::error::{PulmolensError, Result};
use crate::imaging::{ImageTensor, IMAGE_SIZE};
use crate::model::Classifier;
use crate::store::RecordStore;
use crate::types::DiagnosisRecord;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Mutex;

/// Classifier that always returns the same probability
pub struct FixedClassifier {
    probability: f32,
    input_size: u32,
    last_shape: Mutex<Option<Vec<usize>>>,
}

impl FixedClassifier {
    pub fn new(probability: f32) -> Self {
        Self {
            probability,
            input_size: IMAGE_SIZE,
            last_shape: Mutex::new(None),
        }
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    /// Shape of the most recent tensor passed to `predict`
    pub fn last_shape(&self) -> Option<Vec<usize>> {
        self.last_shape.lock().unwrap().clone()
    }
}

impl Classifier for FixedClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn predict(&self, input: &ImageTensor) -> Result<f32> {
        *self.last_shape.lock().unwrap() = Some(input.shape().to_vec());
        Ok(self.probability)
    }
}

/// Store whose every operation fails
pub struct FailingStore;

impl RecordStore for FailingStore {
    fn insert(&self, _record: &DiagnosisRecord) -> Result<()> {
        Err(PulmolensError::Persistence("disk full".to_string()))
    }

    fn list_all(&self) -> Result<Vec<DiagnosisRecord>> {
        Err(PulmolensError::Persistence("disk full".to_string()))
    }
}

/// PNG bytes of an all-black square image
pub fn black_png(size: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(size, size))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
