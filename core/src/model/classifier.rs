use super::{ClassifierConfig, PneumoniaCnn};
use crate::error::{PulmolensError, Result};
use crate::imaging::{ImageTensor, CHANNELS};
use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;
use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::Tensor;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// CPU backend used for serving
pub type InferenceBackend = NdArray;

/// Maps a preprocessed image batch to a pneumonia probability
///
/// Implementations must be safe to share across concurrent requests.
pub trait Classifier: Send + Sync {
    /// Side length of the square input this classifier expects
    fn input_size(&self) -> u32;

    /// Returns the probability in `[0.0, 1.0]` that the image shows pneumonia
    ///
    /// # Errors
    ///
    /// Returns [`PulmolensError::Inference`] if the tensor shape does not
    /// match [`Classifier::input_size`] or the forward pass fails.
    fn predict(&self, input: &ImageTensor) -> Result<f32>;
}

/// Frozen Burn network loaded from a weights artifact
///
/// The module is kept behind a mutex, so concurrent predictions are
/// serialized.
pub struct BurnClassifier {
    model: Mutex<PneumoniaCnn<InferenceBackend>>,
    config: ClassifierConfig,
    device: NdArrayDevice,
}

impl BurnClassifier {
    /// Loads the network from a named MessagePack weights file
    ///
    /// # Errors
    ///
    /// Returns [`PulmolensError::ModelLoad`] if the file is missing or
    /// unreadable, or if the stored parameters do not match the topology.
    pub fn load(path: &Path, config: ClassifierConfig) -> Result<Self> {
        let device = NdArrayDevice::default();
        let initial = config.init::<InferenceBackend>(&device)?;
        if !artifact_path(path).is_file() {
            return Err(PulmolensError::ModelLoad(format!(
                "weights file not found: {}",
                artifact_path(path).display()
            )));
        }

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let model = initial
            .load_file(path.to_path_buf(), &recorder, &device)
            .map_err(|e| {
                PulmolensError::ModelLoad(format!("failed to read {}: {}", path.display(), e))
            })?;

        model
            .verify_topology(&config)
            .map_err(PulmolensError::ModelLoad)?;

        info!(
            "Loaded model {} ({} parameters, {}x{} input)",
            artifact_path(path).display(),
            model.num_params(),
            config.image_size,
            config.image_size
        );

        Ok(Self::from_module(model, config))
    }

    /// Wraps an already-built network
    pub fn from_module(model: PneumoniaCnn<InferenceBackend>, config: ClassifierConfig) -> Self {
        Self {
            model: Mutex::new(model),
            config,
            device: NdArrayDevice::default(),
        }
    }

    /// Writes freshly initialised weights for `config` to `path`
    ///
    /// Returns the path of the written artifact (with the `.mpk` extension).
    pub fn write_initial_weights(path: &Path, config: ClassifierConfig) -> Result<PathBuf> {
        let device = NdArrayDevice::default();
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        config
            .init::<InferenceBackend>(&device)?
            .save_file(path.to_path_buf(), &recorder)
            .map_err(|e| {
                PulmolensError::ModelLoad(format!("failed to write {}: {}", path.display(), e))
            })?;
        Ok(artifact_path(path))
    }
}

impl Classifier for BurnClassifier {
    fn input_size(&self) -> u32 {
        self.config.image_size as u32
    }

    fn predict(&self, input: &ImageTensor) -> Result<f32> {
        let side = self.config.image_size;
        let expected = [1, side, side, CHANNELS];
        if input.shape() != expected {
            return Err(PulmolensError::Inference(format!(
                "input shape {:?} does not match {:?}",
                input.shape(),
                expected
            )));
        }

        let values: Vec<f32> = input.iter().copied().collect();
        let tensor = Tensor::<InferenceBackend, 1>::from_floats(values.as_slice(), &self.device)
            .reshape(expected);

        let model = self
            .model
            .lock()
            .map_err(|_| PulmolensError::Inference("model lock poisoned".to_string()))?;
        let output = model.forward(tensor);
        drop(model);

        let probabilities: Vec<f32> = output
            .into_data()
            .to_vec()
            .map_err(|e| PulmolensError::Inference(format!("{:?}", e)))?;
        let probability = probabilities
            .first()
            .copied()
            .ok_or_else(|| PulmolensError::Inference("empty model output".to_string()))?;

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(PulmolensError::Inference(format!(
                "model produced invalid probability {}",
                probability
            )));
        }
        Ok(probability)
    }
}

/// The recorder always writes and reads `<path>.mpk`
fn artifact_path(path: &Path) -> PathBuf {
    path.with_extension("mpk")
}
