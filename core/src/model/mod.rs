//! Pneumonia classifier network
//!
//! This module uses the Burn deep learning framework to define the frozen
//! convolutional network and to load its weights artifact.
//!
//! Topology: Conv(32, 3×3, ReLU) → MaxPool(2×2) → Conv(64, 3×3, ReLU) →
//! MaxPool(2×2) → Flatten → Dense(128, ReLU) → Dense(1, sigmoid).

mod classifier;

pub use classifier::{BurnClassifier, Classifier, InferenceBackend};

use crate::error::PulmolensError;
use crate::imaging::{CHANNELS, IMAGE_SIZE};
use burn::module::Param;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::tensor::activation::sigmoid;

const CONV1_FILTERS: usize = 32;
const CONV2_FILTERS: usize = 64;
const KERNEL: usize = 3;
const POOL: usize = 2;
const DENSE_UNITS: usize = 128;

/// Configuration for the pneumonia network.
///
/// The layer stack is fixed; only the square input resolution varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Side length of the square input image.
    pub image_size: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            image_size: IMAGE_SIZE as usize,
        }
    }
}

impl ClassifierConfig {
    /// Creates a configuration for a `image_size`×`image_size` input.
    pub const fn new(image_size: usize) -> Self {
        Self { image_size }
    }

    /// Spatial side length after both conv/pool stages.
    ///
    /// Returns `None` when the input is too small for the stack.
    pub fn feature_map_size(&self) -> Option<usize> {
        let after_conv1 = self.image_size.checked_sub(KERNEL - 1)?;
        let after_pool1 = after_conv1 / POOL;
        let after_conv2 = after_pool1.checked_sub(KERNEL - 1)?;
        let after_pool2 = after_conv2 / POOL;
        (after_pool2 > 0).then_some(after_pool2)
    }

    /// Width of the flattened feature vector feeding the dense layer.
    pub fn flattened_features(&self) -> Option<usize> {
        self.feature_map_size()
            .map(|side| side * side * CONV2_FILTERS)
    }

    /// Builds a randomly initialised network.
    ///
    /// # Errors
    ///
    /// Returns [`PulmolensError::ModelLoad`] if the input is too small for
    /// the layer stack (see [`ClassifierConfig::feature_map_size`]).
    pub fn init<B: Backend>(&self, device: &B::Device) -> crate::error::Result<PneumoniaCnn<B>> {
        let flattened = self.flattened_features().ok_or_else(|| {
            PulmolensError::ModelLoad(format!(
                "image size {} is too small for the network",
                self.image_size
            ))
        })?;

        Ok(PneumoniaCnn {
            conv1: Conv2dConfig::new([CHANNELS, CONV1_FILTERS], [KERNEL, KERNEL]).init(device),
            pool1: MaxPool2dConfig::new([POOL, POOL])
                .with_strides([POOL, POOL])
                .init(),
            conv2: Conv2dConfig::new([CONV1_FILTERS, CONV2_FILTERS], [KERNEL, KERNEL])
                .init(device),
            pool2: MaxPool2dConfig::new([POOL, POOL])
                .with_strides([POOL, POOL])
                .init(),
            dense: LinearConfig::new(flattened, DENSE_UNITS).init(device),
            output: LinearConfig::new(DENSE_UNITS, 1).init(device),
            activation: Relu::new(),
        })
    }
}

/// The pneumonia screening network.
#[derive(Module, Debug)]
pub struct PneumoniaCnn<B: Backend> {
    conv1: Conv2d<B>,
    pool1: MaxPool2d,
    conv2: Conv2d<B>,
    pool2: MaxPool2d,
    dense: Linear<B>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> PneumoniaCnn<B> {
    /// Forward pass through the network.
    ///
    /// # Arguments
    ///
    /// * `images` - Tensor of shape [`batch_size`, height, width, 3] (channels last)
    ///
    /// # Returns
    ///
    /// Tensor of shape [`batch_size`, 1] holding pneumonia probabilities.
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = images.permute([0, 3, 1, 2]);

        let x = self.activation.forward(self.conv1.forward(x));
        let x = self.pool1.forward(x);
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.pool2.forward(x);

        // flatten in height, width, channel order
        let x = x.permute([0, 2, 3, 1]).flatten::<2>(1, 3);

        let x = self.activation.forward(self.dense.forward(x));
        sigmoid(self.output.forward(x))
    }

    /// Checks every parameter shape against the topology for `config`.
    ///
    /// Returns a description of the first mismatch.
    pub fn verify_topology(&self, config: &ClassifierConfig) -> Result<(), String> {
        let flattened = config
            .flattened_features()
            .ok_or_else(|| format!("image size {} is too small", config.image_size))?;

        let expected: [(&str, Vec<usize>, Vec<usize>); 4] = [
            (
                "conv1",
                self.conv1.weight.val().dims().to_vec(),
                vec![CONV1_FILTERS, CHANNELS, KERNEL, KERNEL],
            ),
            (
                "conv2",
                self.conv2.weight.val().dims().to_vec(),
                vec![CONV2_FILTERS, CONV1_FILTERS, KERNEL, KERNEL],
            ),
            (
                "dense",
                self.dense.weight.val().dims().to_vec(),
                vec![flattened, DENSE_UNITS],
            ),
            (
                "output",
                self.output.weight.val().dims().to_vec(),
                vec![DENSE_UNITS, 1],
            ),
        ];

        for (layer, actual, wanted) in expected {
            if actual != wanted {
                return Err(format!(
                    "layer {} has shape {:?}, expected {:?}",
                    layer, actual, wanted
                ));
            }
        }

        let biases: [(&str, Option<Vec<usize>>, usize); 4] = [
            ("conv1", bias_dims(&self.conv1.bias), CONV1_FILTERS),
            ("conv2", bias_dims(&self.conv2.bias), CONV2_FILTERS),
            ("dense", bias_dims(&self.dense.bias), DENSE_UNITS),
            ("output", bias_dims(&self.output.bias), 1),
        ];

        for (layer, actual, wanted) in biases {
            match actual {
                None => return Err(format!("layer {} has no bias", layer)),
                Some(dims) if dims != [wanted] => {
                    return Err(format!(
                        "layer {} has bias shape {:?}, expected [{}]",
                        layer, dims, wanted
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

fn bias_dims<B: Backend>(bias: &Option<Param<Tensor<B, 1>>>) -> Option<Vec<usize>> {
    bias.as_ref().map(|b| b.val().dims().to_vec())
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    use super::*;

    type TestBackend = NdArray;

    #[test]
    fn test_feature_map_size() {
        assert_eq!(ClassifierConfig::default().feature_map_size(), Some(54));
        assert_eq!(ClassifierConfig::default().flattened_features(), Some(186_624));
        assert_eq!(ClassifierConfig::new(16).flattened_features(), Some(256));
        assert_eq!(ClassifierConfig::new(6).feature_map_size(), None);
        assert_eq!(ClassifierConfig::new(1).feature_map_size(), None);
    }

    #[test]
    fn test_forward_shape_and_range() {
        let device = Default::default();
        let config = ClassifierConfig::new(16);
        let model: PneumoniaCnn<TestBackend> = config.init(&device).unwrap();

        let input = Tensor::<TestBackend, 4>::ones([2, 16, 16, 3], &device);
        let output = model.forward(input);
        assert_eq!(output.dims(), [2, 1]);

        let values: Vec<f32> = output.into_data().to_vec().unwrap();
        assert!(values.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_verify_topology() {
        let device = Default::default();
        let model: PneumoniaCnn<TestBackend> = ClassifierConfig::new(16).init(&device).unwrap();

        assert!(model.verify_topology(&ClassifierConfig::new(16)).is_ok());
        let err = model
            .verify_topology(&ClassifierConfig::new(32))
            .unwrap_err();
        assert!(err.contains("dense"));
    }

    #[test]
    fn test_init_too_small() {
        let device = Default::default();
        let result: crate::error::Result<PneumoniaCnn<TestBackend>> =
            ClassifierConfig::new(5).init(&device);
        assert!(matches!(result, Err(PulmolensError::ModelLoad(_))));
    }

    #[test]
    fn test_verify_topology_requires_biases() {
        let device = Default::default();
        let config = ClassifierConfig::new(16);

        let model: PneumoniaCnn<TestBackend> = config.init(&device).unwrap();
        let no_dense_bias = PneumoniaCnn {
            dense: LinearConfig::new(256, DENSE_UNITS)
                .with_bias(false)
                .init(&device),
            ..model
        };
        let err = no_dense_bias.verify_topology(&config).unwrap_err();
        assert_eq!(err, "layer dense has no bias");

        let model: PneumoniaCnn<TestBackend> = config.init(&device).unwrap();
        let no_conv_bias = PneumoniaCnn {
            conv1: Conv2dConfig::new([CHANNELS, CONV1_FILTERS], [KERNEL, KERNEL])
                .with_bias(false)
                .init(&device),
            ..model
        };
        let err = no_conv_bias.verify_topology(&config).unwrap_err();
        assert_eq!(err, "layer conv1 has no bias");
    }
}
