//! Image preprocessing
//!
//! Turns uploaded bytes into the single-image, channels-last batch the
//! classifier consumes: decode, force three channels, squash to a square
//! resolution and rescale intensities from `[0, 255]` to `[0.0, 1.0]`.

#[cfg(feature = "dicom")]
pub mod dicom;

use crate::error::Result;
use image::imageops::FilterType;
use image::RgbImage;
use log::debug;
use ndarray::Array4;

/// Side length of the square model input
pub const IMAGE_SIZE: u32 = 224;

/// Number of color channels in the model input
pub const CHANNELS: usize = 3;

/// Preprocessed batch of shape `[1, size, size, 3]`, values in `[0.0, 1.0]`
pub type ImageTensor = Array4<f32>;

const DICOM_PREAMBLE_LEN: usize = 128;
const DICOM_MAGIC: &[u8; 4] = b"DICM";

/// Preprocesses image bytes at the default 224×224 resolution
///
/// # Errors
///
/// Returns [`crate::PulmolensError::Decode`] if the bytes are not a supported image.
///
/// # Example
///
/// ```
/// use image::{ImageFormat, RgbImage};
/// use std::io::Cursor;
///
/// let mut png = Vec::new();
/// RgbImage::new(32, 48)
///     .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
///     .unwrap();
///
/// let tensor = pulmolens_core::preprocess(&png).unwrap();
/// assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
/// ```
pub fn preprocess(bytes: &[u8]) -> Result<ImageTensor> {
    preprocess_with_size(bytes, IMAGE_SIZE)
}

/// Preprocesses image bytes to a `size`×`size` batch
pub fn preprocess_with_size(bytes: &[u8], size: u32) -> Result<ImageTensor> {
    let image = decode_rgb(bytes)?;
    debug!(
        "Decoded {}x{} image, resizing to {}x{}",
        image.width(),
        image.height(),
        size,
        size
    );
    Ok(to_tensor(&image, size))
}

/// Decodes bytes into an 8-bit RGB image
///
/// Grayscale sources are replicated across channels and alpha is dropped.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    if is_dicom(bytes) {
        return decode_dicom(bytes);
    }
    let image = image::load_from_memory(bytes)?;
    Ok(image.to_rgb8())
}

/// Checks for the DICOM Part 10 header
///
/// A DICOM file starts with a 128-byte preamble followed by the 4-byte
/// "DICM" magic string.
pub fn is_dicom(bytes: &[u8]) -> bool {
    bytes
        .get(DICOM_PREAMBLE_LEN..DICOM_PREAMBLE_LEN + DICOM_MAGIC.len())
        .is_some_and(|magic| magic == DICOM_MAGIC)
}

#[cfg(feature = "dicom")]
fn decode_dicom(bytes: &[u8]) -> Result<RgbImage> {
    dicom::decode(&bytes[DICOM_PREAMBLE_LEN..])
}

#[cfg(not(feature = "dicom"))]
fn decode_dicom(_bytes: &[u8]) -> Result<RgbImage> {
    Err(crate::error::PulmolensError::Decode(
        "DICOM input requires the 'dicom' feature".to_string(),
    ))
}

/// Resizes without preserving aspect ratio and rescales to `[0.0, 1.0]`
pub fn to_tensor(image: &RgbImage, size: u32) -> ImageTensor {
    let resized = image::imageops::resize(image, size, size, FilterType::CatmullRom);
    let side = size as usize;
    Array4::from_shape_fn((1, side, side, CHANNELS), |(_, y, x, c)| {
        f32::from(resized.get_pixel(x as u32, y as u32)[c]) / 255.0
    })
}
