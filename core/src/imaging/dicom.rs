//! DICOM Part 10 container support
//!
//! Only the first frame of the pixel data is used. Tag values are read for
//! logging; they never influence the prediction.

use crate::error::{PulmolensError, Result};
use dicom_core::Tag;
use dicom_object::InMemDicomObject;
use dicom_pixeldata::PixelDecoder;
use image::RgbImage;
use log::{debug, warn};

pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const BODY_PART_EXAMINED: Tag = Tag(0x0018, 0x0015);
pub const VIEW_POSITION: Tag = Tag(0x0018, 0x5101);

/// Radiograph modalities (computed and digital radiography)
const RADIOGRAPH_MODALITIES: [&str; 2] = ["CR", "DX"];

/// Decodes the first frame of a DICOM file into an RGB image
///
/// `bytes` must start at the "DICM" magic, i.e. with the preamble stripped.
///
/// # Errors
///
/// Returns [`PulmolensError::Decode`] if the file meta group or the pixel
/// data cannot be read.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    let obj = dicom_object::from_reader(bytes)
        .map_err(|e| PulmolensError::Decode(format!("DICOM read failed: {}", e)))?;

    let modality = get_string_value(&obj, MODALITY);
    match modality.as_deref() {
        Some(m) if RADIOGRAPH_MODALITIES.contains(&m) => {}
        Some(m) => warn!("DICOM upload has non-radiograph modality {}", m),
        None => warn!("DICOM upload has no modality"),
    }
    debug!(
        "DICOM body part: {}, view position: {}",
        get_string_value(&obj, BODY_PART_EXAMINED).as_deref().unwrap_or("unknown"),
        get_string_value(&obj, VIEW_POSITION).as_deref().unwrap_or("unknown")
    );

    let pixels = obj
        .decode_pixel_data()
        .map_err(|e| PulmolensError::Decode(format!("DICOM pixel data: {}", e)))?;
    let frame = pixels
        .to_dynamic_image(0)
        .map_err(|e| PulmolensError::Decode(format!("DICOM frame conversion: {}", e)))?;

    // rebuild through raw bytes so the buffer type is this crate's `image`
    let rgb = frame.to_rgb8();
    let (width, height) = (rgb.width(), rgb.height());
    RgbImage::from_raw(width, height, rgb.into_raw())
        .ok_or_else(|| PulmolensError::Decode("DICOM frame has inconsistent size".to_string()))
}

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
}
