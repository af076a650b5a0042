//! Image saving utilities.

use std::path::Path;

use image::DynamicImage;

use crate::config::DEFAULT_JPEG_QUALITY;
use crate::error::{Error, Result};

use super::Image;

/// Save an image, inferring the format from the path extension.
///
/// JPEG output uses the default quality of 95.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or written.
pub fn save_image<P: AsRef<Path>>(image: &Image, path: P) -> Result<()> {
    save_image_with_quality(image, path, DEFAULT_JPEG_QUALITY)
}

/// Save an image with an explicit JPEG quality.
///
/// The image is:
/// 1. Clamped to [0, 1] and quantized to 8 bits
/// 2. Flattened to RGB when written as JPEG, which cannot store alpha
/// 3. Saved to the specified path (format inferred from extension, PNG when
///    there is none)
///
/// # Arguments
///
/// * `image` - Image to save
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the image cannot be saved.
pub fn save_image_with_quality<P: AsRef<Path>>(image: &Image, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let img = image.to_dynamic();

    // Determine format and save
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => {
            let img = match image.channels() {
                super::GRAY_ALPHA_CHANNELS => DynamicImage::ImageLuma8(img.to_luma8()),
                super::RGBA_CHANNELS => DynamicImage::ImageRgb8(img.to_rgb8()),
                _ => img,
            };
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            img.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        Some(_) => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
        None => {
            img.save_with_format(path, image::ImageFormat::Png)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
    }

    tracing::debug!("Saved {}", path.display());
    Ok(())
}
