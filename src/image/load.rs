//! Image loading utilities.

use std::path::Path;

use crate::error::{Error, Result};

use super::Image;

/// Load an image from disk.
///
/// The format is inferred from the file contents and extension. Samples are
/// rescaled to [0, 1]. With `is_gray` the image is reduced to one luminance
/// channel; otherwise the channel count follows the file (1, 3 or 4).
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn read_image<P: AsRef<Path>>(path: P, is_gray: bool) -> Result<Image> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        "Read {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    Image::from_dynamic(&img, is_gray)
}
