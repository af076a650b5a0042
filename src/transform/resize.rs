//! Proportional resizing with anti-aliasing.

use image::{
    imageops::{self, FilterType},
    ImageBuffer, Luma,
};
use imageproc::filter::separable_filter;
use ndarray::{Array3, ArrayView2};

use crate::error::{Error, Result};
use crate::image::Image;

type Plane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Gaussian kernels extend this many sigmas either side of the centre.
const KERNEL_TRUNCATE: f32 = 4.0;

/// Resize an image by a uniform proportion, keeping its aspect ratio.
///
/// Target dimensions are `round(height * proportion)` and
/// `round(width * proportion)`. When shrinking, every channel is smoothed with
/// a Gaussian before bilinear resampling. Its sigma is `(factor - 1) / 2` per
/// axis, where `factor` is the actual ratio of source to target size along
/// that axis, so rounding of small dimensions is taken into account. Samples
/// stay in [0, 1] and the channel count is unchanged.
///
/// # Errors
///
/// Returns a precondition error if `proportion` is outside [0, 1] or NaN, or
/// if it would produce an image with a zero dimension (including
/// `proportion == 0`).
pub fn resize_image(image: &Image, proportion: f64) -> Result<Image> {
    if !(0.0..=1.0).contains(&proportion) {
        return Err(Error::invalid(
            "proportion",
            format!("must be between 0 and 1, got {proportion}"),
        ));
    }

    let (height, width, channels) = image.shape();
    let target = (scaled(height, proportion), scaled(width, proportion));

    if target.0 == 0 || target.1 == 0 {
        return Err(Error::invalid(
            "proportion",
            format!(
                "{proportion} maps {height}x{width} to an empty {}x{} image",
                target.0, target.1
            ),
        ));
    }

    if target == (height, width) {
        return Ok(image.clone());
    }

    let (sigma_y, sigma_x) = anti_alias_sigmas((height, width), target);
    tracing::debug!(
        "Resizing {height}x{width} -> {}x{} (sigma {sigma_y:.3} x {sigma_x:.3})",
        target.0,
        target.1
    );

    let kernel_y = gaussian_kernel(sigma_y);
    let kernel_x = gaussian_kernel(sigma_x);

    let mut resized = Array3::<f32>::zeros((target.0, target.1, channels));
    for c in 0..channels {
        let mut plane = to_plane(image.channel(c));
        if kernel_y.len() > 1 || kernel_x.len() > 1 {
            plane = separable_filter(&plane, &kernel_x, &kernel_y);
        }

        #[allow(clippy::cast_possible_truncation)]
        let plane = imageops::resize(
            &plane,
            target.1 as u32,
            target.0 as u32,
            FilterType::Triangle,
        );

        for (x, y, pixel) in plane.enumerate_pixels() {
            resized[[y as usize, x as usize, c]] = pixel[0];
        }
    }

    Image::from_array(resized)
}

/// Scale a dimension, rounding half away from zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled(dimension: usize, proportion: f64) -> usize {
    // Safe: proportion is in [0, 1] so the result never exceeds dimension
    (dimension as f64 * proportion).round() as usize
}

/// Per-axis `(y, x)` Gaussian sigmas used to pre-smooth before downsampling
/// from `source` to `target`, both `(height, width)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn anti_alias_sigmas(source: (usize, usize), target: (usize, usize)) -> (f32, f32) {
    let sigma = |from: usize, to: usize| {
        let factor = from as f64 / to as f64;
        ((factor - 1.0) / 2.0).max(0.0) as f32
    };
    (sigma(source.0, target.0), sigma(source.1, target.1))
}

/// Normalized 1-D Gaussian kernel. A zero sigma gives the identity kernel.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }

    // Safe: sigma is positive and bounded by the image size
    let radius = (KERNEL_TRUNCATE * sigma).ceil() as usize;
    let mut kernel: Vec<f32> = (0..=2 * radius)
        .map(|i| {
            let d = i as f32 - radius as f32;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

#[allow(clippy::cast_possible_truncation)]
fn to_plane(channel: ArrayView2<'_, f32>) -> Plane {
    let (height, width) = channel.dim();
    // Safe: dimensions come from an existing image
    ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        Luma([channel[[y as usize, x as usize]]])
    })
}
