//! Image representation, loading and saving utilities.

mod load;
mod save;

pub use load::read_image;
pub use save::{save_image, save_image_with_quality};

use image::{ColorType, DynamicImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};
use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::error::{Error, Result};

/// Number of channels in grayscale images with alpha.
pub const GRAY_ALPHA_CHANNELS: usize = 2;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Number of channels in RGBA images.
pub const RGBA_CHANNELS: usize = 4;

/// Luminance weights applied to the red, green and blue channels.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// An image held as a height x width x channels array of `f32` samples.
///
/// Samples are in the [0, 1] range. Integer data from files is rescaled when
/// it is read and quantized again when it is saved, so every operation in this
/// crate works on the same numeric convention. Grayscale images have 1 channel
/// (2 with alpha), color images have 3 (RGB) or 4 (RGBA). Alpha is always the
/// last channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Array3<f32>,
}

impl Image {
    /// Wrap an existing array.
    ///
    /// # Errors
    ///
    /// Returns an error if the array has no pixels or a channel count other
    /// than 1 to 4.
    pub fn from_array(data: Array3<f32>) -> Result<Self> {
        let (height, width, channels) = data.dim();
        if height == 0 || width == 0 {
            return Err(Error::invalid(
                "image",
                format!("dimensions must be non-zero, got {height}x{width}"),
            ));
        }
        if !(1..=RGBA_CHANNELS).contains(&channels) {
            return Err(Error::invalid(
                "image",
                format!("expected 1 to 4 channels, got {channels}"),
            ));
        }
        Ok(Self { data })
    }

    /// Wrap a two-dimensional array as a single-channel image.
    ///
    /// # Errors
    ///
    /// Returns an error if the array has no pixels.
    pub fn from_gray(data: Array2<f32>) -> Result<Self> {
        Self::from_array(data.insert_axis(Axis(2)))
    }

    /// Create an image with every sample set to `value`.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`Image::from_array`].
    pub fn filled(height: usize, width: usize, channels: usize, value: f32) -> Result<Self> {
        Self::from_array(Array3::from_elem((height, width, channels), value))
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// `(height, width, channels)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Single channel, no alpha.
    #[must_use]
    pub fn is_gray(&self) -> bool {
        self.channels() == 1
    }

    /// Whether the last channel is alpha (gray + alpha or RGBA).
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        matches!(self.channels(), GRAY_ALPHA_CHANNELS | RGBA_CHANNELS)
    }

    /// Borrow the underlying array.
    #[must_use]
    pub const fn data(&self) -> &Array3<f32> {
        &self.data
    }

    #[must_use]
    pub fn into_array(self) -> Array3<f32> {
        self.data
    }

    /// View a single channel as a height x width array.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid channel.
    #[must_use]
    pub fn channel(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), index)
    }

    /// Reduce the image to a single luminance channel.
    ///
    /// Grayscale images are returned unchanged. Color images are combined with
    /// [`LUMA_WEIGHTS`]; an alpha channel is ignored.
    #[must_use]
    pub fn to_luminance(&self) -> Array2<f32> {
        if self.channels() < RGB_CHANNELS {
            return self.channel(0).to_owned();
        }

        let (height, width, _) = self.shape();
        Array2::from_shape_fn((height, width), |(y, x)| {
            LUMA_WEIGHTS
                .iter()
                .enumerate()
                .map(|(c, w)| w * self.data[[y, x, c]])
                .sum()
        })
    }

    /// Convert a decoded image into the canonical float layout.
    ///
    /// Gray images become one channel and keep their alpha as a second one,
    /// RGBA images keep their alpha, everything else becomes RGB.
    pub(crate) fn from_dynamic(img: &DynamicImage, as_gray: bool) -> Result<Self> {
        let (width, height) = (img.width() as usize, img.height() as usize);

        if as_gray {
            let rgb = Self::from_raw(height, width, RGB_CHANNELS, img.to_rgb32f().into_raw())?;
            return Self::from_gray(rgb.to_luminance());
        }

        match img.color() {
            ColorType::L8 | ColorType::L16 => {
                Self::from_raw(height, width, 1, img.to_luma32f().into_raw())
            }
            ColorType::La8 | ColorType::La16 => Self::from_raw(
                height,
                width,
                GRAY_ALPHA_CHANNELS,
                img.to_luma_alpha32f().into_raw(),
            ),
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => {
                Self::from_raw(height, width, RGBA_CHANNELS, img.to_rgba32f().into_raw())
            }
            _ => Self::from_raw(height, width, RGB_CHANNELS, img.to_rgb32f().into_raw()),
        }
    }

    fn from_raw(height: usize, width: usize, channels: usize, raw: Vec<f32>) -> Result<Self> {
        let data = Array3::from_shape_vec((height, width, channels), raw)
            .map_err(|err| Error::invalid("image", err.to_string()))?;
        Self::from_array(data)
    }

    /// Quantize to an 8-bit image, clamping samples to [0, 1].
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn to_dynamic(&self) -> DynamicImage {
        // Safe: both dimensions come from a decoded image or a caller array
        // and are far below u32::MAX in practice
        let (width, height) = (self.width() as u32, self.height() as u32);
        let px = |x: u32, y: u32, c: usize| quantize(self.data[[y as usize, x as usize, c]]);

        match self.channels() {
            1 => DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |x, y| {
                Luma([px(x, y, 0)])
            })),
            GRAY_ALPHA_CHANNELS => {
                DynamicImage::ImageLumaA8(ImageBuffer::from_fn(width, height, |x, y| {
                    LumaA([px(x, y, 0), px(x, y, 1)])
                }))
            }
            RGBA_CHANNELS => DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
                Rgba([px(x, y, 0), px(x, y, 1), px(x, y, 2), px(x, y, 3)])
            })),
            _ => DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
                Rgb([px(x, y, 0), px(x, y, 1), px(x, y, 2)])
            })),
        }
    }
}

/// Quantize a [0, 1] sample to 8 bits with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn quantize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
