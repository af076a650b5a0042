//! # `imgkit`
//!
//! Small image-processing helpers built on the `image`, `imageproc` and
//! `ndarray` crates: structural difference between two images, histogram
//! matching, proportional resizing, file I/O and simple figures.
//!
//! Every image is an [`Image`]: a height x width x channels array of `f32`
//! samples in [0, 1]. Files are converted to and from that representation
//! when they are read and saved.
//!
//! ## Example
//!
//! ```no_run
//! use imgkit::{combine, image, transform};
//!
//! # fn main() -> imgkit::Result<()> {
//! let before = image::read_image("before.png", false)?;
//! let after = image::read_image("after.png", false)?;
//!
//! let diff = combine::find_difference(&before, &after)?;
//! println!("similarity: {:.4}", diff.score);
//! image::save_image(&diff.to_image()?, "difference.png")?;
//!
//! let thumbnail = transform::resize_image(&after, 0.25)?;
//! image::save_image(&thumbnail, "thumbnail.jpg")?;
//! # Ok(())
//! # }
//! ```

pub mod combine;
pub mod config;
pub mod error;
pub mod image;
pub mod plot;
pub mod transform;

pub use crate::combine::{find_difference, transfer_histogram, Difference};
pub use crate::config::{Config, PlotConfig};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::image::{read_image, save_image, Image};
pub use crate::plot::Plotter;
pub use crate::transform::resize_image;
