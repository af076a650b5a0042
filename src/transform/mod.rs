//! Geometric transformations.

mod resize;

pub use resize::resize_image;
