//! Figures for inspecting images and results.
//!
//! Figures are built as plain data ([`Figure`]), rasterized with
//! [`Figure::render`] and handed to a [`Presenter`]. Nothing here blocks: in a
//! non-interactive context the [`Headless`] presenter turns every plot call
//! into a no-op.

mod figure;
mod presenter;
mod render;

pub use figure::{
    histogram_figure, image_figure, result_figure, Figure, Panel, PanelContent, HISTOGRAM_BINS,
    RESULT_TITLE,
};
pub use presenter::{Headless, Presenter, SaveToDir};
pub use render::{load_default_font, load_font};

use crate::config::PlotConfig;
use crate::error::Result;
use crate::image::Image;

/// Builds figures and passes them to a presenter.
pub struct Plotter {
    presenter: Box<dyn Presenter>,
}

impl Plotter {
    #[must_use]
    pub fn new(presenter: impl Presenter + 'static) -> Self {
        Self {
            presenter: Box::new(presenter),
        }
    }

    /// Save figures to `plot.output_dir`, or discard them when it is unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory or font cannot be set up.
    pub fn from_config(plot: &PlotConfig) -> Result<Self> {
        match &plot.output_dir {
            Some(dir) => Ok(Self::new(SaveToDir::new(dir, plot)?)),
            None => Ok(Self::new(Headless)),
        }
    }

    /// Show one image with a gray colormap and no axes.
    ///
    /// # Errors
    ///
    /// Returns an error if the presenter fails.
    pub fn plot_image(&mut self, image: &Image) -> Result<()> {
        self.presenter.present(&image_figure(image))
    }

    /// Show images side by side; the last one is titled `Result`.
    ///
    /// # Errors
    ///
    /// Returns a usage error if `images` is empty, or an error if the
    /// presenter fails.
    pub fn plot_result(&mut self, images: &[&Image]) -> Result<()> {
        let figure = result_figure(images)?;
        self.presenter.present(&figure)
    }

    /// Show red, green and blue histograms of an RGB image.
    ///
    /// # Errors
    ///
    /// Returns a usage error unless the image has 3 channels, or an error if
    /// the presenter fails.
    pub fn plot_histogram(&mut self, image: &Image) -> Result<()> {
        let figure = histogram_figure(image)?;
        self.presenter.present(&figure)
    }
}
