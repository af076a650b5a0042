//! Runtime configuration shared by the CLI and library callers.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Default figure width in pixels (12 inches at 100 dpi).
pub const DEFAULT_FIGURE_WIDTH: u32 = 1200;

/// Default figure height in pixels (4 inches at 100 dpi).
pub const DEFAULT_FIGURE_HEIGHT: u32 = 400;

/// Configuration for saving images and rendering figures.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output JPEG quality (1-100).
    pub output_quality: u8,

    /// Figure settings.
    pub plot: PlotConfig,
}

/// Figure rendering settings.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Canvas width in pixels.
    pub width: u32,

    /// Canvas height in pixels.
    pub height: u32,

    /// Directory to write rendered figures to. None renders nothing.
    pub output_dir: Option<PathBuf>,

    /// TrueType/OpenType font used for panel titles. The bundled DejaVu Sans
    /// Mono is used without one.
    pub font_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_quality: DEFAULT_JPEG_QUALITY,
            plot: PlotConfig::default(),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_FIGURE_WIDTH,
            height: DEFAULT_FIGURE_HEIGHT,
            output_dir: None,
            font_path: None,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::invalid("output_quality", "must be between 1 and 100"));
        }

        self.plot.validate()
    }
}

impl PlotConfig {
    /// Validate the figure settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas is too small to hold a panel.
    pub fn validate(&self) -> Result<()> {
        if self.width < 64 || self.height < 64 {
            return Err(Error::invalid(
                "figure size",
                format!("must be at least 64x64, got {}x{}", self.width, self.height),
            ));
        }

        Ok(())
    }
}
