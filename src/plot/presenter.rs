//! Where rendered figures go.

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;

use crate::config::PlotConfig;
use crate::error::{Error, Result};

use super::figure::Figure;
use super::render::{load_default_font, load_font};

/// Receives finished figures.
pub trait Presenter {
    /// Show or store a figure. Must not block waiting for user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the figure cannot be delivered.
    fn present(&mut self, figure: &Figure<'_>) -> Result<()>;
}

/// Discards figures. Used when there is no display or output directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Presenter for Headless {
    fn present(&mut self, figure: &Figure<'_>) -> Result<()> {
        tracing::debug!(
            "Headless presenter: skipping figure with {} panel(s)",
            figure.panels().len()
        );
        Ok(())
    }
}

/// Renders figures to numbered PNG files in a directory.
pub struct SaveToDir {
    dir: PathBuf,
    width: u32,
    height: u32,
    font: FontVec,
    saved: Vec<PathBuf>,
}

impl SaveToDir {
    /// Create the presenter, creating `dir` if needed and loading the title
    /// font from `plot.font_path`, or the bundled font when it is unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid, the directory cannot be
    /// created, or the font cannot be loaded.
    pub fn new<P: AsRef<Path>>(dir: P, plot: &PlotConfig) -> Result<Self> {
        plot.validate()?;

        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let font = match &plot.font_path {
            Some(path) => load_font(path)?,
            None => {
                tracing::debug!("No font configured, using the bundled title font");
                load_default_font()?
            }
        };

        Ok(Self {
            dir,
            width: plot.width,
            height: plot.height,
            font,
            saved: Vec::new(),
        })
    }

    /// Files written so far, in order.
    #[must_use]
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl Presenter for SaveToDir {
    fn present(&mut self, figure: &Figure<'_>) -> Result<()> {
        let path = self
            .dir
            .join(format!("figure-{:03}.png", self.saved.len() + 1));

        let canvas = figure.render(self.width, self.height, Some(&self.font));
        canvas.save(&path).map_err(|source| Error::ImageSave {
            path: path.clone(),
            source,
        })?;

        tracing::info!("Wrote figure to {}", path.display());
        self.saved.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use crate::plot::{image_figure, result_figure};

    #[test]
    fn test_headless_accepts_anything() {
        let img = Image::filled(3, 3, 1, 0.0).unwrap();
        assert!(Headless.present(&image_figure(&img)).is_ok());
    }

    #[test]
    fn test_save_to_dir_numbers_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("figures");
        let mut presenter = SaveToDir::new(&out, &PlotConfig::default()).unwrap();

        let img = Image::filled(8, 8, 3, 0.2).unwrap();
        presenter.present(&image_figure(&img)).unwrap();
        presenter.present(&result_figure(&[&img, &img]).unwrap()).unwrap();

        assert_eq!(
            presenter.saved(),
            &[out.join("figure-001.png"), out.join("figure-002.png")]
        );
        let written = image::open(out.join("figure-002.png")).unwrap();
        assert_eq!((written.width(), written.height()), (1200, 400));
    }

    #[test]
    fn test_default_config_draws_titles() {
        let dir = tempfile::tempdir().unwrap();
        let mut presenter = SaveToDir::new(dir.path(), &PlotConfig::default()).unwrap();

        let img = Image::filled(8, 8, 3, 0.2).unwrap();
        presenter.present(&result_figure(&[&img, &img]).unwrap()).unwrap();

        let written = image::open(&presenter.saved()[0]).unwrap().to_rgb8();
        // Titles sit between the top margin and the panels
        let inked = (12..40)
            .flat_map(|y| (0..written.width()).map(move |x| (x, y)))
            .any(|(x, y)| written.get_pixel(x, y) != &image::Rgb([255, 255, 255]));
        assert!(inked);
    }

    #[test]
    fn test_bad_font_path_fails_early() {
        let dir = tempfile::tempdir().unwrap();
        let plot = PlotConfig {
            font_path: Some(dir.path().join("missing.ttf")),
            ..PlotConfig::default()
        };
        assert!(SaveToDir::new(dir.path(), &plot).is_err());
    }
}
