//! Figure layouts: what goes in each panel and how it is titled.

use image::Rgb;

use crate::error::{Error, Result};
use crate::image::{Image, RGB_CHANNELS};

/// Number of bins in a channel histogram.
pub const HISTOGRAM_BINS: usize = 256;

/// Title given to the last panel of a comparison figure.
pub const RESULT_TITLE: &str = "Result";

const CHANNEL_COLORS: [(&str, Rgb<u8>); RGB_CHANNELS] = [
    ("Red", Rgb([255, 0, 0])),
    ("Green", Rgb([0, 128, 0])),
    ("Blue", Rgb([0, 0, 255])),
];

/// A row of panels rendered side by side.
#[derive(Debug, Clone)]
pub struct Figure<'a> {
    panels: Vec<Panel<'a>>,
    shared_y: bool,
}

/// One cell of a [`Figure`].
#[derive(Debug, Clone)]
pub struct Panel<'a> {
    /// Text drawn above the panel, if any.
    pub title: Option<String>,

    /// What the panel shows.
    pub content: PanelContent<'a>,
}

#[derive(Debug, Clone)]
pub enum PanelContent<'a> {
    /// An image drawn without axes. Single-channel images use a gray
    /// colormap scaled to their own min and max.
    Image(&'a Image),

    /// Bar chart of sample counts per bin over [0, 1].
    Histogram {
        color: Rgb<u8>,
        counts: Box<[u32; HISTOGRAM_BINS]>,
    },
}

impl<'a> Figure<'a> {
    #[must_use]
    pub fn panels(&self) -> &[Panel<'a>] {
        &self.panels
    }

    /// Titles of all panels, in order.
    #[must_use]
    pub fn titles(&self) -> Vec<Option<&str>> {
        self.panels.iter().map(|p| p.title.as_deref()).collect()
    }

    /// Whether histogram panels share a y scale.
    #[must_use]
    pub const fn shared_y(&self) -> bool {
        self.shared_y
    }
}

/// A figure with a single untitled image.
#[must_use]
pub fn image_figure(image: &Image) -> Figure<'_> {
    Figure {
        panels: vec![Panel {
            title: None,
            content: PanelContent::Image(image),
        }],
        shared_y: false,
    }
}

/// Images side by side, titled `Image 1` .. `Image N-1` and `Result`.
///
/// # Errors
///
/// Returns a usage error if `images` is empty.
pub fn result_figure<'a>(images: &[&'a Image]) -> Result<Figure<'a>> {
    if images.is_empty() {
        return Err(Error::Usage("at least one image is required".to_string()));
    }

    let panels = result_titles(images.len())
        .into_iter()
        .zip(images.iter().copied())
        .map(|(title, image)| Panel {
            title: Some(title),
            content: PanelContent::Image(image),
        })
        .collect();

    Ok(Figure {
        panels,
        shared_y: false,
    })
}

/// Red, green and blue histograms of an RGB image on a shared y scale.
///
/// # Errors
///
/// Returns a usage error unless the image has exactly 3 channels.
pub fn histogram_figure(image: &Image) -> Result<Figure<'static>> {
    if image.channels() != RGB_CHANNELS {
        return Err(Error::Usage(format!(
            "the image must be RGB (3 channels), got {} channels",
            image.channels()
        )));
    }

    let panels = CHANNEL_COLORS
        .iter()
        .enumerate()
        .map(|(c, &(name, color))| Panel {
            title: Some(format!("{name} histogram")),
            content: PanelContent::Histogram {
                color,
                counts: channel_histogram(image, c),
            },
        })
        .collect();

    Ok(Figure {
        panels,
        shared_y: true,
    })
}

fn result_titles(count: usize) -> Vec<String> {
    (1..count)
        .map(|i| format!("Image {i}"))
        .chain(std::iter::once(RESULT_TITLE.to_string()))
        .collect()
}

/// Count samples of one channel into [`HISTOGRAM_BINS`] equal bins over
/// [0, 1]. Values from 8-bit data land in the bin of their 8-bit level.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn channel_histogram(image: &Image, channel: usize) -> Box<[u32; HISTOGRAM_BINS]> {
    let mut counts = Box::new([0u32; HISTOGRAM_BINS]);
    for &v in image.channel(channel) {
        // Safe: clamped to [0, 1] so the product is within [0, 256]
        let bin = ((v.clamp(0.0, 1.0) * HISTOGRAM_BINS as f32) as usize).min(HISTOGRAM_BINS - 1);
        counts[bin] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_result_labels() {
        let img = Image::filled(4, 4, 1, 0.0).unwrap();
        let figure = result_figure(&[&img, &img, &img]).unwrap();

        assert_eq!(
            figure.titles(),
            vec![Some("Image 1"), Some("Image 2"), Some("Result")]
        );
    }

    #[test]
    fn test_single_result() {
        let img = Image::filled(4, 4, 3, 0.0).unwrap();
        let figure = result_figure(&[&img]).unwrap();
        assert_eq!(figure.titles(), vec![Some("Result")]);
    }

    #[test]
    fn test_empty_result_is_usage_error() {
        let err = result_figure(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_image_figure_is_untitled() {
        let img = Image::filled(4, 4, 1, 0.0).unwrap();
        let figure = image_figure(&img);
        assert_eq!(figure.titles(), vec![None]);
    }

    #[test]
    fn test_histogram_requires_three_channels() {
        for channels in [1, 2, 4] {
            let img = Image::filled(4, 4, channels, 0.5).unwrap();
            let err = histogram_figure(&img).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Usage);
        }

        let rgb = Image::filled(4, 4, 3, 0.5).unwrap();
        let figure = histogram_figure(&rgb).unwrap();
        assert_eq!(
            figure.titles(),
            vec![
                Some("Red histogram"),
                Some("Green histogram"),
                Some("Blue histogram")
            ]
        );
        assert!(figure.shared_y());
    }

    #[test]
    fn test_histogram_bins_follow_8bit_levels() {
        let mut data = Array3::<f32>::zeros((1, 4, 3));
        data[[0, 0, 0]] = 0.0;
        data[[0, 1, 0]] = 1.0 / 255.0;
        data[[0, 2, 0]] = 128.0 / 255.0;
        data[[0, 3, 0]] = 1.0;
        let img = Image::from_array(data).unwrap();

        let figure = histogram_figure(&img).unwrap();
        let PanelContent::Histogram { counts, .. } = &figure.panels()[0].content else {
            panic!("expected a histogram panel");
        };

        assert_eq!(counts[0], 1);
        assert_eq!(counts[1], 1);
        assert_eq!(counts[128], 1);
        assert_eq!(counts[255], 1);
        assert_eq!(counts.iter().sum::<u32>(), 4);
    }
}
