//! Rasterizing figures.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{
    imageops::{self, FilterType},
    ImageBuffer, Rgb, RgbImage,
};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};

use crate::error::{Error, Result};
use crate::image::{quantize, Image, RGB_CHANNELS};

use super::figure::{Figure, PanelContent, HISTOGRAM_BINS};

const MARGIN: u32 = 12;
const TITLE_BAND: u32 = 28;
const TITLE_SCALE: f32 = 18.0;
const BAR_ALPHA: f32 = 0.8;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FOREGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const AXIS: Rgb<u8> = Rgb([160, 160, 160]);

/// DejaVu Sans Mono, used for titles when no font file is configured.
static DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

/// Load a TrueType/OpenType font for panel titles.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid font.
pub fn load_font<P: AsRef<Path>>(path: P) -> Result<FontVec> {
    let path = path.as_ref();
    let font_load = |reason: String| Error::FontLoad {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| font_load(e.to_string()))?;
    FontVec::try_from_vec(bytes).map_err(|e| font_load(e.to_string()))
}

/// The title font bundled with the crate.
///
/// # Errors
///
/// Returns an error if the embedded font data cannot be parsed.
pub fn load_default_font() -> Result<FontVec> {
    FontVec::try_from_vec(DEFAULT_FONT.to_vec()).map_err(|e| Error::FontLoad {
        path: "<bundled DejaVuSansMono.ttf>".into(),
        reason: e.to_string(),
    })
}

/// Area of the canvas reserved for one panel's content.
#[derive(Debug, Clone, Copy)]
struct Cell {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Figure<'_> {
    /// Draw the figure on a `width` x `height` white canvas.
    ///
    /// Panels share the width equally. Titles are drawn only when a font is
    /// given; the space for them is reserved either way. [`SaveToDir`] always
    /// passes one, falling back to [`load_default_font`].
    ///
    /// [`SaveToDir`]: super::SaveToDir
    #[must_use]
    pub fn render(&self, width: u32, height: u32, font: Option<&FontVec>) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

        let panels = self.panels();
        let Some(cells) = layout(width, height, panels.len()) else {
            return canvas;
        };

        let y_max = self.shared_y().then(|| {
            panels
                .iter()
                .filter_map(|p| match &p.content {
                    PanelContent::Histogram { counts, .. } => counts.iter().copied().max(),
                    PanelContent::Image(_) => None,
                })
                .max()
                .unwrap_or(0)
        });

        for (panel, cell) in panels.iter().zip(cells) {
            match &panel.content {
                PanelContent::Image(image) => draw_image(&mut canvas, cell, image),
                PanelContent::Histogram { color, counts } => {
                    let max = y_max.unwrap_or_else(|| counts.iter().copied().max().unwrap_or(0));
                    draw_histogram(&mut canvas, cell, counts, *color, max);
                }
            }

            if let (Some(title), Some(font)) = (&panel.title, font) {
                draw_title(&mut canvas, cell, title, font);
            }
        }

        canvas
    }
}

fn layout(width: u32, height: u32, count: usize) -> Option<Vec<Cell>> {
    let count = u32::try_from(count).ok().filter(|&n| n > 0)?;

    let cell_width = width.checked_sub(MARGIN * (count + 1))? / count;
    let cell_height = height.checked_sub(2 * MARGIN + TITLE_BAND)?;
    if cell_width == 0 || cell_height == 0 {
        return None;
    }

    Some(
        (0..count)
            .map(|i| Cell {
                x: MARGIN + i * (cell_width + MARGIN),
                y: MARGIN + TITLE_BAND,
                width: cell_width,
                height: cell_height,
            })
            .collect(),
    )
}

/// Fit an image into its cell, preserving aspect ratio.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn draw_image(canvas: &mut RgbImage, cell: Cell, image: &Image) {
    let display = to_display(image);
    let (w, h) = display.dimensions();

    let scale = (cell.width as f32 / w as f32).min(cell.height as f32 / h as f32);
    let fit_w = ((w as f32 * scale).round() as u32).max(1);
    let fit_h = ((h as f32 * scale).round() as u32).max(1);

    let filter = if scale >= 1.0 {
        FilterType::Nearest
    } else {
        FilterType::Triangle
    };
    let fitted = imageops::resize(&display, fit_w, fit_h, filter);

    let x = cell.x + cell.width.saturating_sub(fit_w) / 2;
    let y = cell.y + cell.height.saturating_sub(fit_h) / 2;
    imageops::overlay(canvas, &fitted, i64::from(x), i64::from(y));
}

/// Map an image to 8-bit RGB the way it is shown on screen.
///
/// Gray images are stretched between their own min and max; color and
/// gray + alpha images are clipped to [0, 1] and alpha is composited over
/// white.
fn to_display(image: &Image) -> RgbImage {
    let data = image.data();
    #[allow(clippy::cast_possible_truncation)]
    let (width, height) = (image.width() as u32, image.height() as u32);

    if image.is_gray() {
        let min = data.iter().copied().fold(f32::INFINITY, f32::min);
        let max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;

        return ImageBuffer::from_fn(width, height, |x, y| {
            let v = data[[y as usize, x as usize, 0]];
            let level = if range > 0.0 {
                quantize((v - min) / range)
            } else {
                0
            };
            Rgb([level; 3])
        });
    }

    let alpha_channel = image.has_alpha().then(|| image.channels() - 1);
    let sources = if image.channels() < RGB_CHANNELS {
        [0; 3]
    } else {
        [0, 1, 2]
    };
    ImageBuffer::from_fn(width, height, |x, y| {
        let (y, x) = (y as usize, x as usize);
        let alpha = alpha_channel.map_or(1.0, |a| data[[y, x, a]].clamp(0.0, 1.0));
        Rgb(sources.map(|c| quantize(data[[y, x, c]].clamp(0.0, 1.0) * alpha + (1.0 - alpha))))
    })
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
fn draw_histogram(canvas: &mut RgbImage, cell: Cell, counts: &[u32; HISTOGRAM_BINS], color: Rgb<u8>, max: u32) {
    let frame = Rect::at(cell.x as i32, cell.y as i32).of_size(cell.width, cell.height);
    draw_hollow_rect_mut(canvas, frame, AXIS);

    if max == 0 {
        return;
    }

    let bar_color = blend(color, BACKGROUND, BAR_ALPHA);
    let bins = HISTOGRAM_BINS as u32;
    let bottom = cell.y + cell.height;

    for (i, &count) in (0u32..).zip(counts.iter()) {
        let bar_height = (count as f32 / max as f32 * cell.height as f32).round() as u32;
        if bar_height == 0 {
            continue;
        }

        let x0 = cell.x + i * cell.width / bins;
        let x1 = cell.x + (i + 1) * cell.width / bins;
        let rect = Rect::at(x0 as i32, (bottom - bar_height) as i32)
            .of_size((x1 - x0).max(1), bar_height);
        draw_filled_rect_mut(canvas, rect, bar_color);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn draw_title(canvas: &mut RgbImage, cell: Cell, title: &str, font: &FontVec) {
    let scale = PxScale::from(TITLE_SCALE);
    let (text_width, text_height) = text_size(scale, font, title);

    let x = cell.x as i32 + (cell.width as i32 - text_width as i32) / 2;
    let y = (cell.y - TITLE_BAND) as i32 + (TITLE_BAND as i32 - text_height as i32) / 2;
    draw_text_mut(canvas, FOREGROUND, x.max(0), y.max(0), scale, font, title);
}

/// Composite `color` at `alpha` over `background`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(color: Rgb<u8>, background: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let mix = |fg: u8, bg: u8| {
        f32::from(fg)
            .mul_add(alpha, f32::from(bg) * (1.0 - alpha))
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgb([
        mix(color[0], background[0]),
        mix(color[1], background[1]),
        mix(color[2], background[2]),
    ])
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;
    use crate::plot::{histogram_figure, image_figure, result_figure};

    #[test]
    fn test_layout_splits_width() {
        let cells = layout(1200, 400, 3).unwrap();
        assert_eq!(cells.len(), 3);
        assert!(cells.windows(2).all(|pair| pair[0].x + pair[0].width < pair[1].x));
        assert!(cells[2].x + cells[2].width <= 1200);
        assert!(layout(1200, 400, 0).is_none());
        assert!(layout(20, 400, 3).is_none());
    }

    #[test]
    fn test_render_canvas_size() {
        let img = Image::filled(10, 20, 3, 0.5).unwrap();
        let figure = result_figure(&[&img, &img]).unwrap();

        let canvas = figure.render(1200, 400, None);
        assert_eq!(canvas.dimensions(), (1200, 400));
    }

    #[test]
    fn test_gray_image_is_stretched() {
        let mut data = Array3::<f32>::from_elem((2, 2, 1), 0.4);
        data[[1, 1, 0]] = 0.6;
        let display = to_display(&Image::from_array(data).unwrap());

        assert_eq!(display.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(display.get_pixel(1, 1), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_transparent_pixels_show_background() {
        let img = Image::filled(2, 2, 4, 0.0).unwrap();
        let display = to_display(&img);
        assert_eq!(display.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_gray_alpha_is_composited() {
        let mut data = Array3::<f32>::zeros((1, 2, 2));
        data[[0, 0, 1]] = 1.0;
        let display = to_display(&Image::from_array(data).unwrap());

        assert_eq!(display.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(display.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_image_panel_is_drawn() {
        let img = Image::filled(50, 50, 3, 0.0).unwrap();
        let canvas = image_figure(&img).render(400, 400, None);

        // Centre of the only panel is covered by the black image
        assert_eq!(canvas.get_pixel(200, 220), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(1, 1), &BACKGROUND);
    }

    #[test]
    fn test_histogram_bars_use_channel_colors() {
        let img = Image::filled(8, 8, 3, 1.0).unwrap();
        let figure = histogram_figure(&img).unwrap();
        let canvas = figure.render(1200, 400, None);

        let cells = layout(1200, 400, 3).unwrap();
        let red = cells[0];
        // The whole mass sits in the last bin, a full-height bar on the right
        let pixel = canvas.get_pixel(red.x + red.width - 2, red.y + red.height - 2);
        assert_eq!(pixel, &blend(Rgb([255, 0, 0]), BACKGROUND, BAR_ALPHA));
    }

    #[test]
    fn test_blend() {
        assert_eq!(blend(Rgb([0, 0, 0]), BACKGROUND, 0.8), Rgb([51, 51, 51]));
        assert_eq!(blend(Rgb([255, 0, 0]), BACKGROUND, 1.0), Rgb([255, 0, 0]));
    }

    /// Whether any pixel in the title band differs from the background.
    fn title_band_has_ink(canvas: &RgbImage) -> bool {
        (MARGIN..MARGIN + TITLE_BAND)
            .flat_map(|y| (0..canvas.width()).map(move |x| (x, y)))
            .any(|(x, y)| canvas.get_pixel(x, y) != &BACKGROUND)
    }

    #[test]
    fn test_default_font_draws_titles() {
        let font = load_default_font().unwrap();
        let img = Image::filled(10, 20, 3, 0.5).unwrap();
        let figure = result_figure(&[&img, &img]).unwrap();

        assert!(title_band_has_ink(&figure.render(1200, 400, Some(&font))));
        assert!(!title_band_has_ink(&figure.render(1200, 400, None)));
    }

    #[test]
    fn test_untitled_figure_leaves_band_empty() {
        let font = load_default_font().unwrap();
        let img = Image::filled(10, 20, 3, 0.5).unwrap();
        assert!(!title_band_has_ink(&image_figure(&img).render(1200, 400, Some(&font))));
    }

    #[test]
    fn test_missing_font() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_font(dir.path().join("none.ttf")).unwrap_err();
        assert!(matches!(err, Error::FontLoad { .. }));
    }

    #[test]
    fn test_invalid_font() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(load_font(&path).is_err());
    }
}
