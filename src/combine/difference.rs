//! Structural difference between two images.

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::image::Image;

/// Parameters of the structural similarity index.
#[derive(Debug, Clone, Copy)]
pub struct SsimParams {
    /// Side of the square averaging window. Must be odd.
    pub window: usize,

    /// Luminance stabilizer.
    pub k1: f64,

    /// Contrast stabilizer.
    pub k2: f64,

    /// Dynamic range of the samples.
    pub data_range: f64,
}

impl Default for SsimParams {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
            data_range: 1.0,
        }
    }
}

/// Result of [`find_difference`].
#[derive(Debug, Clone)]
pub struct Difference {
    /// Mean structural similarity, in [-1, 1].
    pub score: f64,

    /// Per-pixel similarity rescaled to [0, 1]. All zeros when the raw map
    /// is flat.
    pub map: Array2<f32>,
}

impl Difference {
    /// The normalized map as a single-channel image.
    ///
    /// # Errors
    ///
    /// Never fails for a map produced by [`find_difference`].
    pub fn to_image(&self) -> Result<Image> {
        Image::from_gray(self.map.clone())
    }
}

/// Compute the structural difference between two images of the same shape.
///
/// Both images are reduced to luminance, compared with SSIM using
/// [`SsimParams::default`], and the per-pixel map is min/max normalized.
///
/// # Errors
///
/// Returns a precondition error if the shapes differ or the images are
/// smaller than the comparison window.
pub fn find_difference(image1: &Image, image2: &Image) -> Result<Difference> {
    if image1.shape() != image2.shape() {
        return Err(Error::ShapeMismatch {
            expected: image1.shape(),
            actual: image2.shape(),
        });
    }

    let gray1 = image1.to_luminance();
    let gray2 = image2.to_luminance();

    let (score, raw) = structural_similarity(gray1.view(), gray2.view(), SsimParams::default())?;
    tracing::info!("Image similarity: {score}");

    Ok(Difference {
        score,
        map: normalize(&raw),
    })
}

/// Compute the mean SSIM and the full SSIM map of two grayscale arrays.
///
/// Local statistics are taken over a uniform window with mirrored borders and
/// use the sample covariance. The mean excludes a border of half the window
/// width, where the statistics depend on the mirroring.
///
/// # Errors
///
/// Returns a precondition error if the arrays differ in shape, the window is
/// even, or either dimension is smaller than the window.
#[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
pub fn structural_similarity(
    x: ArrayView2<'_, f32>,
    y: ArrayView2<'_, f32>,
    params: SsimParams,
) -> Result<(f64, Array2<f64>)> {
    let (height, width) = x.dim();
    if y.dim() != x.dim() {
        return Err(Error::ShapeMismatch {
            expected: (height, width, 1),
            actual: (y.dim().0, y.dim().1, 1),
        });
    }

    let win = params.window;
    if win % 2 == 0 {
        return Err(Error::invalid("window", format!("must be odd, got {win}")));
    }
    if height < win || width < win {
        return Err(Error::invalid(
            "image",
            format!("{height}x{width} is smaller than the {win}x{win} comparison window"),
        ));
    }

    let x = x.mapv(f64::from);
    let y = y.mapv(f64::from);

    let ux = uniform_filter(&x, win);
    let uy = uniform_filter(&y, win);
    let uxx = uniform_filter(&(&x * &x), win);
    let uyy = uniform_filter(&(&y * &y), win);
    let uxy = uniform_filter(&(&x * &y), win);

    let np = (win * win) as f64;
    let cov_norm = np / (np - 1.0);
    let c1 = (params.k1 * params.data_range).powi(2);
    let c2 = (params.k2 * params.data_range).powi(2);

    let mut map = Array2::<f64>::zeros((height, width));
    ndarray::Zip::from(&mut map)
        .and(&ux)
        .and(&uy)
        .and(&uxx)
        .and(&uyy)
        .and(&uxy)
        .for_each(|s, &ux, &uy, &uxx, &uyy, &uxy| {
            // Kept as plain products so identical inputs give exactly 1.0
            let vx = cov_norm * (uxx - ux * ux);
            let vy = cov_norm * (uyy - uy * uy);
            let vxy = cov_norm * (uxy - ux * uy);

            let a1 = 2.0 * ux * uy + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux * ux + uy * uy + c1;
            let b2 = vx + vy + c2;
            *s = (a1 * a2) / (b1 * b2);
        });

    let pad = (win - 1) / 2;
    let inner = map.slice(ndarray::s![pad..height - pad, pad..width - pad]);
    let score = inner.mean().unwrap_or(0.0);

    Ok((score, map))
}

/// Rescale to [0, 1] by global min/max; a flat map becomes all zeros.
#[allow(clippy::cast_possible_truncation)]
fn normalize(raw: &Array2<f64>) -> Array2<f32> {
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max > min {
        raw.mapv(|v| ((v - min) / (max - min)) as f32)
    } else {
        tracing::debug!("Difference map is flat, returning zeros");
        Array2::zeros(raw.dim())
    }
}

/// Mean over a `size` x `size` window with half-sample symmetric borders
/// (`d c b a | a b c d | d c b a`).
#[allow(clippy::cast_precision_loss)]
fn uniform_filter(input: &Array2<f64>, size: usize) -> Array2<f64> {
    let rows = filter_axis(input.view(), size, Axis(0));
    filter_axis(rows.view(), size, Axis(1)) / (size * size) as f64
}

/// Windowed sum along one axis.
#[allow(clippy::cast_possible_wrap)]
fn filter_axis(input: ArrayView2<'_, f64>, size: usize, axis: Axis) -> Array2<f64> {
    let radius = (size / 2) as isize;
    let len = input.len_of(axis);

    let mut output = Array2::<f64>::zeros(input.dim());
    for (mut out_lane, in_lane) in output.lanes_mut(axis).into_iter().zip(input.lanes(axis)) {
        for i in 0..len {
            let centre = i as isize;
            out_lane[i] = (centre - radius..=centre + radius)
                .map(|j| in_lane[mirror(j, len)])
                .sum();
        }
    }

    output
}

#[inline]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
const fn mirror(index: isize, len: usize) -> usize {
    let len = len as isize;
    if index < 0 {
        (-index - 1) as usize
    } else if index >= len {
        (2 * len - index - 1) as usize
    } else {
        index as usize
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;
    use crate::ErrorKind;

    #[allow(clippy::cast_precision_loss)]
    fn pattern(height: usize, width: usize, seed: usize) -> Image {
        let data = Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
            ((x * 31 + y * 17 + c * 13 + seed * 7) % 101) as f32 / 100.0
        });
        Image::from_array(data).unwrap()
    }

    #[test]
    fn test_map_is_normalized() {
        let diff = find_difference(&pattern(20, 24, 0), &pattern(20, 24, 3)).unwrap();

        assert_eq!(diff.map.dim(), (20, 24));
        assert!(diff.map.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(diff.map.iter().any(|&v| v == 0.0));
        assert!(diff.map.iter().any(|&v| v == 1.0));
        assert!((-1.0..=1.0).contains(&diff.score));
    }

    #[test]
    fn test_identical_images_score_one_and_flat_map() {
        let img = pattern(16, 16, 1);
        let diff = find_difference(&img, &img).unwrap();

        assert!((diff.score - 1.0).abs() < 1e-9);
        assert!(diff.map.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_black_versus_white() {
        let black = Image::filled(100, 100, 3, 0.0).unwrap();
        let white = Image::filled(100, 100, 3, 1.0).unwrap();

        let diff = find_difference(&black, &white).unwrap();
        assert!(diff.score < 0.01, "score {}", diff.score);
        assert!(diff.map.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Image::filled(10, 10, 3, 0.0).unwrap();
        let b = Image::filled(10, 11, 3, 0.0).unwrap();

        let err = find_difference(&a, &b).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: (10, 10, 3),
                actual: (10, 11, 3)
            }
        ));
    }

    #[test]
    fn test_channel_mismatch_is_shape_mismatch() {
        let a = Image::filled(10, 10, 3, 0.0).unwrap();
        let b = Image::filled(10, 10, 1, 0.0).unwrap();
        assert!(matches!(
            find_difference(&a, &b),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_smaller_than_window() {
        let a = Image::filled(6, 20, 1, 0.0).unwrap();
        let err = find_difference(&a, &a).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_gray_matches_color_luminance() {
        let a = pattern(12, 12, 0);
        let b = pattern(12, 12, 5);
        let from_color = find_difference(&a, &b).unwrap();

        let a_gray = Image::from_gray(a.to_luminance()).unwrap();
        let b_gray = Image::from_gray(b.to_luminance()).unwrap();
        let from_gray = find_difference(&a_gray, &b_gray).unwrap();

        assert!((from_color.score - from_gray.score).abs() < 1e-12);
    }

    #[test]
    fn test_score_excludes_border() {
        let x = Array2::<f32>::from_shape_fn((9, 9), |(y, x)| if x == 0 || y == 0 { 1.0 } else { 0.5 });
        let y = Array2::<f32>::from_elem((9, 9), 0.5);

        let (score, map) = structural_similarity(x.view(), y.view(), SsimParams::default()).unwrap();
        assert!(map[[0, 0]] < 1.0);
        assert!(score <= 1.0);
    }

    #[test]
    fn test_uniform_filter_constant() {
        let input = Array2::<f64>::from_elem((8, 9), 2.5);
        let out = uniform_filter(&input, 7);
        assert!(out.iter().all(|v| (v - 2.5).abs() < 1e-12));
    }

    #[test]
    fn test_mirror_indices() {
        assert_eq!(mirror(-1, 5), 0);
        assert_eq!(mirror(-3, 5), 2);
        assert_eq!(mirror(5, 5), 4);
        assert_eq!(mirror(7, 5), 2);
        assert_eq!(mirror(2, 5), 2);
    }

    #[test]
    fn test_to_image() {
        let diff = find_difference(&pattern(10, 12, 0), &pattern(10, 12, 2)).unwrap();
        let img = diff.to_image().unwrap();
        assert_eq!(img.shape(), (10, 12, 1));
    }
}
