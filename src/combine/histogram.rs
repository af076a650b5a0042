//! Histogram matching.

use ndarray::{Array3, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::image::Image;

/// Remap `source` so each channel's distribution matches `reference`.
///
/// For every channel the cumulative distribution of the source samples is
/// aligned with the reference's: each distinct source value is replaced by
/// the reference value at the same quantile, interpolating linearly between
/// reference values. The spatial sizes may differ; the result has the
/// source's shape.
///
/// # Errors
///
/// Returns a precondition error if the channel counts differ.
pub fn transfer_histogram(source: &Image, reference: &Image) -> Result<Image> {
    if source.channels() != reference.channels() {
        return Err(Error::ChannelMismatch {
            expected: source.channels(),
            actual: reference.channels(),
        });
    }

    tracing::debug!(
        "Matching {:?} histogram to {:?} reference",
        source.shape(),
        reference.shape()
    );

    let mut matched = Array3::<f32>::zeros(source.shape());
    for c in 0..source.channels() {
        let lut = ChannelLut::new(source.channel(c), reference.channel(c));
        matched
            .index_axis_mut(Axis(2), c)
            .zip_mut_with(&source.channel(c), |out, &v| *out = lut.apply(v));
    }

    Image::from_array(matched)
}

/// Mapping from the distinct source values of one channel to reference values.
struct ChannelLut {
    values: Vec<f32>,
    mapped: Vec<f32>,
}

impl ChannelLut {
    fn new(source: ArrayView2<'_, f32>, reference: ArrayView2<'_, f32>) -> Self {
        let (values, source_counts) = unique_counts(source);
        let (ref_values, ref_counts) = unique_counts(reference);

        let source_quantiles = quantiles(&source_counts);
        let ref_quantiles = quantiles(&ref_counts);

        let mapped = source_quantiles
            .iter()
            .map(|&q| interp(q, &ref_quantiles, &ref_values))
            .collect();

        Self { values, mapped }
    }

    fn apply(&self, value: f32) -> f32 {
        let idx = self
            .values
            .binary_search_by(|v| v.total_cmp(&value))
            .unwrap_or_else(|i| i)
            .min(self.mapped.len() - 1);
        self.mapped[idx]
    }
}

/// Sorted distinct values and how often each occurs.
fn unique_counts(channel: ArrayView2<'_, f32>) -> (Vec<f32>, Vec<usize>) {
    let mut sorted: Vec<f32> = channel.iter().copied().collect();
    sorted.sort_unstable_by(f32::total_cmp);

    let mut values: Vec<f32> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for v in sorted {
        match values.last() {
            Some(last) if last.total_cmp(&v).is_eq() => {
                if let Some(count) = counts.last_mut() {
                    *count += 1;
                }
            }
            _ => {
                values.push(v);
                counts.push(1);
            }
        }
    }

    (values, counts)
}

/// Cumulative fraction of samples at or below each distinct value.
#[allow(clippy::cast_precision_loss)]
fn quantiles(counts: &[usize]) -> Vec<f64> {
    let total = counts.iter().sum::<usize>() as f64;
    counts
        .iter()
        .scan(0usize, |acc, &n| {
            *acc += n;
            Some(*acc as f64 / total)
        })
        .collect()
}

/// Piecewise-linear interpolation of `(xp, fp)` at `x`, clamped at both ends.
#[allow(clippy::cast_possible_truncation)]
fn interp(x: f64, xp: &[f64], fp: &[f32]) -> f32 {
    let i = xp.partition_point(|&p| p < x);
    if i == 0 {
        return fp[0];
    }
    if i == xp.len() {
        return fp[fp.len() - 1];
    }
    if xp[i] == x {
        return fp[i];
    }

    let t = (x - xp[i - 1]) / (xp[i] - xp[i - 1]);
    let (lo, hi) = (f64::from(fp[i - 1]), f64::from(fp[i]));
    (lo + t * (hi - lo)) as f32
}
