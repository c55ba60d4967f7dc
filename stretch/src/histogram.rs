//! Fixed-resolution luminance histograms and cumulative distributions
//!
//! Histograms are float-valued so callers can rescale counts, and CDFs are
//! normalized to end at 1. A histogram with zero total yields an all-zero CDF,
//! which callers treat as a degenerate (no-op) source distribution.

use ndarray::{Array1, ArrayView1, ArrayView2};

/// Number of bins used by both engines for histograms, CDFs and transport maps.
pub const HISTOGRAM_BINS: usize = 256;

/// Bin index of a normalized value: `floor(value * bins)` clamped to the valid range.
pub fn bin_index(value: f32, bins: usize) -> usize {
    let bin = (value * bins as f32).floor();
    if bin <= 0.0 || bin.is_nan() {
        0
    } else {
        (bin as usize).min(bins - 1)
    }
}

/// Count luminance values into `bins` equal-width bins over [0, 1].
///
/// Out-of-range values are clamped into the first or last bin, so the
/// histogram always sums to the number of input samples.
///
/// # Panics
/// Panics if `bins` is zero.
pub fn compute_histogram(luminance: &ArrayView2<f32>, bins: usize) -> Array1<f32> {
    assert!(bins > 0, "Histogram needs at least one bin");

    let mut hist = Array1::<f32>::zeros(bins);
    for &value in luminance.iter() {
        hist[bin_index(value, bins)] += 1.0;
    }
    hist
}

/// Running sum of a histogram normalized by its total.
///
/// Returns an all-zero CDF when the histogram sums to zero instead of dividing
/// by zero.
pub fn histogram_to_cdf(hist: &ArrayView1<f32>) -> Array1<f32> {
    let mut cdf = Array1::<f32>::zeros(hist.len());
    let mut sum = 0.0f64;

    for (c, &count) in cdf.iter_mut().zip(hist.iter()) {
        sum += count as f64;
        *c = sum as f32;
    }

    if sum > 0.0 {
        cdf.mapv_inplace(|c| (c as f64 / sum) as f32);
    }

    cdf
}

/// Smallest normalized bin position whose cumulative value reaches `quantile`.
///
/// Binary search over a non-decreasing CDF; ties resolve to the lowest
/// qualifying bin. The result is `bin / (len - 1)`. When no bin reaches the
/// quantile the last bin is returned.
pub fn inverse_cdf(cdf: &ArrayView1<f32>, quantile: f32) -> f32 {
    let n = cdf.len();
    if n < 2 {
        return 0.0;
    }

    let mut low = 0;
    let mut high = n - 1;
    while low < high {
        let mid = (low + high) / 2;
        if cdf[mid] < quantile {
            low = mid + 1;
        } else {
            high = mid;
        }
    }

    low as f32 / (n - 1) as f32
}
