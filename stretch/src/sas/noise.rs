//! Robust noise estimation and wavelet-domain soft thresholding.

use ndarray::{Array2, ArrayView2};
use std::cmp::Ordering;

/// Converts a median absolute deviation into an equivalent Gaussian sigma.
pub const MAD_TO_SIGMA: f32 = 1.4826;

/// Multiple of the noise sigma applied on top of the user threshold.
pub const THRESHOLD_SIGMA_FACTOR: f32 = 5.0;

/// Detail scales (by index) that receive soft thresholding.
pub const DENOISED_SCALES: usize = 2;

/// Upper median (element at `len / 2` of the sorted values).
fn upper_median(values: &mut [f32]) -> f32 {
    let mid = values.len() / 2;
    let (_, median, _) = values
        .select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    *median
}

/// Estimate the noise sigma of the finest detail plane.
///
/// Takes the median of `|w|`, then the median of the absolute deviations of
/// `|w|` from that median, and scales by [`MAD_TO_SIGMA`]. An empty plane has
/// zero noise.
pub fn estimate_noise(plane: &ArrayView2<f32>) -> f32 {
    if plane.is_empty() {
        return 0.0;
    }

    let mut magnitudes: Vec<f32> = plane.iter().map(|w| w.abs()).collect();
    let median = upper_median(&mut magnitudes);

    let mut deviations: Vec<f32> = magnitudes.iter().map(|m| (m - median).abs()).collect();
    upper_median(&mut deviations) * MAD_TO_SIGMA
}

/// Shrink every coefficient toward zero by `threshold`.
///
/// Coefficients with magnitude at or below the threshold become zero; the
/// rest lose `threshold` of magnitude and keep their sign.
pub fn soft_threshold(mut plane: Array2<f32>, threshold: f32) -> Array2<f32> {
    plane.mapv_inplace(|w| {
        if w.abs() <= threshold {
            0.0
        } else {
            w - w.signum() * threshold
        }
    });
    plane
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::simple_normal_plane;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_upper_median() {
        let mut odd = vec![5.0, 1.0, 3.0];
        assert_eq!(upper_median(&mut odd), 3.0);
        let mut even = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(upper_median(&mut even), 3.0);
    }

    #[test]
    fn test_noise_of_gaussian_plane() {
        let sigma = 0.02;
        let plane = simple_normal_plane((200, 200), 0.0, sigma, 42);
        let estimate = estimate_noise(&plane.view());
        // MAD of |w| about its median underestimates sigma for Gaussian data
        assert!(estimate > 0.3 * sigma && estimate < 1.2 * sigma);
    }

    #[test]
    fn test_noise_scales_linearly() {
        let plane = simple_normal_plane((100, 100), 0.0, 1.0, 3);
        let scaled = plane.mapv(|v| v * 4.0);
        assert_relative_eq!(
            estimate_noise(&scaled.view()),
            4.0 * estimate_noise(&plane.view()),
            max_relative = 1e-5
        );
    }

    #[test]
    fn test_noise_of_constant_plane_is_zero() {
        let plane = Array2::from_elem((10, 10), 0.3f32);
        assert_eq!(estimate_noise(&plane.view()), 0.0);
    }

    #[test]
    fn test_soft_threshold() {
        let plane = array![[0.5f32, -0.5, 0.1], [-0.1, 0.0, 0.2]];
        let out = soft_threshold(plane, 0.2);
        let expected = array![[0.3f32, -0.3, 0.0], [0.0, 0.0, 0.0]];
        for (a, b) in out.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_zero_threshold_is_identity_except_zero() {
        let plane = array![[0.25f32, -0.75]];
        assert_eq!(soft_threshold(plane.clone(), 0.0), plane);
    }
}
