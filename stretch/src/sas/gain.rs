//! Scale-dependent gain and halo-protection modulation.
//!
//! Gain ramps piecewise-linearly from the fine band (scales 0-1) through the
//! mid band to the coarse band (scale 5 and beyond). Near bright structure the
//! gain is attenuated by a mask derived from a blurred copy of the original
//! luminance, which suppresses ringing around stars.

use super::SasParams;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip};

/// Largest blur sigma used for modulation masks.
pub const MAX_MODULATION_SIGMA: f32 = 16.0;

/// Scales from this index on all blur at [`MAX_MODULATION_SIGMA`].
pub const DISTINCT_MODULATION_SCALES: usize = 4;

/// Lower bound of the modulation factor; gain is never fully removed.
pub const MIN_MODULATION: f32 = 0.2;

const SIGMOID_CENTER: f32 = 0.5;
const SIGMOID_STEEPNESS: f32 = 8.0;

/// Gain for a (possibly fractional) scale index.
///
/// - index ≤ 1: fine gain
/// - 1 < index ≤ 3: fine → mid with `t = (index - 1.5) / 2`
/// - 3 < index ≤ 5: mid → coarse with `t = (index - 3.5) / 2`
/// - index > 5: coarse gain
pub fn compute_scale_gain(index: f32, params: &SasParams) -> f32 {
    if index <= 1.0 {
        params.fine_scale_gain
    } else if index <= 3.0 {
        let t = (index - 1.5) / 2.0;
        (1.0 - t) * params.fine_scale_gain + t * params.mid_scale_gain
    } else if index <= 5.0 {
        let t = (index - 3.5) / 2.0;
        (1.0 - t) * params.mid_scale_gain + t * params.coarse_scale_gain
    } else {
        params.coarse_scale_gain
    }
}

/// Gains for every detail scale of a decomposition.
pub fn get_scale_gains(params: &SasParams) -> Vec<f32> {
    (0..params.num_scales)
        .map(|j| compute_scale_gain(j as f32, params))
        .collect()
}

/// Logistic curve centered at `center`.
pub fn sigmoid(x: f32, center: f32, steepness: f32) -> f32 {
    1.0 / (1.0 + (-steepness * (x - center)).exp())
}

/// Blur sigma of the modulation mask for a detail scale.
pub fn modulation_sigma(scale: usize) -> f32 {
    // 2^(scale + 1), capped before it can overflow the shift
    if scale >= DISTINCT_MODULATION_SCALES {
        MAX_MODULATION_SIGMA
    } else {
        ((1u32 << (scale + 1)) as f32).min(MAX_MODULATION_SIGMA)
    }
}

fn box_lane(input: ArrayView1<f32>, mut output: ArrayViewMut1<f32>, radius: usize) {
    let n = input.len();
    if n == 0 {
        return;
    }
    let last = n as isize - 1;
    let radius = radius as isize;
    let count = (2 * radius + 1) as f32;

    for i in 0..n {
        let mut sum = 0.0;
        for d in -radius..=radius {
            sum += input[(i as isize + d).clamp(0, last) as usize];
        }
        output[i] = sum / count;
    }
}

/// Box-filter approximation of a Gaussian blur with clamp-to-edge borders.
///
/// The window is a `(2r + 1)²` square with `r = ceil(2 * sigma)`, applied as a
/// horizontal and then a vertical running mean. Because clamped indices factor
/// per axis, this equals the direct 2-D window mean.
pub fn box_blur(plane: &ArrayView2<f32>, sigma: f32) -> Array2<f32> {
    let radius = (sigma * 2.0).ceil().max(0.0) as usize;

    let mut horizontal = Array2::<f32>::zeros(plane.dim());
    Zip::from(horizontal.rows_mut())
        .and(plane.rows())
        .par_for_each(|out, row| box_lane(row, out, radius));

    let mut blurred = Array2::<f32>::zeros(plane.dim());
    Zip::from(blurred.columns_mut())
        .and(horizontal.columns())
        .par_for_each(|out, col| box_lane(col, out, radius));

    blurred
}

/// Halo-protection mask for one detail scale.
///
/// `max(1 - strength * sigmoid(blurred), 0.2)` where `blurred` is the original
/// luminance smoothed at [`modulation_sigma`] for the scale.
pub fn compute_intensity_modulation(
    luminance: &ArrayView2<f32>,
    scale: usize,
    strength: f32,
) -> Array2<f32> {
    let smoothed = box_blur(luminance, modulation_sigma(scale));
    smoothed.mapv(|intensity| {
        let s = sigmoid(intensity, SIGMOID_CENTER, SIGMOID_STEEPNESS);
        (1.0 - strength * s).max(MIN_MODULATION)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn params() -> SasParams {
        SasParams {
            fine_scale_gain: 0.8,
            mid_scale_gain: 2.5,
            coarse_scale_gain: 4.0,
            ..SasParams::default()
        }
    }

    #[test]
    fn test_gain_bands() {
        let p = params();
        assert_eq!(compute_scale_gain(0.0, &p), 0.8);
        assert_eq!(compute_scale_gain(1.0, &p), 0.8);
        assert_relative_eq!(compute_scale_gain(2.0, &p), 0.75 * 0.8 + 0.25 * 2.5);
        assert_relative_eq!(compute_scale_gain(5.0, &p), 0.25 * 2.5 + 0.75 * 4.0);
        assert_eq!(compute_scale_gain(6.0, &p), 4.0);
        assert_eq!(compute_scale_gain(7.0, &p), 4.0);
    }

    #[test]
    fn test_gain_continuity_at_band_starts() {
        let p = params();
        assert_relative_eq!(compute_scale_gain(1.5, &p), p.fine_scale_gain);
        assert_relative_eq!(compute_scale_gain(3.5, &p), p.mid_scale_gain);
    }

    #[test]
    fn test_get_scale_gains_length() {
        let p = SasParams {
            num_scales: 7,
            ..params()
        };
        let gains = get_scale_gains(&p);
        assert_eq!(gains.len(), 7);
        assert_eq!(gains[6], p.coarse_scale_gain);
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.5, 0.5, 8.0), 0.5);
        assert!(sigmoid(1.0, 0.5, 8.0) > 0.98);
        assert!(sigmoid(0.0, 0.5, 8.0) < 0.02);
    }

    #[test]
    fn test_modulation_sigma_caps() {
        assert_eq!(modulation_sigma(0), 2.0);
        assert_eq!(modulation_sigma(2), 8.0);
        assert_eq!(modulation_sigma(3), 16.0);
        assert_eq!(modulation_sigma(7), 16.0);
        assert_eq!(
            modulation_sigma(DISTINCT_MODULATION_SCALES - 1),
            MAX_MODULATION_SIGMA
        );
    }

    #[test]
    fn test_box_blur_matches_direct_window() {
        let plane = array![
            [0.0f32, 1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0, 7.0],
            [8.0, 9.0, 10.0, 11.0]
        ];
        let blurred = box_blur(&plane.view(), 0.5);
        // radius 1 around the corner (0, 0) with clamping
        let direct: f32 = [
            (0, 0), (0, 0), (0, 1),
            (0, 0), (0, 0), (0, 1),
            (1, 0), (1, 0), (1, 1),
        ]
        .iter()
        .map(|&(y, x)| plane[[y, x]])
        .sum::<f32>()
            / 9.0;
        assert_relative_eq!(blurred[[0, 0]], direct, epsilon = 1e-6);
    }

    #[test]
    fn test_modulation_floor_and_dark_regions() {
        let bright = Array2::from_elem((8, 8), 1.0f32);
        let mask = compute_intensity_modulation(&bright.view(), 0, 1.0);
        assert!(mask.iter().all(|&m| (m - MIN_MODULATION).abs() < 1e-6));

        let dark = Array2::zeros((8, 8));
        let mask = compute_intensity_modulation(&dark.view(), 2, 0.5);
        let expected = 1.0 - 0.5 * sigmoid(0.0, 0.5, 8.0);
        assert!(mask.iter().all(|&m| (m - expected).abs() < 1e-6));
    }
}
