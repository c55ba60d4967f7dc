//! Tone shaping applied around the wavelet reconstruction: residual flattening,
//! arctan highlight compression and sky-level normalization.

use ndarray::Array2;
use std::cmp::Ordering;
use std::f32::consts::FRAC_2_PI;

/// Weight of the residual kept when flattening the large-scale background.
pub const RESIDUAL_KEEP: f32 = 0.2;

/// Weight of the background target blended into the flattened residual.
pub const BACKGROUND_BLEND: f32 = 0.8;

/// Fraction of sorted pixels below the sky estimate.
pub const SKY_PERCENTILE: f32 = 0.05;

/// Replace most of the residual with a constant pedestal at half the background
/// target.
pub fn flatten_background(mut residual: Array2<f32>, background_target: f32) -> Array2<f32> {
    let pedestal = background_target * 0.5 * BACKGROUND_BLEND;
    residual.mapv_inplace(|v| v * RESIDUAL_KEEP + pedestal);
    residual
}

/// Soft-clip values above `pivot` with an arctangent.
///
/// Values at or below the pivot are untouched. Above it,
///
/// `out = pivot + (1 - pivot) * (2 / pi) * atan(alpha * (v - pivot) / (1 - pivot))`
///
/// which is continuous at the pivot and approaches 1 asymptotically, so every
/// output stays in `[pivot, 1)`. A pivot of 1 or more leaves the plane
/// unchanged.
pub fn arctan_compress(mut plane: Array2<f32>, alpha: f32, pivot: f32) -> Array2<f32> {
    if pivot >= 1.0 {
        return plane;
    }
    let range = 1.0 - pivot;

    plane.mapv_inplace(|v| {
        if v <= pivot {
            v
        } else {
            let normalized = (v - pivot) / range;
            pivot + range * FRAC_2_PI * (alpha * normalized).atan()
        }
    });
    plane
}

/// Value at the 5th percentile: `sorted[floor(len * 0.05)]`.
pub fn sky_level(plane: &Array2<f32>) -> Option<f32> {
    if plane.is_empty() {
        return None;
    }
    let mut values: Vec<f32> = plane.iter().copied().collect();
    let idx = ((values.len() as f32 * SKY_PERCENTILE).floor() as usize).min(values.len() - 1);
    let (_, sky, _) =
        values.select_nth_unstable_by(idx, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Some(*sky)
}

/// Move the sky level onto `target` and clamp the result to [0, 1].
///
/// Values up to the sky level scale linearly by `target / sky`; values above it
/// map linearly from `(sky, 1]` onto `(target, 1]`. Nothing is remapped when
/// the sky is non-positive, already equals the target or sits at 1.
pub fn normalize_background(mut plane: Array2<f32>, target: f32) -> Array2<f32> {
    if let Some(sky) = sky_level(&plane) {
        if sky > 0.0 && sky < 1.0 && sky != target {
            let low_scale = target / sky;
            let high_scale = (1.0 - target) / (1.0 - sky);
            plane.mapv_inplace(|v| {
                if v <= sky {
                    v * low_scale
                } else {
                    target + (v - sky) * high_scale
                }
            });
        }
    }
    plane.mapv_inplace(|v| v.clamp(0.0, 1.0));
    plane
}
