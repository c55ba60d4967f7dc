//! One-dimensional optimal transport between luminance distributions.
//!
//! For monotone 1-D distributions the optimal transport plan is the
//! quantile-to-quantile map: each source bin is sent to the target luminance
//! with the same cumulative probability. The resulting map is then pulled
//! toward identity in the highlights and globally by the stretch intensity.

use super::OtsParams;
use crate::histogram::{bin_index, inverse_cdf};
use ndarray::{Array1, ArrayView1};

/// Cubic Hermite step between `edge0` and `edge1`, clamped to [0, 1].
pub fn smoothstep(x: f32, edge0: f32, edge1: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation from `a` (t = 0) to `b` (t = 1).
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Start and end of the tonal range where highlight protection ramps in.
pub const HIGHLIGHT_RAMP: (f32, f32) = (0.7, 0.95);

/// Lookup table from source luminance bin to stretched luminance.
///
/// Built once per image and applied per pixel by bin lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportMap {
    values: Array1<f32>,
}

impl TransportMap {
    /// Identity map with `bins` entries.
    pub fn identity(bins: usize) -> Self {
        let last = bins.saturating_sub(1).max(1) as f32;
        Self {
            values: Array1::from_shape_fn(bins, |i| i as f32 / last),
        }
    }

    pub fn values(&self) -> ArrayView1<'_, f32> {
        self.values.view()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mapped luminance for a normalized source luminance.
    ///
    /// Uses the same `floor(lum * bins)` binning as the source histogram.
    pub fn lookup(&self, luminance: f32) -> f32 {
        self.values[bin_index(luminance, self.values.len())]
    }

    /// Absolute difference from the identity map at every bin.
    pub fn deviation_from_identity(&self) -> Array1<f32> {
        let identity = Self::identity(self.len());
        (&self.values - &identity.values).mapv(f32::abs)
    }
}

impl From<TransportMap> for Vec<f32> {
    fn from(map: TransportMap) -> Self {
        map.values.to_vec()
    }
}

/// Build the transport map from a source CDF onto a target CDF.
///
/// For every source bin `i` the raw map is `inverse_cdf(target, source[i])`.
/// Two blends follow, both against the identity `x = i / (bins - 1)`:
/// 1. highlight protection, weighted by `smoothstep(x, 0.7, 0.95) * protect_highlights`
/// 2. stretch intensity, where 0 yields identity and 1 the full transport
pub fn compute_transport_map(
    source_cdf: &ArrayView1<f32>,
    target_cdf: &ArrayView1<f32>,
    params: &OtsParams,
) -> TransportMap {
    let bins = source_cdf.len();
    let last = bins.saturating_sub(1).max(1) as f32;

    let values = Array1::from_shape_fn(bins, |i| {
        let x = i as f32 / last;
        let mut mapped = inverse_cdf(target_cdf, source_cdf[i]);

        if params.protect_highlights > 0.0 {
            let blend =
                smoothstep(x, HIGHLIGHT_RAMP.0, HIGHLIGHT_RAMP.1) * params.protect_highlights;
            mapped = lerp(mapped, x, blend);
        }

        lerp(x, mapped, params.stretch_intensity)
    });

    TransportMap { values }
}
