//! Starlet (isotropic undecimated à trous) wavelet transform.
//!
//! Each scale smooths the previous approximation with the separable B3-spline
//! kernel `[1, 4, 6, 4, 1] / 16`, dilated so taps sit `2^scale` pixels apart.
//! Detail planes are differences between successive approximations and every
//! plane stays at full resolution. Borders use clamp-to-edge indexing.
//!
//! Rows and columns are filtered in parallel with rayon; each output sample
//! is a fixed-order five-tap sum so results do not depend on thread count.

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip};

/// Normalized B3-spline taps.
pub const B3_SPLINE: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Detail planes (finest first) followed by the residual approximation.
///
/// Summing every plane element-wise reproduces the decomposed image.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletStack {
    details: Vec<Array2<f32>>,
    residual: Array2<f32>,
}

impl WaveletStack {
    /// Assemble a stack from processed planes.
    ///
    /// # Panics
    /// Panics if any detail plane's shape differs from the residual's.
    pub fn from_parts(details: Vec<Array2<f32>>, residual: Array2<f32>) -> Self {
        assert!(
            details.iter().all(|d| d.dim() == residual.dim()),
            "All wavelet planes must share one shape"
        );
        Self { details, residual }
    }

    /// Split into detail planes and residual, handing ownership to the caller.
    pub fn into_parts(self) -> (Vec<Array2<f32>>, Array2<f32>) {
        (self.details, self.residual)
    }

    /// Number of detail scales.
    pub fn num_scales(&self) -> usize {
        self.details.len()
    }

    /// Plane shape as (height, width).
    pub fn dim(&self) -> (usize, usize) {
        self.residual.dim()
    }

    pub fn detail(&self, scale: usize) -> ArrayView2<'_, f32> {
        self.details[scale].view()
    }

    pub fn details(&self) -> &[Array2<f32>] {
        &self.details
    }

    pub fn residual(&self) -> ArrayView2<'_, f32> {
        self.residual.view()
    }

    /// All planes in order: details from finest to coarsest, then the residual.
    pub fn planes(&self) -> impl Iterator<Item = ArrayView2<'_, f32>> {
        self.details
            .iter()
            .map(|d| d.view())
            .chain(std::iter::once(self.residual.view()))
    }
}

fn convolve_lane(input: ArrayView1<f32>, mut output: ArrayViewMut1<f32>, spacing: usize) {
    let n = input.len();
    if n == 0 {
        return;
    }
    let last = n as isize - 1;
    let spacing = spacing as isize;

    for i in 0..n {
        let mut sum = 0.0;
        for (k, &weight) in B3_SPLINE.iter().enumerate() {
            let idx = (i as isize + (k as isize - 2) * spacing).clamp(0, last) as usize;
            sum += weight * input[idx];
        }
        output[i] = sum;
    }
}

/// Smooth a plane with the B3-spline kernel dilated for `scale`.
pub fn b3_smooth(plane: &ArrayView2<f32>, scale: usize) -> Array2<f32> {
    let spacing = 1usize << scale;

    let mut horizontal = Array2::<f32>::zeros(plane.dim());
    Zip::from(horizontal.rows_mut())
        .and(plane.rows())
        .par_for_each(|out, row| convolve_lane(row, out, spacing));

    let mut smoothed = Array2::<f32>::zeros(plane.dim());
    Zip::from(smoothed.columns_mut())
        .and(horizontal.columns())
        .par_for_each(|out, col| convolve_lane(col, out, spacing));

    smoothed
}

/// Decompose a plane into `num_scales` detail planes plus a residual.
pub fn starlet_decompose(plane: &ArrayView2<f32>, num_scales: usize) -> WaveletStack {
    let mut current = plane.to_owned();
    let mut details = Vec::with_capacity(num_scales);

    for scale in 0..num_scales {
        let smooth = b3_smooth(&current.view(), scale);
        details.push(&current - &smooth);
        current = smooth;
    }

    WaveletStack {
        details,
        residual: current,
    }
}

/// Element-wise sum of every plane in the stack.
pub fn starlet_reconstruct(stack: &WaveletStack) -> Array2<f32> {
    let mut output = Array2::<f32>::zeros(stack.dim());
    for plane in stack.planes() {
        output += &plane;
    }
    output
}
