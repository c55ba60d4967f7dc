//! Deterministic synthetic inputs for tests and benchmarks.

use crate::buffer::RgbaBuffer;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Plane of normally distributed values from a seeded RNG.
///
/// # Panics
/// Panics if `std_dev` is negative or not finite.
pub fn simple_normal_plane(size: (usize, usize), mean: f32, std_dev: f32, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal_dist = Normal::new(mean, std_dev)
        .expect("Normal distribution parameters must be valid (std_dev >= 0)");
    Array2::from_shape_fn(size, |_| normal_dist.sample(&mut rng))
}

/// Linear-looking sky: dim noisy background, a faint colored nebula and a
/// sprinkling of Gaussian stars, with opaque alpha except for a transparent
/// top-left pixel.
///
/// # Panics
/// Panics if `width` or `height` is zero.
pub fn synthetic_star_field(width: usize, height: usize, seed: u64) -> RgbaBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let sky = simple_normal_plane((height, width), 0.04, 0.006, seed.wrapping_add(1));

    let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
    let nebula_radius = (width.min(height) as f32 * 0.35).max(1.0);

    let num_stars = (width * height / 150).max(3);
    let stars: Vec<(f32, f32, f32, f32)> = (0..num_stars)
        .map(|_| {
            (
                rng.gen_range(0.0..width as f32),
                rng.gen_range(0.0..height as f32),
                rng.gen_range(0.7..1.3),
                rng.gen_range(0.1..0.9),
            )
        })
        .collect();

    let mut data = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let (fx, fy) = (x as f32, y as f32);
            let r2 = ((fx - cx).powi(2) + (fy - cy).powi(2)) / nebula_radius.powi(2);
            let nebula = 0.08 * (-r2).exp();

            let star: f32 = stars
                .iter()
                .map(|&(sx, sy, sigma, peak)| {
                    let d2 = (fx - sx).powi(2) + (fy - sy).powi(2);
                    peak * (-d2 / (2.0 * sigma * sigma)).exp()
                })
                .sum();

            let base = sky[[y, x]] + star;
            let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            let alpha = if x == 0 && y == 0 { 0 } else { 255 };
            data.extend_from_slice(&[
                to_u8(base + nebula),
                to_u8(base + nebula * 0.3),
                to_u8(base + nebula * 0.6),
                alpha,
            ]);
        }
    }

    RgbaBuffer::new(width, height, data).expect("Synthetic field dimensions must be non-zero")
}
