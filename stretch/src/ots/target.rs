//! Parametric target luminance distributions for histogram transport.
//!
//! Each object type describes how a well-stretched image of that kind of
//! target tends to distribute its brightness: a narrow sky peak near the
//! background target, broad Beta-shaped bodies for nebulosity or galactic
//! structure, and for some types a flat band of bright detail. The density is
//! sampled on a regular grid, normalized, and integrated into a CDF.

use super::ObjectType;
use ndarray::Array1;
use std::f64::consts::PI;

/// Lanczos approximation coefficients (g = 7, n = 9).
const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

fn lanczos(z: f64) -> f64 {
    let z = z - 1.0;
    let mut x = LANCZOS_COEFFS[0];
    for (i, &c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += c / (z + i as f64);
    }
    let t = z + LANCZOS_G + 0.5;
    (2.0 * PI).sqrt() * t.powf(z + 0.5) * (-t).exp() * x
}

/// Gamma function via the Lanczos approximation.
///
/// Arguments below 0.5 use a single application of the reflection formula
/// `Γ(z)Γ(1-z) = π / sin(πz)`, so evaluation never recurses.
pub fn gamma(z: f64) -> f64 {
    if z < 0.5 {
        PI / ((PI * z).sin() * lanczos(1.0 - z))
    } else {
        lanczos(z)
    }
}

/// Beta distribution density on the open interval (0, 1); zero elsewhere.
pub fn beta_pdf(x: f64, alpha: f64, beta: f64) -> f64 {
    if x <= 0.0 || x >= 1.0 {
        return 0.0;
    }
    let norm = gamma(alpha) * gamma(beta) / gamma(alpha + beta);
    x.powf(alpha - 1.0) * (1.0 - x).powf(beta - 1.0) / norm
}

/// Normal distribution density.
pub fn gaussian_pdf(x: f64, mean: f64, sigma: f64) -> f64 {
    let coef = 1.0 / (sigma * (2.0 * PI).sqrt());
    coef * (-0.5 * ((x - mean) / sigma).powi(2)).exp()
}

/// Beta density stretched over `[low, high]`; zero outside or for an empty range.
pub fn scaled_beta_pdf(x: f64, alpha: f64, beta: f64, low: f64, high: f64) -> f64 {
    if high <= low || x < low || x > high {
        return 0.0;
    }
    let width = high - low;
    beta_pdf((x - low) / width, alpha, beta) / width
}

fn uniform_band(x: f64, low: f64, high: f64, weight: f64) -> f64 {
    if (low..=high).contains(&x) {
        weight / (high - low)
    } else {
        0.0
    }
}

/// Unnormalized target density for an object type at normalized luminance `x`.
pub fn target_density(object_type: ObjectType, background_target: f64, x: f64) -> f64 {
    let bg = background_target;
    match object_type {
        ObjectType::Nebula => {
            0.3 * gaussian_pdf(x, bg, 0.03)
                + 0.5 * scaled_beta_pdf(x, 2.0, 3.0, bg, 0.7)
                + 0.2 * scaled_beta_pdf(x, 1.5, 4.0, 0.6, 0.95)
        }
        ObjectType::Galaxy => {
            0.25 * gaussian_pdf(x, bg, 0.025)
                + 0.35 * scaled_beta_pdf(x, 2.5, 2.5, bg, 0.5)
                + 0.25 * scaled_beta_pdf(x, 3.0, 2.0, 0.4, 0.75)
                + uniform_band(x, 0.7, 0.9, 0.15)
        }
        ObjectType::StarCluster => {
            0.20 * gaussian_pdf(x, bg * 0.8, 0.02)
                + 0.50 * scaled_beta_pdf(x, 1.5, 2.0, 0.15, 0.70)
                + 0.30 * scaled_beta_pdf(x, 2.0, 5.0, 0.60, 0.95)
        }
        ObjectType::DarkNebula => {
            0.15 * gaussian_pdf(x, bg * 1.3, 0.04)
                + 0.40 * scaled_beta_pdf(x, 3.0, 2.0, 0.05, bg)
                + 0.30 * scaled_beta_pdf(x, 2.0, 2.5, bg, 0.55)
                + uniform_band(x, 0.5, 0.85, 0.15)
        }
        ObjectType::Custom => 1.0,
    }
}

/// Synthesize the target CDF for an object type.
///
/// The density is sampled at `i / (resolution - 1)`, normalized to sum to one,
/// accumulated, and renormalized so the last entry is exactly 1.
///
/// # Panics
/// Panics if `resolution < 2`.
pub fn generate_target_cdf(
    object_type: ObjectType,
    background_target: f32,
    resolution: usize,
) -> Array1<f32> {
    assert!(resolution >= 2, "Target CDF needs at least two samples");

    let bg = background_target as f64;
    let last = (resolution - 1) as f64;
    let pdf: Vec<f64> = (0..resolution)
        .map(|i| target_density(object_type, bg, i as f64 / last))
        .collect();

    let total: f64 = pdf.iter().sum();
    let mut running = 0.0;
    let mut cdf: Vec<f64> = pdf
        .iter()
        .map(|&p| {
            running += if total > 0.0 { p / total } else { 0.0 };
            running
        })
        .collect();

    let end = cdf[resolution - 1];
    if end > 0.0 {
        cdf.iter_mut().for_each(|c| *c /= end);
    }

    cdf.into_iter().map(|c| c as f32).collect()
}
