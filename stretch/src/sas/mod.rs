//! Starlet Arctan Stretch (SAS)
//!
//! Multiscale stretch: the luminance plane is split into starlet detail
//! planes, each plane is denoised (finest two only) and amplified with a
//! scale-dependent gain that is attenuated near bright structure, the
//! background residual is optionally flattened, and the recombined plane is
//! soft-clipped with an arctangent before the sky level is renormalized.

pub mod compress;
pub mod gain;
pub mod noise;
pub mod starlet;

pub use compress::{arctan_compress, flatten_background, normalize_background};
pub use gain::{compute_intensity_modulation, compute_scale_gain, get_scale_gains};
pub use noise::{estimate_noise, soft_threshold};
pub use starlet::{starlet_decompose, starlet_reconstruct, WaveletStack};

use crate::buffer::{extract_luminance, reconstruct_color, RgbaBuffer};
use crate::error::{ensure_in_range, StretchError};
use clap::ValueEnum;
use log::debug;
use ndarray::{Array2, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Parameters of the starlet arctan stretch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SasParams {
    /// Number of detail scales in the decomposition
    pub num_scales: usize,
    /// Sky level after normalization, also the arctan pivot
    pub background_target: f32,
    pub fine_scale_gain: f32,
    pub mid_scale_gain: f32,
    pub coarse_scale_gain: f32,
    /// Arctan steepness; larger values lift faint signal harder
    pub compression_alpha: f32,
    /// Strength of gain attenuation around bright structure
    pub highlight_protection: f32,
    /// Multiplier on the estimated noise sigma used for soft thresholding
    pub noise_threshold: f32,
    pub flatten_background: bool,
    pub preserve_color: bool,
}

impl SasParams {
    pub const NUM_SCALES_RANGE: RangeInclusive<usize> = 4..=8;
    pub const BACKGROUND_TARGET_RANGE: RangeInclusive<f64> = 0.05..=0.25;
    pub const FINE_SCALE_GAIN_RANGE: RangeInclusive<f64> = 0.5..=2.0;
    pub const MID_SCALE_GAIN_RANGE: RangeInclusive<f64> = 1.0..=5.0;
    pub const COARSE_SCALE_GAIN_RANGE: RangeInclusive<f64> = 1.0..=8.0;
    pub const COMPRESSION_ALPHA_RANGE: RangeInclusive<f64> = 1.0..=20.0;
    pub const HIGHLIGHT_PROTECTION_RANGE: RangeInclusive<f64> = 0.0..=1.0;
    pub const NOISE_THRESHOLD_RANGE: RangeInclusive<f64> = 0.0..=0.01;

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), StretchError> {
        if !Self::NUM_SCALES_RANGE.contains(&self.num_scales) {
            return Err(StretchError::ParameterOutOfRange {
                name: "numScales",
                value: self.num_scales as f64,
                min: *Self::NUM_SCALES_RANGE.start() as f64,
                max: *Self::NUM_SCALES_RANGE.end() as f64,
            });
        }

        let checks: [(&'static str, f32, RangeInclusive<f64>); 7] = [
            (
                "backgroundTarget",
                self.background_target,
                Self::BACKGROUND_TARGET_RANGE,
            ),
            (
                "fineScaleGain",
                self.fine_scale_gain,
                Self::FINE_SCALE_GAIN_RANGE,
            ),
            ("midScaleGain", self.mid_scale_gain, Self::MID_SCALE_GAIN_RANGE),
            (
                "coarseScaleGain",
                self.coarse_scale_gain,
                Self::COARSE_SCALE_GAIN_RANGE,
            ),
            (
                "compressionAlpha",
                self.compression_alpha,
                Self::COMPRESSION_ALPHA_RANGE,
            ),
            (
                "highlightProtection",
                self.highlight_protection,
                Self::HIGHLIGHT_PROTECTION_RANGE,
            ),
            (
                "noiseThreshold",
                self.noise_threshold,
                Self::NOISE_THRESHOLD_RANGE,
            ),
        ];
        for (name, value, range) in checks {
            ensure_in_range(name, value as f64, range)?;
        }
        Ok(())
    }
}

impl Default for SasParams {
    fn default() -> Self {
        Self {
            num_scales: 6,
            background_target: 0.12,
            fine_scale_gain: 0.8,
            mid_scale_gain: 2.5,
            coarse_scale_gain: 4.0,
            compression_alpha: 8.0,
            highlight_protection: 0.5,
            noise_threshold: 0.001,
            flatten_background: true,
            preserve_color: true,
        }
    }
}

/// Tuned parameter sets for common target classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum SasPreset {
    EmissionNebula,
    Galaxy,
    StarCluster,
    /// Large, faint targets such as IFN or supernova remnants
    FaintExtended,
}

impl SasPreset {
    pub fn params(&self) -> SasParams {
        let base = SasParams {
            flatten_background: true,
            preserve_color: true,
            ..SasParams::default()
        };
        match self {
            Self::EmissionNebula => SasParams {
                num_scales: 6,
                fine_scale_gain: 0.7,
                mid_scale_gain: 2.5,
                coarse_scale_gain: 5.0,
                compression_alpha: 10.0,
                highlight_protection: 0.5,
                background_target: 0.12,
                noise_threshold: 0.001,
                ..base
            },
            Self::Galaxy => SasParams {
                num_scales: 6,
                fine_scale_gain: 0.9,
                mid_scale_gain: 1.8,
                coarse_scale_gain: 3.0,
                compression_alpha: 6.0,
                highlight_protection: 0.7,
                background_target: 0.10,
                noise_threshold: 0.0005,
                ..base
            },
            Self::StarCluster => SasParams {
                num_scales: 5,
                fine_scale_gain: 1.2,
                mid_scale_gain: 1.5,
                coarse_scale_gain: 2.0,
                compression_alpha: 5.0,
                highlight_protection: 0.3,
                background_target: 0.08,
                noise_threshold: 0.001,
                ..base
            },
            Self::FaintExtended => SasParams {
                num_scales: 7,
                fine_scale_gain: 0.5,
                mid_scale_gain: 3.5,
                coarse_scale_gain: 7.0,
                compression_alpha: 15.0,
                highlight_protection: 0.6,
                background_target: 0.15,
                noise_threshold: 0.002,
                ..base
            },
        }
    }
}

/// Apply the starlet arctan stretch.
///
/// Parameters are assumed to be within their documented ranges; use
/// [`SasParams::validate`] or [`crate::apply_stretch`] at the boundary.
/// Alpha is passed through unchanged and dimensions are preserved.
pub fn apply_sas(image: &RgbaBuffer, params: &SasParams) -> RgbaBuffer {
    let luminance = extract_luminance(image);
    let stretched = stretch_luminance(&luminance, params);

    reconstruct_color(
        image,
        &luminance.view(),
        &stretched.view(),
        params.preserve_color,
    )
}

/// Wavelet stretch of a luminance plane, ending clamped to [0, 1].
fn stretch_luminance(luminance: &Array2<f32>, params: &SasParams) -> Array2<f32> {
    let stack = starlet_decompose(&luminance.view(), params.num_scales);

    let sigma = if stack.num_scales() > 0 {
        estimate_noise(&stack.detail(0))
    } else {
        0.0
    };
    let threshold = params.noise_threshold * sigma * noise::THRESHOLD_SIGMA_FACTOR;
    debug!("SAS noise sigma={sigma:.6} threshold={threshold:.6}");

    // Scales past the sigma cap share the last mask
    let masks: Vec<Array2<f32>> = if params.highlight_protection > 0.0 {
        (0..stack.num_scales().min(gain::DISTINCT_MODULATION_SCALES))
            .into_par_iter()
            .map(|scale| {
                compute_intensity_modulation(&luminance.view(), scale, params.highlight_protection)
            })
            .collect()
    } else {
        Vec::new()
    };

    let (details, residual) = stack.into_parts();
    let details: Vec<Array2<f32>> = details
        .into_iter()
        .enumerate()
        .map(|(scale, mut plane)| {
            if scale < noise::DENOISED_SCALES {
                plane = soft_threshold(plane, threshold);
            }

            let scale_gain = compute_scale_gain(scale as f32, params);
            match masks.get(scale).or_else(|| masks.last()) {
                Some(mask) => Zip::from(&mut plane)
                    .and(mask)
                    .for_each(|w, &m| *w *= scale_gain * m),
                None => plane *= scale_gain,
            }
            plane
        })
        .collect();

    let residual = if params.flatten_background {
        flatten_background(residual, params.background_target)
    } else {
        residual
    };

    let combined = starlet_reconstruct(&WaveletStack::from_parts(details, residual));
    let compressed = arctan_compress(combined, params.compression_alpha, params.background_target);
    normalize_background(compressed, params.background_target)
}
