//! Optimal Transport Stretch (OTS)
//!
//! Reshapes an image's luminance histogram to match a parametric target
//! distribution chosen per object type. The 1-D transport map is built once
//! from the source and target CDFs and then applied to every pixel as a
//! lookup table.
//!
//! # Pipeline
//!
//! 1. Extract BT.709 luminance
//! 2. Build the 256-bin source histogram and CDF
//! 3. Synthesize the target CDF for the object type and background level
//! 4. Compute the transport map (quantile matching, highlight protection,
//!    stretch intensity)
//! 5. Look up each pixel's new luminance and rebuild color

pub mod target;
pub mod transport;

pub use target::generate_target_cdf;
pub use transport::{compute_transport_map, TransportMap};

use crate::buffer::{extract_luminance, reconstruct_color, RgbaBuffer};
use crate::error::{ensure_in_range, StretchError};
use crate::histogram::{compute_histogram, histogram_to_cdf, HISTOGRAM_BINS};
use clap::ValueEnum;
use log::{debug, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::RangeInclusive;

/// Kind of astronomical target, selecting the shape of the target distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ObjectType {
    /// Emission/reflection nebula: sky peak, broad body, faint highlight tail
    #[default]
    Nebula,
    /// Galaxy: tighter sky peak, symmetric disk, bright core band
    Galaxy,
    /// Star cluster: darker sky, wide stellar body, compact highlights
    StarCluster,
    /// Dark nebula: emphasis on tones just around the background
    DarkNebula,
    /// Uniform target (plain histogram equalization); unrecognized names
    /// deserialize to this variant
    #[serde(other)]
    Custom,
}

impl ObjectType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nebula => "nebula",
            Self::Galaxy => "galaxy",
            Self::StarCluster => "starCluster",
            Self::DarkNebula => "darkNebula",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of the optimal transport stretch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtsParams {
    pub object_type: ObjectType,
    /// Desired sky level after stretching
    pub background_target: f32,
    /// 0 leaves the image untouched, 1 applies the full transport
    pub stretch_intensity: f32,
    /// Strength of the pull toward identity in the top tonal range
    pub protect_highlights: f32,
    pub preserve_color: bool,
}

impl OtsParams {
    pub const BACKGROUND_TARGET_RANGE: RangeInclusive<f64> = 0.05..=0.30;
    pub const STRETCH_INTENSITY_RANGE: RangeInclusive<f64> = 0.0..=1.0;
    pub const PROTECT_HIGHLIGHTS_RANGE: RangeInclusive<f64> = 0.0..=1.0;

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<(), StretchError> {
        ensure_in_range(
            "backgroundTarget",
            self.background_target as f64,
            Self::BACKGROUND_TARGET_RANGE,
        )?;
        ensure_in_range(
            "stretchIntensity",
            self.stretch_intensity as f64,
            Self::STRETCH_INTENSITY_RANGE,
        )?;
        ensure_in_range(
            "protectHighlights",
            self.protect_highlights as f64,
            Self::PROTECT_HIGHLIGHTS_RANGE,
        )
    }
}

impl Default for OtsParams {
    fn default() -> Self {
        Self {
            object_type: ObjectType::Nebula,
            background_target: 0.15,
            stretch_intensity: 0.75,
            protect_highlights: 0.3,
            preserve_color: true,
        }
    }
}

/// Histograms reported to display collaborators.
///
/// Serializes each histogram as a plain JSON array of bin counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramData {
    /// Luminance histogram of the input image
    #[serde(serialize_with = "serialize_bins")]
    pub source: Array1<f32>,
    /// Histogram of a stretched result, when one has been computed
    #[serde(serialize_with = "serialize_optional_bins")]
    pub stretched: Option<Array1<f32>>,
}

fn serialize_bins<S: Serializer>(bins: &Array1<f32>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(bins.iter())
}

fn serialize_optional_bins<S: Serializer>(
    bins: &Option<Array1<f32>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bins {
        Some(bins) => serializer.serialize_some(&bins.to_vec()),
        None => serializer.serialize_none(),
    }
}

/// Apply the optimal transport stretch.
///
/// Parameters are assumed to be within their documented ranges; use
/// [`OtsParams::validate`] or [`crate::apply_stretch`] at the boundary.
/// Alpha is passed through unchanged and dimensions are preserved.
pub fn apply_ots(image: &RgbaBuffer, params: &OtsParams) -> RgbaBuffer {
    let luminance = extract_luminance(image);

    let source_hist = compute_histogram(&luminance.view(), HISTOGRAM_BINS);
    let source_cdf = histogram_to_cdf(&source_hist.view());
    if source_cdf[HISTOGRAM_BINS - 1] == 0.0 {
        warn!("Source histogram is empty; transport map degenerates");
    }

    let target_cdf =
        generate_target_cdf(params.object_type, params.background_target, HISTOGRAM_BINS);
    let transport = compute_transport_map(&source_cdf.view(), &target_cdf.view(), params);
    debug!(
        "OTS {}: map[0]={:.4} map[128]={:.4} map[255]={:.4}",
        params.object_type,
        transport.values()[0],
        transport.values()[HISTOGRAM_BINS / 2],
        transport.values()[HISTOGRAM_BINS - 1]
    );

    let stretched = luminance.mapv(|lum| transport.lookup(lum));
    reconstruct_color(
        image,
        &luminance.view(),
        &stretched.view(),
        params.preserve_color,
    )
}

/// Luminance histogram of an image for display.
pub fn get_histogram_data(image: &RgbaBuffer) -> HistogramData {
    let luminance = extract_luminance(image);
    HistogramData {
        source: compute_histogram(&luminance.view(), HISTOGRAM_BINS),
        stretched: None,
    }
}
