//! Algorithm selection and validated dispatch to the two engines.

use crate::buffer::RgbaBuffer;
use crate::error::StretchError;
use crate::ots::{apply_ots, OtsParams};
use crate::sas::{apply_sas, SasParams};
use clap::ValueEnum;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stretch engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum StretchAlgorithm {
    /// Optimal transport histogram matching
    Ots,
    /// Starlet wavelet gain with arctan compression
    Sas,
}

impl fmt::Display for StretchAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ots => f.write_str("ots"),
            Self::Sas => f.write_str("sas"),
        }
    }
}

/// Parameter record for either engine, tagged by algorithm when serialized:
///
/// ```json
/// { "algorithm": "sas", "numScales": 6, "compressionAlpha": 8.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "camelCase")]
pub enum StretchParams {
    Ots(OtsParams),
    Sas(SasParams),
}

impl StretchParams {
    pub fn algorithm(&self) -> StretchAlgorithm {
        match self {
            Self::Ots(_) => StretchAlgorithm::Ots,
            Self::Sas(_) => StretchAlgorithm::Sas,
        }
    }

    /// Default parameters for an algorithm.
    pub fn default_for(algorithm: StretchAlgorithm) -> Self {
        match algorithm {
            StretchAlgorithm::Ots => Self::Ots(OtsParams::default()),
            StretchAlgorithm::Sas => Self::Sas(SasParams::default()),
        }
    }

    pub fn validate(&self) -> Result<(), StretchError> {
        match self {
            Self::Ots(p) => p.validate(),
            Self::Sas(p) => p.validate(),
        }
    }
}

impl From<OtsParams> for StretchParams {
    fn from(params: OtsParams) -> Self {
        Self::Ots(params)
    }
}

impl From<SasParams> for StretchParams {
    fn from(params: SasParams) -> Self {
        Self::Sas(params)
    }
}

/// Validate `params` and run the selected engine.
///
/// # Errors
/// Returns `StretchError::ParameterOutOfRange` for the first parameter outside
/// its documented range; the image is not touched in that case.
pub fn apply_stretch(image: &RgbaBuffer, params: &StretchParams) -> Result<RgbaBuffer, StretchError> {
    params.validate()?;
    info!(
        "Applying {} stretch to {}x{} image",
        params.algorithm(),
        image.width(),
        image.height()
    );

    Ok(match params {
        StretchParams::Ots(p) => apply_ots(image, p),
        StretchParams::Sas(p) => apply_sas(image, p),
    })
}
