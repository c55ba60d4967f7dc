//! Error types for the stretch engines and their boundary layer.
//!
//! The numeric core is total: histogram, transport, starlet and compression
//! routines always return a value. Errors only arise where untrusted input
//! enters the crate (pixel buffers, parameter records, parameter files, images
//! decoded by the command-line harness).

use std::ops::RangeInclusive;
use thiserror::Error;

/// Errors raised at the boundary of the stretch engines.
#[derive(Debug, Error)]
pub enum StretchError {
    /// Image has no pixels
    #[error("Image must have non-zero dimensions, got {width}x{height}")]
    EmptyImage { width: usize, height: usize },

    /// Width * height * 4 does not fit the address space or the image codec
    #[error("Image dimensions {width}x{height} are too large")]
    ImageTooLarge { width: usize, height: usize },

    /// Interleaved RGBA sample count does not match width * height * 4
    #[error("RGBA buffer holds {actual} samples but {expected} are required")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A parameter lies outside its documented range
    #[error("Parameter {name} = {value} is outside the allowed range [{min}, {max}]")]
    ParameterOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse parameter file: {0}")]
    ParamFile(#[from] serde_json::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// Check that `value` lies inside `range`, naming the offending parameter otherwise.
pub(crate) fn ensure_in_range(
    name: &'static str,
    value: f64,
    range: RangeInclusive<f64>,
) -> Result<(), StretchError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(StretchError::ParameterOutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
