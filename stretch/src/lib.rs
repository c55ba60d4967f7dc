//! Tone-mapping engines for linear astronomical images.
//!
//! Two alternative stretches turn a linear RGBA image into a display image
//! that reveals faint structure while keeping bright cores under control:
//!
//! - [`ots`]: Optimal Transport Stretch, matching the luminance histogram to a
//!   target distribution chosen per object type
//! - [`sas`]: Starlet Arctan Stretch, amplifying wavelet scales with halo
//!   protection and soft-clipping the result with an arctangent
//!
//! Both engines work on BT.709 luminance and rebuild color afterwards. Alpha
//! and image dimensions are always preserved. [`apply_stretch`] validates a
//! parameter record and dispatches to the selected engine.

pub mod buffer;
pub mod config;
pub mod error;
pub mod histogram;
pub mod ots;
pub mod sas;
pub mod stretch;
pub mod test_util;

pub use buffer::RgbaBuffer;
pub use error::StretchError;
pub use ots::{apply_ots, get_histogram_data, HistogramData, ObjectType, OtsParams};
pub use sas::{apply_sas, get_scale_gains, SasParams, SasPreset};
pub use stretch::{apply_stretch, StretchAlgorithm, StretchParams};
