//! JSON parameter files.
//!
//! A parameter file holds one [`StretchParams`] record tagged by algorithm.
//! Fields left out of the file take their documented defaults, and every
//! loaded record is range-checked before it is returned.

use crate::error::StretchError;
use crate::stretch::StretchParams;
use log::debug;
use std::path::Path;

/// Load and validate a parameter record.
pub fn load_params(path: &Path) -> Result<StretchParams, StretchError> {
    let json = std::fs::read_to_string(path)?;
    let params: StretchParams = serde_json::from_str(&json)?;
    params.validate()?;
    debug!("Loaded {} parameters from {}", params.algorithm(), path.display());
    Ok(params)
}

/// Save a parameter record as pretty-printed JSON.
pub fn save_params(params: &StretchParams, path: &Path) -> Result<(), StretchError> {
    let json = serde_json::to_string_pretty(params)?;
    std::fs::write(path, json)?;
    Ok(())
}
