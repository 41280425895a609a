//! CRC16 algorithms and the per-section CRC policy.
//!
//! Three algorithms are in use: the software CRC16 over dwords, the same CRC
//! over big-endian byte storage ("Image-CRC"), and a table-driven hardware
//! CRC that protects the HW pointer block.

mod algorithms;
mod policy;
mod verify;

pub use algorithms::*;
pub use policy::*;
pub use verify::*;

use mlxfw_layout::LayoutError;
use thiserror::Error;

/// CRC errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrcError {
    #[error("CRC mismatch in {section}: expected {expected:#06x}, found {actual:#06x}")]
    CrcMismatch {
        section: String,
        expected: u32,
        actual: u32,
    },
    #[error("data too short for {context}: need {expected} bytes, got {actual}")]
    DataTooShort {
        expected: usize,
        actual: usize,
        context: String,
    },
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

pub type Result<T> = std::result::Result<T, CrcError>;

/// The `data[offset..offset + length]` slice a CRC is taken over.
///
/// A zero `length` runs to the end of `data`.
pub fn crc_range(data: &[u8], offset: usize, length: usize) -> Result<&[u8]> {
    if offset > data.len() {
        return Err(CrcError::InvalidParameter {
            name: "offset".to_string(),
            reason: format!("{offset:#x} is past the end of {} bytes", data.len()),
        });
    }
    let end = if length == 0 {
        data.len()
    } else {
        offset.saturating_add(length)
    };
    if end > data.len() {
        return Err(CrcError::DataTooShort {
            expected: end,
            actual: data.len(),
            context: "CRC range".to_string(),
        });
    }
    Ok(&data[offset..end])
}

/// CRC of `data[offset..offset + length]` under `algorithm`.
pub fn crc_of(algorithm: CrcAlgorithm, data: &[u8], offset: usize, length: usize) -> Result<u16> {
    Ok(algorithm.compute(crc_range(data, offset, length)?))
}
