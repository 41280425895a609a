//! Firmware image model for FS3/FS4/FS5 images.
//!
//! Section types, the packed structures found inside sections and TOCs, the
//! metadata sidecar written next to extracted sections, and the JSON
//! documents used to rebuild structured sections.

mod constants;
mod document;
pub mod encoding;
mod metadata;
mod section_type;
mod structs;

pub use constants::*;
pub use document::*;
pub use metadata::*;
pub use section_type::*;
pub use structs::*;

pub use mlxfw_layout::LayoutError;

use thiserror::Error;

/// Image model errors.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("data too short for {context}: need {expected} bytes, got {actual}")]
    DataTooShort {
        expected: usize,
        actual: usize,
        context: String,
    },
    #[error("invalid magic at {offset:#x}: expected {expected:#018x}, found {actual:#018x}")]
    InvalidMagic { expected: u64, actual: u64, offset: u64 },
    #[error("section {section_type} not found at {offset:#x}")]
    SectionNotFound { section_type: String, offset: u64 },
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("file too large: {size} bytes exceeds the {limit}-byte limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Check that `data` holds at least `expected` bytes.
pub fn ensure_len(data: &[u8], expected: usize, context: &str) -> Result<()> {
    if data.len() < expected {
        return Err(ImageError::DataTooShort {
            expected,
            actual: data.len(),
            context: context.to_string(),
        });
    }
    Ok(())
}

/// Read a big-endian dword.
#[inline]
pub fn read_be32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Write a big-endian dword.
#[inline]
pub fn write_be32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}
