//! mlxfw - Mellanox FS3/FS4/FS5 firmware image tool
//!
//! Declarative binary layouts, the firmware CRC16 family, and reassembly of
//! byte-exact images from an extract directory.
//!
//! # Example
//!
//! ```ignore
//! use mlxfw::{ReassembleOptions, reassemble, write_output};
//!
//! let outcome = reassemble("extracted/".as_ref(), &ReassembleOptions::default())?;
//! write_output("fw.bin".as_ref(), &outcome.image)?;
//! ```

pub use mlxfw_crc as crc;
pub use mlxfw_image as image;
pub use mlxfw_layout as layout;
pub use mlxfw_reassemble as reassembly;

pub use mlxfw_crc::{CrcAlgorithm, CrcError};
pub use mlxfw_image::{FirmwareFormat, FirmwareMetadata, ImageError, SectionDocument, SectionType};
pub use mlxfw_layout::{Layout, LayoutError};
pub use mlxfw_reassemble::{
    DEFAULT_SIZE_LIMIT, ExtractDir, ReassembleError, ReassembleOptions, ReassembleOutcome,
    reassemble, write_output,
};

use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Errors from any layer of the tool.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Crc(#[from] CrcError),
    #[error(transparent)]
    Reassemble(#[from] ReassembleError),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// CRC flavours exposed on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Checksum {
    /// Software CRC16 over host-order dwords.
    Software,
    /// Software CRC16 over big-endian dwords, as stored in images.
    Image,
    /// HW pointer CRC.
    Hardware,
}

/// Read a whole file, refusing anything over [`DEFAULT_SIZE_LIMIT`].
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    let io = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = std::fs::metadata(path).map_err(io)?.len();
    if size > DEFAULT_SIZE_LIMIT {
        return Err(ImageError::FileTooLarge {
            size,
            limit: DEFAULT_SIZE_LIMIT,
        }
        .into());
    }
    std::fs::read(path).map_err(io)
}

/// CRC of `data[offset..offset + length]`; a zero `length` runs to the end.
pub fn checksum(kind: Checksum, data: &[u8], offset: usize, length: usize) -> Result<u16> {
    let range = mlxfw_crc::crc_range(data, offset, length)?;
    let crc = match kind {
        Checksum::Software => mlxfw_crc::software_crc16_host(range),
        Checksum::Image => mlxfw_crc::crc_of(CrcAlgorithm::Software, data, offset, length)?,
        Checksum::Hardware => mlxfw_crc::crc_of(CrcAlgorithm::Hardware, data, offset, length)?,
    };
    debug!(?kind, offset, len = range.len(), crc = format_args!("{crc:#06x}"), "checksum");
    Ok(crc)
}

/// Decode a section payload into its JSON document.
pub fn decode_section(section_type: SectionType, payload: &[u8]) -> Result<String> {
    let doc = SectionDocument::from_payload(section_type, payload)?.ok_or_else(|| {
        ImageError::NotSupported(format!("no structured layout for {section_type}"))
    })?;
    if doc.has_raw_data() {
        debug!(section = %section_type, "payload does not re-encode byte for byte");
    }
    Ok(doc.to_json()?)
}

/// Verify the BOOT2 CRC of the blob starting at `offset`.
pub fn verify_boot2_at(data: &[u8], offset: usize) -> Result<u16> {
    let blob = data.get(offset..).ok_or_else(|| CrcError::InvalidParameter {
        name: "offset".to_string(),
        reason: format!("{offset:#x} is past the end of {} bytes", data.len()),
    })?;
    Ok(mlxfw_crc::verify_boot2(blob)?)
}

/// What an extract directory holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSummary {
    pub format: FirmwareFormat,
    pub original_size: u64,
    pub is_encrypted: bool,
    pub sections: usize,
    pub gaps: usize,
    /// `major.minor.subminor` from IMAGE_INFO, when its binary is present.
    pub fw_version: Option<String>,
}

fn image_info_version(dir: &ExtractDir) -> Option<String> {
    let record = dir
        .metadata()
        .sections
        .iter()
        .find(|s| s.section_type == SectionType::IMAGE_INFO && s.size > 0)?;
    let path = dir.binary_path(record);
    let data = read_file(&path).ok()?;
    match layout::decode::<image::ImageInfo>(&data) {
        Ok(info) => Some(info.fw_version.version_string()),
        Err(e) => {
            debug!(file = %path.display(), error = %e, "undecodable IMAGE_INFO");
            None
        }
    }
}

/// Summarize the extract directory `dir`.
pub fn summarize(dir: &Path) -> Result<ExtractSummary> {
    let extract = ExtractDir::open(dir)?;
    let metadata = extract.metadata();
    Ok(ExtractSummary {
        format: metadata.format,
        original_size: metadata.original_size,
        is_encrypted: metadata.is_encrypted,
        sections: metadata.sections.len(),
        gaps: metadata.gap_segments().count(),
        fw_version: image_info_version(&extract),
    })
}

/// Decode the section of type `section_type` at `offset` of an extract
/// directory into its JSON document.
pub fn decode_extracted(dir: &Path, section_type: SectionType, offset: u64) -> Result<String> {
    let extract = ExtractDir::open(dir)?;
    let record = extract.metadata().section(section_type, offset)?;
    let data = read_file(&extract.binary_path(record))?;
    let size = usize::try_from(record.size).map_or(data.len(), |size| size.min(data.len()));
    decode_section(section_type, &data[..size])
}

#[cfg(test)]
mod tests;
