//! Per-section reconstruction.

use mlxfw_image::{CrcClass, ImageError, SectionDocument, SectionRecord};
use tracing::{debug, warn};

use crate::extract_dir::ExtractDir;
use crate::{ReassembleError, Result};

/// Where a section's bytes came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionSource {
    Json,
    Binary,
}

fn to_usize(value: u64, what: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| ImageError::InvalidData(format!("{what} {value:#x} does not fit")).into())
}

/// Try the JSON sidecar. `Ok(None)` means use the binary file.
fn from_json(dir: &ExtractDir, record: &SectionRecord, size: usize) -> Result<Option<Vec<u8>>> {
    let path = dir.json_path(record);
    if !path.is_file() {
        return Ok(None);
    }
    let name = record.display_name();
    let text = std::fs::read_to_string(&path).map_err(|e| ReassembleError::io(&path, e))?;
    let doc = match SectionDocument::from_json(record.section_type, &text) {
        Ok(doc) => doc,
        Err(e) => {
            if !dir.binary_path(record).is_file() {
                return Err(ReassembleError::ReconstructionFailed {
                    section: name,
                    reason: format!("{}: {e}", path.display()),
                });
            }
            warn!(section = %name, error = %e, "unreadable JSON, using binary");
            return Ok(None);
        }
    };
    if doc.has_raw_data() {
        debug!(section = %name, "JSON marked has_raw_data, using binary");
        return Ok(None);
    }
    match doc.to_bytes(size) {
        Ok(mut bytes) => {
            if record.section_type.is_dev_info() {
                mlxfw_crc::fix_dev_info_crc(&mut bytes)?;
            }
            Ok(Some(bytes))
        }
        Err(e) => {
            warn!(section = %name, error = %e, "JSON does not encode, using binary");
            Ok(None)
        }
    }
}

/// Bytes of one section as they belong in the image, CRC trailer included.
pub fn reconstruct_section(
    dir: &ExtractDir,
    record: &SectionRecord,
    binary_only: bool,
) -> Result<(Vec<u8>, SectionSource)> {
    let size = to_usize(record.size, "section size")?;
    let stored_size = to_usize(record.stored_size(), "section size")?;
    let encrypted = record.is_encrypted || dir.metadata().is_encrypted;
    let use_json =
        !binary_only && !encrypted && SectionDocument::has_schema(record.section_type);

    let json = if use_json {
        from_json(dir, record, size)?
    } else {
        None
    };
    let (mut bytes, source) = if let Some(bytes) = json {
        (bytes, SectionSource::Json)
    } else {
        let path = dir.binary_path(record);
        if !path.is_file() {
            return Err(ReassembleError::MissingSectionFile {
                section: record.display_name(),
                path,
            });
        }
        (ExtractDir::read(&path)?, SectionSource::Binary)
    };

    if record.crc_type == CrcClass::InSection && !encrypted && bytes.len() < stored_size {
        if bytes.len() + 4 == stored_size {
            let trailer = mlxfw_crc::trailer_bytes(record.section_type, &bytes);
            bytes.extend_from_slice(&trailer);
        } else {
            warn!(
                section = %record.display_name(),
                len = bytes.len(),
                stored_size,
                "section shorter than recorded, no trailer added"
            );
        }
    }
    Ok((bytes, source))
}
