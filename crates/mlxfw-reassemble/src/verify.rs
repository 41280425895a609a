//! Checks run on a finished image.

use mlxfw_crc::CrcError;
use mlxfw_image::{SectionRecord, SectionType};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Lowercase hex SHA-256 of `image`.
pub fn image_sha256(image: &[u8]) -> String {
    hex::encode(Sha256::digest(image))
}

fn verify_one(record: &SectionRecord, image: &[u8]) -> mlxfw_crc::Result<()> {
    mlxfw_crc::verify_section(record, image)?;
    if record.section_type == SectionType::BOOT2 && !record.is_encrypted {
        let start = usize::try_from(record.offset).unwrap_or(usize::MAX);
        let data = image.get(start..).unwrap_or_default();
        mlxfw_crc::verify_boot2(data)?;
    }
    Ok(())
}

/// Verify every section CRC of `image` in parallel.
///
/// Returns the failures in section order. Nothing is checked when the whole
/// image is encrypted.
pub fn verify_sections(
    sections: &[SectionRecord],
    image: &[u8],
    encrypted: bool,
) -> Vec<CrcError> {
    if encrypted {
        debug!("encrypted image, section CRCs not checked");
        return Vec::new();
    }
    let failures: Vec<CrcError> = sections
        .par_iter()
        .filter_map(|record| verify_one(record, image).err())
        .collect();
    for error in &failures {
        warn!(%error, "CRC check failed");
    }
    debug!(checked = sections.len(), failed = failures.len(), "section CRCs");
    failures
}
