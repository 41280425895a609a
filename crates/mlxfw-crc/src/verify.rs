//! CRC verification and in-place fix-ups.

use mlxfw_image::{
    Boot2Header, CrcClass, DEV_INFO_CRC_OFFSET, HW_POINTER_ENTRY_SIZE, SectionRecord,
    TOC_ENTRY_SIZE, read_be32, write_be32,
};
use tracing::debug;

use crate::algorithms::{hardware_crc, image_crc};
use crate::policy::{TrailerKind, algorithm_for, trailer_for, trailer_value};
use crate::{CrcError, Result};

fn ensure_len(data: &[u8], expected: usize, context: &str) -> Result<()> {
    if data.len() < expected {
        return Err(CrcError::DataTooShort {
            expected,
            actual: data.len(),
            context: context.to_string(),
        });
    }
    Ok(())
}

/// Compare the low 16 bits of `stored` with `computed`.
pub fn check(section: &str, stored: u32, computed: u16) -> Result<()> {
    let actual = stored & 0xffff;
    if actual != u32::from(computed) {
        return Err(CrcError::CrcMismatch {
            section: section.to_string(),
            expected: u32::from(computed),
            actual,
        });
    }
    Ok(())
}

/// Verify the BOOT2 CRC and return it.
///
/// The CRC covers the header, size and payload dwords plus one more dword
/// (`size_dwords + 3` in total) and sits in the low half of the next dword.
pub fn verify_boot2(data: &[u8]) -> Result<u16> {
    let header: Boot2Header = mlxfw_layout::decode(data)?;
    let covered = usize::try_from(header.size_dwords)
        .ok()
        .and_then(|n| n.checked_add(3))
        .filter(|n| n.checked_add(1).and_then(|m| m.checked_mul(4)).is_some())
        .ok_or_else(|| CrcError::InvalidParameter {
            name: "size_dwords".to_string(),
            reason: format!("{:#x} is out of range", header.size_dwords),
        })?;
    ensure_len(data, (covered + 1) * 4, "BOOT2")?;

    let computed = image_crc(data, covered);
    let stored = read_be32(data, covered * 4);
    debug!(size_dwords = header.size_dwords, crc = format_args!("{computed:#06x}"), "BOOT2 CRC");
    check("BOOT2", stored, computed)?;
    Ok(computed)
}

/// CRC of a TOC header or entry: Image-CRC over its first 7 dwords.
pub fn toc_crc(raw: &[u8]) -> Result<u16> {
    ensure_len(raw, TOC_ENTRY_SIZE, "TOC entry")?;
    Ok(image_crc(raw, 7))
}

/// Check the CRC stored in the last dword of a TOC entry.
pub fn verify_toc_entry(raw: &[u8]) -> Result<()> {
    let computed = toc_crc(raw)?;
    check("TOC entry", read_be32(raw, 28), computed)
}

/// Check the CRC stored in the last dword of a TOC header.
pub fn verify_toc_header(raw: &[u8]) -> Result<()> {
    let computed = toc_crc(raw)?;
    check("TOC header", read_be32(raw, 28), computed)
}

/// Hardware CRC of one HW pointer entry (its first 6 bytes).
pub fn hw_pointer_crc(entry: &[u8]) -> Result<u16> {
    ensure_len(entry, HW_POINTER_ENTRY_SIZE, "HW pointer entry")?;
    Ok(hardware_crc(&entry[..6]))
}

/// Rewrite the CRC of every used entry in a HW pointer block.
///
/// Entries pointing at `0` or `0xffffffff` are left alone. Returns the
/// number of entries updated.
pub fn fix_hw_pointer_crcs(block: &mut [u8]) -> Result<usize> {
    let mut fixed = 0;
    for entry in block.chunks_exact_mut(HW_POINTER_ENTRY_SIZE) {
        let ptr = read_be32(entry, 0);
        if ptr == 0 || ptr == u32::MAX {
            continue;
        }
        let crc = hw_pointer_crc(entry)?;
        entry[6..8].copy_from_slice(&crc.to_be_bytes());
        fixed += 1;
    }
    Ok(fixed)
}

/// Software CRC of DEV_INFO over its first 508 bytes.
pub fn dev_info_crc(data: &[u8]) -> Result<u16> {
    ensure_len(data, DEV_INFO_CRC_OFFSET + 4, "DEV_INFO")?;
    Ok(image_crc(data, DEV_INFO_CRC_OFFSET / 4))
}

/// Store a fresh CRC in the low half of the DEV_INFO CRC dword.
pub fn fix_dev_info_crc(data: &mut [u8]) -> Result<u16> {
    let crc = dev_info_crc(data)?;
    let high = read_be32(data, DEV_INFO_CRC_OFFSET) & 0xffff_0000;
    write_be32(data, DEV_INFO_CRC_OFFSET, high | u32::from(crc));
    Ok(crc)
}

/// Verify the CRC of one section inside a reassembled image.
///
/// Encrypted sections and sections without a CRC pass unchecked.
pub fn verify_section(record: &SectionRecord, image: &[u8]) -> Result<()> {
    if record.is_encrypted || record.size == 0 {
        return Ok(());
    }
    let name = record.display_name();
    let (Ok(start), Ok(size), Ok(stored_size)) = (
        usize::try_from(record.offset),
        usize::try_from(record.size),
        usize::try_from(record.stored_size()),
    ) else {
        return Err(CrcError::InvalidParameter {
            name: "offset".to_string(),
            reason: format!("{name} does not fit the address space"),
        });
    };
    ensure_len(image, start + stored_size.max(size), &name)?;
    let payload = &image[start..start + size];

    match record.crc_type {
        CrcClass::None => Ok(()),
        CrcClass::InItocEntry => {
            let computed = algorithm_for(record.section_type).compute(payload);
            check(&name, record.crc, computed)
        }
        CrcClass::InSection => {
            if stored_size != size + 4 {
                return Ok(());
            }
            let stored = read_be32(image, start + size);
            match trailer_for(record.section_type) {
                TrailerKind::Blank if stored == u32::MAX => Ok(()),
                TrailerKind::Blank => Err(CrcError::CrcMismatch {
                    section: name,
                    expected: u32::MAX,
                    actual: stored,
                }),
                kind => {
                    let computed = trailer_value(kind, payload);
                    check(&name, stored, computed as u16)
                }
            }
        }
    }
}
