//! Which CRC a section uses and what trailer it carries.

use mlxfw_image::{BLANK_CRC, SectionType};

use crate::algorithms::{hardware_crc, image_crc, image_crc_bytes};

/// Bytes of the tools area covered by its CRC.
pub const TOOLS_AREA_CRC_LEN: usize = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrcAlgorithm {
    /// Software CRC16 over big-endian dwords.
    Software,
    /// Table-driven HW pointer CRC.
    Hardware,
}

impl CrcAlgorithm {
    /// CRC of `data` under this algorithm.
    pub fn compute(self, data: &[u8]) -> u16 {
        match self {
            Self::Software => image_crc_bytes(data),
            Self::Hardware => hardware_crc(data),
        }
    }
}

/// Trailer appended to an in-section CRC section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrailerKind {
    /// Image-CRC of the payload.
    Software,
    /// Hardware CRC of the payload.
    Hardware,
    /// `0xFFFFFFFF`; the device fills the slot itself.
    Blank,
    /// Image-CRC of the first 60 bytes.
    ToolsArea,
}

/// Algorithm used for a section type.
pub const fn algorithm_for(section_type: SectionType) -> CrcAlgorithm {
    match section_type {
        SectionType::HW_PTR => CrcAlgorithm::Hardware,
        _ => CrcAlgorithm::Software,
    }
}

/// Device-data types whose CRC slot is left blank.
pub const fn uses_blank_trailer(section_type: SectionType) -> bool {
    match section_type {
        SectionType::BOOT2
        | SectionType::DEV_INFO
        | SectionType::DEV_INFO1
        | SectionType::DEV_INFO2
        | SectionType::MFG_INFO
        | SectionType::IMAGE_INFO
        | SectionType::FORBIDDEN_VERSIONS
        | SectionType::PUBLIC_KEYS_2048
        | SectionType::PUBLIC_KEYS_4096
        | SectionType::IMAGE_SIGNATURE_512
        | SectionType::HASHES_TABLE => true,
        other => other.0 >= 0xe0 && other.0 <= 0xef && !other.is_known(),
    }
}

/// Trailer kind for a section type.
pub const fn trailer_for(section_type: SectionType) -> TrailerKind {
    if matches!(section_type, SectionType::TOOLS_AREA) {
        return TrailerKind::ToolsArea;
    }
    if uses_blank_trailer(section_type) {
        return TrailerKind::Blank;
    }
    match algorithm_for(section_type) {
        CrcAlgorithm::Hardware => TrailerKind::Hardware,
        CrcAlgorithm::Software => TrailerKind::Software,
    }
}

/// Trailer dword for `payload` under `kind`, zero-extended from 16 bits.
pub fn trailer_value(kind: TrailerKind, payload: &[u8]) -> u32 {
    match kind {
        TrailerKind::Blank => BLANK_CRC,
        TrailerKind::ToolsArea => u32::from(image_crc(payload, TOOLS_AREA_CRC_LEN / 4)),
        TrailerKind::Software => u32::from(image_crc_bytes(payload)),
        TrailerKind::Hardware => u32::from(hardware_crc(payload)),
    }
}

/// Big-endian trailer bytes for a `section_type` payload.
pub fn trailer_bytes(section_type: SectionType, payload: &[u8]) -> [u8; 4] {
    trailer_value(trailer_for(section_type), payload).to_be_bytes()
}
