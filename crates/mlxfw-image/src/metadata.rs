//! Firmware metadata sidecar (`firmware_metadata.json`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    CrcClass, FirmwareFormat, HwPointersBlock, ImageError, Result, SectionType, TocEntry,
};

/// File name of the sidecar inside an extract directory.
pub const METADATA_FILE: &str = "firmware_metadata.json";

/// Subdirectory holding gap files.
pub const GAPS_DIR: &str = "gaps";

/// Top-level description of an extracted image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareMetadata {
    pub format: FirmwareFormat,
    pub original_size: u64,
    /// Hex SHA-256 of the original image; empty when unknown.
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub magic_pattern: Option<MagicPatternInfo>,
    #[serde(default)]
    pub hw_pointers: Option<HwPointersInfo>,
    #[serde(default)]
    pub itoc: Option<TocInfo>,
    #[serde(default)]
    pub dtoc: Option<TocInfo>,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
    #[serde(default)]
    pub memory_layout: Vec<MemorySegment>,
    #[serde(default)]
    pub gaps: Vec<GapDescriptor>,
    #[serde(default)]
    pub is_encrypted: bool,
}

impl FirmwareMetadata {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Gap segments of the memory layout, in order.
    pub fn gap_segments(&self) -> impl Iterator<Item = &MemorySegment> {
        self.memory_layout
            .iter()
            .filter(|segment| segment.kind == SegmentKind::Gap)
    }

    /// Look up a section by type and offset.
    pub fn section(&self, section_type: SectionType, offset: u64) -> Result<&SectionRecord> {
        self.sections
            .iter()
            .find(|s| s.section_type == section_type && s.offset == offset)
            .ok_or_else(|| ImageError::SectionNotFound {
                section_type: section_type.name(),
                offset,
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicPatternInfo {
    pub offset: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwPointersInfo {
    pub offset: u64,
    pub block: HwPointersBlock,
}

/// Location and raw header bytes of an ITOC or DTOC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocInfo {
    pub address: u64,
    #[serde(with = "crate::encoding::base64_bytes")]
    pub header_data: Vec<u8>,
}

/// One section as recorded by the extractor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub offset: u64,
    /// Payload size in bytes.
    pub size: u64,
    /// Size including a CRC trailer, when the section carries one.
    #[serde(default)]
    pub original_size: u64,
    #[serde(default)]
    pub crc_type: CrcClass,
    /// Stored CRC from the TOC entry.
    #[serde(default)]
    pub crc: u32,
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default)]
    pub is_device_data: bool,
    #[serde(default)]
    pub is_from_hw_pointer: bool,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub itoc_entry: Option<ItocEntryInfo>,
}

impl SectionRecord {
    /// Size of the section in the image, trailer included.
    pub const fn stored_size(&self) -> u64 {
        if self.original_size == 0 {
            self.size
        } else {
            self.original_size
        }
    }

    /// Extract-directory base name, without extension.
    pub fn base_name(&self) -> String {
        if self.file_name.is_empty() {
            return format!("{}_0x{:08x}", self.section_type.name(), self.offset);
        }
        Path::new(&self.file_name)
            .file_stem()
            .map_or_else(|| self.file_name.clone(), |s| s.to_string_lossy().into_owned())
    }

    /// Display name used in logs and errors.
    pub fn display_name(&self) -> String {
        format!("{}@0x{:08x}", self.section_type.name(), self.offset)
    }
}

/// Original TOC entry of a section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItocEntryInfo {
    #[serde(with = "crate::encoding::base64_bytes")]
    pub raw: Vec<u8>,
    #[serde(default)]
    pub entry: Option<TocEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Section,
    Gap,
}

/// Contiguous range `[start, end)` of the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySegment {
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub start: u64,
    pub end: u64,
}

impl MemorySegment {
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Gap as recorded by the extractor. Uniform gaps carry their fill byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapDescriptor {
    pub start: u64,
    pub size: u64,
    #[serde(default)]
    pub fill: Option<u8>,
}
