//! ITOC/DTOC headers and entries.

use mlxfw_layout::layout;
use serde::{Deserialize, Serialize};

use crate::{
    CrcClass, DTOC_SIGNATURE, ITOC_SIGNATURE, ImageError, Result, SectionType,
    TOC_SIGNATURE_TAIL,
};

layout! {
    /// 32-byte TOC header.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TocHeader {
        pub signature0: u32 => byte("0x0"),
        pub signature1: u32 => byte("0x4"),
        pub signature2: u32 => byte("0x8"),
        pub signature3: u32 => byte("0xc"),
        pub version: u32 => byte("0x10"),
        #[serde(skip)]
        pub reserved: Vec<u8> => byte("0x14").len(10).reserved(),
        pub crc: u16 => byte("0x1e"),
    }
}

/// Which table a header introduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TocKind {
    Itoc,
    Dtoc,
}

impl TocKind {
    pub const fn signature(self) -> u32 {
        match self {
            Self::Itoc => ITOC_SIGNATURE,
            Self::Dtoc => DTOC_SIGNATURE,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Itoc => "ITOC",
            Self::Dtoc => "DTOC",
        }
    }
}

impl TocHeader {
    /// Header with the standard signature for `kind`.
    pub fn new(kind: TocKind) -> Self {
        Self {
            signature0: kind.signature(),
            signature1: TOC_SIGNATURE_TAIL[0],
            signature2: TOC_SIGNATURE_TAIL[1],
            signature3: TOC_SIGNATURE_TAIL[2],
            ..Self::default()
        }
    }

    pub fn kind(&self) -> Option<TocKind> {
        match self.signature0 {
            ITOC_SIGNATURE => Some(TocKind::Itoc),
            DTOC_SIGNATURE => Some(TocKind::Dtoc),
            _ => None,
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(mlxfw_layout::decode(data)?)
    }
}

layout! {
    /// 32-byte ITOC/DTOC entry.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TocEntry {
        #[serde(rename = "type")]
        pub section_type: u8 => bit("0").bits(8),
        /// Payload size in dwords.
        pub size: u32 => bit("8").bits(22),
        pub cache_line_crc: u8 => bit("30").bits(2),
        pub param0: u32 => bit("32").bits(30),
        pub zipped_image: bool => bit("62"),
        pub device_data: bool => bit("63"),
        pub param1: u32 => byte("0x8"),
        /// Flash address in dwords.
        pub flash_addr: u32 => bit("128").bits(29),
        pub relative_addr: bool => bit("157"),
        pub encrypted_section: bool => bit("159"),
        pub crc: u8 => bit("173").bits(3),
        pub section_crc: u16 => bit("176").bits(16),
        pub itoc_entry_crc: u16 => bit("240").bits(16),
    }
}

impl TocEntry {
    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(mlxfw_layout::decode(data)?)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(mlxfw_layout::encode(self)?)
    }

    pub fn section_type(&self) -> SectionType {
        SectionType(u16::from(self.section_type))
    }

    /// Type `0xff` closes the table.
    pub const fn is_end(&self) -> bool {
        self.section_type == 0xff
    }

    pub const fn size_bytes(&self) -> u64 {
        self.size as u64 * 4
    }

    pub const fn flash_offset(&self) -> u64 {
        self.flash_addr as u64 * 4
    }

    pub fn crc_class(&self) -> Result<CrcClass> {
        CrcClass::from_raw(self.crc).ok_or_else(|| {
            ImageError::InvalidData(format!(
                "{} entry has unknown CRC class {}",
                self.section_type(),
                self.crc
            ))
        })
    }
}
