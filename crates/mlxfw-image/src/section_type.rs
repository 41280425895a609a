use std::fmt;

use serde::{Deserialize, Serialize};

/// 16-bit section tag.
///
/// Values below `0x100` are ITOC/DTOC entry types. Regions that are not
/// described by a TOC entry (BOOT2, the TOCs themselves, the tools area,
/// the HW pointers) use pseudo types from `0x100` up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionType(pub u16);

macro_rules! section_types {
    ($($name:ident = $value:expr),* $(,)?) => {
        impl SectionType {
            $(pub const $name: Self = Self($value);)*

            const NAMED: &'static [(Self, &'static str)] = &[
                $((Self::$name, stringify!($name)),)*
            ];
        }
    };
}

section_types! {
    BOOT_CODE = 0x1,
    PCI_CODE = 0x2,
    MAIN_CODE = 0x3,
    PCIE_LINK_CODE = 0x4,
    IRON_PREP_CODE = 0x5,
    POST_IRON_BOOT_CODE = 0x6,
    UPGRADE_CODE = 0x7,
    HW_BOOT_CFG = 0x8,
    HW_MAIN_CFG = 0x9,
    PHY_UC_CODE = 0xa,
    PHY_UC_CONSTS = 0xb,
    PCIE_PHY_UC_CODE = 0xc,
    CCIR_INFRA_CODE = 0xd,
    CCIR_ALGO_CODE = 0xe,
    BOOT3_CODE = 0xf,
    IMAGE_INFO = 0x10,
    FW_BOOT_CFG = 0x11,
    FW_MAIN_CFG = 0x12,
    APU_KERNEL = 0x14,
    ACE_CODE = 0x15,
    ROM_CODE = 0x18,
    RESET_INFO = 0x20,
    DBG_FW_INI = 0x30,
    DBG_FW_PARAMS = 0x32,
    FW_ADB = 0x33,
    IMAGE_SIGNATURE_256 = 0xa0,
    PUBLIC_KEYS_2048 = 0xa1,
    FORBIDDEN_VERSIONS = 0xa2,
    IMAGE_SIGNATURE_512 = 0xa3,
    PUBLIC_KEYS_4096 = 0xa4,
    HMAC_DIGEST = 0xa5,
    RSA_PUBLIC_KEY = 0xa6,
    RSA_4096_SIGNATURES = 0xa7,
    ENCRYPTION_KEY_TRANSITION = 0xa8,
    PROGRAMMABLE_HW_FW = 0xa9,
    DIGITAL_CERT_PTR = 0xaa,
    DIGITAL_CERT_RW = 0xab,
    CRDUMP_MASK_DATA = 0xae,
    FW_NV_LOG = 0xb0,
    NV_DATA1 = 0xb1,
    NV_DATA0 = 0xb2,
    NV_DATA2 = 0xb3,
    FW_INTERNAL_USAGE = 0xb4,
    MFG_INFO = 0xe0,
    DEV_INFO = 0xe1,
    NV_DATA = 0xe2,
    VPD_R0 = 0xe3,
    NV_LOG = 0xe4,
    DEV_INFO1 = 0xe7,
    DEV_INFO2 = 0xe8,
    HASHES_TABLE = 0xfa,
    END = 0xff,
    BOOT2 = 0x100,
    ITOC = 0x101,
    DTOC = 0x102,
    TOOLS_AREA = 0x103,
    HW_PTR = 0x104,
    MAGIC_PATTERN = 0x105,
}

impl SectionType {
    /// Canonical name, if the tag is a known type.
    pub fn known_name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(ty, _)| *ty == self)
            .map(|(_, name)| *name)
    }

    /// Canonical name, or `UNKNOWN_0x..` for unlisted tags.
    pub fn name(self) -> String {
        self.known_name()
            .map_or_else(|| format!("UNKNOWN_0x{:02X}", self.0), str::to_string)
    }

    /// Look a type up by name. Accepts `UNKNOWN_0x..` and bare hex tags.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        if let Some((ty, _)) = Self::NAMED.iter().find(|(_, n)| *n == upper) {
            return Some(*ty);
        }
        let hex = upper
            .strip_prefix("UNKNOWN_0X")
            .or_else(|| upper.strip_prefix("0X"))?;
        u16::from_str_radix(hex, 16).ok().map(Self)
    }

    pub const fn is_known(self) -> bool {
        let mut i = 0;
        while i < Self::NAMED.len() {
            if Self::NAMED[i].0.0 == self.0 {
                return true;
            }
            i += 1;
        }
        false
    }

    /// Not described by a TOC entry.
    pub const fn is_pseudo(self) -> bool {
        self.0 >= 0x100
    }

    /// Image section range of the ITOC.
    pub const fn is_image_section(self) -> bool {
        self.0 >= 0x10 && self.0 <= 0x5f
    }

    /// Device section range of the DTOC.
    pub const fn is_device_section(self) -> bool {
        self.0 >= 0x80 && self.0 <= 0xff
    }

    /// Any of the DEV_INFO copies.
    pub const fn is_dev_info(self) -> bool {
        matches!(self, Self::DEV_INFO | Self::DEV_INFO1 | Self::DEV_INFO2)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.known_name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN_0x{:02X}", self.0),
        }
    }
}

impl From<u16> for SectionType {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Where a section's CRC lives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrcClass {
    /// Section CRC field of the TOC entry.
    #[default]
    InItocEntry,
    None,
    /// Last dword of the section payload.
    InSection,
}

impl CrcClass {
    /// Decode the 3-bit TOC entry field.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::InItocEntry),
            1 => Some(Self::None),
            2 => Some(Self::InSection),
            _ => None,
        }
    }

    pub const fn raw(self) -> u8 {
        match self {
            Self::InItocEntry => 0,
            Self::None => 1,
            Self::InSection => 2,
        }
    }
}

/// Firmware format family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FirmwareFormat {
    Fs3,
    Fs4,
    Fs5,
}

impl FirmwareFormat {
    /// FS4 and FS5 start with the magic pattern and HW pointer block.
    pub const fn has_magic_pattern(self) -> bool {
        !matches!(self, Self::Fs3)
    }
}

impl fmt::Display for FirmwareFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fs3 => "FS3",
            Self::Fs4 => "FS4",
            Self::Fs5 => "FS5",
        })
    }
}
