//! Magic pattern and hardware pointer block.

use mlxfw_layout::layout;
use serde::{Deserialize, Serialize};

use crate::{FirmwareFormat, HW_POINTERS_SIZE, ImageError, MAGIC_PATTERN, Result, ensure_len};

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MagicPattern {
        pub magic: u64 => byte("0x0"),
        pub reserved: u64 => byte("0x8").reserved(),
    }
}

impl MagicPattern {
    pub fn new() -> Self {
        Self {
            magic: MAGIC_PATTERN,
            reserved: 0,
        }
    }

    /// Check the pattern at `offset` of `image`.
    pub fn verify(image: &[u8], offset: usize) -> Result<()> {
        ensure_len(image, offset + 8, "magic pattern")?;
        let found: Self = mlxfw_layout::decode(&image[offset..])?;
        if found.magic != MAGIC_PATTERN {
            return Err(ImageError::InvalidMagic {
                expected: MAGIC_PATTERN,
                actual: found.magic,
                offset: offset as u64,
            });
        }
        Ok(())
    }
}

layout! {
    /// One 8-byte HW pointer: address plus CRC of the first 6 bytes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct HwPointerEntry {
        pub ptr: u32 => byte("0x0"),
        /// Kept as found; erased slots hold `0xffff` here.
        pub reserved: u16 => byte("0x4"),
        pub crc: u16 => byte("0x6"),
    }
}

impl HwPointerEntry {
    /// `0` and `0xffffffff` mark unused slots.
    pub const fn is_set(&self) -> bool {
        self.ptr != 0 && self.ptr != u32::MAX
    }
}

macro_rules! hw_pointer_block {
    ($(#[$meta:meta])* $name:ident { $($field:ident => $offset:literal),* $(,)? }) => {
        layout! {
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
            #[serde(default)]
            pub struct $name {
                $(pub $field: HwPointerEntry => byte($offset),)*
            }
        }

        impl $name {
            /// Entries in block order.
            pub fn entries(&self) -> Vec<(&'static str, HwPointerEntry)> {
                vec![$((stringify!($field), self.$field),)*]
            }
        }
    };
}

hw_pointer_block! {
    /// FS4 HW pointer block.
    Fs4HwPointers {
        boot_record_ptr => "0x00",
        boot2_ptr => "0x08",
        toc_ptr => "0x10",
        tools_ptr => "0x18",
        authentication_start_pointer => "0x20",
        authentication_end_pointer => "0x28",
        digest_pointer => "0x30",
        digest_recovery_key_pointer => "0x38",
        fw_window_start_pointer => "0x40",
        fw_window_end_pointer => "0x48",
        image_info_section_pointer => "0x50",
        image_signature_pointer => "0x58",
        public_key_pointer => "0x60",
        fw_security_version_pointer => "0x68",
        gcm_iv_delta_pointer => "0x70",
        hash_disable_pointer => "0x78",
    }
}

hw_pointer_block! {
    /// FS5 HW pointer block.
    Fs5HwPointers {
        boot_record_ptr => "0x00",
        boot2_ptr => "0x08",
        toc_ptr => "0x10",
        tools_ptr => "0x18",
        psc_bct_pointer => "0x20",
        psc_bl1_pointer => "0x28",
        psc_bl1_bch_pointer => "0x30",
        psc_fw_update_handle_pointer => "0x38",
        ncore_pointer => "0x40",
        ncore_bch_pointer => "0x48",
        image_info_section_pointer => "0x50",
        image_signature_pointer => "0x58",
        public_key_pointer => "0x60",
        fw_security_version_pointer => "0x68",
        gcm_iv_delta_pointer => "0x70",
        hash_disable_pointer => "0x78",
    }
}

/// HW pointer block in either layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "pointers", rename_all = "UPPERCASE")]
pub enum HwPointersBlock {
    Fs4(Fs4HwPointers),
    Fs5(Fs5HwPointers),
}

impl HwPointersBlock {
    /// Decode the 128-byte block of `format`. FS3 has none.
    pub fn decode(format: FirmwareFormat, data: &[u8]) -> Result<Self> {
        ensure_len(data, HW_POINTERS_SIZE, "HW pointers")?;
        match format {
            FirmwareFormat::Fs4 => Ok(Self::Fs4(mlxfw_layout::decode(data)?)),
            FirmwareFormat::Fs5 => Ok(Self::Fs5(mlxfw_layout::decode(data)?)),
            FirmwareFormat::Fs3 => Err(ImageError::NotSupported(
                "FS3 images have no HW pointer block".to_string(),
            )),
        }
    }

    /// Encode to exactly 128 bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Self::Fs4(block) => mlxfw_layout::encode(block)?,
            Self::Fs5(block) => mlxfw_layout::encode(block)?,
        })
    }

    pub fn entries(&self) -> Vec<(&'static str, HwPointerEntry)> {
        match self {
            Self::Fs4(block) => block.entries(),
            Self::Fs5(block) => block.entries(),
        }
    }

    pub const fn format(&self) -> FirmwareFormat {
        match self {
            Self::Fs4(_) => FirmwareFormat::Fs4,
            Self::Fs5(_) => FirmwareFormat::Fs5,
        }
    }
}

layout! {
    /// First two dwords of BOOT2.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Boot2Header {
        pub header: u32 => byte("0x0"),
        pub size_dwords: u32 => byte("0x4"),
    }
}
