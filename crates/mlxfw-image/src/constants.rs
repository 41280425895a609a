//! Wire-format constants.

/// Magic pattern marking the start of an FS4/FS5 image.
pub const MAGIC_PATTERN: u64 = 0x4D54_4657_ABCD_EF00;

/// Size of the magic pattern structure (pattern plus reserved dwords).
pub const MAGIC_PATTERN_SIZE: usize = 16;

/// `"ITOC"` in big-endian byte order.
pub const ITOC_SIGNATURE: u32 = 0x4954_4F43;

/// `"DTOC"` in big-endian byte order.
pub const DTOC_SIGNATURE: u32 = 0x4454_4F43;

/// Remaining TOC header signature dwords.
pub const TOC_SIGNATURE_TAIL: [u32; 3] = [0x0408_1516, 0x2342_cafa, 0xbaca_fe00];

pub const TOC_HEADER_SIZE: usize = 32;
pub const TOC_ENTRY_SIZE: usize = 32;

pub const HW_POINTER_ENTRY_SIZE: usize = 8;
pub const HW_POINTER_COUNT: usize = 16;
pub const HW_POINTERS_SIZE: usize = HW_POINTER_ENTRY_SIZE * HW_POINTER_COUNT;

pub const IMAGE_INFO_SIZE: usize = 1024;
pub const DEV_INFO_SIZE: usize = 512;
/// Bytes of DEV_INFO covered by its CRC; the CRC dword follows.
pub const DEV_INFO_CRC_OFFSET: usize = 508;

pub const HASHES_TABLE_HEADER_SIZE: usize = 32;
pub const HASHES_TABLE_ENTRY_SIZE: usize = 64;

pub const PUBLIC_KEY_SLOTS: usize = 8;

/// Size of a CRC trailer dword.
pub const CRC_TRAILER_SIZE: usize = 4;

/// Trailer written for sections whose CRC slot is left blank.
pub const BLANK_CRC: u32 = 0xFFFF_FFFF;

/// Byte used for erased flash.
pub const ERASED_BYTE: u8 = 0xFF;
