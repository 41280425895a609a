//! DEV_INFO and MFG_INFO.

use mlxfw_layout::layout;
use serde::{Deserialize, Serialize};

layout! {
    /// Allocation of GUIDs or MACs.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct UidEntry {
        pub step: u8 => byte("0x2"),
        pub num_allocated: u8 => byte("0x3"),
        pub uid: u64 => byte("0x8"),
    }
}

layout! {
    /// DEV_INFO section, 512 bytes with a CRC in the last dword.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct DevInfo {
        pub signature0: u32 => byte("0x0"),
        pub signature1: u32 => byte("0x4"),
        pub signature2: u32 => byte("0x8"),
        pub signature3: u32 => byte("0xc"),
        pub minor_version: u8 => byte("0x12"),
        pub major_version: u8 => byte("0x13"),
        pub guids: UidEntry => byte("0x20"),
        pub macs: UidEntry => byte("0x40"),
        pub vsd: String => byte("0x100").len(208),
        pub crc: u32 => byte("0x1fc"),
    }
}

layout! {
    /// MFG_INFO section header. The section itself is 256 or 320 bytes.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct MfgInfo {
        pub psid: String => byte("0x0").len(16),
        pub minor_version: u8 => byte("0x1e"),
        pub major_version: u8 => byte("0x1f"),
        pub guids: UidEntry => byte("0x20"),
        pub macs: UidEntry => byte("0x40"),
    }
}
