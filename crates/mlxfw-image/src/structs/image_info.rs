use mlxfw_layout::layout;
use serde::{Deserialize, Serialize};

layout! {
    /// Firmware version with its BCD build timestamp.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct FwVersion {
        pub major: u16 => byte("0x2"),
        pub minor: u16 => byte("0x4"),
        pub subminor: u16 => byte("0x6"),
        pub hour: u8 => byte("0x9").hex_as_dec(),
        pub minutes: u8 => byte("0xa").hex_as_dec(),
        pub seconds: u8 => byte("0xb").hex_as_dec(),
        pub day: u8 => byte("0xc").hex_as_dec(),
        pub month: u8 => byte("0xd").hex_as_dec(),
        pub year: u16 => byte("0xe").hex_as_dec(),
    }
}

impl FwVersion {
    /// `major.minor.subminor`
    pub fn version_string(&self) -> String {
        format!("{}.{}.{:04}", self.major, self.minor, self.subminor)
    }
}

layout! {
    /// IMAGE_INFO section, 1024 bytes.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ImageInfo {
        pub secure_fw: bool => bit("0"),
        pub signed_fw: bool => bit("1"),
        pub debug_fw: bool => bit("2"),
        pub mcc_en: bool => bit("3"),
        pub signed_vendor_nvconfig: bool => bit("4"),
        pub signed_mlnx_nvconfig: bool => bit("5"),
        pub frc_supported: bool => bit("6"),
        pub cs_tokens_supported: bool => bit("7"),
        pub debug_fw_tokens_supported: bool => bit("8"),
        pub encrypted_fw: bool => bit("9"),
        pub long_keys: bool => bit("10"),
        pub minor_version: u8 => byte("0x2"),
        pub major_version: u8 => byte("0x3"),
        pub fw_version: FwVersion => byte("0x4"),
        pub pci_vendor_id: u16 => byte("0x14"),
        pub pci_device_id: u16 => byte("0x16"),
        pub pci_sub_vendor_id: u16 => byte("0x18"),
        pub pci_subsystem_id: u16 => byte("0x1a"),
        pub psid: String => byte("0x1c").len(16),
        pub vsd_vendor_id: u16 => byte("0x2e"),
        pub vsd: String => byte("0x30").len(208),
        pub supported_hw_id: [u32; 4] => byte("0x100"),
        pub ini_file_num: u32 => byte("0x110"),
        pub prod_ver: String => byte("0x130").len(16),
        pub description: String => byte("0x140").len(256),
        pub name: String => byte("0x280").len(64),
        pub prs_name: String => byte("0x2c0").len(128),
        #[serde(skip)]
        pub reserved_tail: Vec<u8> => byte("0x340").len(0xc0).reserved(),
    }
}
