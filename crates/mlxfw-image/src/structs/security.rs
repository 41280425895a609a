//! Signatures, public keys, hashes table and forbidden versions.

use mlxfw_layout::layout;
use serde::{Deserialize, Serialize};

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ImageSignature256 {
        pub signature_type: u32 => byte("0x0"),
        #[serde(with = "crate::encoding::base64_bytes")]
        pub signature: Vec<u8> => byte("0x4").len(256),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ImageSignature512 {
        pub signature_type: u32 => byte("0x0"),
        #[serde(with = "crate::encoding::base64_bytes")]
        pub signature: Vec<u8> => byte("0x4").len(512),
    }
}

layout! {
    /// 276-byte key slot.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PublicKey2048 {
        pub exp: u32 => byte("0x0"),
        #[serde(with = "crate::encoding::hex_bytes")]
        pub uuid: Vec<u8> => byte("0x4").len(16),
        #[serde(with = "crate::encoding::base64_bytes")]
        pub key: Vec<u8> => byte("0x14").len(256),
    }
}

layout! {
    /// 532-byte key slot.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PublicKey4096 {
        pub exp: u32 => byte("0x0"),
        #[serde(with = "crate::encoding::hex_bytes")]
        pub uuid: Vec<u8> => byte("0x4").len(16),
        #[serde(with = "crate::encoding::base64_bytes")]
        pub key: Vec<u8> => byte("0x14").len(512),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PublicKeys2048 {
        pub keys: Vec<PublicKey2048> => byte("0x0").len(8),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PublicKeys4096 {
        pub keys: Vec<PublicKey4096> => byte("0x0").len(8),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ForbiddenVersions {
        pub count: u32 => byte("0x0"),
        pub reserved: u32 => byte("0x4"),
        pub versions: Vec<u32> => byte("0x8").count("count"),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct HashesTableHeader {
        pub load_address: u32 => byte("0x0"),
        pub dw_size: u32 => byte("0x4"),
        #[serde(with = "crate::encoding::hex_bytes")]
        pub reserved: Vec<u8> => byte("0x8").len(20),
        pub crc: u32 => byte("0x1c"),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct HashesTableEntry {
        #[serde(with = "crate::encoding::hex_bytes")]
        pub hash: Vec<u8> => byte("0x0").len(64),
    }
}
