//! JSON documents for structured sections.
//!
//! Each structured section type has its own envelope. The envelope is picked
//! from the section type recorded in the metadata, never guessed from the
//! JSON itself.

use mlxfw_layout::{EncodeOptions, Layout};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    DEV_INFO_SIZE, DevInfo, ForbiddenVersions, HASHES_TABLE_ENTRY_SIZE, HASHES_TABLE_HEADER_SIZE,
    HashesTableEntry, HashesTableHeader, IMAGE_INFO_SIZE, ImageError, ImageInfo,
    ImageSignature256, ImageSignature512, MfgInfo, PublicKeys2048, PublicKeys4096, Result,
    SectionType, ensure_len,
};

/// MFG_INFO section sizes seen in the field.
pub const MFG_INFO_SIZES: [usize; 2] = [256, 320];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfoDocument {
    pub image_info: ImageInfo,
    #[serde(default)]
    pub has_raw_data: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevInfoDocument {
    pub device_info: DevInfo,
    #[serde(default)]
    pub has_raw_data: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfgInfoDocument {
    pub mfg_info: MfgInfo,
    #[serde(default)]
    pub has_raw_data: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashesTableDocument {
    pub header: HashesTableHeader,
    #[serde(default)]
    pub entries: Vec<HashesTableEntry>,
    #[serde(default, with = "crate::encoding::hex_bytes")]
    pub reserved_tail: Vec<u8>,
    #[serde(default)]
    pub has_raw_data: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSignatureDocument<S> {
    pub image_signature: S,
    /// Bytes after the signature structure, up to the section size.
    #[serde(default, with = "crate::encoding::hex_bytes")]
    pub padding: Vec<u8>,
    #[serde(default)]
    pub has_raw_data: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeysDocument<K> {
    pub public_keys: K,
    #[serde(default)]
    pub has_raw_data: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenVersionsDocument {
    pub forbidden_versions: ForbiddenVersions,
    #[serde(default)]
    pub has_raw_data: bool,
}

/// A structured section document, dispatched on section type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SectionDocument {
    ImageInfo(ImageInfoDocument),
    DevInfo(DevInfoDocument),
    MfgInfo(MfgInfoDocument),
    HashesTable(HashesTableDocument),
    ImageSignature256(ImageSignatureDocument<ImageSignature256>),
    ImageSignature512(ImageSignatureDocument<ImageSignature512>),
    PublicKeys2048(PublicKeysDocument<PublicKeys2048>),
    PublicKeys4096(PublicKeysDocument<PublicKeys4096>),
    ForbiddenVersions(ForbiddenVersionsDocument),
}

fn parse<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

/// Zero-pad `bytes` to `size`. A zero `size` keeps the encoded length.
fn fit(mut bytes: Vec<u8>, size: usize, what: &str) -> Result<Vec<u8>> {
    if size == 0 {
        return Ok(bytes);
    }
    if bytes.len() > size {
        return Err(ImageError::InvalidData(format!(
            "{what} encodes to {} bytes, section is {size}",
            bytes.len()
        )));
    }
    bytes.resize(size, 0);
    Ok(bytes)
}

fn encode_sized<T: Layout>(value: &T, size: usize) -> Result<Vec<u8>> {
    Ok(mlxfw_layout::encode_with(
        value,
        &EncodeOptions::default().with_output_size(size),
    )?)
}

impl SectionDocument {
    /// Whether `section_type` has a structured document.
    pub const fn has_schema(section_type: SectionType) -> bool {
        matches!(
            section_type,
            SectionType::IMAGE_INFO
                | SectionType::DEV_INFO
                | SectionType::DEV_INFO1
                | SectionType::DEV_INFO2
                | SectionType::MFG_INFO
                | SectionType::HASHES_TABLE
                | SectionType::IMAGE_SIGNATURE_256
                | SectionType::IMAGE_SIGNATURE_512
                | SectionType::PUBLIC_KEYS_2048
                | SectionType::PUBLIC_KEYS_4096
                | SectionType::FORBIDDEN_VERSIONS
        )
    }

    /// Parse the document of a `section_type` section.
    pub fn from_json(section_type: SectionType, text: &str) -> Result<Self> {
        Ok(match section_type {
            SectionType::IMAGE_INFO => Self::ImageInfo(parse(text)?),
            ty if ty.is_dev_info() => Self::DevInfo(parse(text)?),
            SectionType::MFG_INFO => Self::MfgInfo(parse(text)?),
            SectionType::HASHES_TABLE => Self::HashesTable(parse(text)?),
            SectionType::IMAGE_SIGNATURE_256 => Self::ImageSignature256(parse(text)?),
            SectionType::IMAGE_SIGNATURE_512 => Self::ImageSignature512(parse(text)?),
            SectionType::PUBLIC_KEYS_2048 => Self::PublicKeys2048(parse(text)?),
            SectionType::PUBLIC_KEYS_4096 => Self::PublicKeys4096(parse(text)?),
            SectionType::FORBIDDEN_VERSIONS => Self::ForbiddenVersions(parse(text)?),
            other => {
                return Err(ImageError::NotSupported(format!(
                    "no JSON document for {other} sections"
                )));
            }
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(match self {
            Self::ImageInfo(doc) => serde_json::to_string_pretty(doc)?,
            Self::DevInfo(doc) => serde_json::to_string_pretty(doc)?,
            Self::MfgInfo(doc) => serde_json::to_string_pretty(doc)?,
            Self::HashesTable(doc) => serde_json::to_string_pretty(doc)?,
            Self::ImageSignature256(doc) => serde_json::to_string_pretty(doc)?,
            Self::ImageSignature512(doc) => serde_json::to_string_pretty(doc)?,
            Self::PublicKeys2048(doc) => serde_json::to_string_pretty(doc)?,
            Self::PublicKeys4096(doc) => serde_json::to_string_pretty(doc)?,
            Self::ForbiddenVersions(doc) => serde_json::to_string_pretty(doc)?,
        })
    }

    /// Set when the document cannot reproduce the section bytes.
    pub const fn has_raw_data(&self) -> bool {
        match self {
            Self::ImageInfo(doc) => doc.has_raw_data,
            Self::DevInfo(doc) => doc.has_raw_data,
            Self::MfgInfo(doc) => doc.has_raw_data,
            Self::HashesTable(doc) => doc.has_raw_data,
            Self::ImageSignature256(doc) => doc.has_raw_data,
            Self::ImageSignature512(doc) => doc.has_raw_data,
            Self::PublicKeys2048(doc) => doc.has_raw_data,
            Self::PublicKeys4096(doc) => doc.has_raw_data,
            Self::ForbiddenVersions(doc) => doc.has_raw_data,
        }
    }

    fn set_has_raw_data(&mut self, value: bool) {
        match self {
            Self::ImageInfo(doc) => doc.has_raw_data = value,
            Self::DevInfo(doc) => doc.has_raw_data = value,
            Self::MfgInfo(doc) => doc.has_raw_data = value,
            Self::HashesTable(doc) => doc.has_raw_data = value,
            Self::ImageSignature256(doc) => doc.has_raw_data = value,
            Self::ImageSignature512(doc) => doc.has_raw_data = value,
            Self::PublicKeys2048(doc) => doc.has_raw_data = value,
            Self::PublicKeys4096(doc) => doc.has_raw_data = value,
            Self::ForbiddenVersions(doc) => doc.has_raw_data = value,
        }
    }

    /// Encode the section payload, padded to `section_size` bytes.
    ///
    /// DEV_INFO is returned with the CRC field as given; callers that need a
    /// valid CRC recompute it over the first 508 bytes.
    pub fn to_bytes(&self, section_size: usize) -> Result<Vec<u8>> {
        match self {
            Self::ImageInfo(doc) => fit(
                encode_sized(&doc.image_info, IMAGE_INFO_SIZE)?,
                section_size,
                "IMAGE_INFO",
            ),
            Self::DevInfo(doc) => fit(
                encode_sized(&doc.device_info, DEV_INFO_SIZE)?,
                section_size,
                "DEV_INFO",
            ),
            Self::MfgInfo(doc) => {
                if section_size != 0 && !MFG_INFO_SIZES.contains(&section_size) {
                    return Err(ImageError::InvalidParameter {
                        name: "section_size".to_string(),
                        reason: format!("MFG_INFO must be 256 or 320 bytes, got {section_size}"),
                    });
                }
                fit(mlxfw_layout::encode(&doc.mfg_info)?, section_size, "MFG_INFO")
            }
            Self::HashesTable(doc) => {
                let mut bytes = mlxfw_layout::encode(&doc.header)?;
                for entry in &doc.entries {
                    bytes.extend(mlxfw_layout::encode(entry)?);
                }
                bytes.extend_from_slice(&doc.reserved_tail);
                fit(bytes, section_size, "HASHES_TABLE")
            }
            Self::ImageSignature256(doc) => {
                let mut bytes = mlxfw_layout::encode(&doc.image_signature)?;
                bytes.extend_from_slice(&doc.padding);
                fit(bytes, section_size, "IMAGE_SIGNATURE_256")
            }
            Self::ImageSignature512(doc) => {
                let mut bytes = mlxfw_layout::encode(&doc.image_signature)?;
                bytes.extend_from_slice(&doc.padding);
                fit(bytes, section_size, "IMAGE_SIGNATURE_512")
            }
            Self::PublicKeys2048(doc) => fit(
                mlxfw_layout::encode(&doc.public_keys)?,
                section_size,
                "PUBLIC_KEYS_2048",
            ),
            Self::PublicKeys4096(doc) => fit(
                mlxfw_layout::encode(&doc.public_keys)?,
                section_size,
                "PUBLIC_KEYS_4096",
            ),
            Self::ForbiddenVersions(doc) => {
                let list = &doc.forbidden_versions;
                let mut bytes = mlxfw_layout::encode(list)?;
                if section_size != 0 {
                    let slots = section_size.saturating_sub(8) / 4;
                    if list.versions.len() > slots {
                        return Err(ImageError::InvalidData(format!(
                            "{} forbidden versions do not fit {slots} slots",
                            list.versions.len()
                        )));
                    }
                    bytes.resize(8 + slots * 4, 0);
                }
                fit(bytes, section_size, "FORBIDDEN_VERSIONS")
            }
        }
    }

    /// Decode a section payload into its document.
    ///
    /// `has_raw_data` is set when encoding the document would not give back
    /// `payload` byte for byte. Types without a document yield `None`.
    pub fn from_payload(section_type: SectionType, payload: &[u8]) -> Result<Option<Self>> {
        let mut doc = match section_type {
            SectionType::IMAGE_INFO => Self::ImageInfo(ImageInfoDocument {
                image_info: mlxfw_layout::decode(payload)?,
                has_raw_data: false,
            }),
            ty if ty.is_dev_info() => Self::DevInfo(DevInfoDocument {
                device_info: mlxfw_layout::decode(payload)?,
                has_raw_data: false,
            }),
            SectionType::MFG_INFO => Self::MfgInfo(MfgInfoDocument {
                mfg_info: mlxfw_layout::decode(payload)?,
                has_raw_data: false,
            }),
            SectionType::HASHES_TABLE => {
                ensure_len(payload, HASHES_TABLE_HEADER_SIZE, "HASHES_TABLE header")?;
                let body = &payload[HASHES_TABLE_HEADER_SIZE..];
                let chunks = body.chunks_exact(HASHES_TABLE_ENTRY_SIZE);
                let reserved_tail = chunks.remainder().to_vec();
                Self::HashesTable(HashesTableDocument {
                    header: mlxfw_layout::decode(payload)?,
                    entries: chunks
                        .map(mlxfw_layout::decode)
                        .collect::<mlxfw_layout::Result<_>>()?,
                    reserved_tail,
                    has_raw_data: false,
                })
            }
            SectionType::IMAGE_SIGNATURE_256 => {
                Self::ImageSignature256(signature_document(payload)?)
            }
            SectionType::IMAGE_SIGNATURE_512 => {
                Self::ImageSignature512(signature_document(payload)?)
            }
            SectionType::PUBLIC_KEYS_2048 => Self::PublicKeys2048(PublicKeysDocument {
                public_keys: mlxfw_layout::decode(payload)?,
                has_raw_data: false,
            }),
            SectionType::PUBLIC_KEYS_4096 => Self::PublicKeys4096(PublicKeysDocument {
                public_keys: mlxfw_layout::decode(payload)?,
                has_raw_data: false,
            }),
            SectionType::FORBIDDEN_VERSIONS => {
                Self::ForbiddenVersions(ForbiddenVersionsDocument {
                    forbidden_versions: mlxfw_layout::decode(payload)?,
                    has_raw_data: false,
                })
            }
            _ => return Ok(None),
        };

        let exact = doc
            .to_bytes(payload.len())
            .is_ok_and(|bytes| bytes == payload);
        if !exact {
            debug!(section = %section_type, "document does not reproduce the payload");
        }
        doc.set_has_raw_data(!exact);
        Ok(Some(doc))
    }
}

fn signature_document<S: Layout>(payload: &[u8]) -> Result<ImageSignatureDocument<S>> {
    let signature: S = mlxfw_layout::decode(payload)?;
    let used = S::layout()?.total_size;
    Ok(ImageSignatureDocument {
        image_signature: signature,
        padding: payload[used.min(payload.len())..].to_vec(),
        has_raw_data: false,
    })
}
