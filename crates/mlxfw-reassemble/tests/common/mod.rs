//! A small FS4 extract directory and the image it should rebuild to.
//!
//! Layout of the 0x440-byte image:
//!
//! | range         | content                                     |
//! |---------------|---------------------------------------------|
//! | 0x000..0x010  | magic pattern                               |
//! | 0x010..0x018  | gap 0, fill 0xaa                            |
//! | 0x018..0x098  | HW pointers (boot2 -> 0x1000)               |
//! | 0x098..0x100  | gap 1, verbatim bytes                       |
//! | 0x100..0x120  | ITOC header                                 |
//! | 0x120..0x200  | gap 2, split: fill 0x11 then 16 x 0x5a      |
//! | 0x200..0x20c  | MAIN_CODE, 8 bytes + software CRC trailer   |
//! | 0x20c..0x220  | gap 3, fill 0x00 to the end of the segment  |
//! | 0x220..0x424  | DEV_INFO, 512 bytes + blank trailer         |
//! | 0x424..0x440  | gap 4, fill 0xff                            |

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mlxfw_image::encoding::encode_base64;
use mlxfw_image::{DevInfo, MAGIC_PATTERN, SectionType, TocHeader, TocKind, UidEntry};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const IMAGE_SIZE: usize = 0x440;
pub const MAIN_CODE_OFFSET: usize = 0x200;
pub const DEV_INFO_OFFSET: usize = 0x220;
pub const HW_POINTERS_OFFSET: usize = 0x18;
pub const MAIN_CODE: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

pub struct Fixture {
    pub dir: TempDir,
    pub expected: Vec<u8>,
    pub metadata: Value,
}

pub fn dev_info() -> DevInfo {
    DevInfo {
        minor_version: 1,
        major_version: 2,
        guids: UidEntry {
            step: 1,
            num_allocated: 8,
            uid: 0x1122_3344_5566_7788,
        },
        vsd: "MT_0000000911".to_string(),
        ..DevInfo::default()
    }
}

fn itoc_header() -> Vec<u8> {
    let mut bytes = mlxfw_layout::encode(&TocHeader::new(TocKind::Itoc)).unwrap();
    let crc = mlxfw_crc::toc_crc(&bytes).unwrap();
    bytes[28..32].copy_from_slice(&u32::from(crc).to_be_bytes());
    bytes
}

fn gap1_bytes() -> Vec<u8> {
    (0..0x68u8).collect()
}

fn expected_image() -> Vec<u8> {
    let mut image = vec![0xffu8; IMAGE_SIZE];
    image[0..8].copy_from_slice(&MAGIC_PATTERN.to_be_bytes());
    image[8..16].fill(0);
    image[0x10..0x18].fill(0xaa);

    image[0x18..0x98].fill(0);
    image[0x20..0x24].copy_from_slice(&0x1000u32.to_be_bytes());
    image[0x26..0x28].copy_from_slice(&[0x04, 0xc0]);

    image[0x98..0x100].copy_from_slice(&gap1_bytes());
    image[0x100..0x120].copy_from_slice(&itoc_header());
    image[0x120..0x140].fill(0x11);
    image[0x140..0x150].fill(0x5a);

    image[0x200..0x208].copy_from_slice(&MAIN_CODE);
    image[0x208..0x20c].copy_from_slice(&[0x00, 0x00, 0x40, 0x2f]);
    image[0x20c..0x220].fill(0);

    let mut dev = mlxfw_layout::encode(&dev_info()).unwrap();
    dev.resize(512, 0);
    mlxfw_crc::fix_dev_info_crc(&mut dev).unwrap();
    image[0x220..0x420].copy_from_slice(&dev);
    image
}

fn metadata(sha256: &str) -> Value {
    json!({
        "format": "FS4",
        "original_size": IMAGE_SIZE,
        "sha256": sha256,
        "magic_pattern": { "offset": 0 },
        "hw_pointers": {
            "offset": HW_POINTERS_OFFSET,
            "block": {
                "format": "FS4",
                "pointers": { "boot2_ptr": { "ptr": 0x1000, "crc": 0 } }
            }
        },
        "itoc": { "address": 0x100, "header_data": encode_base64(&itoc_header()) },
        "sections": [
            {
                "type": SectionType::MAIN_CODE.0,
                "offset": MAIN_CODE_OFFSET,
                "size": 8,
                "original_size": 12,
                "crc_type": "IN_SECTION"
            },
            {
                "type": SectionType::DEV_INFO.0,
                "offset": DEV_INFO_OFFSET,
                "size": 512,
                "original_size": 516,
                "crc_type": "IN_SECTION",
                "is_device_data": true
            }
        ],
        "memory_layout": [
            { "type": "section", "start": 0x000, "end": 0x010 },
            { "type": "gap", "start": 0x010, "end": 0x018 },
            { "type": "section", "start": 0x018, "end": 0x098 },
            { "type": "gap", "start": 0x098, "end": 0x100 },
            { "type": "section", "start": 0x100, "end": 0x120 },
            { "type": "gap", "start": 0x120, "end": 0x200 },
            { "type": "section", "start": 0x200, "end": 0x20c },
            { "type": "gap", "start": 0x20c, "end": 0x220 },
            { "type": "section", "start": 0x220, "end": 0x424 },
            { "type": "gap", "start": 0x424, "end": 0x440 }
        ]
    })
}

pub fn write(path: &Path, bytes: impl AsRef<[u8]>) {
    std::fs::write(path, bytes).unwrap();
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let expected = expected_image();
        let metadata = metadata(&mlxfw_reassemble::image_sha256(&expected));
        write(
            &root.join("firmware_metadata.json"),
            serde_json::to_string_pretty(&metadata).unwrap(),
        );

        let gaps = root.join("gaps");
        std::fs::create_dir(&gaps).unwrap();
        write(&gaps.join("gap_000_0x00000010.meta"), "size=8\nfill=0xaa\n");
        write(&gaps.join("gap_001_0x00000098.bin"), gap1_bytes());
        write(&gaps.join("gap_002_0x00000120.meta"), "size=32\nfill=0x11\n");
        write(&gaps.join("gap_002_0x00000140.bin"), [0x5a; 16]);
        write(&gaps.join("gap_003.meta"), "fill=0x00\n");
        write(&gaps.join("gap_004_0x00000424.meta"), "size=28\nfill=0xff\n");

        write(&root.join("MAIN_CODE_0x00000200.bin"), MAIN_CODE);

        // Binary copy carries a stale CRC; the JSON path recomputes it.
        let mut dev = mlxfw_layout::encode(&dev_info()).unwrap();
        dev.resize(512, 0);
        write(&root.join("DEV_INFO_0x00000220.bin"), &dev);
        write(
            &root.join("DEV_INFO_0x00000220.json"),
            serde_json::to_string_pretty(&json!({
                "device_info": {
                    "minor_version": 1,
                    "major_version": 2,
                    "guids": { "step": 1, "num_allocated": 8, "uid": 0x1122_3344_5566_7788u64 },
                    "vsd": "MT_0000000911",
                    "crc": 0
                }
            }))
            .unwrap(),
        );

        Self {
            dir,
            expected,
            metadata,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Rewrite the metadata after editing `self.metadata`.
    pub fn save_metadata(&self) {
        write(
            &self.file("firmware_metadata.json"),
            serde_json::to_string_pretty(&self.metadata).unwrap(),
        );
    }
}
