//! End-to-end reassembly of extract directories.

mod common;

use common::{DEV_INFO_OFFSET, Fixture, HW_POINTERS_OFFSET, IMAGE_SIZE, MAIN_CODE, MAIN_CODE_OFFSET, write};
use mlxfw_crc::CrcError;
use mlxfw_image::{FirmwareMetadata, HW_POINTER_COUNT, HW_POINTER_ENTRY_SIZE, ImageError};
use mlxfw_reassemble::{
    ExtractDir, ReassembleError, ReassembleOptions, Reassembler, reassemble, write_output,
};
use serde_json::json;

#[test]
fn test_round_trip_matches_recorded_hash() {
    let fixture = Fixture::new();
    let outcome = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap();

    assert_eq!(outcome.image.len(), IMAGE_SIZE);
    assert_eq!(outcome.image, fixture.expected);
    assert_eq!(outcome.sha256_match, Some(true));
    assert_eq!(outcome.sections_from_json, 1);
    assert_eq!(outcome.sections_from_binary, 1);
}

#[test]
fn test_preparsed_metadata_overrides_file() {
    let fixture = Fixture::new();
    let metadata = FirmwareMetadata::from_json(&fixture.metadata.to_string()).unwrap();
    write(&fixture.file("firmware_metadata.json"), "not json");

    let reassembler = Reassembler::new(
        ExtractDir::with_metadata(fixture.path(), metadata),
        ReassembleOptions::default(),
    );
    assert_eq!(reassembler.extract_dir().root(), fixture.path());
    let outcome = reassembler.run().unwrap();
    assert_eq!(outcome.image, fixture.expected);
    assert_eq!(outcome.sha256_match, Some(true));
}

#[test]
fn test_gap_fill_bytes() {
    let fixture = Fixture::new();
    let image = reassemble(fixture.path(), &ReassembleOptions::default())
        .unwrap()
        .image;

    assert!(image[0x10..0x18].iter().all(|&b| b == 0xaa));
    assert!(image[0x120..0x140].iter().all(|&b| b == 0x11));
    assert!(image[0x140..0x150].iter().all(|&b| b == 0x5a));
    assert!(image[0x20c..0x220].iter().all(|&b| b == 0x00));
    assert!(image[0x424..0x440].iter().all(|&b| b == 0xff));
}

#[test]
fn test_hw_pointer_crcs_consistent() {
    let fixture = Fixture::new();
    let image = reassemble(fixture.path(), &ReassembleOptions::default())
        .unwrap()
        .image;

    let block = &image[HW_POINTERS_OFFSET..HW_POINTERS_OFFSET + 128];
    let mut set = 0;
    for entry in block.chunks_exact(HW_POINTER_ENTRY_SIZE).take(HW_POINTER_COUNT) {
        let ptr = u32::from_be_bytes(entry[0..4].try_into().unwrap());
        if ptr == 0 || ptr == u32::MAX {
            continue;
        }
        set += 1;
        let crc = mlxfw_crc::hardware_crc(&entry[..6]);
        assert_eq!(crc.to_be_bytes(), [entry[6], entry[7]]);
    }
    assert_eq!(set, 1);
}

#[test]
fn test_software_trailer_appended() {
    let fixture = Fixture::new();
    let image = reassemble(fixture.path(), &ReassembleOptions::default())
        .unwrap()
        .image;
    let trailer = &image[MAIN_CODE_OFFSET + 8..MAIN_CODE_OFFSET + 12];
    assert_eq!(trailer, &[0x00, 0x00, 0x40, 0x2f]);
}

#[test]
fn test_dev_info_crc_recomputed_from_json() {
    let fixture = Fixture::new();
    let image = reassemble(fixture.path(), &ReassembleOptions::default())
        .unwrap()
        .image;

    let dev = &image[DEV_INFO_OFFSET..DEV_INFO_OFFSET + 512];
    let crc = mlxfw_crc::image_crc(&dev[..508], 127);
    assert_ne!(crc, 0);
    assert_eq!(&dev[510..512], &crc.to_be_bytes());
    assert_eq!(&dev[0x100..0x10d], b"MT_0000000911");
    assert_eq!(
        &image[DEV_INFO_OFFSET + 512..DEV_INFO_OFFSET + 516],
        &[0xff; 4]
    );
}

#[test]
fn test_binary_only_ignores_json() {
    let fixture = Fixture::new();
    let opts = ReassembleOptions::default().with_binary_only();
    let outcome = reassemble(fixture.path(), &opts).unwrap();

    assert_eq!(outcome.sections_from_json, 0);
    assert_eq!(outcome.sections_from_binary, 2);
    // The binary DEV_INFO still carries a zero CRC.
    let dev = &outcome.image[DEV_INFO_OFFSET..DEV_INFO_OFFSET + 512];
    assert_eq!(&dev[508..512], &[0, 0, 0, 0]);
    assert_eq!(outcome.sha256_match, Some(false));
}

#[test]
fn test_raw_data_json_falls_back_to_binary() {
    let fixture = Fixture::new();
    std::fs::write(
        fixture.file("DEV_INFO_0x00000220.json"),
        json!({ "device_info": {}, "has_raw_data": true }).to_string(),
    )
    .unwrap();
    let outcome = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap();
    assert_eq!(outcome.sections_from_json, 0);
}

#[test]
fn test_unreadable_json_without_binary() {
    let fixture = Fixture::new();
    write(&fixture.file("DEV_INFO_0x00000220.json"), "{ not json");
    std::fs::remove_file(fixture.file("DEV_INFO_0x00000220.bin")).unwrap();

    let err = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap_err();
    match err {
        ReassembleError::Section { name, offset, source } => {
            assert_eq!(name, "DEV_INFO@0x00000220");
            assert_eq!(offset, 0x220);
            assert!(matches!(*source, ReassembleError::ReconstructionFailed { .. }));
        }
        other => panic!("expected section error, got {other:?}"),
    }
}

#[test]
fn test_missing_section_file() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.file("MAIN_CODE_0x00000200.bin")).unwrap();

    let err = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap_err();
    assert!(matches!(
        err.root(),
        ReassembleError::MissingSectionFile { section, .. } if section == "MAIN_CODE@0x00000200"
    ));
}

#[test]
fn test_gap_count_mismatch() {
    let fixture = Fixture::new();
    std::fs::remove_file(fixture.file("gaps/gap_004_0x00000424.meta")).unwrap();

    let err = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ReassembleError::GapCountMismatch {
            expected: 5,
            found: 4
        }
    ));
}

#[test]
fn test_gap_descriptors_without_gap_dir() {
    let mut fixture = Fixture::new();
    std::fs::remove_dir_all(fixture.file("gaps")).unwrap();
    fixture.metadata["gaps"] = json!([
        { "start": 0x10, "size": 8, "fill": 0xaa },
        { "start": 0x98, "size": 0x68, "fill": 0x00 }
    ]);
    fixture.save_metadata();

    let image = reassemble(fixture.path(), &ReassembleOptions::default())
        .unwrap()
        .image;
    assert!(image[0x10..0x18].iter().all(|&b| b == 0xaa));
    assert!(image[0x98..0x100].iter().all(|&b| b == 0x00));
}

#[test]
fn test_verbatim_gap_descriptor_needs_file() {
    let mut fixture = Fixture::new();
    std::fs::remove_dir_all(fixture.file("gaps")).unwrap();
    fixture.metadata["gaps"] = json!([
        { "start": 0x10, "size": 8, "fill": 0xaa },
        { "start": 0x98, "size": 0x68 }
    ]);
    fixture.save_metadata();

    let err = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ReassembleError::ReconstructionFailed { section, .. } if section == "gap@0x00000098"
    ));
}

#[test]
fn test_verify_crc_clean_image() {
    let fixture = Fixture::new();
    let outcome =
        reassemble(fixture.path(), &ReassembleOptions::default().with_verify_crc()).unwrap();
    assert!(outcome.crc_mismatches.is_empty());
}

#[test]
fn test_strict_crc_rejects_bad_trailer() {
    let fixture = Fixture::new();
    // Full-length binary keeps its (wrong) trailer.
    write(
        &fixture.file("MAIN_CODE_0x00000200.bin"),
        [1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0x12, 0x34],
    );

    let lenient =
        reassemble(fixture.path(), &ReassembleOptions::default().with_verify_crc()).unwrap();
    assert_eq!(lenient.crc_mismatches.len(), 1);
    assert!(matches!(
        &lenient.crc_mismatches[0],
        CrcError::CrcMismatch { expected: 0x402f, actual: 0x1234, .. }
    ));

    let err =
        reassemble(fixture.path(), &ReassembleOptions::default().with_strict_crc()).unwrap_err();
    assert!(matches!(err, ReassembleError::Crc(CrcError::CrcMismatch { .. })));
}

#[test]
fn test_encrypted_image_skips_crc_checks() {
    let mut fixture = Fixture::new();
    fixture.metadata["is_encrypted"] = json!(true);
    fixture.save_metadata();
    write(
        &fixture.file("MAIN_CODE_0x00000200.bin"),
        [1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0x12, 0x34],
    );

    let outcome =
        reassemble(fixture.path(), &ReassembleOptions::default().with_strict_crc()).unwrap();
    assert!(outcome.crc_mismatches.is_empty());
    assert_eq!(&outcome.image[0x208..0x20c], &[0x00, 0x00, 0x12, 0x34]);
}

#[test]
fn test_encrypted_sections_stay_verbatim() {
    let mut fixture = Fixture::new();
    fixture.metadata["is_encrypted"] = json!(true);
    fixture.save_metadata();

    let outcome = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap();
    let image = &outcome.image;
    assert_eq!(outcome.sections_from_json, 0);
    assert_eq!(outcome.sections_from_binary, 2);

    // No trailer is appended to the 8-byte payload.
    assert_eq!(&image[MAIN_CODE_OFFSET..MAIN_CODE_OFFSET + 8], &MAIN_CODE);
    assert_eq!(&image[0x208..0x20c], &[0xff; 4]);

    // DEV_INFO keeps the stale CRC of its binary file.
    let dev = std::fs::read(fixture.file("DEV_INFO_0x00000220.bin")).unwrap();
    assert_eq!(&image[DEV_INFO_OFFSET..DEV_INFO_OFFSET + 512], &dev[..]);
    assert_ne!(&image[DEV_INFO_OFFSET..DEV_INFO_OFFSET + 512], &fixture.expected[0x220..0x420]);
}

#[test]
fn test_fs3_image_has_no_magic_or_hw_pointers() {
    let mut fixture = Fixture::new();
    fixture.metadata["format"] = json!("FS3");
    fixture.save_metadata();

    let outcome = reassemble(fixture.path(), &ReassembleOptions::default()).unwrap();
    assert_eq!(outcome.sha256_match, Some(false));

    let mut want = fixture.expected.clone();
    want[..0x10].fill(0xff);
    want[HW_POINTERS_OFFSET..0x98].fill(0xff);
    assert_eq!(outcome.image, want);
}

#[test]
fn test_size_limit() {
    let fixture = Fixture::new();
    let opts = ReassembleOptions::default().with_size_limit(0x100);
    let err = reassemble(fixture.path(), &opts).unwrap_err();
    assert!(matches!(
        err,
        ReassembleError::Image(ImageError::FileTooLarge { size: 0x440, limit: 0x100 })
    ));
}

#[test]
fn test_sha256_check_disabled() {
    let fixture = Fixture::new();
    let opts = ReassembleOptions::default().with_verify_sha256(false);
    let outcome = reassemble(fixture.path(), &opts).unwrap();
    assert_eq!(outcome.sha256_match, None);
}

#[test]
fn test_write_output_replaces_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fw.bin");
    std::fs::write(&path, b"old").unwrap();

    write_output(&path, &[1, 2, 3]).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
