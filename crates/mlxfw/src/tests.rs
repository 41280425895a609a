use super::*;

#[test]
fn test_checksum_kinds() {
    let data = [1u8, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(checksum(Checksum::Image, &data, 0, 0).unwrap(), 0x402f);

    let host: Vec<u8> = [0x0102_0304u32, 0x0506_0708]
        .iter()
        .flat_map(|w| w.to_ne_bytes())
        .collect();
    assert_eq!(checksum(Checksum::Software, &host, 0, 0).unwrap(), 0x402f);

    let entry = [0x00, 0x00, 0x10, 0x00, 0x00, 0x00];
    assert_eq!(checksum(Checksum::Hardware, &entry, 0, 6).unwrap(), 0x04c0);
}

#[test]
fn test_checksum_range_errors() {
    let data = [0u8; 8];
    assert!(matches!(
        checksum(Checksum::Image, &data, 9, 0),
        Err(Error::Crc(CrcError::InvalidParameter { .. }))
    ));
    assert!(matches!(
        checksum(Checksum::Image, &data, 4, 8),
        Err(Error::Crc(CrcError::DataTooShort { expected: 12, actual: 8, .. }))
    ));
}

#[test]
fn test_decode_dev_info() {
    let info = image::DevInfo {
        vsd: "MT_0000000911".to_string(),
        major_version: 2,
        ..image::DevInfo::default()
    };
    let payload = layout::encode(&info).unwrap();
    let json = decode_section(SectionType::DEV_INFO, &payload).unwrap();
    assert!(json.contains("\"device_info\""));
    assert!(json.contains("MT_0000000911"));

    let doc = SectionDocument::from_json(SectionType::DEV_INFO, &json).unwrap();
    assert_eq!(doc.to_bytes(512).unwrap(), payload);
}

#[test]
fn test_decode_unstructured_section() {
    let err = decode_section(SectionType::MAIN_CODE, &[0u8; 16]).unwrap_err();
    assert!(matches!(err, Error::Image(ImageError::NotSupported(_))));
}

#[test]
fn test_boot2_at_offset() {
    let mut data = vec![0xffu8; 4];
    let mut blob = vec![0u8; 20];
    blob[4..8].copy_from_slice(&1u32.to_be_bytes());
    blob[8..12].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    let crc = crc::image_crc(&blob, 4);
    blob[16..20].copy_from_slice(&u32::from(crc).to_be_bytes());
    data.extend(blob);

    assert_eq!(verify_boot2_at(&data, 4).unwrap(), crc);
    assert!(verify_boot2_at(&data, 0).is_err());
    assert!(verify_boot2_at(&data, 100).is_err());
}

#[test]
fn test_read_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob.bin");
    std::fs::write(&path, [1, 2, 3]).unwrap();
    assert_eq!(read_file(&path).unwrap(), vec![1, 2, 3]);
    assert!(matches!(
        read_file(&dir.path().join("missing.bin")),
        Err(Error::Io { .. })
    ));
}

#[test]
fn test_checksum_follows_crc_of() {
    let data: Vec<u8> = (0u8..32).collect();
    for (kind, algorithm) in [
        (Checksum::Image, CrcAlgorithm::Software),
        (Checksum::Hardware, CrcAlgorithm::Hardware),
    ] {
        assert_eq!(
            checksum(kind, &data, 4, 16).unwrap(),
            crc::crc_of(algorithm, &data, 4, 16).unwrap()
        );
    }
}

fn extract_dir_with_image_info() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let metadata = format!(
        r#"{{
            "format": "FS4",
            "original_size": 4096,
            "sections": [
                {{ "type": {}, "offset": 1024, "size": 1024 }},
                {{ "type": {}, "offset": 2048, "size": 512 }}
            ],
            "memory_layout": [
                {{ "type": "gap", "start": 0, "end": 1024 }},
                {{ "type": "section", "start": 1024, "end": 2560 }}
            ]
        }}"#,
        SectionType::IMAGE_INFO.0,
        SectionType::DEV_INFO.0
    );
    std::fs::write(dir.path().join("firmware_metadata.json"), metadata).unwrap();

    let mut info = image::ImageInfo::default();
    info.fw_version.major = 16;
    info.fw_version.minor = 35;
    info.fw_version.subminor = 12;
    info.psid = "MT_0000000911".to_string();
    let mut bytes = layout::encode(&info).unwrap();
    bytes.resize(1024, 0);
    std::fs::write(dir.path().join("IMAGE_INFO_0x00000400.bin"), bytes).unwrap();
    dir
}

#[test]
fn test_summarize_extract_dir() {
    let dir = extract_dir_with_image_info();
    let summary = summarize(dir.path()).unwrap();
    assert_eq!(summary.format, FirmwareFormat::Fs4);
    assert_eq!(summary.original_size, 4096);
    assert!(!summary.is_encrypted);
    assert_eq!(summary.sections, 2);
    assert_eq!(summary.gaps, 1);
    assert_eq!(summary.fw_version.as_deref(), Some("16.35.0012"));

    std::fs::remove_file(dir.path().join("IMAGE_INFO_0x00000400.bin")).unwrap();
    assert_eq!(summarize(dir.path()).unwrap().fw_version, None);
}

#[test]
fn test_decode_extracted_section() {
    let dir = extract_dir_with_image_info();
    let json = decode_extracted(dir.path(), SectionType::IMAGE_INFO, 0x400).unwrap();
    assert!(json.contains("\"image_info\""));
    assert!(json.contains("MT_0000000911"));

    assert!(matches!(
        decode_extracted(dir.path(), SectionType::IMAGE_INFO, 0x800),
        Err(Error::Image(ImageError::SectionNotFound { offset: 0x800, .. }))
    ));
    assert!(matches!(
        decode_extracted(dir.path(), SectionType::DEV_INFO, 0x800),
        Err(Error::Io { .. })
    ));
}
