use std::path::Path;

use super::*;

#[test]
fn test_gap_file_names() {
    let piece = parse_gap_file_name(Path::new("gaps/gap_002_0x00000140.bin"))
        .unwrap()
        .unwrap();
    assert_eq!(piece.index, 2);
    assert_eq!(piece.start, Some(0x140));
    assert_eq!(piece.kind, GapFile::Binary);

    let piece = parse_gap_file_name(Path::new("gap_017_after_boot2.meta"))
        .unwrap()
        .unwrap();
    assert_eq!(piece.index, 17);
    assert_eq!(piece.start, None);
    assert_eq!(piece.kind, GapFile::Meta);

    assert!(parse_gap_file_name(Path::new("gap_001.txt")).unwrap().is_none());
    assert!(parse_gap_file_name(Path::new("MAIN_CODE_0x1000.bin")).unwrap().is_none());
}

#[test]
fn test_meta_parsing() {
    let fill = parse_meta("size=4096\nfill=0x00\n").unwrap();
    assert_eq!(fill, GapFill { size: Some(4096), fill: 0 });

    let fill = parse_meta("# erased\n\n fill = 0xAB \n").unwrap();
    assert_eq!(fill, GapFill { size: None, fill: 0xab });

}

#[test]
fn test_meta_requires_fill() {
    assert!(matches!(
        parse_meta("size=16\n"),
        Err(ReassembleError::Image(ImageError::InvalidData(_)))
    ));
    assert!(parse_meta("").is_err());
}

#[test]
fn test_meta_rejects_bad_values() {
    assert!(parse_meta("fill=0x100").is_err());
    assert!(parse_meta("size=-1").is_err());
    assert!(parse_meta("garbage").is_err());
}

#[test]
fn test_options_builders() {
    let opts = ReassembleOptions::default();
    assert!(opts.verify_sha256);
    assert!(!opts.verify_crc);
    assert_eq!(opts.size_limit, DEFAULT_SIZE_LIMIT);

    let strict = ReassembleOptions::default().with_strict_crc();
    assert!(strict.verify_crc && strict.strict_crc);
}

#[test]
fn test_error_root_sees_through_section() {
    let err = ReassembleError::Section {
        name: "MAIN_CODE@0x00001000".to_string(),
        offset: 0x1000,
        source: Box::new(ReassembleError::GapCountMismatch { expected: 1, found: 0 }),
    };
    assert!(matches!(err.root(), ReassembleError::GapCountMismatch { .. }));
    assert!(err.to_string().starts_with("MAIN_CODE@0x00001000 at 0x1000"));
}
