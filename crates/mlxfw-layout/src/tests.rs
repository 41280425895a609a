use super::*;

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Flags {
        a: bool => bit("0"),
        b: u8 => bit("1").bits(7),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Wide {
        v: u16 => bit("6").bits(10),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct LittleNibbles {
        lo: u8 => bit("0").bits(4).little(),
        hi: u8 => bit("4").bits(4).little(),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Signed {
        v: i8 => bit("0").bits(4),
        w: i16 => byte("1"),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Entry {
        ptr: u32 => byte("0x0"),
        reserved: u16 => byte("0x4").reserved(),
        crc: u16 => byte("0x6"),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Versions {
        count: u32 => byte("0x0"),
        reserved: u32 => byte("0x4").reserved(),
        versions: Vec<u32> => byte("0x8").count("count"),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Terminated {
        entries: Vec<u16> => byte("0").until(&[0xff, 0xff]),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Date {
        year: u16 => byte("0").hex_as_dec(),
        day: u8 => byte("2").hex_as_dec(),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Pointers {
        entries: [Entry; 2] => byte("0"),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Outer {
        inner: Entry => byte("0"),
        flags: Flags => byte("8"),
    }
}

layout! {
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Tagged {
        tag: u8 => byte("0"),
        data: Vec<u8> => byte("1").len(4),
        psid: String => byte("5").len(16),
    }
}

layout! {
    struct BadOffset {
        v: u8 => byte("0xZZ"),
    }
}

layout! {
    struct MissingCount {
        items: Vec<u8> => byte("0").count("nope"),
    }
}

layout! {
    struct CountAfterList {
        items: Vec<u8> => byte("1").count("n"),
        n: u8 => byte("0"),
    }
}

layout! {
    struct BitArray {
        items: [u8; 2] => bit("0"),
    }
}

layout! {
    struct TooWide {
        v: u8 => bit("0").bits(9),
    }
}

fn schema_reason<T: Layout>() -> String {
    match derive_layout::<T>() {
        Err(LayoutError::Schema { reason, .. }) => reason,
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_bit_fields_share_a_byte() {
    let flags = Flags { a: true, b: 0x05 };
    let bytes = encode(&flags).unwrap();
    assert_eq!(bytes, vec![0x85]);
    assert_eq!(decode::<Flags>(&bytes).unwrap(), flags);
}

#[test]
fn test_bit_field_across_bytes_preserves_neighbours() {
    let mut buf = [0xfc, 0x00];
    encode_into(&Wide { v: 0x2ff }, &mut buf, &EncodeOptions::default()).unwrap();
    assert_eq!(buf, [0xfe, 0xff]);
    assert_eq!(decode::<Wide>(&buf).unwrap().v, 0x2ff);
}

#[test]
fn test_little_endian_bit_fields() {
    let value = LittleNibbles { lo: 0x3, hi: 0xa };
    let bytes = encode(&value).unwrap();
    assert_eq!(bytes, vec![0xa3]);
    assert_eq!(decode::<LittleNibbles>(&bytes).unwrap(), value);
}

#[test]
fn test_signed_fields_sign_extend() {
    let decoded = decode::<Signed>(&[0xf0, 0xff, 0xfe]).unwrap();
    assert_eq!(decoded, Signed { v: -1, w: -2 });

    let bytes = encode(&Signed { v: -8, w: 0 }).unwrap();
    assert_eq!(bytes[0], 0x80);

    assert_eq!(encode(&Signed { v: 7, w: 0 }).map(|b| b[0]), Ok(0x70));
    assert!(matches!(
        encode(&Signed { v: 8, w: 0 }),
        Err(LayoutError::Encode { ref field, .. }) if field == "v"
    ));
}

#[test]
fn test_decode_one_byte_short() {
    let err = decode::<Entry>(&[0u8; 7]).unwrap_err();
    assert_eq!(
        err,
        LayoutError::DataTooShort {
            field: "crc".to_string(),
            expected: 8,
            actual: 7,
        }
    );
}

#[test]
fn test_reserved_fields_are_zeroed_unless_requested() {
    let entry = Entry {
        ptr: 1,
        reserved: 0xbeef,
        crc: 2,
    };
    assert_eq!(encode(&entry).unwrap(), vec![0, 0, 0, 1, 0, 0, 0, 2]);
    assert_eq!(
        encode_with_reserved(&entry).unwrap(),
        vec![0, 0, 0, 1, 0xbe, 0xef, 0, 2]
    );

    let bytes = [0, 0, 0, 1, 0xbe, 0xef, 0, 2];
    assert_eq!(decode::<Entry>(&bytes).unwrap().reserved, 0);
    assert_eq!(decode_with_reserved::<Entry>(&bytes).unwrap(), entry);
}

#[test]
fn test_count_list_of_zero_elements() {
    let decoded = decode::<Versions>(&[0u8; 8]).unwrap();
    assert_eq!(decoded.count, 0);
    assert!(decoded.versions.is_empty());
}

#[test]
fn test_count_list_reads_count_elements() {
    let mut bytes = vec![0, 0, 0, 2, 0, 0, 0, 0];
    bytes.extend_from_slice(&[0, 0, 0, 7, 0, 0, 0, 9, 0xff, 0xff, 0xff, 0xff]);
    let decoded = decode::<Versions>(&bytes).unwrap();
    assert_eq!(decoded.versions, vec![7, 9]);

    let encoded = encode(&decoded).unwrap();
    assert_eq!(encoded, bytes[..16].to_vec());
}

#[test]
fn test_count_list_past_end_of_input() {
    let mut bytes = vec![0, 0, 0, 3, 0, 0, 0, 0];
    bytes.extend_from_slice(&[0u8; 8]);
    assert!(matches!(
        decode::<Versions>(&bytes),
        Err(LayoutError::Decode { ref field, .. }) if field == "versions"
    ));
}

#[test]
fn test_terminator_list() {
    let decoded = decode::<Terminated>(&[0, 1, 0, 2, 0xff, 0xff, 9, 9]).unwrap();
    assert_eq!(decoded.entries, vec![1, 2]);

    let unterminated = decode::<Terminated>(&[0, 1, 0, 2]).unwrap();
    assert_eq!(unterminated.entries, vec![1, 2]);

    let bytes = encode(&Terminated { entries: vec![1, 2] }).unwrap();
    assert_eq!(bytes, vec![0, 1, 0, 2, 0xff, 0xff]);
}

#[test]
fn test_bcd_fields() {
    let date = Date { year: 2024, day: 31 };
    let bytes = encode(&date).unwrap();
    assert_eq!(bytes, vec![0x20, 0x24, 0x31]);
    assert_eq!(decode::<Date>(&bytes).unwrap(), date);

    assert!(matches!(
        encode(&Date { year: 10_000, day: 1 }),
        Err(LayoutError::Encode { ref field, .. }) if field == "year"
    ));
}

#[test]
fn test_bcd_helpers() {
    assert_eq!(from_bcd(0x1234, 16), 1234);
    assert_eq!(to_bcd(1234, 16), Some(0x1234));
    assert_eq!(to_bcd(99, 8), Some(0x99));
    assert_eq!(to_bcd(100, 8), None);
}

#[test]
fn test_output_size() {
    let entry = Entry {
        ptr: 0x1000,
        reserved: 0,
        crc: 0,
    };
    let exact = encode_with(&entry, &EncodeOptions::default()).unwrap();
    assert_eq!(exact.len(), 8);

    let padded = encode_with(&entry, &EncodeOptions::default().with_output_size(16)).unwrap();
    assert_eq!(padded.len(), 16);
    assert_eq!(&padded[..8], exact.as_slice());
    assert!(padded[8..].iter().all(|&b| b == 0));

    assert!(matches!(
        encode_with(&entry, &EncodeOptions::default().with_output_size(4)),
        Err(LayoutError::Encode { .. })
    ));
}

#[test]
fn test_bit_field_overflow() {
    let err = encode(&Flags { a: false, b: 0x80 }).unwrap_err();
    assert!(matches!(err, LayoutError::Encode { ref field, .. } if field == "b"));
}

#[test]
fn test_nested_struct_errors_carry_path() {
    let outer = Outer {
        inner: Entry::default(),
        flags: Flags { a: false, b: 0x80 },
    };
    assert_eq!(encode(&outer).unwrap_err().field(), "flags.b");
}

#[test]
fn test_struct_arrays() {
    let pointers = Pointers {
        entries: [
            Entry {
                ptr: 0x10,
                reserved: 0,
                crc: 0x1234,
            },
            Entry {
                ptr: 0x20,
                reserved: 0,
                crc: 0x5678,
            },
        ],
    };
    let bytes = encode(&pointers).unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(&bytes[8..12], &[0, 0, 0, 0x20]);
    assert_eq!(decode::<Pointers>(&bytes).unwrap(), pointers);

    assert!(matches!(
        decode::<Pointers>(&bytes[..12]),
        Err(LayoutError::DataTooShort { .. })
    ));
}

#[test]
fn test_byte_arrays_and_text() {
    let tagged = Tagged {
        tag: 7,
        data: vec![1, 2],
        psid: "MT_0000000911".to_string(),
    };
    let bytes = encode(&tagged).unwrap();
    assert_eq!(bytes.len(), 21);
    assert_eq!(&bytes[..5], &[7, 1, 2, 0, 0]);
    assert_eq!(&bytes[5..18], b"MT_0000000911");
    assert!(bytes[18..].iter().all(|&b| b == 0));

    let decoded = decode::<Tagged>(&bytes).unwrap();
    assert_eq!(decoded.data, vec![1, 2, 0, 0]);
    assert_eq!(decoded.psid, "MT_0000000911");

    let long = Tagged {
        psid: "X".repeat(17),
        ..tagged
    };
    assert!(matches!(
        encode(&long),
        Err(LayoutError::Encode { ref field, .. }) if field == "psid"
    ));
}

#[test]
fn test_schema_errors() {
    assert!(schema_reason::<BadOffset>().contains("invalid offset"));
    assert!(schema_reason::<MissingCount>().contains("does not exist"));
    assert!(schema_reason::<CountAfterList>().contains("must precede"));
    assert!(schema_reason::<BitArray>().contains("cannot be inferred"));
    assert!(schema_reason::<TooWide>().contains("does not fit"));
}

#[test]
fn test_schema_error_names_type_and_field() {
    match derive_layout::<MissingCount>() {
        Err(LayoutError::Schema { ty, field, .. }) => {
            assert_eq!(ty, "MissingCount");
            assert_eq!(field, "items");
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_layout_is_cached() {
    let first = derive_layout::<Entry>().unwrap();
    let second = derive_layout::<Entry>().unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(&StructLayout::derive::<Entry>().unwrap(), first);
    assert_eq!(first.total_size, 8);
    assert!(first.field("reserved").unwrap().reserved);
}

#[test]
fn test_host_endian_resolves() {
    assert_ne!(Endian::Host.resolve(), Endian::Host);
    assert_eq!(Endian::Big.resolve(), Endian::Big);
}
