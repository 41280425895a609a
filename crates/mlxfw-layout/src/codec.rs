//! Encoder and decoder driven by a [`StructLayout`].

use crate::bits;
use crate::descriptor::{Element, FieldKind, FieldLayout, ListBound, Placement, StructLayout};
use crate::field::{Endian, Scalar};
use crate::value::{Record, Value};
use crate::{LayoutError, Result};

/// Encoder options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub include_reserved: bool,
    pub include_skipped: bool,
    /// Output length; `0` means the layout's footprint.
    pub output_size: usize,
}

impl EncodeOptions {
    #[must_use]
    pub const fn with_reserved(mut self) -> Self {
        self.include_reserved = true;
        self
    }

    #[must_use]
    pub const fn with_skipped(mut self) -> Self {
        self.include_skipped = true;
        self
    }

    #[must_use]
    pub const fn with_output_size(mut self, size: usize) -> Self {
        self.output_size = size;
        self
    }
}

/// Decoder options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub include_reserved: bool,
    pub include_skipped: bool,
}

impl DecodeOptions {
    #[must_use]
    pub const fn with_reserved(mut self) -> Self {
        self.include_reserved = true;
        self
    }

    #[must_use]
    pub const fn with_skipped(mut self) -> Self {
        self.include_skipped = true;
        self
    }
}

fn included(field: &FieldLayout, reserved: bool, skipped: bool) -> bool {
    (!field.skip || skipped) && (!field.reserved || reserved)
}

fn ensure_len(buf: &mut Vec<u8>, len: usize) {
    if buf.len() < len {
        buf.resize(len, 0);
    }
}

fn encode_error(field: &FieldLayout, value: impl ToString, reason: impl Into<String>) -> LayoutError {
    LayoutError::Encode {
        field: field.name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Pad or reject the encoded buffer against the requested output size.
pub(crate) fn finish_output(layout: &StructLayout, mut buf: Vec<u8>, output_size: usize) -> Result<Vec<u8>> {
    if output_size == 0 {
        return Ok(buf);
    }
    if output_size < buf.len() {
        return Err(LayoutError::Encode {
            field: layout.name.to_string(),
            value: format!("output_size={output_size}"),
            reason: format!("smaller than the {}-byte footprint", buf.len()),
        });
    }
    buf.resize(output_size, 0);
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub(crate) fn encode_record(
    layout: &StructLayout,
    record: &Record,
    buf: &mut Vec<u8>,
    base: usize,
    opts: &crate::EncodeOptions,
) -> Result<()> {
    for field in &layout.fields {
        if !included(field, opts.include_reserved, opts.include_skipped) {
            continue;
        }
        let Some(value) = record.get(field.name) else {
            continue;
        };
        encode_field(field, value, buf, base, opts)?;
    }
    Ok(())
}

/// Raw bits of a scalar value, range checked against `width`.
fn scalar_bits(field: &FieldLayout, scalar: Scalar, value: &Value, width: u32) -> Result<u64> {
    let raw = match value {
        Value::Bool(b) => u64::from(*b),
        Value::Uint(v) => *v,
        Value::Int(v) if scalar.is_signed() => {
            let min = -(1i128 << (width - 1));
            let max = (1i128 << (width - 1)) - 1;
            if i128::from(*v) < min || i128::from(*v) > max {
                return Err(encode_error(field, v, format!("does not fit in {width} signed bits")));
            }
            let bits = *v as u64;
            return Ok(if width < 64 { bits & ((1u64 << width) - 1) } else { bits });
        }
        Value::Int(v) if *v >= 0 => *v as u64,
        Value::Int(v) => {
            return Err(encode_error(field, v, "negative value for an unsigned field"));
        }
        other => {
            return Err(encode_error(field, other.kind_name(), "not a scalar value"));
        }
    };

    let raw = if field.hex_as_dec {
        bits::to_bcd(raw, width)
            .ok_or_else(|| encode_error(field, raw, format!("too many decimal digits for {width} bits")))?
    } else {
        raw
    };

    if width < 64 && raw >> width != 0 {
        return Err(encode_error(field, format!("{raw:#x}"), format!("overflows {width} bits")));
    }
    Ok(raw)
}

fn encode_element(
    field: &FieldLayout,
    element: &Element,
    value: &Value,
    buf: &mut Vec<u8>,
    offset: usize,
    opts: &crate::EncodeOptions,
) -> Result<()> {
    match element {
        Element::Scalar(scalar) => {
            let raw = scalar_bits(field, *scalar, value, scalar.bits())?;
            ensure_len(buf, offset + scalar.size());
            bits::write_uint(buf, offset, scalar.size(), raw, field.endian);
            Ok(())
        }
        Element::Struct(layout) => {
            let Value::Struct(record) = value else {
                return Err(LayoutError::type_mismatch(field.name, "struct", value));
            };
            ensure_len(buf, offset + layout.total_size);
            encode_record(layout, record, buf, offset, opts).map_err(|e| e.within(field.name))
        }
    }
}

fn list_items(field: &FieldLayout, value: &Value) -> Result<Vec<Value>> {
    value
        .clone()
        .into_elements()
        .ok_or_else(|| LayoutError::type_mismatch(field.name, "list", value))
}

fn encode_field(
    field: &FieldLayout,
    value: &Value,
    buf: &mut Vec<u8>,
    base: usize,
    opts: &crate::EncodeOptions,
) -> Result<()> {
    let offset = match field.placement {
        Placement::Bit { offset, len } => {
            let FieldKind::Scalar(scalar) = &field.kind else {
                return Err(encode_error(field, "bit field", "bit placement on a non-scalar field"));
            };
            let raw = scalar_bits(field, *scalar, value, len)?;
            let absolute = base * 8 + offset;
            ensure_len(buf, (absolute + len as usize).div_ceil(8));
            match field.endian.resolve() {
                Endian::Little => bits::insert_le(buf, absolute, len, raw),
                _ => bits::insert_be(buf, absolute, len, raw),
            }
            return Ok(());
        }
        Placement::Byte(offset) => base + offset,
    };

    match &field.kind {
        FieldKind::Scalar(scalar) => {
            let raw = scalar_bits(field, *scalar, value, scalar.bits())?;
            ensure_len(buf, offset + scalar.size());
            bits::write_uint(buf, offset, scalar.size(), raw, field.endian);
        }
        FieldKind::Array { element, len } => {
            if let (Value::Bytes(bytes), true) = (value, element.is_byte()) {
                if bytes.len() > *len {
                    return Err(encode_error(field, format!("{} bytes", bytes.len()), format!("exceeds {len} bytes")));
                }
                ensure_len(buf, offset + len);
                buf[offset..offset + bytes.len()].copy_from_slice(bytes);
                return Ok(());
            }
            let items = list_items(field, value)?;
            if items.len() > *len {
                return Err(encode_error(
                    field,
                    format!("{} elements", items.len()),
                    format!("exceeds {len} elements"),
                ));
            }
            let size = element.size();
            ensure_len(buf, offset + size * len);
            for (i, item) in items.iter().enumerate() {
                encode_element(field, element, item, buf, offset + i * size, opts)?;
            }
        }
        FieldKind::List { element, bound } => {
            let items = list_items(field, value)?;
            let size = element.size();
            for (i, item) in items.iter().enumerate() {
                encode_element(field, element, item, buf, offset + i * size, opts)?;
            }
            if let ListBound::Terminator(terminator) = bound {
                let at = offset + items.len() * size;
                ensure_len(buf, at + terminator.len());
                buf[at..at + terminator.len()].copy_from_slice(terminator);
            }
        }
        FieldKind::Struct(layout) => {
            let Value::Struct(record) = value else {
                return Err(LayoutError::type_mismatch(field.name, "struct", value));
            };
            ensure_len(buf, offset + layout.total_size);
            encode_record(layout, record, buf, offset, opts).map_err(|e| e.within(field.name))?;
        }
        FieldKind::Text(len) => {
            let bytes = match value {
                Value::Text(text) => text.as_bytes(),
                Value::Bytes(bytes) => bytes.as_slice(),
                other => return Err(LayoutError::type_mismatch(field.name, "text", other)),
            };
            if bytes.len() > *len {
                return Err(encode_error(
                    field,
                    String::from_utf8_lossy(bytes),
                    format!("longer than {len} bytes"),
                ));
            }
            ensure_len(buf, offset + len);
            buf[offset..offset + bytes.len()].copy_from_slice(bytes);
            buf[offset + bytes.len()..offset + len].fill(0);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

pub(crate) fn decode_record(
    layout: &StructLayout,
    data: &[u8],
    base: usize,
    opts: &crate::DecodeOptions,
) -> Result<Record> {
    let mut record = Record::new();
    for field in &layout.fields {
        if !included(field, opts.include_reserved, opts.include_skipped) {
            continue;
        }
        let value = decode_field(layout, field, data, base, opts)?;
        record.insert(field.name, value);
    }
    Ok(record)
}

fn too_short(field: &FieldLayout, expected: usize, actual: usize) -> LayoutError {
    LayoutError::DataTooShort {
        field: field.name.to_string(),
        expected,
        actual,
    }
}

fn finish_scalar(field: &FieldLayout, scalar: Scalar, raw: u64, width: u32) -> Value {
    let raw = if field.hex_as_dec {
        bits::from_bcd(raw, width)
    } else {
        raw
    };
    match scalar {
        Scalar::Bool => Value::Bool(raw != 0),
        s if s.is_signed() => Value::Int(bits::sign_extend(raw, width)),
        _ => Value::Uint(raw),
    }
}

/// Raw unsigned contents of a scalar field, ignoring inclusion flags.
fn read_raw(field: &FieldLayout, data: &[u8], base: usize) -> Result<u64> {
    let FieldKind::Scalar(scalar) = &field.kind else {
        return Err(too_short(field, 0, data.len()));
    };
    match field.placement {
        Placement::Bit { offset, len } => {
            let absolute = base * 8 + offset;
            let end = (absolute + len as usize).div_ceil(8);
            if end > data.len() {
                return Err(too_short(field, end, data.len()));
            }
            Ok(match field.endian.resolve() {
                Endian::Little => bits::extract_le(data, absolute, len),
                _ => bits::extract_be(data, absolute, len),
            })
        }
        Placement::Byte(offset) => {
            let start = base + offset;
            let end = start + scalar.size();
            if end > data.len() {
                return Err(too_short(field, end, data.len()));
            }
            Ok(bits::read_uint(data, start, scalar.size(), field.endian))
        }
    }
}

fn decode_element(
    field: &FieldLayout,
    element: &Element,
    data: &[u8],
    offset: usize,
    opts: &crate::DecodeOptions,
) -> Result<Value> {
    match element {
        Element::Scalar(scalar) => {
            let raw = bits::read_uint(data, offset, scalar.size(), field.endian);
            Ok(finish_scalar(field, *scalar, raw, scalar.bits()))
        }
        Element::Struct(layout) => decode_record(layout, data, offset, opts)
            .map(Value::Struct)
            .map_err(|e| e.within(field.name)),
    }
}

fn decode_elements(
    field: &FieldLayout,
    element: &Element,
    data: &[u8],
    offset: usize,
    count: usize,
    opts: &crate::DecodeOptions,
) -> Result<Value> {
    let size = element.size();
    if element.is_byte() {
        return Ok(Value::Bytes(data[offset..offset + count].to_vec()));
    }
    (0..count)
        .map(|i| decode_element(field, element, data, offset + i * size, opts))
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

fn decode_field(
    layout: &StructLayout,
    field: &FieldLayout,
    data: &[u8],
    base: usize,
    opts: &crate::DecodeOptions,
) -> Result<Value> {
    let offset = match field.placement {
        Placement::Bit { len, .. } => {
            let FieldKind::Scalar(scalar) = &field.kind else {
                return Err(too_short(field, 0, data.len()));
            };
            let raw = read_raw(field, data, base)?;
            return Ok(finish_scalar(field, *scalar, raw, len));
        }
        Placement::Byte(offset) => base + offset,
    };

    let end = offset + field.span();
    if end > data.len() {
        return Err(too_short(field, end, data.len()));
    }

    match &field.kind {
        FieldKind::Scalar(scalar) => {
            let raw = bits::read_uint(data, offset, scalar.size(), field.endian);
            Ok(finish_scalar(field, *scalar, raw, scalar.bits()))
        }
        FieldKind::Array { element, len } => decode_elements(field, element, data, offset, *len, opts),
        FieldKind::List { element, bound } => {
            let size = element.size();
            match bound {
                ListBound::Count { index, .. } => {
                    let count = read_raw(&layout.fields[*index], data, base)?;
                    let remaining = data.len() - offset;
                    let needed = usize::try_from(count)
                        .ok()
                        .and_then(|c| c.checked_mul(size))
                        .filter(|&n| n <= remaining);
                    let Some(needed) = needed else {
                        return Err(LayoutError::Decode {
                            field: field.name.to_string(),
                            offset,
                            input_len: data.len(),
                            reason: format!("count {count} exceeds the {remaining} remaining bytes"),
                        });
                    };
                    decode_elements(field, element, data, offset, needed / size.max(1), opts)
                }
                ListBound::Terminator(terminator) => {
                    let mut count = 0;
                    let mut at = offset;
                    while at + size <= data.len() && &data[at..at + size] != *terminator {
                        count += 1;
                        at += size;
                    }
                    decode_elements(field, element, data, offset, count, opts)
                }
            }
        }
        FieldKind::Struct(nested) => decode_record(nested, data, offset, opts)
            .map(Value::Struct)
            .map_err(|e| e.within(field.name)),
        FieldKind::Text(len) => {
            let raw = &data[offset..offset + len];
            let text_end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            Ok(Value::Text(String::from_utf8_lossy(&raw[..text_end]).into_owned()))
        }
    }
}
