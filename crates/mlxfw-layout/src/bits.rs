//! Byte and bit level accessors.
//!
//! Callers check bounds; these helpers index directly.

use crate::field::Endian;

/// Read an unsigned integer of `size` bytes.
#[inline]
pub(crate) fn read_uint(data: &[u8], offset: usize, size: usize, endian: Endian) -> u64 {
    let bytes = &data[offset..offset + size];
    let mut buf = [0u8; 8];
    match endian.resolve() {
        Endian::Little => {
            buf[..size].copy_from_slice(bytes);
            u64::from_le_bytes(buf)
        }
        _ => {
            buf[8 - size..].copy_from_slice(bytes);
            u64::from_be_bytes(buf)
        }
    }
}

/// Write the low `size` bytes of `value`.
#[inline]
pub(crate) fn write_uint(data: &mut [u8], offset: usize, size: usize, value: u64, endian: Endian) {
    let target = &mut data[offset..offset + size];
    match endian.resolve() {
        Endian::Little => target.copy_from_slice(&value.to_le_bytes()[..size]),
        _ => target.copy_from_slice(&value.to_be_bytes()[8 - size..]),
    }
}

#[inline]
fn mask(len: u32) -> u128 {
    (1u128 << len) - 1
}

/// Bytes covering `[bit_offset, bit_offset + len)` and the number of bits
/// left unused after the field inside that range.
#[inline]
fn covering_range(bit_offset: usize, len: u32) -> (usize, usize, usize) {
    let start = bit_offset / 8;
    let end = (bit_offset + len as usize).div_ceil(8);
    let unused_at_end = (end - start) * 8 - (bit_offset - start * 8) - len as usize;
    (start, end, unused_at_end)
}

/// Extract a big-endian (MSB-first) bit field.
pub(crate) fn extract_be(data: &[u8], bit_offset: usize, len: u32) -> u64 {
    let (start, end, unused) = covering_range(bit_offset, len);
    let acc = data[start..end]
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
    ((acc >> unused) & mask(len)) as u64
}

/// Insert a big-endian (MSB-first) bit field, preserving neighbouring bits.
pub(crate) fn insert_be(data: &mut [u8], bit_offset: usize, len: u32, value: u64) {
    let (start, end, unused) = covering_range(bit_offset, len);
    let mut acc = data[start..end]
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));
    let field_mask = mask(len) << unused;
    acc = (acc & !field_mask) | ((u128::from(value) << unused) & field_mask);
    for byte in data[start..end].iter_mut().rev() {
        *byte = acc as u8;
        acc >>= 8;
    }
}

/// Extract a little-endian (LSB-first) bit field.
pub(crate) fn extract_le(data: &[u8], bit_offset: usize, len: u32) -> u64 {
    let mut value = 0u64;
    let mut done = 0u32;
    let mut pos = bit_offset;
    while done < len {
        let shift = (pos % 8) as u32;
        let take = (8 - shift).min(len - done);
        let part = (u32::from(data[pos / 8]) >> shift) & ((1u32 << take) - 1);
        value |= u64::from(part) << done;
        done += take;
        pos += take as usize;
    }
    value
}

/// Insert a little-endian (LSB-first) bit field, preserving neighbouring bits.
pub(crate) fn insert_le(data: &mut [u8], bit_offset: usize, len: u32, value: u64) {
    let mut done = 0u32;
    let mut pos = bit_offset;
    while done < len {
        let shift = (pos % 8) as u32;
        let take = (8 - shift).min(len - done);
        let local_mask = ((1u32 << take) - 1) << shift;
        let part = (((value >> done) as u32) << shift) & local_mask;
        let byte = &mut data[pos / 8];
        *byte = ((u32::from(*byte) & !local_mask) | part) as u8;
        done += take;
        pos += take as usize;
    }
}

/// Sign-extend the low `width` bits of `raw`.
pub(crate) fn sign_extend(raw: u64, width: u32) -> i64 {
    if width < 64 && raw & (1u64 << (width - 1)) != 0 {
        (raw | (!0u64 << width)) as i64
    } else {
        raw as i64
    }
}

/// Decode a BCD value of `width` bits: `0x2024` reads as `2024`.
pub fn from_bcd(raw: u64, width: u32) -> u64 {
    let mut value = 0u64;
    let mut scale = 1u64;
    for i in 0..width / 4 {
        let nibble = (raw >> (4 * i)) & 0xf;
        value = value.saturating_add(nibble.saturating_mul(scale));
        scale = scale.saturating_mul(10);
    }
    value
}

/// Encode `value` as BCD in `width` bits. `None` when it has too many digits.
pub fn to_bcd(value: u64, width: u32) -> Option<u64> {
    let mut rest = value;
    let mut raw = 0u64;
    for i in 0..width / 4 {
        raw |= (rest % 10) << (4 * i);
        rest /= 10;
    }
    (rest == 0).then_some(raw)
}
