//! Declarative binary layouts for packed firmware structures.
//!
//! Every structure is declared once with [`layout!`], which produces the Rust
//! struct, its field descriptors and the glue to the codec. The descriptor
//! ([`StructLayout`]) is derived on first use and cached for the lifetime of
//! the process, so repeated encode/decode calls only read it.
//!
//! # Example
//!
//! ```ignore
//! use mlxfw_layout::{layout, encode, decode};
//!
//! layout! {
//!     #[derive(Clone, Debug, PartialEq, Eq)]
//!     pub struct HwPointerEntry {
//!         pub ptr: u32 => byte("0x0"),
//!         pub reserved: u16 => byte("0x4").reserved(),
//!         pub crc: u16 => byte("0x6"),
//!     }
//! }
//!
//! let bytes = encode(&HwPointerEntry { ptr: 0x1000, reserved: 0, crc: 0 })?;
//! let entry: HwPointerEntry = decode(&bytes)?;
//! ```

#[macro_use]
mod macros;

mod bits;
mod codec;
mod descriptor;
mod field;
mod value;

pub use bits::{from_bcd, to_bcd};
pub use codec::{DecodeOptions, EncodeOptions};
pub use descriptor::{Element, FieldKind, FieldLayout, ListBound, Placement, StructLayout};
pub use field::{BoundDecl, Endian, FieldDecl, LayoutRef, OffsetDecl, Scalar, Shape};
pub use value::{FieldValue, Record, Value};

/// Constructors available inside `layout!` field declarations.
pub mod decl {
    pub use crate::field::{bit, byte, Endian};
}

use thiserror::Error;

/// Layout engine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("schema error in {ty}.{field}: {reason}")]
    Schema {
        ty: String,
        field: String,
        reason: String,
    },
    #[error("cannot encode {field} = {value}: {reason}")]
    Encode {
        field: String,
        value: String,
        reason: String,
    },
    #[error("cannot decode {field} at offset {offset:#x} (input is {input_len} bytes): {reason}")]
    Decode {
        field: String,
        offset: usize,
        input_len: usize,
        reason: String,
    },
    #[error("data too short for {field}: need {expected} bytes, got {actual}")]
    DataTooShort {
        field: String,
        expected: usize,
        actual: usize,
    },
    #[error("field {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl LayoutError {
    pub(crate) fn type_mismatch(field: &str, expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            field: field.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    /// Prefix the field path with the name of the enclosing field.
    #[must_use]
    pub fn within(self, parent: &str) -> Self {
        let join = |field: String| format!("{parent}.{field}");
        match self {
            Self::Schema { ty, field, reason } => Self::Schema {
                ty,
                field: join(field),
                reason,
            },
            Self::Encode {
                field,
                value,
                reason,
            } => Self::Encode {
                field: join(field),
                value,
                reason,
            },
            Self::Decode {
                field,
                offset,
                input_len,
                reason,
            } => Self::Decode {
                field: join(field),
                offset,
                input_len,
                reason,
            },
            Self::DataTooShort {
                field,
                expected,
                actual,
            } => Self::DataTooShort {
                field: join(field),
                expected,
                actual,
            },
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => Self::TypeMismatch {
                field: join(field),
                expected,
                found,
            },
        }
    }

    /// Dotted path of the field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::Schema { field, .. }
            | Self::Encode { field, .. }
            | Self::Decode { field, .. }
            | Self::DataTooShort { field, .. }
            | Self::TypeMismatch { field, .. } => field,
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// A structure with a declared binary layout.
///
/// Implemented by [`layout!`]; hand-written impls are possible but must keep
/// `layout()` a pure function of `declare()`.
pub trait Layout: FieldValue + 'static {
    /// Raw field declarations, in declaration order.
    fn declare() -> Vec<FieldDecl>;

    /// The derived descriptor, computed once and cached.
    fn layout() -> Result<&'static StructLayout>;

    /// Field values keyed by field name.
    fn to_record(&self) -> Record;

    /// Rebuild the value from a decoded record. Missing fields take their
    /// placeholder (zero/empty) value.
    fn from_record(record: Record) -> Result<Self>;
}

/// Descriptor for `T`, derived on first call.
pub fn derive_layout<T: Layout>() -> Result<&'static StructLayout> {
    T::layout()
}

/// Encode `value` into exactly `total_size` bytes (more when it carries lists).
pub fn encode<T: Layout>(value: &T) -> Result<Vec<u8>> {
    encode_with(value, &EncodeOptions::default())
}

/// Encode `value` including its reserved fields.
pub fn encode_with_reserved<T: Layout>(value: &T) -> Result<Vec<u8>> {
    encode_with(value, &EncodeOptions::default().with_reserved())
}

/// Encode `value` with explicit options.
pub fn encode_with<T: Layout>(value: &T, opts: &EncodeOptions) -> Result<Vec<u8>> {
    let layout = T::layout()?;
    let mut buf = vec![0u8; layout.total_size];
    codec::encode_record(layout, &value.to_record(), &mut buf, 0, opts)?;
    codec::finish_output(layout, buf, opts.output_size)
}

/// Encode `value` over an existing buffer. Bytes not covered by an included
/// field keep their current contents.
pub fn encode_into<T: Layout>(value: &T, buf: &mut [u8], opts: &EncodeOptions) -> Result<()> {
    let layout = T::layout()?;
    if buf.len() < layout.total_size {
        return Err(LayoutError::Encode {
            field: layout.name.to_string(),
            value: format!("{} bytes", buf.len()),
            reason: format!("output buffer smaller than {} bytes", layout.total_size),
        });
    }
    let mut out = buf.to_vec();
    codec::encode_record(layout, &value.to_record(), &mut out, 0, opts)?;
    if out.len() != buf.len() {
        return Err(LayoutError::Encode {
            field: layout.name.to_string(),
            value: format!("{} bytes", buf.len()),
            reason: format!("encoded footprint is {} bytes", out.len()),
        });
    }
    buf.copy_from_slice(&out);
    Ok(())
}

/// Decode a `T` from the start of `bytes`.
pub fn decode<T: Layout>(bytes: &[u8]) -> Result<T> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decode a `T` including its reserved fields.
pub fn decode_with_reserved<T: Layout>(bytes: &[u8]) -> Result<T> {
    decode_with(bytes, &DecodeOptions::default().with_reserved())
}

/// Decode a `T` with explicit options.
pub fn decode_with<T: Layout>(bytes: &[u8], opts: &DecodeOptions) -> Result<T> {
    let layout = T::layout()?;
    let record = codec::decode_record(layout, bytes, 0, opts)?;
    T::from_record(record)
}

#[cfg(test)]
mod tests;
