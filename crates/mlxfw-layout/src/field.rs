//! Field declarations.

use std::fmt;

use crate::{Layout, Result, StructLayout};

/// Byte order of a multi-byte field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    #[default]
    Big,
    Little,
    /// Platform byte order, resolved at encode/decode time.
    Host,
}

impl Endian {
    /// Resolve `Host` to the byte order of the running platform.
    pub fn resolve(self) -> Self {
        match self {
            Self::Host => {
                if cfg!(target_endian = "big") {
                    Self::Big
                } else {
                    Self::Little
                }
            }
            other => other,
        }
    }
}

/// Scalar field types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl Scalar {
    /// Storage size in bytes.
    pub fn size(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
        }
    }

    /// Storage width in bits.
    pub fn bits(self) -> u32 {
        self.size() as u32 * 8
    }

    /// Width used when a bit field does not declare one.
    pub fn default_bit_len(self) -> u32 {
        match self {
            Self::Bool => 1,
            other => other.bits(),
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    pub fn is_unsigned(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }
}

/// Shape of a Rust field type, reported by [`crate::FieldValue::shape`].
#[derive(Clone, Debug)]
pub enum Shape {
    Scalar(Scalar),
    /// `[T; N]`.
    Array(Box<Shape>, usize),
    /// `Vec<T>`; the declaration decides between fixed length, size
    /// reference and terminator.
    Seq(Box<Shape>),
    Struct(LayoutRef),
    /// NUL-padded ASCII text of a declared length.
    Text,
}

/// Reference to a nested struct layout, resolved during derivation.
#[derive(Clone, Copy)]
pub struct LayoutRef {
    name: &'static str,
    resolve: fn() -> Result<&'static StructLayout>,
}

impl LayoutRef {
    pub fn of<T: Layout>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            resolve: T::layout,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub fn resolve(&self) -> Result<&'static StructLayout> {
        (self.resolve)()
    }
}

impl fmt::Debug for LayoutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LayoutRef").field(&self.name).finish()
    }
}

/// Declared start of a field, as written in the declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OffsetDecl {
    Byte(&'static str),
    Bit(&'static str),
}

/// Declared extent of a `Vec` or text field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BoundDecl {
    #[default]
    None,
    /// Fixed number of elements (or bytes for text).
    Len(usize),
    /// Element count held by another field of the same struct.
    Count(&'static str),
    /// Elements run until this byte sequence.
    Terminator(&'static [u8]),
}

/// Declaration of one field.
///
/// Built with [`byte`] or [`bit`] and refined with the builder methods:
///
/// ```ignore
/// pub size: u32 => bit("0x8").bits(22),
/// pub year: u16 => byte("0xe").hex_as_dec(),
/// pub versions: Vec<u32> => byte("0x8").count("count"),
/// ```
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: &'static str,
    pub offset: OffsetDecl,
    pub bits: Option<u32>,
    pub endian: Endian,
    pub shape: Option<Shape>,
    pub bound: BoundDecl,
    pub reserved: bool,
    pub skip: bool,
    pub hex_as_dec: bool,
}

/// Field starting at a byte offset (`"0x1c"` or `"28"`).
pub fn byte(offset: &'static str) -> FieldDecl {
    FieldDecl::new(OffsetDecl::Byte(offset))
}

/// Bit field starting at an absolute bit offset from the struct start.
pub fn bit(offset: &'static str) -> FieldDecl {
    FieldDecl::new(OffsetDecl::Bit(offset))
}

impl FieldDecl {
    fn new(offset: OffsetDecl) -> Self {
        Self {
            name: "",
            offset,
            bits: None,
            endian: Endian::Big,
            shape: None,
            bound: BoundDecl::None,
            reserved: false,
            skip: false,
            hex_as_dec: false,
        }
    }

    #[must_use]
    pub fn bits(mut self, len: u32) -> Self {
        self.bits = Some(len);
        self
    }

    #[must_use]
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    #[must_use]
    pub fn little(self) -> Self {
        self.endian(Endian::Little)
    }

    #[must_use]
    pub fn host(self) -> Self {
        self.endian(Endian::Host)
    }

    #[must_use]
    pub fn reserved(mut self) -> Self {
        self.reserved = true;
        self
    }

    #[must_use]
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Stored as BCD: hex nibbles read as decimal digits.
    #[must_use]
    pub fn hex_as_dec(mut self) -> Self {
        self.hex_as_dec = true;
        self
    }

    #[must_use]
    pub fn len(mut self, len: usize) -> Self {
        self.bound = BoundDecl::Len(len);
        self
    }

    #[must_use]
    pub fn count(mut self, field: &'static str) -> Self {
        self.bound = BoundDecl::Count(field);
        self
    }

    #[must_use]
    pub fn until(mut self, terminator: &'static [u8]) -> Self {
        self.bound = BoundDecl::Terminator(terminator);
        self
    }

    #[doc(hidden)]
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    #[doc(hidden)]
    #[must_use]
    pub fn shaped(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }
}
