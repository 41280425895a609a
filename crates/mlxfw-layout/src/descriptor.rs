//! Struct descriptors derived from field declarations.

use rustc_hash::FxHashSet;

use crate::field::{BoundDecl, Endian, FieldDecl, OffsetDecl, Scalar, Shape};
use crate::{Layout, LayoutError, Result};

/// Resolved position of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Starts at this byte offset from the struct start.
    Byte(usize),
    /// Occupies bits `[offset, offset + len)` from the struct start.
    Bit { offset: usize, len: u32 },
}

/// Element type of an array or list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    Scalar(Scalar),
    Struct(&'static StructLayout),
}

impl Element {
    pub fn size(&self) -> usize {
        match self {
            Self::Scalar(scalar) => scalar.size(),
            Self::Struct(layout) => layout.total_size,
        }
    }

    pub(crate) fn is_byte(&self) -> bool {
        matches!(self, Self::Scalar(Scalar::U8))
    }
}

/// How a variable-length list ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListBound {
    /// Count held by the field at `index` in the owning struct.
    Count { index: usize, name: &'static str },
    Terminator(&'static [u8]),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(Scalar),
    Array { element: Element, len: usize },
    List { element: Element, bound: ListBound },
    Struct(&'static StructLayout),
    Text(usize),
}

/// A fully resolved field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub placement: Placement,
    pub endian: Endian,
    pub kind: FieldKind,
    pub reserved: bool,
    pub skip: bool,
    pub hex_as_dec: bool,
}

impl FieldLayout {
    /// First byte touched by the field.
    pub fn byte_offset(&self) -> usize {
        match self.placement {
            Placement::Byte(offset) => offset,
            Placement::Bit { offset, .. } => offset / 8,
        }
    }

    /// Fixed footprint in bytes. Lists only count their terminator.
    pub fn span(&self) -> usize {
        match &self.kind {
            FieldKind::Scalar(scalar) => scalar.size(),
            FieldKind::Array { element, len } => element.size() * len,
            FieldKind::List { .. } => 0,
            FieldKind::Struct(layout) => layout.total_size,
            FieldKind::Text(len) => *len,
        }
    }

    /// One past the last byte of the fixed footprint.
    pub fn end(&self) -> usize {
        match self.placement {
            Placement::Byte(offset) => offset + self.span(),
            Placement::Bit { offset, len } => (offset + len as usize).div_ceil(8),
        }
    }

    pub fn is_bit_field(&self) -> bool {
        matches!(self.placement, Placement::Bit { .. })
    }
}

/// Descriptor of a declared struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructLayout {
    pub name: &'static str,
    pub fields: Vec<FieldLayout>,
    /// Maximum end offset across all fields.
    pub total_size: usize,
}

impl StructLayout {
    /// Derive the descriptor of `T` from its declarations.
    pub fn derive<T: Layout>() -> Result<Self> {
        Self::from_decls(std::any::type_name::<T>(), T::declare())
    }

    /// Validate declarations and resolve them into a descriptor.
    pub fn from_decls(name: &'static str, decls: Vec<FieldDecl>) -> Result<Self> {
        let short_name = name.rsplit("::").next().unwrap_or(name);
        let names: Vec<&'static str> = decls.iter().map(|d| d.name).collect();
        let mut seen = FxHashSet::default();
        let mut fields: Vec<FieldLayout> = Vec::with_capacity(decls.len());

        for decl in decls {
            let schema = |reason: String| LayoutError::Schema {
                ty: short_name.to_string(),
                field: decl.name.to_string(),
                reason,
            };

            if !seen.insert(decl.name) {
                return Err(schema("duplicate field name".to_string()));
            }
            let shape = decl
                .shape
                .as_ref()
                .ok_or_else(|| schema("field has no type shape".to_string()))?;
            let kind = resolve_kind(shape, &decl.bound, &fields, &names).map_err(schema)?;

            let placement = match &decl.offset {
                OffsetDecl::Byte(text) => {
                    if decl.bits.is_some() {
                        return Err(schema("bit length given for a byte-aligned field".to_string()));
                    }
                    Placement::Byte(parse_offset(text).map_err(schema)?)
                }
                OffsetDecl::Bit(text) => {
                    let offset = parse_offset(text).map_err(schema)?;
                    let FieldKind::Scalar(scalar) = &kind else {
                        return Err(schema("bit width cannot be inferred for a non-scalar field".to_string()));
                    };
                    let len = decl.bits.unwrap_or_else(|| scalar.default_bit_len());
                    if len == 0 || len > scalar.bits() {
                        return Err(schema(format!(
                            "bit length {len} does not fit a {}-bit field",
                            scalar.bits()
                        )));
                    }
                    Placement::Bit { offset, len }
                }
            };

            if decl.hex_as_dec && !matches!(&kind, FieldKind::Scalar(s) if s.is_unsigned()) {
                return Err(schema("hex_as_dec requires an unsigned integer field".to_string()));
            }

            fields.push(FieldLayout {
                name: decl.name,
                placement,
                endian: decl.endian,
                kind,
                reserved: decl.reserved,
                skip: decl.skip,
                hex_as_dec: decl.hex_as_dec,
            });
        }

        let total_size = fields.iter().map(FieldLayout::end).max().unwrap_or(0);
        Ok(Self {
            name: short_name,
            fields,
            total_size,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Parse a declared offset: `0x`-prefixed hex or decimal.
fn parse_offset(text: &str) -> std::result::Result<usize, String> {
    let trimmed = text.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(&hex.replace('_', ""), 16),
        None => trimmed.replace('_', "").parse::<usize>(),
    };
    parsed.map_err(|_| format!("invalid offset {text:?}"))
}

fn resolve_element(shape: &Shape) -> std::result::Result<Element, String> {
    match shape {
        Shape::Scalar(scalar) => Ok(Element::Scalar(*scalar)),
        Shape::Struct(reference) => reference
            .resolve()
            .map(Element::Struct)
            .map_err(|e| format!("nested {}: {e}", reference.name())),
        _ => Err("array and list elements must be scalars or structs".to_string()),
    }
}

fn resolve_kind(
    shape: &Shape,
    bound: &BoundDecl,
    prior: &[FieldLayout],
    names: &[&'static str],
) -> std::result::Result<FieldKind, String> {
    match shape {
        Shape::Scalar(scalar) => match bound {
            BoundDecl::None => Ok(FieldKind::Scalar(*scalar)),
            _ => Err("scalar fields take no length, count or terminator".to_string()),
        },
        Shape::Struct(reference) => reference
            .resolve()
            .map(FieldKind::Struct)
            .map_err(|e| format!("nested {}: {e}", reference.name())),
        Shape::Text => match bound {
            BoundDecl::Len(len) => Ok(FieldKind::Text(*len)),
            _ => Err("text fields need a fixed length".to_string()),
        },
        Shape::Array(inner, len) => {
            let element = resolve_element(inner)?;
            match bound {
                BoundDecl::None => Ok(FieldKind::Array { element, len: *len }),
                BoundDecl::Len(declared) if declared == len => {
                    Ok(FieldKind::Array { element, len: *len })
                }
                _ => Err(format!("fixed array of {len} elements cannot take another bound")),
            }
        }
        Shape::Seq(inner) => {
            let element = resolve_element(inner)?;
            match bound {
                BoundDecl::Len(len) => Ok(FieldKind::Array { element, len: *len }),
                BoundDecl::Count(target) => {
                    let Some(index) = prior.iter().position(|f| f.name == *target) else {
                        return Err(if names.contains(target) {
                            format!("size field {target} must precede the list")
                        } else {
                            format!("size field {target} does not exist")
                        });
                    };
                    if !matches!(&prior[index].kind, FieldKind::Scalar(s) if s.is_unsigned()) {
                        return Err(format!("size field {target} is not an unsigned integer"));
                    }
                    Ok(FieldKind::List {
                        element,
                        bound: ListBound::Count {
                            index,
                            name: *target,
                        },
                    })
                }
                BoundDecl::Terminator(terminator) => {
                    if terminator.len() != element.size() {
                        return Err(format!(
                            "terminator is {} bytes but elements are {}",
                            terminator.len(),
                            element.size()
                        ));
                    }
                    Ok(FieldKind::List {
                        element,
                        bound: ListBound::Terminator(*terminator),
                    })
                }
                BoundDecl::None => Err("list fields need len, count or until".to_string()),
            }
        }
    }
}
