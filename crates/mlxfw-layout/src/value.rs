//! Dynamic field values exchanged between typed structs and the codec.

use rustc_hash::FxHashMap;

use crate::field::{Scalar, Shape};
use crate::{LayoutError, Result};

/// A decoded (or to-be-encoded) field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Uint(u64),
    Int(i64),
    /// Byte arrays decode to this instead of a list of `Uint`.
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Value>),
    Struct(Record),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Uint(_) => "unsigned integer",
            Self::Int(_) => "signed integer",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Struct(_) => "struct",
        }
    }

    /// Raw unsigned view of a scalar value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Bool(b) => Some(u64::from(*b)),
            Self::Uint(v) => Some(*v),
            Self::Int(v) => Some(*v as u64),
            _ => None,
        }
    }

    /// Elements of a list-like value. Bytes expand to unsigned values.
    pub(crate) fn into_elements(self) -> Option<Vec<Value>> {
        match self {
            Self::List(items) => Some(items),
            Self::Bytes(bytes) => Some(bytes.into_iter().map(|b| Self::Uint(u64::from(b))).collect()),
            _ => None,
        }
    }
}

/// Field values of one struct, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    values: FxHashMap<&'static str, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }
}

/// Conversion between a Rust field type and [`Value`].
pub trait FieldValue: Sized {
    fn shape() -> Shape;
    fn to_value(&self) -> Value;
    fn from_value(value: Value, field: &str) -> Result<Self>;
    /// Value used for fields that were not decoded (reserved, skipped).
    fn placeholder() -> Self;
}

fn out_of_range(field: &str, raw: impl std::fmt::Display, ty: &str) -> LayoutError {
    LayoutError::Decode {
        field: field.to_string(),
        offset: 0,
        input_len: 0,
        reason: format!("value {raw} does not fit in {ty}"),
    }
}

macro_rules! unsigned_field {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn shape() -> Shape {
                    Shape::Scalar(Scalar::$scalar)
                }

                fn to_value(&self) -> Value {
                    Value::Uint(u64::from(*self))
                }

                fn from_value(value: Value, field: &str) -> Result<Self> {
                    let raw = match value {
                        Value::Uint(v) => v,
                        Value::Bool(b) => u64::from(b),
                        other => {
                            return Err(LayoutError::type_mismatch(field, "unsigned integer", &other));
                        }
                    };
                    <$ty>::try_from(raw).map_err(|_| out_of_range(field, raw, stringify!($ty)))
                }

                fn placeholder() -> Self {
                    0
                }
            }
        )*
    };
}

macro_rules! signed_field {
    ($($ty:ty => $scalar:ident),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                fn shape() -> Shape {
                    Shape::Scalar(Scalar::$scalar)
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value, field: &str) -> Result<Self> {
                    match value {
                        Value::Int(v) => {
                            <$ty>::try_from(v).map_err(|_| out_of_range(field, v, stringify!($ty)))
                        }
                        Value::Uint(v) => {
                            <$ty>::try_from(v).map_err(|_| out_of_range(field, v, stringify!($ty)))
                        }
                        other => Err(LayoutError::type_mismatch(field, "signed integer", &other)),
                    }
                }

                fn placeholder() -> Self {
                    0
                }
            }
        )*
    };
}

unsigned_field!(u8 => U8, u16 => U16, u32 => U32, u64 => U64);
signed_field!(i8 => I8, i16 => I16, i32 => I32, i64 => I64);

impl FieldValue for bool {
    fn shape() -> Shape {
        Shape::Scalar(Scalar::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value, field: &str) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Uint(v) => Ok(v != 0),
            other => Err(LayoutError::type_mismatch(field, "bool", &other)),
        }
    }

    fn placeholder() -> Self {
        false
    }
}

impl FieldValue for String {
    fn shape() -> Shape {
        Shape::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value, field: &str) -> Result<Self> {
        match value {
            Value::Text(text) => Ok(text),
            Value::Bytes(bytes) => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            other => Err(LayoutError::type_mismatch(field, "text", &other)),
        }
    }

    fn placeholder() -> Self {
        Self::new()
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn shape() -> Shape {
        Shape::Seq(Box::new(T::shape()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value, field: &str) -> Result<Self> {
        let kind = value.kind_name();
        let items = value.into_elements().ok_or(LayoutError::TypeMismatch {
            field: field.to_string(),
            expected: "list",
            found: kind,
        })?;
        items.into_iter().map(|item| T::from_value(item, field)).collect()
    }

    fn placeholder() -> Self {
        Self::new()
    }
}

impl<T: FieldValue, const N: usize> FieldValue for [T; N] {
    fn shape() -> Shape {
        Shape::Array(Box::new(T::shape()), N)
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value, field: &str) -> Result<Self> {
        let items = Vec::<T>::from_value(value, field)?;
        let found = items.len();
        items.try_into().map_err(|_| LayoutError::Decode {
            field: field.to_string(),
            offset: 0,
            input_len: found,
            reason: format!("expected {N} elements, found {found}"),
        })
    }

    fn placeholder() -> Self {
        std::array::from_fn(|_| T::placeholder())
    }
}
