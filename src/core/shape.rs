// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Type shapes.
//!
//! A [`Shape`] describes how a [`CodecValue`] is laid out. It is a closed set
//! of variants, so the element size and encoding rules of every value are
//! decided by matching on the shape rather than by runtime type lookups.
//!
//! ```
//! use cdrbridge::core::shape::{PrimitiveType, Shape, StructShape};
//!
//! let point = StructShape::new("Point")
//!     .field("x", Shape::primitive(PrimitiveType::Float64))
//!     .field("y", Shape::primitive(PrimitiveType::Float64));
//! let path = Shape::sequence(point.into());
//! assert_eq!(path.type_name(), "sequence<Point>");
//! ```

use serde::{Deserialize, Serialize};

use super::config::PlatformConfig;
use super::error::{CodecError, Result};
use super::ndarray::{element_count, for_each_index};
use super::value::CodecValue;

/// Size of a native address.
pub const ADDRESS_SIZE: usize = std::mem::size_of::<usize>();

/// Size of the native element count prefix (platform `int`).
pub const COUNT_SIZE: usize = 4;

/// Size of an enumeration ordinal, on the wire and in native memory.
pub const ENUM_SIZE: usize = 4;

/// Reject array extents of rank zero.
pub fn check_rank(dims: &[usize]) -> Result<()> {
    if dims.is_empty() {
        return Err(CodecError::unsupported("array of rank zero"));
    }
    Ok(())
}

/// Primitive (scalar) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Bool,
    Octet,
    Char,
    WChar,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl PrimitiveType {
    /// Size in bytes, identical on the wire and in native memory.
    pub fn size(self, platform: &PlatformConfig) -> usize {
        match self {
            PrimitiveType::Bool | PrimitiveType::Octet | PrimitiveType::Char => 1,
            PrimitiveType::WChar => platform.wchar_width.bytes(),
            PrimitiveType::Int16 | PrimitiveType::UInt16 => 2,
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => 4,
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => 8,
        }
    }

    /// IDL-style name.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Octet => "octet",
            PrimitiveType::Char => "char",
            PrimitiveType::WChar => "wchar",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::UInt16 => "uint16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::UInt32 => "uint32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::UInt64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
        }
    }
}

/// Enumeration type with its enumerators in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumShape {
    /// Type name
    pub name: String,
    /// Enumerator names; the ordinal is the position
    pub enumerators: Vec<String>,
}

impl EnumShape {
    /// Reject ordinals outside the declared enumerators.
    pub fn check(&self, ordinal: i64) -> Result<()> {
        if ordinal < 0 || ordinal as u64 >= self.enumerators.len() as u64 {
            return Err(CodecError::invalid_enum(
                &self.name,
                ordinal,
                self.enumerators.len(),
            ));
        }
        Ok(())
    }

    /// Ordinal of an enumerator by name.
    pub fn ordinal_of(&self, enumerator: &str) -> Option<u32> {
        self.enumerators
            .iter()
            .position(|e| e == enumerator)
            .and_then(|p| u32::try_from(p).ok())
    }
}

/// One field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldShape {
    /// Field name
    pub name: String,
    /// Field shape
    pub shape: Shape,
}

/// Record type with fields in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructShape {
    /// Type name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldShape>,
}

impl StructShape {
    /// Create a record shape with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.fields.push(FieldShape {
            name: name.into(),
            shape,
        });
        self
    }
}

impl From<StructShape> for Shape {
    fn from(s: StructShape) -> Self {
        Shape::Struct(s)
    }
}

impl From<EnumShape> for Shape {
    fn from(e: EnumShape) -> Self {
        Shape::Enum(e)
    }
}

impl From<PrimitiveType> for Shape {
    fn from(p: PrimitiveType) -> Self {
        Shape::Primitive(p)
    }
}

/// Layout description of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Scalar
    Primitive(PrimitiveType),
    /// UTF-8 string, optionally bounded (in characters)
    String { bound: Option<usize> },
    /// Wide string, optionally bounded (in characters)
    WString { bound: Option<usize> },
    /// Enumeration
    Enum(EnumShape),
    /// Length-prefixed sequence, optionally bounded
    Sequence {
        element: Box<Shape>,
        bound: Option<usize>,
    },
    /// Fixed-size array of one or more dimensions
    Array { element: Box<Shape>, dims: Vec<usize> },
    /// Nested record
    Struct(StructShape),
}

impl Shape {
    /// Scalar shape.
    pub fn primitive(p: PrimitiveType) -> Self {
        Shape::Primitive(p)
    }

    /// Unbounded string.
    pub fn string() -> Self {
        Shape::String { bound: None }
    }

    /// Bounded string.
    pub fn bounded_string(bound: usize) -> Self {
        Shape::String { bound: Some(bound) }
    }

    /// Unbounded wide string.
    pub fn wstring() -> Self {
        Shape::WString { bound: None }
    }

    /// Enumeration shape.
    pub fn enumeration(name: impl Into<String>, enumerators: &[&str]) -> Self {
        Shape::Enum(EnumShape {
            name: name.into(),
            enumerators: enumerators.iter().map(|e| e.to_string()).collect(),
        })
    }

    /// Unbounded sequence.
    pub fn sequence(element: Shape) -> Self {
        Shape::Sequence {
            element: Box::new(element),
            bound: None,
        }
    }

    /// Bounded sequence.
    pub fn bounded_sequence(element: Shape, bound: usize) -> Self {
        Shape::Sequence {
            element: Box::new(element),
            bound: Some(bound),
        }
    }

    /// Fixed array with the given extents.
    pub fn array(element: Shape, dims: &[usize]) -> Self {
        Shape::Array {
            element: Box::new(element),
            dims: dims.to_vec(),
        }
    }

    /// IDL-flavoured description used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Shape::Primitive(p) => p.name().to_string(),
            Shape::String { bound: None } => "string".to_string(),
            Shape::String { bound: Some(b) } => format!("string<{b}>"),
            Shape::WString { bound: None } => "wstring".to_string(),
            Shape::WString { bound: Some(b) } => format!("wstring<{b}>"),
            Shape::Enum(e) => e.name.clone(),
            Shape::Sequence {
                element,
                bound: None,
            } => format!("sequence<{}>", element.type_name()),
            Shape::Sequence {
                element,
                bound: Some(b),
            } => format!("sequence<{}, {b}>", element.type_name()),
            Shape::Array { element, dims } => {
                let extents: String = dims.iter().map(|d| format!("[{d}]")).collect();
                format!("{}{extents}", element.type_name())
            }
            Shape::Struct(s) => s.name.clone(),
        }
    }

    /// Size of this shape when stored inline in a native block.
    ///
    /// Strings and sequences are stored as the address of a separate
    /// allocation; records are packed field by field without padding.
    pub fn native_size(&self, platform: &PlatformConfig) -> usize {
        match self {
            Shape::Primitive(p) => p.size(platform),
            Shape::String { .. } | Shape::WString { .. } | Shape::Sequence { .. } => ADDRESS_SIZE,
            Shape::Enum(_) => ENUM_SIZE,
            Shape::Array { element, dims } => element.native_size(platform) * element_count(dims),
            Shape::Struct(s) => s.fields.iter().map(|f| f.shape.native_size(platform)).sum(),
        }
    }

    /// Fewest CDR payload bytes any value of this shape can occupy.
    ///
    /// Alignment padding is not counted, so this is a lower bound. Empty
    /// records and zero-extent arrays report 0.
    pub fn min_wire_size(&self, platform: &PlatformConfig) -> usize {
        match self {
            Shape::Primitive(p) => p.size(platform),
            // A length prefix of 0 is accepted for strings
            Shape::String { .. } | Shape::WString { .. } | Shape::Sequence { .. } => 4,
            Shape::Enum(_) => ENUM_SIZE,
            Shape::Array { element, dims } => element
                .min_wire_size(platform)
                .saturating_mul(element_count(dims)),
            Shape::Struct(s) => s
                .fields
                .iter()
                .map(|f| f.shape.min_wire_size(platform))
                .fold(0, usize::saturating_add),
        }
    }

    /// Check if values of this shape hold no separately allocated storage.
    pub fn is_fixed_size(&self) -> bool {
        match self {
            Shape::Primitive(_) | Shape::Enum(_) => true,
            Shape::String { .. } | Shape::WString { .. } | Shape::Sequence { .. } => false,
            Shape::Array { element, .. } => element.is_fixed_size(),
            Shape::Struct(s) => s.fields.iter().all(|f| f.shape.is_fixed_size()),
        }
    }

    /// Validate string and sequence bounds of `value` against this shape.
    ///
    /// The codec never enforces bounds itself; this is for callers that want
    /// to reject oversized data before sending it.
    pub fn check_bounds(&self, value: &CodecValue) -> Result<()> {
        match (self, value) {
            (Shape::String { bound: Some(b) }, CodecValue::String(s))
            | (Shape::WString { bound: Some(b) }, CodecValue::WString(s)) => {
                let len = s.chars().count();
                if len > *b {
                    return Err(CodecError::invariant_violation(format!(
                        "{} holds {len} characters",
                        self.type_name()
                    )));
                }
                Ok(())
            }
            (Shape::Sequence { element, bound }, CodecValue::Sequence(items)) => {
                if let Some(b) = bound {
                    if items.len() > *b {
                        return Err(CodecError::invariant_violation(format!(
                            "{} holds {} elements",
                            self.type_name(),
                            items.len()
                        )));
                    }
                }
                items.iter().try_for_each(|item| element.check_bounds(item))
            }
            (Shape::Array { element, dims }, CodecValue::Array(_)) => {
                for_each_index(dims, |_, index| match value.array_element(index) {
                    Some(item) => element.check_bounds(item),
                    None => Ok(()),
                })
            }
            (Shape::Struct(s), CodecValue::Struct(fields)) => s.fields.iter().try_for_each(|f| {
                match fields.get(&f.name) {
                    Some(v) => f.shape.check_bounds(v),
                    None => Ok(()),
                }
            }),
            _ => Ok(()),
        }
    }
}
