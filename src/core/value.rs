// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codec value type system.
//!
//! Provides a unified, shape-agnostic value representation that both the CDR
//! codec and the native marshaller consume and produce. All variants are
//! serde-serializable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{CodecError, Result};
use super::ndarray::element_count;
use super::shape::check_rank;

/// Record value as field name -> value mapping.
///
/// Field order is defined by the record's shape, not by this map.
pub type RecordValue = HashMap<String, CodecValue>;

/// Unified value type for data exchanged with DDS peers and native runtimes.
///
/// Multi-dimensional arrays nest one [`CodecValue::Array`] per dimension, so a
/// `3x2` array is an array of three arrays of two elements and
/// [`CodecValue::array_element`] addresses it with `&[i, j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CodecValue {
    // Boolean
    Bool(bool),

    // Raw byte
    Octet(u8),

    // Narrow (1 byte) and wide (platform width) characters
    Char(u8),
    WChar(char),

    // Integers
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),

    // Floating point
    Float32(f32),
    Float64(f64),

    // Strings (UTF-8 / wide)
    String(String),
    WString(String),

    /// Enumeration ordinal
    Enum(u32),

    /// Variable-length sequence
    Sequence(Vec<CodecValue>),

    /// One dimension of a fixed-size array
    Array(Vec<CodecValue>),

    /// Nested record
    Struct(RecordValue),
}

impl CodecValue {
    /// Short name of the value kind, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            CodecValue::Bool(_) => "bool",
            CodecValue::Octet(_) => "octet",
            CodecValue::Char(_) => "char",
            CodecValue::WChar(_) => "wchar",
            CodecValue::Int16(_) => "int16",
            CodecValue::UInt16(_) => "uint16",
            CodecValue::Int32(_) => "int32",
            CodecValue::UInt32(_) => "uint32",
            CodecValue::Int64(_) => "int64",
            CodecValue::UInt64(_) => "uint64",
            CodecValue::Float32(_) => "float32",
            CodecValue::Float64(_) => "float64",
            CodecValue::String(_) => "string",
            CodecValue::WString(_) => "wstring",
            CodecValue::Enum(_) => "enum",
            CodecValue::Sequence(_) => "sequence",
            CodecValue::Array(_) => "array",
            CodecValue::Struct(_) => "struct",
        }
    }

    /// Check if this value is a numeric type (integers or floats).
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CodecValue::Int16(_)
                | CodecValue::UInt16(_)
                | CodecValue::Int32(_)
                | CodecValue::UInt32(_)
                | CodecValue::Int64(_)
                | CodecValue::UInt64(_)
                | CodecValue::Float32(_)
                | CodecValue::Float64(_)
        )
    }

    /// Check if this value is a container type.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            CodecValue::Sequence(_) | CodecValue::Array(_) | CodecValue::Struct(_)
        )
    }

    /// Try to convert this value to f64 (for numeric values only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CodecValue::Int16(v) => Some(*v as f64),
            CodecValue::UInt16(v) => Some(*v as f64),
            CodecValue::Int32(v) => Some(*v as f64),
            CodecValue::UInt32(v) => Some(*v as f64),
            CodecValue::Int64(v) => Some(*v as f64),
            CodecValue::UInt64(v) => Some(*v as f64),
            CodecValue::Float32(v) => Some(*v as f64),
            CodecValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the text of a narrow or wide string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CodecValue::String(s) | CodecValue::WString(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the elements of a sequence or of one array dimension.
    pub fn as_slice(&self) -> Option<&[CodecValue]> {
        match self {
            CodecValue::Sequence(items) | CodecValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the fields of a record.
    pub fn as_struct(&self) -> Option<&RecordValue> {
        match self {
            CodecValue::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Element of a nested array at a per-dimension index.
    pub fn array_element(&self, index: &[usize]) -> Option<&CodecValue> {
        let mut current = self;
        for &i in index {
            match current {
                CodecValue::Array(items) => current = items.get(i)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Check that this nested array has exactly the given extents.
    pub fn check_extents(&self, dims: &[usize]) -> Result<()> {
        let Some((&extent, rest)) = dims.split_first() else {
            return Ok(());
        };
        match self {
            CodecValue::Array(items) if items.len() == extent => {
                items.iter().try_for_each(|item| item.check_extents(rest))
            }
            CodecValue::Array(items) => Err(CodecError::invariant_violation(format!(
                "array dimension has {} elements, expected {extent}",
                items.len()
            ))),
            other => Err(CodecError::type_mismatch(
                format!("array dimension of {extent}"),
                other.type_name(),
            )),
        }
    }

    /// Nest row-major elements into one [`CodecValue::Array`] per dimension.
    pub fn from_row_major(dims: &[usize], flat: Vec<CodecValue>) -> Result<CodecValue> {
        check_rank(dims)?;
        let expected = element_count(dims);
        if flat.len() != expected {
            return Err(CodecError::invariant_violation(format!(
                "array of extents {dims:?} needs {expected} elements, got {}",
                flat.len()
            )));
        }
        let mut items = flat.into_iter();
        Ok(nest(dims, &mut items))
    }
}

fn nest(dims: &[usize], items: &mut std::vec::IntoIter<CodecValue>) -> CodecValue {
    match dims.split_first() {
        Some((&extent, [])) => CodecValue::Array(items.by_ref().take(extent).collect()),
        Some((&extent, rest)) => CodecValue::Array((0..extent).map(|_| nest(rest, items)).collect()),
        None => CodecValue::Array(Vec::new()),
    }
}

impl From<bool> for CodecValue {
    fn from(v: bool) -> Self {
        CodecValue::Bool(v)
    }
}

impl From<i16> for CodecValue {
    fn from(v: i16) -> Self {
        CodecValue::Int16(v)
    }
}

impl From<u16> for CodecValue {
    fn from(v: u16) -> Self {
        CodecValue::UInt16(v)
    }
}

impl From<i32> for CodecValue {
    fn from(v: i32) -> Self {
        CodecValue::Int32(v)
    }
}

impl From<u32> for CodecValue {
    fn from(v: u32) -> Self {
        CodecValue::UInt32(v)
    }
}

impl From<i64> for CodecValue {
    fn from(v: i64) -> Self {
        CodecValue::Int64(v)
    }
}

impl From<u64> for CodecValue {
    fn from(v: u64) -> Self {
        CodecValue::UInt64(v)
    }
}

impl From<f32> for CodecValue {
    fn from(v: f32) -> Self {
        CodecValue::Float32(v)
    }
}

impl From<f64> for CodecValue {
    fn from(v: f64) -> Self {
        CodecValue::Float64(v)
    }
}

impl From<&str> for CodecValue {
    fn from(v: &str) -> Self {
        CodecValue::String(v.to_string())
    }
}

impl From<String> for CodecValue {
    fn from(v: String) -> Self {
        CodecValue::String(v)
    }
}
