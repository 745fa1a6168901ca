// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shape-driven CDR codec for whole values.
//!
//! [`CdrCodec`] walks a [`Shape`] and a [`CodecValue`] together, delegating
//! every scalar to [`CdrEncoder`] / [`CdrCursor`]. Records are written field by
//! field in shape order. Multi-dimensional arrays are written row-major with no
//! length prefix.

use crate::core::config::CodecConfig;
use crate::core::ndarray::{element_count, for_each_index};
use crate::core::shape::{check_rank, PrimitiveType, Shape};
use crate::core::wide;
use crate::core::{CodecError, CodecValue, RecordValue, Result as CoreResult};

use super::calculator::CdrCalculator;
use super::cursor::CdrCursor;
use super::encoder::CdrEncoder;

/// Number of payload bytes shown in trace-level hex dumps.
const TRACE_DUMP_LEN: usize = 64;

/// CDR codec for values described by a [`Shape`].
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use cdrbridge::core::shape::{PrimitiveType, Shape};
/// use cdrbridge::core::CodecValue;
/// use cdrbridge::encoding::cdr::CdrCodec;
///
/// let codec = CdrCodec::new();
/// let shape = Shape::sequence(Shape::primitive(PrimitiveType::Int32));
/// let value = CodecValue::Sequence(vec![CodecValue::Int32(1), CodecValue::Int32(2)]);
/// let data = codec.encode(&value, &shape)?;
/// assert_eq!(codec.decode(&data, &shape)?, value);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CdrCodec {
    config: CodecConfig,
}

impl CdrCodec {
    /// Create a codec with the default limits and the host platform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Get the codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode a value into a new CDR buffer, header included.
    pub fn encode(&self, value: &CodecValue, shape: &Shape) -> CoreResult<Vec<u8>> {
        let capacity = self
            .serialized_size(value, shape)
            .unwrap_or(self.config.initial_capacity);
        let mut encoder = CdrEncoder::with_platform_and_capacity(self.config.platform, capacity);
        self.encode_into(&mut encoder, value, shape)?;
        let data = encoder.finish();

        tracing::debug!(
            shape = %shape.type_name(),
            size = data.len(),
            "encoded CDR value"
        );
        tracing::trace!(payload = %hex_prefix(&data), "CDR bytes");
        Ok(data)
    }

    /// Append a value to an existing encoder.
    pub fn encode_into(
        &self,
        encoder: &mut CdrEncoder,
        value: &CodecValue,
        shape: &Shape,
    ) -> CoreResult<()> {
        self.encode_value(encoder, value, shape, 0)
    }

    /// Decode a value from a CDR buffer, header included.
    pub fn decode(&self, data: &[u8], shape: &Shape) -> CoreResult<CodecValue> {
        tracing::trace!(
            shape = %shape.type_name(),
            size = data.len(),
            payload = %hex_prefix(data),
            "decoding CDR value"
        );
        let mut cursor = CdrCursor::with_platform(data, self.config.platform)?;
        let value = self.decode_from(&mut cursor, shape)?;
        if !cursor.is_at_end() {
            tracing::debug!(
                shape = %shape.type_name(),
                trailing = cursor.remaining(),
                "trailing bytes after CDR value"
            );
        }
        Ok(value)
    }

    /// Decode the next value from a cursor.
    pub fn decode_from(&self, cursor: &mut CdrCursor<'_>, shape: &Shape) -> CoreResult<CodecValue> {
        self.decode_value(cursor, shape, 0)
    }

    /// Compute the encoded size of a value, header included.
    pub fn serialized_size(&self, value: &CodecValue, shape: &Shape) -> CoreResult<usize> {
        let mut calc = CdrCalculator::with_platform(self.config.platform);
        self.size_value(&mut calc, value, shape, 0)?;
        Ok(calc.size())
    }

    fn check_depth(&self, depth: usize, shape: &Shape) -> CoreResult<()> {
        if depth > self.config.max_depth {
            return Err(CodecError::invariant_violation(format!(
                "nesting depth {depth} exceeds maximum {} at {}",
                self.config.max_depth,
                shape.type_name()
            )));
        }
        Ok(())
    }

    fn encode_value(
        &self,
        encoder: &mut CdrEncoder,
        value: &CodecValue,
        shape: &Shape,
        depth: usize,
    ) -> CoreResult<()> {
        self.check_depth(depth, shape)?;

        match (shape, value) {
            (Shape::Primitive(prim), _) => encode_primitive(encoder, *prim, value),
            (Shape::String { .. }, CodecValue::String(s)) => {
                encoder.string(s)?;
                Ok(())
            }
            (Shape::WString { .. }, CodecValue::WString(s)) => {
                encoder.wstring(s)?;
                Ok(())
            }
            (Shape::Enum(e), CodecValue::Enum(ordinal)) => {
                e.check(i64::from(*ordinal))?;
                encoder.enumeration(*ordinal)?;
                Ok(())
            }
            (Shape::Sequence { element, .. }, CodecValue::Sequence(items)) => {
                encoder.sequence_length(items.len())?;
                items
                    .iter()
                    .try_for_each(|item| self.encode_value(encoder, item, element, depth + 1))
            }
            (Shape::Array { element, dims }, CodecValue::Array(_)) => {
                check_rank(dims)?;
                value.check_extents(dims)?;
                for_each_index(dims, |_, index| {
                    let item = array_item(value, index)?;
                    self.encode_value(encoder, item, element, depth + 1)
                })
            }
            (Shape::Struct(record), CodecValue::Struct(fields)) => {
                for field in &record.fields {
                    let item = fields
                        .get(&field.name)
                        .ok_or_else(|| CodecError::missing_field(&record.name, &field.name))?;
                    self.encode_value(encoder, item, &field.shape, depth + 1)?;
                }
                Ok(())
            }
            _ => Err(CodecError::type_mismatch(
                shape.type_name(),
                value.type_name(),
            )),
        }
    }

    fn decode_value(
        &self,
        cursor: &mut CdrCursor<'_>,
        shape: &Shape,
        depth: usize,
    ) -> CoreResult<CodecValue> {
        self.check_depth(depth, shape)?;

        match shape {
            Shape::Primitive(prim) => decode_primitive(cursor, *prim),
            Shape::String { .. } => Ok(CodecValue::String(cursor.read_string()?)),
            Shape::WString { .. } => Ok(CodecValue::WString(cursor.read_wstring()?)),
            Shape::Enum(e) => {
                let ordinal = cursor.read_enum()?;
                e.check(i64::from(ordinal))?;
                Ok(CodecValue::Enum(ordinal))
            }
            Shape::Sequence { element, .. } => {
                let position = cursor.position();
                let len = cursor.read_sequence_length()?;
                // Every element is charged at least one byte, so zero-size
                // elements cannot outnumber the remaining payload
                let element_size = element.min_wire_size(&self.config.platform).max(1);
                if len > self.config.max_sequence_length
                    || len.saturating_mul(element_size) > cursor.remaining()
                {
                    return Err(CodecError::length_exceeded(
                        len,
                        position,
                        position + cursor.remaining(),
                    ));
                }
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.decode_value(cursor, element, depth + 1)?);
                }
                Ok(CodecValue::Sequence(items))
            }
            Shape::Array { element, dims } => {
                check_rank(dims)?;
                let total = element_count(dims);
                let mut flat = Vec::with_capacity(total.min(cursor.remaining()));
                for _ in 0..total {
                    flat.push(self.decode_value(cursor, element, depth + 1)?);
                }
                CodecValue::from_row_major(dims, flat)
            }
            Shape::Struct(record) => {
                let mut fields = RecordValue::with_capacity(record.fields.len());
                for field in &record.fields {
                    let item = self.decode_value(cursor, &field.shape, depth + 1)?;
                    fields.insert(field.name.clone(), item);
                }
                Ok(CodecValue::Struct(fields))
            }
        }
    }

    fn size_value(
        &self,
        calc: &mut CdrCalculator,
        value: &CodecValue,
        shape: &Shape,
        depth: usize,
    ) -> CoreResult<()> {
        self.check_depth(depth, shape)?;

        match (shape, value) {
            (Shape::Primitive(prim), _) => {
                if primitive_of(value) != Some(*prim) {
                    return Err(CodecError::type_mismatch(prim.name(), value.type_name()));
                }
                calc.primitive(prim.size(&self.config.platform));
            }
            (Shape::String { .. }, CodecValue::String(s)) => {
                calc.string(s.len());
            }
            (Shape::WString { .. }, CodecValue::WString(s)) => {
                calc.wstring(wide::encode_units(self.config.platform.wchar_width, s).len());
            }
            (Shape::Enum(_), CodecValue::Enum(_)) => {
                calc.enumeration();
            }
            (Shape::Sequence { element, .. }, CodecValue::Sequence(items)) => {
                calc.sequence_length();
                for item in items {
                    self.size_value(calc, item, element, depth + 1)?;
                }
            }
            (Shape::Array { element, dims }, CodecValue::Array(_)) => {
                check_rank(dims)?;
                value.check_extents(dims)?;
                for_each_index(dims, |_, index| {
                    self.size_value(calc, array_item(value, index)?, element, depth + 1)
                })?;
            }
            (Shape::Struct(record), CodecValue::Struct(fields)) => {
                for field in &record.fields {
                    let item = fields
                        .get(&field.name)
                        .ok_or_else(|| CodecError::missing_field(&record.name, &field.name))?;
                    self.size_value(calc, item, &field.shape, depth + 1)?;
                }
            }
            _ => {
                return Err(CodecError::type_mismatch(
                    shape.type_name(),
                    value.type_name(),
                ))
            }
        }
        Ok(())
    }
}

fn array_item<'v>(value: &'v CodecValue, index: &[usize]) -> CoreResult<&'v CodecValue> {
    value
        .array_element(index)
        .ok_or_else(|| CodecError::invariant_violation(format!("array has no element {index:?}")))
}

/// Primitive type a scalar value carries, if it is a scalar.
fn primitive_of(value: &CodecValue) -> Option<PrimitiveType> {
    Some(match value {
        CodecValue::Bool(_) => PrimitiveType::Bool,
        CodecValue::Octet(_) => PrimitiveType::Octet,
        CodecValue::Char(_) => PrimitiveType::Char,
        CodecValue::WChar(_) => PrimitiveType::WChar,
        CodecValue::Int16(_) => PrimitiveType::Int16,
        CodecValue::UInt16(_) => PrimitiveType::UInt16,
        CodecValue::Int32(_) => PrimitiveType::Int32,
        CodecValue::UInt32(_) => PrimitiveType::UInt32,
        CodecValue::Int64(_) => PrimitiveType::Int64,
        CodecValue::UInt64(_) => PrimitiveType::UInt64,
        CodecValue::Float32(_) => PrimitiveType::Float32,
        CodecValue::Float64(_) => PrimitiveType::Float64,
        _ => return None,
    })
}

fn encode_primitive(
    encoder: &mut CdrEncoder,
    prim: PrimitiveType,
    value: &CodecValue,
) -> CoreResult<()> {
    match (prim, value) {
        (PrimitiveType::Bool, CodecValue::Bool(v)) => encoder.bool(*v)?,
        (PrimitiveType::Octet, CodecValue::Octet(v)) => encoder.uint8(*v)?,
        (PrimitiveType::Char, CodecValue::Char(v)) => encoder.char(*v)?,
        (PrimitiveType::WChar, CodecValue::WChar(v)) => encoder.wchar(*v)?,
        (PrimitiveType::Int16, CodecValue::Int16(v)) => encoder.int16(*v)?,
        (PrimitiveType::UInt16, CodecValue::UInt16(v)) => encoder.uint16(*v)?,
        (PrimitiveType::Int32, CodecValue::Int32(v)) => encoder.int32(*v)?,
        (PrimitiveType::UInt32, CodecValue::UInt32(v)) => encoder.uint32(*v)?,
        (PrimitiveType::Int64, CodecValue::Int64(v)) => encoder.int64(*v)?,
        (PrimitiveType::UInt64, CodecValue::UInt64(v)) => encoder.uint64(*v)?,
        (PrimitiveType::Float32, CodecValue::Float32(v)) => encoder.float32(*v)?,
        (PrimitiveType::Float64, CodecValue::Float64(v)) => encoder.float64(*v)?,
        _ => return Err(CodecError::type_mismatch(prim.name(), value.type_name())),
    };
    Ok(())
}

fn decode_primitive(cursor: &mut CdrCursor<'_>, prim: PrimitiveType) -> CoreResult<CodecValue> {
    Ok(match prim {
        PrimitiveType::Bool => CodecValue::Bool(cursor.read_bool()?),
        PrimitiveType::Octet => CodecValue::Octet(cursor.read_u8()?),
        PrimitiveType::Char => CodecValue::Char(cursor.read_char()?),
        PrimitiveType::WChar => CodecValue::WChar(cursor.read_wchar()?),
        PrimitiveType::Int16 => CodecValue::Int16(cursor.read_i16()?),
        PrimitiveType::UInt16 => CodecValue::UInt16(cursor.read_u16()?),
        PrimitiveType::Int32 => CodecValue::Int32(cursor.read_i32()?),
        PrimitiveType::UInt32 => CodecValue::UInt32(cursor.read_u32()?),
        PrimitiveType::Int64 => CodecValue::Int64(cursor.read_i64()?),
        PrimitiveType::UInt64 => CodecValue::UInt64(cursor.read_u64()?),
        PrimitiveType::Float32 => CodecValue::Float32(cursor.read_f32()?),
        PrimitiveType::Float64 => CodecValue::Float64(cursor.read_f64()?),
    })
}

fn hex_prefix(data: &[u8]) -> String {
    let shown = &data[..data.len().min(TRACE_DUMP_LEN)];
    if shown.len() < data.len() {
        format!("{}..", hex::encode(shown))
    } else {
        hex::encode(shown)
    }
}
