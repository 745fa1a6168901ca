// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shape-driven marshalling of [`CodecValue`] trees.
//!
//! Values are laid out with the same rules as the typed API:
//! - scalars and enumerators inline, in the native byte order
//! - strings and sequences as the address of a separate allocation
//! - arrays inline, row-major, without a count
//! - records inline, field by field, without padding
//!
//! A sequence of records is therefore one block of packed records, and a
//! sequence of sequences is a block of addresses of child sequence blocks.

use super::block::{borrow_native, NativeExport};
use super::element::{read_address, write_address, NativeElement};
use super::marshaller::Marshaller;
use super::strings::{narrow_from_native, narrow_to_native, wide_from_native, wide_to_native};
use crate::core::config::PlatformConfig;
use crate::core::ndarray::{element_count, for_each_index};
use crate::core::shape::{check_rank, PrimitiveType, Shape};
use crate::core::value::RecordValue;
use crate::core::{CodecError, CodecValue, Result};

impl Marshaller {
    /// Marshal a value into native memory following `shape`.
    ///
    /// Sequences produce a `[count][elements]` block and strings a
    /// NUL-terminated buffer. Every other shape produces a block of
    /// `shape.native_size()` bytes holding the value inline.
    pub fn value_to_native(&self, value: &CodecValue, shape: &Shape) -> Result<NativeExport> {
        let export = self.export_value(value, shape, 0)?;
        tracing::debug!(
            shape = %shape.type_name(),
            len = export.len(),
            secondary = export.secondary_count(),
            "marshalled value to native"
        );
        Ok(export)
    }

    /// Read a value laid out as [`Marshaller::value_to_native`] produces it.
    ///
    /// A null pointer reads as an empty string or sequence. For any other
    /// shape it is a contract violation.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to readable memory laid out for `shape`,
    /// and every address stored inside it must be null or valid likewise.
    pub unsafe fn value_from_native(&self, ptr: *const u8, shape: &Shape) -> Result<CodecValue> {
        let value = self.import_value(ptr, shape, 0)?;
        tracing::trace!(shape = %shape.type_name(), "read value from native");
        Ok(value)
    }

    fn export_value(&self, value: &CodecValue, shape: &Shape, depth: usize) -> Result<NativeExport> {
        check_depth(depth, self.max_depth(), shape)?;

        match (shape, value) {
            (Shape::String { .. }, CodecValue::String(s)) => {
                Ok(NativeExport::new(narrow_to_native(self.heap(), s)?))
            }
            (Shape::WString { .. }, CodecValue::WString(s)) => Ok(NativeExport::new(
                wide_to_native(self.heap(), self.platform(), s)?,
            )),
            (Shape::Sequence { element, .. }, CodecValue::Sequence(items)) => {
                let size = element.native_size(self.platform());
                self.export_sequence(items.len(), size, |export, i, range| {
                    self.write_inline(export, range.start, &items[i], element, depth + 1)
                })
            }
            (Shape::String { .. } | Shape::WString { .. } | Shape::Sequence { .. }, _) => Err(
                CodecError::type_mismatch(shape.type_name(), value.type_name()),
            ),
            _ => {
                let mut export =
                    NativeExport::new(self.allocate(shape.native_size(self.platform()))?);
                self.write_inline(&mut export, 0, value, shape, depth)?;
                Ok(export)
            }
        }
    }

    /// Write `value` at `offset` of the export's outer block.
    fn write_inline(
        &self,
        export: &mut NativeExport,
        offset: usize,
        value: &CodecValue,
        shape: &Shape,
        depth: usize,
    ) -> Result<()> {
        check_depth(depth, self.max_depth(), shape)?;
        let platform = *self.platform();

        match (shape, value) {
            (Shape::Primitive(prim), _) => {
                let size = prim.size(&platform);
                let out = &mut export.bytes_mut()[offset..offset + size];
                write_primitive(&platform, out, *prim, value)
            }
            (Shape::Enum(e), CodecValue::Enum(ordinal)) => {
                e.check(i64::from(*ordinal))?;
                let ordinal = i32::try_from(*ordinal).map_err(|_| {
                    CodecError::invalid_enum(&e.name, i64::from(*ordinal), e.enumerators.len())
                })?;
                ordinal.write_native(&platform, &mut export.bytes_mut()[offset..])
            }
            (Shape::String { .. }, CodecValue::String(s)) => {
                let text = narrow_to_native(self.heap(), s)?;
                write_address(&platform, &mut export.bytes_mut()[offset..], text.address());
                export.own(text);
                Ok(())
            }
            (Shape::WString { .. }, CodecValue::WString(s)) => {
                let text = wide_to_native(self.heap(), &platform, s)?;
                write_address(&platform, &mut export.bytes_mut()[offset..], text.address());
                export.own(text);
                Ok(())
            }
            (Shape::Sequence { .. }, CodecValue::Sequence(_)) => {
                let child = self.export_value(value, shape, depth)?;
                write_address(
                    &platform,
                    &mut export.bytes_mut()[offset..],
                    child.as_ptr() as usize,
                );
                export.adopt(child);
                Ok(())
            }
            (Shape::Array { element, dims }, CodecValue::Array(_)) => {
                check_rank(dims)?;
                value.check_extents(dims)?;
                let size = element.native_size(&platform);
                for_each_index(dims, |linear, index| {
                    let item = value.array_element(index).ok_or_else(|| {
                        CodecError::invariant_violation(format!("array has no element {index:?}"))
                    })?;
                    self.write_inline(export, offset + linear * size, item, element, depth + 1)
                })
            }
            (Shape::Struct(record), CodecValue::Struct(fields)) => {
                let mut field_offset = offset;
                for field in &record.fields {
                    let item = fields
                        .get(&field.name)
                        .ok_or_else(|| CodecError::missing_field(&record.name, &field.name))?;
                    self.write_inline(export, field_offset, item, &field.shape, depth + 1)?;
                    field_offset += field.shape.native_size(&platform);
                }
                Ok(())
            }
            _ => Err(CodecError::type_mismatch(
                shape.type_name(),
                value.type_name(),
            )),
        }
    }

    unsafe fn import_value(&self, ptr: *const u8, shape: &Shape, depth: usize) -> Result<CodecValue> {
        check_depth(depth, self.max_depth(), shape)?;

        match shape {
            Shape::String { .. } => Ok(CodecValue::String(narrow_from_native(ptr)?)),
            Shape::WString { .. } => Ok(CodecValue::WString(wide_from_native(
                self.platform(),
                ptr,
            )?)),
            Shape::Sequence { element, .. } => {
                let size = element.native_size(self.platform());
                let (count, body) = self.import_sequence(ptr, size)?;
                let mut items = Vec::with_capacity(count.min(body.len()));
                for i in 0..count {
                    let bytes = &body[i * size..(i + 1) * size];
                    items.push(self.read_inline(bytes, element, depth + 1)?);
                }
                Ok(CodecValue::Sequence(items))
            }
            _ if ptr.is_null() => Err(CodecError::native_contract(format!(
                "null pointer for {}",
                shape.type_name()
            ))),
            _ => {
                let bytes = borrow_native(ptr, shape.native_size(self.platform()));
                self.read_inline(bytes, shape, depth)
            }
        }
    }

    /// Read a value stored inline in `bytes`, which is exactly its native size.
    unsafe fn read_inline(&self, bytes: &[u8], shape: &Shape, depth: usize) -> Result<CodecValue> {
        check_depth(depth, self.max_depth(), shape)?;
        let platform = *self.platform();

        match shape {
            Shape::Primitive(prim) => read_primitive(&platform, bytes, *prim),
            Shape::Enum(e) => {
                let ordinal = i32::read_native(&platform, bytes)?;
                e.check(i64::from(ordinal))?;
                let ordinal = u32::try_from(ordinal).map_err(|_| {
                    CodecError::invalid_enum(&e.name, i64::from(ordinal), e.enumerators.len())
                })?;
                Ok(CodecValue::Enum(ordinal))
            }
            Shape::String { .. } => {
                let address = read_address(&platform, bytes);
                Ok(CodecValue::String(narrow_from_native(address as *const u8)?))
            }
            Shape::WString { .. } => {
                let address = read_address(&platform, bytes);
                Ok(CodecValue::WString(wide_from_native(
                    &platform,
                    address as *const u8,
                )?))
            }
            Shape::Sequence { .. } => {
                let address = read_address(&platform, bytes);
                self.import_value(address as *const u8, shape, depth)
            }
            Shape::Array { element, dims } => {
                check_rank(dims)?;
                let size = element.native_size(&platform);
                let mut flat = Vec::with_capacity(element_count(dims));
                for_each_index(dims, |linear, _| {
                    let start = linear * size;
                    flat.push(self.read_inline(&bytes[start..start + size], element, depth + 1)?);
                    Ok(())
                })?;
                CodecValue::from_row_major(dims, flat)
            }
            Shape::Struct(record) => {
                let mut fields = RecordValue::with_capacity(record.fields.len());
                let mut offset = 0;
                for field in &record.fields {
                    let size = field.shape.native_size(&platform);
                    let item = self.read_inline(&bytes[offset..offset + size], &field.shape, depth + 1)?;
                    fields.insert(field.name.clone(), item);
                    offset += size;
                }
                Ok(CodecValue::Struct(fields))
            }
        }
    }
}

fn check_depth(depth: usize, max_depth: usize, shape: &Shape) -> Result<()> {
    if depth > max_depth {
        return Err(CodecError::invariant_violation(format!(
            "nesting depth {depth} exceeds maximum {max_depth} at {}",
            shape.type_name()
        )));
    }
    Ok(())
}

fn write_primitive(
    platform: &PlatformConfig,
    out: &mut [u8],
    prim: PrimitiveType,
    value: &CodecValue,
) -> Result<()> {
    match (prim, value) {
        (PrimitiveType::Bool, CodecValue::Bool(v)) => v.write_native(platform, out),
        (PrimitiveType::Octet, CodecValue::Octet(v)) => v.write_native(platform, out),
        (PrimitiveType::Char, CodecValue::Char(v)) => v.write_native(platform, out),
        (PrimitiveType::WChar, CodecValue::WChar(v)) => v.write_native(platform, out),
        (PrimitiveType::Int16, CodecValue::Int16(v)) => v.write_native(platform, out),
        (PrimitiveType::UInt16, CodecValue::UInt16(v)) => v.write_native(platform, out),
        (PrimitiveType::Int32, CodecValue::Int32(v)) => v.write_native(platform, out),
        (PrimitiveType::UInt32, CodecValue::UInt32(v)) => v.write_native(platform, out),
        (PrimitiveType::Int64, CodecValue::Int64(v)) => v.write_native(platform, out),
        (PrimitiveType::UInt64, CodecValue::UInt64(v)) => v.write_native(platform, out),
        (PrimitiveType::Float32, CodecValue::Float32(v)) => v.write_native(platform, out),
        (PrimitiveType::Float64, CodecValue::Float64(v)) => v.write_native(platform, out),
        _ => Err(CodecError::type_mismatch(prim.name(), value.type_name())),
    }
}

fn read_primitive(platform: &PlatformConfig, bytes: &[u8], prim: PrimitiveType) -> Result<CodecValue> {
    Ok(match prim {
        PrimitiveType::Bool => CodecValue::Bool(bool::read_native(platform, bytes)?),
        PrimitiveType::Octet => CodecValue::Octet(u8::read_native(platform, bytes)?),
        PrimitiveType::Char => CodecValue::Char(u8::read_native(platform, bytes)?),
        PrimitiveType::WChar => CodecValue::WChar(char::read_native(platform, bytes)?),
        PrimitiveType::Int16 => CodecValue::Int16(i16::read_native(platform, bytes)?),
        PrimitiveType::UInt16 => CodecValue::UInt16(u16::read_native(platform, bytes)?),
        PrimitiveType::Int32 => CodecValue::Int32(i32::read_native(platform, bytes)?),
        PrimitiveType::UInt32 => CodecValue::UInt32(u32::read_native(platform, bytes)?),
        PrimitiveType::Int64 => CodecValue::Int64(i64::read_native(platform, bytes)?),
        PrimitiveType::UInt64 => CodecValue::UInt64(u64::read_native(platform, bytes)?),
        PrimitiveType::Float32 => CodecValue::Float32(f32::read_native(platform, bytes)?),
        PrimitiveType::Float64 => CodecValue::Float64(f64::read_native(platform, bytes)?),
    })
}
