// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! NUL-terminated narrow and wide strings in native memory.

use std::ffi::CStr;
use std::sync::Arc;

use super::block::NativeBlock;
use super::element::{read_unit, write_unit};
use super::heap::NativeHeap;
use crate::core::config::PlatformConfig;
use crate::core::wide;
use crate::core::{CodecError, Result};

/// Copy a UTF-8 string into a new NUL-terminated allocation.
pub(crate) fn narrow_to_native(heap: &Arc<dyn NativeHeap>, value: &str) -> Result<NativeBlock> {
    if let Some(position) = value.bytes().position(|b| b == 0) {
        return Err(CodecError::invariant_violation(format!(
            "string has an interior NUL at byte {position}"
        )));
    }
    let mut block = NativeBlock::allocate(heap, value.len() + 1)?;
    // Terminator is already zero
    block.as_bytes_mut()[..value.len()].copy_from_slice(value.as_bytes());
    Ok(block)
}

/// Copy a string into a new zero-terminated allocation of wide code units.
pub(crate) fn wide_to_native(
    heap: &Arc<dyn NativeHeap>,
    platform: &PlatformConfig,
    value: &str,
) -> Result<NativeBlock> {
    let units = wide::encode_units(platform.wchar_width, value);
    if let Some(position) = units.iter().position(|&u| u == 0) {
        return Err(CodecError::invariant_violation(format!(
            "wide string has an interior NUL at unit {position}"
        )));
    }
    let width = platform.wchar_width.bytes();
    let mut block = NativeBlock::allocate(heap, (units.len() + 1) * width)?;
    let bytes = block.as_bytes_mut();
    for (i, &unit) in units.iter().enumerate() {
        write_unit(platform, &mut bytes[i * width..(i + 1) * width], unit);
    }
    Ok(block)
}

/// Decode a NUL-terminated UTF-8 string. A null pointer reads as `""`.
///
/// # Safety
///
/// `ptr` must be null or point to a readable NUL-terminated buffer.
pub(crate) unsafe fn narrow_from_native(ptr: *const u8) -> Result<String> {
    if ptr.is_null() {
        tracing::trace!("null native string read as empty");
        return Ok(String::new());
    }
    let text = CStr::from_ptr(ptr.cast::<libc::c_char>());
    text.to_str()
        .map(str::to_string)
        .map_err(|e| CodecError::invalid_utf8(e.valid_up_to(), e.to_string()))
}

/// Decode a zero-terminated wide string. A null pointer reads as `""`.
///
/// # Safety
///
/// `ptr` must be null or point to a readable buffer of code units of the
/// configured width, terminated by a zero unit.
pub(crate) unsafe fn wide_from_native(platform: &PlatformConfig, ptr: *const u8) -> Result<String> {
    if ptr.is_null() {
        tracing::trace!("null native wide string read as empty");
        return Ok(String::new());
    }
    let width = platform.wchar_width.bytes();
    let mut units = Vec::new();
    loop {
        let bytes = std::slice::from_raw_parts(ptr.add(units.len() * width), width);
        let unit = read_unit(platform, bytes);
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    wide::decode_units(platform.wchar_width, &units)
}
