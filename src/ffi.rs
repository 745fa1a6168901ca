// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! C ABI for releasing memory transferred to native code.
//!
//! These functions release blocks produced with the default [`LibcHeap`]
//! after ownership left Rust through [`NativeExport::into_raw`]. Blocks are
//! laid out in host byte order.
//!
//! [`LibcHeap`]: crate::native::LibcHeap
//! [`NativeExport::into_raw`]: crate::native::NativeExport::into_raw

use std::os::raw::{c_char, c_void};

use byteorder::{ByteOrder, NativeEndian};

use crate::core::shape::{ADDRESS_SIZE, COUNT_SIZE};

/// Release a sequence, array or record block that holds no addresses.
///
/// # Safety
/// - `block` must be NULL or a pointer obtained from `NativeExport::into_raw`
///   with the C allocator.
/// - Must only be called once per block.
#[no_mangle]
pub unsafe extern "C" fn cdrbridge_release_block(block: *mut c_void) {
    if block.is_null() {
        return;
    }
    tracing::trace!(address = ?block, "native release of block");
    libc::free(block);
}

/// Release a NUL-terminated string buffer.
///
/// # Safety
/// - `text` must be NULL or a string pointer obtained from
///   `NativeExport::into_raw` with the C allocator.
/// - Must only be called once per string.
#[no_mangle]
pub unsafe extern "C" fn cdrbridge_release_string(text: *mut c_char) {
    if text.is_null() {
        return;
    }
    tracing::trace!(address = ?text, "native release of string");
    libc::free(text.cast::<c_void>());
}

/// Release a string sequence block and every string it points to.
///
/// Works for narrow and wide string sequences alike.
///
/// # Safety
/// - `block` must be NULL or a `[count][addresses]` block in host byte order
///   obtained from `NativeExport::into_raw` with the C allocator.
/// - Every non-null address in the block must be owned by the block.
/// - Must only be called once per block.
#[no_mangle]
pub unsafe extern "C" fn cdrbridge_release_string_sequence(block: *mut c_void) {
    if block.is_null() {
        return;
    }
    let base = block.cast::<u8>();
    let count = NativeEndian::read_i32(std::slice::from_raw_parts(base, COUNT_SIZE));
    let count = usize::try_from(count).unwrap_or(0);
    let addresses = std::slice::from_raw_parts(base.add(COUNT_SIZE), count * ADDRESS_SIZE);
    for slot in addresses.chunks_exact(ADDRESS_SIZE) {
        let address = if ADDRESS_SIZE == 8 {
            NativeEndian::read_u64(slot) as usize
        } else {
            NativeEndian::read_u32(slot) as usize
        };
        if address != 0 {
            libc::free(address as *mut c_void);
        }
    }
    tracing::trace!(address = ?block, count, "native release of string sequence");
    libc::free(block);
}
