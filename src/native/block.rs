// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Owned native memory blocks.
//!
//! A [`NativeBlock`] is one allocation from a [`NativeHeap`]. A
//! [`NativeExport`] groups the outer block handed to the native runtime with
//! every secondary allocation it points to (string buffers, child sequence
//! blocks), so they are released together.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use super::heap::NativeHeap;
use crate::core::Result;

/// Borrow `len` bytes of memory owned by the native side.
///
/// # Safety
///
/// `ptr` must be valid for reads of `len` bytes for the lifetime `'a`.
pub(crate) unsafe fn borrow_native<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if len == 0 {
        return &[];
    }
    std::slice::from_raw_parts(ptr, len)
}

/// One zero-initialised allocation owned by Rust until released.
pub struct NativeBlock {
    ptr: NonNull<u8>,
    len: usize,
    heap: Arc<dyn NativeHeap>,
}

// SAFETY: the block is uniquely owned and the heap is Send + Sync.
unsafe impl Send for NativeBlock {}
// SAFETY: shared access only hands out `&[u8]`.
unsafe impl Sync for NativeBlock {}

impl NativeBlock {
    /// Allocate `len` zeroed bytes from `heap`.
    pub fn allocate(heap: &Arc<dyn NativeHeap>, len: usize) -> Result<Self> {
        let ptr = heap.allocate(len)?;
        // SAFETY: the allocation holds at least `len` bytes
        unsafe { ptr.as_ptr().write_bytes(0, len) };
        tracing::trace!(len, address = ?ptr, "allocated native block");
        Ok(Self {
            ptr,
            len,
            heap: Arc::clone(heap),
        })
    }

    /// Address of the first byte.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Mutable address of the first byte.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Address as an integer, as stored inside other blocks.
    #[inline]
    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the block holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Contents of the block.
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: `len` initialised bytes, uniquely owned
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Mutable contents of the block.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: `len` initialised bytes, uniquely owned
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Give up ownership without releasing the memory.
    pub fn into_raw(self) -> *mut u8 {
        let this = std::mem::ManuallyDrop::new(self);
        // SAFETY: `this` is never touched again, so the handle is moved out once
        let heap = unsafe { std::ptr::read(&this.heap) };
        drop(heap);
        this.ptr.as_ptr()
    }
}

impl Drop for NativeBlock {
    fn drop(&mut self) {
        tracing::trace!(len = self.len, address = ?self.ptr, "releasing native block");
        // SAFETY: allocated from this heap and never released before
        unsafe { self.heap.release(self.ptr) };
    }
}

impl fmt::Debug for NativeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBlock")
            .field("address", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}

/// Memory handed to the native runtime, with everything it references.
///
/// Dropping the export (or calling [`NativeExport::release`]) frees the outer
/// block and every secondary allocation. [`NativeExport::into_raw`] transfers
/// ownership to the caller instead.
#[must_use = "dropping a NativeExport releases the native memory"]
pub struct NativeExport {
    block: NativeBlock,
    secondary: Vec<NativeBlock>,
}

impl NativeExport {
    /// Wrap an outer block with no secondary allocations yet.
    pub(crate) fn new(block: NativeBlock) -> Self {
        Self {
            block,
            secondary: Vec::new(),
        }
    }

    /// Take ownership of a secondary allocation referenced from this export.
    pub(crate) fn own(&mut self, block: NativeBlock) {
        self.secondary.push(block);
    }

    /// Take ownership of another export's blocks, e.g. a child sequence.
    pub(crate) fn adopt(&mut self, child: NativeExport) {
        self.secondary.push(child.block);
        self.secondary.extend(child.secondary);
    }

    /// Mutable contents of the outer block.
    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        self.block.as_bytes_mut()
    }

    /// Address of the outer block, to pass to the native runtime.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.block.as_ptr()
    }

    /// Contents of the outer block.
    pub fn as_bytes(&self) -> &[u8] {
        self.block.as_bytes()
    }

    /// Size of the outer block in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.block.len()
    }

    /// Check if the outer block holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// Number of secondary allocations owned alongside the outer block.
    #[inline]
    pub fn secondary_count(&self) -> usize {
        self.secondary.len()
    }

    /// Release the outer block and every secondary allocation now.
    pub fn release(self) {
        tracing::debug!(
            len = self.block.len(),
            secondary = self.secondary.len(),
            "releasing native export"
        );
        drop(self);
    }

    /// Transfer ownership of all allocations to the caller.
    ///
    /// The memory must then be released with the functions in
    /// [`crate::ffi`] (for [`super::LibcHeap`] exports) or by the
    /// heap it came from.
    pub fn into_raw(self) -> RawExport {
        let NativeExport { block, secondary } = self;
        let len = block.len();
        RawExport {
            block: block.into_raw(),
            len,
            secondary: secondary.into_iter().map(NativeBlock::into_raw).collect(),
        }
    }
}

impl fmt::Debug for NativeExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeExport")
            .field("block", &self.block)
            .field("secondary", &self.secondary.len())
            .finish()
    }
}

/// Allocations whose ownership was transferred out of a [`NativeExport`].
#[derive(Debug)]
pub struct RawExport {
    /// Outer block
    pub block: *mut u8,
    /// Size of the outer block
    pub len: usize,
    /// Secondary allocations referenced from the outer block
    pub secondary: Vec<*mut u8>,
}
