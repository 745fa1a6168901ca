// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Typed conversion between Rust containers and native memory blocks.
//!
//! # Block layout
//!
//! A sequence block is a native `int` element count followed by the elements,
//! tightly packed:
//!
//! ```text
//! [count: i32][element 0][element 1] ... [element count-1]
//! ```
//!
//! Element `i` starts at `4 + element_size * i`. An empty sequence is exactly
//! the 4-byte count. Strings are stored as the address of a separate
//! NUL-terminated buffer. Fixed and multi-dimensional arrays carry no count;
//! element `i` (in row-major order) starts at `element_size * i`.
//!
//! Blocks produced by the `*_to_native` functions are owned by the returned
//! [`NativeExport`]. The `*_from_native` functions only read the block.

use std::ops::Range;
use std::sync::Arc;

use super::block::{borrow_native, NativeBlock, NativeExport};
use super::element::{
    read_address, read_count, read_enum, write_address, write_count, write_enum, IdlEnum,
    NativeElement,
};
use super::heap::{LibcHeap, NativeHeap};
use super::strings::{narrow_from_native, narrow_to_native, wide_from_native, wide_to_native};
use crate::core::config::{CodecConfig, PlatformConfig, DEFAULT_MAX_DEPTH};
use crate::core::ndarray::{element_count, NdArray, RowMajorIndex};
use crate::core::shape::{ADDRESS_SIZE, COUNT_SIZE, ENUM_SIZE};
use crate::core::wide;
use crate::core::{CodecError, Result};

/// Converts values to and from native memory blocks.
///
/// The platform conventions are fixed at construction and every block is
/// allocated from the configured [`NativeHeap`].
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use cdrbridge::native::Marshaller;
///
/// let marshaller = Marshaller::new();
/// let export = marshaller.sequence_to_native(&[1i32, 2, 3])?;
/// assert_eq!(export.len(), 4 + 3 * 4);
///
/// let mut back: Vec<i32> = Vec::new();
/// unsafe { marshaller.sequence_from_native(export.as_ptr(), &mut back)? };
/// assert_eq!(back, vec![1, 2, 3]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Marshaller {
    platform: PlatformConfig,
    heap: Arc<dyn NativeHeap>,
    max_depth: usize,
}

impl Default for Marshaller {
    fn default() -> Self {
        Self::new()
    }
}

impl Marshaller {
    /// Create a marshaller for the host platform using the C allocator.
    pub fn new() -> Self {
        Self::with_platform(PlatformConfig::host())
    }

    /// Create a marshaller with explicit platform conventions.
    pub fn with_platform(platform: PlatformConfig) -> Self {
        Self::with_heap(platform, Arc::new(LibcHeap))
    }

    /// Create a marshaller with explicit platform conventions and heap.
    pub fn with_heap(platform: PlatformConfig, heap: Arc<dyn NativeHeap>) -> Self {
        Self {
            platform,
            heap,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a marshaller sharing the platform and depth limit of a codec
    /// configuration.
    pub fn from_config(config: &CodecConfig) -> Self {
        Self::with_platform(config.platform).with_max_depth(config.max_depth)
    }

    /// Set the deepest nesting accepted by the dynamic value API.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Platform conventions.
    pub fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    /// Heap used for every allocation.
    pub fn heap(&self) -> &Arc<dyn NativeHeap> {
        &self.heap
    }

    /// Deepest nesting accepted by the dynamic value API.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    // ---------------------------------------------------------------------
    // Fixed-size element sequences
    // ---------------------------------------------------------------------

    /// Copy a slice into a new `[count][elements]` block.
    pub fn sequence_to_native<T: NativeElement>(&self, items: &[T]) -> Result<NativeExport> {
        let platform = self.platform;
        self.export_sequence(items.len(), T::native_size(&platform), |export, i, range| {
            items[i].write_native(&platform, &mut export.bytes_mut()[range])
        })
    }

    /// Read a `[count][elements]` block into `out`.
    ///
    /// `out` is cleared first. A null block reads as an empty sequence.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to a readable block laid out for `T`.
    pub unsafe fn sequence_from_native<T: NativeElement>(
        &self,
        block: *const u8,
        out: &mut Vec<T>,
    ) -> Result<()> {
        out.clear();
        let platform = self.platform;
        let size = T::native_size(&platform);
        let (count, body) = self.import_sequence(block, size)?;
        out.reserve(count);
        for bytes in body.chunks_exact(size) {
            out.push(T::read_native(&platform, bytes)?);
        }
        Ok(())
    }

    /// Copy enumerators into a new block of `int` ordinals.
    pub fn enum_sequence_to_native<E: IdlEnum>(&self, items: &[E]) -> Result<NativeExport> {
        let platform = self.platform;
        self.export_sequence(items.len(), ENUM_SIZE, |export, i, range| {
            write_enum(&platform, &mut export.bytes_mut()[range], items[i])
        })
    }

    /// Read a block of `int` ordinals into `out`.
    ///
    /// `out` is cleared first. Undeclared ordinals are rejected.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to a readable block of ordinals.
    pub unsafe fn enum_sequence_from_native<E: IdlEnum>(
        &self,
        block: *const u8,
        out: &mut Vec<E>,
    ) -> Result<()> {
        out.clear();
        let platform = self.platform;
        let (count, body) = self.import_sequence(block, ENUM_SIZE)?;
        out.reserve(count);
        for bytes in body.chunks_exact(ENUM_SIZE) {
            out.push(read_enum(&platform, bytes)?);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Strings
    // ---------------------------------------------------------------------

    /// Copy a string into a new NUL-terminated allocation.
    pub fn string_to_native(&self, value: &str) -> Result<NativeExport> {
        Ok(NativeExport::new(narrow_to_native(&self.heap, value)?))
    }

    /// Read a NUL-terminated UTF-8 string. A null pointer reads as `""`.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a readable NUL-terminated buffer.
    pub unsafe fn string_from_native(&self, ptr: *const u8) -> Result<String> {
        narrow_from_native(ptr)
    }

    /// Copy a string into a new zero-terminated wide allocation.
    pub fn wstring_to_native(&self, value: &str) -> Result<NativeExport> {
        Ok(NativeExport::new(wide_to_native(
            &self.heap,
            &self.platform,
            value,
        )?))
    }

    /// Read a zero-terminated wide string. A null pointer reads as `""`.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a readable zero-terminated buffer of
    /// code units of the configured width.
    pub unsafe fn wstring_from_native(&self, ptr: *const u8) -> Result<String> {
        wide_from_native(&self.platform, ptr)
    }

    /// Encode a wide character as the code unit passed by value to native code.
    pub fn wchar_to_native(&self, value: char) -> Result<u32> {
        wide::encode_char(self.platform.wchar_width, value)
    }

    /// Decode a wide character code unit received from native code.
    pub fn wchar_from_native(&self, unit: u32) -> Result<char> {
        wide::decode_char(self.platform.wchar_width, unit)
    }

    /// Copy strings into a block of addresses of NUL-terminated buffers.
    pub fn string_sequence_to_native<S: AsRef<str>>(&self, items: &[S]) -> Result<NativeExport> {
        let platform = self.platform;
        let heap = Arc::clone(&self.heap);
        self.export_sequence(items.len(), ADDRESS_SIZE, |export, i, range| {
            let text = narrow_to_native(&heap, items[i].as_ref())?;
            write_address(&platform, &mut export.bytes_mut()[range], text.address());
            export.own(text);
            Ok(())
        })
    }

    /// Read a block of string addresses into `out`.
    ///
    /// `out` is cleared first. Null element addresses read as `""`.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to a readable block whose addresses are
    /// null or point to NUL-terminated buffers.
    pub unsafe fn string_sequence_from_native(
        &self,
        block: *const u8,
        out: &mut Vec<String>,
    ) -> Result<()> {
        out.clear();
        let platform = self.platform;
        let (count, body) = self.import_sequence(block, ADDRESS_SIZE)?;
        out.reserve(count);
        for bytes in body.chunks_exact(ADDRESS_SIZE) {
            let address = read_address(&platform, bytes);
            out.push(narrow_from_native(address as *const u8)?);
        }
        Ok(())
    }

    /// Copy strings into a block of addresses of wide buffers.
    pub fn wstring_sequence_to_native<S: AsRef<str>>(&self, items: &[S]) -> Result<NativeExport> {
        let platform = self.platform;
        let heap = Arc::clone(&self.heap);
        self.export_sequence(items.len(), ADDRESS_SIZE, |export, i, range| {
            let text = wide_to_native(&heap, &platform, items[i].as_ref())?;
            write_address(&platform, &mut export.bytes_mut()[range], text.address());
            export.own(text);
            Ok(())
        })
    }

    /// Read a block of wide string addresses into `out`.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to a readable block whose addresses are
    /// null or point to zero-terminated wide buffers.
    pub unsafe fn wstring_sequence_from_native(
        &self,
        block: *const u8,
        out: &mut Vec<String>,
    ) -> Result<()> {
        out.clear();
        let platform = self.platform;
        let (count, body) = self.import_sequence(block, ADDRESS_SIZE)?;
        out.reserve(count);
        for bytes in body.chunks_exact(ADDRESS_SIZE) {
            let address = read_address(&platform, bytes);
            out.push(wide_from_native(&platform, address as *const u8)?);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Fixed and multi-dimensional arrays
    // ---------------------------------------------------------------------

    /// Copy an array into a new row-major block with no count prefix.
    pub fn array_to_native<T: NativeElement>(&self, array: &NdArray<T>) -> Result<NativeExport> {
        let platform = self.platform;
        let data = array.as_slice();
        self.export_array(array.dims(), data.len(), T::native_size(&platform), |export, linear, range| {
            data[linear].write_native(&platform, &mut export.bytes_mut()[range])
        })
    }

    /// Read a row-major block with the given extents.
    ///
    /// A null block reads as an array of default values.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to `product(dims)` readable elements.
    pub unsafe fn array_from_native<T>(&self, block: *const u8, dims: &[usize]) -> Result<NdArray<T>>
    where
        T: NativeElement + Default + Clone,
    {
        let mut array = NdArray::filled(dims, T::default());
        if block.is_null() {
            tracing::trace!(?dims, "null native array read as defaults");
            return Ok(array);
        }
        let platform = self.platform;
        self.import_array(block, dims, T::native_size(&platform), |index, bytes| {
            if let Some(slot) = array.get_mut(index) {
                *slot = T::read_native(&platform, bytes)?;
            }
            Ok(())
        })?;
        Ok(array)
    }

    /// Copy an array of enumerators into a row-major block of ordinals.
    pub fn enum_array_to_native<E: IdlEnum>(&self, array: &NdArray<E>) -> Result<NativeExport> {
        let platform = self.platform;
        let data = array.as_slice();
        self.export_array(array.dims(), data.len(), ENUM_SIZE, |export, linear, range| {
            write_enum(&platform, &mut export.bytes_mut()[range], data[linear])
        })
    }

    /// Read a row-major block of ordinals.
    ///
    /// A null block reads as zeroed memory would, every element ordinal 0.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to `product(dims)` readable ordinals.
    pub unsafe fn enum_array_from_native<E: IdlEnum>(
        &self,
        block: *const u8,
        dims: &[usize],
    ) -> Result<NdArray<E>> {
        let first = E::from_ordinal(0)
            .ok_or_else(|| CodecError::invalid_enum(E::NAME, 0, E::VARIANTS.len()))?;
        let mut array = NdArray::filled(dims, first);
        if block.is_null() {
            tracing::trace!(?dims, "null native enum array read as ordinal 0");
            return Ok(array);
        }
        let platform = self.platform;
        self.import_array(block, dims, ENUM_SIZE, |index, bytes| {
            if let Some(slot) = array.get_mut(index) {
                *slot = read_enum(&platform, bytes)?;
            }
            Ok(())
        })?;
        Ok(array)
    }

    /// Copy an array of strings into a row-major block of addresses.
    pub fn string_array_to_native(&self, array: &NdArray<String>) -> Result<NativeExport> {
        let platform = self.platform;
        let heap = Arc::clone(&self.heap);
        let data = array.as_slice();
        self.export_array(array.dims(), data.len(), ADDRESS_SIZE, |export, linear, range| {
            let text = narrow_to_native(&heap, &data[linear])?;
            write_address(&platform, &mut export.bytes_mut()[range], text.address());
            export.own(text);
            Ok(())
        })
    }

    /// Read a row-major block of string addresses.
    ///
    /// A null block, or a null element address, reads as `""`.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to `product(dims)` readable addresses,
    /// each null or pointing to a NUL-terminated buffer.
    pub unsafe fn string_array_from_native(
        &self,
        block: *const u8,
        dims: &[usize],
    ) -> Result<NdArray<String>> {
        let mut array = NdArray::filled(dims, String::new());
        if block.is_null() {
            tracing::trace!(?dims, "null native string array read as empty strings");
            return Ok(array);
        }
        let platform = self.platform;
        self.import_array(block, dims, ADDRESS_SIZE, |index, bytes| {
            if let Some(slot) = array.get_mut(index) {
                *slot = narrow_from_native(read_address(&platform, bytes) as *const u8)?;
            }
            Ok(())
        })?;
        Ok(array)
    }

    // ---------------------------------------------------------------------
    // Shared block plumbing
    // ---------------------------------------------------------------------

    /// Allocate a zeroed block from the configured heap.
    pub(super) fn allocate(&self, len: usize) -> Result<NativeBlock> {
        NativeBlock::allocate(&self.heap, len)
    }

    /// Allocate `[count][count * element_size]` and fill each element slot.
    ///
    /// The callback receives the export, the element index and the byte range
    /// of the element within the block.
    pub(super) fn export_sequence<F>(
        &self,
        count: usize,
        element_size: usize,
        mut write: F,
    ) -> Result<NativeExport>
    where
        F: FnMut(&mut NativeExport, usize, Range<usize>) -> Result<()>,
    {
        let len = element_size
            .checked_mul(count)
            .and_then(|n| n.checked_add(COUNT_SIZE))
            .ok_or_else(|| {
                CodecError::invariant_violation(format!(
                    "sequence of {count} elements of {element_size} bytes overflows"
                ))
            })?;
        let mut export = NativeExport::new(self.allocate(len)?);
        write_count(&self.platform, export.bytes_mut(), count)?;
        for i in 0..count {
            let start = COUNT_SIZE + element_size * i;
            write(&mut export, i, start..start + element_size)?;
        }
        tracing::debug!(
            count,
            element_size,
            len,
            secondary = export.secondary_count(),
            "exported native sequence"
        );
        Ok(export)
    }

    /// Read the count of a `[count][elements]` block and borrow its body.
    ///
    /// A null block reads as an empty sequence.
    ///
    /// # Safety
    ///
    /// `block` must be null or point to a readable block whose elements are
    /// `element_size` bytes each.
    pub(super) unsafe fn import_sequence<'a>(
        &self,
        block: *const u8,
        element_size: usize,
    ) -> Result<(usize, &'a [u8])> {
        if block.is_null() {
            tracing::trace!("null native sequence read as empty");
            return Ok((0, &[]));
        }
        let count = read_count(&self.platform, borrow_native(block, COUNT_SIZE))?;
        let body_len = element_size.checked_mul(count).ok_or_else(|| {
            CodecError::native_contract(format!(
                "sequence of {count} elements of {element_size} bytes overflows"
            ))
        })?;
        tracing::trace!(count, element_size, "importing native sequence");
        Ok((count, borrow_native(block.add(COUNT_SIZE), body_len)))
    }

    /// Allocate `product(dims) * element_size` and fill each element slot in
    /// row-major order.
    ///
    /// The callback receives the export, the row-major offset and the byte
    /// range of the element within the block.
    pub(super) fn export_array<F>(
        &self,
        dims: &[usize],
        count: usize,
        element_size: usize,
        mut write: F,
    ) -> Result<NativeExport>
    where
        F: FnMut(&mut NativeExport, usize, Range<usize>) -> Result<()>,
    {
        let total = element_count(dims);
        if count != total {
            return Err(CodecError::invariant_violation(format!(
                "array of extents {dims:?} needs {total} elements, got {count}"
            )));
        }
        let len = element_size.checked_mul(total).ok_or_else(|| {
            CodecError::invariant_violation(format!(
                "array of extents {dims:?} with {element_size}-byte elements overflows"
            ))
        })?;
        let mut export = NativeExport::new(self.allocate(len)?);
        let mut index = RowMajorIndex::new(dims);
        while !index.is_done() {
            let start = element_size * index.linear();
            write(&mut export, index.linear(), start..start + element_size)?;
            index.advance();
        }
        tracing::debug!(?dims, element_size, len, "exported native array");
        Ok(export)
    }

    /// Walk the elements of a row-major block in odometer order.
    ///
    /// The callback receives the per-dimension index and the element bytes.
    ///
    /// # Safety
    ///
    /// `block` must point to `product(dims) * element_size` readable bytes.
    pub(super) unsafe fn import_array<F>(
        &self,
        block: *const u8,
        dims: &[usize],
        element_size: usize,
        mut read: F,
    ) -> Result<()>
    where
        F: FnMut(&[usize], &[u8]) -> Result<()>,
    {
        let total = element_count(dims);
        let len = element_size.checked_mul(total).ok_or_else(|| {
            CodecError::native_contract(format!(
                "array of extents {dims:?} with {element_size}-byte elements overflows"
            ))
        })?;
        let body = borrow_native(block, len);
        let mut index = RowMajorIndex::new(dims);
        while !index.is_done() {
            let start = element_size * index.linear();
            read(index.index(), &body[start..start + element_size])?;
            index.advance();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ByteOrderKind, WCharWidth};
    use crate::native::heap::TrackingHeap;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Level {
        Low,
        Mid,
        High,
    }

    impl IdlEnum for Level {
        const NAME: &'static str = "Level";
        const VARIANTS: &'static [Self] = &[Level::Low, Level::Mid, Level::High];
    }

    fn tracked(platform: PlatformConfig) -> (Arc<TrackingHeap>, Marshaller) {
        let heap = Arc::new(TrackingHeap::new());
        let marshaller = Marshaller::with_heap(platform, heap.clone());
        (heap, marshaller)
    }

    fn little() -> PlatformConfig {
        PlatformConfig::detect().with_native_byte_order(ByteOrderKind::Little)
    }

    #[test]
    fn test_empty_sequence_is_four_zero_bytes() {
        let marshaller = Marshaller::with_platform(little());
        let export = marshaller.sequence_to_native::<f64>(&[]).unwrap();
        assert_eq!(export.as_bytes(), &[0, 0, 0, 0]);

        let mut out = vec![1.0f64];
        unsafe { marshaller.sequence_from_native(export.as_ptr(), &mut out) }.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_sequence_layout() {
        let marshaller = Marshaller::with_platform(little());
        let export = marshaller.sequence_to_native(&[0x0102i16, -1]).unwrap();
        assert_eq!(export.as_bytes(), &[2, 0, 0, 0, 0x02, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn test_bool_sequence_one_byte_each() {
        let marshaller = Marshaller::with_platform(little());
        let export = marshaller.sequence_to_native(&[true, false, true]).unwrap();
        assert_eq!(export.as_bytes(), &[3, 0, 0, 0, 1, 0, 1]);
        let mut out = Vec::<bool>::new();
        unsafe { marshaller.sequence_from_native(export.as_ptr(), &mut out) }.unwrap();
        assert_eq!(out, vec![true, false, true]);
    }

    #[test]
    fn test_sequence_from_null_is_empty() {
        let marshaller = Marshaller::new();
        let mut out = vec![1u32, 2];
        unsafe { marshaller.sequence_from_native::<u32>(std::ptr::null(), &mut out) }.unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_negative_count_is_contract_violation() {
        let marshaller = Marshaller::with_platform(little());
        let block = (-3i32).to_le_bytes();
        let mut out = Vec::<u8>::new();
        let err = unsafe { marshaller.sequence_from_native(block.as_ptr(), &mut out) }.unwrap_err();
        assert!(matches!(err, CodecError::NativeContract { .. }));
    }

    #[test]
    fn test_big_endian_native_order() {
        let platform = PlatformConfig::detect().with_native_byte_order(ByteOrderKind::Big);
        let marshaller = Marshaller::with_platform(platform);
        let export = marshaller.sequence_to_native(&[7u32]).unwrap();
        assert_eq!(export.as_bytes(), &[0, 0, 0, 1, 0, 0, 0, 7]);
        let mut out = Vec::<u32>::new();
        unsafe { marshaller.sequence_from_native(export.as_ptr(), &mut out) }.unwrap();
        assert_eq!(out, vec![7u32]);
    }

    #[test]
    fn test_wide_char_sequence() {
        for width in [WCharWidth::Utf16, WCharWidth::Utf32] {
            let marshaller = Marshaller::with_platform(little().with_wchar_width(width));
            let export = marshaller.sequence_to_native(&['a', 'ß', '€']).unwrap();
            assert_eq!(export.len(), 4 + 3 * width.bytes());
            let mut out = Vec::<char>::new();
            unsafe { marshaller.sequence_from_native(export.as_ptr(), &mut out) }.unwrap();
            assert_eq!(out, vec!['a', 'ß', '€']);
        }
    }

    #[test]
    fn test_enum_sequence() {
        let marshaller = Marshaller::with_platform(little());
        let export = marshaller
            .enum_sequence_to_native(&[Level::High, Level::Low])
            .unwrap();
        assert_eq!(export.as_bytes(), &[2, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
        let mut out = Vec::<Level>::new();
        unsafe { marshaller.enum_sequence_from_native(export.as_ptr(), &mut out) }.unwrap();
        assert_eq!(out, vec![Level::High, Level::Low]);
    }

    #[test]
    fn test_enum_sequence_rejects_unknown_ordinal() {
        let marshaller = Marshaller::with_platform(little());
        let mut block = 1i32.to_le_bytes().to_vec();
        block.extend_from_slice(&9i32.to_le_bytes());
        let mut out = Vec::<Level>::new();
        let err =
            unsafe { marshaller.enum_sequence_from_native(block.as_ptr(), &mut out) }.unwrap_err();
        assert!(matches!(err, CodecError::InvalidEnum { ordinal: 9, .. }));
    }

    #[test]
    fn test_string_sequence_owns_buffers() {
        let (heap, marshaller) = tracked(PlatformConfig::host());
        let export = marshaller
            .string_sequence_to_native(&["alpha", "", "γ"])
            .unwrap();
        assert_eq!(export.len(), 4 + 3 * ADDRESS_SIZE);
        assert_eq!(export.secondary_count(), 3);
        assert_eq!(heap.outstanding(), 4);

        let mut out = Vec::new();
        unsafe { marshaller.string_sequence_from_native(export.as_ptr(), &mut out) }.unwrap();
        assert_eq!(out, vec!["alpha", "", "γ"]);

        export.release();
        assert_eq!(heap.outstanding(), 0);
    }

    #[test]
    fn test_string_sequence_null_element_reads_empty() {
        let marshaller = Marshaller::with_platform(little());
        let mut block = 1i32.to_le_bytes().to_vec();
        block.extend_from_slice(&[0u8; ADDRESS_SIZE]);
        let mut out = Vec::new();
        unsafe { marshaller.string_sequence_from_native(block.as_ptr(), &mut out) }.unwrap();
        assert_eq!(out, vec![String::new()]);
    }

    #[test]
    fn test_failed_allocation_releases_partial_export() {
        let heap = Arc::new(TrackingHeap::failing_after(2));
        let marshaller = Marshaller::with_heap(PlatformConfig::host(), heap.clone());
        let err = marshaller
            .string_sequence_to_native(&["a", "b", "c"])
            .unwrap_err();
        assert!(matches!(err, CodecError::AllocationFailed { .. }));
        assert_eq!(heap.allocations(), 2);
        assert_eq!(heap.outstanding(), 0);
    }

    #[test]
    fn test_wstring_sequence() {
        for width in [WCharWidth::Utf16, WCharWidth::Utf32] {
            let marshaller = Marshaller::with_platform(PlatformConfig::host().with_wchar_width(width));
            let export = marshaller.wstring_sequence_to_native(&["naïve", "日本"]).unwrap();
            let mut out = Vec::new();
            unsafe { marshaller.wstring_sequence_from_native(export.as_ptr(), &mut out) }
                .unwrap();
            assert_eq!(out, vec!["naïve", "日本"]);
        }
    }

    #[test]
    fn test_single_strings() {
        let marshaller = Marshaller::new();
        let export = marshaller.string_to_native("hello").unwrap();
        assert_eq!(export.as_bytes(), b"hello\0");
        assert_eq!(
            unsafe { marshaller.string_from_native(export.as_ptr()) }.unwrap(),
            "hello"
        );
        assert_eq!(
            unsafe { marshaller.string_from_native(std::ptr::null()) }.unwrap(),
            ""
        );

        let export = marshaller.wstring_to_native("wide ü").unwrap();
        assert_eq!(
            unsafe { marshaller.wstring_from_native(export.as_ptr()) }.unwrap(),
            "wide ü"
        );
    }

    #[test]
    fn test_wchar_by_value() {
        let utf16 = Marshaller::with_platform(little().with_wchar_width(WCharWidth::Utf16));
        assert_eq!(utf16.wchar_to_native('é').unwrap(), 0xE9);
        assert!(matches!(
            utf16.wchar_to_native('😀'),
            Err(CodecError::InvariantViolation { .. })
        ));
        assert_eq!(utf16.wchar_from_native(0x20AC).unwrap(), '€');

        let utf32 = Marshaller::with_platform(little().with_wchar_width(WCharWidth::Utf32));
        assert_eq!(utf32.wchar_to_native('😀').unwrap(), 0x1F600);
        assert_eq!(utf32.wchar_from_native(0x1F600).unwrap(), '😀');
        assert!(utf32.wchar_from_native(0xD800).is_err());
    }

    #[test]
    fn test_array_row_major_layout() {
        let marshaller = Marshaller::with_platform(little());
        let array = NdArray::from_fn(&[2, 3], |idx| (idx[0] * 10 + idx[1]) as u8);
        let export = marshaller.array_to_native(&array).unwrap();
        assert_eq!(export.as_bytes(), &[0, 1, 2, 10, 11, 12]);

        let back: NdArray<u8> =
            unsafe { marshaller.array_from_native(export.as_ptr(), &[2, 3]) }.unwrap();
        assert_eq!(back, array);
    }

    #[test]
    fn test_array_from_null_is_default() {
        let marshaller = Marshaller::new();
        let back: NdArray<f32> =
            unsafe { marshaller.array_from_native(std::ptr::null(), &[2, 2]) }.unwrap();
        assert_eq!(back.as_slice(), &[0.0; 4]);
    }

    #[test]
    fn test_enum_array() {
        let marshaller = Marshaller::new();
        let array = NdArray::from_fn(&[3], |idx| Level::VARIANTS[2 - idx[0]]);
        let export = marshaller.enum_array_to_native(&array).unwrap();
        assert_eq!(export.len(), 3 * ENUM_SIZE);
        let back: NdArray<Level> =
            unsafe { marshaller.enum_array_from_native(export.as_ptr(), &[3]) }.unwrap();
        assert_eq!(back.as_slice(), &[Level::High, Level::Mid, Level::Low]);

        let zeroed: NdArray<Level> =
            unsafe { marshaller.enum_array_from_native(std::ptr::null(), &[2]) }.unwrap();
        assert_eq!(zeroed.as_slice(), &[Level::Low, Level::Low]);
    }

    #[test]
    fn test_string_array_owns_buffers() {
        let (heap, marshaller) = tracked(PlatformConfig::host());
        let array = NdArray::from_fn(&[2, 2], |idx| format!("s{}{}", idx[0], idx[1]));
        let export = marshaller.string_array_to_native(&array).unwrap();
        assert_eq!(export.len(), 4 * ADDRESS_SIZE);
        assert_eq!(heap.outstanding(), 5);

        let back = unsafe { marshaller.string_array_from_native(export.as_ptr(), &[2, 2]) }
            .unwrap();
        assert_eq!(back, array);

        drop(export);
        assert_eq!(heap.outstanding(), 0);
    }

    #[test]
    fn test_export_array_rejects_short_data() {
        let (heap, marshaller) = tracked(little());
        let err = marshaller
            .export_array(&[2, 2], 1, 4, |_, _, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, CodecError::InvariantViolation { .. }));
        assert_eq!(heap.allocations(), 0);
    }
}
