// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Native heap abstraction.
//!
//! Every block handed across the boundary is allocated through a
//! [`NativeHeap`]. The default [`LibcHeap`] uses `malloc`/`free` so the native
//! runtime can release transferred memory with the C allocator.

use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::{CodecError, Result};

/// Allocator for memory shared with the native runtime.
pub trait NativeHeap: Send + Sync + fmt::Debug {
    /// Allocate `size` bytes. The contents are unspecified.
    fn allocate(&self, size: usize) -> Result<NonNull<u8>>;

    /// Release memory returned by [`NativeHeap::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this heap and must not be used or
    /// released again afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>);
}

/// C allocator heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibcHeap;

impl NativeHeap for LibcHeap {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        // malloc(0) may legally return NULL
        let raw = unsafe { libc::malloc(size.max(1)) };
        NonNull::new(raw.cast::<u8>()).ok_or_else(|| CodecError::allocation_failed(size))
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        libc::free(ptr.as_ptr().cast::<libc::c_void>());
    }
}

/// Heap that counts allocations and releases, for leak checks.
///
/// Optionally refuses allocations once a budget is spent, to exercise the
/// failure paths of the marshaller.
#[derive(Debug, Default)]
pub struct TrackingHeap {
    inner: LibcHeap,
    allocations: AtomicUsize,
    releases: AtomicUsize,
    bytes: AtomicUsize,
    budget: Option<usize>,
}

impl TrackingHeap {
    /// Create a heap with no allocation budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a heap that fails every allocation after the first `budget`.
    pub fn failing_after(budget: usize) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    /// Number of successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Number of releases.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Total bytes requested by successful allocations.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes.load(Ordering::SeqCst)
    }

    /// Allocations not yet released.
    pub fn outstanding(&self) -> usize {
        self.allocations().saturating_sub(self.releases())
    }
}

impl NativeHeap for TrackingHeap {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>> {
        if let Some(budget) = self.budget {
            if self.allocations() >= budget {
                tracing::debug!(size, budget, "tracking heap refused allocation");
                return Err(CodecError::allocation_failed(size));
            }
        }
        let ptr = self.inner.allocate(size)?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_add(size, Ordering::SeqCst);
        Ok(ptr)
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release(ptr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_libc_heap_round_trip() {
        let heap = LibcHeap;
        let ptr = heap.allocate(16).unwrap();
        unsafe {
            ptr.as_ptr().write_bytes(0xAB, 16);
            assert_eq!(*ptr.as_ptr().add(15), 0xAB);
            heap.release(ptr);
        }
    }

    #[test]
    fn test_libc_heap_zero_size() {
        let heap = LibcHeap;
        let ptr = heap.allocate(0).unwrap();
        unsafe { heap.release(ptr) };
    }

    #[test]
    fn test_tracking_heap_counts() {
        let heap = TrackingHeap::new();
        let a = heap.allocate(4).unwrap();
        let b = heap.allocate(8).unwrap();
        assert_eq!(heap.allocations(), 2);
        assert_eq!(heap.bytes_allocated(), 12);
        assert_eq!(heap.outstanding(), 2);
        unsafe {
            heap.release(a);
            heap.release(b);
        }
        assert_eq!(heap.outstanding(), 0);
    }

    #[test]
    fn test_tracking_heap_budget() {
        let heap = TrackingHeap::failing_after(1);
        let a = heap.allocate(4).unwrap();
        assert!(matches!(
            heap.allocate(4),
            Err(CodecError::AllocationFailed { size: 4 })
        ));
        unsafe { heap.release(a) };
        assert_eq!(heap.outstanding(), 0);
    }
}
