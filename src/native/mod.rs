// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Marshalling between Rust values and native memory blocks.
//!
//! This module provides:
//! - [`Marshaller`] - typed and shape-driven conversion to and from blocks
//! - [`NativeExport`] - ownership guard for everything handed to native code
//! - [`NativeHeap`] - allocator seam, [`LibcHeap`] by default
//! - [`NativeElement`] / [`IdlEnum`] - element types of native blocks

mod block;
mod dynamic;
mod element;
mod heap;
mod marshaller;
mod strings;

pub use block::{NativeBlock, NativeExport, RawExport};
pub use element::{IdlEnum, NativeElement};
pub use heap::{LibcHeap, NativeHeap, TrackingHeap};
pub use marshaller::Marshaller;
