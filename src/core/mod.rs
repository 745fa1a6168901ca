// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout cdrbridge.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error handling shared by the codec and the marshaller
//! - [`CodecValue`] - Unified value representation
//! - [`Shape`] - Layout description of values
//! - [`NdArray`] / [`RowMajorIndex`] - Multi-dimensional arrays and traversal
//! - [`PlatformConfig`] / [`CodecConfig`] - Platform conventions and limits

pub mod config;
pub mod error;
pub mod ndarray;
pub mod shape;
pub mod value;
pub mod wide;

pub use config::{ByteOrderKind, CodecConfig, ConfigError, PlatformConfig, WCharWidth};
pub use error::{CodecError, ErrorKind, Result};
pub use ndarray::{NdArray, RowMajorIndex};
pub use shape::{EnumShape, FieldShape, PrimitiveType, Shape, StructShape};
pub use value::{CodecValue, RecordValue};
