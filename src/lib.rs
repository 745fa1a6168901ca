// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # cdrbridge
//!
//! CDR serialization and native memory marshalling for DDS-style IDL data.
//!
//! The library is organized in three parts:
//! - **CDR codec** in the [`encoding::cdr`](crate::encoding::cdr) module:
//!   an aligned little-endian writer, a reader that honours either byte order,
//!   a size calculator and a shape-driven value codec
//! - **Boundary marshaller** in the [`native`](crate::native) module: packs
//!   sequences, strings, arrays and records into `[count][elements]` blocks
//!   for a native runtime and reads them back
//! - **Release ABI** in the [`ffi`](crate::ffi) module, for memory whose
//!   ownership was handed to native code
//!
//! Values are described by [`Shape`] and carried as [`CodecValue`]. Platform
//! conventions (wide character width, native byte order) are a
//! [`PlatformConfig`] resolved once and passed in explicitly.
//!
//! ## Example: CDR round trip
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cdrbridge::{CdrCodec, CodecValue, PrimitiveType, Shape, StructShape};
//!
//! let shape: Shape = StructShape::new("Sample")
//!     .field("id", PrimitiveType::UInt32.into())
//!     .field("name", Shape::string())
//!     .into();
//! let value = CodecValue::Struct(
//!     [
//!         ("id".to_string(), CodecValue::UInt32(7)),
//!         ("name".to_string(), CodecValue::from("hello")),
//!     ]
//!     .into_iter()
//!     .collect(),
//! );
//!
//! let codec = CdrCodec::new();
//! let bytes = codec.encode(&value, &shape)?;
//! assert_eq!(codec.decode(&bytes, &shape)?, value);
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Handing a sequence to native code
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cdrbridge::Marshaller;
//!
//! let marshaller = Marshaller::new();
//! let export = marshaller.string_sequence_to_native(&["left", "right"])?;
//!
//! let mut names = Vec::new();
//! unsafe { marshaller.string_sequence_from_native(export.as_ptr(), &mut names)? };
//! assert_eq!(names, ["left", "right"]);
//!
//! // Dropping the export releases the block and both strings
//! drop(export);
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{
    ByteOrderKind, CodecConfig, CodecError, CodecValue, ErrorKind, NdArray, PlatformConfig,
    PrimitiveType, Result, Shape, StructShape, WCharWidth,
};

// CDR encoding/decoding
pub mod encoding;

pub use encoding::{CdrCalculator, CdrCodec, CdrCursor, CdrEncoder, EncapsulationKind};

// Native boundary marshalling
pub mod native;

pub use native::{IdlEnum, LibcHeap, Marshaller, NativeExport, NativeHeap, TrackingHeap};

// C release ABI
pub mod ffi;
