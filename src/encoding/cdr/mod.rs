// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR (Common Data Representation) module.
//!
//! Provides CDR encoding, decoding, and size calculation:
//! - [`CdrEncoder`] - append-only little-endian writer
//! - [`CdrCursor`] - zero-copy reader honouring the header byte order
//! - [`CdrCalculator`] - serialized size prediction
//! - [`CdrCodec`] - whole values driven by a [`Shape`](crate::core::Shape)

pub mod calculator;
pub mod codec;
pub mod cursor;
pub mod encoder;

pub use calculator::CdrCalculator;
pub use codec::CdrCodec;
pub use cursor::{CdrCursor, CDR_HEADER_SIZE};
pub use encoder::{CdrEncoder, EncapsulationKind};
