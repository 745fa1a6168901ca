// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cdrbridge::core::config::{ByteOrderKind, WCharWidth};
use cdrbridge::{
    CodecValue, Marshaller, PlatformConfig, PrimitiveType, Shape, StructShape, TrackingHeap,
};

// ============================================================================
// Platforms
// ============================================================================

/// Little-endian native blocks with the given wide character width.
pub fn little_endian(width: WCharWidth) -> PlatformConfig {
    PlatformConfig::detect()
        .with_native_byte_order(ByteOrderKind::Little)
        .with_wchar_width(width)
}

/// Every wide character width a platform may use.
pub const WIDTHS: [WCharWidth; 2] = [WCharWidth::Utf16, WCharWidth::Utf32];

/// Marshaller for the host platform backed by a counting heap.
pub fn tracked_marshaller() -> (Arc<TrackingHeap>, Marshaller) {
    let heap = Arc::new(TrackingHeap::new());
    let marshaller = Marshaller::with_heap(PlatformConfig::host(), heap.clone());
    (heap, marshaller)
}

// ============================================================================
// Values
// ============================================================================

/// Build a record value from name/value pairs.
pub fn record(fields: Vec<(&str, CodecValue)>) -> CodecValue {
    CodecValue::Struct(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    )
}

/// `int32[3][2][2]` with element `[i][j][k] = 100i + 10j + k`.
pub fn sentinel_cube() -> (Shape, CodecValue) {
    let shape = Shape::array(PrimitiveType::Int32.into(), &[3, 2, 2]);
    let value = CodecValue::Array(
        (0..3)
            .map(|i| {
                CodecValue::Array(
                    (0..2)
                        .map(|j| {
                            CodecValue::Array(
                                (0..2)
                                    .map(|k| CodecValue::Int32(100 * i + 10 * j + k))
                                    .collect(),
                            )
                        })
                        .collect(),
                )
            })
            .collect(),
    );
    (shape, value)
}

/// A record touching every kind of shape.
pub fn telemetry() -> (Shape, CodecValue) {
    let sample: Shape = StructShape::new("Sample")
        .field("flag", PrimitiveType::Bool.into())
        .field("reading", PrimitiveType::Float64.into())
        .into();

    let shape: Shape = StructShape::new("Telemetry")
        .field("id", PrimitiveType::UInt16.into())
        .field("code", PrimitiveType::Char.into())
        .field("symbol", PrimitiveType::WChar.into())
        .field("stamp", PrimitiveType::Int64.into())
        .field("gain", PrimitiveType::Float32.into())
        .field("name", Shape::string())
        .field("label", Shape::wstring())
        .field("mode", Shape::enumeration("Mode", &["Idle", "Run", "Halt"]))
        .field("samples", Shape::sequence(sample))
        .field("tags", Shape::sequence(Shape::string()))
        .field("grid", Shape::array(PrimitiveType::Octet.into(), &[2, 2]))
        .into();

    let value = record(vec![
        ("id", CodecValue::UInt16(513)),
        ("code", CodecValue::Char(b'Z')),
        ("symbol", CodecValue::WChar('Ω')),
        ("stamp", CodecValue::Int64(-9_000_000_000)),
        ("gain", CodecValue::Float32(0.25)),
        ("name", CodecValue::from("rover")),
        ("label", CodecValue::WString("Straße".to_string())),
        ("mode", CodecValue::Enum(1)),
        (
            "samples",
            CodecValue::Sequence(vec![
                record(vec![
                    ("flag", CodecValue::Bool(true)),
                    ("reading", CodecValue::Float64(1.5)),
                ]),
                record(vec![
                    ("flag", CodecValue::Bool(false)),
                    ("reading", CodecValue::Float64(-0.0)),
                ]),
            ]),
        ),
        (
            "tags",
            CodecValue::Sequence(vec![CodecValue::from("a"), CodecValue::from("")]),
        ),
        (
            "grid",
            CodecValue::Array(vec![
                CodecValue::Array(vec![CodecValue::Octet(1), CodecValue::Octet(2)]),
                CodecValue::Array(vec![CodecValue::Octet(3), CodecValue::Octet(4)]),
            ]),
        ),
    ]);
    (shape, value)
}
