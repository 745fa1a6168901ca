// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR encoder for writing CDR-encoded data.
//!
//! The encoder always produces little-endian CDR and says so in the
//! encapsulation header. The buffer only ever grows: padding and values are
//! appended, and bytes that were already written are never revisited.

use byteorder::{LittleEndian, WriteBytesExt};

use super::CDR_HEADER_SIZE;
use crate::core::config::{PlatformConfig, WCharWidth, DEFAULT_INITIAL_CAPACITY};
use crate::core::wide;
use crate::core::{CodecError, Result as CoreResult};

/// CDR encapsulation kind.
///
/// Defines the endianness of the CDR data. Only plain CDR is understood;
/// other identifiers in the header byte are rejected by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EncapsulationKind {
    /// CDR, Big Endian
    CdrBe = 0x00,
    /// CDR, Little Endian
    #[default]
    CdrLe = 0x01,
}

impl EncapsulationKind {
    /// Parse the kind byte of an encapsulation header.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::CdrBe),
            0x01 => Some(Self::CdrLe),
            _ => None,
        }
    }

    /// Check if this encapsulation uses little endian byte order.
    #[must_use]
    pub const fn is_little_endian(self) -> bool {
        matches!(self, Self::CdrLe)
    }
}

/// CDR encoder for writing CDR-encoded data.
///
/// This encoder takes care of:
/// - Alignment relative to the end of the encapsulation header
/// - Zero padding
/// - Length prefixes and terminators for strings
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use cdrbridge::encoding::cdr::encoder::CdrEncoder;
///
/// let mut encoder = CdrEncoder::new();
/// encoder.int32(42)?.string("hello")?;
/// let data = encoder.finish();
/// assert_eq!(&data[..4], &[0x00, 0x01, 0x00, 0x00]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CdrEncoder {
    /// Output buffer, header included
    buffer: Vec<u8>,
    /// Platform conventions (wide character width)
    platform: PlatformConfig,
}

impl Default for CdrEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CdrEncoder {
    /// Create a new encoder for the host platform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformConfig::host())
    }

    /// Create a new encoder with explicit platform conventions.
    #[must_use]
    pub fn with_platform(platform: PlatformConfig) -> Self {
        Self::build(platform, DEFAULT_INITIAL_CAPACITY)
    }

    /// Create a new encoder with the specified initial capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(PlatformConfig::host(), capacity)
    }

    /// Create a new encoder with explicit platform and capacity.
    #[must_use]
    pub fn with_platform_and_capacity(platform: PlatformConfig, capacity: usize) -> Self {
        Self::build(platform, capacity)
    }

    fn build(platform: PlatformConfig, capacity: usize) -> Self {
        let mut buffer = Vec::with_capacity(capacity.max(CDR_HEADER_SIZE));
        // Write CDR header
        buffer.push(0); // Unused
        buffer.push(EncapsulationKind::CdrLe as u8); // Encapsulation kind
        buffer.push(0); // Options (unused)
        buffer.push(0); // Options (unused)
        Self { buffer, platform }
    }

    /// Get the encapsulation kind.
    #[must_use]
    pub const fn kind(&self) -> EncapsulationKind {
        EncapsulationKind::CdrLe
    }

    /// Platform conventions used for wide characters.
    #[must_use]
    pub const fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    /// Get the current size of the encoded data, header included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Get the number of payload bytes written after the header.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.buffer.len() - CDR_HEADER_SIZE
    }

    /// Get a reference to the encoded data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the encoder and return the encoded data.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    /// Reset the encoder to write a new message.
    ///
    /// Keeps the allocated buffer and the header.
    pub fn reset(&mut self) {
        self.buffer.truncate(CDR_HEADER_SIZE);
    }

    /// Append zero padding up to the specified boundary.
    fn align(&mut self, size: usize) {
        let alignment = self.payload_len() % size;
        if alignment > 0 {
            let padding = size - alignment;
            self.buffer.resize(self.buffer.len() + padding, 0);
        }
    }

    /// Write an 8-bit signed integer.
    pub fn int8(&mut self, value: i8) -> CoreResult<&mut Self> {
        self.buffer.push(value as u8);
        Ok(self)
    }

    /// Write an 8-bit unsigned integer.
    pub fn uint8(&mut self, value: u8) -> CoreResult<&mut Self> {
        self.buffer.push(value);
        Ok(self)
    }

    /// Write a boolean as a single `0`/`1` byte.
    pub fn bool(&mut self, value: bool) -> CoreResult<&mut Self> {
        self.uint8(u8::from(value))
    }

    /// Write a narrow (1 byte) character.
    pub fn char(&mut self, value: u8) -> CoreResult<&mut Self> {
        self.uint8(value)
    }

    /// Write a 16-bit signed integer.
    pub fn int16(&mut self, value: i16) -> CoreResult<&mut Self> {
        self.align(2);
        self.buffer.write_i16::<LittleEndian>(value)?;
        Ok(self)
    }

    /// Write a 16-bit unsigned integer.
    pub fn uint16(&mut self, value: u16) -> CoreResult<&mut Self> {
        self.align(2);
        self.buffer.write_u16::<LittleEndian>(value)?;
        Ok(self)
    }

    /// Write a 32-bit signed integer.
    pub fn int32(&mut self, value: i32) -> CoreResult<&mut Self> {
        self.align(4);
        self.buffer.write_i32::<LittleEndian>(value)?;
        Ok(self)
    }

    /// Write a 32-bit unsigned integer.
    pub fn uint32(&mut self, value: u32) -> CoreResult<&mut Self> {
        self.align(4);
        self.buffer.write_u32::<LittleEndian>(value)?;
        Ok(self)
    }

    /// Write a 64-bit signed integer.
    pub fn int64(&mut self, value: i64) -> CoreResult<&mut Self> {
        self.align(8);
        self.buffer.write_i64::<LittleEndian>(value)?;
        Ok(self)
    }

    /// Write a 64-bit unsigned integer.
    pub fn uint64(&mut self, value: u64) -> CoreResult<&mut Self> {
        self.align(8);
        self.buffer.write_u64::<LittleEndian>(value)?;
        Ok(self)
    }

    /// Write a 32-bit float, bit for bit.
    pub fn float32(&mut self, value: f32) -> CoreResult<&mut Self> {
        self.uint32(value.to_bits())
    }

    /// Write a 64-bit double, bit for bit.
    pub fn float64(&mut self, value: f64) -> CoreResult<&mut Self> {
        self.uint64(value.to_bits())
    }

    /// Write one wide code unit at the configured width.
    fn wide_unit(&mut self, unit: u32) -> CoreResult<&mut Self> {
        match self.platform.wchar_width {
            // `wide` never yields units wider than 16 bits for Utf16
            WCharWidth::Utf16 => self.uint16(unit as u16),
            WCharWidth::Utf32 => self.uint32(unit),
        }
    }

    /// Write a wide character.
    pub fn wchar(&mut self, value: char) -> CoreResult<&mut Self> {
        let unit = wide::encode_char(self.platform.wchar_width, value)?;
        self.wide_unit(unit)
    }

    /// Write a string as `UInt32(len + 1)`, its UTF-8 bytes and a NUL.
    pub fn string(&mut self, value: &str) -> CoreResult<&mut Self> {
        let length = checked_length(value.len() + 1, "string")?;
        self.uint32(length)?;
        self.buffer.extend_from_slice(value.as_bytes());
        self.buffer.push(0); // Null terminator
        Ok(self)
    }

    /// Write a wide string as `UInt32(units + 1)`, its code units and a zero unit.
    pub fn wstring(&mut self, value: &str) -> CoreResult<&mut Self> {
        let units = wide::encode_units(self.platform.wchar_width, value);
        let length = checked_length(units.len() + 1, "wide string")?;
        self.uint32(length)?;
        for unit in units {
            self.wide_unit(unit)?;
        }
        self.wide_unit(0)?; // Null terminator
        Ok(self)
    }

    /// Write an enumeration ordinal.
    pub fn enumeration(&mut self, ordinal: u32) -> CoreResult<&mut Self> {
        self.uint32(ordinal)
    }

    /// Write a sequence length (for dynamic arrays).
    pub fn sequence_length(&mut self, value: usize) -> CoreResult<&mut Self> {
        let length = checked_length(value, "sequence")?;
        self.uint32(length)
    }

    /// Write raw bytes without alignment.
    pub fn bytes(&mut self, data: &[u8]) -> CoreResult<&mut Self> {
        self.buffer.extend_from_slice(data);
        Ok(self)
    }
}

/// Narrow a length to its `u32` wire form.
fn checked_length(length: usize, what: &str) -> CoreResult<u32> {
    u32::try_from(length).map_err(|_| {
        CodecError::invariant_violation(format!(
            "{what} length {length} does not fit in a 32-bit length prefix"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::cdr::cursor::CdrCursor;

    fn utf16() -> PlatformConfig {
        PlatformConfig::detect().with_wchar_width(WCharWidth::Utf16)
    }

    fn utf32() -> PlatformConfig {
        PlatformConfig::detect().with_wchar_width(WCharWidth::Utf32)
    }

    #[test]
    fn test_encoder_new() {
        let encoder = CdrEncoder::new();
        assert_eq!(encoder.size(), 4);
        assert_eq!(encoder.data(), &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(encoder.kind(), EncapsulationKind::CdrLe);
    }

    #[test]
    fn test_encapsulation_kind_from_byte() {
        assert_eq!(
            EncapsulationKind::from_byte(0x00),
            Some(EncapsulationKind::CdrBe)
        );
        assert_eq!(
            EncapsulationKind::from_byte(0x01),
            Some(EncapsulationKind::CdrLe)
        );
        assert_eq!(EncapsulationKind::from_byte(0x02), None);
        assert!(!EncapsulationKind::CdrBe.is_little_endian());
    }

    #[test]
    fn test_encoder_int8() {
        let mut encoder = CdrEncoder::new();
        encoder.int8(-1).unwrap();
        assert_eq!(encoder.data(), &[0x00, 0x01, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_encoder_bool() {
        let mut encoder = CdrEncoder::new();
        encoder.bool(true).unwrap().bool(false).unwrap();
        assert_eq!(&encoder.data()[4..], &[0x01, 0x00]);
    }

    #[test]
    fn test_encoder_int16() {
        let mut encoder = CdrEncoder::new();
        encoder.int16(0x1234).unwrap();
        assert_eq!(&encoder.data()[4..], &[0x34, 0x12]);
    }

    #[test]
    fn test_encoder_int64_no_padding_after_header() {
        let mut encoder = CdrEncoder::new();
        encoder.int64(0x0102030405060708).unwrap();
        assert_eq!(encoder.size(), 12);
        assert_eq!(
            &encoder.data()[4..],
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_encoder_float64() {
        let mut encoder = CdrEncoder::new();
        encoder.float64(1.0).unwrap();
        assert_eq!(&encoder.data()[4..], &1.0f64.to_le_bytes());
    }

    #[test]
    fn test_encoder_string() {
        let mut encoder = CdrEncoder::new();
        encoder.string("hello").unwrap();
        let data = encoder.data();
        assert_eq!(&data[4..8], &6u32.to_le_bytes());
        assert_eq!(&data[8..14], b"hello\0");
    }

    #[test]
    fn test_encoder_empty_string() {
        let mut encoder = CdrEncoder::new();
        encoder.string("").unwrap();
        assert_eq!(&encoder.data()[4..], &[0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_encoder_alignment() {
        let mut encoder = CdrEncoder::new();
        encoder.uint8(0x01).unwrap();
        encoder.int32(42).unwrap();
        // header + u8 + 3 padding + i32
        assert_eq!(encoder.size(), 12);
        assert_eq!(&encoder.data()[5..8], &[0, 0, 0]);
    }

    #[test]
    fn test_encoder_alignment_eight() {
        let mut encoder = CdrEncoder::new();
        encoder.uint8(0x01).unwrap();
        encoder.float64(2.0).unwrap();
        assert_eq!(encoder.size(), 4 + 8 + 8);
        assert!(encoder.data()[5..12].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encoder_wchar_utf16() {
        let mut encoder = CdrEncoder::with_platform(utf16());
        encoder.wchar('é').unwrap();
        assert_eq!(&encoder.data()[4..], &[0xE9, 0x00]);
    }

    #[test]
    fn test_encoder_wchar_astral_rejected_on_utf16() {
        let mut encoder = CdrEncoder::with_platform(utf16());
        assert!(matches!(
            encoder.wchar('😀'),
            Err(CodecError::InvariantViolation { .. })
        ));
        // nothing was written
        assert_eq!(encoder.size(), 4);
    }

    #[test]
    fn test_encoder_wstring_utf32() {
        let mut encoder = CdrEncoder::with_platform(utf32());
        encoder.wstring("ab").unwrap();
        let mut expected = 3u32.to_le_bytes().to_vec();
        expected.extend_from_slice(&(b'a' as u32).to_le_bytes());
        expected.extend_from_slice(&(b'b' as u32).to_le_bytes());
        expected.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(&encoder.data()[4..], expected.as_slice());
    }

    #[test]
    fn test_encoder_wstring_utf16_surrogate_pair() {
        let mut encoder = CdrEncoder::with_platform(utf16());
        encoder.wstring("😀").unwrap();
        // pair + terminator
        assert_eq!(&encoder.data()[4..8], &3u32.to_le_bytes());
        assert_eq!(encoder.payload_len(), 4 + 3 * 2);
    }

    #[test]
    fn test_encoder_enumeration_and_sequence_length() {
        let mut encoder = CdrEncoder::new();
        encoder.enumeration(2).unwrap().sequence_length(3).unwrap();
        assert_eq!(&encoder.data()[4..8], &2u32.to_le_bytes());
        assert_eq!(&encoder.data()[8..12], &3u32.to_le_bytes());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_encoder_sequence_length_overflow() {
        let mut encoder = CdrEncoder::new();
        let err = encoder.sequence_length(u32::MAX as usize + 1).unwrap_err();
        assert!(matches!(err, CodecError::InvariantViolation { .. }));
    }

    #[test]
    fn test_encoder_bytes() {
        let mut encoder = CdrEncoder::new();
        encoder.uint8(1).unwrap().bytes(&[0xAA, 0xBB]).unwrap();
        assert_eq!(&encoder.data()[4..], &[0x01, 0xAA, 0xBB]);
    }

    #[test]
    fn test_reset() {
        let mut encoder = CdrEncoder::new();
        encoder.int32(42).unwrap();
        assert_eq!(encoder.size(), 8);
        encoder.reset();
        assert_eq!(encoder.size(), 4);
        encoder.uint8(7).unwrap();
        assert_eq!(encoder.data(), &[0x00, 0x01, 0x00, 0x00, 0x07]);
    }

    #[test]
    fn test_encoder_with_capacity() {
        let encoder = CdrEncoder::with_capacity(256);
        assert_eq!(encoder.size(), 4);
        assert!(encoder.finish().capacity() >= 256);
    }

    #[test]
    fn test_round_trip_mixed_values() {
        let platform = utf32();
        let mut encoder = CdrEncoder::with_platform(platform);
        encoder
            .bool(true)
            .unwrap()
            .int16(-3)
            .unwrap()
            .uint64(u64::MAX)
            .unwrap()
            .string("ok")
            .unwrap()
            .wchar('λ')
            .unwrap()
            .float32(f32::MIN_POSITIVE)
            .unwrap()
            .wstring("ωx")
            .unwrap();
        let data = encoder.finish();

        let mut cursor = CdrCursor::with_platform(&data, platform).unwrap();
        assert!(cursor.read_bool().unwrap());
        assert_eq!(cursor.read_i16().unwrap(), -3);
        assert_eq!(cursor.read_u64().unwrap(), u64::MAX);
        assert_eq!(cursor.read_string().unwrap(), "ok");
        assert_eq!(cursor.read_wchar().unwrap(), 'λ');
        assert_eq!(cursor.read_f32().unwrap(), f32::MIN_POSITIVE);
        assert_eq!(cursor.read_wstring().unwrap(), "ωx");
        assert!(cursor.is_at_end());
    }
}
