// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR cursor for reading CDR-encoded data with proper alignment.

use crate::core::config::{PlatformConfig, WCharWidth};
use crate::core::wide;
use crate::CodecError;
use crate::Result as CoreResult;

use super::encoder::EncapsulationKind;

/// Size of the CDR encapsulation header (4 bytes).
pub const CDR_HEADER_SIZE: usize = 4;

/// CDR cursor that tracks position for proper alignment.
///
/// The cursor is used for reading CDR-encoded data. It tracks:
/// - `offset`: Current read position in the buffer
/// - `origin`: Alignment reference point, the first byte after the header
///
/// Alignment is calculated as `(offset - origin) % size`, so the header never
/// shifts the alignment of the payload that follows it.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use cdrbridge::encoding::cdr::cursor::CdrCursor;
///
/// let data = vec![0x00, 0x01, 0x00, 0x00, 0x2A, 0x00, 0x00, 0x00]; // CDR header + value
/// let mut cursor = CdrCursor::new(&data)?;
/// assert_eq!(cursor.read_u32()?, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CdrCursor<'a> {
    /// The data buffer (includes CDR header)
    data: &'a [u8],
    /// Current read position
    offset: usize,
    /// Origin offset for alignment calculation
    origin: usize,
    /// Encapsulation declared by the header
    kind: EncapsulationKind,
    /// Platform conventions (wide character width)
    platform: PlatformConfig,
}

impl<'a> CdrCursor<'a> {
    /// Create a new CDR cursor using the host platform conventions.
    ///
    /// # CDR Header Format
    ///
    /// The CDR header is 4 bytes:
    /// - Byte 0: Unused (always 0)
    /// - Byte 1: Encapsulation kind (`0x00` big endian, `0x01` little endian)
    /// - Bytes 2-3: Options (unused, set to 0)
    pub fn new(data: &'a [u8]) -> CoreResult<Self> {
        Self::with_platform(data, PlatformConfig::host())
    }

    /// Create a new CDR cursor with explicit platform conventions.
    pub fn with_platform(data: &'a [u8], platform: PlatformConfig) -> CoreResult<Self> {
        if data.len() < CDR_HEADER_SIZE {
            return Err(CodecError::invalid_header(format!(
                "CDR data size {} must contain at least a 4-byte header",
                data.len()
            )));
        }

        let kind = EncapsulationKind::from_byte(data[1]).ok_or_else(|| {
            CodecError::unsupported(format!("CDR encapsulation kind {:#04x}", data[1]))
        })?;

        Ok(Self {
            data,
            offset: CDR_HEADER_SIZE,
            origin: CDR_HEADER_SIZE,
            kind,
            platform,
        })
    }

    /// Encapsulation kind declared by the header.
    #[inline]
    pub fn kind(&self) -> EncapsulationKind {
        self.kind
    }

    /// Platform conventions used for wide characters.
    #[inline]
    pub fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    /// Get the current position relative to the data start.
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Get the current position relative to the payload start.
    #[inline]
    pub fn payload_position(&self) -> usize {
        self.offset - self.origin
    }

    /// Get the remaining bytes available to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Check if at end of buffer.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Align to the specified boundary, relative to the payload start.
    pub fn align(&mut self, size: usize) -> CoreResult<()> {
        let alignment = (self.offset - self.origin) % size;
        if alignment > 0 {
            let padding = size - alignment;
            if self.offset + padding > self.data.len() {
                return Err(CodecError::buffer_too_short(
                    padding,
                    self.remaining(),
                    self.offset as u64,
                ));
            }
            self.offset += padding;
        }
        Ok(())
    }

    /// Take the next `N` bytes without alignment.
    fn take<const N: usize>(&mut self) -> CoreResult<[u8; N]> {
        if N > self.remaining() {
            return Err(CodecError::buffer_too_short(
                N,
                self.remaining(),
                self.offset as u64,
            ));
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(bytes)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> CoreResult<u8> {
        let [value] = self.take::<1>()?;
        Ok(value)
    }

    /// Read a signed byte.
    pub fn read_i8(&mut self) -> CoreResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a boolean. Any non-zero byte reads as `true`.
    pub fn read_bool(&mut self) -> CoreResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a narrow (1 byte) character.
    pub fn read_char(&mut self) -> CoreResult<u8> {
        self.read_u8()
    }

    /// Read a u16 value.
    pub fn read_u16(&mut self) -> CoreResult<u16> {
        self.align(2)?;
        let bytes = self.take::<2>()?;
        Ok(if self.kind.is_little_endian() {
            u16::from_le_bytes(bytes)
        } else {
            u16::from_be_bytes(bytes)
        })
    }

    /// Read an i16 value.
    pub fn read_i16(&mut self) -> CoreResult<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read a u32 value.
    pub fn read_u32(&mut self) -> CoreResult<u32> {
        self.align(4)?;
        let bytes = self.take::<4>()?;
        Ok(if self.kind.is_little_endian() {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    /// Read an i32 value.
    pub fn read_i32(&mut self) -> CoreResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read a u64 value.
    pub fn read_u64(&mut self) -> CoreResult<u64> {
        self.align(8)?;
        let bytes = self.take::<8>()?;
        Ok(if self.kind.is_little_endian() {
            u64::from_le_bytes(bytes)
        } else {
            u64::from_be_bytes(bytes)
        })
    }

    /// Read an i64 value.
    pub fn read_i64(&mut self) -> CoreResult<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Read an f32 value.
    ///
    /// The bytes are put in stream order first and only then reinterpreted,
    /// so NaN payloads and signed zeros survive on any host.
    pub fn read_f32(&mut self) -> CoreResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read an f64 value.
    pub fn read_f64(&mut self) -> CoreResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Read one wide character code unit of the configured width.
    fn read_wide_unit(&mut self) -> CoreResult<u32> {
        match self.platform.wchar_width {
            WCharWidth::Utf16 => Ok(u32::from(self.read_u16()?)),
            WCharWidth::Utf32 => self.read_u32(),
        }
    }

    /// Read a wide character.
    pub fn read_wchar(&mut self) -> CoreResult<char> {
        let unit = self.read_wide_unit()?;
        wide::decode_char(self.platform.wchar_width, unit)
    }

    /// Read an enumeration ordinal.
    pub fn read_enum(&mut self) -> CoreResult<u32> {
        self.read_u32()
    }

    /// Read a sequence length prefix.
    pub fn read_sequence_length(&mut self) -> CoreResult<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Read a length-prefixed, NUL-terminated UTF-8 string.
    ///
    /// The length counts the terminator. A length of zero is tolerated and
    /// reads as the empty string.
    pub fn read_string(&mut self) -> CoreResult<String> {
        let length = self.read_u32()? as usize;
        if length == 0 {
            tracing::trace!(position = self.offset, "zero-length CDR string");
            return Ok(String::new());
        }
        if length > self.remaining() {
            return Err(CodecError::length_exceeded(
                length,
                self.offset,
                self.data.len(),
            ));
        }
        let start = self.offset;
        let bytes = self.read_bytes(length - 1)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::invalid_utf8(start, e.to_string()))?
            .to_string();
        // Terminator
        self.skip(1)?;
        Ok(text)
    }

    /// Read a length-prefixed, zero-terminated wide string.
    ///
    /// The length counts code units including the terminator.
    pub fn read_wstring(&mut self) -> CoreResult<String> {
        let length = self.read_u32()? as usize;
        if length == 0 {
            tracing::trace!(position = self.offset, "zero-length CDR wide string");
            return Ok(String::new());
        }
        let width = self.platform.wchar_width;
        if length.saturating_mul(width.bytes()) > self.remaining() {
            return Err(CodecError::length_exceeded(
                length,
                self.offset,
                self.data.len(),
            ));
        }
        let mut units = Vec::with_capacity(length - 1);
        for _ in 0..length - 1 {
            units.push(self.read_wide_unit()?);
        }
        // Terminator
        self.read_wide_unit()?;
        wide::decode_units(width, &units)
    }

    /// Read a byte slice without copying.
    pub fn read_bytes(&mut self, count: usize) -> CoreResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(CodecError::buffer_too_short(
                count,
                self.remaining(),
                self.offset as u64,
            ));
        }
        let start = self.offset;
        self.offset += count;
        Ok(&self.data[start..self.offset])
    }

    /// Skip bytes.
    pub fn skip(&mut self, count: usize) -> CoreResult<()> {
        if count > self.remaining() {
            return Err(CodecError::buffer_too_short(
                count,
                self.remaining(),
                self.offset as u64,
            ));
        }
        self.offset += count;
        Ok(())
    }

    /// Peek at the next byte without advancing the position.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }
}
