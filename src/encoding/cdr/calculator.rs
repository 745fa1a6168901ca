// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CDR size calculator for computing the size of CDR-encoded data.

use crate::core::config::PlatformConfig;

use super::CDR_HEADER_SIZE;

/// CDR size calculator.
///
/// This calculator computes the size of CDR-encoded data before actually
/// encoding it, following the same alignment rules as the encoder. This is
/// useful for pre-allocating buffers.
///
/// # Example
///
/// ```
/// use cdrbridge::encoding::cdr::calculator::CdrCalculator;
///
/// let mut calc = CdrCalculator::new();
/// calc.int32();    // 4 bytes
/// calc.int32();    // 4 bytes
/// calc.string(5);  // 4 (length) + 5 + 1 (null) = 10 bytes
/// assert_eq!(calc.size(), 22); // header included
/// ```
#[derive(Debug, Clone)]
pub struct CdrCalculator {
    /// Current size offset (starts after the CDR header)
    offset: usize,
    /// Platform conventions (wide character width)
    platform: PlatformConfig,
}

impl Default for CdrCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl CdrCalculator {
    /// Create a new calculator for the host platform.
    ///
    /// The offset starts at 4, representing the size of the CDR header.
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformConfig::host())
    }

    /// Create a new calculator with explicit platform conventions.
    #[must_use]
    pub fn with_platform(platform: PlatformConfig) -> Self {
        Self {
            offset: CDR_HEADER_SIZE,
            platform,
        }
    }

    /// Get the current calculated size.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.offset
    }

    /// Calculate size for an 8-bit value (octet, int8, bool, char).
    pub fn uint8(&mut self) -> usize {
        self.increment_and_return(1)
    }

    /// Calculate size for a 16-bit signed/unsigned integer.
    pub fn int16(&mut self) -> usize {
        self.increment_and_return(2)
    }

    /// Calculate size for a 32-bit signed/unsigned integer or float.
    pub fn int32(&mut self) -> usize {
        self.increment_and_return(4)
    }

    /// Calculate size for a 64-bit signed/unsigned integer or double.
    pub fn int64(&mut self) -> usize {
        self.increment_and_return(8)
    }

    /// Calculate size for a primitive of `size` bytes, aligned to its size.
    pub fn primitive(&mut self, size: usize) -> usize {
        self.increment_and_return(size)
    }

    /// Calculate size for a wide character.
    pub fn wchar(&mut self) -> usize {
        self.increment_and_return(self.platform.wchar_width.bytes())
    }

    /// Calculate size for an enumeration ordinal.
    pub fn enumeration(&mut self) -> usize {
        self.int32()
    }

    /// Calculate size for a string.
    ///
    /// # Arguments
    ///
    /// * `length` - The byte length of the string content (not including null terminator)
    pub fn string(&mut self, length: usize) -> usize {
        self.int32();
        self.offset += length + 1; // Add one for the null terminator
        self.offset
    }

    /// Calculate size for a wide string.
    ///
    /// # Arguments
    ///
    /// * `units` - Number of code units (not including the terminator)
    pub fn wstring(&mut self, units: usize) -> usize {
        self.int32();
        for _ in 0..=units {
            self.wchar();
        }
        self.offset
    }

    /// Calculate size for a sequence length prefix.
    pub fn sequence_length(&mut self) -> usize {
        self.int32()
    }

    /// Calculate size for a sequence of fixed-size elements.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of elements in the sequence
    /// * `element_size` - Size of each element in bytes, also its alignment
    pub fn sequence(&mut self, count: usize, element_size: usize) -> usize {
        self.sequence_length();
        self.array(count, element_size)
    }

    /// Calculate size for a fixed array of fixed-size elements (no prefix).
    pub fn array(&mut self, count: usize, element_size: usize) -> usize {
        if count > 0 {
            self.align(element_size);
            self.offset += element_size * count;
        }
        self.offset
    }

    /// Add padding for alignment.
    ///
    /// # Arguments
    ///
    /// * `byte_count` - The byte width to align to (e.g., 4 for 4-byte alignment)
    pub fn align(&mut self, byte_count: usize) {
        let alignment = (self.offset - CDR_HEADER_SIZE) % byte_count;
        if alignment > 0 {
            self.offset += byte_count - alignment;
        }
    }

    /// Reset the calculator to its initial state.
    pub fn reset(&mut self) {
        self.offset = CDR_HEADER_SIZE;
    }

    /// Increment the offset by `byte_count` and any required padding bytes,
    /// then return the new offset.
    fn increment_and_return(&mut self, byte_count: usize) -> usize {
        self.align(byte_count);
        self.offset += byte_count;
        self.offset
    }
}
