// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Wide character code units.
//!
//! A wide character is one code unit of the configured [`WCharWidth`]:
//! a UTF-16 unit on Windows-family platforms and a UTF-32 unit elsewhere.
//! Wide strings are sequences of such units. Units are carried as `u32`
//! regardless of width; writers truncate to the unit width.

use super::config::WCharWidth;
use super::error::{CodecError, Result};

/// Encode a single wide character as one code unit.
///
/// Characters outside the Basic Multilingual Plane do not fit in one UTF-16
/// unit and are rejected.
pub fn encode_char(width: WCharWidth, value: char) -> Result<u32> {
    let code = value as u32;
    match width {
        WCharWidth::Utf16 if code > 0xFFFF => Err(CodecError::invariant_violation(format!(
            "character U+{code:04X} does not fit in a 16-bit wchar"
        ))),
        _ => Ok(code),
    }
}

/// Decode a single wide character code unit.
pub fn decode_char(width: WCharWidth, unit: u32) -> Result<char> {
    if width == WCharWidth::Utf16 && unit > 0xFFFF {
        return Err(CodecError::invalid_char(unit));
    }
    // Lone surrogates are rejected here too
    char::from_u32(unit).ok_or_else(|| CodecError::invalid_char(unit))
}

/// Encode a string as wide code units, without a terminator.
pub fn encode_units(width: WCharWidth, value: &str) -> Vec<u32> {
    match width {
        WCharWidth::Utf16 => value.encode_utf16().map(u32::from).collect(),
        WCharWidth::Utf32 => value.chars().map(|c| c as u32).collect(),
    }
}

/// Decode wide code units (without terminator) into a string.
pub fn decode_units(width: WCharWidth, units: &[u32]) -> Result<String> {
    match width {
        WCharWidth::Utf16 => {
            let mut narrow = Vec::with_capacity(units.len());
            for &unit in units {
                let unit = u16::try_from(unit).map_err(|_| CodecError::invalid_char(unit))?;
                narrow.push(unit);
            }
            char::decode_utf16(narrow)
                .map(|r| r.map_err(|e| CodecError::invalid_char(u32::from(e.unpaired_surrogate()))))
                .collect()
        }
        WCharWidth::Utf32 => units
            .iter()
            .map(|&unit| char::from_u32(unit).ok_or_else(|| CodecError::invalid_char(unit)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_char_bmp() {
        assert_eq!(encode_char(WCharWidth::Utf16, 'é').unwrap(), 0xE9);
        assert_eq!(encode_char(WCharWidth::Utf32, 'é').unwrap(), 0xE9);
    }

    #[test]
    fn test_encode_char_astral_needs_utf32() {
        assert!(encode_char(WCharWidth::Utf16, '😀').is_err());
        assert_eq!(encode_char(WCharWidth::Utf32, '😀').unwrap(), 0x1F600);
    }

    #[test]
    fn test_decode_char_rejects_surrogate() {
        assert!(decode_char(WCharWidth::Utf16, 0xD800).is_err());
        assert!(decode_char(WCharWidth::Utf32, 0xD800).is_err());
        assert!(decode_char(WCharWidth::Utf16, 0x1F600).is_err());
        assert_eq!(decode_char(WCharWidth::Utf32, 0x1F600).unwrap(), '😀');
    }

    #[test]
    fn test_units_utf16_surrogate_pair() {
        let units = encode_units(WCharWidth::Utf16, "a😀");
        assert_eq!(units, vec![0x61, 0xD83D, 0xDE00]);
        assert_eq!(decode_units(WCharWidth::Utf16, &units).unwrap(), "a😀");
    }

    #[test]
    fn test_units_utf32() {
        let units = encode_units(WCharWidth::Utf32, "a😀");
        assert_eq!(units, vec![0x61, 0x1F600]);
        assert_eq!(decode_units(WCharWidth::Utf32, &units).unwrap(), "a😀");
    }

    #[test]
    fn test_decode_units_unpaired_surrogate() {
        let err = decode_units(WCharWidth::Utf16, &[0x61, 0xD83D]).unwrap_err();
        assert!(matches!(err, CodecError::InvalidChar { code: 0xD83D }));
    }
}
