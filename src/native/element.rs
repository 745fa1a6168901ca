// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Element types of native blocks.
//!
//! [`NativeElement`] is implemented for a closed set of scalar types. Each one
//! knows its packed size and how to write itself into, and read itself from,
//! a native block in the configured byte order. Enumerations are carried as
//! 4-byte `int` ordinals through [`IdlEnum`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::core::config::{ByteOrderKind, PlatformConfig, WCharWidth};
use crate::core::shape::{ADDRESS_SIZE, COUNT_SIZE, ENUM_SIZE};
use crate::core::wide;
use crate::core::{CodecError, Result};

mod sealed {
    pub trait Sealed {}
}

/// Scalar that can be stored in a native block.
///
/// This trait is sealed; the supported set is the IDL scalars: integers,
/// floats, `bool` (1 byte), narrow `u8` characters and wide `char`.
pub trait NativeElement: sealed::Sealed + Sized {
    /// Packed size in bytes.
    fn native_size(platform: &PlatformConfig) -> usize;

    /// Write the value into `out`, which is exactly `native_size` bytes.
    fn write_native(&self, platform: &PlatformConfig, out: &mut [u8]) -> Result<()>;

    /// Read a value from `bytes`, which is exactly `native_size` bytes.
    fn read_native(platform: &PlatformConfig, bytes: &[u8]) -> Result<Self>;
}

macro_rules! impl_native_element {
    ($ty:ty, $size:expr, $write:ident, $read:ident) => {
        impl sealed::Sealed for $ty {}

        impl NativeElement for $ty {
            #[inline]
            fn native_size(_platform: &PlatformConfig) -> usize {
                $size
            }

            #[inline]
            fn write_native(&self, platform: &PlatformConfig, out: &mut [u8]) -> Result<()> {
                match platform.native_byte_order {
                    ByteOrderKind::Little => LittleEndian::$write(out, *self),
                    ByteOrderKind::Big => BigEndian::$write(out, *self),
                }
                Ok(())
            }

            #[inline]
            fn read_native(platform: &PlatformConfig, bytes: &[u8]) -> Result<Self> {
                Ok(match platform.native_byte_order {
                    ByteOrderKind::Little => LittleEndian::$read(bytes),
                    ByteOrderKind::Big => BigEndian::$read(bytes),
                })
            }
        }
    };
}

impl_native_element!(i16, 2, write_i16, read_i16);
impl_native_element!(u16, 2, write_u16, read_u16);
impl_native_element!(i32, 4, write_i32, read_i32);
impl_native_element!(u32, 4, write_u32, read_u32);
impl_native_element!(i64, 8, write_i64, read_i64);
impl_native_element!(u64, 8, write_u64, read_u64);
impl_native_element!(f32, 4, write_f32, read_f32);
impl_native_element!(f64, 8, write_f64, read_f64);

impl sealed::Sealed for i8 {}

impl NativeElement for i8 {
    fn native_size(_platform: &PlatformConfig) -> usize {
        1
    }

    fn write_native(&self, _platform: &PlatformConfig, out: &mut [u8]) -> Result<()> {
        out[0] = *self as u8;
        Ok(())
    }

    fn read_native(_platform: &PlatformConfig, bytes: &[u8]) -> Result<Self> {
        Ok(bytes[0] as i8)
    }
}

impl sealed::Sealed for u8 {}

impl NativeElement for u8 {
    fn native_size(_platform: &PlatformConfig) -> usize {
        1
    }

    fn write_native(&self, _platform: &PlatformConfig, out: &mut [u8]) -> Result<()> {
        out[0] = *self;
        Ok(())
    }

    fn read_native(_platform: &PlatformConfig, bytes: &[u8]) -> Result<Self> {
        Ok(bytes[0])
    }
}

impl sealed::Sealed for bool {}

impl NativeElement for bool {
    fn native_size(_platform: &PlatformConfig) -> usize {
        1
    }

    fn write_native(&self, _platform: &PlatformConfig, out: &mut [u8]) -> Result<()> {
        out[0] = u8::from(*self);
        Ok(())
    }

    /// Any non-zero byte reads as `true`.
    fn read_native(_platform: &PlatformConfig, bytes: &[u8]) -> Result<Self> {
        Ok(bytes[0] != 0)
    }
}

impl sealed::Sealed for char {}

impl NativeElement for char {
    fn native_size(platform: &PlatformConfig) -> usize {
        platform.wchar_width.bytes()
    }

    fn write_native(&self, platform: &PlatformConfig, out: &mut [u8]) -> Result<()> {
        let unit = wide::encode_char(platform.wchar_width, *self)?;
        write_unit(platform, out, unit);
        Ok(())
    }

    fn read_native(platform: &PlatformConfig, bytes: &[u8]) -> Result<Self> {
        wide::decode_char(platform.wchar_width, read_unit(platform, bytes))
    }
}

/// Write one wide code unit at the configured width.
pub(crate) fn write_unit(platform: &PlatformConfig, out: &mut [u8], unit: u32) {
    // Callers only pass units produced for this width
    match (platform.wchar_width, platform.native_byte_order) {
        (WCharWidth::Utf16, ByteOrderKind::Little) => LittleEndian::write_u16(out, unit as u16),
        (WCharWidth::Utf16, ByteOrderKind::Big) => BigEndian::write_u16(out, unit as u16),
        (WCharWidth::Utf32, ByteOrderKind::Little) => LittleEndian::write_u32(out, unit),
        (WCharWidth::Utf32, ByteOrderKind::Big) => BigEndian::write_u32(out, unit),
    }
}

/// Read one wide code unit at the configured width.
pub(crate) fn read_unit(platform: &PlatformConfig, bytes: &[u8]) -> u32 {
    match (platform.wchar_width, platform.native_byte_order) {
        (WCharWidth::Utf16, ByteOrderKind::Little) => u32::from(LittleEndian::read_u16(bytes)),
        (WCharWidth::Utf16, ByteOrderKind::Big) => u32::from(BigEndian::read_u16(bytes)),
        (WCharWidth::Utf32, ByteOrderKind::Little) => LittleEndian::read_u32(bytes),
        (WCharWidth::Utf32, ByteOrderKind::Big) => BigEndian::read_u32(bytes),
    }
}

/// Write the element count prefix of a block.
pub(crate) fn write_count(platform: &PlatformConfig, out: &mut [u8], count: usize) -> Result<()> {
    let count = i32::try_from(count).map_err(|_| {
        CodecError::invariant_violation(format!(
            "count {count} does not fit in a native int prefix"
        ))
    })?;
    count.write_native(platform, &mut out[..COUNT_SIZE])
}

/// Read the element count prefix of a block.
pub(crate) fn read_count(platform: &PlatformConfig, bytes: &[u8]) -> Result<usize> {
    let count = i32::read_native(platform, &bytes[..COUNT_SIZE])?;
    usize::try_from(count)
        .map_err(|_| CodecError::native_contract(format!("negative element count {count}")))
}

/// Write an address stored inside a block.
pub(crate) fn write_address(platform: &PlatformConfig, out: &mut [u8], address: usize) {
    let out = &mut out[..ADDRESS_SIZE];
    match (ADDRESS_SIZE, platform.native_byte_order) {
        (8, ByteOrderKind::Little) => LittleEndian::write_u64(out, address as u64),
        (8, ByteOrderKind::Big) => BigEndian::write_u64(out, address as u64),
        (_, ByteOrderKind::Little) => LittleEndian::write_u32(out, address as u32),
        (_, ByteOrderKind::Big) => BigEndian::write_u32(out, address as u32),
    }
}

/// Read an address stored inside a block.
pub(crate) fn read_address(platform: &PlatformConfig, bytes: &[u8]) -> usize {
    let bytes = &bytes[..ADDRESS_SIZE];
    match (ADDRESS_SIZE, platform.native_byte_order) {
        (8, ByteOrderKind::Little) => LittleEndian::read_u64(bytes) as usize,
        (8, ByteOrderKind::Big) => BigEndian::read_u64(bytes) as usize,
        (_, ByteOrderKind::Little) => LittleEndian::read_u32(bytes) as usize,
        (_, ByteOrderKind::Big) => BigEndian::read_u32(bytes) as usize,
    }
}

/// IDL enumeration carried as a 4-byte `int` ordinal.
///
/// Implementors list their variants in ordinal order; the conversions are
/// derived from that list.
///
/// ```
/// use cdrbridge::native::IdlEnum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Color {
///     Red,
///     Green,
/// }
///
/// impl IdlEnum for Color {
///     const NAME: &'static str = "Color";
///     const VARIANTS: &'static [Self] = &[Color::Red, Color::Green];
/// }
///
/// assert_eq!(Color::Green.ordinal(), 1);
/// assert_eq!(Color::from_ordinal(0), Some(Color::Red));
/// assert_eq!(Color::from_ordinal(2), None);
/// ```
pub trait IdlEnum: Copy + PartialEq + 'static {
    /// Type name used in diagnostics.
    const NAME: &'static str;

    /// Variants in ordinal order.
    const VARIANTS: &'static [Self];

    /// Ordinal of this variant.
    fn ordinal(self) -> i32 {
        Self::VARIANTS
            .iter()
            .position(|v| *v == self)
            .and_then(|p| i32::try_from(p).ok())
            .unwrap_or(-1)
    }

    /// Variant for an ordinal, if it is declared.
    fn from_ordinal(ordinal: i32) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|o| Self::VARIANTS.get(o))
            .copied()
    }
}

/// Write an enum ordinal as a native `int`.
pub(crate) fn write_enum<E: IdlEnum>(platform: &PlatformConfig, out: &mut [u8], value: E) -> Result<()> {
    value.ordinal().write_native(platform, &mut out[..ENUM_SIZE])
}

/// Read an enum ordinal from a native `int`.
pub(crate) fn read_enum<E: IdlEnum>(platform: &PlatformConfig, bytes: &[u8]) -> Result<E> {
    let ordinal = i32::read_native(platform, &bytes[..ENUM_SIZE])?;
    E::from_ordinal(ordinal).ok_or_else(|| {
        CodecError::invalid_enum(E::NAME, i64::from(ordinal), E::VARIANTS.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn little() -> PlatformConfig {
        PlatformConfig::detect()
            .with_native_byte_order(ByteOrderKind::Little)
            .with_wchar_width(WCharWidth::Utf32)
    }

    fn big_utf16() -> PlatformConfig {
        PlatformConfig::detect()
            .with_native_byte_order(ByteOrderKind::Big)
            .with_wchar_width(WCharWidth::Utf16)
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        Off,
        On,
        Auto,
    }

    impl IdlEnum for Mode {
        const NAME: &'static str = "Mode";
        const VARIANTS: &'static [Self] = &[Mode::Off, Mode::On, Mode::Auto];
    }

    #[test]
    fn test_sizes() {
        let p = little();
        assert_eq!(bool::native_size(&p), 1);
        assert_eq!(u8::native_size(&p), 1);
        assert_eq!(i16::native_size(&p), 2);
        assert_eq!(f32::native_size(&p), 4);
        assert_eq!(u64::native_size(&p), 8);
        assert_eq!(char::native_size(&p), 4);
        assert_eq!(char::native_size(&big_utf16()), 2);
    }

    #[test]
    fn test_byte_order() {
        let mut out = [0u8; 4];
        0x01020304i32.write_native(&little(), &mut out).unwrap();
        assert_eq!(out, [4, 3, 2, 1]);
        0x01020304i32.write_native(&big_utf16(), &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(i32::read_native(&big_utf16(), &out).unwrap(), 0x01020304);
    }

    #[test]
    fn test_float_bits_preserved() {
        let mut out = [0u8; 8];
        let nan = f64::from_bits(0x7FF8_0000_0000_0001);
        nan.write_native(&little(), &mut out).unwrap();
        let back = f64::read_native(&little(), &out).unwrap();
        assert_eq!(back.to_bits(), nan.to_bits());
    }

    #[test]
    fn test_bool_lenient_read() {
        let p = little();
        assert!(!bool::read_native(&p, &[0]).unwrap());
        assert!(bool::read_native(&p, &[1]).unwrap());
        assert!(bool::read_native(&p, &[0x80]).unwrap());
    }

    #[test]
    fn test_wide_char() {
        let p = big_utf16();
        let mut out = [0u8; 2];
        'Ж'.write_native(&p, &mut out).unwrap();
        assert_eq!(out, [0x04, 0x16]);
        assert_eq!(char::read_native(&p, &out).unwrap(), 'Ж');
        assert!('😀'.write_native(&p, &mut out).is_err());

        let p = little();
        let mut out = [0u8; 4];
        '😀'.write_native(&p, &mut out).unwrap();
        assert_eq!(char::read_native(&p, &out).unwrap(), '😀');
    }

    #[test]
    fn test_count_prefix() {
        let p = little();
        let mut out = [0u8; 4];
        write_count(&p, &mut out, 3).unwrap();
        assert_eq!(read_count(&p, &out).unwrap(), 3);

        (-1i32).write_native(&p, &mut out).unwrap();
        assert!(matches!(
            read_count(&p, &out),
            Err(CodecError::NativeContract { .. })
        ));
    }

    #[test]
    fn test_address_round_trip() {
        let p = little();
        let mut out = [0u8; ADDRESS_SIZE];
        write_address(&p, &mut out, 0x1234_5678);
        assert_eq!(read_address(&p, &out), 0x1234_5678);
    }

    #[test]
    fn test_idl_enum() {
        let p = little();
        assert_eq!(Mode::Auto.ordinal(), 2);
        let mut out = [0u8; 4];
        write_enum(&p, &mut out, Mode::On).unwrap();
        assert_eq!(out, [1, 0, 0, 0]);
        assert_eq!(read_enum::<Mode>(&p, &out).unwrap(), Mode::On);

        7i32.write_native(&p, &mut out).unwrap();
        assert!(matches!(
            read_enum::<Mode>(&p, &out),
            Err(CodecError::InvalidEnum { ordinal: 7, variant_count: 3, .. })
        ));
    }
}
