//! Code unit types for the fixed-width UTF encodings.
//!
//! Each UTF form is bound to the unsigned integer type that stores one of its
//! code units: `u8` for UTF-8, `u16` for UTF-16 and `u32` for UTF-32. The
//! [`CodeUnit`] trait carries the per-encoding decoder, encoder and
//! serialization so the recoders can be written once and monomorphized for
//! every encoding pair.

use serde::{Deserialize, Serialize};

use crate::decode::{self, Decoded};
use crate::encode;
use crate::{Encoding, Error, Result};

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// Byte order used when UTF-16 and UTF-32 code units are serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Byte order of the host platform
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

/// A storage unit of one of the UTF encodings.
///
/// This trait is sealed; it is implemented for `u8`, `u16` and `u32` only.
pub trait CodeUnit:
    sealed::Sealed + Copy + Eq + Default + std::fmt::Debug + Send + Sync + 'static
{
    /// Encoding whose code units this type stores
    const ENCODING: Encoding;

    /// Width of one unit in bytes
    const WIDTH: usize;

    /// U+FFFD REPLACEMENT CHARACTER encoded in this encoding
    const REPLACEMENT: &'static [Self];

    /// Build a unit from its integer value, truncating to the unit width
    fn from_u32(value: u32) -> Self;

    /// Integer value of the unit
    fn to_u32(self) -> u32;

    /// Decode the codepoint at the start of `input`.
    ///
    /// Returns `None` only when `input` is empty.
    fn decode(input: &[Self]) -> Option<Decoded>;

    /// Append the encoding of `cp`, returning `false` without writing
    /// anything when `cp` is not a Unicode scalar value.
    fn encode(cp: u32, out: &mut Vec<Self>) -> bool;

    /// Append the encoding of a scalar value.
    fn encode_char(c: char, out: &mut Vec<Self>) {
        // every `char` is a scalar value, so this cannot fail
        let _ = Self::encode(u32::from(c), out);
    }

    /// Length of the trailing span whose decoding may still change once
    /// more input arrives, e.g. a truncated multi-unit sequence.
    fn incomplete_tail(input: &[Self]) -> usize;

    /// Read one unit from exactly [`Self::WIDTH`] bytes
    fn read(bytes: &[u8], order: ByteOrder) -> Self;

    /// Append the serialized unit to `out`
    fn write(self, order: ByteOrder, out: &mut Vec<u8>);
}

impl CodeUnit for u8 {
    const ENCODING: Encoding = Encoding::Utf8;
    const WIDTH: usize = 1;
    const REPLACEMENT: &'static [Self] = &[0xEF, 0xBF, 0xBD];

    #[inline]
    fn from_u32(value: u32) -> Self {
        value as u8
    }

    #[inline]
    fn to_u32(self) -> u32 {
        u32::from(self)
    }

    #[inline]
    fn decode(input: &[Self]) -> Option<Decoded> {
        decode::decode_utf8(input)
    }

    #[inline]
    fn encode(cp: u32, out: &mut Vec<Self>) -> bool {
        encode::encode_utf8(cp, out)
    }

    fn incomplete_tail(input: &[Self]) -> usize {
        let len = input.len();
        for k in 1..=len.min(3) {
            let start = len - k;
            match decode::utf8_sequence_len(input[start]) {
                // continuation byte or invalid lead, keep walking back
                0 => continue,
                expected if expected > k => {
                    return match decode::decode_utf8(&input[start..]) {
                        Some(Decoded::IllFormed(n)) if n == k => k,
                        _ => 0,
                    };
                }
                _ => return 0,
            }
        }
        0
    }

    #[inline]
    fn read(bytes: &[u8], _order: ByteOrder) -> Self {
        bytes[0]
    }

    #[inline]
    fn write(self, _order: ByteOrder, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl CodeUnit for u16 {
    const ENCODING: Encoding = Encoding::Utf16;
    const WIDTH: usize = 2;
    const REPLACEMENT: &'static [Self] = &[0xFFFD];

    #[inline]
    fn from_u32(value: u32) -> Self {
        value as u16
    }

    #[inline]
    fn to_u32(self) -> u32 {
        u32::from(self)
    }

    #[inline]
    fn decode(input: &[Self]) -> Option<Decoded> {
        decode::decode_utf16(input)
    }

    #[inline]
    fn encode(cp: u32, out: &mut Vec<Self>) -> bool {
        encode::encode_utf16(cp, out)
    }

    fn incomplete_tail(input: &[Self]) -> usize {
        match input.last() {
            Some(0xD800..=0xDBFF) => 1,
            _ => 0,
        }
    }

    #[inline]
    fn read(bytes: &[u8], order: ByteOrder) -> Self {
        let raw = [bytes[0], bytes[1]];
        match order {
            ByteOrder::Little => u16::from_le_bytes(raw),
            ByteOrder::Big => u16::from_be_bytes(raw),
        }
    }

    #[inline]
    fn write(self, order: ByteOrder, out: &mut Vec<u8>) {
        match order {
            ByteOrder::Little => out.extend_from_slice(&self.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
        }
    }
}

impl CodeUnit for u32 {
    const ENCODING: Encoding = Encoding::Utf32;
    const WIDTH: usize = 4;
    const REPLACEMENT: &'static [Self] = &[0xFFFD];

    #[inline]
    fn from_u32(value: u32) -> Self {
        value
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self
    }

    #[inline]
    fn decode(input: &[Self]) -> Option<Decoded> {
        decode::decode_utf32(input)
    }

    #[inline]
    fn encode(cp: u32, out: &mut Vec<Self>) -> bool {
        encode::encode_utf32(cp, out)
    }

    fn incomplete_tail(_input: &[Self]) -> usize {
        0
    }

    #[inline]
    fn read(bytes: &[u8], order: ByteOrder) -> Self {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match order {
            ByteOrder::Little => u32::from_le_bytes(raw),
            ByteOrder::Big => u32::from_be_bytes(raw),
        }
    }

    #[inline]
    fn write(self, order: ByteOrder, out: &mut Vec<u8>) {
        match order {
            ByteOrder::Little => out.extend_from_slice(&self.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
        }
    }
}

/// Split serialized bytes into code units of type `U`.
///
/// Fails with [`Error::InvalidInput`] when the byte count is not a multiple
/// of the unit width.
pub fn units_from_bytes<U: CodeUnit>(bytes: &[u8], order: ByteOrder) -> Result<Vec<U>> {
    if bytes.len() % U::WIDTH != 0 {
        return Err(Error::InvalidInput(format!(
            "{} data must be a multiple of {} bytes, got {}",
            U::ENCODING,
            U::WIDTH,
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(U::WIDTH)
        .map(|chunk| U::read(chunk, order))
        .collect())
}

/// Serialize code units into bytes
pub fn units_to_bytes<U: CodeUnit>(units: &[U], order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len() * U::WIDTH);
    for &unit in units {
        unit.write(order, &mut out);
    }
    out
}
