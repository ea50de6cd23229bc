//! Codepoint decoders for UTF-8, UTF-16 and UTF-32.
//!
//! Every decoder consumes code units from the front of a slice and yields
//! either one scalar value or an ill-formed span. The span always covers at
//! least one unit so a caller looping over the input makes progress.
//!
//! ## UTF-8 byte ranges
//!
//! The UTF-8 decoder follows the well-formed byte sequence table of the
//! Unicode Standard (Table 3-7) exactly:
//!
//! | Lead byte     | 2nd byte  | 3rd byte  | 4th byte  |
//! |---------------|-----------|-----------|-----------|
//! | `00..7F`      |           |           |           |
//! | `C2..DF`      | `80..BF`  |           |           |
//! | `E0`          | `A0..BF`  | `80..BF`  |           |
//! | `E1..EC`      | `80..BF`  | `80..BF`  |           |
//! | `ED`          | `80..9F`  | `80..BF`  |           |
//! | `EE..EF`      | `80..BF`  | `80..BF`  |           |
//! | `F0`          | `90..BF`  | `80..BF`  | `80..BF`  |
//! | `F1..F3`      | `80..BF`  | `80..BF`  | `80..BF`  |
//! | `F4`          | `80..8F`  | `80..BF`  | `80..BF`  |
//!
//! Restricting the second byte rejects overlong forms (`E0`, `F0`), encoded
//! surrogates (`ED`) and values above U+10FFFF (`F4`) without decoding first.
//!
//! When a sequence is rejected, its ill-formed span is the lead byte plus
//! every following byte in `80..BF`, up to the length the lead announces.
//! An encoded surrogate such as `ED A0 80` is therefore one ill-formed unit.
//! A byte outside `80..BF` is never part of the span; it is examined again as
//! the start of the next sequence. Bytes that cannot lead a sequence (`80..C1`
//! and `F5..FF`) are ill-formed spans of one byte.

/// Out-of-range value that stands for "ill-formed input" inside a
/// decode-then-encode pipeline. It is one past the largest scalar value, so
/// no well-formed input can produce it and every encoder rejects it.
pub const ILL_FORMED: u32 = 0x11_0000;

/// Outcome of decoding the sequence at the front of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A scalar value and the number of code units it occupied
    Scalar(char, usize),
    /// An ill-formed span of this many code units (never zero)
    IllFormed(usize),
}

impl Decoded {
    /// Number of code units consumed
    #[inline]
    pub fn consumed(self) -> usize {
        match self {
            Decoded::Scalar(_, n) | Decoded::IllFormed(n) => n,
        }
    }

    /// The decoded codepoint, or [`ILL_FORMED`] for an ill-formed span
    #[inline]
    pub fn code_point(self) -> u32 {
        match self {
            Decoded::Scalar(c, _) => u32::from(c),
            Decoded::IllFormed(_) => ILL_FORMED,
        }
    }

    /// Whether this is an ill-formed span
    #[inline]
    pub fn is_ill_formed(self) -> bool {
        matches!(self, Decoded::IllFormed(_))
    }
}

/// Total length of the sequence introduced by `lead`, or 0 when `lead`
/// cannot start a well-formed sequence.
#[inline]
pub(crate) fn utf8_sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Decode one UTF-8 sequence from the front of `input`.
///
/// # Examples
///
/// ```
/// use utf_recode::decode::{Decoded, decode_utf8};
///
/// assert_eq!(decode_utf8("€".as_bytes()), Some(Decoded::Scalar('€', 3)));
/// // an overlong form is rejected as a single unit
/// assert_eq!(decode_utf8(&[0xE0, 0x80, 0x80]), Some(Decoded::IllFormed(3)));
/// // `A` cannot continue the sequence, so only the lead byte is consumed
/// assert_eq!(decode_utf8(&[0xE0, b'A']), Some(Decoded::IllFormed(1)));
/// assert_eq!(decode_utf8(b""), None);
/// ```
pub fn decode_utf8(input: &[u8]) -> Option<Decoded> {
    let &lead = input.first()?;

    // (sequence length, allowed range of the second byte)
    let (len, lo, hi) = match lead {
        0x00..=0x7F => return Some(Decoded::Scalar(char::from(lead), 1)),
        0xC2..=0xDF => (2, 0x80, 0xBF),
        0xE0 => (3, 0xA0, 0xBF),
        0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80, 0xBF),
        0xED => (3, 0x80, 0x9F),
        0xF0 => (4, 0x90, 0xBF),
        0xF1..=0xF3 => (4, 0x80, 0xBF),
        0xF4 => (4, 0x80, 0x8F),
        _ => return Some(Decoded::IllFormed(1)),
    };

    let mut cp = u32::from(lead) & (0x7F >> len);
    for i in 1..len {
        let (lo, hi) = if i == 1 { (lo, hi) } else { (0x80, 0xBF) };
        match input.get(i) {
            Some(&b) if (lo..=hi).contains(&b) => cp = (cp << 6) | u32::from(b & 0x3F),
            _ => return Some(Decoded::IllFormed(i + continuation_run(&input[i..], len - i))),
        }
    }

    Some(match char::from_u32(cp) {
        Some(c) => Decoded::Scalar(c, len),
        None => Decoded::IllFormed(len),
    })
}

/// Number of leading `80..BF` bytes in `input`, at most `max`
#[inline]
fn continuation_run(input: &[u8], max: usize) -> usize {
    input
        .iter()
        .take(max)
        .take_while(|&&b| (0x80..=0xBF).contains(&b))
        .count()
}

/// Decode one UTF-16 character from the front of `input`.
///
/// A high surrogate followed by a low surrogate yields one supplementary
/// scalar value; any other surrogate is an ill-formed span of one unit.
pub fn decode_utf16(input: &[u16]) -> Option<Decoded> {
    let &unit = input.first()?;

    Some(match unit {
        0xD800..=0xDBFF => match input.get(1) {
            Some(&low) if (0xDC00..=0xDFFF).contains(&low) => {
                let cp = (u32::from(unit) << 10) + u32::from(low) - 0x35F_DC00;
                char::from_u32(cp).map_or(Decoded::IllFormed(1), |c| Decoded::Scalar(c, 2))
            }
            _ => Decoded::IllFormed(1),
        },
        0xDC00..=0xDFFF => Decoded::IllFormed(1),
        _ => char::from_u32(u32::from(unit))
            .map_or(Decoded::IllFormed(1), |c| Decoded::Scalar(c, 1)),
    })
}

/// Decode one UTF-32 unit. Surrogates and values above U+10FFFF are
/// ill-formed.
pub fn decode_utf32(input: &[u32]) -> Option<Decoded> {
    let &unit = input.first()?;
    Some(char::from_u32(unit).map_or(Decoded::IllFormed(1), |c| Decoded::Scalar(c, 1)))
}
