//! # utf-recode - Unicode Transformation Format Conversion
//!
//! Conformant conversion between UTF-8, UTF-16, UTF-32, the platform wide
//! encoding and caller-supplied narrow encodings.
//!
//! ## Features
//!
//! - **Strict decoding** of every ill-formed sequence the Unicode Standard
//!   defines: overlong forms, encoded or unpaired surrogates, values past
//!   U+10FFFF, truncated sequences
//! - **Error policies** deciding what replaces ill-formed input, including
//!   aborting the conversion
//! - **Streaming** recoding of chunked input
//! - **Narrow encodings** through an external transcoding [`Facet`]
//! - **Validation** without producing output
//!
//! ## Quick Start
//!
//! ```rust
//! use utf_recode::{Encoding, Translator, to_utf8_string, to_utf16_string};
//!
//! let utf16 = to_utf16_string("$€𐐷".as_bytes());
//! assert_eq!(utf16, [0x24, 0x20AC, 0xD801, 0xDC37]);
//!
//! // ill-formed input is replaced with U+FFFD by default
//! assert_eq!(to_utf8_string(&[0x61u16, 0xD800, 0x62]), "a\u{FFFD}b");
//!
//! // serialized data with a runtime choice of encodings
//! let translator = Translator::new(Encoding::Utf8, Encoding::Utf32).unwrap();
//! let utf32 = translator.convert("€".as_bytes()).unwrap();
//! assert_eq!(utf32.len(), 4);
//! ```

#![deny(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod bom;
pub mod decode;
pub mod encode;
pub mod narrow;
pub mod policy;
pub mod recode;
pub mod scan;
pub mod unit;

pub use narrow::{Facet, FacetFailure, FacetOutcome, FacetStatus};
pub use policy::{ErrorPolicy, Policy};
pub use recode::{StreamRecoder, recode};
pub use scan::{first_ill_formed, is_well_formed};
pub use unit::{ByteOrder, CodeUnit};

use narrow::{decode_narrow, encode_narrow, recode_narrow};
use policy::{Replace, Substitute};
use unit::{units_from_bytes, units_to_bytes};

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during conversion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The error policy aborted on ill-formed or unrepresentable input
    #[error("ill-formed {encoding} input at unit offset {offset}")]
    IllFormed {
        /// Encoding of the input being read
        encoding: Encoding,
        /// Code unit offset of the offending unit in that input
        offset: usize,
    },
    /// The transcoding facet failed irrecoverably
    #[error(transparent)]
    Facet(#[from] FacetFailure),
    /// Unsupported conversion between encodings
    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedConversion {
        /// Source encoding
        from: Encoding,
        /// Target encoding
        to: Encoding,
    },
    /// Invalid input data
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Encodings known to the conversion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// UTF-8 (variable length, 1-4 bytes)
    Utf8,
    /// UTF-16 (one or two 16-bit units)
    Utf16,
    /// UTF-32 (one 32-bit unit)
    Utf32,
    /// A byte encoding defined by a [`Facet`]
    Narrow,
    /// The platform wide encoding, see [`WIDE_ENCODING`]
    Wide,
}

impl Encoding {
    /// Get the canonical name of this encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16 => "UTF-16",
            Encoding::Utf32 => "UTF-32",
            Encoding::Narrow => "narrow",
            Encoding::Wide => "wide",
        }
    }

    /// Bytes per code unit, or `None` for narrow encodings, whose width is
    /// up to the facet.
    pub fn unit_width(self) -> Option<usize> {
        match self.resolve() {
            Encoding::Utf8 => Some(1),
            Encoding::Utf16 => Some(2),
            Encoding::Utf32 => Some(4),
            Encoding::Narrow | Encoding::Wide => None,
        }
    }

    /// Replace [`Encoding::Wide`] with the UTF form it stands for on this
    /// platform.
    pub fn resolve(self) -> Encoding {
        match self {
            Encoding::Wide => WIDE_ENCODING,
            other => other,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Code unit of the platform wide encoding
#[cfg(windows)]
pub type WideChar = u16;

/// Code unit of the platform wide encoding
#[cfg(not(windows))]
pub type WideChar = u32;

/// The UTF form [`Encoding::Wide`] resolves to on this platform
pub const WIDE_ENCODING: Encoding = <WideChar as CodeUnit>::ENCODING;

fn recode_to_vec<S, T, P>(input: &[S], policy: &P) -> Result<Vec<T>>
where
    S: CodeUnit,
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    let mut out = Vec::with_capacity(input.len());
    recode(input, &mut out, policy)?;
    Ok(out)
}

/// Recode to UTF-8, replacing ill-formed input with U+FFFD
pub fn to_utf8_string<S: CodeUnit>(input: &[S]) -> String {
    // the recoder only writes well-formed UTF-8
    String::from_utf8(recode_to_vec(input, &Replace).unwrap_or_default()).unwrap_or_default()
}

/// Recode to UTF-16, replacing ill-formed input with U+FFFD
pub fn to_utf16_string<S: CodeUnit>(input: &[S]) -> Vec<u16> {
    recode_to_vec(input, &Replace).unwrap_or_default()
}

/// Recode to UTF-32, replacing ill-formed input with U+FFFD
pub fn to_utf32_string<S: CodeUnit>(input: &[S]) -> Vec<u32> {
    recode_to_vec(input, &Replace).unwrap_or_default()
}

/// Recode to the platform wide encoding, replacing ill-formed input with
/// U+FFFD
pub fn to_wide_string<S: CodeUnit>(input: &[S]) -> Vec<WideChar> {
    recode_to_vec(input, &Replace).unwrap_or_default()
}

/// Recode to UTF-8 under `policy`
pub fn to_utf8_with<S, P>(input: &[S], policy: &P) -> Result<Vec<u8>>
where
    S: CodeUnit,
    P: ErrorPolicy<u8> + ?Sized,
{
    recode_to_vec(input, policy)
}

/// Recode to UTF-16 under `policy`
pub fn to_utf16_with<S, P>(input: &[S], policy: &P) -> Result<Vec<u16>>
where
    S: CodeUnit,
    P: ErrorPolicy<u16> + ?Sized,
{
    recode_to_vec(input, policy)
}

/// Recode to UTF-32 under `policy`
pub fn to_utf32_with<S, P>(input: &[S], policy: &P) -> Result<Vec<u32>>
where
    S: CodeUnit,
    P: ErrorPolicy<u32> + ?Sized,
{
    recode_to_vec(input, policy)
}

/// Recode to the platform wide encoding under `policy`
pub fn to_wide_with<S, P>(input: &[S], policy: &P) -> Result<Vec<WideChar>>
where
    S: CodeUnit,
    P: ErrorPolicy<WideChar> + ?Sized,
{
    recode_to_vec(input, policy)
}

/// Encode into the narrow encoding of `facet`, writing the facet's own
/// [replacement](Facet::replacement) for ill-formed input and for characters
/// it cannot represent.
///
/// ```
/// use utf_recode::narrow::Latin1;
/// use utf_recode::to_narrow_string;
///
/// assert_eq!(to_narrow_string("né €5".as_bytes(), &Latin1).unwrap(), b"n\xE9 ?5");
/// ```
pub fn to_narrow_string<S, C>(input: &[S], facet: &C) -> Result<Vec<u8>>
where
    S: CodeUnit,
    C: Facet + ?Sized,
{
    let policy = Substitute::new(facet.replacement().to_vec());
    let mut out = Vec::with_capacity(input.len());
    encode_narrow(facet, input, &mut out, &policy)?;
    Ok(out)
}

/// Decode the narrow encoding of `facet` into `T`'s UTF form, replacing
/// rejected bytes with U+FFFD.
pub fn from_narrow<T, C>(input: &[u8], facet: &C) -> Result<Vec<T>>
where
    T: CodeUnit,
    C: Facet + ?Sized,
{
    let mut out = Vec::with_capacity(input.len());
    decode_narrow(facet, input, &mut out, &Replace)?;
    Ok(out)
}

/// Converter over serialized bytes, for encodings chosen at runtime.
///
/// UTF-16 and UTF-32 data is read and written in the configured byte order.
/// A narrow side needs a [`Facet`], supplied per call to
/// [`convert_with`](Translator::convert_with) or
/// [`convert_between`](Translator::convert_between).
///
/// ```
/// use utf_recode::narrow::Latin1;
/// use utf_recode::{ByteOrder, Encoding, Translator};
///
/// let translator = Translator::new(Encoding::Narrow, Encoding::Utf16)
///     .unwrap()
///     .with_byte_order(ByteOrder::Big, ByteOrder::Big);
/// assert_eq!(translator.convert_with(b"\xE9", &Latin1).unwrap(), [0x00, 0xE9]);
/// assert!(translator.convert(b"\xE9").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translator {
    from: Encoding,
    to: Encoding,
    from_order: ByteOrder,
    to_order: ByteOrder,
    policy: Policy,
}

impl Translator {
    /// Create a new translator between two encodings
    pub fn new(from: Encoding, to: Encoding) -> Result<Self> {
        debug!(%from, %to, "created translator");
        Ok(Self {
            from,
            to,
            from_order: ByteOrder::default(),
            to_order: ByteOrder::default(),
            policy: Policy::default(),
        })
    }

    /// Set the byte order of UTF-16 and UTF-32 data on each side
    pub fn with_byte_order(mut self, from: ByteOrder, to: ByteOrder) -> Self {
        self.from_order = from;
        self.to_order = to;
        self
    }

    /// Set the policy applied to ill-formed input
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Get source encoding
    pub fn from_encoding(&self) -> Encoding {
        self.from
    }

    /// Get target encoding
    pub fn to_encoding(&self) -> Encoding {
        self.to
    }

    /// Get the error policy
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Convert data between two UTF encodings.
    ///
    /// Fails with [`Error::UnsupportedConversion`] when either side is
    /// narrow.
    pub fn convert(&self, input: &[u8]) -> Result<Vec<u8>> {
        match self.from.resolve() {
            Encoding::Utf8 => self.convert_units::<u8>(input),
            Encoding::Utf16 => self.convert_units::<u16>(input),
            Encoding::Utf32 => self.convert_units::<u32>(input),
            Encoding::Narrow | Encoding::Wide => Err(self.unsupported()),
        }
    }

    /// Convert data, using `facet` for whichever side is narrow
    pub fn convert_with<C: Facet + ?Sized>(&self, input: &[u8], facet: &C) -> Result<Vec<u8>> {
        self.convert_between(input, facet, facet)
    }

    /// Convert data, decoding a narrow source with `from` and encoding a
    /// narrow target with `to`. Facets for UTF sides are not used.
    ///
    /// For a narrow target, [`Policy::Replace`] writes the facet's own
    /// [replacement](Facet::replacement).
    pub fn convert_between<A, B>(&self, input: &[u8], from: &A, to: &B) -> Result<Vec<u8>>
    where
        A: Facet + ?Sized,
        B: Facet + ?Sized,
    {
        match (self.from.resolve(), self.to.resolve()) {
            (Encoding::Narrow, Encoding::Narrow) => {
                let mut out = Vec::with_capacity(input.len());
                recode_narrow(from, to, input, &mut out, &self.policy.encoded_narrow(to)?)?;
                Ok(out)
            }
            (Encoding::Narrow, Encoding::Utf8) => self.decode_from::<u8, _>(input, from),
            (Encoding::Narrow, Encoding::Utf16) => self.decode_from::<u16, _>(input, from),
            (Encoding::Narrow, Encoding::Utf32) => self.decode_from::<u32, _>(input, from),
            (Encoding::Utf8, Encoding::Narrow) => self.encode_into::<u8, _>(input, to),
            (Encoding::Utf16, Encoding::Narrow) => self.encode_into::<u16, _>(input, to),
            (Encoding::Utf32, Encoding::Narrow) => self.encode_into::<u32, _>(input, to),
            _ => self.convert(input),
        }
    }

    fn convert_units<F: CodeUnit>(&self, input: &[u8]) -> Result<Vec<u8>> {
        let units = units_from_bytes::<F>(input, self.from_order)?;
        match self.to.resolve() {
            Encoding::Utf8 => self.emit::<F, u8>(&units),
            Encoding::Utf16 => self.emit::<F, u16>(&units),
            Encoding::Utf32 => self.emit::<F, u32>(&units),
            Encoding::Narrow | Encoding::Wide => Err(self.unsupported()),
        }
    }

    fn emit<F: CodeUnit, T: CodeUnit>(&self, units: &[F]) -> Result<Vec<u8>> {
        let out: Vec<T> = recode_to_vec(units, &self.policy.encoded::<T>())?;
        Ok(units_to_bytes(&out, self.to_order))
    }

    fn decode_from<T, C>(&self, input: &[u8], facet: &C) -> Result<Vec<u8>>
    where
        T: CodeUnit,
        C: Facet + ?Sized,
    {
        let mut units: Vec<T> = Vec::with_capacity(input.len());
        decode_narrow(facet, input, &mut units, &self.policy.encoded::<T>())?;
        Ok(units_to_bytes(&units, self.to_order))
    }

    fn encode_into<S, C>(&self, input: &[u8], facet: &C) -> Result<Vec<u8>>
    where
        S: CodeUnit,
        C: Facet + ?Sized,
    {
        let units = units_from_bytes::<S>(input, self.from_order)?;
        let mut out = Vec::with_capacity(units.len());
        encode_narrow(facet, &units, &mut out, &self.policy.encoded_narrow(facet)?)?;
        Ok(out)
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedConversion {
            from: self.from,
            to: self.to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_to_utf16_le() {
        let translator = Translator::new(Encoding::Utf8, Encoding::Utf16)
            .unwrap()
            .with_byte_order(ByteOrder::Little, ByteOrder::Little);

        let input = "Hello, 世界!";
        let output = translator.convert(input.as_bytes()).unwrap();
        assert_eq!(&output[..4], &[0x48, 0x00, 0x65, 0x00]);

        // Test reverse conversion
        let reverse = Translator::new(Encoding::Utf16, Encoding::Utf8)
            .unwrap()
            .with_byte_order(ByteOrder::Little, ByteOrder::Little);
        let roundtrip = reverse.convert(&output).unwrap();
        assert_eq!(input.as_bytes(), &roundtrip[..]);
    }

    #[test]
    fn test_utf16_endianness_conversion() {
        let le_to_be = Translator::new(Encoding::Utf16, Encoding::Utf16)
            .unwrap()
            .with_byte_order(ByteOrder::Little, ByteOrder::Big);

        // "Hi" in UTF-16LE (0x0048, 0x0069)
        let le_input = &[0x48, 0x00, 0x69, 0x00];
        let be_output = le_to_be.convert(le_input).unwrap();
        assert_eq!(be_output, [0x00, 0x48, 0x00, 0x69]);

        let be_to_le = Translator::new(Encoding::Utf16, Encoding::Utf16)
            .unwrap()
            .with_byte_order(ByteOrder::Big, ByteOrder::Little);
        let roundtrip = be_to_le.convert(&be_output).unwrap();
        assert_eq!(le_input, &roundtrip[..]);
    }

    #[test]
    fn test_utf32_to_utf8() {
        let translator = Translator::new(Encoding::Utf32, Encoding::Utf8)
            .unwrap()
            .with_byte_order(ByteOrder::Big, ByteOrder::Big);
        let output = translator
            .convert(&[0x00, 0x00, 0x20, 0xAC, 0x00, 0x01, 0x04, 0x37])
            .unwrap();
        assert_eq!(output, "€𐐷".as_bytes());
    }

    #[test]
    fn test_translator_policies() {
        let input = &[b'a', 0xC0, b'b'];
        let lossy = Translator::new(Encoding::Utf8, Encoding::Utf8).unwrap();
        assert_eq!(lossy.convert(input).unwrap(), "a\u{FFFD}b".as_bytes());

        let strict = lossy.clone().with_policy(Policy::Strict);
        assert_eq!(
            strict.convert(input),
            Err(Error::IllFormed {
                encoding: Encoding::Utf8,
                offset: 1
            })
        );

        let skip = lossy.with_policy(Policy::Skip);
        assert_eq!(skip.convert(input).unwrap(), b"ab");
    }

    #[test]
    fn test_narrow_needs_a_facet() {
        let translator = Translator::new(Encoding::Narrow, Encoding::Utf8).unwrap();
        let err = translator.convert(b"abc").unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedConversion {
                from: Encoding::Narrow,
                to: Encoding::Utf8
            }
        );
        assert_eq!(err.to_string(), "unsupported conversion from narrow to UTF-8");
        assert_eq!(translator.convert_with(b"\xC0", &narrow::Latin1).unwrap(), "À".as_bytes());
    }

    #[test]
    fn test_translator_routes_narrow_sides_through_the_facet() {
        let latin1 = narrow::Latin1;

        let to_utf16 = Translator::new(Encoding::Narrow, Encoding::Utf16)
            .unwrap()
            .with_byte_order(ByteOrder::Big, ByteOrder::Little);
        assert_eq!(to_utf16.convert_with(b"a\xFF", &latin1).unwrap(), [0x61, 0, 0xFF, 0]);

        let to_latin1 = Translator::new(Encoding::Utf32, Encoding::Narrow)
            .unwrap()
            .with_byte_order(ByteOrder::Big, ByteOrder::Big);
        let utf32 = [0, 0, 0, 0x61, 0, 0, 0x20, 0xAC, 0, 0, 0, 0xE9];
        assert_eq!(to_latin1.convert_with(&utf32, &latin1).unwrap(), b"a?\xE9");

        // substitution text is encoded through the facet
        let text = to_latin1.clone().with_policy(Policy::Substitute("¤".to_string()));
        assert_eq!(text.convert_with(&utf32, &latin1).unwrap(), b"a\xA4\xE9");

        let strict = to_latin1.with_policy(Policy::Strict);
        assert_eq!(
            strict.convert_with(&utf32, &latin1),
            Err(Error::IllFormed {
                encoding: Encoding::Utf32,
                offset: 1
            })
        );

        let both = Translator::new(Encoding::Narrow, Encoding::Narrow).unwrap();
        assert_eq!(both.convert_with(b"d\xE9j\xE0", &latin1).unwrap(), b"d\xE9j\xE0");

        // UTF sides ignore the facet
        let utf = Translator::new(Encoding::Utf8, Encoding::Utf8).unwrap();
        assert_eq!(utf.convert_with(b"a\xC0", &latin1).unwrap(), "a\u{FFFD}".as_bytes());
    }

    #[test]
    fn test_truncated_utf16_bytes() {
        let translator = Translator::new(Encoding::Utf16, Encoding::Utf8).unwrap();
        assert!(matches!(
            translator.convert(&[0x48, 0x00, 0x69]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wide_encoding() {
        assert_eq!(Encoding::Wide.resolve(), WIDE_ENCODING);
        assert_eq!(
            Encoding::Wide.unit_width(),
            Some(std::mem::size_of::<WideChar>())
        );
        assert_eq!(Encoding::Narrow.unit_width(), None);
        if cfg!(windows) {
            assert_eq!(WIDE_ENCODING, Encoding::Utf16);
        } else {
            assert_eq!(WIDE_ENCODING, Encoding::Utf32);
        }

        let wide = to_wide_string("𐐷".as_bytes());
        assert_eq!(to_utf8_string(&wide), "𐐷");
    }

    #[test]
    fn test_wide_translator() {
        let translator = Translator::new(Encoding::Utf8, Encoding::Wide).unwrap();
        let bytes = translator.convert("ab".as_bytes()).unwrap();
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<WideChar>());
    }

    #[test]
    fn test_convenience_strings() {
        assert_eq!(to_utf8_string(&[0x24u32, 0x20AC, 0xD800]), "$€\u{FFFD}");
        assert_eq!(to_utf32_string("𤭢".as_bytes()), [0x24B62]);
        assert_eq!(to_utf16_string(&[0x10437u32]), [0xD801, 0xDC37]);
        assert_eq!(to_utf8_string::<u8>(&[]), "");
        // ill-formed input is replaced, never dropped
        assert_eq!(to_utf16_string(b"a\xFFb"), [0x61, 0xFFFD, 0x62]);
        assert_eq!(to_utf32_string(&[0xDC00u16, 0x41]), [0xFFFD, 0x41]);
        assert_eq!(to_wide_string(&[0x11_0000u32]), [0xFFFD]);
    }

    #[test]
    fn test_encoding_names() {
        assert_eq!(Encoding::Utf16.to_string(), "UTF-16");
        assert_eq!(serde_json::to_string(&Encoding::Utf32).unwrap(), r#""utf32""#);
        let parsed: Encoding = serde_json::from_str(r#""wide""#).unwrap();
        assert_eq!(parsed, Encoding::Wide);
    }

    #[test]
    fn test_error_display() {
        let err = Error::IllFormed {
            encoding: Encoding::Utf16,
            offset: 3,
        };
        assert_eq!(err.to_string(), "ill-formed UTF-16 input at unit offset 3");
        let facet: Error = FacetFailure::new("table missing").into();
        assert_eq!(facet.to_string(), "transcoding facet failed: table missing");
    }

    #[test]
    fn test_narrow_convenience() {
        let text: Vec<u16> = from_narrow(b"\xC0 la carte", &narrow::Latin1).unwrap();
        assert_eq!(String::from_utf16(&text).unwrap(), "À la carte");
        assert_eq!(to_narrow_string(&text, &narrow::Latin1).unwrap(), b"\xC0 la carte");
    }
}
