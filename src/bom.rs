//! Byte order mark detection and emission
//!
//! A byte order mark is U+FEFF serialized at the very start of a file. It
//! names the UTF form of the data and, for UTF-16 and UTF-32, its byte
//! order.

use serde::Serialize;

use crate::Encoding;
use crate::unit::ByteOrder;

const UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE: &[u8] = &[0xFF, 0xFE];
const UTF16_BE: &[u8] = &[0xFE, 0xFF];
const UTF32_LE: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const UTF32_BE: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// A byte order mark found at the start of some data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Bom {
    /// Encoding the mark announces
    pub encoding: Encoding,
    /// Byte order the mark announces; `None` for UTF-8
    pub byte_order: Option<ByteOrder>,
    /// Length of the mark in bytes
    pub len: usize,
}

impl Bom {
    /// The serialized mark
    pub fn bytes(&self) -> &'static [u8] {
        bom_for(self.encoding, self.byte_order.unwrap_or_default()).unwrap_or_default()
    }
}

/// Detect a byte order mark at the start of `data`.
///
/// `FF FE 00 00` is read as the UTF-32 little endian mark, although it is
/// also a UTF-16 little endian mark followed by U+0000.
///
/// ```
/// use utf_recode::bom::detect_bom;
/// use utf_recode::{ByteOrder, Encoding};
///
/// let bom = detect_bom(&[0xFE, 0xFF, 0x00, 0x41]).unwrap();
/// assert_eq!(bom.encoding, Encoding::Utf16);
/// assert_eq!(bom.byte_order, Some(ByteOrder::Big));
/// assert_eq!(bom.len, 2);
/// assert!(detect_bom(b"plain").is_none());
/// ```
pub fn detect_bom(data: &[u8]) -> Option<Bom> {
    let (encoding, byte_order, len) = if data.starts_with(UTF8) {
        (Encoding::Utf8, None, UTF8.len())
    } else if data.starts_with(UTF32_LE) {
        (Encoding::Utf32, Some(ByteOrder::Little), UTF32_LE.len())
    } else if data.starts_with(UTF32_BE) {
        (Encoding::Utf32, Some(ByteOrder::Big), UTF32_BE.len())
    } else if data.starts_with(UTF16_LE) {
        (Encoding::Utf16, Some(ByteOrder::Little), UTF16_LE.len())
    } else if data.starts_with(UTF16_BE) {
        (Encoding::Utf16, Some(ByteOrder::Big), UTF16_BE.len())
    } else {
        return None;
    };

    Some(Bom {
        encoding,
        byte_order,
        len,
    })
}

/// The byte order mark of `encoding` serialized in `order`.
///
/// `order` is ignored for UTF-8. Narrow encodings have no mark.
pub fn bom_for(encoding: Encoding, order: ByteOrder) -> Option<&'static [u8]> {
    match (encoding.resolve(), order) {
        (Encoding::Utf8, _) => Some(UTF8),
        (Encoding::Utf16, ByteOrder::Little) => Some(UTF16_LE),
        (Encoding::Utf16, ByteOrder::Big) => Some(UTF16_BE),
        (Encoding::Utf32, ByteOrder::Little) => Some(UTF32_LE),
        (Encoding::Utf32, ByteOrder::Big) => Some(UTF32_BE),
        _ => None,
    }
}

/// Split a leading byte order mark off `data`
pub fn strip_bom(data: &[u8]) -> (Option<Bom>, &[u8]) {
    match detect_bom(data) {
        Some(bom) => (Some(bom), &data[bom.len..]),
        None => (None, data),
    }
}
