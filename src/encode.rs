//! Codepoint encoders for UTF-8, UTF-16 and UTF-32.
//!
//! The encoders accept any `u32`. Values outside the scalar value domain,
//! including the [`ILL_FORMED`](crate::decode::ILL_FORMED) sentinel produced
//! by the decoders, are rejected without output; [`encode_or_substitute`]
//! turns that rejection into one error policy invocation against the
//! destination encoding.

use crate::policy::{Abort, ErrorPolicy};
use crate::unit::CodeUnit;

/// Append the UTF-8 form of `cp`.
///
/// Returns `false` and leaves `out` untouched when `cp` is a surrogate or
/// above U+10FFFF.
pub fn encode_utf8(cp: u32, out: &mut Vec<u8>) -> bool {
    match cp {
        0..=0x7F => out.push(cp as u8),
        0x80..=0x7FF => out.extend_from_slice(&[0xC0 | (cp >> 6) as u8, 0x80 | (cp & 0x3F) as u8]),
        0xD800..=0xDFFF => return false,
        0x800..=0xFFFF => out.extend_from_slice(&[
            0xE0 | (cp >> 12) as u8,
            0x80 | ((cp >> 6) & 0x3F) as u8,
            0x80 | (cp & 0x3F) as u8,
        ]),
        0x1_0000..=0x10_FFFF => out.extend_from_slice(&[
            0xF0 | (cp >> 18) as u8,
            0x80 | ((cp >> 12) & 0x3F) as u8,
            0x80 | ((cp >> 6) & 0x3F) as u8,
            0x80 | (cp & 0x3F) as u8,
        ]),
        _ => return false,
    }
    true
}

/// Append the UTF-16 form of `cp`, as a surrogate pair above U+FFFF.
pub fn encode_utf16(cp: u32, out: &mut Vec<u16>) -> bool {
    match cp {
        0..=0xD7FF | 0xE000..=0xFFFF => out.push(cp as u16),
        0x1_0000..=0x10_FFFF => {
            out.push((0xD7C0 + (cp >> 10)) as u16);
            out.push((0xDC00 + (cp & 0x3FF)) as u16);
        }
        _ => return false,
    }
    true
}

/// Append `cp` unchanged if it is a scalar value.
pub fn encode_utf32(cp: u32, out: &mut Vec<u32>) -> bool {
    if char::from_u32(cp).is_none() {
        return false;
    }
    out.push(cp);
    true
}

/// Encode `cp`, or append the policy's replacement when it cannot be encoded.
pub fn encode_or_substitute<T, P>(cp: u32, out: &mut Vec<T>, policy: &P) -> Result<(), Abort>
where
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    if T::encode(cp, out) {
        return Ok(());
    }
    let replacement = policy.replacement()?;
    out.extend_from_slice(&replacement);
    Ok(())
}
