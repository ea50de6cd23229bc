//! Read-only well-formedness checks.
//!
//! These run the same decoders as the recoders, so a sequence accepted here
//! recodes without a single policy invocation.

use std::ops::Range;

use crate::decode::Decoded;
use crate::unit::CodeUnit;

/// Locate the first ill-formed unit of `input`.
///
/// Returns the half-open unit range of that span, or `len..len` when the
/// whole input is well-formed.
///
/// ```
/// use utf_recode::scan::first_ill_formed;
///
/// assert_eq!(first_ill_formed(b"ok"), 2..2);
/// assert_eq!(first_ill_formed(&[b'a', 0xE0, b'b']), 1..2);
/// assert_eq!(first_ill_formed(&[0x41u16, 0xD800]), 1..2);
/// ```
pub fn first_ill_formed<U: CodeUnit>(input: &[U]) -> Range<usize> {
    ill_formed_spans(input)
        .next()
        .unwrap_or(input.len()..input.len())
}

/// Whether `input` contains no ill-formed unit
pub fn is_well_formed<U: CodeUnit>(input: &[U]) -> bool {
    ill_formed_spans(input).next().is_none()
}

/// Iterate over every ill-formed span of `input`, in order
pub fn ill_formed_spans<U: CodeUnit>(input: &[U]) -> IllFormedSpans<'_, U> {
    IllFormedSpans { input, pos: 0 }
}

/// Iterator returned by [`ill_formed_spans`]
#[derive(Debug, Clone)]
pub struct IllFormedSpans<'a, U> {
    input: &'a [U],
    pos: usize,
}

impl<U: CodeUnit> Iterator for IllFormedSpans<'_, U> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(step) = U::decode(&self.input[self.pos..]) {
            let start = self.pos;
            self.pos += step.consumed();
            if let Decoded::IllFormed(len) = step {
                return Some(start..start + len);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_inputs() {
        assert!(is_well_formed("$€𐐷𤭢".as_bytes()));
        assert!(is_well_formed(&[0xD801u16, 0xDC37]));
        assert!(is_well_formed(&[0x10FFFFu32]));
        assert!(is_well_formed::<u8>(&[]));
        assert_eq!(first_ill_formed::<u16>(&[]), 0..0);
    }

    #[test]
    fn test_minimal_span_before_lead_byte() {
        assert_eq!(first_ill_formed(&[b'a', 0xE0, b'b']), 1..2);
        assert_eq!(first_ill_formed(&[0xE2u8, 0x82, 0xE2, 0x82, 0xAC]), 0..2);
    }

    #[test]
    fn test_surrogates() {
        assert_eq!(first_ill_formed(&[0x41u32, 0xD800]), 1..2);
        assert_eq!(first_ill_formed(&[0xD800u16]), 0..1);
        assert_eq!(first_ill_formed(&[0x41u16, 0xDC00, 0xD800]), 1..2);
        assert_eq!(first_ill_formed(&[0xEDu8, 0xA0, 0x80]), 0..3);
    }

    #[test]
    fn test_all_spans() {
        let spans: Vec<_> = ill_formed_spans(&[0xFFu8, b'x', 0xF0, 0x9F, b'y', 0xC0]).collect();
        assert_eq!(spans, [0..1, 2..4, 5..6]);
    }
}
