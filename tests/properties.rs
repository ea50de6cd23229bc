use std::cell::Cell;

use proptest::collection::vec;
use proptest::prelude::*;

use utf_recode::policy::{Abort, Replace, from_fn};
use utf_recode::scan::ill_formed_spans;
use utf_recode::{
    CodeUnit, StreamRecoder, first_ill_formed, is_well_formed, recode, to_utf8_string,
    to_utf8_with, to_utf16_string, to_utf32_string,
};

/// Bytes biased towards UTF-8 structure so sequences actually form
fn utf8ish() -> impl Strategy<Value = Vec<u8>> {
    vec(
        prop_oneof![
            0x00u8..0x80,
            0x80u8..0xC0,
            0xC0u8..0xE0,
            0xE0u8..0xF0,
            0xF0u8..=0xFF,
        ],
        0..64,
    )
}

fn utf16ish() -> impl Strategy<Value = Vec<u16>> {
    vec(prop_oneof![0u16..0x100, 0xD800u16..0xE000, any::<u16>()], 0..64)
}

fn stream<F: CodeUnit, T: CodeUnit>(input: &[F], cuts: &[usize]) -> Vec<T> {
    let mut recoder = StreamRecoder::<F, T>::new();
    let mut out = Vec::new();
    let mut rest = input;
    for &cut in cuts {
        let (chunk, tail) = rest.split_at(cut.min(rest.len()));
        recoder.push(chunk, &mut out, &Replace).unwrap();
        rest = tail;
    }
    recoder.push(rest, &mut out, &Replace).unwrap();
    recoder.finish(&mut out, &Replace).unwrap();
    out
}

fn one_shot<F: CodeUnit, T: CodeUnit>(input: &[F]) -> Vec<T> {
    let mut out = Vec::new();
    recode(input, &mut out, &Replace).unwrap();
    out
}

proptest! {
    #[test]
    fn test_text_round_trips(s in "\\PC*") {
        let utf16 = to_utf16_string(s.as_bytes());
        let utf32 = to_utf32_string(&utf16);
        prop_assert_eq!(to_utf8_string(&utf32), s.clone());
        prop_assert_eq!(utf16, s.encode_utf16().collect::<Vec<_>>());
    }

    #[test]
    fn test_scanner_agrees_with_std(bytes in utf8ish(), units in utf16ish()) {
        prop_assert_eq!(is_well_formed(&bytes), std::str::from_utf8(&bytes).is_ok());
        prop_assert_eq!(is_well_formed(&units), String::from_utf16(&units).is_ok());
        if let Err(err) = std::str::from_utf8(&bytes) {
            prop_assert_eq!(first_ill_formed(&bytes).start, err.valid_up_to());
        }
    }

    #[test]
    fn test_lossy_output_is_well_formed(bytes in utf8ish(), units in utf16ish()) {
        let utf8 = to_utf8_with(&bytes, &Replace).unwrap();
        prop_assert!(is_well_formed(&utf8));
        prop_assert!(is_well_formed(&to_utf16_string(&bytes)));
        prop_assert!(is_well_formed(&to_utf32_string(&units)));
        prop_assert!(String::from_utf16(&to_utf16_string(&units)).is_ok());
    }

    #[test]
    fn test_recoding_is_deterministic(bytes in utf8ish()) {
        prop_assert_eq!(to_utf16_string(&bytes), to_utf16_string(&bytes));
        prop_assert_eq!(to_utf8_string(&bytes), to_utf8_string(&bytes));
    }

    #[test]
    fn test_lossy_recoding_is_idempotent(bytes in utf8ish()) {
        let once = to_utf8_with(&bytes, &Replace).unwrap();
        let twice = to_utf8_with(&once, &Replace).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_one_policy_call_per_ill_formed_unit(bytes in utf8ish()) {
        let calls = Cell::new(0usize);
        let policy = from_fn(|| -> Result<Vec<u32>, Abort> {
            calls.set(calls.get() + 1);
            Ok(vec![0xFFFD])
        });
        let mut out: Vec<u32> = Vec::new();
        recode(&bytes, &mut out, &policy).unwrap();
        prop_assert_eq!(calls.get(), ill_formed_spans(&bytes).count());
    }

    #[test]
    fn test_stream_matches_one_shot_utf8(bytes in utf8ish(), cuts in vec(0usize..16, 0..8)) {
        prop_assert_eq!(stream::<u8, u16>(&bytes, &cuts), one_shot::<u8, u16>(&bytes));
        prop_assert_eq!(stream::<u8, u8>(&bytes, &cuts), one_shot::<u8, u8>(&bytes));
    }

    #[test]
    fn test_stream_matches_one_shot_utf16(units in utf16ish(), cuts in vec(0usize..16, 0..8)) {
        prop_assert_eq!(stream::<u16, u8>(&units, &cuts), one_shot::<u16, u8>(&units));
        prop_assert_eq!(stream::<u16, u32>(&units, &cuts), one_shot::<u16, u32>(&units));
    }
}
