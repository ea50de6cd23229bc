//! Pairwise recoders between the UTF encodings.
//!
//! | From \ To | UTF-8            | UTF-16           | UTF-32           |
//! |-----------|------------------|------------------|------------------|
//! | UTF-8     | validate + copy  | decode → encode  | decode → encode  |
//! | UTF-16    | decode → encode  | validate + copy  | decode → encode  |
//! | UTF-32    | encode           | encode           | validate + copy  |
//!
//! The decode → encode path carries ill-formed spans through the pipeline as
//! the [`ILL_FORMED`](crate::decode::ILL_FORMED) sentinel, so every
//! ill-formed input unit costs exactly one policy invocation against the
//! destination encoding.

use std::marker::PhantomData;

use tracing::trace;

use crate::decode::Decoded;
use crate::encode::encode_or_substitute;
use crate::policy::{ErrorPolicy, substitute};
use crate::unit::CodeUnit;
use crate::{Encoding, Error, Result};

/// Recode `input` from `F`'s encoding into `T`'s, appending to `out`.
///
/// Ill-formed input is resolved through `policy`. If the policy aborts, the
/// call returns [`Error::IllFormed`] with the source offset of the offending
/// unit; whatever was recoded before it stays in `out`.
///
/// # Examples
///
/// ```
/// use utf_recode::policy::Replace;
/// use utf_recode::recode::recode;
///
/// let mut utf16: Vec<u16> = Vec::new();
/// recode("$€𐐷".as_bytes(), &mut utf16, &Replace).unwrap();
/// assert_eq!(utf16, [0x24, 0x20AC, 0xD801, 0xDC37]);
/// ```
pub fn recode<F, T, P>(input: &[F], out: &mut Vec<T>, policy: &P) -> Result<()>
where
    F: CodeUnit,
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    recode_at(input, out, policy, 0)
}

/// [`recode`] for input that starts `base` units into a longer source
fn recode_at<F, T, P>(input: &[F], out: &mut Vec<T>, policy: &P, base: usize) -> Result<()>
where
    F: CodeUnit,
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    out.reserve(input.len());
    if F::ENCODING == T::ENCODING {
        copy_validated(input, out, policy, base)
    } else if F::ENCODING == Encoding::Utf32 {
        encode_scalars(input, out, policy, base)
    } else {
        transcode(input, out, policy, base)
    }
}

/// Same encoding on both sides: copy well-formed runs, substitute the rest.
fn copy_validated<F, T, P>(input: &[F], out: &mut Vec<T>, policy: &P, base: usize) -> Result<()>
where
    F: CodeUnit,
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    let mut pos = 0;
    let mut run = 0;
    while let Some(step) = F::decode(&input[pos..]) {
        if let Decoded::IllFormed(len) = step {
            out.extend(input[run..pos].iter().map(|&unit| T::from_u32(unit.to_u32())));
            trace!(len, "ill-formed span in validated copy");
            substitute(policy, out, F::ENCODING, base + pos)?;
            run = pos + len;
        }
        pos += step.consumed();
    }
    out.extend(input[run..].iter().map(|&unit| T::from_u32(unit.to_u32())));
    Ok(())
}

/// UTF-32 source: every unit already is a codepoint (or an invalid value).
fn encode_scalars<F, T, P>(input: &[F], out: &mut Vec<T>, policy: &P, base: usize) -> Result<()>
where
    F: CodeUnit,
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    for (pos, &unit) in input.iter().enumerate() {
        encode_or_substitute(unit.to_u32(), out, policy).map_err(|_| Error::IllFormed {
            encoding: F::ENCODING,
            offset: base + pos,
        })?;
    }
    Ok(())
}

/// Decode each codepoint of `F` and encode it as `T`.
fn transcode<F, T, P>(input: &[F], out: &mut Vec<T>, policy: &P, base: usize) -> Result<()>
where
    F: CodeUnit,
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    let mut pos = 0;
    while let Some(step) = F::decode(&input[pos..]) {
        if step.is_ill_formed() {
            trace!(offset = base + pos, len = step.consumed(), "ill-formed span");
        }
        encode_or_substitute(step.code_point(), out, policy).map_err(|_| Error::IllFormed {
            encoding: F::ENCODING,
            offset: base + pos,
        })?;
        pos += step.consumed();
    }
    Ok(())
}

/// Chunked recoder whose output matches a single [`recode`] call over the
/// concatenation of all pushed chunks.
///
/// A sequence split across a chunk boundary is held back until the next
/// chunk (or [`finish`](Self::finish)) decides whether it is complete.
/// After an error the recoder should be discarded.
///
/// ```
/// use utf_recode::policy::Replace;
/// use utf_recode::recode::StreamRecoder;
///
/// let euro = "€".as_bytes();
/// let mut stream = StreamRecoder::<u8, u32>::new();
/// let mut out = Vec::new();
/// stream.push(&euro[..1], &mut out, &Replace).unwrap();
/// stream.push(&euro[1..], &mut out, &Replace).unwrap();
/// stream.finish(&mut out, &Replace).unwrap();
/// assert_eq!(out, [0x20AC]);
/// ```
#[derive(Debug)]
pub struct StreamRecoder<F: CodeUnit, T: CodeUnit> {
    pending: Vec<F>,
    consumed: usize,
    _target: PhantomData<fn() -> T>,
}

impl<F: CodeUnit, T: CodeUnit> Default for StreamRecoder<F, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: CodeUnit, T: CodeUnit> StreamRecoder<F, T> {
    /// Create a recoder with nothing pending
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            consumed: 0,
            _target: PhantomData,
        }
    }

    /// Units held back waiting for the rest of their sequence
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Source units fully recoded so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Recode the next chunk of input
    pub fn push<P>(&mut self, chunk: &[F], out: &mut Vec<T>, policy: &P) -> Result<()>
    where
        P: ErrorPolicy<T> + ?Sized,
    {
        if self.pending.is_empty() {
            let ready = chunk.len() - F::incomplete_tail(chunk);
            recode_at(&chunk[..ready], out, policy, self.consumed)?;
            self.pending.extend_from_slice(&chunk[ready..]);
            self.consumed += ready;
            return Ok(());
        }

        self.pending.extend_from_slice(chunk);
        let ready = self.pending.len() - F::incomplete_tail(&self.pending);
        recode_at(&self.pending[..ready], out, policy, self.consumed)?;
        self.pending.drain(..ready);
        self.consumed += ready;
        Ok(())
    }

    /// Recode whatever is still pending; an unfinished sequence is ill-formed
    pub fn finish<P>(self, out: &mut Vec<T>, policy: &P) -> Result<()>
    where
        P: ErrorPolicy<T> + ?Sized,
    {
        recode_at(&self.pending, out, policy, self.consumed)
    }
}
