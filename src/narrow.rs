//! Narrow-encoding bridge.
//!
//! A narrow encoding is any byte encoding that is not one of the UTF forms,
//! typically a legacy codepage or a stateful multi-byte encoding such as
//! ISO-2022-JP. This crate does not know any of them; the caller supplies a
//! [`Facet`] that converts between narrow bytes and the platform wide
//! encoding ([`WideChar`]). The bridge drives the facet over fixed-size
//! staging buffers and routes everything on the wide side through the
//! regular recoders.
//!
//! The facet's shift state is created fresh for every top-level call and
//! threaded through the loop as a local value.
//!
//! ```
//! use utf_recode::narrow::{Latin1, decode_narrow};
//! use utf_recode::policy::Replace;
//!
//! let mut utf8: Vec<u8> = Vec::new();
//! decode_narrow(&Latin1, b"caf\xE9", &mut utf8, &Replace).unwrap();
//! assert_eq!(utf8, "café".as_bytes());
//! ```

use tracing::debug;

use crate::decode::{Decoded, ILL_FORMED};
use crate::policy::{ErrorPolicy, Substitute, substitute};
use crate::recode::recode;
use crate::unit::CodeUnit;
use crate::{Encoding, Error, Result, WideChar};

/// Wide units handed to or received from the facet per call
const WIDE_STAGING: usize = 64;

/// Narrow bytes received from the facet per encode call
const NARROW_STAGING: usize = 256;

/// How far a facet call got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetStatus {
    /// All input offered to the call was converted
    Complete,
    /// The call stopped early: the output buffer is full, or the input ends
    /// inside a sequence
    Partial,
    /// The unit at `consumed` cannot be converted
    Error,
}

/// Result of one facet call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FacetOutcome {
    /// How far the call got
    pub status: FacetStatus,
    /// Input units consumed
    pub consumed: usize,
    /// Output units written
    pub produced: usize,
}

impl FacetOutcome {
    /// Bundle a status with its unit counts
    pub fn new(status: FacetStatus, consumed: usize, produced: usize) -> Self {
        Self {
            status,
            consumed,
            produced,
        }
    }
}

/// Irrecoverable malfunction of a facet.
///
/// Unlike [`FacetStatus::Error`], which marks one unconvertible unit, this
/// fails the whole conversion with [`Error::Facet`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transcoding facet failed: {reason}")]
pub struct FacetFailure {
    reason: String,
}

impl FacetFailure {
    /// Describe the failure
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The description given by the facet
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// A buffer-oriented converter between a narrow encoding and [`WideChar`].
///
/// Both directions write at most `output.len()` units and report how much of
/// `input` they consumed. A facet is only ever borrowed; any per-conversion
/// state lives in the state values it hands out, so one facet can serve
/// concurrent conversions.
pub trait Facet {
    /// Shift state carried across decode calls
    type DecodeState;
    /// Shift state carried across encode calls
    type EncodeState;

    /// Initial state for a narrow to wide conversion
    fn decode_state(&self) -> Self::DecodeState;

    /// Initial state for a wide to narrow conversion
    fn encode_state(&self) -> Self::EncodeState;

    /// Convert narrow bytes to wide units
    fn decode(
        &self,
        state: &mut Self::DecodeState,
        input: &[u8],
        output: &mut [WideChar],
    ) -> std::result::Result<FacetOutcome, FacetFailure>;

    /// Convert wide units to narrow bytes
    fn encode(
        &self,
        state: &mut Self::EncodeState,
        input: &[WideChar],
        output: &mut [u8],
    ) -> std::result::Result<FacetOutcome, FacetFailure>;

    /// Write the bytes that return `state` to the initial shift state and
    /// report how many were written. Stateless encodings write nothing.
    fn unshift(
        &self,
        _state: &mut Self::EncodeState,
        _output: &mut [u8],
    ) -> std::result::Result<usize, FacetFailure> {
        Ok(0)
    }

    /// Bytes this encoding uses for an unrepresentable character
    fn replacement(&self) -> &[u8] {
        b"?"
    }
}

impl<C: Facet + ?Sized> Facet for &C {
    type DecodeState = C::DecodeState;
    type EncodeState = C::EncodeState;

    fn decode_state(&self) -> Self::DecodeState {
        (**self).decode_state()
    }

    fn encode_state(&self) -> Self::EncodeState {
        (**self).encode_state()
    }

    fn decode(
        &self,
        state: &mut Self::DecodeState,
        input: &[u8],
        output: &mut [WideChar],
    ) -> std::result::Result<FacetOutcome, FacetFailure> {
        (**self).decode(state, input, output)
    }

    fn encode(
        &self,
        state: &mut Self::EncodeState,
        input: &[WideChar],
        output: &mut [u8],
    ) -> std::result::Result<FacetOutcome, FacetFailure> {
        (**self).encode(state, input, output)
    }

    fn unshift(
        &self,
        state: &mut Self::EncodeState,
        output: &mut [u8],
    ) -> std::result::Result<usize, FacetFailure> {
        (**self).unshift(state, output)
    }

    fn replacement(&self) -> &[u8] {
        (**self).replacement()
    }
}

/// ISO-8859-1: every byte is the codepoint of the same value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Latin1;

impl Facet for Latin1 {
    type DecodeState = ();
    type EncodeState = ();

    fn decode_state(&self) -> Self::DecodeState {}

    fn encode_state(&self) -> Self::EncodeState {}

    fn decode(
        &self,
        _state: &mut (),
        input: &[u8],
        output: &mut [WideChar],
    ) -> std::result::Result<FacetOutcome, FacetFailure> {
        let n = input.len().min(output.len());
        for (dst, &byte) in output.iter_mut().zip(input) {
            *dst = WideChar::from(byte);
        }
        let status = if n == input.len() {
            FacetStatus::Complete
        } else {
            FacetStatus::Partial
        };
        Ok(FacetOutcome::new(status, n, n))
    }

    fn encode(
        &self,
        _state: &mut (),
        input: &[WideChar],
        output: &mut [u8],
    ) -> std::result::Result<FacetOutcome, FacetFailure> {
        let mut n = 0;
        for (&unit, dst) in input.iter().zip(output.iter_mut()) {
            match u8::try_from(unit) {
                Ok(byte) => *dst = byte,
                Err(_) => return Ok(FacetOutcome::new(FacetStatus::Error, n, n)),
            }
            n += 1;
        }
        let status = if n == input.len() {
            FacetStatus::Complete
        } else {
            FacetStatus::Partial
        };
        Ok(FacetOutcome::new(status, n, n))
    }
}

/// Convert narrow `input` to the UTF encoding of `T`.
///
/// Every byte the facet rejects costs one `policy` invocation; on abort the
/// error carries [`Encoding::Narrow`] and the byte offset. When the facet
/// stops making progress (a truncated trailing sequence) the policy is
/// invoked once and the rest of the input is dropped.
///
/// A wide unit the facet itself produces ill-formed (a lone surrogate, say)
/// is charged to the byte that produced it. That byte is exact for facets
/// spending a fixed number of bytes per wide unit; otherwise it is spread
/// evenly over the bytes the facet call consumed.
pub fn decode_narrow<C, T, P>(facet: &C, input: &[u8], out: &mut Vec<T>, policy: &P) -> Result<()>
where
    C: Facet + ?Sized,
    T: CodeUnit,
    P: ErrorPolicy<T> + ?Sized,
{
    let mut state = facet.decode_state();
    let mut staging = [WideChar::default(); WIDE_STAGING];
    let mut wide = WideStage::default();
    let mut pos = 0;

    while pos < input.len() {
        let outcome = facet.decode(&mut state, &input[pos..], &mut staging)?;
        let consumed = outcome.consumed.min(input.len() - pos);
        let produced = outcome.produced.min(staging.len());
        wide.stage(&staging[..produced], pos, consumed);

        match outcome.status {
            FacetStatus::Error => {
                wide.drain(out, policy, true)?;
                let offset = pos + consumed;
                debug!(offset, "facet rejected narrow input");
                substitute(policy, out, Encoding::Narrow, offset)?;
                pos = (offset + 1).min(input.len());
            }
            _ if consumed == 0 && produced == 0 => {
                wide.drain(out, policy, true)?;
                debug!(offset = pos, remaining = input.len() - pos, "facet made no progress");
                substitute(policy, out, Encoding::Narrow, pos)?;
                pos = input.len();
            }
            _ => {
                wide.drain(out, policy, false)?;
                pos += consumed;
            }
        }
    }

    wide.drain(out, policy, true)
}

/// Wide units decoded by the facet but not yet recoded
#[derive(Default)]
struct WideStage {
    units: Vec<WideChar>,
    // source byte offset of every staged unit
    offsets: Vec<usize>,
}

impl WideStage {
    /// Stage the `units` one facet call made from `consumed` bytes at `pos`
    fn stage(&mut self, units: &[WideChar], pos: usize, consumed: usize) {
        let last = consumed.saturating_sub(1);
        self.units.extend_from_slice(units);
        self.offsets
            .extend((0..units.len()).map(|i| pos + (i * consumed / units.len()).min(last)));
    }

    /// Recode the staged units. Unless `last`, a trailing high surrogate
    /// stays behind for its partner from the next facet call.
    fn drain<T, P>(&mut self, out: &mut Vec<T>, policy: &P, last: bool) -> Result<()>
    where
        T: CodeUnit,
        P: ErrorPolicy<T> + ?Sized,
    {
        let ready = if last {
            self.units.len()
        } else {
            self.units.len() - WideChar::incomplete_tail(&self.units)
        };
        recode(&self.units[..ready], out, policy).map_err(|err| match err {
            Error::IllFormed { offset, .. } => Error::IllFormed {
                encoding: Encoding::Narrow,
                offset: self.offsets.get(offset).copied().unwrap_or_default(),
            },
            other => other,
        })?;
        self.units.drain(..ready);
        self.offsets.drain(..ready);
        Ok(())
    }
}

/// Convert `input` from the UTF encoding of `S` to the narrow encoding of
/// `facet`.
///
/// Ill-formed input and characters the facet cannot represent both cost one
/// `policy` invocation; on abort the error names `S`'s encoding and the
/// source offset of the character. The policy's replacement is written to
/// the output as-is, so it should be narrow bytes such as
/// [`Facet::replacement`].
///
/// ```
/// use utf_recode::narrow::{Latin1, encode_narrow};
/// use utf_recode::policy::Substitute;
///
/// let mut latin1 = Vec::new();
/// let question = Substitute::new(b"?".to_vec());
/// encode_narrow(&Latin1, "a€é".as_bytes(), &mut latin1, &question).unwrap();
/// assert_eq!(latin1, b"a?\xE9");
/// ```
pub fn encode_narrow<C, S, P>(facet: &C, input: &[S], out: &mut Vec<u8>, policy: &P) -> Result<()>
where
    C: Facet + ?Sized,
    S: CodeUnit,
    P: ErrorPolicy<u8> + ?Sized,
{
    let mut encoder = NarrowEncoder::new(facet, S::ENCODING);
    let mut pos = 0;
    while let Some(step) = S::decode(&input[pos..]) {
        match step {
            Decoded::Scalar(c, _) => encoder.push(c, pos, out, policy)?,
            Decoded::IllFormed(_) => {
                encoder.flush(out, policy)?;
                substitute(policy, out, S::ENCODING, pos)?;
            }
        }
        pos += step.consumed();
    }
    encoder.finish(out, policy)
}

/// Convert between two narrow encodings through the wide encoding.
///
/// Bytes `from` rejects travel to the encode side as a single ill-formed
/// character, so they cost one invocation of the destination `policy`, as
/// do characters `to` cannot represent. On abort, the error offset counts
/// characters decoded from `input`, not bytes.
///
/// ```
/// use utf_recode::narrow::{Latin1, recode_narrow};
/// use utf_recode::policy::Strict;
///
/// let mut out = Vec::new();
/// recode_narrow(&Latin1, &Latin1, b"d\xE9j\xE0", &mut out, &Strict).unwrap();
/// assert_eq!(out, b"d\xE9j\xE0");
/// ```
pub fn recode_narrow<A, B, P>(
    from: &A,
    to: &B,
    input: &[u8],
    out: &mut Vec<u8>,
    policy: &P,
) -> Result<()>
where
    A: Facet + ?Sized,
    B: Facet + ?Sized,
    P: ErrorPolicy<u8> + ?Sized,
{
    let mut scalars: Vec<u32> = Vec::with_capacity(input.len());
    decode_narrow(from, input, &mut scalars, &Substitute::new(vec![ILL_FORMED]))?;
    encode_narrow(to, &scalars, out, policy).map_err(|err| match err {
        Error::IllFormed { offset, .. } => Error::IllFormed {
            encoding: Encoding::Narrow,
            offset,
        },
        other => other,
    })
}

/// Stages wide units for a facet and writes what it produces
struct NarrowEncoder<'f, C: Facet + ?Sized> {
    facet: &'f C,
    state: C::EncodeState,
    source: Encoding,
    wide: Vec<WideChar>,
    // source offset of every staged wide unit
    offsets: Vec<usize>,
    staging: [u8; NARROW_STAGING],
}

impl<'f, C: Facet + ?Sized> NarrowEncoder<'f, C> {
    fn new(facet: &'f C, source: Encoding) -> Self {
        Self {
            facet,
            state: facet.encode_state(),
            source,
            wide: Vec::with_capacity(WIDE_STAGING),
            offsets: Vec::with_capacity(WIDE_STAGING),
            staging: [0; NARROW_STAGING],
        }
    }

    fn push<P>(&mut self, c: char, offset: usize, out: &mut Vec<u8>, policy: &P) -> Result<()>
    where
        P: ErrorPolicy<u8> + ?Sized,
    {
        // room for a surrogate pair, so a character never straddles two calls
        if self.wide.len() + 2 > WIDE_STAGING {
            self.flush(out, policy)?;
        }
        WideChar::encode_char(c, &mut self.wide);
        self.offsets.resize(self.wide.len(), offset);
        Ok(())
    }

    fn flush<P>(&mut self, out: &mut Vec<u8>, policy: &P) -> Result<()>
    where
        P: ErrorPolicy<u8> + ?Sized,
    {
        let len = self.wide.len();
        let mut pos = 0;
        while pos < len {
            let outcome = self
                .facet
                .encode(&mut self.state, &self.wide[pos..], &mut self.staging)?;
            let consumed = outcome.consumed.min(len - pos);
            let produced = outcome.produced.min(NARROW_STAGING);
            out.extend_from_slice(&self.staging[..produced]);

            match outcome.status {
                FacetStatus::Error => {
                    let at = (pos + consumed).min(len - 1);
                    debug!(offset = self.offsets[at], "facet cannot represent character");
                    substitute(policy, out, self.source, self.offsets[at])?;
                    let skip = WideChar::decode(&self.wide[at..]).map_or(1, Decoded::consumed);
                    pos = (at + skip).min(len);
                }
                _ if consumed == 0 && produced == 0 => {
                    debug!(offset = self.offsets[pos], "facet made no progress");
                    substitute(policy, out, self.source, self.offsets[pos])?;
                    pos = len;
                }
                _ => pos += consumed,
            }
        }
        self.wide.clear();
        self.offsets.clear();
        Ok(())
    }

    fn finish<P>(mut self, out: &mut Vec<u8>, policy: &P) -> Result<()>
    where
        P: ErrorPolicy<u8> + ?Sized,
    {
        self.flush(out, policy)?;
        let written = self.facet.unshift(&mut self.state, &mut self.staging)?;
        out.extend_from_slice(&self.staging[..written.min(NARROW_STAGING)]);
        Ok(())
    }
}
