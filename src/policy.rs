//! Error policies: what to emit in place of an ill-formed input unit.
//!
//! A policy is asked for a replacement once per ill-formed unit (or per
//! codepoint the destination cannot represent). It receives no arguments, so
//! it cannot observe the offending input, and it must answer the same way
//! every time it is asked. Returning [`Abort`] stops the conversion; the
//! recoder then reports [`Error::IllFormed`](crate::Error::IllFormed) with
//! the position of the offending unit.
//!
//! ```
//! use utf_recode::policy::{Skip, Substitute};
//! use utf_recode::to_utf8_with;
//!
//! let input: &[u8] = b"a\xFFb";
//! assert_eq!(to_utf8_with(input, &Skip).unwrap(), b"ab");
//! assert_eq!(to_utf8_with(input, &Substitute::<u8>::text("?")).unwrap(), b"a?b");
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::narrow::Facet;
use crate::unit::CodeUnit;
use crate::{Encoding, Error, Result, to_narrow_string};

/// Signal from a policy that the whole conversion must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, thiserror::Error)]
#[error("conversion aborted by the error policy")]
pub struct Abort;

/// Supplies the replacement for one ill-formed unit, already encoded in the
/// destination encoding `U`.
pub trait ErrorPolicy<U: CodeUnit> {
    /// Replacement units (possibly empty), or [`Abort`]
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort>;
}

impl<U: CodeUnit, P: ErrorPolicy<U> + ?Sized> ErrorPolicy<U> for &P {
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        (**self).replacement()
    }
}

/// Emit U+FFFD REPLACEMENT CHARACTER. This is the default policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Replace;

impl<U: CodeUnit> ErrorPolicy<U> for Replace {
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        Ok(Cow::Borrowed(U::REPLACEMENT))
    }
}

/// Drop ill-formed units from the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Skip;

impl<U: CodeUnit> ErrorPolicy<U> for Skip {
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        Ok(Cow::Borrowed(&[]))
    }
}

/// Refuse ill-formed input by aborting the conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Strict;

impl<U: CodeUnit> ErrorPolicy<U> for Strict {
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        Err(Abort)
    }
}

/// Emit a fixed sequence of destination units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitute<U> {
    units: Vec<U>,
}

impl<U: CodeUnit> Substitute<U> {
    /// Substitute the given units verbatim
    pub fn new(units: Vec<U>) -> Self {
        Self { units }
    }

    /// Substitute `text`, encoded in the destination encoding
    pub fn text(text: &str) -> Self {
        Self {
            units: encode_text(text),
        }
    }

    /// The units emitted per ill-formed unit
    pub fn units(&self) -> &[U] {
        &self.units
    }
}

impl<U: CodeUnit> ErrorPolicy<U> for Substitute<U> {
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        Ok(Cow::Borrowed(&self.units))
    }
}

/// Policy backed by a closure; see [`from_fn`]
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F>(F);

/// Build a policy from a zero-argument closure.
///
/// ```
/// use utf_recode::policy::{Abort, from_fn};
/// use utf_recode::to_utf16_with;
///
/// let strict = from_fn(|| -> Result<Vec<u16>, Abort> { Err(Abort) });
/// assert!(to_utf16_with("ok".as_bytes(), &strict).is_ok());
/// assert!(to_utf16_with(&[0xC0u8][..], &strict).is_err());
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F> {
    FromFn(f)
}

impl<U, F> ErrorPolicy<U> for FromFn<F>
where
    U: CodeUnit,
    F: Fn() -> std::result::Result<Vec<U>, Abort>,
{
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        (self.0)().map(Cow::Owned)
    }
}

/// Serializable policy choice that works for every destination encoding.
///
/// ```
/// use utf_recode::policy::Policy;
///
/// let policy: Policy = serde_json::from_str(r#"{"substitute":"*ill*"}"#).unwrap();
/// assert_eq!(policy, Policy::Substitute("*ill*".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// See [`Replace`]
    #[default]
    Replace,
    /// See [`Skip`]
    Skip,
    /// See [`Strict`]
    Strict,
    /// Emit this text, encoded in the destination encoding
    Substitute(String),
}

impl Policy {
    /// This policy for destination `U`, with any substitution text encoded
    /// once up front.
    pub fn encoded<U: CodeUnit>(&self) -> EncodedPolicy<U> {
        EncodedPolicy(match self {
            Policy::Replace => Some(U::REPLACEMENT.to_vec()),
            Policy::Skip => Some(Vec::new()),
            Policy::Strict => None,
            Policy::Substitute(text) => Some(encode_text(text)),
        })
    }

    /// This policy for a destination in the narrow encoding of `facet`.
    ///
    /// [`Policy::Replace`] writes the facet's own
    /// [replacement](Facet::replacement), and substitution text is encoded
    /// through the facet.
    pub fn encoded_narrow<C: Facet + ?Sized>(&self, facet: &C) -> Result<EncodedPolicy<u8>> {
        Ok(EncodedPolicy(match self {
            Policy::Replace => Some(facet.replacement().to_vec()),
            Policy::Skip => Some(Vec::new()),
            Policy::Strict => None,
            Policy::Substitute(text) => Some(to_narrow_string(text.as_bytes(), facet)?),
        }))
    }
}

/// Asking a [`Policy`] directly encodes [`Policy::Substitute`] text on every
/// call; conversions over long input should use [`Policy::encoded`].
impl<U: CodeUnit> ErrorPolicy<U> for Policy {
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        match self {
            Policy::Replace => Ok(Cow::Borrowed(U::REPLACEMENT)),
            Policy::Skip => Ok(Cow::Borrowed(&[])),
            Policy::Strict => Err(Abort),
            Policy::Substitute(text) => Ok(Cow::Owned(encode_text(text))),
        }
    }
}

/// A [`Policy`] resolved for destination `U`; see [`Policy::encoded`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPolicy<U>(Option<Vec<U>>);

impl<U: CodeUnit> ErrorPolicy<U> for EncodedPolicy<U> {
    fn replacement(&self) -> std::result::Result<Cow<'_, [U]>, Abort> {
        self.0.as_deref().map(Cow::Borrowed).ok_or(Abort)
    }
}

fn encode_text<U: CodeUnit>(text: &str) -> Vec<U> {
    let mut units = Vec::with_capacity(text.len());
    for c in text.chars() {
        U::encode_char(c, &mut units);
    }
    units
}

/// Ask `policy` for the replacement of the ill-formed unit at `offset` of an
/// `encoding` input and append it, mapping [`Abort`] to [`Error::IllFormed`].
pub(crate) fn substitute<U, P>(
    policy: &P,
    out: &mut Vec<U>,
    encoding: Encoding,
    offset: usize,
) -> Result<()>
where
    U: CodeUnit,
    P: ErrorPolicy<U> + ?Sized,
{
    trace!(%encoding, offset, "substituting ill-formed input");
    let replacement = policy
        .replacement()
        .map_err(|Abort| Error::IllFormed { encoding, offset })?;
    out.extend_from_slice(&replacement);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_per_encoding() {
        assert_eq!(
            ErrorPolicy::<u8>::replacement(&Replace).unwrap().into_owned(),
            [0xEF, 0xBF, 0xBD]
        );
        assert_eq!(ErrorPolicy::<u16>::replacement(&Replace).unwrap().into_owned(), [0xFFFD]);
        assert_eq!(ErrorPolicy::<u32>::replacement(&Replace).unwrap().into_owned(), [0xFFFD]);
    }

    #[test]
    fn test_policies_are_repeatable() {
        let policy = Substitute::<u32>::text("*ill*");
        let first = policy.replacement().unwrap().into_owned();
        let second = policy.replacement().unwrap().into_owned();
        assert_eq!(first, second);
        assert_eq!(first, [0x2A, 0x69, 0x6C, 0x6C, 0x2A]);
    }

    #[test]
    fn test_skip_and_strict() {
        assert!(ErrorPolicy::<u16>::replacement(&Skip).unwrap().is_empty());
        assert_eq!(ErrorPolicy::<u16>::replacement(&Strict), Err(Abort));
    }

    #[test]
    fn test_dynamic_policy_matches_static() {
        let text = Policy::Substitute("·".to_string());
        assert_eq!(
            ErrorPolicy::<u8>::replacement(&text).unwrap().into_owned(),
            Substitute::<u8>::text("·").units()
        );
        assert_eq!(ErrorPolicy::<u16>::replacement(&Policy::Strict), Err(Abort));
        assert_eq!(
            ErrorPolicy::<u16>::replacement(&Policy::default()).unwrap().into_owned(),
            [0xFFFD]
        );
    }

    #[test]
    fn test_encoded_policy_borrows_its_units() {
        let policy = Policy::Substitute("·".to_string()).encoded::<u16>();
        let first = policy.replacement().unwrap();
        assert!(matches!(first, Cow::Borrowed(&[0x00B7])));

        let replace = Policy::Replace.encoded::<u8>();
        assert_eq!(replace.replacement().unwrap(), &[0xEF, 0xBF, 0xBD][..]);
        assert!(Policy::Skip.encoded::<u32>().replacement().unwrap().is_empty());
        assert_eq!(Policy::Strict.encoded::<u32>().replacement(), Err(Abort));
    }

    #[test]
    fn test_encoded_narrow_policy() {
        use crate::narrow::Latin1;

        let replace = Policy::Replace.encoded_narrow(&Latin1).unwrap();
        assert_eq!(replace.replacement().unwrap(), &b"?"[..]);
        let text = Policy::Substitute("é€".to_string()).encoded_narrow(&Latin1).unwrap();
        assert_eq!(text.replacement().unwrap(), &b"\xE9?"[..]);
        assert_eq!(Policy::Strict.encoded_narrow(&Latin1).unwrap().replacement(), Err(Abort));
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(serde_json::to_string(&Policy::Replace).unwrap(), r#""replace""#);
        let skip: Policy = serde_json::from_str(r#""skip""#).unwrap();
        assert_eq!(skip, Policy::Skip);
    }

    #[test]
    fn test_substitute_reports_offset_on_abort() {
        let mut out: Vec<u8> = Vec::new();
        let err = substitute(&Strict, &mut out, Encoding::Utf16, 7).unwrap_err();
        assert_eq!(
            err,
            Error::IllFormed {
                encoding: Encoding::Utf16,
                offset: 7
            }
        );
    }
}
