//! The format specification mini-language.
//!
//! A format specification is a string of single-character tokens. The
//! packer walks the format and the value list side by side: every scalar
//! token consumes one value and appends its binary encoding.
//!
//! # Tokens
//!
//! | Token | Kind | Consumes | Emits |
//! |-------|------|----------|-------|
//! | `c` | signed 8-bit integer | 1 value | 1 byte |
//! | `C` | unsigned 8-bit integer | 1 value | 1 byte |
//! | `s` | signed 16-bit integer | 1 value | 2 bytes |
//! | `S` | unsigned 16-bit integer | 1 value | 2 bytes |
//! | `i` | signed 32-bit integer | 1 value | 4 bytes |
//! | `I` | unsigned 32-bit integer | 1 value | 4 bytes |
//! | `l` | signed 64-bit integer | 1 value | 8 bytes |
//! | `L` | unsigned 64-bit integer | 1 value | 8 bytes |
//! | `f` | 32-bit float | 1 value | 4 bytes |
//! | `d` | 64-bit float | 1 value | 8 bytes |
//! | `t` | NUL-terminated text | 1 value | text + `\0` |
//! | `[` | loop start | nothing | nothing |
//! | `]` | loop end | nothing | nothing |
//! | `_` | skip | 1 value | nothing |
//! | `0` | zero padding | nothing | one `0x00` |
//!
//! Any other character is ignored. Numbers are written in the host's native
//! byte order.
//!
//! # Loops
//!
//! `]` jumps back to just after the nearest `[` that precedes it, so the span
//! between them repeats until the values run out. Only one level of
//! repetition is meaningful: in `"[c[f]]"` the inner `]` always finds the
//! inner `[`, so after the first `c` the packer repeats `f` forever and the
//! outer `]` is never reached.
//!
//! ```text
//! format "[cf]" on 6 values  =>  c f c f c f
//! format "d[t]" on 3 values  =>  d t t
//! ```
//!
//! A `]` with no `[` anywhere before it makes the format malformed.
//!
//! The default format is `"[t]"`: every value as NUL-terminated text.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One token of the format language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatToken {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Text,
    ArrayBegin,
    ArrayEnd,
    SkipByte,
    ZeroPadding,
}

impl FormatToken {
    /// Classifies one byte of a format specification.
    ///
    /// ```rust
    /// use pubpack::FormatToken;
    ///
    /// assert_eq!(FormatToken::from_byte(b'S'), Some(FormatToken::Uint16));
    /// assert_eq!(FormatToken::from_byte(b'x'), None);
    /// ```
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<FormatToken> {
        Some(match byte {
            b'c' => FormatToken::Int8,
            b'C' => FormatToken::Uint8,
            b's' => FormatToken::Int16,
            b'S' => FormatToken::Uint16,
            b'i' => FormatToken::Int32,
            b'I' => FormatToken::Uint32,
            b'l' => FormatToken::Int64,
            b'L' => FormatToken::Uint64,
            b'f' => FormatToken::Float32,
            b'd' => FormatToken::Float64,
            b't' => FormatToken::Text,
            b'[' => FormatToken::ArrayBegin,
            b']' => FormatToken::ArrayEnd,
            b'_' => FormatToken::SkipByte,
            b'0' => FormatToken::ZeroPadding,
            _ => return None,
        })
    }

    /// The character this token is written as.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            FormatToken::Int8 => 'c',
            FormatToken::Uint8 => 'C',
            FormatToken::Int16 => 's',
            FormatToken::Uint16 => 'S',
            FormatToken::Int32 => 'i',
            FormatToken::Uint32 => 'I',
            FormatToken::Int64 => 'l',
            FormatToken::Uint64 => 'L',
            FormatToken::Float32 => 'f',
            FormatToken::Float64 => 'd',
            FormatToken::Text => 't',
            FormatToken::ArrayBegin => '[',
            FormatToken::ArrayEnd => ']',
            FormatToken::SkipByte => '_',
            FormatToken::ZeroPadding => '0',
        }
    }

    /// Returns `true` for tokens that consume a value and emit its encoding.
    #[inline]
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(
            self,
            FormatToken::ArrayBegin
                | FormatToken::ArrayEnd
                | FormatToken::SkipByte
                | FormatToken::ZeroPadding
        )
    }

    /// Fixed number of bytes a numeric scalar emits.
    ///
    /// `None` for text (variable length) and for non-scalar tokens.
    #[must_use]
    pub const fn width(self) -> Option<usize> {
        match self {
            FormatToken::Int8 | FormatToken::Uint8 => Some(1),
            FormatToken::Int16 | FormatToken::Uint16 => Some(2),
            FormatToken::Int32 | FormatToken::Uint32 | FormatToken::Float32 => Some(4),
            FormatToken::Int64 | FormatToken::Uint64 | FormatToken::Float64 => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for FormatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One position of a parsed format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Instruction {
    /// Consume one value through the dispatch table.
    Scalar(FormatToken),
    LoopBegin,
    /// Jump target is the position of the matching `[`, if any.
    LoopEnd(Option<usize>),
    Skip,
    Pad,
    Noop,
}

/// A parsed format specification.
///
/// Parsing never fails: unknown characters become no-ops and each `]` is
/// resolved up front to the nearest `[` before it. Use [`Format::validate`]
/// to find a `]` that has none.
///
/// ```rust
/// use pubpack::Format;
///
/// let format = Format::new("[cf]");
/// assert_eq!(format.as_str(), "[cf]");
/// assert!(format.validate().is_ok());
/// assert!(Format::new("c]").validate().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Format {
    source: String,
    program: Vec<Instruction>,
}

impl Format {
    pub fn new(source: &str) -> Self {
        let mut program = Vec::with_capacity(source.len());
        let mut last_begin = None;

        for (position, byte) in source.bytes().enumerate() {
            let instruction = match FormatToken::from_byte(byte) {
                Some(FormatToken::ArrayBegin) => {
                    last_begin = Some(position);
                    Instruction::LoopBegin
                }
                Some(FormatToken::ArrayEnd) => Instruction::LoopEnd(last_begin),
                Some(FormatToken::SkipByte) => Instruction::Skip,
                Some(FormatToken::ZeroPadding) => Instruction::Pad,
                Some(token) => Instruction::Scalar(token),
                None => Instruction::Noop,
            };
            program.push(instruction);
        }

        Format {
            source: source.to_string(),
            program,
        }
    }

    /// The format text as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Number of positions (bytes) in the format.
    #[must_use]
    pub fn len(&self) -> usize {
        self.program.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    /// Checks that every `]` has a `[` somewhere before it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnmatchedBracket`] for the first offending `]`.
    pub fn validate(&self) -> Result<()> {
        match self
            .program
            .iter()
            .position(|ins| *ins == Instruction::LoopEnd(None))
        {
            Some(position) => Err(Error::UnmatchedBracket { position }),
            None => Ok(()),
        }
    }

    /// Returns `true` if the format contains a `[ ... ]` loop.
    #[must_use]
    pub fn has_loop(&self) -> bool {
        self.program
            .iter()
            .any(|ins| matches!(ins, Instruction::LoopEnd(Some(_))))
    }

    pub(crate) fn instructions(&self) -> &[Instruction] {
        &self.program
    }
}

impl Default for Format {
    fn default() -> Self {
        Format::new("[t]")
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for Format {
    fn from(value: &str) -> Self {
        Format::new(value)
    }
}

impl From<String> for Format {
    fn from(value: String) -> Self {
        Format::new(&value)
    }
}

impl From<Format> for String {
    fn from(value: Format) -> Self {
        value.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_table_is_consistent() {
        for byte in b"cCsSiIlLfdt[]_0" {
            let token = FormatToken::from_byte(*byte).unwrap();
            assert_eq!(token.as_char() as u8, *byte);
        }
        assert_eq!(FormatToken::from_byte(b' '), None);
        assert_eq!(FormatToken::from_byte(b'1'), None);
    }

    #[test]
    fn test_widths() {
        assert_eq!(FormatToken::Int8.width(), Some(1));
        assert_eq!(FormatToken::Uint16.width(), Some(2));
        assert_eq!(FormatToken::Float32.width(), Some(4));
        assert_eq!(FormatToken::Uint64.width(), Some(8));
        assert_eq!(FormatToken::Text.width(), None);
        assert!(FormatToken::Text.is_scalar());
        assert!(!FormatToken::SkipByte.is_scalar());
    }

    #[test]
    fn test_loop_end_resolves_nearest_begin() {
        let format = Format::new("[c[f]]");
        assert_eq!(format.instructions()[4], Instruction::LoopEnd(Some(2)));
        assert_eq!(format.instructions()[5], Instruction::LoopEnd(Some(2)));
    }

    #[test]
    fn test_loop_begin_at_start_and_second_position() {
        assert_eq!(
            Format::new("[c]").instructions()[2],
            Instruction::LoopEnd(Some(0))
        );
        assert_eq!(
            Format::new("x[c]").instructions()[3],
            Instruction::LoopEnd(Some(1))
        );
    }

    #[test]
    fn test_validate() {
        assert!(Format::new("cft").validate().is_ok());
        assert!(Format::new("[t]").validate().is_ok());
        assert_eq!(
            Format::new("cc]").validate(),
            Err(Error::UnmatchedBracket { position: 2 })
        );
        assert_eq!(
            Format::new("]c[").validate(),
            Err(Error::UnmatchedBracket { position: 0 })
        );
    }

    #[test]
    fn test_unknown_characters_are_noops() {
        let format = Format::new("c x\u{e9}");
        assert_eq!(format.len(), 5);
        assert!(format.instructions()[1..]
            .iter()
            .all(|ins| *ins == Instruction::Noop));
    }

    #[test]
    fn test_default_and_serde() {
        assert_eq!(Format::default().as_str(), "[t]");
        assert!(Format::default().has_loop());
        let json = serde_json::to_string(&Format::new("[cf]")).unwrap();
        assert_eq!(json, r#""[cf]""#);
        let back: Format = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Format::new("[cf]"));
    }
}
