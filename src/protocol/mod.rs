//! Text formats for diffs and patches
//!
//! - [`delta`]: compact tab-separated encoding of a diff against its source
//! - [`patch_text`]: GNU diff style patch text
//! - [`html`]: markup for displaying a diff
//! - [`uri`]: percent encoding used for text bodies in the first two
//! - [`wire`]: sign characters of each operation

use thiserror::Error;

pub mod delta;
pub mod html;
pub mod patch_text;
pub mod uri;
pub mod wire;

/// Errors raised while decoding delta or patch text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Delta token starts with something other than `=`, `-` or `+`
    #[error("Unknown delta operation: {token:?}")]
    UnknownOperation {
        /// Offending token
        token: String,
    },

    /// Length in a delta token is not a number
    #[error("Invalid number in delta: {token:?}")]
    InvalidNumber {
        /// Offending token
        token: String,
    },

    /// Length in a delta token is negative
    #[error("Negative number in delta: {token:?}")]
    NegativeLength {
        /// Offending token
        token: String,
    },

    /// Delta consumes more chars than the source text has
    #[error("Delta length ({pointer}) larger than source text length ({source_len})")]
    DeltaTooLong {
        /// Chars the delta consumes up to the failing token
        pointer: usize,
        /// Source text length in chars
        source_len: usize,
    },

    /// Delta consumes fewer chars than the source text has
    #[error("Delta length ({pointer}) smaller than source text length ({source_len})")]
    DeltaTooShort {
        /// Chars the whole delta consumes
        pointer: usize,
        /// Source text length in chars
        source_len: usize,
    },

    /// `%` not followed by two hex digits
    #[error("Invalid percent escape at byte {offset} of {input:?}")]
    InvalidEscape {
        /// Text being decoded
        input: String,
        /// Byte offset of the `%`
        offset: usize,
    },

    /// Escaped bytes are not valid UTF-8
    #[error("Percent escapes are not valid UTF-8: {input:?}")]
    InvalidUtf8 {
        /// Text being decoded
        input: String,
    },

    /// Line where a patch header was expected does not parse as one
    #[error("Invalid patch header: {line:?}")]
    InvalidPatchHeader {
        /// Offending line
        line: String,
    },

    /// Patch body line starts with an unknown sign
    #[error("Invalid patch mode {sign:?} in: {line:?}")]
    InvalidPatchMode {
        /// Leading char of the line
        sign: char,
        /// Offending line
        line: String,
    },
}
