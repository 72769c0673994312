//! Compact delta encoding
//!
//! A delta describes a diff relative to its source text, so only inserted
//! text is carried. Tokens are separated by tabs:
//!
//! ```text
//! =N      keep the next N chars of the source
//! -N      delete the next N chars of the source
//! +text   insert percent-encoded text
//! ```
//!
//! # Example
//! ```
//! use textdelta::diff::Diff;
//! use textdelta::protocol::delta::{from_delta, to_delta};
//!
//! let diffs = vec![Diff::equal("hello "), Diff::delete("fox"), Diff::insert("dog")];
//! let delta = to_delta(&diffs);
//! assert_eq!(delta, "=6\t-3\t+dog");
//! assert_eq!(from_delta("hello fox", &delta).unwrap(), diffs);
//! ```

use super::{DecodeError, uri};
use crate::diff::{Diff, Operation};

/// Encode a diff as a delta
///
/// # Arguments
/// * `diffs` - Diff to encode
///
/// # Returns
/// Tab-separated delta tokens
pub fn to_delta(diffs: &[Diff]) -> String {
    diffs
        .iter()
        .map(|diff| {
            let sign = diff.op.delta_sign();
            if diff.op.carries_text() {
                format!("{sign}{}", uri::encode(&diff.text))
            } else {
                format!("{sign}{}", diff.text.len())
            }
        })
        .collect::<Vec<_>>()
        .join("\t")
}

/// Rebuild a diff from its source text and delta
///
/// # Arguments
/// * `text1` - Source text the delta was made against
/// * `delta` - Delta produced by [`to_delta`]
///
/// # Returns
/// The diff, or the first problem found in the delta
pub fn from_delta(text1: &str, delta: &str) -> Result<Vec<Diff>, DecodeError> {
    let source: Vec<char> = text1.chars().collect();
    let mut diffs = Vec::new();
    let mut pointer = 0usize;

    for token in delta.split('\t') {
        let mut chars = token.chars();
        let Some(sign) = chars.next() else {
            // Blank tokens are harmless.
            continue;
        };
        let param = chars.as_str();

        let op = Operation::from_delta_sign(sign).ok_or_else(|| {
            DecodeError::UnknownOperation {
                token: token.to_string(),
            }
        })?;

        if op.carries_text() {
            diffs.push(Diff::new(op, uri::decode(param)?.chars().collect()));
            continue;
        }

        let count: i64 = param.parse().map_err(|_| DecodeError::InvalidNumber {
            token: token.to_string(),
        })?;
        let count = usize::try_from(count).map_err(|_| DecodeError::NegativeLength {
            token: token.to_string(),
        })?;

        let end = pointer
            .checked_add(count)
            .filter(|&end| end <= source.len())
            .ok_or(DecodeError::DeltaTooLong {
                pointer: pointer.saturating_add(count),
                source_len: source.len(),
            })?;
        diffs.push(Diff::new(op, source[pointer..end].to_vec()));
        pointer = end;
    }

    if pointer != source.len() {
        return Err(DecodeError::DeltaTooShort {
            pointer,
            source_len: source.len(),
        });
    }

    Ok(diffs)
}
