//! GNU diff style patch text
//!
//! ```text
//! @@ -21,18 +22,17 @@
//!  jump
//! -s
//! +ed
//!   over
//! ```
//!
//! Header offsets are 1-based. A length of one is left out (`-21`), and an
//! empty span is written as the offset just before it with `,0`. Each body
//! line is a sign char followed by the percent-encoded text.

use super::{DecodeError, uri};
use crate::diff::{Diff, Operation};
use crate::patch::Patch;
use std::fmt;

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{} +{} @@",
            Coords(self.start1, self.length1),
            Coords(self.start2, self.length2)
        )?;
        for diff in &self.diffs {
            writeln!(f, "{}{}", diff.op.patch_sign(), uri::encode(&diff.text))?;
        }
        Ok(())
    }
}

/// Header form of a zero-based start and a length
struct Coords(usize, usize);

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.1 {
            0 => write!(f, "{},0", self.0),
            1 => write!(f, "{}", self.0 + 1),
            length => write!(f, "{},{}", self.0 + 1, length),
        }
    }
}

/// Render patches as text
pub fn patch_to_text(patches: &[Patch]) -> String {
    patches.iter().map(ToString::to_string).collect()
}

/// Parse text produced by [`patch_to_text`]
///
/// Blank lines are ignored.
///
/// # Example
/// ```
/// use textdelta::protocol::patch_text::{patch_from_text, patch_to_text};
///
/// let text = "@@ -1,3 +1,4 @@\n ab\n-c\n+de\n";
/// let patches = patch_from_text(text).unwrap();
/// assert_eq!(patches[0].length2, 4);
/// assert_eq!(patch_to_text(&patches), text);
/// ```
pub fn patch_from_text(text: &str) -> Result<Vec<Patch>, DecodeError> {
    let mut patches = Vec::new();
    if text.is_empty() {
        return Ok(patches);
    }

    let mut lines = text.split('\n').peekable();
    while let Some(header) = lines.next() {
        let mut patch = parse_header(header)?;

        while let Some(&line) = lines.peek() {
            let Some(sign) = line.chars().next() else {
                lines.next();
                continue;
            };
            if sign == '@' {
                break;
            }

            let op = Operation::from_patch_sign(sign).ok_or_else(|| {
                DecodeError::InvalidPatchMode {
                    sign,
                    line: line.to_string(),
                }
            })?;
            let body = uri::decode(&line[sign.len_utf8()..])?;
            patch.diffs.push(Diff::new(op, body.chars().collect()));
            lines.next();
        }

        patches.push(patch);
    }

    Ok(patches)
}

/// Parse `@@ -start1[,length1] +start2[,length2] @@`
fn parse_header(line: &str) -> Result<Patch, DecodeError> {
    let invalid = || DecodeError::InvalidPatchHeader {
        line: line.to_string(),
    };

    let ranges = line
        .strip_prefix("@@ -")
        .and_then(|rest| rest.strip_suffix(" @@"))
        .ok_or_else(invalid)?;
    let (old, new) = ranges.split_once(" +").ok_or_else(invalid)?;
    let (start1, length1) = parse_coords(old).ok_or_else(invalid)?;
    let (start2, length2) = parse_coords(new).ok_or_else(invalid)?;

    Ok(Patch {
        diffs: Vec::new(),
        start1,
        start2,
        length1,
        length2,
    })
}

/// Zero-based start and length from `start[,length]`
fn parse_coords(text: &str) -> Option<(usize, usize)> {
    let (start, length) = match text.split_once(',') {
        Some((start, length)) => (start, length),
        None => (text, ""),
    };
    let start = parse_digits(start)?;

    match length {
        "" => Some((start.checked_sub(1)?, 1)),
        "0" => Some((start, 0)),
        length => Some((start.checked_sub(1)?, parse_digits(length)?)),
    }
}

fn parse_digits(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
