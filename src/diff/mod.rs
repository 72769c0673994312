//! Diff algorithm
//!
//! A diff is an ordered list of [`Diff`] spans. Concatenating the spans of
//! every non-insert entry reproduces the source text, and concatenating the
//! spans of every non-delete entry reproduces the destination text.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::Hash;

pub mod cleanup;
mod engine;
pub(crate) mod half_match;
pub(crate) mod lines;
pub mod text;

/// Edit operation carried by a [`Diff`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Span exists only in the source text
    Delete,
    /// Span exists only in the destination text
    Insert,
    /// Span is shared by both texts
    Equal,
}

/// One edit operation and the span it applies to
///
/// The span is held as a token vector so every offset is a count of tokens,
/// which for text means Unicode scalar values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T = char> {
    /// Operation
    pub op: Operation,
    /// Span of tokens
    pub text: Vec<T>,
}

impl<T> Diff<T> {
    /// Create a diff from an operation and a token vector
    pub fn new(op: Operation, text: Vec<T>) -> Self {
        Self { op, text }
    }
}

impl Diff {
    /// Create a deletion
    pub fn delete(text: &str) -> Self {
        Self::new(Operation::Delete, text.chars().collect())
    }

    /// Create an insertion
    pub fn insert(text: &str) -> Self {
        Self::new(Operation::Insert, text.chars().collect())
    }

    /// Create an equality
    pub fn equal(text: &str) -> Self {
        Self::new(Operation::Equal, text.chars().collect())
    }

    /// Span as an owned string
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }
}

#[derive(Serialize, Deserialize)]
struct DiffRepr {
    op: Operation,
    text: String,
}

impl Serialize for Diff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DiffRepr {
            op: self.op,
            text: self.text(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Diff {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DiffRepr::deserialize(deserializer)?;
        Ok(Self::new(repr.op, repr.text.chars().collect()))
    }
}

/// Token types the diff engine can work on
///
/// Implemented for `char` (text) and `u32` (line ids). Only text diffs can
/// switch to line mode.
pub(crate) trait Token: Copy + Eq + Hash + std::fmt::Debug {
    /// Diff two long token runs line by line, if this token type supports it
    fn line_mode(
        _engine: &crate::Engine,
        _text1: &[Self],
        _text2: &[Self],
        _deadline: Option<std::time::Instant>,
    ) -> Option<Vec<Diff<Self>>> {
        None
    }
}

impl Token for char {
    fn line_mode(
        engine: &crate::Engine,
        text1: &[char],
        text2: &[char],
        deadline: Option<std::time::Instant>,
    ) -> Option<Vec<Diff>> {
        Some(engine.diff_line_mode(text1, text2, deadline))
    }
}

impl Token for u32 {}

/// Rebuild the source text (equalities and deletions)
pub fn text1(diffs: &[Diff]) -> String {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Insert)
        .flat_map(|d| d.text.iter())
        .collect()
}

/// Rebuild the destination text (equalities and insertions)
pub fn text2(diffs: &[Diff]) -> String {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Delete)
        .flat_map(|d| d.text.iter())
        .collect()
}

pub(crate) fn source_chars<T: Clone>(diffs: &[Diff<T>]) -> Vec<T> {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Insert)
        .flat_map(|d| d.text.iter().cloned())
        .collect()
}

pub(crate) fn destination_chars<T: Clone>(diffs: &[Diff<T>]) -> Vec<T> {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Delete)
        .flat_map(|d| d.text.iter().cloned())
        .collect()
}

/// Levenshtein distance of a diff: inserted, deleted or substituted tokens
///
/// A deletion next to an insertion counts as substitutions, so the pair
/// costs the larger of the two lengths.
pub fn levenshtein<T>(diffs: &[Diff<T>]) -> usize {
    let mut levenshtein = 0;
    let mut insertions = 0;
    let mut deletions = 0;

    for diff in diffs {
        match diff.op {
            Operation::Insert => insertions += diff.text.len(),
            Operation::Delete => deletions += diff.text.len(),
            Operation::Equal => {
                levenshtein += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }

    levenshtein + insertions.max(deletions)
}

/// Map an offset in the source text to the equivalent offset in the
/// destination text
///
/// An offset inside a deletion maps to the position the deletion collapsed
/// to. E.g. `"The cat"` vs `"The big cat"`: 1 -> 1, 5 -> 8.
pub fn x_index<T>(diffs: &[Diff<T>], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut overshot = None;

    for diff in diffs {
        if diff.op != Operation::Insert {
            chars1 += diff.text.len();
        }
        if diff.op != Operation::Delete {
            chars2 += diff.text.len();
        }
        if chars1 > loc {
            overshot = Some(diff.op);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }

    if overshot == Some(Operation::Delete) {
        return last_chars2;
    }
    last_chars2 + (loc - last_chars1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text1_text2() {
        let diffs = vec![
            Diff::equal("jump"),
            Diff::delete("s"),
            Diff::insert("ed"),
            Diff::equal(" over "),
            Diff::delete("the"),
            Diff::insert("a"),
            Diff::equal(" lazy"),
        ];
        assert_eq!(text1(&diffs), "jumps over the lazy");
        assert_eq!(text2(&diffs), "jumped over a lazy");
    }

    #[test]
    fn test_levenshtein() {
        let trailing = vec![Diff::delete("abc"), Diff::insert("1234"), Diff::equal("xyz")];
        assert_eq!(levenshtein(&trailing), 4);

        let leading = vec![Diff::equal("xyz"), Diff::delete("abc"), Diff::insert("1234")];
        assert_eq!(levenshtein(&leading), 4);

        let middle = vec![Diff::delete("abc"), Diff::equal("xyz"), Diff::insert("1234")];
        assert_eq!(levenshtein(&middle), 7);
    }

    #[test]
    fn test_x_index() {
        let translation = vec![Diff::delete("a"), Diff::insert("1234"), Diff::equal("xyz")];
        assert_eq!(x_index(&translation, 2), 5);

        let deletion = vec![Diff::equal("a"), Diff::delete("1234"), Diff::equal("xyz")];
        assert_eq!(x_index(&deletion, 3), 1);
    }

    #[test]
    fn test_diff_serde_uses_plain_strings() {
        let diff = Diff::insert("h\u{e9}llo");
        let json = serde_json::to_string(&diff).unwrap();
        assert_eq!(json, r#"{"op":"insert","text":"héllo"}"#);

        let back: Diff = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diff);
    }
}
