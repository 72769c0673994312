//! Line id table for line-mode diffing
//!
//! Each distinct line gets a `u32` id and the texts are rewritten as id
//! sequences. Ids live in their own table and never overlap real characters.

use super::Diff;
use std::collections::HashMap;
use tracing::warn;

/// Maximum number of distinct lines tracked across both texts
///
/// Two thirds of the table is reserved for the source text. Once a text runs
/// out of room its remainder is folded into one final line.
pub const MAX_LINE_IDS: usize = 1 << 24;

/// Distinct lines seen so far and their ids
#[derive(Debug, Default)]
pub(crate) struct LineTable {
    lines: Vec<Vec<char>>,
    ids: HashMap<Vec<char>, u32>,
}

impl LineTable {
    /// Encode both texts with the default id budget
    pub fn encode_pair(text1: &[char], text2: &[char]) -> (Self, Vec<u32>, Vec<u32>) {
        let mut table = Self::default();
        let ids1 = table.encode(text1, MAX_LINE_IDS / 3 * 2);
        let ids2 = table.encode(text2, MAX_LINE_IDS);
        (table, ids1, ids2)
    }

    /// Split `text` into lines (each keeps its trailing newline) and return
    /// their ids, growing the table up to `max_lines` entries
    pub fn encode(&mut self, text: &[char], max_lines: usize) -> Vec<u32> {
        let mut encoded = Vec::new();
        let mut line_start = 0;

        while line_start < text.len() {
            let mut line_end = text[line_start..]
                .iter()
                .position(|&c| c == '\n')
                .map_or(text.len(), |offset| line_start + offset + 1);

            if let Some(&id) = self.ids.get(&text[line_start..line_end]) {
                encoded.push(id);
            } else {
                if self.lines.len() >= max_lines {
                    warn!(
                        max_lines,
                        remaining = text.len() - line_start,
                        "line id table full, folding rest of text into one line"
                    );
                    line_end = text.len();
                }
                let line = text[line_start..line_end].to_vec();
                let id = self.lines.len() as u32;
                self.lines.push(line.clone());
                self.ids.insert(line, id);
                encoded.push(id);
            }

            line_start = line_end;
        }

        encoded
    }

    /// Expand id diffs back into text diffs
    pub fn decode(&self, diffs: Vec<Diff<u32>>) -> Vec<Diff> {
        diffs
            .into_iter()
            .map(|diff| {
                let text = diff
                    .text
                    .iter()
                    .flat_map(|&id| self.lines[id as usize].iter().copied())
                    .collect();
                Diff::new(diff.op, text)
            })
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
