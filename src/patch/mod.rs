//! Patches: diff windows anchored to source and destination offsets
//!
//! A [`Patch`] carries the edits of one region plus enough surrounding
//! context to find that region again in a text that has since drifted.
//! Patches are built by [`Engine::patch_make`] and applied by
//! [`Engine::patch_apply`].

use crate::Engine;
use crate::diff::cleanup::cleanup_semantic;
use crate::diff::text::{find, rfind};
use crate::diff::{Diff, Operation};
use crate::matcher::MATCH_MAX_BITS;
use serde::{Deserialize, Serialize};

mod apply;

/// One hunk of edits with its context
///
/// `start1`/`start2` are zero-based char offsets into the source and
/// destination text. `length1` counts the chars of every non-insert diff and
/// `length2` those of every non-delete diff.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Edits and context, in order
    pub diffs: Vec<Diff>,
    /// Offset into the source text
    pub start1: usize,
    /// Offset into the destination text
    pub start2: usize,
    /// Chars consumed from the source text
    pub length1: usize,
    /// Chars produced in the destination text
    pub length2: usize,
}

impl Engine {
    /// Build patches that turn `text1` into the text described by `diffs`
    ///
    /// `diffs` must describe an edit of `text1`; they are not modified.
    ///
    /// # Example
    /// ```
    /// use textdelta::Engine;
    ///
    /// let engine = Engine::default();
    /// let diffs = engine.diff_main("The cat sat.", "The dog sat.");
    /// let patches = engine.patch_make("The cat sat.", &diffs);
    /// assert_eq!(patches.len(), 1);
    /// assert_eq!(patches[0].start1, 0);
    /// ```
    pub fn patch_make(&self, text1: &str, diffs: &[Diff]) -> Vec<Patch> {
        if diffs.is_empty() {
            return Vec::new();
        }

        let margin = self.config.patch_margin;
        let mut patches = Vec::new();
        let mut patch = Patch::default();
        let mut char_count1 = 0;
        let mut char_count2 = 0;
        // Context comes from the text as it looks before the current patch,
        // i.e. with every earlier patch already applied.
        let mut prepatch: Vec<char> = text1.chars().collect();
        let mut postpatch = prepatch.clone();

        for (index, diff) in diffs.iter().enumerate() {
            if patch.diffs.is_empty() && diff.op != Operation::Equal {
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }

            match diff.op {
                Operation::Insert => {
                    patch.diffs.push(diff.clone());
                    patch.length2 += diff.text.len();
                    postpatch.splice(char_count2..char_count2, diff.text.iter().copied());
                }
                Operation::Delete => {
                    patch.length1 += diff.text.len();
                    patch.diffs.push(diff.clone());
                    let end = (char_count2 + diff.text.len()).min(postpatch.len());
                    postpatch.drain(char_count2..end);
                }
                Operation::Equal => {
                    let len = diff.text.len();
                    if len <= 2 * margin && !patch.diffs.is_empty() && index != diffs.len() - 1 {
                        // Short equality inside a patch stays as context.
                        patch.diffs.push(diff.clone());
                        patch.length1 += len;
                        patch.length2 += len;
                    }

                    if len >= 2 * margin && !patch.diffs.is_empty() {
                        self.patch_add_context(&mut patch, &prepatch);
                        patches.push(std::mem::take(&mut patch));
                        prepatch.clone_from(&postpatch);
                        char_count1 = char_count2;
                    }
                }
            }

            if diff.op != Operation::Insert {
                char_count1 += diff.text.len();
            }
            if diff.op != Operation::Delete {
                char_count2 += diff.text.len();
            }
        }

        if !patch.diffs.is_empty() {
            self.patch_add_context(&mut patch, &prepatch);
            patches.push(patch);
        }

        patches
    }

    /// Diff two texts and build patches from the result
    ///
    /// The diff is semantically cleaned first so the patches read naturally.
    pub fn patch_make_from_texts(&self, text1: &str, text2: &str) -> Vec<Patch> {
        let mut diffs = self.diff_main(text1, text2);
        if diffs.len() > 2 {
            cleanup_semantic(&mut diffs);
            self.diff_cleanup_efficiency(&mut diffs);
        }
        self.patch_make(text1, &diffs)
    }

    /// Build patches from diffs alone, recovering the source text from them
    pub fn patch_make_from_diffs(&self, diffs: &[Diff]) -> Vec<Patch> {
        self.patch_make(&crate::diff::text1(diffs), diffs)
    }

    /// Grow the context around a patch until its source span is unique in
    /// `text`, or the context would no longer fit in a match pattern
    fn patch_add_context(&self, patch: &mut Patch, text: &[char]) {
        if text.is_empty() {
            return;
        }

        let margin = self.config.patch_margin;
        let max_pattern = MATCH_MAX_BITS.saturating_sub(2 * margin);
        let start = patch.start2.min(text.len());
        let span_end = |padding: usize| (start + patch.length1 + padding).min(text.len());

        // An empty pattern occurs everywhere, so pure insertions grow too.
        let mut padding = 0;
        let mut pattern = &text[start..span_end(0)];
        while find(text, pattern, 0) != rfind(text, pattern, text.len())
            && pattern.len() < max_pattern
        {
            padding += margin;
            pattern = &text[start.saturating_sub(padding)..span_end(padding)];
        }
        padding += margin;

        let prefix = text[start.saturating_sub(padding)..start].to_vec();
        let suffix = text[span_end(0)..span_end(padding)].to_vec();

        let prefix_len = prefix.len();
        let suffix_len = suffix.len();
        if prefix_len > 0 {
            patch.diffs.insert(0, Diff::new(Operation::Equal, prefix));
        }
        if suffix_len > 0 {
            patch.diffs.push(Diff::new(Operation::Equal, suffix));
        }

        patch.start1 = patch.start1.saturating_sub(prefix_len);
        patch.start2 = patch.start2.saturating_sub(prefix_len);
        patch.length1 += prefix_len + suffix_len;
        patch.length2 += prefix_len + suffix_len;
    }
}
