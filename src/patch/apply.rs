//! Patch application
//!
//! Each patch is located fuzzily near where it is expected, so patches still
//! apply after the target text has drifted. A running `delta` tracks how far
//! actual locations have moved from recorded ones.

use super::Patch;
use crate::Engine;
use crate::diff::cleanup::cleanup_semantic_lossless;
use crate::diff::{Diff, Operation, destination_chars, levenshtein, source_chars, x_index};
use crate::matcher::MATCH_MAX_BITS;
use metrics::counter;
use std::collections::VecDeque;
use tracing::debug;

impl Engine {
    /// Apply `patches` to `text`
    ///
    /// Returns the patched text and one flag per patch in `patches`. A patch
    /// that had to be split to fit the matcher counts as applied only if
    /// every piece applied. The patches themselves are left untouched.
    ///
    /// # Example
    /// ```
    /// use textdelta::Engine;
    ///
    /// let engine = Engine::default();
    /// let patches = engine.patch_make_from_texts("The cat sat.", "The dog sat.");
    /// let (text, applied) = engine.patch_apply(&patches, "Yesterday The cat sat.");
    /// assert_eq!(text, "Yesterday The dog sat.");
    /// assert_eq!(applied, vec![true]);
    /// ```
    pub fn patch_apply(&self, patches: &[Patch], text: &str) -> (String, Vec<bool>) {
        if patches.is_empty() {
            return (text.to_string(), Vec::new());
        }

        let mut applied = vec![true; patches.len()];
        let mut patches = patches.to_vec();
        let padding = self.patch_add_padding(&mut patches);
        let origins = self.patch_split_max(&mut patches);

        let mut padded = padding.clone();
        padded.extend(text.chars());
        padded.extend_from_slice(&padding);
        let mut text = padded;
        let mut delta: isize = 0;

        for (index, patch) in patches.iter().enumerate() {
            let expected_loc = patch.start2 as isize + delta;
            match self.apply_one(patch, &mut text, expected_loc) {
                Ok(start_loc) => {
                    delta = start_loc as isize - expected_loc;
                    counter!("textdelta_patches_applied_total").increment(1);
                }
                Err(reason) => {
                    applied[origins[index]] = false;
                    // Keep later expected locations in line with the source.
                    delta -= patch.length2 as isize - patch.length1 as isize;
                    counter!("textdelta_patches_failed_total").increment(1);
                    debug!(
                        patch = origins[index],
                        piece = index,
                        expected_loc,
                        reason,
                        "patch did not apply"
                    );
                }
            }
        }

        let end = text.len().saturating_sub(padding.len());
        let text: String = text[padding.len().min(end)..end].iter().collect();
        (text, applied)
    }

    /// Find and apply one patch, returning where it landed
    fn apply_one(
        &self,
        patch: &Patch,
        text: &mut Vec<char>,
        expected_loc: isize,
    ) -> Result<usize, &'static str> {
        let expected = expected_loc.max(0) as usize;
        let source = source_chars(&patch.diffs);

        let mut end_loc = None;
        let start_loc = if source.len() > MATCH_MAX_BITS {
            // Too long for bitap: match the head and tail separately.
            let start = self
                .locate(text, &source[..MATCH_MAX_BITS], expected)
                .ok_or("head of patch not found")?;
            let tail_expected = expected + source.len() - MATCH_MAX_BITS;
            let end = self
                .locate(text, &source[source.len() - MATCH_MAX_BITS..], tail_expected)
                .filter(|&end| end > start)
                .ok_or("tail of patch not found after head")?;
            end_loc = Some(end);
            start
        } else {
            self.locate(text, &source, expected)
                .ok_or("patch not found")?
        };

        let window_end = match end_loc {
            Some(end) => end + MATCH_MAX_BITS,
            None => start_loc + source.len(),
        }
        .min(text.len());
        let found = text[start_loc..window_end].to_vec();

        if found == source {
            text.splice(
                start_loc..start_loc + source.len(),
                destination_chars(&patch.diffs),
            );
            return Ok(start_loc);
        }

        // Imperfect match: diff the expected source against what is there and
        // replay only the edits through that mapping.
        let mut diffs = self.diff_tokens(&source, &found, false, self.deadline());
        if source.len() > MATCH_MAX_BITS
            && levenshtein(&diffs) as f64 / source.len() as f64
                > self.config.patch_delete_threshold
        {
            return Err("match too far from expected text");
        }

        cleanup_semantic_lossless(&mut diffs);
        let mut index1 = 0;
        for diff in &patch.diffs {
            if diff.op != Operation::Equal {
                let index2 = x_index(&diffs, index1);
                let at = (start_loc + index2).min(text.len());
                match diff.op {
                    Operation::Insert => {
                        text.splice(at..at, diff.text.iter().copied());
                    }
                    Operation::Delete => {
                        let deleted = x_index(&diffs, index1 + diff.text.len()) - index2;
                        let end = (at + deleted).min(text.len());
                        text.drain(at..end);
                    }
                    Operation::Equal => {}
                }
            }
            if diff.op != Operation::Delete {
                index1 += diff.text.len();
            }
        }

        Ok(start_loc)
    }

    /// Pad both ends of the patch list with `patch_margin` control chars so
    /// edits at the very start or end of a text have context to match
    ///
    /// Returns the padding, which the caller must also add around the text.
    pub fn patch_add_padding(&self, patches: &mut [Patch]) -> Vec<char> {
        let margin = self.config.patch_margin;
        // Validated config keeps the margin well under 0x20.
        let padding: Vec<char> = (1..=margin as u8).map(char::from).collect();

        for patch in patches.iter_mut() {
            patch.start1 += margin;
            patch.start2 += margin;
        }

        if let Some(patch) = patches.first_mut() {
            match patch.diffs.first_mut() {
                Some(first) if first.op == Operation::Equal => {
                    if first.text.len() < margin {
                        let extra = margin - first.text.len();
                        first.text.splice(0..0, padding[first.text.len()..].iter().copied());
                        patch.start1 -= extra;
                        patch.start2 -= extra;
                        patch.length1 += extra;
                        patch.length2 += extra;
                    }
                }
                _ => {
                    patch.diffs.insert(0, Diff::new(Operation::Equal, padding.clone()));
                    patch.start1 -= margin;
                    patch.start2 -= margin;
                    patch.length1 += margin;
                    patch.length2 += margin;
                }
            }
        }

        if let Some(patch) = patches.last_mut() {
            match patch.diffs.last_mut() {
                Some(last) if last.op == Operation::Equal => {
                    if last.text.len() < margin {
                        let extra = margin - last.text.len();
                        last.text.extend_from_slice(&padding[..extra]);
                        patch.length1 += extra;
                        patch.length2 += extra;
                    }
                }
                _ => {
                    patch.diffs.push(Diff::new(Operation::Equal, padding.clone()));
                    patch.length1 += margin;
                    patch.length2 += margin;
                }
            }
        }

        padding
    }

    /// Split every patch whose source span is too long for the matcher into
    /// overlapping pieces
    ///
    /// Returns, for each resulting patch, the index of the patch it came from.
    pub fn patch_split_max(&self, patches: &mut Vec<Patch>) -> Vec<usize> {
        let margin = self.config.patch_margin;
        let patch_size = MATCH_MAX_BITS;
        let mut split = Vec::with_capacity(patches.len());
        let mut origins = Vec::with_capacity(patches.len());

        for (origin, big) in std::mem::take(patches).into_iter().enumerate() {
            if big.length1 <= patch_size {
                split.push(big);
                origins.push(origin);
                continue;
            }

            let mut start1 = big.start1;
            let mut start2 = big.start2;
            let mut rest: VecDeque<Diff> = big.diffs.into();
            let mut precontext: Vec<char> = Vec::new();

            while !rest.is_empty() {
                let mut patch = Patch {
                    start1: start1.saturating_sub(precontext.len()),
                    start2: start2.saturating_sub(precontext.len()),
                    ..Patch::default()
                };
                let mut empty = true;
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch
                        .diffs
                        .push(Diff::new(Operation::Equal, std::mem::take(&mut precontext)));
                }

                while patch.length1 < patch_size.saturating_sub(margin) {
                    let Some(next) = rest.front_mut() else {
                        break;
                    };

                    if next.op == Operation::Insert {
                        patch.length2 += next.text.len();
                        start2 += next.text.len();
                        empty = false;
                        if let Some(diff) = rest.pop_front() {
                            patch.diffs.push(diff);
                        }
                    } else if next.op == Operation::Delete
                        && patch.diffs.len() == 1
                        && patch.diffs[0].op == Operation::Equal
                        && next.text.len() > 2 * patch_size
                    {
                        // A huge deletion goes in whole.
                        patch.length1 += next.text.len();
                        start1 += next.text.len();
                        empty = false;
                        if let Some(diff) = rest.pop_front() {
                            patch.diffs.push(diff);
                        }
                    } else {
                        let take = next
                            .text
                            .len()
                            .min(patch_size.saturating_sub(patch.length1 + margin));
                        let piece: Vec<char> = next.text.drain(..take).collect();
                        patch.length1 += piece.len();
                        start1 += piece.len();
                        if next.op == Operation::Equal {
                            patch.length2 += piece.len();
                            start2 += piece.len();
                        } else {
                            empty = false;
                        }
                        let op = next.op;
                        if next.text.is_empty() {
                            rest.pop_front();
                        }
                        patch.diffs.push(Diff::new(op, piece));
                    }
                }

                // Context for the next piece: the tail of this one's result.
                let produced = destination_chars(&patch.diffs);
                precontext = produced[produced.len().saturating_sub(margin)..].to_vec();

                // Context after this piece: the head of what remains.
                let remaining: Vec<char> = rest
                    .iter()
                    .filter(|d| d.op != Operation::Insert)
                    .flat_map(|d| d.text.iter().copied())
                    .take(margin)
                    .collect();
                if !remaining.is_empty() {
                    patch.length1 += remaining.len();
                    patch.length2 += remaining.len();
                    match patch.diffs.last_mut() {
                        Some(last) if last.op == Operation::Equal => {
                            last.text.extend(remaining);
                        }
                        _ => patch.diffs.push(Diff::new(Operation::Equal, remaining)),
                    }
                }

                if !empty {
                    split.push(patch);
                    origins.push(origin);
                }
            }
        }

        *patches = split;
        origins
    }
}
