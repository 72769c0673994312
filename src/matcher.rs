//! Fuzzy matching with the bitap algorithm
//!
//! [`Engine::match_main`] finds the best approximate occurrence of a pattern
//! near an expected location. Each candidate is scored by
//!
//! ```text
//! errors / pattern_len + |found - expected| / match_distance
//! ```
//!
//! and the lowest score at or under `match_threshold` wins. The bitmasks are
//! one machine word wide, so bitap itself is limited to patterns of
//! [`MATCH_MAX_BITS`] chars.

use crate::Engine;
use crate::diff::text::{find, rfind};
use std::collections::HashMap;
use thiserror::Error;

/// Bit width of the bitap masks, and so the longest pattern bitap accepts
pub const MATCH_MAX_BITS: usize = 32;

/// Fuzzy match errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Pattern does not fit in the bitap masks and is not an exact match
    #[error("Pattern too long: {length} chars (max: {max})")]
    PatternTooLong {
        /// Pattern length in chars
        length: usize,
        /// Longest supported pattern
        max: usize,
    },
}

impl Engine {
    /// Locate the best instance of `pattern` in `text` near `loc`
    ///
    /// `loc` is a char offset and is clamped to the text length. Returns
    /// `Ok(None)` when no candidate scores within `match_threshold`.
    ///
    /// # Errors
    /// [`MatchError::PatternTooLong`] when the pattern is longer than
    /// [`MATCH_MAX_BITS`] and does not occur exactly at `loc`.
    ///
    /// # Example
    /// ```
    /// use textdelta::Engine;
    ///
    /// let engine = Engine::default();
    /// assert_eq!(engine.match_main("abcdef", "defy", 4).unwrap(), Some(3));
    /// assert_eq!(engine.match_main("abcdef", "xyz", 0).unwrap(), None);
    /// ```
    pub fn match_main(
        &self,
        text: &str,
        pattern: &str,
        loc: usize,
    ) -> Result<Option<usize>, MatchError> {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        let loc = loc.min(text.len());

        if pattern.len() > MATCH_MAX_BITS
            && text != pattern
            && !text.is_empty()
            && !exact_at(&text, &pattern, loc)
        {
            return Err(MatchError::PatternTooLong {
                length: pattern.len(),
                max: MATCH_MAX_BITS,
            });
        }

        Ok(self.locate(&text, &pattern, loc))
    }

    /// Locate a pattern that is already known to fit in the bitap masks
    pub(crate) fn locate(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        let loc = loc.min(text.len());

        if text == pattern {
            return Some(0);
        }
        if text.is_empty() {
            return None;
        }
        if exact_at(text, pattern, loc) {
            return Some(loc);
        }

        self.bitap(text, pattern, loc)
    }

    fn bitap(&self, text: &[char], pattern: &[char], loc: usize) -> Option<usize> {
        debug_assert!(!pattern.is_empty() && pattern.len() <= MATCH_MAX_BITS);

        let alphabet = alphabet(pattern);
        let mut score_threshold = self.config.match_threshold;

        // Exact matches either side of loc bound the threshold up front.
        if let Some(found) = find(text, pattern, loc) {
            score_threshold = score_threshold.min(self.bitap_score(0, found, loc, pattern.len()));
            if let Some(found) = rfind(text, pattern, loc + pattern.len()) {
                score_threshold =
                    score_threshold.min(self.bitap_score(0, found, loc, pattern.len()));
            }
        }

        let match_mask = 1u32 << (pattern.len() - 1);
        let mut best_loc = None;
        let mut bin_max = pattern.len() + text.len();
        let mut last_rd: Vec<u32> = Vec::new();

        for d in 0..pattern.len() {
            // Widest window around loc that can still score under the threshold.
            let mut bin_min = 0;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if self.bitap_score(d, loc + bin_mid, loc, pattern.len()) <= score_threshold {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            bin_max = bin_mid;

            let mut start = (loc + 1).saturating_sub(bin_mid).max(1);
            let finish = (loc + bin_mid).min(text.len()) + pattern.len();

            let mut rd = vec![0u32; finish + 2];
            rd[finish + 1] = (1u32 << d) - 1;

            let mut j = finish;
            while j >= start {
                let char_match = text
                    .get(j - 1)
                    .and_then(|c| alphabet.get(c))
                    .copied()
                    .unwrap_or(0);

                rd[j] = if d == 0 {
                    ((rd[j + 1] << 1) | 1) & char_match
                } else {
                    (((rd[j + 1] << 1) | 1) & char_match)
                        | (((last_rd[j + 1] | last_rd[j]) << 1) | 1)
                        | last_rd[j + 1]
                };

                if rd[j] & match_mask != 0 {
                    let score = self.bitap_score(d, j - 1, loc, pattern.len());
                    if score <= score_threshold {
                        score_threshold = score;
                        let found = j - 1;
                        best_loc = Some(found);
                        if found > loc {
                            // Don't scan further right than the mirror image of this hit.
                            start = (2 * loc).saturating_sub(found).max(1);
                        } else {
                            break;
                        }
                    }
                }
                j -= 1;
            }

            // One more error can't beat the current best.
            if self.bitap_score(d + 1, loc, loc, pattern.len()) > score_threshold {
                break;
            }
            last_rd = rd;
        }

        best_loc
    }

    /// Score a candidate with `errors` mistakes found at `x`, lower is better
    fn bitap_score(&self, errors: usize, x: usize, loc: usize, pattern_len: usize) -> f64 {
        let accuracy = errors as f64 / pattern_len as f64;
        let proximity = loc.abs_diff(x);
        if self.config.match_distance == 0 {
            return if proximity == 0 { accuracy } else { 1.0 };
        }
        accuracy + proximity as f64 / self.config.match_distance as f64
    }
}

fn exact_at(text: &[char], pattern: &[char], loc: usize) -> bool {
    text.get(loc..loc + pattern.len()) == Some(pattern)
}

/// Bitmask of the positions each char occupies in the pattern
fn alphabet(pattern: &[char]) -> HashMap<char, u32> {
    let mut masks = HashMap::new();
    for (i, &c) in pattern.iter().enumerate() {
        *masks.entry(c).or_insert(0) |= 1u32 << (pattern.len() - i - 1);
    }
    masks
}
