//! Core diff computation
//!
//! [`Engine::diff_main`] strips the common prefix and suffix, then tries
//! cheap shortcuts before falling back to Myers' O(ND) bisection. Large texts
//! are first diffed line by line and the changed blocks refined char by char.

use super::cleanup::{cleanup_efficiency, cleanup_merge, cleanup_semantic};
use super::half_match::half_match;
use super::lines::LineTable;
use super::text::{common_prefix, common_suffix, find};
use super::{Diff, Operation, Token};
use crate::Engine;
use metrics::counter;
use std::time::Instant;
use tracing::{debug, trace};

/// Both texts must be longer than this before line mode is tried
const LINE_MODE_MIN_CHARS: usize = 100;

impl Engine {
    /// Find the differences between two texts
    ///
    /// Runs with line mode enabled and the configured timeout.
    ///
    /// # Example
    /// ```
    /// use textdelta::{Engine, diff::Diff};
    ///
    /// let engine = Engine::default();
    /// assert_eq!(engine.diff_main("a", "b"), vec![Diff::delete("a"), Diff::insert("b")]);
    /// ```
    pub fn diff_main(&self, text1: &str, text2: &str) -> Vec<Diff> {
        self.diff_main_with(text1, text2, true)
    }

    /// Find the differences between two texts, choosing whether long texts
    /// may be diffed line by line first
    ///
    /// Line mode is faster but may produce a slightly less optimal diff.
    pub fn diff_main_with(&self, text1: &str, text2: &str, line_mode: bool) -> Vec<Diff> {
        let text1: Vec<char> = text1.chars().collect();
        let text2: Vec<char> = text2.chars().collect();
        self.diff_tokens(&text1, &text2, line_mode, self.deadline())
    }

    /// Run Myers' bisection directly, without the prefix/suffix and shortcut
    /// passes
    ///
    /// If the configured timeout expires the result is a single deletion of
    /// `text1` followed by a single insertion of `text2`.
    pub fn diff_bisect(&self, text1: &str, text2: &str) -> Vec<Diff> {
        let text1: Vec<char> = text1.chars().collect();
        let text2: Vec<char> = text2.chars().collect();
        self.bisect(&text1, &text2, self.deadline())
    }

    /// Run efficiency cleanup using the configured edit cost
    pub fn diff_cleanup_efficiency(&self, diffs: &mut Vec<Diff>) {
        cleanup_efficiency(diffs, self.config.diff_edit_cost);
    }

    /// Wall-clock deadline for one top-level diff, `None` when unlimited
    pub(crate) fn deadline(&self) -> Option<Instant> {
        if self.config.diff_timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(self.config.diff_timeout)
        }
    }

    pub(crate) fn diff_tokens<T: Token>(
        &self,
        text1: &[T],
        text2: &[T],
        checklines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff<T>> {
        if text1 == text2 {
            if text1.is_empty() {
                return Vec::new();
            }
            return vec![Diff::new(Operation::Equal, text1.to_vec())];
        }

        let prefix_len = common_prefix(text1, text2);
        let prefix = &text1[..prefix_len];
        let text1 = &text1[prefix_len..];
        let text2 = &text2[prefix_len..];

        let suffix_len = common_suffix(text1, text2);
        let suffix = &text1[text1.len() - suffix_len..];
        let text1 = &text1[..text1.len() - suffix_len];
        let text2 = &text2[..text2.len() - suffix_len];

        let mut diffs = self.compute(text1, text2, checklines, deadline);

        if !prefix.is_empty() {
            diffs.insert(0, Diff::new(Operation::Equal, prefix.to_vec()));
        }
        if !suffix.is_empty() {
            diffs.push(Diff::new(Operation::Equal, suffix.to_vec()));
        }
        cleanup_merge(&mut diffs);
        diffs
    }

    /// Diff two texts that share no common prefix or suffix
    fn compute<T: Token>(
        &self,
        text1: &[T],
        text2: &[T],
        checklines: bool,
        deadline: Option<Instant>,
    ) -> Vec<Diff<T>> {
        if text1.is_empty() {
            return vec![Diff::new(Operation::Insert, text2.to_vec())];
        }
        if text2.is_empty() {
            return vec![Diff::new(Operation::Delete, text1.to_vec())];
        }

        let (long, short, op) = if text1.len() > text2.len() {
            (text1, text2, Operation::Delete)
        } else {
            (text2, text1, Operation::Insert)
        };

        if let Some(i) = find(long, short, 0) {
            // Shorter text sits inside the longer one.
            return vec![
                Diff::new(op, long[..i].to_vec()),
                Diff::new(Operation::Equal, short.to_vec()),
                Diff::new(op, long[i + short.len()..].to_vec()),
            ];
        }

        if short.len() == 1 {
            // Single token, not contained above: nothing in common.
            return vec![
                Diff::new(Operation::Delete, text1.to_vec()),
                Diff::new(Operation::Insert, text2.to_vec()),
            ];
        }

        // Half-match gives up optimality, so it only runs under a deadline.
        if deadline.is_some()
            && let Some(hm) = half_match(text1, text2)
        {
            trace!(common = hm.common.len(), "half-match split");
            let mut diffs = self.diff_tokens(hm.prefix1, hm.prefix2, checklines, deadline);
            diffs.push(Diff::new(Operation::Equal, hm.common.to_vec()));
            diffs.extend(self.diff_tokens(hm.suffix1, hm.suffix2, checklines, deadline));
            return diffs;
        }

        if checklines
            && text1.len() > LINE_MODE_MIN_CHARS
            && text2.len() > LINE_MODE_MIN_CHARS
            && let Some(diffs) = T::line_mode(self, text1, text2, deadline)
        {
            return diffs;
        }

        self.bisect(text1, text2, deadline)
    }

    /// Diff line by line, then refine each changed block char by char
    pub(crate) fn diff_line_mode(
        &self,
        text1: &[char],
        text2: &[char],
        deadline: Option<Instant>,
    ) -> Vec<Diff> {
        let (table, ids1, ids2) = LineTable::encode_pair(text1, text2);
        trace!(lines1 = ids1.len(), lines2 = ids2.len(), "diffing in line mode");

        let mut diffs = table.decode(self.diff_tokens(&ids1, &ids2, false, deadline));
        // Drop line-level coincidences such as blank lines.
        cleanup_semantic(&mut diffs);

        // Trailing empty equality flushes the last replacement block.
        diffs.push(Diff::new(Operation::Equal, Vec::new()));
        let mut pointer = 0;
        let mut count_delete = 0;
        let mut count_insert = 0;
        let mut text_delete: Vec<char> = Vec::new();
        let mut text_insert: Vec<char> = Vec::new();

        while pointer < diffs.len() {
            match diffs[pointer].op {
                Operation::Insert => {
                    count_insert += 1;
                    text_insert.extend_from_slice(&diffs[pointer].text);
                }
                Operation::Delete => {
                    count_delete += 1;
                    text_delete.extend_from_slice(&diffs[pointer].text);
                }
                Operation::Equal => {
                    if count_delete >= 1 && count_insert >= 1 {
                        let start = pointer - count_delete - count_insert;
                        let refined = self.diff_tokens(&text_delete, &text_insert, false, deadline);
                        let refined_len = refined.len();
                        diffs.splice(start..pointer, refined);
                        pointer = start + refined_len;
                    }
                    count_insert = 0;
                    count_delete = 0;
                    text_delete.clear();
                    text_insert.clear();
                }
            }
            pointer += 1;
        }
        diffs.pop();

        diffs
    }

    /// Find the middle snake of the edit graph and split the problem there
    ///
    /// Walks forward from the start and backward from the end one edit
    /// distance `d` at a time. The deadline is checked once per `d`.
    pub(crate) fn bisect<T: Token>(
        &self,
        text1: &[T],
        text2: &[T],
        deadline: Option<Instant>,
    ) -> Vec<Diff<T>> {
        match (text1.is_empty(), text2.is_empty()) {
            (true, true) => return Vec::new(),
            (true, false) => return vec![Diff::new(Operation::Insert, text2.to_vec())],
            (false, true) => return vec![Diff::new(Operation::Delete, text1.to_vec())],
            (false, false) => {}
        }

        let len1 = text1.len() as isize;
        let len2 = text2.len() as isize;
        let max_d = (len1 + len2 + 1) / 2;
        let v_offset = max_d;
        let v_length = 2 * max_d;
        // Two spare slots: with one token per side the seed lands past 2 * max_d.
        let mut v1 = vec![-1isize; v_length as usize + 2];
        let mut v2 = vec![-1isize; v_length as usize + 2];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;
        let delta = len1 - len2;
        // With an odd delta the forward path collides with the reverse one.
        let front = delta % 2 != 0;
        // Trim diagonals that ran off the edge of the grid.
        let mut k1start = 0;
        let mut k1end = 0;
        let mut k2start = 0;
        let mut k2end = 0;

        for d in 0..max_d {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                counter!("textdelta_bisect_timeouts_total").increment(1);
                debug!(
                    len1 = text1.len(),
                    len2 = text2.len(),
                    d,
                    "diff deadline expired, falling back to full replace"
                );
                break;
            }

            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = v_offset + k1;
                let mut x1 = if k1 == -d
                    || (k1 != d && v1[(k1_offset - 1) as usize] < v1[(k1_offset + 1) as usize])
                {
                    v1[(k1_offset + 1) as usize]
                } else {
                    v1[(k1_offset - 1) as usize] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < len1 && y1 < len2 && text1[x1 as usize] == text2[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset as usize] = x1;

                if x1 > len1 {
                    k1end += 2;
                } else if y1 > len2 {
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if (0..v_length).contains(&k2_offset) && v2[k2_offset as usize] != -1 {
                        // Mirror x2 onto the top-left coordinate system.
                        let x2 = len1 - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.bisect_split(
                                text1,
                                text2,
                                x1 as usize,
                                y1 as usize,
                                deadline,
                            );
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = v_offset + k2;
                let mut x2 = if k2 == -d
                    || (k2 != d && v2[(k2_offset - 1) as usize] < v2[(k2_offset + 1) as usize])
                {
                    v2[(k2_offset + 1) as usize]
                } else {
                    v2[(k2_offset - 1) as usize] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < len1
                    && y2 < len2
                    && text1[(len1 - x2 - 1) as usize] == text2[(len2 - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset as usize] = x2;

                if x2 > len1 {
                    k2end += 2;
                } else if y2 > len2 {
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if (0..v_length).contains(&k1_offset) && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        if x1 >= len1 - x2 {
                            return self.bisect_split(
                                text1,
                                text2,
                                x1 as usize,
                                y1 as usize,
                                deadline,
                            );
                        }
                    }
                }
                k2 += 2;
            }
        }

        // Out of time, or no commonality at all.
        vec![
            Diff::new(Operation::Delete, text1.to_vec()),
            Diff::new(Operation::Insert, text2.to_vec()),
        ]
    }

    fn bisect_split<T: Token>(
        &self,
        text1: &[T],
        text2: &[T],
        x: usize,
        y: usize,
        deadline: Option<Instant>,
    ) -> Vec<Diff<T>> {
        let mut diffs = self.diff_tokens(&text1[..x], &text2[..y], false, deadline);
        diffs.extend(self.diff_tokens(&text1[x..], &text2[y..], false, deadline));
        diffs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use crate::diff::{text1, text2};
    use proptest::prelude::*;
    use std::time::Duration;

    fn unlimited() -> Engine {
        Engine::builder()
            .diff_timeout(Duration::ZERO)
            .build()
            .unwrap()
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_trivial_cases() {
        let engine = unlimited();
        assert_eq!(engine.diff_main("", ""), vec![]);
        assert_eq!(engine.diff_main("abc", "abc"), vec![Diff::equal("abc")]);
        assert_eq!(
            engine.diff_main("abc", "ab123c"),
            vec![Diff::equal("ab"), Diff::insert("123"), Diff::equal("c")]
        );
        assert_eq!(
            engine.diff_main("a123bc", "abc"),
            vec![Diff::equal("a"), Diff::delete("123"), Diff::equal("bc")]
        );
        assert_eq!(
            engine.diff_main("abc", "a123b456c"),
            vec![
                Diff::equal("a"),
                Diff::insert("123"),
                Diff::equal("b"),
                Diff::insert("456"),
                Diff::equal("c"),
            ]
        );
        assert_eq!(
            engine.diff_main("a123b456c", "abc"),
            vec![
                Diff::equal("a"),
                Diff::delete("123"),
                Diff::equal("b"),
                Diff::delete("456"),
                Diff::equal("c"),
            ]
        );
    }

    #[test]
    fn test_single_char_replacement() {
        let engine = unlimited();
        let diffs = engine.diff_main("a", "b");
        assert_eq!(diffs, vec![Diff::delete("a"), Diff::insert("b")]);
        assert_eq!(crate::diff::levenshtein(&diffs), 1);
    }

    #[test]
    fn test_real_diffs() {
        let engine = unlimited();
        assert_eq!(
            engine.diff_main("Apples are a fruit.", "Bananas are also fruit."),
            vec![
                Diff::delete("Apple"),
                Diff::insert("Banana"),
                Diff::equal("s are a"),
                Diff::insert("lso"),
                Diff::equal(" fruit."),
            ]
        );
        assert_eq!(
            engine.diff_main("ax\t", "\u{0680}x\0"),
            vec![
                Diff::delete("a"),
                Diff::insert("\u{0680}"),
                Diff::equal("x"),
                Diff::delete("\t"),
                Diff::insert("\0"),
            ]
        );
        assert_eq!(
            engine.diff_main("1ayb2", "abxab"),
            vec![
                Diff::delete("1"),
                Diff::equal("a"),
                Diff::delete("y"),
                Diff::equal("b"),
                Diff::delete("2"),
                Diff::insert("xab"),
            ]
        );
        assert_eq!(
            engine.diff_main("abcy", "xaxcxabc"),
            vec![Diff::insert("xaxcx"), Diff::equal("abc"), Diff::delete("y")]
        );
        assert_eq!(
            engine.diff_main(
                "ABCDa=bcd=efghijklmnopqrsEFGHIJKLMNOefg",
                "a-bcd-efghijklmnopqrs"
            ),
            vec![
                Diff::delete("ABCD"),
                Diff::equal("a"),
                Diff::delete("="),
                Diff::insert("-"),
                Diff::equal("bcd"),
                Diff::delete("="),
                Diff::insert("-"),
                Diff::equal("efghijklmnopqrs"),
                Diff::delete("EFGHIJKLMNOefg"),
            ]
        );
        assert_eq!(
            engine.diff_main("a [[Pennsylvania]] and [[New", " and [[Pennsylvania]]"),
            vec![
                Diff::insert(" "),
                Diff::equal("a"),
                Diff::insert("nd"),
                Diff::equal(" [[Pennsylvania]]"),
                Diff::delete(" and [[New"),
            ]
        );
    }

    #[test]
    fn test_astral_chars_count_once() {
        let engine = unlimited();
        let diffs = engine.diff_main("a\u{1F600}b", "a\u{1F601}b");
        assert_eq!(
            diffs,
            vec![
                Diff::equal("a"),
                Diff::delete("\u{1F600}"),
                Diff::insert("\u{1F601}"),
                Diff::equal("b"),
            ]
        );
        assert_eq!(diffs[1].text.len(), 1);
    }

    #[test]
    fn test_bisect() {
        let engine = unlimited();
        assert_eq!(
            engine.diff_bisect("cat", "map"),
            vec![
                Diff::delete("c"),
                Diff::insert("m"),
                Diff::equal("a"),
                Diff::delete("t"),
                Diff::insert("p"),
            ]
        );
    }

    #[test]
    fn test_bisect_short_inputs() {
        let engine = Engine::default();
        assert_eq!(engine.diff_bisect("", ""), vec![]);
        assert_eq!(engine.diff_bisect("a", ""), vec![Diff::delete("a")]);
        assert_eq!(engine.diff_bisect("", "b"), vec![Diff::insert("b")]);
        assert_eq!(
            engine.diff_bisect("a", "b"),
            vec![Diff::delete("a"), Diff::insert("b")]
        );
        assert_eq!(
            engine.diff_bisect("ab", "b"),
            vec![Diff::delete("a"), Diff::equal("b")]
        );
    }

    #[test]
    fn test_bisect_expired_deadline() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let engine = unlimited();
        let diffs = engine.bisect(&chars("cat"), &chars("map"), Some(Instant::now()));
        assert_eq!(diffs, vec![Diff::delete("cat"), Diff::insert("map")]);
    }

    #[test]
    fn test_timeout_still_round_trips() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let engine = Engine::builder()
            .diff_timeout(Duration::from_millis(10))
            .build()
            .unwrap();

        let mut a = String::from(
            "`Twas brillig, and the slithy toves\nDid gyre and gimble in the wabe:\n\
             All mimsy were the borogoves,\nAnd the mome raths outgrabe.\n",
        );
        let mut b = String::from(
            "I am the very model of a modern major general,\nI've information vegetable, \
             animal, and mineral,\nI know the kings of England, and I quote the fights \
             historical,\nFrom Marathon to Waterloo, in order categorical.\n",
        );
        for _ in 0..8 {
            a = a.repeat(2);
            b = b.repeat(2);
        }

        let diffs = engine.diff_main_with(&a, &b, false);
        assert_eq!(text1(&diffs), a);
        assert_eq!(text2(&diffs), b);
    }

    #[test]
    fn test_line_mode_matches_char_mode() {
        let engine = unlimited();

        let a = "1234567890\n".repeat(13);
        let b = "abcdefghij\n".repeat(13);
        assert_eq!(engine.diff_main_with(&a, &b, false), engine.diff_main_with(&a, &b, true));

        let a = "1234567890".repeat(13);
        let b = "abcdefghij".repeat(13);
        assert_eq!(engine.diff_main_with(&a, &b, false), engine.diff_main_with(&a, &b, true));

        let a = "1234567890\n".repeat(13);
        let b = "abcdefghij\n1234567890\n1234567890\n1234567890\n".repeat(3) + "abcdefghij\n";
        let line_mode = engine.diff_main_with(&a, &b, true);
        let char_mode = engine.diff_main_with(&a, &b, false);
        assert_eq!(text1(&line_mode), text1(&char_mode));
        assert_eq!(text2(&line_mode), text2(&char_mode));
    }

    #[test]
    fn test_half_match_only_under_deadline() {
        let timed = Engine::builder()
            .config(EngineConfig {
                diff_timeout: Duration::from_secs(60),
                ..EngineConfig::default()
            })
            .build()
            .unwrap();
        // Half-match takes the non-optimal split.
        assert_eq!(
            timed.diff_main("qHilloHelloHew", "xHelloHeHulloy"),
            vec![
                Diff::delete("qHillo"),
                Diff::insert("x"),
                Diff::equal("HelloHe"),
                Diff::delete("w"),
                Diff::insert("Hulloy"),
            ]
        );

        let diffs = unlimited().diff_main("qHilloHelloHew", "xHelloHeHulloy");
        assert_eq!(text1(&diffs), "qHilloHelloHew");
        assert_eq!(text2(&diffs), "xHelloHeHulloy");
    }

    #[test]
    fn test_cleanup_efficiency_uses_edit_cost() {
        let engine = Engine::builder().diff_edit_cost(5).build().unwrap();
        let mut diffs = vec![
            Diff::delete("ab"),
            Diff::insert("12"),
            Diff::equal("wxyz"),
            Diff::delete("cd"),
            Diff::insert("34"),
        ];
        engine.diff_cleanup_efficiency(&mut diffs);
        assert_eq!(diffs, vec![Diff::delete("abwxyzcd"), Diff::insert("12wxyz34")]);
    }

    proptest! {
        #[test]
        fn test_diff_reproduces_both_texts(a in "[ab\n ]{0,60}", b in "[ab\n ]{0,60}") {
            let diffs = unlimited().diff_main(&a, &b);
            prop_assert_eq!(text1(&diffs), a);
            prop_assert_eq!(text2(&diffs), b);
        }

        #[test]
        fn test_diff_round_trip_any_text(a in any::<String>(), b in any::<String>()) {
            let diffs = Engine::default().diff_main(&a, &b);
            prop_assert_eq!(text1(&diffs), a);
            prop_assert_eq!(text2(&diffs), b);
        }

        #[test]
        fn test_diff_is_merged(a in "[abc]{0,30}", b in "[abc]{0,30}") {
            let diffs = unlimited().diff_main(&a, &b);
            let mut merged = diffs.clone();
            cleanup_merge(&mut merged);
            prop_assert_eq!(merged, diffs);
        }
    }
}
