//! Cleanup passes that rewrite an existing diff in place
//!
//! - [`cleanup_merge`]: canonical form, run after every other pass
//! - [`cleanup_semantic`]: trade minimality for human-readable edits
//! - [`cleanup_semantic_lossless`]: slide edits onto word and line boundaries
//! - [`cleanup_efficiency`]: drop short equalities that cost more than they save

use super::text::{common_overlap, common_prefix, common_suffix};
use super::{Diff, Operation};

/// Merge adjacent runs of the same operation and factor shared text out of
/// delete/insert pairs
///
/// Zero-length diffs are dropped. Any edit that can slide across a
/// neighbouring equality to absorb it completely is shifted, and the pass is
/// repeated until nothing moves.
///
/// # Example
/// ```
/// use textdelta::diff::{Diff, cleanup::cleanup_merge};
///
/// let mut diffs = vec![Diff::delete("a"), Diff::insert("abc"), Diff::delete("dc")];
/// cleanup_merge(&mut diffs);
/// assert_eq!(
///     diffs,
///     vec![Diff::equal("a"), Diff::delete("d"), Diff::insert("b"), Diff::equal("c")]
/// );
/// ```
pub fn cleanup_merge<T: PartialEq + Clone>(diffs: &mut Vec<Diff<T>>) {
    while merge_pass(diffs) {}
}

fn merge_pass<T: PartialEq + Clone>(diffs: &mut Vec<Diff<T>>) -> bool {
    diffs.retain(|d| !d.text.is_empty());

    // Sentinel equality so the last edit run gets flushed.
    diffs.push(Diff::new(Operation::Equal, Vec::new()));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<T> = Vec::new();
    let mut text_insert: Vec<T> = Vec::new();

    while pointer < diffs.len() {
        match diffs[pointer].op {
            Operation::Insert => {
                count_insert += 1;
                text_insert.extend_from_slice(&diffs[pointer].text);
                pointer += 1;
            }
            Operation::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&diffs[pointer].text);
                pointer += 1;
            }
            Operation::Equal => {
                if count_delete + count_insert > 1 {
                    let run_start = pointer - count_delete - count_insert;

                    if count_delete != 0 && count_insert != 0 {
                        let common = common_prefix(&text_insert, &text_delete);
                        if common != 0 {
                            let shared: Vec<T> = text_insert.drain(..common).collect();
                            text_delete.drain(..common);
                            if run_start > 0 && diffs[run_start - 1].op == Operation::Equal {
                                diffs[run_start - 1].text.extend(shared);
                            } else {
                                diffs.insert(0, Diff::new(Operation::Equal, shared));
                                pointer += 1;
                            }
                        }

                        let common = common_suffix(&text_insert, &text_delete);
                        if common != 0 {
                            let shared = text_insert.split_off(text_insert.len() - common);
                            text_delete.truncate(text_delete.len() - common);
                            diffs[pointer].text.splice(0..0, shared);
                        }
                    }

                    pointer -= count_delete + count_insert;
                    diffs.drain(pointer..pointer + count_delete + count_insert);

                    if !text_delete.is_empty() {
                        let text = std::mem::take(&mut text_delete);
                        diffs.insert(pointer, Diff::new(Operation::Delete, text));
                        pointer += 1;
                    }
                    if !text_insert.is_empty() {
                        let text = std::mem::take(&mut text_insert);
                        diffs.insert(pointer, Diff::new(Operation::Insert, text));
                        pointer += 1;
                    }

                    // Run factored away entirely: two equalities now touch.
                    if pointer > 0 && diffs[pointer - 1].op == Operation::Equal {
                        let text = diffs.remove(pointer).text;
                        diffs[pointer - 1].text.extend(text);
                    } else {
                        pointer += 1;
                    }
                } else if pointer != 0 && diffs[pointer - 1].op == Operation::Equal {
                    let text = diffs.remove(pointer).text;
                    diffs[pointer - 1].text.extend(text);
                } else {
                    pointer += 1;
                }

                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    if diffs.last().is_some_and(|d| d.text.is_empty()) {
        diffs.pop();
    }

    // Second pass: single edits between two equalities that can slide
    // sideways to swallow one of them.
    // e.g: A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Operation::Equal && diffs[pointer + 1].op == Operation::Equal {
            if diffs[pointer].text.ends_with(&diffs[pointer - 1].text) {
                let previous = diffs[pointer - 1].text.clone();
                let edit = &mut diffs[pointer].text;
                edit.truncate(edit.len() - previous.len());
                edit.splice(0..0, previous.iter().cloned());
                diffs[pointer + 1].text.splice(0..0, previous);
                diffs.remove(pointer - 1);
                changes = true;
            } else if diffs[pointer].text.starts_with(&diffs[pointer + 1].text) {
                let next = diffs.remove(pointer + 1).text;
                diffs[pointer - 1].text.extend_from_slice(&next);
                let edit = &mut diffs[pointer].text;
                edit.drain(..next.len());
                edit.extend(next);
                changes = true;
            }
        }
        pointer += 1;
    }

    changes
}

/// Eliminate equalities that are no longer than the edits on both sides of
/// them, then pull overlaps between adjacent deletions and insertions out
/// into equalities
///
/// Repeats until a round leaves the diff unchanged, so running it again on
/// its own output is a no-op.
pub fn cleanup_semantic(diffs: &mut Vec<Diff>) {
    // Capped at one round per entry of the input.
    for _ in 0..=diffs.len() {
        let before = diffs.clone();
        semantic_round(diffs);
        if *diffs == before {
            break;
        }
    }
}

fn semantic_round(diffs: &mut Vec<Diff>) {
    let mut changes = false;
    // Indices of equalities still eligible for elimination.
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer = 0;
    // Edit lengths before and after the last equality.
    let mut length_insertions1 = 0;
    let mut length_deletions1 = 0;
    let mut length_insertions2 = 0;
    let mut length_deletions2 = 0;

    while pointer < diffs.len() {
        if diffs[pointer].op == Operation::Equal {
            equalities.push(pointer);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(diffs[pointer].text.clone());
        } else {
            if diffs[pointer].op == Operation::Insert {
                length_insertions2 += diffs[pointer].text.len();
            } else {
                length_deletions2 += diffs[pointer].text.len();
            }

            let eliminate = last_equality.as_ref().is_some_and(|equality| {
                equality.len() <= length_insertions1.max(length_deletions1)
                    && equality.len() <= length_insertions2.max(length_deletions2)
            });

            if !eliminate {
                pointer += 1;
                continue;
            }
            if let (Some(equality), Some(&at)) = (last_equality.take(), equalities.last()) {
                // Duplicate the equality as a deletion and turn the original
                // into an insertion.
                diffs.insert(at, Diff::new(Operation::Delete, equality));
                diffs[at + 1].op = Operation::Insert;

                equalities.pop();
                // The equality before it may now be eliminable too.
                equalities.pop();
                length_insertions1 = 0;
                length_deletions1 = 0;
                length_insertions2 = 0;
                length_deletions2 = 0;
                changes = true;

                pointer = equalities.last().map_or(0, |&p| p + 1);
                continue;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);

    // Overlap extraction:
    //   -abcxxx +xxxdef -> -abc =xxx +def
    //   -xxxabc +defxxx -> +def =xxx -abc
    // The overlap must cover at least half of one of the two edits.
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].op == Operation::Delete && diffs[pointer].op == Operation::Insert {
            let deletion = diffs[pointer - 1].text.clone();
            let insertion = diffs[pointer].text.clone();
            let overlap1 = common_overlap(&deletion, &insertion);
            let overlap2 = common_overlap(&insertion, &deletion);

            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    diffs.insert(
                        pointer,
                        Diff::new(Operation::Equal, insertion[..overlap1].to_vec()),
                    );
                    diffs[pointer - 1].text = deletion[..deletion.len() - overlap1].to_vec();
                    diffs[pointer + 1].text = insertion[overlap1..].to_vec();
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                // Reverse overlap: swap the edits around the shared run.
                diffs.insert(
                    pointer,
                    Diff::new(Operation::Equal, deletion[..overlap2].to_vec()),
                );
                diffs[pointer - 1] = Diff::new(
                    Operation::Insert,
                    insertion[..insertion.len() - overlap2].to_vec(),
                );
                diffs[pointer + 1] = Diff::new(Operation::Delete, deletion[overlap2..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Slide single edits surrounded by equalities onto the most natural
/// boundary
///
/// e.g: `The c<ins>at c</ins>ame.` -> `The <ins>cat </ins>came.`
pub fn cleanup_semantic_lossless(diffs: &mut Vec<Diff>) {
    let mut pointer = 1;

    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Operation::Equal && diffs[pointer + 1].op == Operation::Equal {
            let mut equality1 = diffs[pointer - 1].text.clone();
            let mut edit = diffs[pointer].text.clone();
            let mut equality2 = diffs[pointer + 1].text.clone();

            // Shift the edit as far left as possible.
            let common = common_suffix(&equality1, &edit);
            if common > 0 {
                let shared = edit.split_off(edit.len() - common);
                equality1.truncate(equality1.len() - common);
                edit.splice(0..0, shared.iter().copied());
                equality2.splice(0..0, shared);
            }

            // Then step right one char at a time, keeping the best fit.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);

            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                let c = edit.remove(0);
                equality1.push(c);
                edit.push(equality2.remove(0));
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                // >= prefers trailing over leading whitespace on edits.
                if score >= best_score {
                    best_score = score;
                    best_equality1.clone_from(&equality1);
                    best_edit.clone_from(&edit);
                    best_equality2.clone_from(&equality2);
                }
            }

            if diffs[pointer - 1].text != best_equality1 {
                if best_equality1.is_empty() {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                } else {
                    diffs[pointer - 1].text = best_equality1;
                }
                diffs[pointer].text = best_edit;
                if best_equality2.is_empty() {
                    diffs.remove(pointer + 1);
                    pointer -= 1;
                } else {
                    diffs[pointer + 1].text = best_equality2;
                }
            }
        }
        pointer += 1;
    }
}

/// Score how well the boundary between `one` and `two` falls on a logical
/// break, from 6 (edge of text) down to 0 (mid-word)
fn semantic_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&char1), Some(&char2)) = (one.last(), two.first()) else {
        return 6;
    };

    let non_alphanumeric1 = !char1.is_alphanumeric();
    let non_alphanumeric2 = !char2.is_alphanumeric();
    let whitespace1 = non_alphanumeric1 && char1.is_whitespace();
    let whitespace2 = non_alphanumeric2 && char2.is_whitespace();
    let line_break1 = whitespace1 && char1.is_control();
    let line_break2 = whitespace2 && char2.is_control();
    let blank_line1 = line_break1 && ends_with_blank_line(one);
    let blank_line2 = line_break2 && starts_with_blank_line(two);

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alphanumeric1 && !whitespace1 && whitespace2 {
        // End of sentence.
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alphanumeric1 || non_alphanumeric2 {
        1
    } else {
        0
    }
}

fn ends_with_blank_line(text: &[char]) -> bool {
    text.ends_with(&['\n', '\n']) || text.ends_with(&['\n', '\r', '\n'])
}

fn starts_with_blank_line(text: &[char]) -> bool {
    let rest = text.strip_prefix(&['\r']).unwrap_or(text);
    let Some(rest) = rest.strip_prefix(&['\n']) else {
        return false;
    };
    let rest = rest.strip_prefix(&['\r']).unwrap_or(rest);
    rest.starts_with(&['\n'])
}

/// Eliminate equalities shorter than `edit_cost` that sit between edits,
/// when keeping them costs more than folding them into the edits
pub fn cleanup_efficiency<T: PartialEq + Clone>(diffs: &mut Vec<Diff<T>>, edit_cost: usize) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Vec<T> = Vec::new();
    let mut pointer = 0;
    // Edits seen before and after the last equality.
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while pointer < diffs.len() {
        if diffs[pointer].op == Operation::Equal {
            if diffs[pointer].text.len() < edit_cost && (post_ins || post_del) {
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = diffs[pointer].text.clone();
            } else {
                // Too long to ever be folded; nothing before it can be either.
                equalities.clear();
                last_equality.clear();
            }
            post_ins = false;
            post_del = false;
        } else {
            if diffs[pointer].op == Operation::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            // Fold when edits of both kinds sit on both sides, or when three
            // of the four sides carry edits and the equality is very short.
            let flags = [pre_ins, pre_del, post_ins, post_del]
                .iter()
                .filter(|&&f| f)
                .count();
            let split = !last_equality.is_empty()
                && ((pre_ins && pre_del && post_ins && post_del)
                    || (last_equality.len() < edit_cost / 2 && flags == 3));

            if let (true, Some(&at)) = (split, equalities.last()) {
                let equality = std::mem::take(&mut last_equality);
                diffs.insert(at, Diff::new(Operation::Delete, equality));
                diffs[at + 1].op = Operation::Insert;
                equalities.pop();
                changes = true;

                if pre_ins && pre_del {
                    // Nothing before this point can be affected.
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                } else {
                    equalities.pop();
                    post_ins = false;
                    post_del = false;
                    pointer = equalities.last().map_or(0, |&p| p + 1);
                    continue;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
}
