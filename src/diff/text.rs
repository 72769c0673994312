//! Prefix, suffix and overlap measurement over token slices
//!
//! Every function here works on `&[T]` so the same code serves character
//! diffs and the line-id diffs produced by line mode.

/// Number of tokens common to the start of both slices
pub fn common_prefix<T: PartialEq>(text1: &[T], text2: &[T]) -> usize {
    text1
        .iter()
        .zip(text2.iter())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Number of tokens common to the end of both slices
pub fn common_suffix<T: PartialEq>(text1: &[T], text2: &[T]) -> usize {
    text1
        .iter()
        .rev()
        .zip(text2.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Length of the longest suffix of `text1` that is also a prefix of `text2`
///
/// # Example
/// ```
/// use textdelta::diff::text::common_overlap;
///
/// let a: Vec<char> = "123456xxx".chars().collect();
/// let b: Vec<char> = "xxxabcd".chars().collect();
/// assert_eq!(common_overlap(&a, &b), 3);
/// ```
pub fn common_overlap<T: PartialEq>(text1: &[T], text2: &[T]) -> usize {
    if text1.is_empty() || text2.is_empty() {
        return 0;
    }

    // Only the tail of text1 and the head of text2 can take part.
    let text_length = text1.len().min(text2.len());
    let text1 = &text1[text1.len() - text_length..];
    let text2 = &text2[..text_length];

    if text1 == text2 {
        return text_length;
    }

    // Grow a candidate suffix one token at a time, jumping ahead to the next
    // place it occurs in text2.
    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &text1[text_length - length..];
        let Some(found) = find(text2, pattern, 0) else {
            return best;
        };

        length += found;
        if length > text_length {
            return best;
        }
        if found == 0 || text1[text_length - length..] == text2[..length] {
            best = length;
            length += 1;
            if length > text_length {
                return best;
            }
        }
    }
}

/// Index of the first occurrence of `needle` in `haystack` at or after `from`
pub fn find<T: PartialEq>(haystack: &[T], needle: &[T], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    if needle.len() > haystack.len() - from {
        return None;
    }

    let first = &needle[0];
    let last_start = haystack.len() - needle.len();
    (from..=last_start)
        .find(|&i| haystack[i] == *first && haystack[i..i + needle.len()] == *needle)
}

/// Index of the last occurrence of `needle` in `haystack` starting at or
/// before `until`
pub fn rfind<T: PartialEq>(haystack: &[T], needle: &[T], until: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last_start = (haystack.len() - needle.len()).min(until);
    (0..=last_start)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}
