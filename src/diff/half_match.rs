//! Half-match speedup: split a diff around a long shared run
//!
//! If both texts share a run at least half as long as the longer text, the
//! pieces before and after it can be diffed independently. The result may be
//! non-minimal, so the engine only uses this when a timeout is set.

use super::text::{common_prefix, common_suffix, find};

/// Both texts split around their shared run
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct HalfMatch<'a, T> {
    pub prefix1: &'a [T],
    pub suffix1: &'a [T],
    pub prefix2: &'a [T],
    pub suffix2: &'a [T],
    pub common: &'a [T],
}

impl<'a, T> HalfMatch<'a, T> {
    fn swap(self) -> Self {
        Self {
            prefix1: self.prefix2,
            suffix1: self.suffix2,
            prefix2: self.prefix1,
            suffix2: self.suffix1,
            common: self.common,
        }
    }
}

/// Look for a shared run at least half the length of the longer text
pub(crate) fn half_match<'a, T: PartialEq>(
    text1: &'a [T],
    text2: &'a [T],
) -> Option<HalfMatch<'a, T>> {
    let (long, short) = if text1.len() > text2.len() {
        (text1, text2)
    } else {
        (text2, text1)
    };
    if long.len() < 4 || short.len() * 2 < long.len() {
        return None;
    }

    // Seed from the second quarter, then from the third.
    let hm1 = half_match_at(long, short, long.len().div_ceil(4));
    let hm2 = half_match_at(long, short, long.len().div_ceil(2));

    let hm = match (hm1, hm2) {
        (None, None) => return None,
        (Some(hm), None) | (None, Some(hm)) => hm,
        (Some(hm1), Some(hm2)) => {
            if hm1.common.len() > hm2.common.len() {
                hm1
            } else {
                hm2
            }
        }
    };

    if text1.len() > text2.len() {
        Some(hm)
    } else {
        Some(hm.swap())
    }
}

/// Seed with the quarter-length run of `long` starting at `i` and grow every
/// occurrence of it in `short` as far as it extends both ways
fn half_match_at<'a, T: PartialEq>(
    long: &'a [T],
    short: &'a [T],
    i: usize,
) -> Option<HalfMatch<'a, T>> {
    let seed = &long[i..i + long.len() / 4];
    let mut best: Option<HalfMatch<'a, T>> = None;
    let mut best_len = 0;

    let mut next = find(short, seed, 0);
    while let Some(j) = next {
        let prefix_len = common_prefix(&long[i..], &short[j..]);
        let suffix_len = common_suffix(&long[..i], &short[..j]);

        if best_len < prefix_len + suffix_len {
            best_len = prefix_len + suffix_len;
            best = Some(HalfMatch {
                prefix1: &long[..i - suffix_len],
                suffix1: &long[i + prefix_len..],
                prefix2: &short[..j - suffix_len],
                suffix2: &short[j + prefix_len..],
                common: &short[j - suffix_len..j + prefix_len],
            });
        }

        next = find(short, seed, j + 1);
    }

    best.filter(|hm| hm.common.len() * 2 >= long.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn split(text1: &str, text2: &str) -> Option<[String; 5]> {
        let a = chars(text1);
        let b = chars(text2);
        half_match(&a, &b).map(|hm| {
            [
                hm.prefix1.iter().collect(),
                hm.suffix1.iter().collect(),
                hm.prefix2.iter().collect(),
                hm.suffix2.iter().collect(),
                hm.common.iter().collect(),
            ]
        })
    }

    #[test]
    fn test_no_match() {
        assert_eq!(split("1234567890", "abcdef"), None);
        assert_eq!(split("12345", "23"), None);
    }

    #[test]
    fn test_single_match() {
        assert_eq!(
            split("1234567890", "a345678z").unwrap(),
            ["12", "90", "a", "z", "345678"]
        );
        assert_eq!(
            split("a345678z", "1234567890").unwrap(),
            ["a", "z", "12", "90", "345678"]
        );
        assert_eq!(
            split("abc56789z", "1234567890").unwrap(),
            ["abc", "z", "1234", "0", "56789"]
        );
        assert_eq!(
            split("a23456xyz", "1234567890").unwrap(),
            ["a", "xyz", "1", "7890", "23456"]
        );
    }

    #[test]
    fn test_multiple_matches() {
        assert_eq!(
            split("121231234123451234123121", "a1234123451234z").unwrap(),
            ["12123", "123121", "a", "z", "1234123451234"]
        );
        assert_eq!(
            split("x-=-=-=-=-=-=-=-=-=-=-=-=", "xx-=-=-=-=-=-=-=").unwrap(),
            ["", "-=-=-=-=-=", "x", "", "x-=-=-=-=-=-=-="]
        );
        assert_eq!(
            split("-=-=-=-=-=-=-=-=-=-=-=-=y", "-=-=-=-=-=-=-=yy").unwrap(),
            ["-=-=-=-=-=", "", "", "y", "-=-=-=-=-=-=-=y"]
        );
    }

    #[test]
    fn test_non_optimal_split() {
        // Optimal diff would be -q+x=H-i+e=lloHe+Hu=llo-Hew+y, not -qHillo+x=HelloHe-w+Hulloy
        assert_eq!(
            split("qHilloHelloHew", "xHelloHeHulloy").unwrap(),
            ["qHillo", "w", "x", "Hulloy", "HelloHe"]
        );
    }
}
