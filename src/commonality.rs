//! Shared-text primitives: common prefix/suffix lengths and the half-match
//! speedup used before falling back to a full diff.

use crate::utils::index_of;

/// Length (in chars) of the common prefix of `a` and `b`.
///
/// Binary search on the prefix length; each probe compares one slice pair.
pub(crate) fn common_prefix(a: &[char], b: &[char]) -> usize {
    let mut min = 0;
    let mut max = a.len().min(b.len());
    let mut mid = max;
    let mut start = 0;
    while min < mid {
        if a[start..mid] == b[start..mid] {
            min = mid;
            start = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

/// Length (in chars) of the common suffix of `a` and `b`.
pub(crate) fn common_suffix(a: &[char], b: &[char]) -> usize {
    let mut min = 0;
    let mut max = a.len().min(b.len());
    let mut mid = max;
    let mut end = 0;
    while min < mid {
        if a[a.len() - mid..a.len() - end] == b[b.len() - mid..b.len() - end] {
            min = mid;
            end = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

/// Byte length of the common char prefix of two strings.
pub(crate) fn common_prefix_bytes(a: &str, b: &str) -> usize {
    let mut last = 0;
    for ((i, ca), (_, cb)) in a.char_indices().zip(b.char_indices()) {
        if ca != cb {
            return i;
        }
        last = i + ca.len_utf8();
    }
    last
}

/// Byte length of the common char suffix of two strings.
pub(crate) fn common_suffix_bytes(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().rev().zip(b.chars().rev()) {
        if ca != cb {
            return len;
        }
        len += ca.len_utf8();
    }
    len
}

/// The two texts split around a shared middle at least half as long as the
/// longer text. Field order mirrors the split: `(prefix1, suffix1, prefix2,
/// suffix2, common)`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CommonMiddle<'a> {
    pub prefix1: &'a [char],
    pub suffix1: &'a [char],
    pub prefix2: &'a [char],
    pub suffix2: &'a [char],
    pub common: &'a [char],
}

/// Do the two texts share a substring which is at least half the length of
/// the longer text? Returns the split on success.
pub(crate) fn half_match<'a>(text1: &'a [char], text2: &'a [char]) -> Option<CommonMiddle<'a>> {
    let (long, short, swapped) = if text1.len() > text2.len() {
        (text1, text2, false)
    } else {
        (text2, text1, true)
    };
    if long.len() < 10 || short.len() * 2 < long.len() {
        return None;
    }

    // Check whether the second quarter or the second half of the longer text
    // seeds a sufficiently long shared run.
    let hm1 = half_match_at(long, short, (long.len() + 3) / 4);
    let hm2 = half_match_at(long, short, (long.len() + 1) / 2);
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

    if swapped {
        Some(CommonMiddle {
            prefix1: hm.prefix2,
            suffix1: hm.suffix2,
            prefix2: hm.prefix1,
            suffix2: hm.suffix1,
            common: hm.common,
        })
    } else {
        Some(hm)
    }
}

// Seed a quarter-length window of `long` at `i`, then grow every occurrence
// of the seed in `short` in both directions, keeping the longest run.
fn half_match_at<'a>(long: &'a [char], short: &'a [char], i: usize) -> Option<CommonMiddle<'a>> {
    let seed = &long[i..i + long.len() / 4];
    let mut best: Option<CommonMiddle<'a>> = None;
    let mut best_len = 0;

    let mut j = index_of(short, seed, 0);
    while let Some(at) = j {
        let prefix_len = common_prefix(&long[i..], &short[at..]);
        let suffix_len = common_suffix(&long[..i], &short[..at]);
        if best_len < suffix_len + prefix_len {
            best_len = suffix_len + prefix_len;
            best = Some(CommonMiddle {
                prefix1: &long[..i - suffix_len],
                suffix1: &long[i + prefix_len..],
                prefix2: &short[..at - suffix_len],
                suffix2: &short[at + prefix_len..],
                common: &short[at - suffix_len..at + prefix_len],
            });
        }
        j = index_of(short, seed, at + 1);
    }

    if best_len * 2 >= long.len() { best } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn prefix() {
        assert_eq!(common_prefix(&chars("abc"), &chars("xyz")), 0);
        assert_eq!(common_prefix(&chars("1234abcdef"), &chars("1234xyz")), 4);
        assert_eq!(common_prefix(&chars("1234"), &chars("1234xyz")), 4);
        assert_eq!(common_prefix(&chars(""), &chars("abc")), 0);
    }

    #[test]
    fn suffix() {
        assert_eq!(common_suffix(&chars("abc"), &chars("xyz")), 0);
        assert_eq!(common_suffix(&chars("abcdef1234"), &chars("xyz1234")), 4);
        assert_eq!(common_suffix(&chars("1234"), &chars("xyz1234")), 4);
    }

    #[test]
    fn byte_variants_respect_char_boundaries() {
        assert_eq!(common_prefix_bytes("héllo", "héllp"), "héll".len());
        assert_eq!(common_suffix_bytes("xé", "yé"), "é".len());
        assert_eq!(common_prefix_bytes("", "a"), 0);
    }

    #[test]
    fn half_match_none() {
        assert_eq!(half_match(&chars("1234567890"), &chars("abcdef")), None);
        // Too short to bother seeding.
        assert_eq!(half_match(&chars("12345"), &chars("23")), None);
    }

    #[test]
    fn half_match_found() {
        let a = chars("1234567890");
        let b = chars("a345678z");
        let hm = half_match(&a, &b).unwrap();
        assert_eq!(hm.prefix1, &chars("12")[..]);
        assert_eq!(hm.suffix1, &chars("90")[..]);
        assert_eq!(hm.prefix2, &chars("a")[..]);
        assert_eq!(hm.suffix2, &chars("z")[..]);
        assert_eq!(hm.common, &chars("345678")[..]);
    }

    #[test]
    fn half_match_swapped() {
        let a = chars("a345678z");
        let b = chars("1234567890");
        let hm = half_match(&a, &b).unwrap();
        assert_eq!(hm.prefix1, &chars("a")[..]);
        assert_eq!(hm.suffix1, &chars("z")[..]);
        assert_eq!(hm.prefix2, &chars("12")[..]);
        assert_eq!(hm.suffix2, &chars("90")[..]);
        assert_eq!(hm.common, &chars("345678")[..]);
    }
}
