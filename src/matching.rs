//! Fuzzy location of a pattern inside a larger text, built on the Bitap
//! algorithm. Used on its own and by patch application to re-anchor hunks in
//! drifted text.

use crate::utils::{index_of, last_index_of};
use hashbrown::HashMap;

/// Patterns longer than this fall outside the bit-parallel machine word and
/// are located by exact search only.
pub(crate) const MAX_BITS: usize = 32;

/// A set of options for modifying the way a fuzzy match is performed
///
/// ```
/// use driftpatch::MatchOptions;
///
/// let mut options = MatchOptions::new();
/// options.set_threshold(0.8);
/// assert_eq!(options.locate("abcdefghijk", "fgh", 5), Some(5));
/// ```
#[derive(Clone, Debug)]
pub struct MatchOptions {
    threshold: f64,
    balance: f64,
    min_length: usize,
    max_length: usize,
}

impl MatchOptions {
    /// Construct a new `MatchOptions` with default settings
    ///
    /// ## Defaults
    /// * threshold = 0.5
    /// * balance = 0.5
    /// * min_length = 100
    /// * max_length = 1000
    pub fn new() -> Self {
        Self {
            threshold: 0.5,
            balance: 0.5,
            min_length: 100,
            max_length: 1000,
        }
    }

    /// Set how far from a perfect match a candidate may score and still be
    /// accepted. 0.0 demands exactness, 1.0 accepts nearly anything.
    ///
    /// # Panics
    /// Panics if `threshold` is outside `0.0..=1.0`.
    pub fn set_threshold(&mut self, threshold: f64) -> &mut Self {
        assert!(
            (0.0..=1.0).contains(&threshold),
            "threshold must be between 0.0 and 1.0"
        );
        self.threshold = threshold;
        self
    }

    /// Set the weighting between match accuracy and proximity to the
    /// expected location. Values near 1.0 care mostly about accuracy, values
    /// near 0.0 mostly about proximity.
    ///
    /// # Panics
    /// Panics if `balance` is not strictly between 0.0 and 1.0.
    pub fn set_balance(&mut self, balance: f64) -> &mut Self {
        assert!(
            balance > 0.0 && balance < 1.0,
            "balance must be strictly between 0.0 and 1.0"
        );
        self.balance = balance;
        self
    }

    /// Set the floor used when normalizing proximity by text length.
    pub fn set_min_length(&mut self, min_length: usize) -> &mut Self {
        self.min_length = min_length;
        self
    }

    /// Set the ceiling used when normalizing proximity by text length.
    pub fn set_max_length(&mut self, max_length: usize) -> &mut Self {
        self.max_length = max_length;
        self
    }

    /// Find the position in `text` best matching `pattern` near the expected
    /// offset `loc` (in chars). `None` means no location scored under the
    /// threshold.
    pub fn locate(&self, text: &str, pattern: &str, loc: usize) -> Option<usize> {
        let text: Vec<char> = text.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        locate_chars(&text, &pattern, loc, self)
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the position in `text` best matching `pattern` near `loc`, with
/// default [`MatchOptions`].
pub fn locate(text: &str, pattern: &str, loc: usize) -> Option<usize> {
    MatchOptions::new().locate(text, pattern, loc)
}

pub(crate) fn locate_chars(
    text: &[char],
    pattern: &[char],
    loc: usize,
    options: &MatchOptions,
) -> Option<usize> {
    let loc = loc.min(text.len());
    if text == pattern {
        // Shortcut which also covers two empty texts.
        return Some(0);
    }
    if text.is_empty() {
        return None;
    }
    if loc + pattern.len() <= text.len() && &text[loc..loc + pattern.len()] == pattern {
        // Perfect match at the expected position; also covers an empty
        // pattern.
        return Some(loc);
    }
    if pattern.len() > MAX_BITS {
        // Too wide for the bit-parallel sweep; settle for the nearest exact
        // occurrence.
        return match (
            index_of(text, pattern, loc),
            last_index_of(text, pattern, loc + pattern.len()),
        ) {
            (Some(after), Some(before)) => {
                if after - loc < loc.saturating_sub(before) {
                    Some(after)
                } else {
                    Some(before)
                }
            }
            (hit, None) | (None, hit) => hit,
        };
    }
    bitap(text, pattern, loc, options)
}

fn bitap(text: &[char], pattern: &[char], loc: usize, options: &MatchOptions) -> Option<usize> {
    debug_assert!(!pattern.is_empty() && pattern.len() <= MAX_BITS);

    let score = |errors: usize, at: usize| -> f64 {
        let accuracy = errors as f64 / pattern.len() as f64;
        let proximity = loc.abs_diff(at) as f64
            / text.len().clamp(options.min_length, options.max_length) as f64;
        accuracy / options.balance + proximity / (1.0 - options.balance)
    };

    // Exact occurrences on either side of `loc` tighten the bar every fuzzy
    // candidate has to clear.
    let mut score_threshold = options.threshold;
    if let Some(at) = index_of(text, pattern, loc) {
        score_threshold = score(0, at).min(score_threshold);
        if let Some(at) = last_index_of(text, pattern, loc + pattern.len()) {
            score_threshold = score(0, at).min(score_threshold);
        }
    }

    // One bit per pattern position, per char of the alphabet.
    let mut alphabet: HashMap<char, u64> = HashMap::new();
    for (i, &c) in pattern.iter().enumerate() {
        *alphabet.entry(c).or_insert(0) |= 1 << (pattern.len() - i - 1);
    }
    let matchmask = 1u64 << (pattern.len() - 1);

    let mut best_loc = None;
    let mut bin_max = pattern.len() + text.len();
    let mut last_rd: Vec<u64> = Vec::new();

    for d in 0..pattern.len() {
        // Widest window around `loc` where a match with `d` errors could
        // still score under the threshold.
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if score(d, loc + bin_mid) <= score_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let mut start = (loc + 1).saturating_sub(bin_mid).max(1);
        let finish = (loc + bin_mid).min(text.len()) + pattern.len();

        let mut rd = vec![0u64; finish + 2];
        rd[finish + 1] = (1 << d) - 1;
        let mut j = finish;
        while j >= start {
            let char_match = if j > text.len() {
                0
            } else {
                alphabet.get(&text[j - 1]).copied().unwrap_or(0)
            };
            rd[j] = if d == 0 {
                ((rd[j + 1] << 1) | 1) & char_match
            } else {
                (((rd[j + 1] << 1) | 1) & char_match)
                    | (((last_rd[j + 1] | last_rd[j]) << 1) | 1)
                    | last_rd[j + 1]
            };
            if rd[j] & matchmask != 0 {
                let candidate = score(d, j - 1);
                // The match ends before `loc`, so the score climbs from here
                // on; a worse candidate means the sweep can stop.
                if candidate <= score_threshold {
                    score_threshold = candidate;
                    best_loc = Some(j - 1);
                    if j - 1 > loc {
                        // Ahead of the expected location; mirror the window
                        // and keep sweeping backwards.
                        start = (2 * loc + 1).saturating_sub(j).max(1);
                    } else {
                        break;
                    }
                }
            }
            j -= 1;
        }

        // One more error can't possibly score better than what we have.
        if score(d + 1, loc) > score_threshold {
            break;
        }
        last_rd = rd;
    }

    best_loc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_shortcuts() {
        assert_eq!(locate("abcdef", "abcdef", 1000), Some(0));
        assert_eq!(locate("", "abcdef", 1), None);
        assert_eq!(locate("abcdef", "", 3), Some(3));
        assert_eq!(locate("abcdef", "de", 3), Some(3));
    }

    #[test]
    fn fuzzy_near_the_expected_location() {
        assert_eq!(locate("abcdefghijk", "fgh", 5), Some(5));
        assert_eq!(locate("abcdefghijk", "fgh", 0), Some(5));
        // One substitution within threshold.
        assert_eq!(locate("abcdefghijk", "efxhi", 5), Some(4));
    }

    #[test]
    fn rejects_matches_over_the_threshold() {
        assert_eq!(locate("abcdefghijk", "bxy", 1), None);

        let mut options = MatchOptions::new();
        options.set_threshold(0.4);
        assert_eq!(options.locate("abcdefghijk", "efxhi", 5), None);
    }

    #[test]
    fn threshold_zero_demands_exactness() {
        let mut options = MatchOptions::new();
        options.set_threshold(0.0);
        assert_eq!(options.locate("abcdefghijk", "fgh", 5), Some(5));
        assert_eq!(options.locate("abcdefghijk", "fgi", 5), None);
    }

    #[test]
    fn oversized_patterns_use_exact_search() {
        let pattern = "abcdefghijklmnopqrstuvwxyz0123456789";
        assert!(pattern.len() > MAX_BITS);

        let text = format!("prefix {pattern} suffix");
        assert_eq!(locate(&text, pattern, 0), Some(7));
        assert_eq!(locate(&text, pattern, 40), Some(7));

        let fuzzed = format!("prefix {} suffix", pattern.replace('m', "M"));
        assert_eq!(locate(&fuzzed, pattern, 0), None);
    }

    #[test]
    fn unicode_offsets_count_chars() {
        assert_eq!(locate("ééé abc", "abc", 0), Some(4));
    }
}
