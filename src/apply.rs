//! Apply a patch to a base text, tolerating drift between the base and the
//! text the patch was made from.

use crate::diff::{self, EditType, levenshtein, x_index};
use crate::matching::{MAX_BITS, locate_chars};
use crate::patch::{Patch, PatchOptions, add_padding, split_max};

/// Outcome of applying a patch: the rewritten text plus one success flag per
/// hunk. Failed hunks leave their region of the text untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyResult {
    text: String,
    results: Vec<bool>,
}

impl ApplyResult {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Success flags, one per hunk after oversized hunks were split.
    pub fn results(&self) -> &[bool] {
        &self.results
    }

    pub fn is_complete(&self) -> bool {
        self.results.iter().all(|&applied| applied)
    }
}

/// Apply `patch` to `base` with default [`PatchOptions`].
pub fn apply(base: &str, patch: &Patch) -> ApplyResult {
    PatchOptions::new().apply(base, patch)
}

impl PatchOptions {
    /// Apply `patch` to `base`. Each hunk is re-anchored with fuzzy matching,
    /// so the base may have drifted from the text the patch was made from.
    pub fn apply(&self, base: &str, patch: &Patch) -> ApplyResult {
        if patch.is_empty() {
            return ApplyResult {
                text: base.to_string(),
                results: Vec::new(),
            };
        }

        // Work on a padded copy so hunks at the edges have full context.
        let mut entries = patch.entries().to_vec();
        let null_padding = add_padding(&mut entries, self.margin);
        let mut text: Vec<char> = null_padding
            .chars()
            .chain(base.chars())
            .chain(null_padding.chars())
            .collect();
        split_max(&mut entries, self.margin);

        // Tracks how far the actual hunk positions have drifted from their
        // expected ones, so later hunks search near the right spot.
        let mut delta: isize = 0;
        let mut results = Vec::with_capacity(entries.len());

        for entry in &entries {
            let expected = (entry.target_start() as isize + delta).max(0) as usize;
            let source: Vec<char> = diff::source_text(entry.diffs()).chars().collect();

            let mut end_loc = None;
            let start_loc = if source.len() > MAX_BITS {
                // Too wide for one fuzzy search; anchor head and tail
                // separately.
                match locate_chars(&text, &source[..MAX_BITS], expected, &self.match_options) {
                    Some(start) => {
                        end_loc = locate_chars(
                            &text,
                            &source[source.len() - MAX_BITS..],
                            expected + source.len() - MAX_BITS,
                            &self.match_options,
                        );
                        match end_loc {
                            Some(end) if start < end => Some(start),
                            _ => None,
                        }
                    }
                    None => None,
                }
            } else {
                locate_chars(&text, &source, expected, &self.match_options)
            };

            let Some(start_loc) = start_loc else {
                results.push(false);
                delta -= entry.target_length() as isize - entry.source_length() as isize;
                continue;
            };

            delta = start_loc as isize - expected as isize;
            let found: Vec<char> = match end_loc {
                Some(end) => text[start_loc..(end + MAX_BITS).min(text.len())].to_vec(),
                None => text[start_loc..(start_loc + source.len()).min(text.len())].to_vec(),
            };

            if source == found {
                // Exact match; swap the whole region out.
                let target = diff::target_text(entry.diffs());
                text.splice(start_loc..start_loc + source.len(), target.chars());
                results.push(true);
                continue;
            }

            // Imperfect match. Diff the expected source against what is
            // actually there to build an index translation, then replay the
            // hunk's edits through it.
            let mut options = self.diff_options.clone();
            options.set_check_lines(false);
            let mut diffs = options.diff(
                &source.iter().collect::<String>(),
                &found.iter().collect::<String>(),
            );
            if source.len() > MAX_BITS
                && levenshtein(&diffs) as f64 / source.len() as f64 > self.delete_threshold
            {
                // The drift ate too much of the hunk to apply it safely.
                results.push(false);
                continue;
            }

            diff::cleanup::cleanup_semantic_lossless(&mut diffs);
            let mut index1 = 0;
            for diff in entry.diffs() {
                if diff.kind() != EditType::Equal {
                    let index2 = x_index(&diffs, index1);
                    match diff.kind() {
                        EditType::Insert => {
                            let at = (start_loc + index2).min(text.len());
                            text.splice(at..at, diff.text().chars());
                        }
                        EditType::Delete => {
                            let del_end = x_index(&diffs, index1 + diff.char_len());
                            let end = (start_loc + del_end).min(text.len());
                            let start = (start_loc + index2).min(end);
                            text.drain(start..end);
                        }
                        EditType::Equal => unreachable!(),
                    }
                }
                if diff.kind() != EditType::Delete {
                    index1 += diff.char_len();
                }
            }
            results.push(true);
        }

        // Strip the padding back off.
        let pad = null_padding.chars().count();
        let start = pad.min(text.len());
        let end = text.len().saturating_sub(pad).max(start);
        ApplyResult {
            text: text[start..end].iter().collect(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::create_patch;

    const FOX1: &str = "The quick brown fox jumps over the lazy dog.";
    const FOX2: &str = "That quick brown fox jumped over a lazy dog.";

    #[test]
    fn empty_patch_is_a_no_op() {
        let patch = Patch::default();
        let result = apply("Hello world.", &patch);
        assert_eq!(result.text(), "Hello world.");
        assert_eq!(result.results(), &[] as &[bool]);
        assert!(result.is_complete());
    }

    #[test]
    fn exact_application() {
        let patch = create_patch(FOX1, FOX2);
        let result = apply(FOX1, &patch);
        assert_eq!(result.text(), FOX2);
        assert_eq!(result.results(), &[true, true]);
    }

    #[test]
    fn drifted_base_still_applies() {
        let patch = create_patch(FOX1, FOX2);
        let result = apply("The quick red rabbit jumps over the tired tiger.", &patch);
        assert_eq!(
            result.text(),
            "That quick red rabbit jumped over a tired tiger."
        );
        assert_eq!(result.results(), &[true, true]);
        assert!(result.is_complete());
    }

    #[test]
    fn unrelated_base_is_left_unchanged() {
        let patch = create_patch(FOX1, FOX2);
        let base = "I am the very model of a modern major general.";
        let result = apply(base, &patch);
        assert_eq!(result.text(), base);
        assert_eq!(result.results(), &[false, false]);
        assert!(!result.is_complete());
    }

    #[test]
    fn applies_after_a_serialization_round_trip() {
        let patch = create_patch(FOX1, FOX2);
        let reparsed: Patch = patch.to_string().parse().unwrap();
        assert_eq!(reparsed, patch);
        let result = apply(FOX1, &reparsed);
        assert_eq!(result.text(), FOX2);
    }

    #[test]
    fn edits_at_the_text_edges() {
        let patch = create_patch("abcdef", "xxabcdefyy");
        let result = apply("abcdef", &patch);
        assert_eq!(result.text(), "xxabcdefyy");
        assert!(result.is_complete());
    }

    #[test]
    fn big_delete_small_drift() {
        let a = "x1234567890123456789012345678901234567890123456789012345678901234567890y";
        let patch = create_patch(a, "xabcy");
        let drifted =
            "x123456789012345678901234567890-----++++++++++-----123456789012345678901234567890y";
        let result = apply(drifted, &patch);
        assert_eq!(result.text(), "xabcy");
        assert_eq!(result.results(), &[true]);
    }

    #[test]
    fn big_delete_big_drift_is_rejected() {
        let a = "x1234567890123456789012345678901234567890123456789012345678901234567890y";
        let patch = create_patch(a, "xabcy");
        let drifted = "x12345678901234567890-----++++++++++-----12345678901234567890y";
        let result = apply(drifted, &patch);
        assert_eq!(result.text(), drifted);
        assert_eq!(result.results(), &[false]);
    }

    #[test]
    fn failed_hunk_keeps_later_hunks_aligned() {
        let base = format!("{}{}", "z".repeat(40), FOX1);
        let modified = format!("{}{}", "q".repeat(40), FOX2);
        let patch = create_patch(&base, &modified);
        let result = apply(&base, &patch);
        assert_eq!(result.text(), modified);
        assert!(result.is_complete());
    }
}
