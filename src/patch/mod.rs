//! Creation, serialization, and parsing of context-carrying patches.
//!
//! A [`Patch`] is an ordered list of hunks. Each hunk records an edit script
//! for one region of the text plus enough surrounding context to re-anchor
//! that region with [`crate::MatchOptions`] when the text being patched has
//! drifted from the original.

mod format;
mod parse;

pub use format::PatchFormatter;
pub use parse::ParsePatchError;

use crate::diff::{self, DiffOptions, Difference, EditType};
use crate::matching::{MAX_BITS, MatchOptions};
use crate::utils::{index_of, last_index_of};
use std::str::FromStr;

/// One hunk: an edit script plus the char coordinates of the region it
/// rewrites in the source and target texts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchEntry {
    diffs: Vec<Difference>,
    start1: usize,
    start2: usize,
    length1: usize,
    length2: usize,
}

impl PatchEntry {
    fn new() -> Self {
        Self {
            diffs: Vec::new(),
            start1: 0,
            start2: 0,
            length1: 0,
            length2: 0,
        }
    }

    pub fn diffs(&self) -> &[Difference] {
        &self.diffs
    }

    /// Char offset of the region in the source text.
    pub fn source_start(&self) -> usize {
        self.start1
    }

    /// Char offset of the region in the target text.
    pub fn target_start(&self) -> usize {
        self.start2
    }

    /// Char length of the region in the source text, context included.
    pub fn source_length(&self) -> usize {
        self.length1
    }

    /// Char length of the region in the target text, context included.
    pub fn target_length(&self) -> usize {
        self.length2
    }
}

/// An ordered list of hunks turning one text into another.
///
/// Serializes via [`Display`](std::fmt::Display) to a unified-diff-like format and
/// parses back via [`FromStr`]:
///
/// ```
/// use driftpatch::Patch;
///
/// let patch: Patch = "@@ -1 +1 @@\n-a\n+b\n".parse().unwrap();
/// assert_eq!(patch.to_string(), "@@ -1 +1 @@\n-a\n+b\n");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patch {
    entries: Vec<PatchEntry>,
}

impl Patch {
    pub fn entries(&self) -> &[PatchEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromStr for Patch {
    type Err = ParsePatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse(s)
    }
}

/// A set of options for modifying the way patches are created and applied
///
/// ```
/// use driftpatch::PatchOptions;
///
/// let mut options = PatchOptions::new();
/// options.set_margin(8);
/// let patch = options.create_patch("abcdef", "abcxyz");
/// ```
#[derive(Clone, Debug)]
pub struct PatchOptions {
    pub(crate) margin: usize,
    pub(crate) delete_threshold: f64,
    pub(crate) edit_cost: usize,
    pub(crate) diff_options: DiffOptions,
    pub(crate) match_options: MatchOptions,
}

impl PatchOptions {
    /// Construct a new `PatchOptions` with default settings
    ///
    /// ## Defaults
    /// * margin = 4
    /// * delete_threshold = 0.5
    /// * edit_cost = 4
    /// * default [`DiffOptions`] and [`MatchOptions`]
    pub fn new() -> Self {
        Self {
            margin: 4,
            delete_threshold: 0.5,
            edit_cost: 4,
            diff_options: DiffOptions::new(),
            match_options: MatchOptions::new(),
        }
    }

    /// Set how much context (in chars) each hunk carries on both sides.
    ///
    /// # Panics
    /// Panics unless `0 < margin * 2 < 32`, the window hunks must fit in when
    /// they are re-anchored during apply.
    pub fn set_margin(&mut self, margin: usize) -> &mut Self {
        assert!(
            margin > 0 && margin * 2 < MAX_BITS,
            "margin must be positive and less than half the match window"
        );
        self.margin = margin;
        self
    }

    /// Set how much of an oversized hunk's content may fail to match before
    /// the hunk is rejected instead of applied.
    ///
    /// # Panics
    /// Panics if `delete_threshold` is outside `0.0..=1.0`.
    pub fn set_delete_threshold(&mut self, delete_threshold: f64) -> &mut Self {
        assert!(
            (0.0..=1.0).contains(&delete_threshold),
            "delete_threshold must be between 0.0 and 1.0"
        );
        self.delete_threshold = delete_threshold;
        self
    }

    /// Set the equality length below which neighboring edits get folded
    /// together when a patch is created.
    pub fn set_edit_cost(&mut self, edit_cost: usize) -> &mut Self {
        self.edit_cost = edit_cost;
        self
    }

    /// Set the options used when diffing the two texts a patch is created
    /// from.
    pub fn set_diff_options(&mut self, diff_options: DiffOptions) -> &mut Self {
        self.diff_options = diff_options;
        self
    }

    /// Set the options used to re-anchor hunks during apply.
    pub fn set_match_options(&mut self, match_options: MatchOptions) -> &mut Self {
        self.match_options = match_options;
        self
    }

    /// Produce a patch turning `original` into `modified`.
    pub fn create_patch(&self, original: &str, modified: &str) -> Patch {
        let mut diffs = self.diff_options.diff(original, modified);
        if diffs.len() > 2 {
            diff::cleanup::cleanup_semantic(&mut diffs);
            diff::cleanup::cleanup_efficiency(&mut diffs, self.edit_cost);
        }
        self.create_patch_from_diffs(original, diffs)
    }

    /// Produce a patch from a precomputed edit script. The script's source
    /// text must be `original`.
    pub fn create_patch_from_diffs(&self, original: &str, diffs: Vec<Difference>) -> Patch {
        let mut entries = Vec::new();
        if diffs.is_empty() {
            return Patch { entries };
        }

        let mut entry = PatchEntry::new();
        let mut char_count1 = 0;
        let mut char_count2 = 0;
        // Context is cut from `prepatch`; `postpatch` tracks the text with
        // all edits seen so far applied, since later hunk coordinates are
        // relative to a partially patched text.
        let mut prepatch: Vec<char> = original.chars().collect();
        let mut postpatch = prepatch.clone();
        let last = diffs.len() - 1;

        for (i, diff) in diffs.iter().enumerate() {
            let len = diff.char_len();
            if entry.diffs.is_empty() && diff.kind() != EditType::Equal {
                entry.start1 = char_count1;
                entry.start2 = char_count2;
            }
            match diff.kind() {
                EditType::Insert => {
                    entry.diffs.push(diff.clone());
                    entry.length2 += len;
                    postpatch.splice(char_count2..char_count2, diff.text().chars());
                }
                EditType::Delete => {
                    entry.diffs.push(diff.clone());
                    entry.length1 += len;
                    postpatch.drain(char_count2..char_count2 + len);
                }
                EditType::Equal => {
                    // Both branches fire for a gap of exactly 2*margin: it is
                    // carried into the hunk, which then closes.
                    if len <= 2 * self.margin && !entry.diffs.is_empty() && i != last {
                        // Short gap; carry it inside the hunk.
                        entry.diffs.push(diff.clone());
                        entry.length1 += len;
                        entry.length2 += len;
                    }
                    if len >= 2 * self.margin && !entry.diffs.is_empty() {
                        self.add_context(&mut entry, &prepatch);
                        entries.push(std::mem::replace(&mut entry, PatchEntry::new()));
                        prepatch = postpatch.clone();
                        char_count1 = char_count2;
                    }
                }
            }
            if diff.kind() != EditType::Insert {
                char_count1 += len;
            }
            if diff.kind() != EditType::Delete {
                char_count2 += len;
            }
        }
        if !entry.diffs.is_empty() {
            self.add_context(&mut entry, &prepatch);
            entries.push(entry);
        }

        Patch { entries }
    }

    // Grow the hunk with equality context from `text` until the hunk's
    // source pattern occurs only once, then add one more margin on each
    // side.
    fn add_context(&self, entry: &mut PatchEntry, text: &[char]) {
        if text.is_empty() {
            return;
        }

        let mut pattern = &text[entry.start2..(entry.start2 + entry.length1).min(text.len())];
        let mut padding = 0;
        while index_of(text, pattern, 0) != last_index_of(text, pattern, text.len())
            && pattern.len() < MAX_BITS - 2 * self.margin
        {
            padding += self.margin;
            let lo = entry.start2.saturating_sub(padding);
            let hi = (entry.start2 + entry.length1 + padding).min(text.len());
            pattern = &text[lo..hi];
        }
        padding += self.margin;

        let prefix = &text[entry.start2.saturating_sub(padding)..entry.start2];
        if !prefix.is_empty() {
            entry
                .diffs
                .insert(0, Difference::equal(prefix.iter().collect::<String>()));
        }
        let hi = (entry.start2 + entry.length1 + padding).min(text.len());
        let suffix = &text[entry.start2 + entry.length1..hi];
        if !suffix.is_empty() {
            entry
                .diffs
                .push(Difference::equal(suffix.iter().collect::<String>()));
        }

        entry.start1 -= prefix.len();
        entry.start2 -= prefix.len();
        entry.length1 += prefix.len() + suffix.len();
        entry.length2 += prefix.len() + suffix.len();
    }

    /// Split every hunk wider than the match window into smaller hunks, each
    /// re-anchored with fresh context. The combined effect is unchanged.
    pub fn split_max(&self, patch: &mut Patch) {
        split_max(&mut patch.entries, self.margin);
    }
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Produce a patch turning `original` into `modified`, with default
/// [`PatchOptions`].
pub fn create_patch(original: &str, modified: &str) -> Patch {
    PatchOptions::new().create_patch(original, modified)
}

pub(crate) fn split_max(entries: &mut Vec<PatchEntry>, margin: usize) {
    let patch_size = MAX_BITS;
    let mut x = 0;
    while x < entries.len() {
        if entries[x].length1 <= patch_size {
            x += 1;
            continue;
        }
        let mut bigpatch = entries.remove(x);
        let mut start1 = bigpatch.start1;
        let mut start2 = bigpatch.start2;
        let mut precontext = String::new();

        while !bigpatch.diffs.is_empty() {
            let mut entry = PatchEntry::new();
            let mut empty = true;
            let pre_len = precontext.chars().count();
            entry.start1 = start1 - pre_len;
            entry.start2 = start2 - pre_len;
            if !precontext.is_empty() {
                entry.length1 = pre_len;
                entry.length2 = pre_len;
                entry.diffs.push(Difference::equal(precontext.clone()));
            }

            while !bigpatch.diffs.is_empty() && entry.length1 < patch_size - margin {
                let kind = bigpatch.diffs[0].kind();
                let len = bigpatch.diffs[0].char_len();
                if kind == EditType::Insert {
                    entry.length2 += len;
                    start2 += len;
                    empty = false;
                    entry.diffs.push(bigpatch.diffs.remove(0));
                } else if kind == EditType::Delete
                    && entry.diffs.len() == 1
                    && entry.diffs[0].kind() == EditType::Equal
                    && len > 2 * patch_size
                {
                    // A deletion far wider than the window is swallowed whole
                    // rather than sliced into dozens of hunks.
                    entry.length1 += len;
                    start1 += len;
                    empty = false;
                    entry.diffs.push(bigpatch.diffs.remove(0));
                } else {
                    let take = len.min(patch_size - entry.length1 - margin);
                    let taken: String = bigpatch.diffs[0].text().chars().take(take).collect();
                    entry.length1 += take;
                    start1 += take;
                    if kind == EditType::Equal {
                        entry.length2 += take;
                        start2 += take;
                    } else {
                        empty = false;
                    }
                    entry.diffs.push(Difference::new(kind, taken));
                    if take == len {
                        bigpatch.diffs.remove(0);
                    } else {
                        let rest: String = bigpatch.diffs[0].text().chars().skip(take).collect();
                        bigpatch.diffs[0] = Difference::new(kind, rest);
                    }
                }
            }

            // The tail of this hunk's target doubles as the next hunk's
            // leading context.
            let target = diff::target_text(&entry.diffs);
            let target_len = target.chars().count();
            precontext = target
                .chars()
                .skip(target_len.saturating_sub(margin))
                .collect();

            let source = diff::source_text(&bigpatch.diffs);
            let postcontext: String = source.chars().take(margin).collect();
            if !postcontext.is_empty() {
                let post_len = postcontext.chars().count();
                entry.length1 += post_len;
                entry.length2 += post_len;
                match entry.diffs.last_mut() {
                    Some(d) if d.kind() == EditType::Equal => d.text.push_str(&postcontext),
                    _ => entry.diffs.push(Difference::equal(postcontext)),
                }
            }

            if !empty {
                entries.insert(x, entry);
                x += 1;
            }
        }
    }
}

/// Bracket the patch with margin-length runs of chars U+0001..=margin, so
/// hunks touching the very start or end of the text still have full context.
/// Returns the padding string the caller must also add to the text.
pub(crate) fn add_padding(entries: &mut [PatchEntry], margin: usize) -> String {
    let null_padding: String = (1..=margin).map(|i| char::from(i as u8)).collect();

    for entry in entries.iter_mut() {
        entry.start1 += margin;
        entry.start2 += margin;
    }

    if let Some(first) = entries.first_mut() {
        if first
            .diffs
            .first()
            .is_none_or(|d| d.kind() != EditType::Equal)
        {
            first.diffs.insert(0, Difference::equal(null_padding.clone()));
            first.start1 -= margin;
            first.start2 -= margin;
            first.length1 += margin;
            first.length2 += margin;
        } else if margin > first.diffs[0].char_len() {
            let len = first.diffs[0].char_len();
            let extra = margin - len;
            let mut grown: String = null_padding.chars().skip(len).collect();
            grown.push_str(first.diffs[0].text());
            first.diffs[0].text = grown;
            first.start1 -= extra;
            first.start2 -= extra;
            first.length1 += extra;
            first.length2 += extra;
        }
    }

    if let Some(last) = entries.last_mut() {
        if last
            .diffs
            .last()
            .is_none_or(|d| d.kind() != EditType::Equal)
        {
            last.diffs.push(Difference::equal(null_padding.clone()));
            last.length1 += margin;
            last.length2 += margin;
        } else if let Some(d) = last.diffs.last_mut() {
            let len = d.char_len();
            if margin > len {
                let extra = margin - len;
                let grown: String = null_padding.chars().take(extra).collect();
                d.text.push_str(&grown);
                last.length1 += extra;
                last.length2 += extra;
            }
        }
    }

    null_padding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Difference;

    const FOX1: &str = "The quick brown fox jumps over the lazy dog.";
    const FOX2: &str = "That quick brown fox jumped over a lazy dog.";

    #[test]
    fn create_patch_groups_hunks_with_rolling_context() {
        let patch = create_patch(FOX2, FOX1);
        // The second hunk reads -21 rather than -22 because its coordinates
        // are relative to the text with the first hunk already applied.
        assert_eq!(
            patch.to_string(),
            "@@ -1,8 +1,7 @@\n Th\n-at\n+e\n  qui\n\
             @@ -21,17 +21,18 @@\n jump\n-ed\n+s\n  over \n-a\n+the\n  laz\n"
        );
    }

    #[test]
    fn create_patch_of_identical_texts_is_empty() {
        assert!(create_patch(FOX1, FOX1).is_empty());
        assert!(create_patch("", "").is_empty());
    }

    #[test]
    fn equality_of_twice_the_margin_closes_the_hunk() {
        // An 8-char gap (margin 4) is carried into the first hunk and also
        // ends it, so the trailing edit starts a second hunk.
        let patch = create_patch("1abcdefgh2", "3abcdefgh4");
        assert_eq!(
            patch.to_string(),
            "@@ -1,10 +1,10 @@\n-1\n+3\n abcdefgh\n 2\n@@ -6,5 +6,5 @@\n efgh\n-2\n+4\n"
        );
    }

    #[test]
    fn pure_insertion_has_zero_source_length() {
        let patch = create_patch("", "test");
        assert_eq!(patch.to_string(), "@@ -0,0 +1,4 @@\n+test\n");
    }

    #[test]
    fn pure_deletion_has_zero_target_length() {
        let patch = create_patch("abc", "");
        assert_eq!(patch.to_string(), "@@ -1,3 +0,0 @@\n-abc\n");
    }

    fn entry_from_text(s: &str) -> PatchEntry {
        let patch: Patch = s.parse().unwrap();
        patch.entries[0].clone()
    }

    #[test]
    fn add_context_simple() {
        let mut entry = entry_from_text("@@ -21,4 +21,10 @@\n-jump\n+somersault\n");
        PatchOptions::new()
            .add_context(&mut entry, &FOX1.chars().collect::<Vec<char>>());
        let patch = Patch {
            entries: vec![entry],
        };
        assert_eq!(
            patch.to_string(),
            "@@ -17,12 +17,18 @@\n fox \n-jump\n+somersault\n s ov\n"
        );
    }

    #[test]
    fn add_context_with_sparse_trailing_text() {
        let text: Vec<char> = "The quick brown fox jumps.".chars().collect();
        let mut entry = entry_from_text("@@ -21,4 +21,10 @@\n-jump\n+somersault\n");
        PatchOptions::new().add_context(&mut entry, &text);
        let patch = Patch {
            entries: vec![entry],
        };
        assert_eq!(
            patch.to_string(),
            "@@ -17,10 +17,16 @@\n fox \n-jump\n+somersault\n s.\n"
        );
    }

    #[test]
    fn add_context_grows_past_ambiguity() {
        let text: Vec<char> = "The quick brown fox jumps.  The quick brown fox crashes."
            .chars()
            .collect();
        let mut entry = entry_from_text("@@ -3 +3,2 @@\n-e\n+at\n");
        PatchOptions::new().add_context(&mut entry, &text);
        let patch = Patch {
            entries: vec![entry],
        };
        assert_eq!(
            patch.to_string(),
            "@@ -1,27 +1,28 @@\n Th\n-e\n+at\n  quick brown fox jumps. \n"
        );
    }

    #[test]
    fn padding_brackets_bare_edits() {
        let patch = create_patch("", "test");
        let mut entries = patch.entries.clone();
        let null_padding = add_padding(&mut entries, 4);
        assert_eq!(null_padding, "\u{1}\u{2}\u{3}\u{4}");
        let patch = Patch { entries };
        assert_eq!(
            patch.to_string(),
            "@@ -1,8 +1,12 @@\n %01%02%03%04\n+test\n %01%02%03%04\n"
        );
    }

    #[test]
    fn padding_tops_up_short_context() {
        let patch = create_patch("XY", "XtestY");
        assert_eq!(patch.to_string(), "@@ -1,2 +1,6 @@\n X\n+test\n Y\n");

        let mut entries = patch.entries.clone();
        add_padding(&mut entries, 4);
        let patch = Patch { entries };
        assert_eq!(
            patch.to_string(),
            "@@ -2,8 +2,12 @@\n %02%03%04X\n+test\n Y%01%02%03\n"
        );
    }

    #[test]
    fn split_max_bounds_hunk_width() {
        let a = "abcdefghijklmnopqrstuvwxyz01234567890";
        let b = "XabXcdXefXghXijXklXmnXopXqrXstXuvXwxXyzX01X23X45X67X89X0";
        let options = PatchOptions::new();
        let mut patch = options.create_patch(a, b);
        options.split_max(&mut patch);
        assert!(patch.entries().len() > 1);
        for entry in patch.entries() {
            assert!(entry.source_length() <= MAX_BITS);
        }
    }

    #[test]
    fn split_max_preserves_the_transformation() {
        let a = "abcdefghijklmnopqrstuvwxyz01234567890";
        let b = "XabXcdXefXghXijXklXmnXopXqrXstXuvXwxXyzX01X23X45X67X89X0";
        let options = PatchOptions::new();
        let mut patch = options.create_patch(a, b);
        options.split_max(&mut patch);
        let result = crate::apply(a, &patch);
        assert!(result.results().iter().all(|&r| r));
        assert_eq!(result.text(), b);
    }

    #[test]
    fn create_patch_from_diffs_matches_create_patch() {
        let mut diffs = crate::diff(FOX1, FOX2);
        crate::cleanup_semantic(&mut diffs);
        crate::cleanup_efficiency(&mut diffs, 4);
        let from_diffs = PatchOptions::new().create_patch_from_diffs(FOX1, diffs);
        assert_eq!(from_diffs, create_patch(FOX1, FOX2));
    }

    #[test]
    fn entry_accessors_expose_coordinates() {
        let patch: Patch = "@@ -21,4 +21,10 @@\n-jump\n+somersault\n".parse().unwrap();
        let entry = &patch.entries()[0];
        assert_eq!(entry.source_start(), 20);
        assert_eq!(entry.target_start(), 20);
        assert_eq!(entry.source_length(), 4);
        assert_eq!(entry.target_length(), 10);
        assert_eq!(
            entry.diffs(),
            &[
                Difference::delete("jump"),
                Difference::insert("somersault")
            ]
        );
    }
}
