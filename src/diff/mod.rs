use crate::commonality;
use crate::linemap::LineMap;
use crate::utils::index_of;
use std::fmt;
use std::time::{Duration, Instant};

pub(crate) mod cleanup;
mod myers;


/// The kind of edit a [`Difference`] describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EditType {
    Delete,
    Equal,
    Insert,
}

/// One contiguous run of a single edit type.
///
/// An ordered `Vec<Difference>` is an edit script: concatenating the
/// `Equal`+`Delete` texts reconstructs the source and the `Equal`+`Insert`
/// texts reconstruct the target. Order is significant and never shuffled by
/// the cleanup passes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Difference {
    pub(crate) kind: EditType,
    pub(crate) text: String,
}

impl Difference {
    pub fn new(kind: EditType, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn equal(text: impl Into<String>) -> Self {
        Self::new(EditType::Equal, text)
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self::new(EditType::Delete, text)
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self::new(EditType::Insert, text)
    }

    pub fn kind(&self) -> EditType {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the run in chars; every offset in this crate counts chars.
    pub(crate) fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Debug for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EditType::Equal => write!(f, "Equal({:?})", self.text),
            EditType::Delete => write!(f, "Delete({:?})", self.text),
            EditType::Insert => write!(f, "Insert({:?})", self.text),
        }
    }
}

/// Source text reconstructed from the `Equal`+`Delete` runs of an edit script.
pub fn source_text(diffs: &[Difference]) -> String {
    diffs
        .iter()
        .filter(|d| d.kind != EditType::Insert)
        .map(|d| d.text.as_str())
        .collect()
}

/// Target text reconstructed from the `Equal`+`Insert` runs of an edit script.
pub fn target_text(diffs: &[Difference]) -> String {
    diffs
        .iter()
        .filter(|d| d.kind != EditType::Delete)
        .map(|d| d.text.as_str())
        .collect()
}

/// A set of options for modifying the way a diff is performed
///
/// ```
/// use driftpatch::DiffOptions;
/// use std::time::Duration;
///
/// let mut options = DiffOptions::new();
/// options.set_timeout(Some(Duration::from_millis(250)));
/// let diffs = options.diff("bat", "map");
/// ```
#[derive(Clone, Debug)]
pub struct DiffOptions {
    check_lines: bool,
    timeout: Option<Duration>,
}

impl DiffOptions {
    /// Construct a new `DiffOptions` with default settings
    ///
    /// ## Defaults
    /// * check_lines = true
    /// * timeout = 1 second
    pub fn new() -> Self {
        Self {
            check_lines: true,
            timeout: Some(Duration::from_secs(1)),
        }
    }

    /// Enable or disable the line-mode speedup for large inputs.
    pub fn set_check_lines(&mut self, check_lines: bool) -> &mut Self {
        self.check_lines = check_lines;
        self
    }

    /// Bound the time spent searching for a minimal diff. `None` removes the
    /// bound. When the deadline expires mid-search the affected region falls
    /// back to a whole-text delete/insert pair.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Produce the edit script turning `original` into `modified`.
    pub fn diff(&self, original: &str, modified: &str) -> Vec<Difference> {
        let old: Vec<char> = original.chars().collect();
        let new: Vec<char> = modified.chars().collect();
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        diff_main(&old, &new, self.check_lines, deadline)
    }
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Produce the edit script turning `original` into `modified`, with default
/// [`DiffOptions`].
pub fn diff(original: &str, modified: &str) -> Vec<Difference> {
    DiffOptions::default().diff(original, modified)
}

fn text_of(chars: &[char]) -> String {
    chars.iter().collect()
}

pub(crate) fn diff_main(
    old: &[char],
    new: &[char],
    check_lines: bool,
    deadline: Option<Instant>,
) -> Vec<Difference> {
    if old == new {
        if old.is_empty() {
            return Vec::new();
        }
        return vec![Difference::equal(text_of(old))];
    }

    // Peel off the shared outer text and diff only the middle.
    let prefix_len = commonality::common_prefix(old, new);
    let suffix_len = commonality::common_suffix(&old[prefix_len..], &new[prefix_len..]);

    let mut diffs = compute(
        &old[prefix_len..old.len() - suffix_len],
        &new[prefix_len..new.len() - suffix_len],
        check_lines,
        deadline,
    );

    if prefix_len != 0 {
        diffs.insert(0, Difference::equal(text_of(&old[..prefix_len])));
    }
    if suffix_len != 0 {
        diffs.push(Difference::equal(text_of(&old[old.len() - suffix_len..])));
    }

    cleanup::cleanup_merge(&mut diffs);
    diffs
}

// Diff two texts which share no common prefix or suffix.
fn compute(
    old: &[char],
    new: &[char],
    check_lines: bool,
    deadline: Option<Instant>,
) -> Vec<Difference> {
    if old.is_empty() {
        return vec![Difference::insert(text_of(new))];
    }
    if new.is_empty() {
        return vec![Difference::delete(text_of(old))];
    }

    let (long, short) = if old.len() > new.len() {
        (old, new)
    } else {
        (new, old)
    };
    let surround = if old.len() > new.len() {
        EditType::Delete
    } else {
        EditType::Insert
    };

    // Shorter text sits inside the longer one.
    if let Some(at) = index_of(long, short, 0) {
        return vec![
            Difference::new(surround, text_of(&long[..at])),
            Difference::equal(text_of(short)),
            Difference::new(surround, text_of(&long[at + short.len()..])),
        ];
    }

    // After the prefix/suffix strip a single-char short side can't match
    // anything in the longer side.
    if short.len() == 1 {
        return vec![
            Difference::delete(text_of(old)),
            Difference::insert(text_of(new)),
        ];
    }

    if let Some(hm) = commonality::half_match(old, new) {
        let mut diffs = diff_main(hm.prefix1, hm.prefix2, check_lines, deadline);
        diffs.push(Difference::equal(text_of(hm.common)));
        diffs.extend(diff_main(hm.suffix1, hm.suffix2, check_lines, deadline));
        return diffs;
    }

    if check_lines && old.len() > 100 && new.len() > 100 {
        return line_mode(old, new, deadline);
    }

    match myers::diff(old, new, deadline) {
        Some((old_changed, new_changed)) => runs_from_flags(old, new, &old_changed, &new_changed),
        // Diff abandoned; fall back to a whole-text replace.
        None => vec![
            Difference::delete(text_of(old)),
            Difference::insert(text_of(new)),
        ],
    }
}

// Turn the engine's changed flags into runs. Deletions are emitted before
// insertions at every mixed boundary, which keeps the output deterministic.
fn runs_from_flags(
    old: &[char],
    new: &[char],
    old_changed: &[bool],
    new_changed: &[bool],
) -> Vec<Difference> {
    let mut diffs = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < old.len() || j < new.len() {
        let run = i;
        while i < old.len() && old_changed[i] {
            i += 1;
        }
        if i > run {
            diffs.push(Difference::delete(text_of(&old[run..i])));
        }

        let run = j;
        while j < new.len() && new_changed[j] {
            j += 1;
        }
        if j > run {
            diffs.push(Difference::insert(text_of(&new[run..j])));
        }

        let run = i;
        while i < old.len() && j < new.len() && !old_changed[i] && !new_changed[j] {
            i += 1;
            j += 1;
        }
        if i > run {
            diffs.push(Difference::equal(text_of(&old[run..i])));
        }
    }

    diffs
}

// Line-granularity first pass for large inputs, refined back to char
// granularity where replacement blocks touch.
fn line_mode(old: &[char], new: &[char], deadline: Option<Instant>) -> Vec<Difference> {
    let source = text_of(old);
    let target = text_of(new);
    let map = LineMap::new(&source, &target);

    let coded_old: Vec<char> = map.source_map.chars().collect();
    let coded_new: Vec<char> = map.target_map.chars().collect();
    let mut diffs = diff_main(&coded_old, &coded_new, false, deadline);

    map.restore(&mut diffs);
    cleanup::cleanup_semantic(&mut diffs);

    // Line mode coarsens sub-line edits: re-diff each delete/insert block
    // pair char by char.
    diffs.push(Difference::equal(""));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete = String::new();
    let mut text_insert = String::new();
    while pointer < diffs.len() {
        match diffs[pointer].kind {
            EditType::Insert => {
                count_insert += 1;
                text_insert.push_str(&diffs[pointer].text);
            }
            EditType::Delete => {
                count_delete += 1;
                text_delete.push_str(&diffs[pointer].text);
            }
            EditType::Equal => {
                if count_delete >= 1 && count_insert >= 1 {
                    let sub_old: Vec<char> = text_delete.chars().collect();
                    let sub_new: Vec<char> = text_insert.chars().collect();
                    let sub = diff_main(&sub_old, &sub_new, false, deadline);
                    let start = pointer - count_delete - count_insert;
                    let sub_len = sub.len();
                    diffs.splice(start..pointer, sub);
                    pointer = start + sub_len;
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

/// Translate a char offset in the source text to the corresponding offset in
/// the target text. Offsets inside a deleted run snap to the end of the
/// preceding equality.
pub fn x_index(diffs: &[Difference], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut hit = None;

    for diff in diffs {
        let len = diff.char_len();
        if diff.kind != EditType::Insert {
            chars1 += len;
        }
        if diff.kind != EditType::Delete {
            chars2 += len;
        }
        if chars1 > loc {
            hit = Some(diff);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }

    match hit {
        Some(diff) if diff.kind == EditType::Delete => last_chars2,
        _ => last_chars2 + (loc - last_chars1),
    }
}

/// Edit weight of a script: the larger of the inserted/deleted char counts,
/// summed per equality-separated segment.
pub fn levenshtein(diffs: &[Difference]) -> usize {
    let mut total = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for diff in diffs {
        match diff.kind {
            EditType::Insert => insertions += diff.char_len(),
            EditType::Delete => deletions += diff.char_len(),
            EditType::Equal => {
                total += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    total + insertions.max(deletions)
}
