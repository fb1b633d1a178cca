//! Common utilities

/// Iterator over the lines of a string, including the `\n` character.
pub struct LineIter<'a>(&'a str);

impl<'a> LineIter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self(text)
    }
}

impl<'a> Iterator for LineIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }

        let end = if let Some(idx) = self.0.find('\n') {
            idx + 1
        } else {
            self.0.len()
        };

        let (line, remaining) = self.0.split_at(end);
        self.0 = remaining;
        Some(line)
    }
}

/// First occurrence of `needle` in `haystack` at or after `from`.
pub(crate) fn index_of(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}

/// Last occurrence of `needle` in `haystack` starting at or before `until`.
pub(crate) fn last_index_of(haystack: &[char], needle: &[char], until: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(until.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let hi = until.min(haystack.len() - needle.len());
    (0..=hi)
        .rev()
        .find(|&i| &haystack[i..i + needle.len()] == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_iter_keeps_terminators() {
        let lines: Vec<_> = LineIter::new("a\nbb\nccc").collect();
        assert_eq!(lines, vec!["a\n", "bb\n", "ccc"]);
        assert_eq!(LineIter::new("").count(), 0);
        let lines: Vec<_> = LineIter::new("\n\n").collect();
        assert_eq!(lines, vec!["\n", "\n"]);
    }

    #[test]
    fn char_slice_search() {
        let hay: Vec<char> = "abcabc".chars().collect();
        let needle: Vec<char> = "bc".chars().collect();
        assert_eq!(index_of(&hay, &needle, 0), Some(1));
        assert_eq!(index_of(&hay, &needle, 2), Some(4));
        assert_eq!(index_of(&hay, &needle, 5), None);
        assert_eq!(last_index_of(&hay, &needle, 6), Some(4));
        assert_eq!(last_index_of(&hay, &needle, 3), Some(1));
        assert_eq!(index_of(&hay, &[], 2), Some(2));
    }
}
