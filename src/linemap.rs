//! Reversible line-to-char compression backing the line-mode diff speedup.
//!
//! Each distinct line of the two texts is interned and assigned a synthetic
//! one-char code; diffing the code strings is then a char-level problem a
//! couple of orders of magnitude smaller. [`LineMap::restore`] is the exact
//! inverse, rewriting code-space diff texts back into line text.

use crate::diff::Difference;
use crate::utils::LineIter;
use hashbrown::HashMap;

pub(crate) struct LineMap {
    pub source_map: String,
    pub target_map: String,
    lines: Vec<String>,
}

impl LineMap {
    pub fn new(source: &str, target: &str) -> Self {
        // Index 0 stays an empty sentinel so codes start at 1.
        let mut lines = vec![String::new()];
        let mut table = HashMap::new();
        let source_map = encode(source, &mut lines, &mut table);
        let target_map = encode(target, &mut lines, &mut table);
        Self {
            source_map,
            target_map,
            lines,
        }
    }

    /// Rewrite every code-space diff text into the lines it stands for.
    pub fn restore(&self, diffs: &mut [Difference]) {
        for diff in diffs {
            let mut text = String::new();
            for code in diff.text.chars() {
                text.push_str(&self.lines[index_for(code)]);
            }
            diff.text = text;
        }
    }
}

fn encode(
    text: &str,
    lines: &mut Vec<String>,
    table: &mut HashMap<String, usize>,
) -> String {
    let mut map = String::new();
    for line in LineIter::new(text) {
        let index = match table.get(line) {
            Some(&index) => index,
            None => {
                let index = lines.len();
                lines.push(line.to_string());
                table.insert(line.to_string(), index);
                index
            }
        };
        map.push(code_for(index));
    }
    map
}

// Codes skip the surrogate gap so every index maps to a valid char. Inputs
// with more than ~1.1M distinct lines are outside the supported range.
fn code_for(index: usize) -> char {
    let v = if index < 0xD800 {
        index as u32
    } else {
        index as u32 + 0x800
    };
    char::from_u32(v).expect("too many distinct lines to assign codes")
}

fn index_for(code: char) -> usize {
    let v = code as u32;
    (if v >= 0xE000 { v - 0x800 } else { v }) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Difference;

    #[test]
    fn compresses_repeated_lines() {
        let map = LineMap::new("alpha\nbeta\nalpha\n", "beta\nalpha\nbeta\n");
        assert_eq!(map.source_map, "\u{1}\u{2}\u{1}");
        assert_eq!(map.target_map, "\u{2}\u{1}\u{2}");
        assert_eq!(map.lines, vec!["", "alpha\n", "beta\n"]);
    }

    #[test]
    fn final_partial_line_kept() {
        let map = LineMap::new("a\nb", "b");
        assert_eq!(map.source_map, "\u{1}\u{2}");
        assert_eq!(map.target_map, "\u{2}");
        assert_eq!(map.lines, vec!["", "a\n", "b"]);
    }

    #[test]
    fn empty_input() {
        let map = LineMap::new("", "");
        assert_eq!(map.source_map, "");
        assert_eq!(map.target_map, "");
        assert_eq!(map.lines, vec![""]);
    }

    #[test]
    fn restore_is_the_inverse() {
        let map = LineMap::new("alpha\nbeta\nalpha\n", "beta\nalpha\nbeta\n");
        let mut diffs = vec![
            Difference::delete(map.source_map.clone()),
            Difference::insert(map.target_map.clone()),
        ];
        map.restore(&mut diffs);
        assert_eq!(
            diffs,
            vec![
                Difference::delete("alpha\nbeta\nalpha\n"),
                Difference::insert("beta\nalpha\nbeta\n"),
            ]
        );
    }

    #[test]
    fn surrogate_gap_round_trips() {
        for index in [0usize, 1, 0xD7FF, 0xD800, 0xFFFF] {
            assert_eq!(index_for(code_for(index)), index);
        }
    }
}
