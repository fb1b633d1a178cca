//! Render a Patch

use super::{Patch, PatchEntry};
use crate::diff::EditType;
use anstyle::{AnsiColor, Style};
use std::fmt::{Display, Formatter, Result, Write};

impl Display for Patch {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let formatter = PatchFormatter::new();
        write!(f, "{}", formatter.fmt_patch(self))
    }
}

// Zero-length regions print their 0-based start; everything else follows the
// unified-diff 1-based convention, with a length of 1 left implicit.
fn write_coords(f: &mut Formatter<'_>, start: usize, length: usize) -> Result {
    match length {
        0 => write!(f, "{start},0"),
        1 => write!(f, "{}", start + 1),
        _ => write!(f, "{},{}", start + 1, length),
    }
}

// Percent-escape every UTF-8 byte outside the safe set, uppercase hex. The
// safe set matches what the wire format leaves readable; in particular '\n'
// becomes %0A so one Difference always occupies one physical line.
fn write_escaped(f: &mut Formatter<'_>, text: &str) -> Result {
    for &b in text.as_bytes() {
        if is_safe(b) {
            f.write_char(b as char)?;
        } else {
            write!(f, "%{b:02X}")?;
        }
    }
    Ok(())
}

fn is_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b' ' | b'!' | b'*' | b'\'' | b'(' | b')' | b';' | b'/' | b'?' | b':' | b'@' | b'&'
                | b'=' | b'+' | b'$' | b',' | b'#' | b'-' | b'.' | b'_' | b'~'
        )
}

/// Struct used to adjust the formatting of a `Patch`
#[derive(Debug)]
pub struct PatchFormatter {
    with_color: bool,

    context: Style,
    delete: Style,
    insert: Style,
    hunk_header: Style,
}

impl PatchFormatter {
    /// Construct a new formatter
    pub fn new() -> Self {
        Self {
            with_color: false,

            context: Style::new(),
            delete: AnsiColor::Red.on_default(),
            insert: AnsiColor::Green.on_default(),
            hunk_header: AnsiColor::Cyan.on_default(),
        }
    }

    /// Enable formatting a patch with color
    pub fn with_color(mut self) -> Self {
        self.with_color = true;
        self
    }

    /// Returns a `Display` impl which can be used to print a Patch
    pub fn fmt_patch<'a>(&'a self, patch: &'a Patch) -> impl Display + 'a {
        PatchDisplay { f: self, patch }
    }

    fn fmt_entry<'a>(&'a self, entry: &'a PatchEntry) -> impl Display + 'a {
        EntryDisplay { f: self, entry }
    }
}

impl Default for PatchFormatter {
    fn default() -> Self {
        Self::new()
    }
}

struct PatchDisplay<'a> {
    f: &'a PatchFormatter,
    patch: &'a Patch,
}

impl Display for PatchDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for entry in &self.patch.entries {
            write!(f, "{}", self.f.fmt_entry(entry))?;
        }
        Ok(())
    }
}

struct EntryDisplay<'a> {
    f: &'a PatchFormatter,
    entry: &'a PatchEntry,
}

impl Display for EntryDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.f.with_color {
            write!(f, "{}", self.f.hunk_header.render())?;
        }
        write!(f, "@@ -")?;
        write_coords(f, self.entry.start1, self.entry.length1)?;
        write!(f, " +")?;
        write_coords(f, self.entry.start2, self.entry.length2)?;
        write!(f, " @@")?;
        if self.f.with_color {
            write!(f, "{}", self.f.hunk_header.render_reset())?;
        }
        writeln!(f)?;

        for diff in &self.entry.diffs {
            let (sign, style) = match diff.kind() {
                EditType::Equal => (' ', self.f.context),
                EditType::Delete => ('-', self.f.delete),
                EditType::Insert => ('+', self.f.insert),
            };
            if self.f.with_color {
                write!(f, "{}", style.render())?;
            }
            f.write_char(sign)?;
            write_escaped(f, diff.text())?;
            if self.f.with_color {
                write!(f, "{}", style.render_reset())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{PatchOptions, create_patch};

    #[test]
    fn escapes_outside_the_safe_set() {
        let patch = create_patch("x\ny", "x%y");
        assert_eq!(patch.to_string(), "@@ -1,3 +1,3 @@\n x\n-%0A\n+%25\n y\n");
    }

    #[test]
    fn uri_component_characters_stay_literal() {
        let mut options = PatchOptions::new();
        options.set_margin(8);
        let patch = options.create_patch("v.w_x~y zq", "v.w_x~y zr");
        assert_eq!(patch.to_string(), "@@ -2,9 +2,9 @@\n .w_x~y z\n-q\n+r\n");
    }

    #[test]
    fn colored_output_wraps_lines_in_styles() {
        let patch = create_patch("abcdef", "abcxyz");
        let formatter = PatchFormatter::new().with_color();
        let colored = formatter.fmt_patch(&patch).to_string();
        assert!(colored.contains("\x1b["));
        // Stripped of styling it is the plain serialization.
        let plain = PatchFormatter::new().fmt_patch(&patch).to_string();
        assert_eq!(plain, patch.to_string());
    }
}
