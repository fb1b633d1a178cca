//! Parse a Patch

use super::{Patch, PatchEntry};
use crate::diff::{Difference, EditType};
use crate::utils::LineIter;
use std::{borrow::Cow, fmt};

type Result<T, E = ParsePatchError> = std::result::Result<T, E>;

#[derive(Debug)]
pub struct ParsePatchError(Cow<'static, str>);

impl ParsePatchError {
    fn new<E: Into<Cow<'static, str>>>(e: E) -> Self {
        Self(e.into())
    }
}

impl fmt::Display for ParsePatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error parsing patch: {}", self.0)
    }
}

impl std::error::Error for ParsePatchError {}

struct Parser<'a> {
    lines: std::iter::Peekable<LineIter<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: LineIter::new(input).peekable(),
        }
    }

    fn peek(&mut self) -> Option<&&'a str> {
        self.lines.peek()
    }

    fn next(&mut self) -> Result<&'a str> {
        let line = self
            .lines
            .next()
            .ok_or_else(|| ParsePatchError::new("unexpected EOF"))?;
        Ok(line)
    }
}

pub(super) fn parse(input: &str) -> Result<Patch> {
    let mut parser = Parser::new(input);
    let mut entries = Vec::new();
    while parser.peek().is_some() {
        entries.push(entry(&mut parser)?);
    }
    Ok(Patch { entries })
}

fn entry(parser: &mut Parser<'_>) -> Result<PatchEntry> {
    let (start1, length1, start2, length2) = entry_header(parser.next()?)?;
    let diffs = entry_body(parser)?;

    // The body must account for exactly the char counts the header claims.
    let (source_len, target_len) = body_lengths(&diffs);
    if source_len != length1 || target_len != length2 {
        return Err(ParsePatchError::new("hunk header does not match hunk"));
    }

    Ok(PatchEntry {
        diffs,
        start1,
        start2,
        length1,
        length2,
    })
}

fn entry_header(input: &str) -> Result<(usize, usize, usize, usize)> {
    let line = input.strip_suffix('\n').unwrap_or(input);
    let line = strip_prefix(line, "@@ -")?;
    let line = line
        .strip_suffix(" @@")
        .ok_or_else(|| ParsePatchError::new("hunk header unterminated"))?;
    let (coords1, coords2) = split_at_exclusive(line, " ")?;
    let coords2 = strip_prefix(coords2, "+")?;
    let (start1, length1) = coords(coords1)?;
    let (start2, length2) = coords(coords2)?;
    Ok((start1, length1, start2, length2))
}

// "start" implies length 1; a trailing ",0" keeps the start 0-based, every
// other form is 1-based.
fn coords(s: &str) -> Result<(usize, usize)> {
    let parse = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| ParsePatchError::new("can't parse coordinate"))
    };
    if let Ok((start, length)) = split_at_exclusive(s, ",") {
        let start = parse(start)?;
        let length = parse(length)?;
        if length == 0 {
            Ok((start, 0))
        } else {
            let start = start
                .checked_sub(1)
                .ok_or_else(|| ParsePatchError::new("coordinate out of range"))?;
            Ok((start, length))
        }
    } else {
        let start = parse(s)?
            .checked_sub(1)
            .ok_or_else(|| ParsePatchError::new("coordinate out of range"))?;
        Ok((start, 1))
    }
}

fn entry_body(parser: &mut Parser<'_>) -> Result<Vec<Difference>> {
    let mut diffs = Vec::new();
    while let Some(line) = parser.peek() {
        if line.starts_with('@') {
            break;
        }
        let line = parser.next()?;
        let line = line.strip_suffix('\n').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let kind = match line.as_bytes()[0] {
            b' ' => EditType::Equal,
            b'-' => EditType::Delete,
            b'+' => EditType::Insert,
            _ => return Err(ParsePatchError::new("unexpected line in hunk body")),
        };
        diffs.push(Difference::new(kind, unescape(&line[1..])?));
    }
    Ok(diffs)
}

fn body_lengths(diffs: &[Difference]) -> (usize, usize) {
    let mut source = 0;
    let mut target = 0;
    for diff in diffs {
        let len = diff.char_len();
        if diff.kind() != EditType::Insert {
            source += len;
        }
        if diff.kind() != EditType::Delete {
            target += len;
        }
    }
    (source, target)
}

fn unescape(escaped: &str) -> Result<String> {
    let input = escaped.as_bytes();
    let mut bytes = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' {
            if i + 2 >= input.len() {
                return Err(ParsePatchError::new("truncated escape"));
            }
            let hi = hex_value(input[i + 1])?;
            let lo = hex_value(input[i + 2])?;
            bytes.push(hi << 4 | lo);
            i += 3;
        } else {
            bytes.push(input[i]);
            i += 1;
        }
    }
    String::from_utf8(bytes).map_err(|_| ParsePatchError::new("escaped text is not valid utf-8"))
}

fn hex_value(b: u8) -> Result<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        b'a'..=b'f' => Ok(b - b'a' + 10),
        _ => Err(ParsePatchError::new("illegal escape")),
    }
}

fn strip_prefix<'a>(s: &'a str, prefix: &str) -> Result<&'a str> {
    s.strip_prefix(prefix).ok_or_else(|| {
        let e = format!("prefix doesn't match: prefix: {prefix:?} input: {s:?}");
        ParsePatchError::new(e)
    })
}

fn split_at_exclusive<'a>(s: &'a str, needle: &str) -> Result<(&'a str, &'a str)> {
    if let Some(idx) = s.find(needle) {
        Ok((&s[..idx], &s[idx + needle.len()..]))
    } else {
        Err(ParsePatchError::new(format!("unable to find '{needle}'")))
    }
}
