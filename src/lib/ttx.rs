//! TTX document handling.
//!
//! A TTX dump is treated as a sequence of LF-separated lines with one element per
//! line, which is how `ttx` writes it. A trailing CR stays part of its line. Each line
//! that starts with an element is parsed into a [`Record`] (tag plus attribute spans)
//! so that glyph references can be replaced without touching any other byte of the line.

use crate::glyph_table::{ExtraNameSet, RenameMap};
use crate::ReindexError;
use log::trace;
use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;

pub const GLYPH_ORDER_START: &str = "  <GlyphOrder>";
pub const GLYPH_ORDER_END: &str = "  </GlyphOrder>";
pub const EXTRA_NAMES_START: &str = "    <extraNames>";
pub const EXTRA_NAMES_END: &str = "    </extraNames>";

/// Records whose attribute names a glyph that must exist in the glyph order.
const GLYPH_REFERENCES: &[(&str, &str)] = &[
    ("GlyphID", "name"),
    ("TTGlyph", "name"),
    ("mtx", "name"),
    ("map", "name"),
    ("component", "glyphName"),
];

/// An attribute of a [`Record`], with the byte range of its raw value in the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub key: &'a str,
    pub raw_value: &'a str,
    span: Range<usize>,
}

impl Attribute<'_> {
    pub fn value(&self) -> Cow<'_, str> {
        unescape(self.raw_value)
    }
}

/// The leading element of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub tag: &'a str,
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> Record<'a> {
    /// Parse the element a line starts with.
    ///
    /// Returns `None` for end tags, comments, declarations, text and anything with
    /// attribute syntax other than `key="value"`.
    pub fn parse(line: &'a str) -> Option<Record<'a>> {
        let bytes = line.as_bytes();
        let len = bytes.len();
        let indent = len - line.trim_start().len();
        let rest = line[indent..].strip_prefix('<')?;
        if rest.starts_with(['/', '!', '?']) {
            return None;
        }
        let tag_len = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        if tag_len == 0 {
            return None;
        }
        let tag = &rest[..tag_len];

        let mut attributes = Vec::new();
        let mut pos = indent + 1 + tag_len;
        loop {
            while pos < len && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos >= len || bytes[pos] == b'/' || bytes[pos] == b'>' {
                break;
            }
            let key_start = pos;
            while pos < len
                && !bytes[pos].is_ascii_whitespace()
                && !matches!(bytes[pos], b'=' | b'/' | b'>')
            {
                pos += 1;
            }
            let key = &line[key_start..pos];
            if key.is_empty() || pos + 1 >= len || bytes[pos] != b'=' || bytes[pos + 1] != b'"' {
                return None;
            }
            let value_start = pos + 2;
            let value_end = value_start + line[value_start..].find('"')?;
            attributes.push(Attribute {
                key,
                raw_value: &line[value_start..value_end],
                span: value_start..value_end,
            });
            pos = value_end + 1;
        }
        Some(Record { tag, attributes })
    }

    pub fn attribute(&self, key: &str) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|a| a.key == key)
    }
}

/// Undo XML attribute escaping: the five named entities and `&#N;` / `&#xN;`
/// character references. Anything else starting with `&` is kept as written.
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Escape a value for use inside a double-quoted XML attribute.
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;"),
    )
}

fn is_marker(line: &str, marker: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == marker
}

/// The line ending emitted records take after `marker_line`.
fn line_ending(marker_line: &str) -> &'static str {
    if marker_line.ends_with('\r') {
        "\r"
    } else {
        ""
    }
}

/// Read the glyph names of the `GlyphOrder` block, in order.
pub fn read_glyph_order(text: &str) -> Result<Vec<String>, ReindexError> {
    let mut lines = text.split('\n').enumerate();
    let opened_at = lines
        .by_ref()
        .find(|(_, line)| is_marker(line, GLYPH_ORDER_START))
        .map(|(idx, _)| idx + 1)
        .ok_or_else(|| ReindexError::MissingSection {
            marker: GLYPH_ORDER_START.to_string(),
        })?;

    let mut names = Vec::new();
    for (idx, line) in lines {
        if is_marker(line, GLYPH_ORDER_END) {
            return Ok(names);
        }
        let Some(record) = Record::parse(line) else {
            continue;
        };
        if record.tag != "GlyphID" {
            continue;
        }
        let name = record.attribute("name").ok_or_else(|| {
            ReindexError::inconsistent(format!("GlyphID record without a name at line {}", idx + 1))
        })?;
        names.push(name.value().into_owned());
    }
    Err(ReindexError::UnterminatedSection {
        marker: GLYPH_ORDER_START.to_string(),
        line: opened_at,
    })
}

/// Replace every renamed glyph reference on `line`.
///
/// Returns the line, unchanged unless a reference was renamed, and the number of
/// references replaced. A glyph-keyed record naming a glyph outside `known_names`
/// is a consistency error.
pub fn rewrite_references<'a>(
    line: &'a str,
    line_number: usize,
    renames: &RenameMap,
    known_names: &HashSet<&str>,
) -> Result<(Cow<'a, str>, usize), ReindexError> {
    let Some(record) = Record::parse(line) else {
        return Ok((Cow::Borrowed(line), 0));
    };

    let mut replacements: Vec<(Range<usize>, String)> = Vec::new();
    for attribute in &record.attributes {
        let is_glyph_reference = GLYPH_REFERENCES
            .iter()
            .any(|&(tag, key)| tag == record.tag && key == attribute.key);
        if attribute.key != "name" && !is_glyph_reference {
            continue;
        }
        let value = attribute.value();
        if is_glyph_reference && !known_names.contains(value.as_ref()) {
            return Err(ReindexError::inconsistent(format!(
                "line {}: <{}> refers to glyph '{}' which is not in the glyph order",
                line_number, record.tag, value
            )));
        }
        if let Some(new_name) = renames.get(value.as_ref()) {
            replacements.push((attribute.span.clone(), escape(new_name).into_owned()));
        }
    }
    if replacements.is_empty() {
        return Ok((Cow::Borrowed(line), 0));
    }

    let count = replacements.len();
    let mut rewritten = String::with_capacity(line.len() + 16);
    let mut copied = 0;
    for (span, value) in replacements {
        rewritten.push_str(&line[copied..span.start]);
        rewritten.push_str(&value);
        copied = span.end;
    }
    rewritten.push_str(&line[copied..]);
    trace!("line {}: {}", line_number, rewritten.trim());
    Ok((Cow::Owned(rewritten), count))
}

/// The result of [`rewrite_document`].
#[derive(Debug, Clone)]
pub struct Rewrite {
    pub text: String,
    pub extra_names_blocks: usize,
    pub rewritten_references: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InGlyphOrder { opened_at: usize },
    InExtraNames { opened_at: usize },
}

/// Rewrite a TTX document in one forward scan.
///
/// The `GlyphOrder` block is replaced by `glyph_order` (one `GlyphID` per name, IDs
/// from zero), every `extraNames` block by `extra_names`, and every other line goes
/// through [`rewrite_references`].
pub fn rewrite_document(
    text: &str,
    renames: &RenameMap,
    known_names: &HashSet<&str>,
    glyph_order: &[&str],
    extra_names: &ExtraNameSet,
) -> Result<Rewrite, ReindexError> {
    let mut out: Vec<Cow<'_, str>> = Vec::new();
    let mut state = ScanState::Normal;
    let mut glyph_order_blocks = 0;
    let mut extra_names_blocks = 0;
    let mut rewritten_references = 0;

    for (idx, line) in text.split('\n').enumerate() {
        let line_number = idx + 1;
        match state {
            ScanState::Normal => {
                if is_marker(line, GLYPH_ORDER_START) {
                    out.push(Cow::Borrowed(line));
                    let eol = line_ending(line);
                    for (id, name) in glyph_order.iter().enumerate() {
                        out.push(Cow::Owned(format!(
                            "    <GlyphID id=\"{}\" name=\"{}\"/>{}",
                            id,
                            escape(name),
                            eol
                        )));
                    }
                    glyph_order_blocks += 1;
                    state = ScanState::InGlyphOrder {
                        opened_at: line_number,
                    };
                } else if is_marker(line, EXTRA_NAMES_START) {
                    out.push(Cow::Borrowed(line));
                    let eol = line_ending(line);
                    for name in extra_names {
                        out.push(Cow::Owned(format!(
                            "      <psName name=\"{}\"/>{}",
                            escape(name),
                            eol
                        )));
                    }
                    extra_names_blocks += 1;
                    state = ScanState::InExtraNames {
                        opened_at: line_number,
                    };
                } else {
                    let (line, count) =
                        rewrite_references(line, line_number, renames, known_names)?;
                    rewritten_references += count;
                    out.push(line);
                }
            }
            ScanState::InGlyphOrder { .. } => {
                if is_marker(line, GLYPH_ORDER_END) {
                    out.push(Cow::Borrowed(line));
                    state = ScanState::Normal;
                }
            }
            ScanState::InExtraNames { .. } => {
                if is_marker(line, EXTRA_NAMES_END) {
                    out.push(Cow::Borrowed(line));
                    state = ScanState::Normal;
                }
            }
        }
    }

    match state {
        ScanState::Normal => {}
        ScanState::InGlyphOrder { opened_at } => {
            return Err(ReindexError::UnterminatedSection {
                marker: GLYPH_ORDER_START.to_string(),
                line: opened_at,
            })
        }
        ScanState::InExtraNames { opened_at } => {
            return Err(ReindexError::UnterminatedSection {
                marker: EXTRA_NAMES_START.to_string(),
                line: opened_at,
            })
        }
    }
    if glyph_order_blocks == 0 {
        return Err(ReindexError::MissingSection {
            marker: GLYPH_ORDER_START.to_string(),
        });
    }

    Ok(Rewrite {
        text: out.join("\n"),
        extra_names_blocks,
        rewritten_references,
    })
}
