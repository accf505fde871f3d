//! Standard glyph naming.
//!
//! Two immutable tables drive naming: the Adobe Glyph List For New Fonts
//! (code point to production name) and the 258 names built into the
//! TrueType `post` table. Both are parsed once from the files under `data/`
//! and shared for the lifetime of the process.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// First code point of the Private Use Area.
pub const PRIVATE_USE_START: u32 = 0xE000;
/// Last code point of the Private Use Area.
pub const PRIVATE_USE_END: u32 = 0xF8FF;

static AGLFN: Lazy<HashMap<u32, &'static str>> =
    Lazy::new(|| parse_aglfn(include_str!("../../data/aglfn.txt")));

static STANDARD_NAMES: Lazy<HashSet<&'static str>> =
    Lazy::new(|| parse_name_list(include_str!("../../data/standard_names.txt")));

/// Parse `XXXX;name` lines, skipping comments and anything malformed.
fn parse_aglfn(source: &'static str) -> HashMap<u32, &'static str> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (hex, name) = line.split_once(';')?;
            let codepoint = u32::from_str_radix(hex, 16).ok()?;
            // Later columns (character names) are ignored if present.
            let name = name.split(';').next()?.trim();
            (!name.is_empty()).then_some((codepoint, name))
        })
        .collect()
}

fn parse_name_list(source: &'static str) -> HashSet<&'static str> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Returns true if `codepoint` lies in the BMP Private Use Area.
pub fn is_private_use(codepoint: u32) -> bool {
    (PRIVATE_USE_START..=PRIVATE_USE_END).contains(&codepoint)
}

/// Look up the AGLFN production name for a code point.
pub fn agl_name(codepoint: u32) -> Option<&'static str> {
    AGLFN.get(&codepoint).copied()
}

/// The synthesized `uniXXXX` name for a BMP code point.
pub fn uni_name(codepoint: u32) -> String {
    format!("uni{:04X}", codepoint)
}

/// Compute the canonical name for a glyph reached from `codepoint`.
///
/// Returns `None` for Private Use Area code points: those glyphs keep
/// whatever name they already have.
pub fn canonical_name(codepoint: u32) -> Option<String> {
    if is_private_use(codepoint) {
        return None;
    }
    Some(match agl_name(codepoint) {
        Some(name) => name.to_string(),
        None => uni_name(codepoint),
    })
}

/// Returns true if `name` is one of the names built into the `post` table,
/// i.e. it does not need an explicit `extraNames` record.
pub fn is_standard_name(name: &str) -> bool {
    STANDARD_NAMES.contains(name)
}

/// Number of entries in the AGLFN table.
pub fn agl_len() -> usize {
    AGLFN.len()
}

/// Number of built-in `post` table names.
pub fn standard_names_len() -> usize {
    STANDARD_NAMES.len()
}
