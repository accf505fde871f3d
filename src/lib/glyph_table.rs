//! The glyph arena: one [`GlyphEntry`] per row of the source glyph order.
//!
//! Entries are addressed by their original glyph ID and never move. Naming mutates
//! entries in place; planning produces a separate permutation.

use crate::glyph_names;
use crate::ReindexError;
use log::trace;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Sort key for glyphs no scanned code point reaches. Larger than any code point.
pub const NOT_SEEN: u32 = 0x7FFF_FFFF;

/// Old glyph name to new glyph name. Only names that actually change are present.
pub type RenameMap = BTreeMap<String, String>;

/// New names outside the built-in `post` names, sorted and unique.
pub type ExtraNameSet = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphEntry {
    /// Position in the source glyph order
    pub old_id: usize,
    pub old_name: String,
    /// Defaults to `old_name` until names are assigned
    pub new_name: String,
    /// Lowest code point mapped to this glyph, if any
    pub codepoint: Option<u32>,
}

impl GlyphEntry {
    fn sort_key(&self) -> (u32, &str) {
        (self.codepoint.unwrap_or(NOT_SEEN), self.old_name.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlyphTable {
    entries: Vec<GlyphEntry>,
}

impl GlyphTable {
    /// Build the arena from the glyph names in source order.
    ///
    /// The table must be non-empty (glyph 0 is the `.notdef` placeholder) and
    /// names must be unique.
    pub fn new(names: Vec<String>) -> Result<Self, ReindexError> {
        if names.is_empty() {
            return Err(ReindexError::inconsistent("the glyph order is empty"));
        }
        let mut seen = HashMap::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            if let Some(first) = seen.insert(name.as_str(), id) {
                return Err(ReindexError::inconsistent(format!(
                    "glyph name '{}' is used by both glyph {} and glyph {}",
                    name, first, id
                )));
            }
        }
        let entries = names
            .into_iter()
            .enumerate()
            .map(|(old_id, name)| GlyphEntry {
                old_id,
                new_name: name.clone(),
                old_name: name,
                codepoint: None,
            })
            .collect();
        Ok(GlyphTable { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GlyphEntry] {
        &self.entries
    }

    pub fn get(&self, old_id: usize) -> Option<&GlyphEntry> {
        self.entries.get(old_id)
    }

    pub fn old_names(&self) -> HashSet<&str> {
        self.entries.iter().map(|e| e.old_name.as_str()).collect()
    }

    /// Record `codepoint` for glyph `old_id` unless the glyph already has one.
    ///
    /// Returns whether the code point was recorded. An ID outside the table is a
    /// consistency error.
    pub fn record_codepoint(
        &mut self,
        old_id: usize,
        codepoint: u32,
    ) -> Result<bool, ReindexError> {
        let len = self.entries.len();
        let entry = self.entries.get_mut(old_id).ok_or_else(|| {
            ReindexError::inconsistent(format!(
                "code point U+{:04X} maps to glyph {} but the glyph order has only {} glyphs",
                codepoint, old_id, len
            ))
        })?;
        if entry.codepoint.is_some() {
            return Ok(false);
        }
        entry.codepoint = Some(codepoint);
        Ok(true)
    }

    /// Give every glyph with a code point its canonical name.
    ///
    /// Private Use Area glyphs and glyphs without a code point keep their name.
    /// Fails if two glyphs would end up with the same name.
    pub fn assign_names(&mut self) -> Result<RenameMap, ReindexError> {
        let mut renames = RenameMap::new();
        for entry in &mut self.entries {
            let Some(codepoint) = entry.codepoint else {
                continue;
            };
            let Some(name) = glyph_names::canonical_name(codepoint) else {
                continue;
            };
            if name != entry.old_name {
                trace!(
                    "Renaming glyph {} '{}' -> '{}' (U+{:04X})",
                    entry.old_id,
                    entry.old_name,
                    name,
                    codepoint
                );
                renames.insert(entry.old_name.clone(), name.clone());
            }
            entry.new_name = name;
        }

        let mut owners: HashMap<&str, &GlyphEntry> = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            if let Some(other) = owners.insert(entry.new_name.as_str(), entry) {
                return Err(ReindexError::inconsistent(format!(
                    "glyphs '{}' and '{}' would both be named '{}'",
                    other.old_name, entry.old_name, entry.new_name
                )));
            }
        }
        Ok(renames)
    }

    /// New names that need an explicit `extraNames` record.
    pub fn extra_names(&self) -> ExtraNameSet {
        self.entries
            .iter()
            .filter(|e| !glyph_names::is_standard_name(&e.new_name))
            .map(|e| e.new_name.clone())
            .collect()
    }

    /// Plan the new glyph order: `order[new_id] == old_id`.
    ///
    /// Glyph 0 stays first. The rest sort by code point, with unmapped glyphs
    /// last, and ties broken by old name.
    pub fn plan_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        if let Some(rest) = order.get_mut(1..) {
            rest.sort_by(|&a, &b| self.entries[a].sort_key().cmp(&self.entries[b].sort_key()));
        }
        order
    }
}
