//! Code point resolution.
//!
//! Walks the Basic Multilingual Plane and records, for each glyph, the lowest code
//! point the font's character map sends to it. Supplementary planes are not scanned.

use crate::glyph_table::GlyphTable;
use crate::ReindexError;
use log::{debug, trace};
use read_fonts::tables::cmap::{Cmap, Cmap4, CmapSubtable};
use read_fonts::TableProvider;
use skrifa::MetadataProvider;
use std::collections::HashMap;

/// End (exclusive) of the scanned code point range.
pub const SCAN_END: u32 = 0xFFFF;

/// A font's character map, as seen by the resolver.
pub trait GlyphLookup {
    /// The glyph owning `codepoint`, or `None` if the font has no glyph for it.
    /// Glyph 0 is never returned.
    fn glyph_for_codepoint(&self, codepoint: u32) -> Result<Option<u32>, ReindexError>;

    /// Number of glyphs the font declares, if known.
    fn glyph_count(&self) -> Option<usize> {
        None
    }
}

/// Record the canonical code point of every glyph reachable from the BMP.
///
/// Returns the number of glyphs that received a code point.
pub fn resolve_codepoints<L: GlyphLookup + ?Sized>(
    lookup: &L,
    table: &mut GlyphTable,
) -> Result<usize, ReindexError> {
    let mut resolved = 0;
    for codepoint in 0..SCAN_END {
        let Some(glyph) = lookup.glyph_for_codepoint(codepoint)? else {
            continue;
        };
        if table.record_codepoint(glyph as usize, codepoint)? {
            resolved += 1;
        } else {
            trace!(
                "U+{:04X} also maps to glyph {}, keeping the lower code point",
                codepoint,
                glyph
            );
        }
    }
    Ok(resolved)
}

/// A TrueType/OpenType font decoded with skrifa.
pub struct FontFile<'a> {
    charmap: skrifa::charmap::Charmap<'a>,
    glyph_count: usize,
}

impl<'a> FontFile<'a> {
    /// Decode `data`. The font must carry `cmap` and `maxp` tables.
    pub fn parse(data: &'a [u8]) -> Result<Self, ReindexError> {
        let tables = read_fonts::FontRef::new(data)
            .map_err(|e| ReindexError::decode(format!("failed to parse font: {}", e)))?;
        let cmap = tables
            .cmap()
            .map_err(|e| ReindexError::decode(format!("cannot read cmap table: {}", e)))?;
        check_cmap(&cmap)?;
        let glyph_count = tables
            .maxp()
            .map_err(|e| ReindexError::decode(format!("cannot read maxp table: {}", e)))?
            .num_glyphs() as usize;

        let font = skrifa::FontRef::new(data)
            .map_err(|e| ReindexError::decode(format!("failed to parse font: {}", e)))?;
        let charmap = font.charmap();
        if !charmap.has_map() {
            return Err(ReindexError::decode(
                "cmap table has no supported Unicode subtable",
            ));
        }
        debug!("Decoded font with {} glyphs", glyph_count);
        Ok(FontFile {
            charmap,
            glyph_count,
        })
    }
}

/// Reject character maps whose lookups would silently come back empty.
///
/// skrifa answers "no glyph" for an unreadable subtable and for a segment pointing
/// outside its glyph ID array.
fn check_cmap(cmap: &Cmap) -> Result<(), ReindexError> {
    for record in cmap.encoding_records() {
        let subtable = record.subtable(cmap.offset_data()).map_err(|e| {
            ReindexError::decode(format!(
                "cannot read cmap subtable (platform {:?}, encoding {}): {}",
                record.platform_id(),
                record.encoding_id(),
                e
            ))
        })?;
        if let CmapSubtable::Format4(format4) = subtable {
            check_format4(&format4)?;
        }
    }
    Ok(())
}

fn check_format4(format4: &Cmap4) -> Result<(), ReindexError> {
    let starts = format4.start_code();
    let ends = format4.end_code();
    let deltas = format4.id_delta();
    let range_offsets = format4.id_range_offsets();
    let seg_count = format4.seg_count_x2() as usize / 2;
    if starts.len() < seg_count
        || ends.len() < seg_count
        || deltas.len() < seg_count
        || range_offsets.len() < seg_count
    {
        return Err(ReindexError::decode(format!(
            "cmap format 4 subtable is truncated: {} segments declared",
            seg_count
        )));
    }
    let glyph_ids = format4.glyph_id_array().len();

    for index in 0..seg_count {
        let start = starts[index].get() as usize;
        let end = ends[index].get() as usize;
        if end < start {
            return Err(ReindexError::decode(format!(
                "cmap format 4 segment {} ends (U+{:04X}) before it starts (U+{:04X})",
                index, end, start
            )));
        }
        let range_offset = range_offsets[index].get() as usize;
        if range_offset == 0 {
            continue;
        }
        // Offsets count from this segment's own idRangeOffset slot.
        let skipped = seg_count - index;
        let first = range_offset / 2;
        let last = first + (end - start);
        if first < skipped || last - skipped >= glyph_ids {
            return Err(ReindexError::decode(format!(
                "cmap format 4 segment U+{:04X}..U+{:04X} has idRangeOffset {:#06x} \
                 outside its {}-entry glyph ID array",
                start, end, range_offset, glyph_ids
            )));
        }
    }
    Ok(())
}

impl GlyphLookup for FontFile<'_> {
    fn glyph_for_codepoint(&self, codepoint: u32) -> Result<Option<u32>, ReindexError> {
        Ok(self
            .charmap
            .map(codepoint)
            .map(|gid| gid.to_u32())
            .filter(|&gid| gid != 0))
    }

    fn glyph_count(&self) -> Option<usize> {
        Some(self.glyph_count)
    }
}

/// An in-memory character map, for documents whose font is not at hand.
#[derive(Debug, Clone, Default)]
pub struct CodepointMap {
    mappings: HashMap<u32, u32>,
}

impl CodepointMap {
    pub fn new(mappings: HashMap<u32, u32>) -> Self {
        CodepointMap { mappings }
    }
}

impl GlyphLookup for CodepointMap {
    fn glyph_for_codepoint(&self, codepoint: u32) -> Result<Option<u32>, ReindexError> {
        Ok(self
            .mappings
            .get(&codepoint)
            .copied()
            .filter(|&gid| gid != 0))
    }
}
