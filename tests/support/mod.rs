//! Test fixtures: minimal binary fonts and matching TTX documents.
//!
//! The fonts carry just a `cmap` (one format 4 subtable, platform 3 encoding 1) and
//! a version 0.5 `maxp`, which is all the decoder looks at.
#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};
use std::collections::BTreeMap;
use std::io::Write;

/// One format 4 segment: `(start, end, idDelta, idRangeOffset)`.
pub type Segment = (u16, u16, i16, u16);

/// Build a cmap format 4 subtable with one segment per mapped code point.
fn build_cmap_format4(mappings: &BTreeMap<u16, u16>) -> Vec<u8> {
    let mut segments: Vec<Segment> = mappings
        .iter()
        .filter(|&(&cp, _)| cp != 0xFFFF)
        .map(|(&cp, &gid)| (cp, cp, gid.wrapping_sub(cp) as i16, 0))
        .collect();
    // End-of-segments marker
    segments.push((0xFFFF, 0xFFFF, 1, 0));
    write_cmap_format4(&segments, &[])
}

/// Write a cmap format 4 subtable from raw segments and a glyph ID array.
/// The segment list must already end with the 0xFFFF marker.
pub fn write_cmap_format4(segments: &[Segment], glyph_ids: &[u16]) -> Vec<u8> {
    let seg_count = segments.len() as u16;
    let mut power = 1u16;
    while power * 2 <= seg_count {
        power <<= 1;
    }
    let search_range = power * 2;
    let entry_selector = power.trailing_zeros() as u16;
    let range_shift = seg_count * 2 - search_range;
    let length = 16 + seg_count * 8 + glyph_ids.len() as u16 * 2;

    let mut data = Vec::new();
    data.write_u16::<BigEndian>(4).unwrap(); // format
    data.write_u16::<BigEndian>(length).unwrap();
    data.write_u16::<BigEndian>(0).unwrap(); // language
    data.write_u16::<BigEndian>(seg_count * 2).unwrap();
    data.write_u16::<BigEndian>(search_range).unwrap();
    data.write_u16::<BigEndian>(entry_selector).unwrap();
    data.write_u16::<BigEndian>(range_shift).unwrap();
    for (_, end, _, _) in segments {
        data.write_u16::<BigEndian>(*end).unwrap();
    }
    data.write_u16::<BigEndian>(0).unwrap(); // reservedPad
    for (start, _, _, _) in segments {
        data.write_u16::<BigEndian>(*start).unwrap();
    }
    for (_, _, delta, _) in segments {
        data.write_i16::<BigEndian>(*delta).unwrap();
    }
    for (_, _, _, range_offset) in segments {
        data.write_u16::<BigEndian>(*range_offset).unwrap();
    }
    for gid in glyph_ids {
        data.write_u16::<BigEndian>(*gid).unwrap();
    }
    data
}

/// Wrap one subtable in a cmap table with a single (3, 1) encoding record.
pub fn wrap_cmap_subtable(subtable: Vec<u8>) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u16::<BigEndian>(0).unwrap(); // version
    data.write_u16::<BigEndian>(1).unwrap(); // numTables
    data.write_u16::<BigEndian>(3).unwrap(); // platformID (Windows)
    data.write_u16::<BigEndian>(1).unwrap(); // encodingID (Unicode BMP)
    data.write_u32::<BigEndian>(12).unwrap(); // offset
    data.extend_from_slice(&subtable);
    data
}

pub fn build_cmap_table(mappings: &BTreeMap<u16, u16>) -> Vec<u8> {
    wrap_cmap_subtable(build_cmap_format4(mappings))
}

pub fn build_maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u32::<BigEndian>(0x0000_5000).unwrap(); // version 0.5
    data.write_u16::<BigEndian>(num_glyphs).unwrap();
    data
}

/// Assemble an sfnt from `(tag, data)` pairs. Tags must be sorted.
pub fn build_sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let mut power = 1u16;
    while power * 2 <= num_tables {
        power <<= 1;
    }
    let search_range = power * 16;
    let entry_selector = power.trailing_zeros() as u16;
    let range_shift = num_tables * 16 - search_range;

    let mut font = Vec::new();
    font.write_u32::<BigEndian>(0x0001_0000).unwrap();
    font.write_u16::<BigEndian>(num_tables).unwrap();
    font.write_u16::<BigEndian>(search_range).unwrap();
    font.write_u16::<BigEndian>(entry_selector).unwrap();
    font.write_u16::<BigEndian>(range_shift).unwrap();

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in tables {
        font.write_all(*tag).unwrap();
        font.write_u32::<BigEndian>(0).unwrap(); // checksum, unchecked
        font.write_u32::<BigEndian>(offset as u32).unwrap();
        font.write_u32::<BigEndian>(data.len() as u32).unwrap();
        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    font.extend_from_slice(&body);
    font
}

/// A font with `num_glyphs` glyphs and the given code point to glyph mappings.
pub fn build_font(num_glyphs: u16, mappings: &[(u16, u16)]) -> Vec<u8> {
    let mappings: BTreeMap<u16, u16> = mappings.iter().copied().collect();
    build_sfnt(&[
        (b"cmap", build_cmap_table(&mappings)),
        (b"maxp", build_maxp_table(num_glyphs)),
    ])
}

/// A font whose cmap is the given format 4 segments and glyph ID array.
pub fn build_font_from_segments(
    num_glyphs: u16,
    segments: &[Segment],
    glyph_ids: &[u16],
) -> Vec<u8> {
    build_sfnt(&[
        (b"cmap", wrap_cmap_subtable(write_cmap_format4(segments, glyph_ids))),
        (b"maxp", build_maxp_table(num_glyphs)),
    ])
}

/// The four-glyph font used across the integration tests:
/// `.notdef`, `A` at U+005C, `customglyph123` at U+2603 and an unmapped `.null`.
pub fn scenario_font() -> Vec<u8> {
    build_font(4, &[(0x5C, 1), (0x2603, 2)])
}

pub const SCENARIO_TTX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ttFont sfntVersion="\x00\x01\x00\x00" ttLibVersion="4.38">

  <GlyphOrder>
    <!-- The 'id' attribute is only for humans; it is ignored when parsed. -->
    <GlyphID id="0" name=".notdef"/>
    <GlyphID id="1" name="A"/>
    <GlyphID id="2" name="customglyph123"/>
    <GlyphID id="3" name=".null"/>
  </GlyphOrder>

  <hmtx>
    <mtx name=".notdef" width="500" lsb="0"/>
    <mtx name=".null" width="0" lsb="0"/>
    <mtx name="A" width="600" lsb="10"/>
    <mtx name="customglyph123" width="700" lsb="20"/>
  </hmtx>

  <cmap>
    <tableVersion version="0"/>
    <cmap_format_4 platformID="3" platEncID="1" language="0">
      <map code="0x5c" name="A"/><!-- REVERSE SOLIDUS -->
      <map code="0x2603" name="customglyph123"/><!-- SNOWMAN -->
    </cmap_format_4>
  </cmap>

  <glyf>
    <TTGlyph name=".notdef"/><!-- contains no outline data -->
    <TTGlyph name=".null"/><!-- contains no outline data -->
    <TTGlyph name="A" xMin="10" yMin="0" xMax="590" yMax="700">
      <contour>
        <pt x="10" y="0" on="1"/>
        <pt x="590" y="700" on="1"/>
      </contour>
      <instructions/>
    </TTGlyph>
    <TTGlyph name="customglyph123" xMin="0" yMin="0" xMax="590" yMax="700">
      <component glyphName="A" x="0" y="0" flags="0x4"/>
    </TTGlyph>
  </glyf>

  <post>
    <formatType value="2.0"/>
    <extraNames>
      <psName name="customglyph123"/>
    </extraNames>
  </post>

</ttFont>
"#;
