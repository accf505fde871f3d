//! The ttfreindex library rebuilds the glyph order of a TrueType font so that glyph IDs follow
//! Unicode code point order, renaming glyphs to their standard production names on the way.
//!
//! The font itself is never edited in binary form. Instead it is converted to its TTX textual
//! representation by an external converter (fontTools `ttx`), the glyph order and every
//! name-keyed record in that document are rewritten, and the result is converted back.
//!
//! The pipeline, leaf first:
//! - [`resolver`] walks the Basic Multilingual Plane and asks the font's character map which
//!   glyph owns each code point. The lowest code point reaching a glyph wins.
//! - [`glyph_table`] holds one entry per glyph, assigns canonical names (see [`glyph_names`])
//!   and plans the new order.
//! - [`ttx`] rewrites name references and emits the new `GlyphOrder` and `extraNames` blocks.
//! - [`converter`] runs the external binary/text converter.
//!
//! Rewriting an already loaded TTX document needs no external process:
//! ```rust
//! use std::collections::HashMap;
//! use ttfreindex::resolver::CodepointMap;
//!
//! fn example() -> Result<(), ttfreindex::ReindexError> {
//!     let ttx = "  <GlyphOrder>\n    <GlyphID id=\"0\" name=\".notdef\"/>\n    <GlyphID id=\"1\" name=\"A\"/>\n  </GlyphOrder>\n";
//!     let cmap = CodepointMap::new(HashMap::from([(0x5C, 1)]));
//!     let reindexed = ttfreindex::reindex_document(ttx, &cmap)?;
//!     assert!(reindexed.text.contains("name=\"backslash\""));
//!     Ok(())
//! }
//! ```
//!
//! Converting a font on disk goes through [`Reindexer`], which owns the temporary directory
//! holding the intermediate TTX files and removes it on every exit path.

pub mod config;
pub mod converter;
pub mod glyph_names;
pub mod glyph_table;
pub mod resolver;
pub mod ttx;

use config::ReindexConfig;
use converter::Converter;
use glyph_table::{ExtraNameSet, GlyphTable, RenameMap};
use log::{debug, info, warn};
use resolver::{FontFile, GlyphLookup};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Errors that can occur while re-indexing a font.
///
/// Every variant is fatal for the run: a malformed input cannot be re-indexed meaningfully.
#[derive(Debug)]
pub enum ReindexError {
    /// Reading or writing a file failed
    Io {
        message: String,
        path: String,
        suggestion: String,
    },
    /// The font bytes could not be decoded
    Decode { message: String, suggestion: String },
    /// A required section marker is absent from the TTX document
    MissingSection { marker: String },
    /// A section start marker has no matching end marker
    UnterminatedSection { marker: String, line: usize },
    /// The external converter could not be run or reported failure
    Converter {
        program: String,
        message: String,
        stderr: Option<String>,
    },
    /// The glyph data contradicts itself
    Inconsistent { message: String },
    /// The configuration could not be loaded
    Config { message: String, suggestion: String },
}

impl Error for ReindexError {}
impl fmt::Display for ReindexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReindexError::Io {
                message,
                path,
                suggestion,
            } => {
                write!(f, "File Error: {}", message)?;
                write!(f, "\n   Path: {}", path)?;
                write!(f, "\n   Suggestion: {}", suggestion)?;
                Ok(())
            }
            ReindexError::Decode {
                message,
                suggestion,
            } => {
                write!(f, "Font Decode Error: {}", message)?;
                write!(f, "\n   Suggestion: {}", suggestion)?;
                Ok(())
            }
            ReindexError::MissingSection { marker } => {
                write!(
                    f,
                    "TTX Error: section marker '{}' not found",
                    marker.trim()
                )
            }
            ReindexError::UnterminatedSection { marker, line } => {
                write!(
                    f,
                    "TTX Error: section '{}' opened at line {} is never closed",
                    marker.trim(),
                    line
                )
            }
            ReindexError::Converter {
                program,
                message,
                stderr,
            } => {
                write!(f, "Converter Error: {} ({})", message, program)?;
                if let Some(output) = stderr.as_deref().map(str::trim) {
                    if !output.is_empty() {
                        write!(f, "\n   Output: {}", output)?;
                    }
                }
                Ok(())
            }
            ReindexError::Inconsistent { message } => {
                write!(f, "Inconsistent Glyph Data: {}", message)
            }
            ReindexError::Config {
                message,
                suggestion,
            } => {
                write!(f, "Configuration Error: {}", message)?;
                write!(f, "\n   Suggestion: {}", suggestion)?;
                Ok(())
            }
        }
    }
}

impl ReindexError {
    /// Creates an I/O error for `path`
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        ReindexError::Io {
            message: err.to_string(),
            path: path.display().to_string(),
            suggestion: "Check that the file exists and that you have read/write permissions"
                .to_string(),
        }
    }

    /// Creates a decode error with just a message
    pub fn decode(message: impl Into<String>) -> Self {
        ReindexError::Decode {
            message: message.into(),
            suggestion: "Make sure the source is an uncorrupted TrueType font".to_string(),
        }
    }

    /// Creates a data-consistency error with just a message
    pub fn inconsistent(message: impl Into<String>) -> Self {
        ReindexError::Inconsistent {
            message: message.into(),
        }
    }
}

/// The outcome of re-indexing one TTX document.
#[derive(Debug)]
pub struct Reindexed {
    /// The rewritten TTX document
    pub text: String,
    /// Glyph entries in their original order, with code points and new names filled in
    pub table: GlyphTable,
    /// The planned order: `order[new_id]` is the old glyph ID
    pub order: Vec<usize>,
    /// Old name to new name, for renamed glyphs only
    pub renames: RenameMap,
    /// New names that need an explicit `extraNames` record
    pub extra_names: ExtraNameSet,
}

impl Reindexed {
    /// One line per glyph in the new order: new ID, old ID, code point, old and new name.
    pub fn plan_report(&self) -> String {
        let mut report = String::new();
        for (new_id, &old_id) in self.order.iter().enumerate() {
            let entry = &self.table.entries()[old_id];
            let codepoint = entry
                .codepoint
                .map(|cp| format!("{:08x}", cp))
                .unwrap_or_else(|| "--------".to_string());
            report.push_str(&format!(
                "nID={:<5}  oID={:<5}  r={}  on={:<20} nn={:<20}\n",
                new_id, old_id, codepoint, entry.old_name, entry.new_name
            ));
        }
        report
    }
}

/// Re-index a TTX document using `lookup` as the font's character map.
///
/// This is the whole in-memory transform: load the glyph order, resolve code points,
/// assign names, plan the order and rewrite the document.
pub fn reindex_document<L: GlyphLookup>(
    ttx_text: &str,
    lookup: &L,
) -> Result<Reindexed, ReindexError> {
    let names = ttx::read_glyph_order(ttx_text)?;
    let mut table = GlyphTable::new(names)?;
    debug!("Loaded glyph order with {} glyphs", table.len());

    if let Some(count) = lookup.glyph_count() {
        if count != table.len() {
            return Err(ReindexError::inconsistent(format!(
                "font declares {} glyphs but the glyph order lists {}",
                count,
                table.len()
            )));
        }
    }

    let resolved = resolver::resolve_codepoints(lookup, &mut table)?;
    debug!("Resolved code points for {} glyphs", resolved);

    let renames = table.assign_names()?;
    let extra_names = table.extra_names();
    let order = table.plan_order();
    info!(
        "Planned new order: {} glyphs, {} renamed, {} extra names",
        order.len(),
        renames.len(),
        extra_names.len()
    );

    let new_names: Vec<&str> = order
        .iter()
        .map(|&old_id| table.entries()[old_id].new_name.as_str())
        .collect();
    let rewrite = ttx::rewrite_document(
        ttx_text,
        &renames,
        &table.old_names(),
        &new_names,
        &extra_names,
    )?;
    if rewrite.extra_names_blocks == 0 && !extra_names.is_empty() {
        warn!(
            "{} glyph names need an extraNames record but the document has no extraNames block",
            extra_names.len()
        );
    }
    debug!("Rewrote {} name references", rewrite.rewritten_references);

    Ok(Reindexed {
        text: rewrite.text,
        table,
        order,
        renames,
        extra_names,
    })
}

/// Runs the full binary-to-binary pipeline.
pub struct Reindexer {
    converter: Converter,
    keep_intermediate: bool,
}

impl Reindexer {
    pub fn new(config: &ReindexConfig) -> Self {
        let converter = Converter::from_config(&config.converter);
        debug!("Using converter: {}", converter.program());
        Reindexer {
            converter,
            keep_intermediate: config.converter.keep_intermediate,
        }
    }

    /// Decode `src`, dump it to TTX and re-index the dump.
    ///
    /// Nothing is written outside the temporary directory until [`PreparedFont::write`].
    pub fn prepare(&self, src: &Path) -> Result<PreparedFont<'_>, ReindexError> {
        debug!("Reading source font from: {:?}", src);
        let data = fs::read(src).map_err(|e| ReindexError::io(src, e))?;
        let font = FontFile::parse(&data)?;

        let workdir = tempfile::Builder::new()
            .prefix("ttfreindex-")
            .tempdir()
            .map_err(|e| ReindexError::io(&std::env::temp_dir(), e))?;
        let dumped = workdir.path().join("source.ttx");
        self.converter.convert(src, &dumped)?;

        let text = fs::read_to_string(&dumped).map_err(|e| ReindexError::io(&dumped, e))?;
        let reindexed = reindex_document(&text, &font)?;
        Ok(PreparedFont {
            reindexer: self,
            workdir,
            reindexed,
        })
    }

    /// Re-index `src` and write the result to `dst`.
    pub fn run(&self, src: &Path, dst: &Path) -> Result<Reindexed, ReindexError> {
        self.prepare(src)?.write(dst)
    }
}

/// A re-indexed font waiting to be converted back to binary form.
///
/// Dropping it removes the intermediate files.
pub struct PreparedFont<'a> {
    reindexer: &'a Reindexer,
    workdir: TempDir,
    reindexed: Reindexed,
}

impl PreparedFont<'_> {
    pub fn reindexed(&self) -> &Reindexed {
        &self.reindexed
    }

    /// Convert the rewritten TTX to `dst`.
    pub fn write(self, dst: &Path) -> Result<Reindexed, ReindexError> {
        let rewritten = self.workdir.path().join("reindexed.ttx");
        fs::write(&rewritten, &self.reindexed.text)
            .map_err(|e| ReindexError::io(&rewritten, e))?;

        if let Some(parent) = dst.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating destination directory: {:?}", parent);
                fs::create_dir_all(parent).map_err(|e| ReindexError::io(parent, e))?;
            }
        }

        self.reindexer.converter.convert(&rewritten, dst)?;

        if self.reindexer.keep_intermediate {
            let kept = intermediate_path(dst);
            fs::copy(&rewritten, &kept).map_err(|e| ReindexError::io(&kept, e))?;
            info!("Kept intermediate TTX at: {:?}", kept);
        }
        Ok(self.reindexed)
    }
}

/// Where the rewritten TTX is kept when `keep_intermediate` is set.
pub fn intermediate_path(dst: &Path) -> PathBuf {
    dst.with_extension("ttx")
}
