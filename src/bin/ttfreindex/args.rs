/// Command-line argument parsing module
///
/// This module defines the CLI structure using clap with derive macros.
/// It supports:
/// - Standard verbosity flags: -v, -vv
/// - Quiet flag: -q
/// - Verbose level flag: --verbose-level=LEVEL
/// - Environment variable RUST_LOG integration

use clap::Parser;
use std::path::PathBuf;

/// Re-index a TrueType font so that glyph order follows Unicode code point order
///
/// The font is dumped to TTX with an external converter (fontTools `ttx`), its glyphs
/// are renamed to standard production names and sorted by code point, and the result
/// is compiled back to a binary font. Glyph 0 (.notdef) always stays first.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ReindexArgs {
    /// Path to the source TTF font
    #[arg(long, value_name = "PATH")]
    pub src: PathBuf,

    /// Path of the re-indexed TTF font to write
    /// If the path contains a directory component, it will be created if it doesn't exist.
    #[arg(long, value_name = "PATH")]
    pub dst: PathBuf,

    /// TOML configuration file (defaults to ./ttfreindexrc.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Converter executable, overriding the configuration
    #[arg(long, value_name = "PROGRAM")]
    pub converter: Option<String>,

    /// Print the planned glyph order before writing the font
    #[arg(long)]
    pub print_plan: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease verbosity level (suppress most output except errors)
    #[arg(short)]
    pub quiet: bool,

    /// Set explicit verbosity level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub verbose_level: Option<String>,
}

impl ReindexArgs {
    /// Determine the effective log level based on CLI flags and environment variables
    ///
    /// Priority:
    /// 1. RUST_LOG environment variable (highest priority)
    /// 2. --verbose-level flag
    /// 3. -q flag or count of -v flags (lowest priority)
    pub fn effective_log_level(&self) -> String {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            return rust_log;
        }
        self.flag_log_level()
    }

    fn flag_log_level(&self) -> String {
        if let Some(level) = &self.verbose_level {
            return level.clone();
        }

        if self.quiet {
            return "error".to_string();
        }

        match self.verbose {
            0 => "info".to_string(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }
}
