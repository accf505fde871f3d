//! Configuration loading for the re-indexing pipeline.
//!
//! Configuration is optional TOML. Only the external converter is configurable; the
//! naming tables and the scanned code point range are fixed.
//!
//! # Configuration Example
//!
//! ```toml
//! [converter]
//! program = "/opt/fonttools/bin/ttx"  # converter executable (default "ttx")
//! args = ["-q"]                       # extra arguments, placed before "-o"
//! keep_intermediate = true            # keep the rewritten TTX next to the output font
//! ```
//!
//! Missing or ill-typed fields fall back to their defaults. A file that is not valid
//! TOML is an error.

use crate::ReindexError;
use std::fs;
use std::path::Path;
use toml::Value;

/// Name of the configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "ttfreindexrc.toml";

/// Default converter executable.
pub const DEFAULT_CONVERTER: &str = "ttx";

/// Where the configuration should be loaded from.
#[derive(Debug, Clone)]
pub enum ConfigSource<'a> {
    /// Use the built-in defaults
    Default,
    /// Load configuration from a file path
    File(&'a str),
    /// Use a TOML string
    Embedded(&'a str),
}

/// How to run the binary/text converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterConfig {
    pub program: String,
    pub args: Vec<String>,
    pub keep_intermediate: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            program: DEFAULT_CONVERTER.to_string(),
            args: Vec::new(),
            keep_intermediate: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReindexConfig {
    pub converter: ConverterConfig,
}

/// Parses the `[converter]` table, falling back to defaults field by field.
fn parse_converter(value: Option<&Value>, default: ConverterConfig) -> ConverterConfig {
    let Some(value) = value else {
        return default;
    };
    ConverterConfig {
        program: value
            .get("program")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(default.program),
        args: value
            .get("args")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or(default.args),
        keep_intermediate: value
            .get("keep_intermediate")
            .and_then(|v| v.as_bool())
            .unwrap_or(default.keep_intermediate),
    }
}

/// Parses a TOML configuration string.
///
/// # Examples
/// ```rust
/// use ttfreindex::config::parse_config_string;
///
/// let config = parse_config_string("[converter]\nprogram = \"fonttools-ttx\"\n").unwrap();
/// assert_eq!(config.converter.program, "fonttools-ttx");
/// assert!(!config.converter.keep_intermediate);
/// ```
pub fn parse_config_string(config_str: &str) -> Result<ReindexConfig, ReindexError> {
    let config: Value = toml::from_str(config_str).map_err(|e| ReindexError::Config {
        message: format!("invalid TOML: {}", e),
        suggestion: "Check the configuration file syntax".to_string(),
    })?;
    let default = ReindexConfig::default();
    Ok(ReindexConfig {
        converter: parse_converter(config.get("converter"), default.converter),
    })
}

/// Loads the configuration from `source`.
///
/// An explicitly named file that cannot be read is an error.
pub fn load_config_from_source(source: ConfigSource) -> Result<ReindexConfig, ReindexError> {
    match source {
        ConfigSource::Default => Ok(ReindexConfig::default()),
        ConfigSource::File(path) => {
            let config_str = fs::read_to_string(Path::new(path)).map_err(|e| {
                ReindexError::Config {
                    message: format!("cannot read '{}': {}", path, e),
                    suggestion: "Check the --config path".to_string(),
                }
            })?;
            parse_config_string(&config_str)
        }
        ConfigSource::Embedded(content) => parse_config_string(content),
    }
}
