/// Font re-indexing utility binary entry point
///
/// This binary rewrites a TrueType font so that glyph IDs follow Unicode code point order
/// and glyph names follow the Adobe Glyph List conventions.
///
/// # Examples
///
/// Basic usage:
/// ```sh
/// cargo run --bin ttfreindex -- --src fonts/Go-Regular.ttf --dst out/Go-Regular.ttf
/// ```
///
/// With verbosity control and the planned order printed:
/// ```sh
/// cargo run --bin ttfreindex -- -vv --print-plan --src fonts/Go-Regular.ttf --dst out/Go-Regular.ttf
/// ```
use clap::Parser;
use log::{debug, error, info};
use std::path::Path;
use std::process;
use ttfreindex::config::{self, ConfigSource, ReindexConfig};
use ttfreindex::Reindexer;

mod args;
mod logging;

use args::ReindexArgs;
use logging::init_logging;

fn main() {
    let args = ReindexArgs::parse();

    // Initialize logging based on CLI arguments and RUST_LOG environment variable
    if let Err(e) = init_logging(&args) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    debug!("Parsed arguments: {:?}", args);

    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

/// Get the configuration source based on CLI arguments or default behavior.
///
/// Priority order:
/// 1. If `--config` is explicitly provided, use that file
/// 2. If `ttfreindexrc.toml` exists in current directory, use it
/// 3. Otherwise use default configuration
fn get_config_source(args: &ReindexArgs) -> ConfigSource<'_> {
    if let Some(config_file) = args.config.as_deref() {
        return ConfigSource::File(config_file);
    }
    if Path::new(config::DEFAULT_CONFIG_FILE).exists() {
        return ConfigSource::File(config::DEFAULT_CONFIG_FILE);
    }
    ConfigSource::Default
}

fn load_config(args: &ReindexArgs) -> Result<ReindexConfig, Box<dyn std::error::Error>> {
    let source = get_config_source(args);
    debug!("Loading configuration from {:?}", source);
    let mut config = config::load_config_from_source(source)?;
    if let Some(program) = &args.converter {
        config.converter.program = program.clone();
    }
    Ok(config)
}

/// Main entry point for font re-indexing logic
fn run(args: &ReindexArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    let reindexer = Reindexer::new(&config);

    let reindexed = if args.print_plan {
        let prepared = reindexer.prepare(&args.src)?;
        print!("{}", prepared.reindexed().plan_report());
        prepared.write(&args.dst)?
    } else {
        reindexer.run(&args.src, &args.dst)?
    };
    info!(
        "Re-indexed {} glyphs ({} renamed)",
        reindexed.table.len(),
        reindexed.renames.len()
    );
    println!("Wrote {}", args.dst.display());
    Ok(())
}
