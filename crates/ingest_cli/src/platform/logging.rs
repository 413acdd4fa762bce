//! Logger setup for the `ingest` binary.
//!
//! Terminal output goes to stderr so stdout only carries command results.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ingest_engine::ensure_state_dir;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

pub const LOG_FILENAME: &str = "ingest.log";

/// Destination for log output.
pub enum LogDestination {
    Terminal,
    /// Terminal plus `ingest.log` in the given directory.
    Both(PathBuf),
}

/// Install the global logger. `verbose` lowers both thresholds to debug.
pub fn initialize(destination: LogDestination, verbose: bool) -> Result<()> {
    let (term_level, file_level) = levels(verbose);
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let LogDestination::Both(dir) = destination {
        let file = open_log_file(&dir)?;
        loggers.push(WriteLogger::new(file_level, config, file));
    }

    CombinedLogger::init(loggers).context("logger already initialized")
}

fn levels(verbose: bool) -> (LevelFilter, LevelFilter) {
    if verbose {
        (LevelFilter::Debug, LevelFilter::Debug)
    } else {
        (LevelFilter::Warn, LevelFilter::Info)
    }
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn open_log_file(dir: &Path) -> Result<File> {
    ensure_state_dir(dir)?;
    let path = dir.join(LOG_FILENAME);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("could not open log file {}", path.display()))
}
