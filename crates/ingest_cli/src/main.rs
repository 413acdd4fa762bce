use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use ingest_logging::ingest_debug;

mod config;
mod platform;

use config::{Cli, Config};
use platform::logging::{self, LogDestination};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    let destination = if config.log_file {
        LogDestination::Both(config.state_dir.clone())
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, config.verbose)?;
    ingest_debug!(
        "base_url={} state_dir={}",
        config.settings.base_url,
        config.state_dir.display()
    );

    platform::app::run(&config, cli.command)
}
