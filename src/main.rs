//! ll-toolbox - offline asset cache and off-thread image encoder.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod encode;
mod logger;
mod offline;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ToolboxConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);
    // stdout carries the response stream in worker mode
    logger::use_stderr(cli.is_worker());

    let config = ToolboxConfig::load(&cli)?;
    if let Some(path) = &config.config_path {
        debug!("config"; "loaded {}", path.display());
    }

    match &cli.command {
        Commands::Encode { args } => cli::encode::run(args),
        Commands::Worker => cli::worker::run(),
        Commands::Serve { .. } => cli::serve::serve(&config),
        Commands::Cache { action } => cli::cache::run(*action, &config),
    }
}
