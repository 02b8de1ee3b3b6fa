//! fieldsync CLI
//!
//! Keeps the field blocks of model source files in step with a schema
//! snapshot.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Check { target, json } => commands::run_check(config, &target, json),
        Commands::Update {
            target,
            dry_run,
            sibling,
        } => commands::run_update(config, &target, dry_run, sibling),
        Commands::Migration { target } => commands::run_migration(config, &target),
    }
}
