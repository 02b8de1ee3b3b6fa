//! Update command implementation

use std::path::Path;

use colored::Colorize;
use fieldsync_core::{Synchronizer, WriteMode};

use super::print_failures;
use crate::cli::TargetArgs;
use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the update command
///
/// Rewrites field blocks to match the schema. With `dry_run` the unified
/// diff of each change is printed and nothing is written.
pub fn run_update(config: Option<&Path>, target: &TargetArgs, dry_run: bool, sibling: bool) -> Result<()> {
    let context = Context::load(config, target)?;
    let mode = if dry_run {
        WriteMode::DryRun
    } else if sibling || context.config.core.sibling_output {
        WriteMode::Sibling
    } else {
        WriteMode::InPlace
    };

    if dry_run {
        println!("{} Dry run mode - no changes will be made", "=>".blue().bold());
    }

    let synchronizer = Synchronizer::new(&context.registry, context.config.core.primary_keys);
    let report = synchronizer.update(&context.models, mode);

    for change in &report.changed {
        if dry_run {
            print!("{}", change.diff);
        } else {
            println!("   {} {} ({})", "+".green(), change.path.display().to_string().cyan(), change.model.dimmed());
        }
    }
    print_failures(&report.failures);

    if report.changed.is_empty() && report.is_success() {
        println!("{} All models are in sync.", "OK".green().bold());
    } else if dry_run {
        println!("{} {} model(s) would change.", "=>".blue().bold(), report.changed.len());
    } else {
        println!("{} Updated {} model(s).", "OK".green().bold(), report.changed.len());
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::user(format!("{} model(s) failed", report.failures.len())))
    }
}
