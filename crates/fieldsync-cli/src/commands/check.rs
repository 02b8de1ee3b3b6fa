//! Check command implementation

use std::path::Path;

use colored::Colorize;
use fieldsync_core::Synchronizer;

use super::print_failures;
use crate::cli::TargetArgs;
use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the check command
///
/// Lists every model whose declared fields differ from its table. Returns
/// an error when anything differs or fails, so scripts see a non-zero exit.
pub fn run_check(config: Option<&Path>, target: &TargetArgs, json: bool) -> Result<()> {
    let context = Context::load(config, target)?;
    let synchronizer = Synchronizer::new(&context.registry, context.config.core.primary_keys);
    let report = synchronizer.check(&context.models);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if !report.omitted.is_empty() {
            println!("{} Omitted: {}", "=>".blue().bold(), report.omitted.join(", ").dimmed());
        }
        for model in &report.models {
            print!("{model}");
        }
        print_failures(&report.failures);
        if report.is_clean() {
            println!("{} All models are in sync.", "OK".green().bold());
        } else if !report.models.is_empty() {
            println!();
            println!("Run {} to apply.", "fieldsync update".cyan());
        }
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} model(s) out of sync, {} failed",
            report.models.len(),
            report.failures.len()
        )))
    }
}
