//! Migration command implementation

use std::path::Path;

use fieldsync_core::Synchronizer;

use super::print_failures;
use crate::cli::TargetArgs;
use crate::context::Context;
use crate::error::{CliError, Result};

/// Run the migration command
///
/// Prints the up and down sections that would change the schema to match
/// the declared fields. Models that fail are reported and left out.
pub fn run_migration(config: Option<&Path>, target: &TargetArgs) -> Result<()> {
    let context = Context::load(config, target)?;
    let synchronizer = Synchronizer::new(&context.registry, context.config.core.primary_keys);
    let (migration, failures) = synchronizer.migration(&context.models);

    print!("{migration}");
    print_failures(&failures);

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::user(format!("{} model(s) failed", failures.len())))
    }
}
