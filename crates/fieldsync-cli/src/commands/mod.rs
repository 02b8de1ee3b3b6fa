//! Command implementations for fieldsync-cli

pub mod check;
pub mod migration;
pub mod update;

pub use check::run_check;
pub use migration::run_migration;
pub use update::run_update;

use colored::Colorize;
use fieldsync_core::ModelFailure;

/// Print failed models to stderr.
fn print_failures(failures: &[ModelFailure]) {
    for failure in failures {
        eprintln!("{} {}", "FAILED".red().bold(), failure);
    }
}
