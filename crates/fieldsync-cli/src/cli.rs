//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// fieldsync - Keep model field blocks in step with the database schema
#[derive(Parser, Debug)]
#[command(name = "fieldsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to fieldsync.toml in the project root)
    #[arg(short, long, global = true, env = "FIELDSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Which schema and models a command works on
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TargetArgs {
    /// Schema snapshot (JSON)
    #[arg(short, long, env = "FIELDSYNC_SCHEMA")]
    pub schema: PathBuf,

    /// Project root that model file paths are relative to
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Only process these models
    #[arg(short, long = "model")]
    pub models: Vec<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Report models whose declared fields differ from the schema
    ///
    /// Exits with status 1 when any model differs or fails.
    Check {
        #[command(flatten)]
        target: TargetArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Rewrite the field blocks of models that differ from the schema
    ///
    /// Examples:
    ///   fieldsync update -s schema.json            # Rewrite models in place
    ///   fieldsync update -s schema.json --dry-run  # Show the changes only
    ///   fieldsync update -s schema.json --sibling  # Write author_with_fields.rb etc.
    Update {
        #[command(flatten)]
        target: TargetArgs,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Write <file>_with_fields.rb next to each model instead of overwriting it
        #[arg(long, conflicts_with = "dry_run")]
        sibling: bool,
    },

    /// Print the migration that would change the schema to match the models
    Migration {
        #[command(flatten)]
        target: TargetArgs,
    },
}
