//! Synchronizer for keeping model field blocks in step with their tables
//!
//! This module provides:
//! - **check**: Report models whose declarations differ from the schema
//! - **update**: Rewrite the field blocks of those models
//! - **migration**: Migration text that would change the schema instead

mod check;
mod engine;

pub use check::{CheckReport, FileChange, ModelFailure, ModelReport, UpdateReport};
pub use engine::{Synchronizer, WriteMode};
