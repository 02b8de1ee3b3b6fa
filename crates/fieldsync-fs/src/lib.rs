//! Filesystem access for fieldsync
//!
//! Model source files are read whole and rewritten atomically, so an
//! aborted run never leaves a half-written model behind.

pub mod error;
pub mod io;

pub use error::{Error, Result};
pub use io::{read_text, sibling_path, write_atomic, write_text};
