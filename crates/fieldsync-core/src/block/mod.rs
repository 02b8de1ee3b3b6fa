//! The field block inside a model source file
//!
//! ```text
//! class Author < ActiveRecord::Base      <- prefix
//!   fields do                           <- open marker
//!     name :string # comment            <- entries
//!     timestamps
//!   end                                 <- close marker
//!   has_many :books                     <- suffix
//! end
//! ```
//!
//! Every line keeps its own terminator, so rendering is plain
//! concatenation and text outside the block is reproduced byte for byte.

pub mod parser;
pub mod writer;

pub use parser::parse_block;
pub use writer::{apply_diff, render};

/// Which pair of markers delimits the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerStyle {
    /// `fields do` ... `end`
    #[default]
    Do,
    /// `fields {` ... `}`
    Brace,
}

/// One line between the markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEntry {
    /// The full line, terminator included.
    pub raw_line: String,
    /// Field the line declares, if it could be told.
    pub field_name: Option<String>,
    /// Trailing `# ...` comment, without terminator.
    pub comment: Option<String>,
}

impl BlockEntry {
    /// A line written by the engine itself.
    pub fn generated(raw_line: String, field_name: impl Into<String>) -> Self {
        Self {
            raw_line,
            field_name: Some(field_name.into()),
            comment: None,
        }
    }
}

/// A source file split around its field block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationBlock {
    pub prefix: Vec<String>,
    pub open_marker: String,
    pub entries: Vec<BlockEntry>,
    /// Empty when the block runs to the end of the file.
    pub close_marker: String,
    pub suffix: Vec<String>,
    pub style: MarkerStyle,
}

impl DeclarationBlock {
    /// Line terminator used for generated lines: the open marker's own.
    pub fn newline(&self) -> &'static str {
        if self.open_marker.ends_with("\r\n") { "\r\n" } else { "\n" }
    }

    /// Names of the fields the block currently declares, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|e| e.field_name.as_deref())
    }
}
