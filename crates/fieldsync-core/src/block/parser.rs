//! Splitting source text around its field block.

use regex::Regex;
use std::sync::LazyLock;

use super::{BlockEntry, DeclarationBlock, MarkerStyle};
use crate::error::{Error, Result};

static DO_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*fields\s+do(?:\s(.+))?$").expect("Invalid open marker regex"));

static DO_CLOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*end(?:\s(.+))?$").expect("Invalid close marker regex"));

static BRACE_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*fields\s+\{(?:\s(.+))?$").expect("Invalid open marker regex"));

static BRACE_CLOSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\}(?:\s(.+))?$").expect("Invalid close marker regex"));

static CLASS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*class\b").expect("Invalid class regex"));

/// Field-name patterns, tried in order: the `timestamps` shorthand,
/// `field :name`, `field "name"`, `name ...`.
static FIELD_NAME_REGEXES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"^\s*(timestamps)\s*(?:#.*)?$").expect("Invalid field regex"),
        Regex::new(r#"^\s*field\s+:(\w+).+$"#).expect("Invalid field regex"),
        Regex::new(r#"^\s*field\s+['"](.+?)['"].+$"#).expect("Invalid field regex"),
        Regex::new(r"^\s*(\w+).+$").expect("Invalid field regex"),
    ]
});

/// Result of a single pass over the lines, before any block is synthesized.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    pub prefix: Vec<String>,
    pub open_marker: Option<String>,
    pub entries: Vec<BlockEntry>,
    pub close_marker: Option<String>,
    pub suffix: Vec<String>,
    pub style: MarkerStyle,
}

enum State {
    BeforeBlock,
    InBlock,
    AfterBlock,
}

fn content(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn close_regex(style: MarkerStyle) -> &'static Regex {
    match style {
        MarkerStyle::Do => &*DO_CLOSE_REGEX,
        MarkerStyle::Brace => &*BRACE_CLOSE_REGEX,
    }
}

pub(crate) fn scan(text: &str) -> Scan {
    let mut scan = Scan::default();
    let mut state = State::BeforeBlock;

    for line in text.split_inclusive('\n') {
        let stripped = content(line);
        match state {
            State::BeforeBlock => {
                let style = if DO_OPEN_REGEX.is_match(stripped) {
                    Some(MarkerStyle::Do)
                } else if BRACE_OPEN_REGEX.is_match(stripped) {
                    Some(MarkerStyle::Brace)
                } else {
                    None
                };
                match style {
                    Some(style) => {
                        scan.open_marker = Some(line.to_string());
                        scan.style = style;
                        state = State::InBlock;
                    }
                    None => scan.prefix.push(line.to_string()),
                }
            }
            State::InBlock => {
                if close_regex(scan.style).is_match(stripped) {
                    scan.close_marker = Some(line.to_string());
                    state = State::AfterBlock;
                } else {
                    scan.entries.push(classify(line));
                }
            }
            State::AfterBlock => scan.suffix.push(line.to_string()),
        }
    }
    scan
}

/// Name and trailing comment of one block line.
fn classify(line: &str) -> BlockEntry {
    let stripped = content(line);
    let field_name = FIELD_NAME_REGEXES
        .iter()
        .find_map(|regex| regex.captures(stripped))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    let comment = field_name.as_ref().and_then(|_| trailing_comment(stripped));
    BlockEntry {
        raw_line: line.to_string(),
        field_name,
        comment,
    }
}

/// `# ...` to the end of the line, ignoring `#` inside string literals.
fn trailing_comment(line: &str) -> Option<String> {
    let mut quote = None;
    let mut escaped = false;
    for (pos, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '#' if pos > 0 && line.len() > pos + 1 => return Some(line[pos..].to_string()),
                _ => {}
            },
        }
    }
    None
}

/// Parses the field block out of a model source file.
///
/// When the file has no block, an empty `fields do` / `end` pair is
/// synthesized after the first `class` line and a blank line, and is
/// followed by a blank line unless one is already there.
///
/// # Errors
/// Returns `Error::ModelDeclarationNotFound` if the file has neither a block
/// nor a class declaration.
///
/// # Example
/// ```
/// use fieldsync_core::block::parse_block;
///
/// let text = "class Author < Base\n  fields do\n    name :string # full name\n  end\nend\n";
/// let block = parse_block(text).unwrap();
/// assert_eq!(block.entries.len(), 1);
/// assert_eq!(block.entries[0].field_name.as_deref(), Some("name"));
/// assert_eq!(block.entries[0].comment.as_deref(), Some("# full name"));
/// ```
pub fn parse_block(text: &str) -> Result<DeclarationBlock> {
    let scan = scan(text);
    if let Some(open_marker) = scan.open_marker {
        if scan.close_marker.is_none() {
            tracing::warn!("field block is never closed; it runs to the end of the file");
        }
        return Ok(DeclarationBlock {
            prefix: scan.prefix,
            open_marker,
            entries: scan.entries,
            close_marker: scan.close_marker.unwrap_or_default(),
            suffix: scan.suffix,
            style: scan.style,
        });
    }

    let mut lines = scan.prefix;
    let class_index = lines
        .iter()
        .position(|line| CLASS_REGEX.is_match(line))
        .ok_or(Error::ModelDeclarationNotFound)?;
    let newline = if lines[class_index].ends_with("\r\n") { "\r\n" } else { "\n" };

    let mut suffix = lines.split_off(class_index + 1);
    let mut prefix = lines;
    if !prefix[class_index].ends_with('\n') {
        prefix[class_index].push_str(newline);
    }
    prefix.push(newline.to_string());
    if suffix.first().is_some_and(|line| !line.trim().is_empty()) {
        suffix.insert(0, newline.to_string());
    }
    tracing::debug!(line = class_index + 1, "synthesized field block after class declaration");

    Ok(DeclarationBlock {
        prefix,
        open_marker: format!("  fields do{newline}"),
        entries: Vec::new(),
        close_marker: format!("  end{newline}"),
        suffix,
        style: MarkerStyle::Do,
    })
}
