//! Applying a diff to a field block and rendering it back to text.

use fieldsync_meta::FieldDeclaration;

use super::{BlockEntry, DeclarationBlock};
use crate::diff::DiffResult;

/// Indentation of every line the engine writes.
const ENTRY_INDENT: &str = "    ";

const PRIMARY_KEY_MARKER: &str = " # PK";

const TIMESTAMP_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Line name of the shorthand declaring both timestamp fields.
const TIMESTAMPS: &str = "timestamps";

fn terminator(line: &str) -> &str {
    let content = line.trim_end_matches(['\n', '\r']);
    &line[content.len()..]
}

/// Line for `field`, with the original comment and line ending.
fn regenerated(field: &FieldDeclaration, comment: Option<&String>, ending: &str) -> BlockEntry {
    let mut raw_line = format!("{ENTRY_INDENT}{field}");
    if let Some(comment) = comment {
        raw_line.push(' ');
        raw_line.push_str(comment);
    }
    raw_line.push_str(ending);
    BlockEntry {
        raw_line,
        field_name: Some(field.name.clone()),
        comment: comment.cloned(),
    }
}

/// True if `field` is exactly what the `timestamps` shorthand declares.
fn is_plain_timestamp(field: &FieldDeclaration, name: &str) -> bool {
    field.name == name
        && field.type_name == "datetime"
        && field.attributes.values().all(|v| v.is_nil() || v.is_false())
}

/// Returns a copy of `block` with `diff` applied to its entries.
///
/// Deleted fields lose their lines, modified fields get a regenerated line
/// that keeps the original trailing comment, and new fields are appended in
/// order. A plain `created_at`/`updated_at` pair among the new fields is
/// written as a single `timestamps` line at the end. New fields named in
/// `primary_keys` are marked with a `# PK` comment.
///
/// Prefix, markers and suffix are never touched, and neither are lines
/// whose field name could not be determined.
///
/// # Example
/// ```
/// use fieldsync_core::block::{apply_diff, parse_block, render};
/// use fieldsync_core::DiffResult;
/// use fieldsync_meta::FieldDeclaration;
///
/// let block = parse_block("class Author\nend\n").unwrap();
/// let diff = DiffResult {
///     new_fields: vec![FieldDeclaration::new("name", "string")],
///     ..Default::default()
/// };
/// let updated = apply_diff(&block, &diff, &[]);
/// assert_eq!(render(&updated), "class Author\n\n  fields do\n    name :string\n  end\n\nend\n");
/// ```
pub fn apply_diff(block: &DeclarationBlock, diff: &DiffResult, primary_keys: &[String]) -> DeclarationBlock {
    let newline = block.newline();
    let is_deleted = |name: &str| diff.deleted_fields.iter().any(|f| f.name == name);
    let modified = |name: &str| diff.modified_fields.iter().find(|f| f.name == name);

    let mut entries: Vec<BlockEntry> = Vec::with_capacity(block.entries.len() + diff.new_fields.len());
    for entry in &block.entries {
        let Some(name) = entry.field_name.as_deref() else {
            entries.push(entry.clone());
            continue;
        };
        if name == TIMESTAMPS && TIMESTAMP_FIELDS.iter().any(|f| is_deleted(f) || modified(f).is_some()) {
            // Spell out whichever timestamp fields survive
            tracing::debug!("expanding timestamps shorthand");
            let ending = terminator(&entry.raw_line);
            let mut kept: Vec<FieldDeclaration> = TIMESTAMP_FIELDS
                .iter()
                .filter(|f| !is_deleted(f))
                .map(|f| modified(f).cloned().unwrap_or_else(|| FieldDeclaration::new(*f, "datetime")))
                .collect();
            let last = kept.pop();
            let mut comment = entry.comment.as_ref();
            for field in &kept {
                let between = if ending.is_empty() { newline } else { ending };
                entries.push(regenerated(field, comment.take(), between));
            }
            if let Some(field) = last {
                entries.push(regenerated(&field, comment, ending));
            }
            continue;
        }
        if is_deleted(name) {
            tracing::debug!(field = name, "removing deleted field");
            continue;
        }
        match modified(name) {
            Some(field) => entries.push(regenerated(field, entry.comment.as_ref(), terminator(&entry.raw_line))),
            None => entries.push(entry.clone()),
        }
    }

    let fold_timestamps = TIMESTAMP_FIELDS
        .iter()
        .all(|name| diff.new_fields.iter().any(|f| is_plain_timestamp(f, name)));

    let mut appended = Vec::new();
    for field in &diff.new_fields {
        if fold_timestamps && TIMESTAMP_FIELDS.iter().any(|name| is_plain_timestamp(field, name)) {
            continue;
        }
        let is_primary_key = primary_keys.contains(&field.name);
        let mut raw_line = format!("{ENTRY_INDENT}{field}");
        if is_primary_key {
            raw_line.push_str(PRIMARY_KEY_MARKER);
        }
        raw_line.push_str(newline);
        let comment = is_primary_key.then(|| PRIMARY_KEY_MARKER.trim_start().to_string());
        appended.push(BlockEntry {
            raw_line,
            field_name: Some(field.name.clone()),
            comment,
        });
    }
    if fold_timestamps {
        appended.push(BlockEntry::generated(format!("{ENTRY_INDENT}{TIMESTAMPS}{newline}"), TIMESTAMPS));
    }

    if !appended.is_empty() {
        if let Some(last) = entries.last_mut() {
            if !last.raw_line.ends_with('\n') {
                last.raw_line.push_str(newline);
            }
        }
        entries.extend(appended);
    }

    DeclarationBlock {
        entries,
        ..block.clone()
    }
}

/// Renders a block back to source text.
pub fn render(block: &DeclarationBlock) -> String {
    let mut text = String::new();
    for line in &block.prefix {
        text.push_str(line);
    }
    text.push_str(&block.open_marker);
    for entry in &block.entries {
        text.push_str(&entry.raw_line);
    }
    text.push_str(&block.close_marker);
    for line in &block.suffix {
        text.push_str(line);
    }
    text
}
