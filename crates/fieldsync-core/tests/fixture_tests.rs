//! Golden-file tests using test-fixtures/models/
//!
//! Each case directory holds model files `before/` an update and the
//! expected files `after/` it, all checked against `schema.json`.

use std::fs;
use std::path::{Path, PathBuf};

use fieldsync_core::{SchemaSnapshot, Synchronizer, WriteMode};
use fieldsync_meta::{PrimaryKeyPolicy, Registry};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::{TempDir, tempdir};

const MODEL_FILES: [&str; 2] = ["author.rb", "book.rb"];

/// Normalize line endings to LF for cross-platform comparison.
fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n")
}

/// Path to the model fixtures (relative to the workspace root).
fn fixtures_dir() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/fieldsync-core -> ../../test-fixtures
    manifest_dir.join("../../test-fixtures/models")
}

/// Copy a case's `before/` files into a fresh temporary project.
fn project_for(case: &str) -> TempDir {
    let dir = tempdir().unwrap();
    for file in MODEL_FILES {
        let source = fixtures_dir().join(case).join("before").join(file);
        let content = fs::read_to_string(&source)
            .unwrap_or_else(|e| panic!("Failed to read fixture at {}: {}", source.display(), e));
        fs::write(dir.path().join(file), normalize_line_endings(&content)).unwrap();
    }
    dir
}

fn expected(case: &str, file: &str) -> String {
    let path = fixtures_dir().join(case).join("after").join(file);
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read expected output at {}: {}", path.display(), e));
    normalize_line_endings(&content)
}

fn load_models(root: &Path) -> Vec<fieldsync_core::SourceModel> {
    SchemaSnapshot::load(&fixtures_dir().join("schema.json"))
        .unwrap()
        .into_models(root)
        .unwrap()
}

#[rstest]
#[case::bare("bare")]
#[case::clean("clean")]
#[case::dirty("dirty")]
fn test_update_matches_expected(#[case] case: &str) {
    let project = project_for(case);
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.update(&load_models(project.path()), WriteMode::InPlace);
    assert!(report.is_success(), "{:?}", report.failures);

    for file in MODEL_FILES {
        let actual = fs::read_to_string(project.path().join(file)).unwrap();
        assert_eq!(actual, expected(case, file), "{case}/{file}");
    }
}

#[rstest]
#[case::bare("bare")]
#[case::clean("clean")]
#[case::dirty("dirty")]
fn test_second_update_is_a_no_op(#[case] case: &str) {
    let project = project_for(case);
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    synchronizer.update(&load_models(project.path()), WriteMode::InPlace);
    let first: Vec<String> = MODEL_FILES
        .iter()
        .map(|f| fs::read_to_string(project.path().join(f)).unwrap())
        .collect();

    let report = synchronizer.update(&load_models(project.path()), WriteMode::InPlace);
    assert!(report.changed.is_empty(), "{:?}", report.changed);
    assert!(synchronizer.check(&load_models(project.path())).is_clean());

    let second: Vec<String> = MODEL_FILES
        .iter()
        .map(|f| fs::read_to_string(project.path().join(f)).unwrap())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn test_clean_case_is_reported_clean() {
    let project = project_for("clean");
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.check(&load_models(project.path()));
    assert!(report.is_clean(), "{report:?}");
}

#[test]
fn test_dirty_case_check_report() {
    let project = project_for("dirty");
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.check(&load_models(project.path()));
    assert_eq!(report.models.len(), 2);

    let author = &report.models[0];
    assert_eq!(author.model, "Author");
    assert_eq!(author.new_fields, vec!["event :datetime"]);
    assert_eq!(
        author.modified_fields,
        vec![
            "birthdate :date, :unique",
            "decnum :decimal, :default=>BigDecimal('1.2'), :precision=>10, :scale=>3",
        ]
    );
    assert_eq!(author.deleted_fields, vec!["xxxx :string", "eventx :datetime"]);

    let book = &report.models[1];
    assert_eq!(
        book.new_fields,
        vec!["created_at :datetime, :null=>false", "updated_at :datetime, :null=>false"]
    );
    assert_eq!(book.deleted_fields, vec!["zzzzz :integer"]);

    // check never writes
    let before = fs::read_to_string(fixtures_dir().join("dirty/before/author.rb")).unwrap();
    let current = fs::read_to_string(project.path().join("author.rb")).unwrap();
    assert_eq!(normalize_line_endings(&before), current);
}

#[test]
fn test_sibling_output_leaves_models_untouched() {
    let project = project_for("bare");
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.update(&load_models(project.path()), WriteMode::Sibling);
    assert_eq!(report.changed.len(), 2);

    let original = fs::read_to_string(project.path().join("author.rb")).unwrap();
    assert!(!original.contains("fields do"));
    let sibling = fs::read_to_string(project.path().join("author_with_fields.rb")).unwrap();
    assert_eq!(sibling, expected("bare", "author.rb"));
}

#[test]
fn test_dry_run_reports_without_writing() {
    let project = project_for("dirty");
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.update(&load_models(project.path()), WriteMode::DryRun);
    assert!(report.dry_run);
    assert_eq!(report.changed.len(), 2);
    let author = &report.changed[0];
    assert!(author.diff.contains("-      xxxx :string\n"), "{}", author.diff);
    assert!(author.diff.contains("+    event :datetime\n"), "{}", author.diff);

    let current = fs::read_to_string(project.path().join("author.rb")).unwrap();
    assert!(current.contains("xxxx :string"));
}

#[test]
fn test_migration_for_dirty_case() {
    let project = project_for("dirty");
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let (migration, failures) = synchronizer.migration(&load_models(project.path()));
    assert!(failures.is_empty());
    assert!(migration.up.contains("  add_column :authors, :xxxx, :string\n"));
    assert!(migration.up.contains("  change_column :authors, :birthdate, :integer\n"));
    assert!(migration.down.contains("  change_column :authors, :birthdate, :date\n"));
    assert!(migration.up.contains("  remove_column :books, :created_at\n"));
    assert!(migration.down.contains("  add_column :books, :updated_at, :datetime, :null=>false\n"));
}
