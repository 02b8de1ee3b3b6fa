//! Synchronizer behaviour around failing and omitted models

use std::fs;

use fieldsync_core::{SchemaSnapshot, Synchronizer, WriteMode};
use fieldsync_meta::{PrimaryKeyPolicy, Registry};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const SNAPSHOT: &str = r#"{
  "models": [
    {"name": "Helper", "file": "helper.rb",
     "columns": [{"name": "label", "type": "string", "limit": 255}]},
    {"name": "Session", "file": "session.rb",
     "columns": [{"name": "token", "type": "string", "limit": 255}]},
    {"name": "Tag", "file": "tag.rb",
     "columns": [{"name": "label", "type": "string", "limit": 255}]},
    {"name": "Cover", "file": "cover.rb",
     "columns": [{"name": "image", "type": "raster"}]}
  ]
}"#;

fn setup() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("helper.rb"), "module Helper\nend\n").unwrap();
    fs::write(dir.path().join("session.rb"), "class Session < Base\n  fields :omitted\nend\n").unwrap();
    fs::write(dir.path().join("tag.rb"), "class Tag < Base\nend\n").unwrap();
    fs::write(dir.path().join("cover.rb"), "class Cover < Base\nend\n").unwrap();
    dir
}

#[test]
fn test_failing_models_do_not_stop_the_run() {
    let dir = setup();
    let models = SchemaSnapshot::parse(SNAPSHOT).unwrap().into_models(dir.path()).unwrap();
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.update(&models, WriteMode::InPlace);

    let failed: Vec<&str> = report.failures.iter().map(|f| f.model.as_str()).collect();
    assert_eq!(failed, vec!["Helper", "Cover"]);
    assert_eq!(report.failures[0].error, "Model declaration not found");
    assert_eq!(report.failures[0].file.as_deref(), Some(dir.path().join("helper.rb").as_path()));
    assert_eq!(report.failures[1].error, "Field type raster not defined");

    assert_eq!(report.changed.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("tag.rb")).unwrap(),
        "class Tag < Base\n\n  fields do\n    label :string\n  end\n\nend\n"
    );
    assert_eq!(fs::read_to_string(dir.path().join("helper.rb")).unwrap(), "module Helper\nend\n");
}

#[test]
fn test_omitted_models_are_skipped() {
    let dir = setup();
    let models = SchemaSnapshot::parse(SNAPSHOT).unwrap().into_models(dir.path()).unwrap();
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.check(&models);
    assert_eq!(report.omitted, vec!["Session"]);
    assert!(report.models.iter().all(|m| m.model != "Session"));

    synchronizer.update(&models, WriteMode::InPlace);
    assert_eq!(
        fs::read_to_string(dir.path().join("session.rb")).unwrap(),
        "class Session < Base\n  fields :omitted\nend\n"
    );
}

#[test]
fn test_check_reports_failures_and_differences() {
    let dir = setup();
    let models = SchemaSnapshot::parse(SNAPSHOT).unwrap().into_models(dir.path()).unwrap();
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.check(&models);
    assert!(!report.is_clean());
    // Helper has no block and declares nothing, so only its diff is reported
    let reported: Vec<&str> = report.models.iter().map(|m| m.model.as_str()).collect();
    assert_eq!(reported, vec!["Helper", "Tag"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].model, "Cover");
    assert_eq!(
        report.models[1].to_string(),
        format!("Tag ({}):\n  + label :string\n", dir.path().join("tag.rb").display())
    );
}

#[test]
fn test_registered_type_fixes_unknown_column() {
    let dir = setup();
    let models = SchemaSnapshot::parse(SNAPSHOT).unwrap().into_models(dir.path()).unwrap();
    let mut registry = Registry::with_builtins();
    registry.register_alias("raster", "binary");
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.update(&models, WriteMode::InPlace);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.model.as_str()).collect();
    assert_eq!(failed, vec!["Helper"]);
    assert!(
        fs::read_to_string(dir.path().join("cover.rb"))
            .unwrap()
            .contains("    image :raster\n")
    );
}

#[test]
fn test_model_without_block_ignores_vanished_association_column() {
    let dir = tempdir().unwrap();
    let source = "class Book < Base\n  belongs_to :author\nend\n";
    fs::write(dir.path().join("book.rb"), source).unwrap();
    let snapshot = r#"{"models": [
        {"name": "Book", "file": "book.rb", "primary_key": ["id"],
         "columns": [{"name": "id", "type": "integer", "null": false}],
         "belongs_to": [{"name": "author", "foreign_key": "author_id"}]}
    ]}"#;
    let models = SchemaSnapshot::parse(snapshot).unwrap().into_models(dir.path()).unwrap();
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    assert!(synchronizer.check(&models).is_clean());

    let report = synchronizer.update(&models, WriteMode::InPlace);
    assert!(report.changed.is_empty(), "{:?}", report.changed);
    assert_eq!(report.unchanged, vec!["Book"]);
    assert_eq!(fs::read_to_string(dir.path().join("book.rb")).unwrap(), source);

    let (migration, failures) = synchronizer.migration(&models);
    assert!(failures.is_empty());
    assert!(migration.is_empty(), "{migration}");
}

#[test]
fn test_vanished_timestamp_converges() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("post.rb"),
        "class Post < Base\n  fields do\n    title :string\n    timestamps\n  end\nend\n",
    )
    .unwrap();
    let snapshot = r#"{"models": [
        {"name": "Post", "file": "post.rb",
         "columns": [{"name": "title", "type": "string", "limit": 255},
                     {"name": "created_at", "type": "datetime", "null": false}]}
    ]}"#;
    let load = || SchemaSnapshot::parse(snapshot).unwrap().into_models(dir.path()).unwrap();
    let registry = Registry::with_builtins();
    let synchronizer = Synchronizer::new(&registry, PrimaryKeyPolicy::Never);

    let report = synchronizer.check(&load());
    assert_eq!(report.models[0].deleted_fields, vec!["updated_at :datetime"]);

    let report = synchronizer.update(&load(), WriteMode::InPlace);
    assert_eq!(report.changed.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("post.rb")).unwrap(),
        "class Post < Base\n  fields do\n    title :string\n    created_at :datetime\n  end\nend\n"
    );
    assert!(synchronizer.check(&load()).is_clean());
}
