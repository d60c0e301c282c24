//! Whole runs: configuration, import, validation, export and ownership

mod helpers;

use helpers::submission::{self, ACCESSION};
use isatab_core::model::Study;
use isatab_core::IsaTabError;
use isatab_service::Pipeline;
use isatab_service::config::{ExportFormat, OrphanMode, ToolkitConfig};
use isatab_service::ownership::OwnershipSpec;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_full_run() {
    let dir = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    let mut config = submission::config(root.path());
    config.export.formats = vec![ExportFormat::Isatab, ExportFormat::Magetab, ExportFormat::Pride];

    let pipeline = Pipeline::new(config).unwrap();
    let submission = pipeline.import(dir.path()).unwrap();
    let report = pipeline.validate(&submission).unwrap();
    assert!(report.is_valid(), "{}", report.summary());

    let summary = pipeline.export(&submission).unwrap();
    assert_eq!(summary.written.len(), 5);
    for path in &summary.written {
        assert!(path.is_file(), "{} not written", path.display());
        assert!(path.starts_with(root.path().join("export")));
    }
    assert_eq!(summary.dispatch.copied, 3);
    assert!(summary.orphans.orphans.is_empty());
}

#[test]
fn test_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("isatab.yaml");
    fs::write(
        &path,
        "\
parser:
  case_sensitive: false
validation:
  generic_fallback: ${ISATAB_TEST_UNSET_FALLBACK:-false}
repository:
  raw_data_dir: /srv/raw
  study_dir_template: \"${accession}\"
  orphan_mode: backup
export:
  formats: [isatab, magetab]
  output_dir: ${ISATAB_TEST_UNSET_OUTPUT:-out}
",
    )
    .unwrap();

    let config = ToolkitConfig::load(&path).unwrap();
    assert!(!config.validation.generic_fallback);
    assert_eq!(config.repository.orphan_mode, OrphanMode::Backup);
    assert_eq!(config.repository.study_dir(ACCESSION), ACCESSION);
    assert_eq!(config.export.formats, vec![ExportFormat::Isatab, ExportFormat::Magetab]);
    assert_eq!(config.export.output_dir, std::path::PathBuf::from("out"));
    assert_eq!(config.parser.delimiter, "\t");
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("isatab.yaml");
    fs::write(&path, "repository:\n  study_dir_template: studies\n").unwrap();

    let err = ToolkitConfig::load(&path).unwrap_err();
    assert!(matches!(err, IsaTabError::ConfigError(_)));
}

#[test]
fn test_missing_submission_dir() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(submission::config(dir.path())).unwrap();
    assert!(pipeline.import(&dir.path().join("absent")).is_err());
}

#[test]
fn test_set_owners() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    let pipeline = Pipeline::new(submission::config(dir.path())).unwrap();
    let mut submission = pipeline.import(dir.path()).unwrap();

    let specs = OwnershipSpec::parse_all(&["MTBLS1=+alice,bob", "MTBLS1=-bob"]).unwrap();
    pipeline.set_owners(&mut submission, &specs).unwrap();
    let owners = &submission.store.get_type::<Study>(ACCESSION).unwrap().owners;
    assert_eq!(owners.iter().map(String::as_str).collect::<Vec<_>>(), vec!["alice"]);

    let replace = OwnershipSpec::parse_all(&["MTBLS1==carol"]).unwrap();
    pipeline.set_owners(&mut submission, &replace).unwrap();
    let owners = &submission.store.get_type::<Study>(ACCESSION).unwrap().owners;
    assert_eq!(owners.iter().map(String::as_str).collect::<Vec<_>>(), vec!["carol"]);

    let unknown = OwnershipSpec::parse_all(&["MTBLS9=+dave"]).unwrap();
    let err = pipeline.set_owners(&mut submission, &unknown).unwrap_err();
    assert!(matches!(err, IsaTabError::MissingValue { .. }));
}
