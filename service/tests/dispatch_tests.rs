//! Data file dispatch into the repository and orphan handling

mod helpers;

use helpers::submission::{self, ACCESSION};
use isatab_core::Result;
use isatab_core::model::AssayRecord;
use isatab_service::Pipeline;
use isatab_service::config::{OrphanMode, ToolkitConfig};
use isatab_service::file_system_adapter::{FileMetadata, FileSystemOperations, LocalFileSystem};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

/// Local file system that counts copies
#[derive(Default)]
struct CountingFileSystem {
    inner: LocalFileSystem,
    copies: Rc<Cell<usize>>,
}

impl FileSystemOperations for CountingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.inner.write(path, contents)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.create_dir_all(path)
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.inner.list_files(path)
    }

    fn metadata(&self, path: &Path) -> Result<Option<FileMetadata>> {
        self.inner.metadata(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        self.copies.set(self.copies.get() + 1);
        self.inner.copy(from, to)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.inner.remove_file(path)
    }
}

struct Fixture {
    _submission: TempDir,
    _repository: TempDir,
    submission: PathBuf,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let submission = TempDir::new().unwrap();
        let repository = TempDir::new().unwrap();
        submission::write_submission(submission.path());
        Self {
            submission: submission.path().to_path_buf(),
            root: repository.path().to_path_buf(),
            _submission: submission,
            _repository: repository,
        }
    }

    fn config(&self) -> ToolkitConfig {
        submission::config(&self.root)
    }

    fn generic_path(&self, file: &str) -> PathBuf {
        self.root
            .join("generic")
            .join(format!("study_{ACCESSION}"))
            .join("metabolite_profiling")
            .join("nmr_spectroscopy")
            .join(file)
    }
}

#[test]
fn test_dispatch_copies_once() {
    let fixture = Fixture::new();
    let fs_spy = CountingFileSystem::default();
    let copies = Rc::clone(&fs_spy.copies);
    let pipeline = Pipeline::with_file_system(fixture.config(), fs_spy).unwrap();
    let submission = pipeline.import(&fixture.submission).unwrap();

    let first = pipeline.export(&submission).unwrap();
    assert_eq!(first.dispatch.copied, 3);
    assert_eq!(first.dispatch.skipped, 0);
    assert_eq!(copies.get(), 3);
    assert!(submission::raw_path(&fixture.root, "fid/run1.zip").is_file());
    assert!(submission::raw_path(&fixture.root, "fid/run2.zip").is_file());
    assert!(fixture.generic_path("m_MTBLS1.tsv").is_file());
    assert!(first.orphans.orphans.is_empty());
    assert_eq!(first.orphans.checked, 3);

    let second = pipeline.export(&submission).unwrap();
    assert_eq!(second.dispatch.copied, 0);
    assert_eq!(second.dispatch.skipped, 3);
    assert_eq!(copies.get(), 3);
}

#[test]
fn test_default_source_is_submission_dir() {
    let fixture = Fixture::new();
    let config = fixture.config();
    assert_eq!(config.repository.source_dir, None);
    assert!(!std::env::current_dir().unwrap().starts_with(&fixture.submission));

    let pipeline = Pipeline::new(config).unwrap();
    let summary = pipeline
        .export(&pipeline.import(&fixture.submission).unwrap())
        .unwrap();
    assert_eq!(summary.dispatch.copied, 3);
    assert_eq!(
        fs::read_to_string(submission::raw_path(&fixture.root, "fid/run1.zip")).unwrap(),
        "content of fid/run1.zip"
    );
}

#[test]
fn test_source_dir_overrides_submission_dir() {
    let fixture = Fixture::new();
    let staging = TempDir::new().unwrap();
    for file in submission::DATA_FILES {
        let path = staging.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "staged").unwrap();
    }
    let mut config = fixture.config();
    config.repository.source_dir = Some(staging.path().to_path_buf());

    let pipeline = Pipeline::new(config).unwrap();
    let summary = pipeline
        .export(&pipeline.import(&fixture.submission).unwrap())
        .unwrap();
    assert_eq!(summary.dispatch.copied, 3);
    assert_eq!(
        fs::read_to_string(submission::raw_path(&fixture.root, "fid/run1.zip")).unwrap(),
        "staged"
    );
}

#[test]
fn test_dispatch_follows_exported_rows() {
    let fixture = Fixture::new();
    let pipeline = Pipeline::new(fixture.config()).unwrap();
    let mut submission = pipeline.import(&fixture.submission).unwrap();
    assert_eq!(pipeline.export(&submission).unwrap().dispatch.copied, 3);

    let second_row = submission
        .store
        .keys_of_type::<AssayRecord>()
        .into_iter()
        .find(|key| key.ends_with(":000001"))
        .map(str::to_string)
        .unwrap();
    submission.store.remove::<AssayRecord>(&second_row).unwrap();

    let summary = pipeline.export(&submission).unwrap();
    assert_eq!(summary.dispatch.skipped, 2);
    assert_eq!(
        summary.orphans.orphans,
        vec![submission::raw_path(&fixture.root, "fid/run2.zip")]
    );
}

#[test]
fn test_modified_source_is_copied_again() {
    let fixture = Fixture::new();
    let pipeline = Pipeline::new(fixture.config()).unwrap();
    let submission = pipeline.import(&fixture.submission).unwrap();
    pipeline.export(&submission).unwrap();

    let source = fixture.submission.join("fid/run1.zip");
    let file = fs::File::options().write(true).open(&source).unwrap();
    file.set_modified(std::time::SystemTime::UNIX_EPOCH).unwrap();
    drop(file);

    let summary = pipeline.export(&submission).unwrap();
    assert_eq!(summary.dispatch.copied, 1);
    assert_eq!(summary.dispatch.skipped, 2);
}

#[test]
fn test_local_export_skips_repository() {
    let fixture = Fixture::new();
    let mut config = fixture.config();
    config.repository.local_export = true;
    let fs_spy = CountingFileSystem::default();
    let copies = Rc::clone(&fs_spy.copies);
    let pipeline = Pipeline::with_file_system(config, fs_spy).unwrap();

    let summary = pipeline
        .export(&pipeline.import(&fixture.submission).unwrap())
        .unwrap();
    assert!(!summary.written.is_empty());
    assert_eq!(summary.dispatch.copied, 0);
    assert_eq!(copies.get(), 0);
    assert!(!fixture.root.join("raw").exists());
}

#[test]
fn test_missing_data_file_fails() {
    let fixture = Fixture::new();
    fs::remove_file(fixture.submission.join("fid/run2.zip")).unwrap();
    let pipeline = Pipeline::new(fixture.config()).unwrap();

    let err = pipeline
        .export(&pipeline.import(&fixture.submission).unwrap())
        .unwrap_err();
    assert!(err.to_string().contains("fid/run2.zip"));
}

fn plant_orphan(fixture: &Fixture) -> PathBuf {
    let orphan = submission::raw_path(&fixture.root, "fid/old_run.zip");
    fs::create_dir_all(orphan.parent().unwrap()).unwrap();
    fs::write(&orphan, "stale").unwrap();
    orphan
}

#[test]
fn test_orphan_reported() {
    let fixture = Fixture::new();
    let orphan = plant_orphan(&fixture);
    let pipeline = Pipeline::new(fixture.config()).unwrap();

    let summary = pipeline
        .export(&pipeline.import(&fixture.submission).unwrap())
        .unwrap();
    assert_eq!(summary.orphans.orphans, vec![orphan.clone()]);
    assert_eq!(summary.orphans.moved, 0);
    assert!(orphan.is_file());
}

#[test]
fn test_orphan_backed_up() {
    let fixture = Fixture::new();
    let orphan = plant_orphan(&fixture);
    let mut config = fixture.config();
    config.repository.orphan_mode = OrphanMode::Backup;
    let pipeline = Pipeline::new(config).unwrap();
    let submission = pipeline.import(&fixture.submission).unwrap();

    let summary = pipeline.export(&submission).unwrap();
    assert_eq!(summary.orphans.moved, 1);
    assert!(!orphan.exists());
    assert!(orphan.parent().unwrap().join("original/old_run.zip").is_file());

    // Backed-up files are not orphans of the next run
    let again = pipeline.export(&submission).unwrap();
    assert!(again.orphans.orphans.is_empty());
}
