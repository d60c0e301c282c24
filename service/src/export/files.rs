//! Data files referenced by a submission: tracking, dispatch and orphans
//!
//! Every column whose field carries a `ref_file_type` names an external
//! file. [`FileTracker`] collects those references, [`FileDispatcher`]
//! copies the files into the repository layout
//!
//! ```text
//! <kind root>/<study dir>/<measurement>/<technology>/<path>
//! ```
//!
//! and [`RepoFilesChecker`] reports or backs up repository files that no
//! reference points to any more.

use super::slug;
use crate::config::{OrphanMode, RepositoryConfig};
use crate::file_system_adapter::{FileSystemOperations, ensure_relative};
use indexmap::IndexSet;
use isatab_core::model::{AssayGroup, Study};
use isatab_core::{FormatSetInstance, IsaTabError, RefFileType, Result, SectionInstance, Store};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the directory orphans are moved into
pub const BACKUP_DIR: &str = "original";

/// One data file reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackedFile {
    /// Owning study accession
    pub study: String,
    /// Measurement label of the assay group, empty for study-level files
    pub measurement: String,
    /// Technology label of the assay group, empty for study-level files
    pub technology: String,
    /// Column header the path was read from
    pub header: String,
    /// Path relative to the submission directory
    pub path: String,
    /// Raw, processed or generic
    pub kind: RefFileType,
}

/// Distinct data file references in first-seen order
#[derive(Debug, Clone, Default)]
pub struct FileTracker {
    files: IndexSet<TrackedFile>,
}

impl FileTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference; returns false when it was already known
    pub fn track(&mut self, file: TrackedFile) -> bool {
        self.files.insert(file)
    }

    /// Record every non-empty cell of the file columns of a section
    pub fn track_section(
        &mut self,
        study: &str,
        measurement: &str,
        technology: &str,
        section: &SectionInstance,
    ) -> usize {
        let mut tracked = 0;
        for (column, field) in section.fields().iter().enumerate() {
            let Some(kind) = field.ref_file_type else {
                continue;
            };
            let header = field.dump();
            for path in section.column_values(column) {
                let added = self.track(TrackedFile {
                    study: study.to_string(),
                    measurement: measurement.to_string(),
                    technology: technology.to_string(),
                    header: header.clone(),
                    path: path.to_string(),
                    kind,
                });
                if added {
                    tracked += 1;
                }
            }
        }
        tracked
    }

    /// Collect the references of an ISA-Tab format set, usually the one
    /// just exported from `store`. Files are attributed to the assay group
    /// or study that names them.
    #[must_use]
    pub fn from_format_set(store: &Store, files: &FormatSetInstance) -> Self {
        let mut tracker = Self::new();
        for format in files.formats() {
            let Some(file_name) = format.file_name() else {
                continue;
            };

            let owner = store
                .values_of_type::<AssayGroup>()
                .into_iter()
                .find(|g| g.file_name == file_name)
                .map(|g| {
                    (
                        g.study.clone(),
                        g.measurement_label().to_string(),
                        g.technology_label().to_string(),
                    )
                })
                .or_else(|| {
                    store
                        .values_of_type::<Study>()
                        .into_iter()
                        .find(|s| s.file_name.as_deref().map(str::trim) == Some(file_name))
                        .map(|s| (s.accession.clone(), String::new(), String::new()))
                });
            let Some((study, measurement, technology)) = owner else {
                debug!(file = file_name, "File belongs to no study, references not tracked");
                continue;
            };

            for section in format.sections() {
                tracker.track_section(&study, &measurement, &technology, section);
            }
        }
        debug!(files = tracker.len(), "Tracked data files");
        tracker
    }

    /// References in first-seen order
    pub fn files(&self) -> impl Iterator<Item = &TrackedFile> {
        self.files.iter()
    }

    /// Number of references
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is referenced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Root directory of a kind of data file
#[must_use]
pub fn kind_root(config: &RepositoryConfig, kind: RefFileType) -> &Path {
    match kind {
        RefFileType::Raw => &config.raw_data_dir,
        RefFileType::Processed => &config.processed_data_dir,
        RefFileType::Generic => &config.generic_data_dir,
    }
}

/// Repository location of a tracked file
///
/// # Errors
///
/// Returns `IsaTabError::IoError` if the study directory or the file path
/// would leave the repository root.
pub fn repository_path(config: &RepositoryConfig, file: &TrackedFile) -> Result<PathBuf> {
    let study_dir = config.study_dir(&file.study);
    ensure_relative(Path::new(&study_dir))?;
    ensure_relative(Path::new(&file.path))?;

    let mut path = kind_root(config, file.kind).join(study_dir);
    for label in [&file.measurement, &file.technology] {
        let label = slug(label);
        if !label.is_empty() {
            path.push(label);
        }
    }
    path.push(&file.path);
    Ok(path)
}

fn dispatch_error(path: &str, e: &IsaTabError) -> IsaTabError {
    let kind = match e {
        IsaTabError::IoError(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    IsaTabError::IoError(std::io::Error::new(kind, format!("Failed to dispatch {path}: {e}")))
}

/// Outcome of a dispatch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Files copied
    pub copied: usize,
    /// Files already up to date
    pub skipped: usize,
}

/// Copies tracked files from the source directory into the repository
pub struct FileDispatcher<'a, F: FileSystemOperations> {
    fs: &'a F,
    config: &'a RepositoryConfig,
    source: &'a Path,
}

impl<'a, F: FileSystemOperations> FileDispatcher<'a, F> {
    /// Create a dispatcher reading tracked paths relative to `source`
    #[must_use]
    pub fn new(fs: &'a F, config: &'a RepositoryConfig, source: &'a Path) -> Self {
        Self { fs, config, source }
    }

    /// Copy one file unless its destination already carries the source's
    /// modification time; returns whether a copy happened
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::IoError` naming the file when the source is
    /// missing or an operation fails.
    pub fn dispatch_file(&self, file: &TrackedFile) -> Result<bool> {
        self.copy_if_stale(file).map_err(|e| dispatch_error(&file.path, &e))
    }

    fn copy_if_stale(&self, file: &TrackedFile) -> Result<bool> {
        let destination = repository_path(self.config, file)?;
        let source = self.source.join(&file.path);

        let source_meta = self.fs.metadata(&source)?.filter(|m| m.is_file).ok_or_else(|| {
            IsaTabError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("referenced {} file {} does not exist", file.kind, source.display()),
            ))
        })?;

        let up_to_date = self.fs.metadata(&destination)?.is_some_and(|dest| {
            dest.is_file && dest.modified.is_some() && dest.modified == source_meta.modified
        });
        if up_to_date {
            debug!(file = %file.path, destination = %destination.display(), "Up to date, not copied");
            return Ok(false);
        }

        self.fs.copy(&source, &destination)?;
        debug!(file = %file.path, destination = %destination.display(), "Copied data file");
        Ok(true)
    }

    /// Dispatch every tracked file; a no-op in local export mode
    ///
    /// # Errors
    ///
    /// Stops at the first failing file, see
    /// [`dispatch_file`](Self::dispatch_file).
    pub fn dispatch(&self, tracker: &FileTracker) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();
        if self.config.local_export {
            info!("Local export, data files not dispatched");
            return Ok(summary);
        }

        for file in tracker.files() {
            if self.dispatch_file(file)? {
                summary.copied += 1;
            } else {
                summary.skipped += 1;
            }
        }
        info!(copied = summary.copied, skipped = summary.skipped, "Dispatched data files");
        Ok(summary)
    }
}

/// Outcome of an orphan check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanSummary {
    /// Repository files examined
    pub checked: usize,
    /// Files no reference points to
    pub orphans: Vec<PathBuf>,
    /// Orphans moved into a backup directory
    pub moved: usize,
}

/// Finds repository files of a study that no reference points to
pub struct RepoFilesChecker<'a, F: FileSystemOperations> {
    fs: &'a F,
    config: &'a RepositoryConfig,
}

impl<'a, F: FileSystemOperations> RepoFilesChecker<'a, F> {
    /// Create a checker
    #[must_use]
    pub fn new(fs: &'a F, config: &'a RepositoryConfig) -> Self {
        Self { fs, config }
    }

    fn in_backup(path: &Path) -> bool {
        path.components()
            .any(|c| matches!(c, Component::Normal(name) if name == BACKUP_DIR))
    }

    /// Sibling backup location of an orphan
    #[must_use]
    pub fn backup_path(orphan: &Path) -> PathBuf {
        let parent = orphan.parent().unwrap_or_else(|| Path::new(""));
        let name = orphan.file_name().unwrap_or_default();
        parent.join(BACKUP_DIR).join(name)
    }

    /// Compare the data directories of the given studies with the tracked
    /// references, then warn about or back up each orphan. Files already in
    /// a backup directory are ignored. A no-op in local export mode.
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::IoError` when a directory cannot be walked or
    /// an orphan cannot be moved.
    pub fn check(&self, tracker: &FileTracker, studies: &[String]) -> Result<OrphanSummary> {
        let mut summary = OrphanSummary::default();
        if self.config.local_export {
            info!("Local export, repository not checked");
            return Ok(summary);
        }

        let referenced = tracker
            .files()
            .map(|file| repository_path(self.config, file))
            .collect::<Result<HashSet<_>>>()?;

        for study in studies {
            let study_dir = self.config.study_dir(study);
            ensure_relative(Path::new(&study_dir))?;

            for kind in [RefFileType::Raw, RefFileType::Processed, RefFileType::Generic] {
                let dir = kind_root(self.config, kind).join(&study_dir);
                if !self.fs.exists(&dir)? {
                    continue;
                }
                for path in self.fs.list_files(&dir)? {
                    if Self::in_backup(path.strip_prefix(&dir).unwrap_or(&path)) {
                        continue;
                    }
                    summary.checked += 1;
                    if referenced.contains(&path) {
                        continue;
                    }
                    self.handle_orphan(study, &path, &mut summary)?;
                }
            }
        }

        info!(
            checked = summary.checked,
            orphans = summary.orphans.len(),
            moved = summary.moved,
            "Checked repository files"
        );
        Ok(summary)
    }

    fn handle_orphan(&self, study: &str, path: &Path, summary: &mut OrphanSummary) -> Result<()> {
        match self.config.orphan_mode {
            OrphanMode::Warn => {
                warn!(study, file = %path.display(), "Repository file is not referenced by the submission");
            }
            OrphanMode::Backup => {
                let backup = Self::backup_path(path);
                self.fs.rename(path, &backup)?;
                warn!(
                    study,
                    file = %path.display(),
                    backup = %backup.display(),
                    "Unreferenced repository file moved to backup"
                );
                summary.moved += 1;
            }
        }
        summary.orphans.push(path.to_path_buf());
        Ok(())
    }
}
