//! File system adapter for exports and data-file dispatch
//!
//! Every repository side effect goes through [`FileSystemOperations`] so
//! that dispatch and orphan checks can be observed or redirected in tests.

use isatab_core::{IsaTabError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// File system operations trait
pub trait FileSystemOperations {
    /// Read a file to string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write string to file, creating parent directories
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> Result<bool>;

    /// Create directory (including parents)
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Every regular file below a directory, recursively, sorted
    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Get file metadata, `None` when the path does not exist
    fn metadata(&self, path: &Path) -> Result<Option<FileMetadata>>;

    /// Copy a file, giving the copy the source's modification time
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    /// Move a file, creating the destination's parent directories
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Remove file
    fn remove_file(&self, path: &Path) -> Result<()>;
}

/// File metadata
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Is directory
    pub is_dir: bool,
    /// Is file
    pub is_file: bool,
    /// Last modified time
    pub modified: Option<SystemTime>,
}

fn io_context(e: &std::io::Error, context: String) -> IsaTabError {
    IsaTabError::IoError(std::io::Error::new(e.kind(), format!("{context}: {e}")))
}

/// Reject paths that could leave the directory they are joined to
///
/// # Errors
///
/// Returns `IsaTabError::IoError` (permission denied) for absolute paths and
/// paths with `..` components.
pub fn ensure_relative(path: &Path) -> Result<()> {
    if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(IsaTabError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("Path escapes its base directory: {}", path.display()),
        )));
    }
    Ok(())
}

/// Default adapter over `std::fs`
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create new adapter
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| io_context(&e, format!("Failed to create {}", parent.display())))?;
        }
        Ok(())
    }
}

impl FileSystemOperations for LocalFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| io_context(&e, format!("Failed to read {}", path.display())))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        Self::ensure_parent(path)?;
        fs::write(path, contents)
            .map_err(|e| io_context(&e, format!("Failed to write {}", path.display())))
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_context(&e, "Failed to check existence".to_string())),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .map_err(|e| io_context(&e, format!("Failed to create directory {}", path.display())))
    }

    fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.map_err(|e| {
                IsaTabError::IoError(std::io::Error::other(format!(
                    "Failed to walk {}: {e}",
                    path.display()
                )))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn metadata(&self, path: &Path) -> Result<Option<FileMetadata>> {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_context(&e, format!("Failed to get metadata of {}", path.display()))),
        };

        Ok(Some(FileMetadata {
            size: meta.len(),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            modified: meta.modified().ok(),
        }))
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        Self::ensure_parent(to)?;
        fs::copy(from, to).map_err(|e| {
            io_context(&e, format!("Failed to copy {} to {}", from.display(), to.display()))
        })?;

        let modified = fs::metadata(from)
            .and_then(|m| m.modified())
            .map_err(|e| io_context(&e, format!("Failed to read the time of {}", from.display())))?;
        fs::File::options()
            .write(true)
            .open(to)
            .and_then(|file| file.set_modified(modified))
            .map_err(|e| io_context(&e, format!("Failed to set the time of {}", to.display())))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        Self::ensure_parent(to)?;
        fs::rename(from, to).map_err(|e| {
            io_context(&e, format!("Failed to move {} to {}", from.display(), to.display()))
        })
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)
            .map_err(|e| io_context(&e, format!("Failed to remove {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_preserves_modification_time() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let fs = LocalFileSystem::new();

        let source = temp_dir.path().join("raw/run1.mzML");
        fs.write(&source, "spectra")?;
        let target = temp_dir.path().join("repo/MTBLS1/run1.mzML");
        fs.copy(&source, &target)?;

        let source_time = fs.metadata(&source)?.and_then(|m| m.modified);
        let target_time = fs.metadata(&target)?.and_then(|m| m.modified);
        assert_eq!(source_time, target_time);
        assert_eq!(fs.read_to_string(&target)?, "spectra");
        Ok(())
    }

    #[test]
    fn test_directory_operations() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let fs = LocalFileSystem::new();

        fs.create_dir_all(&temp_dir.path().join("a/b/c"))?;
        fs.write(&temp_dir.path().join("a/b/c/file.txt"), "nested content")?;
        fs.write(&temp_dir.path().join("a/top.txt"), "top")?;

        let files = fs.list_files(&temp_dir.path().join("a"))?;
        assert_eq!(files.len(), 2);
        assert!(fs.metadata(&temp_dir.path().join("missing"))?.is_none());
        assert!(!fs.exists(&temp_dir.path().join("missing"))?);
        Ok(())
    }

    #[test]
    fn test_escape_rejected() {
        assert!(ensure_relative(Path::new("../escape.txt")).is_err());
        assert!(ensure_relative(Path::new("/etc/passwd")).is_err());
        assert!(ensure_relative(Path::new("raw/run1.mzML")).is_ok());
    }
}
