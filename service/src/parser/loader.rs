//! ISA-Tab submission directories
//!
//! A submission is one `i_*.txt` investigation file plus the study-sample
//! and assay files it names. Only the files named by the investigation are
//! read; anything else in the directory is ignored.

use super::tab::TabParser;
use isatab_core::schema::{Format, FormatSet};
use isatab_core::{FormatInstance, FormatSetInstance, IsaTabError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const INVESTIGATION_FORMAT: &str = "investigation";
const STUDY_SAMPLE_FORMAT: &str = "study_sample";
const ASSAY_FORMAT: &str = "assay";

/// Loads a submission directory into a [`FormatSetInstance`]
#[derive(Debug, Clone)]
pub struct IsaTabLoader {
    parser: TabParser,
    format_set: Arc<FormatSet>,
}

impl IsaTabLoader {
    /// Create a loader for the ISA-Tab format set
    #[must_use]
    pub fn new(parser: TabParser, format_set: Arc<FormatSet>) -> Self {
        Self { parser, format_set }
    }

    /// Find the single investigation file of a directory
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::IoError` if the directory cannot be listed and
    /// `IsaTabError::StructureError` when there is no investigation file or
    /// more than one.
    pub fn find_investigation(&self, dir: &Path) -> Result<PathBuf> {
        let format = self.format_set.require_format(INVESTIGATION_FORMAT)?;

        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if format.matches_file(&name)? {
                candidates.push(path);
            }
        }
        candidates.sort();

        match candidates.len() {
            1 => Ok(candidates.remove(0)),
            0 => Err(IsaTabError::structure(
                INVESTIGATION_FORMAT,
                format!("no investigation file in {}", dir.display()),
            )),
            n => Err(IsaTabError::structure(
                INVESTIGATION_FORMAT,
                format!("{n} investigation files in {}", dir.display()),
            )),
        }
    }

    /// Load every file of a submission directory
    ///
    /// # Errors
    ///
    /// Returns an IO error for a missing referenced file and the parser's
    /// errors for malformed content.
    pub fn load_dir(&self, dir: &Path) -> Result<FormatSetInstance> {
        let investigation_path = self.find_investigation(dir)?;
        let investigation = self.parser.parse_file(
            self.format_set.require_format(INVESTIGATION_FORMAT)?,
            &investigation_path,
        )?;

        let study_files = referenced_files(&investigation, "study", "Study File Name");
        let assay_files = referenced_files(&investigation, "study_assays", "Study Assay File Name");

        let mut instance = FormatSetInstance::new(Arc::clone(&self.format_set));
        instance.add_format(investigation);

        for (format_id, files) in [(STUDY_SAMPLE_FORMAT, study_files), (ASSAY_FORMAT, assay_files)] {
            let format = self.format_set.require_format(format_id)?;
            for file in files {
                instance.add_format(self.load_file(format, dir, &file)?);
            }
        }

        info!(
            dir = %dir.display(),
            files = instance.formats().len(),
            "Loaded submission"
        );
        Ok(instance)
    }

    fn load_file(&self, format: &Arc<Format>, dir: &Path, file: &str) -> Result<FormatInstance> {
        let path = dir.join(file);
        if !path.is_file() {
            return Err(IsaTabError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("referenced file {} does not exist", path.display()),
            )));
        }
        debug!(format = %format.id, file, "Loading referenced file");
        self.parser.parse_file(format, &path)
    }
}

/// Distinct non-empty values of a field across every instance of a section
fn referenced_files(investigation: &FormatInstance, section_id: &str, field_id: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for section in investigation.sections_of(section_id) {
        let Some(column) = section.field_index(field_id) else {
            continue;
        };
        for value in section.column_values(column) {
            let value = value.trim();
            if !value.is_empty() && !files.iter().any(|f| f == value) {
                files.push(value.to_string());
            }
        }
    }
    files
}
