//! Section instances to delimited text

use crate::file_system_adapter::{FileSystemOperations, ensure_relative};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use isatab_core::{FormatInstance, FormatSetInstance, IsaTabError, Result, SectionInstance};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serializes format instances in the layout the parser reads
#[derive(Debug, Clone)]
pub struct TabWriter {
    delimiter: u8,
}

impl Default for TabWriter {
    fn default() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl TabWriter {
    /// Create a writer with a field delimiter
    #[must_use]
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Lines of one section: label, then one line per field or one row per
    /// record
    fn section_lines(section: &SectionInstance) -> Vec<Vec<String>> {
        let mut lines = Vec::new();
        if let Some(label) = &section.section().header {
            lines.push(vec![label.clone()]);
        }

        let headers = section.headers();
        if section.section().section_type.is_column_oriented() {
            for (column, header) in headers.into_iter().enumerate() {
                let mut line = vec![header];
                line.extend(section.records().iter().map(|r| r.raw(column).to_string()));
                lines.push(line);
            }
        } else if !headers.is_empty() {
            let width = headers.len();
            lines.push(headers);
            for record in section.records() {
                lines.push((0..width).map(|column| record.raw(column).to_string()).collect());
            }
        }
        lines
    }

    /// Render one format instance
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::SerializationError` if a line cannot be written.
    pub fn write_format(&self, instance: &FormatInstance) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(vec![]);

        for section in instance.sections() {
            for line in Self::section_lines(section) {
                writer.write_record(&line).map_err(|e| {
                    IsaTabError::serialization(format!(
                        "Failed to write section '{}': {e}",
                        section.id()
                    ))
                })?;
            }
        }

        let data = writer
            .into_inner()
            .map_err(|e| IsaTabError::serialization(format!("Failed to finish writing: {e}")))?;
        String::from_utf8(data).map_err(|e| IsaTabError::serialization(format!("Invalid UTF-8: {e}")))
    }

    /// Write every file of a format set instance below a directory
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::InvalidValue` for an instance without file name,
    /// `IsaTabError::IoError` for file names escaping the directory or
    /// failed writes, and the errors of [`write_format`](Self::write_format).
    pub fn write_to_dir<F: FileSystemOperations>(
        &self,
        instance: &FormatSetInstance,
        dir: &Path,
        fs: &F,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for format in instance.formats() {
            let file_name = format.file_name().ok_or_else(|| {
                IsaTabError::invalid_value("file name", format.id(), "exported format has no file name")
            })?;
            ensure_relative(Path::new(file_name))?;

            let path = dir.join(file_name);
            fs.write(&path, &self.write_format(format)?)?;
            debug!(path = %path.display(), "Wrote file");
            written.push(path);
        }
        info!(
            format_set = %instance.format_set().id,
            dir = %dir.display(),
            files = written.len(),
            "Wrote format set"
        );
        Ok(written)
    }
}
