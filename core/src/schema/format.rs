//! Formats (one file type) and format sets (a family of file types)

use super::section::Section;
use crate::error::{IsaTabError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One file type made of ordered sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Format {
    /// Format identifier, unique within its set
    pub id: String,

    /// Regular expression matched against file names of this format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_pattern: Option<String>,

    /// Section that opens a repeatable block (one block per study)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_start: Option<String>,

    /// Section definitions in file order
    pub sections: Vec<Arc<Section>>,
}

impl Format {
    /// Look up a section by id
    #[must_use]
    pub fn section(&self, id: &str) -> Option<&Arc<Section>> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Look up a section by id, failing when it is not declared
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` if the format has no such section.
    pub fn require_section(&self, id: &str) -> Result<&Arc<Section>> {
        self.section(id).ok_or_else(|| {
            IsaTabError::config(format!("format '{}' declares no section '{id}'", self.id))
        })
    }

    /// Whether a file name matches this format's pattern
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` if the pattern is not a valid regex.
    pub fn matches_file(&self, file_name: &str) -> Result<bool> {
        match &self.file_pattern {
            Some(pattern) => Ok(Regex::new(pattern)?.is_match(file_name)),
            None => Ok(false),
        }
    }
}

/// A family of formats loaded together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSet {
    /// Format set identifier
    pub id: String,

    /// Formats of this set
    pub formats: Vec<Arc<Format>>,
}

impl FormatSet {
    /// Look up a format by id
    #[must_use]
    pub fn format(&self, id: &str) -> Option<&Arc<Format>> {
        self.formats.iter().find(|f| f.id == id)
    }

    /// Look up a format by id, failing when it is not declared
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` if the set has no such format.
    pub fn require_format(&self, id: &str) -> Result<&Arc<Format>> {
        self.format(id).ok_or_else(|| {
            IsaTabError::config(format!("format set '{}' declares no format '{id}'", self.id))
        })
    }

    /// Check structural consistency of the definitions
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` on duplicate ids, dangling block
    /// starts, empty sections or invalid file patterns.
    pub fn check(&self) -> Result<()> {
        let mut format_ids = std::collections::HashSet::new();
        for format in &self.formats {
            if !format_ids.insert(format.id.as_str()) {
                return Err(IsaTabError::config(format!(
                    "duplicate format '{}' in set '{}'",
                    format.id, self.id
                )));
            }
            if let Some(pattern) = &format.file_pattern {
                Regex::new(pattern)?;
            }
            if let Some(block) = &format.block_start {
                format.require_section(block)?;
            }

            let mut section_ids = std::collections::HashSet::new();
            for section in &format.sections {
                if !section_ids.insert(section.id.as_str()) {
                    return Err(IsaTabError::config(format!(
                        "duplicate section '{}' in format '{}'",
                        section.id, format.id
                    )));
                }
                if section.fields.is_empty() {
                    return Err(IsaTabError::config(format!(
                        "section '{}' in format '{}' declares no fields",
                        section.id, format.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFS: &str = r#"
id: demo
formats:
  - id: investigation
    file_pattern: '^i_.*\.txt$'
    block_start: study
    sections:
      - id: study
        header: STUDY
        type: one-in-col
        fields:
          - id: Study Identifier
            max_cardinality: 1
"#;

    #[test]
    fn test_load_and_lookup() {
        let set: FormatSet = serde_yaml::from_str(DEFS).unwrap();
        set.check().unwrap();

        let format = set.require_format("investigation").unwrap();
        assert!(format.matches_file("i_investigation.txt").unwrap());
        assert!(!format.matches_file("s_samples.txt").unwrap());
        assert_eq!(format.require_section("study").unwrap().fields.len(), 1);
        assert!(set.require_format("assay").is_err());
    }

    #[test]
    fn test_dangling_block_start() {
        let defs = DEFS.replace("block_start: study", "block_start: nope");
        let set: FormatSet = serde_yaml::from_str(&defs).unwrap();
        assert!(set.check().is_err());
    }
}
