//! Section definitions: one tabular block of a format

use super::field::Field;
use crate::error::{IsaTabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural layout of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionType {
    /// Header row, then one record per data row
    ManyInRows,
    /// One line per field, one record per value column
    ManyInCols,
    /// One line per field, a single record in the first value column
    OneInCol,
}

impl SectionType {
    /// Whether records are laid out column by column
    #[must_use]
    pub fn is_column_oriented(self) -> bool {
        matches!(self, SectionType::ManyInCols | SectionType::OneInCol)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionType::ManyInRows => write!(f, "many-in-rows"),
            SectionType::ManyInCols => write!(f, "many-in-cols"),
            SectionType::OneInCol => write!(f, "one-in-col"),
        }
    }
}

/// Declarative description of one tabular block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section identifier, unique within its format
    pub id: String,

    /// Label line introducing the section in multi-section files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    /// Layout of records
    #[serde(rename = "type")]
    pub section_type: SectionType,

    /// Field templates
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Section {
    /// Look up a field template by id
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Match a concrete header against the templates of this section and
    /// return the positioned field.
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::StructureError` if the header is malformed or no
    /// template accepts it.
    pub fn resolve_header(&self, header: &str, column: usize, case_sensitive: bool) -> Result<Field> {
        let mut last_err = None;
        for template in &self.fields {
            match template.parse_header(header, column, case_sensitive) {
                Ok(field) => return Ok(field),
                Err(e) => last_err = Some(e),
            }
        }

        let reason = last_err.map_or_else(|| "section declares no fields".to_string(), |e| e.to_string());
        Err(IsaTabError::structure(
            &self.id,
            format!("unmatched header '{header}' in column {column}: {reason}"),
        ))
    }

    /// Whether a label line opens this section
    #[must_use]
    pub fn is_introduced_by(&self, line: &str, case_sensitive: bool) -> bool {
        self.header.as_deref().is_some_and(|label| {
            let line = line.trim();
            if case_sensitive {
                line == label
            } else {
                line.eq_ignore_ascii_case(label)
            }
        })
    }
}
