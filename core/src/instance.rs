//! Runtime instances mirroring the schema tree
//!
//! Parsers and exporters produce these; mappers and validators consume them.

use crate::error::{IsaTabError, Result};
use crate::schema::{Field, FieldSignature, Format, FormatSet, Section};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One row of values, positionally indexed against its section's fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: Vec<String>,
}

impl Record {
    /// Create a record from cell values
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Create a record of `len` empty cells
    #[must_use]
    pub fn blank(len: usize) -> Self {
        Self {
            values: vec![String::new(); len],
        }
    }

    /// Value at a column, `None` when absent or empty
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values
            .get(index)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Raw cell text at a column (empty when absent)
    #[must_use]
    pub fn raw(&self, index: usize) -> &str {
        self.values.get(index).map_or("", String::as_str)
    }

    /// Set a cell, growing the record when needed
    pub fn set(&mut self, index: usize, value: impl Into<String>) {
        if index >= self.values.len() {
            self.values.resize(index + 1, String::new());
        }
        self.values[index] = value.into();
    }

    /// Append a cell
    pub fn push(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    /// Number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether every cell is empty
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }

    /// All cells
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Parsed or exported instance of one [`Section`]
#[derive(Debug, Clone)]
pub struct SectionInstance {
    section: Arc<Section>,
    fields: Vec<Field>,
    records: Vec<Record>,
}

impl SectionInstance {
    /// Create an empty instance of a section
    #[must_use]
    pub fn new(section: Arc<Section>) -> Self {
        Self {
            section,
            fields: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Section definition
    #[must_use]
    pub fn section(&self) -> &Arc<Section> {
        &self.section
    }

    /// Section identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.section.id
    }

    /// Positioned fields in column order
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field at a column
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Header texts in column order
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        self.fields.iter().map(Field::dump).collect()
    }

    /// Append a positioned field, re-indexing it to its new column
    pub fn add_field(&mut self, mut field: Field) -> usize {
        let index = self.fields.len();
        field.index = Some(index);
        self.fields.push(field);
        index
    }

    /// Resolve a header against the section templates and append it
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::StructureError` if no template accepts the header.
    pub fn add_header(&mut self, header: &str, case_sensitive: bool) -> Result<usize> {
        let column = self.fields.len();
        let field = self.section.resolve_header(header, column, case_sensitive)?;
        Ok(self.add_field(field))
    }

    /// First column whose field id equals `id`
    #[must_use]
    pub fn field_index(&self, id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == id)
    }

    /// First column whose rendered header equals `header` (case-insensitive)
    #[must_use]
    pub fn header_index(&self, header: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.dump().eq_ignore_ascii_case(header.trim()))
    }

    /// Records in order
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record at an index
    #[must_use]
    pub fn record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Number of records
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Append a record, padding it to the current field count
    pub fn add_record(&mut self, mut record: Record) {
        if record.len() < self.fields.len() {
            record.set(self.fields.len() - 1, record.raw(self.fields.len() - 1).to_string());
        }
        self.records.push(record);
    }

    /// Non-empty values of a column across all records
    #[must_use]
    pub fn column_values(&self, index: usize) -> Vec<&str> {
        self.records.iter().filter_map(|r| r.get(index)).collect()
    }

    /// Number of occurrences of each distinct field signature
    #[must_use]
    pub fn signature_counts(&self) -> HashMap<FieldSignature, u32> {
        let mut counts = HashMap::new();
        for field in &self.fields {
            *counts.entry(field.signature()).or_insert(0) += 1;
        }
        counts
    }

    /// Check declared cardinalities: every distinct signature at most
    /// `max_cardinality` times and every template id at least
    /// `min_cardinality` times.
    #[must_use]
    pub fn validate_cardinality(&self) -> bool {
        self.cardinality_violations().is_empty()
    }

    /// Describe every cardinality violation
    #[must_use]
    pub fn cardinality_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (signature, count) in self.signature_counts() {
            let Some(template) = self.section.field(&signature.0) else {
                continue;
            };
            if template.repeatable {
                continue;
            }
            if let Some(max) = template.max_cardinality {
                if count > max {
                    let header = self
                        .fields
                        .iter()
                        .find(|f| f.signature() == signature)
                        .map_or_else(|| signature.0.clone(), Field::dump);
                    violations.push(format!(
                        "'{header}' appears {count} times, at most {max} allowed"
                    ));
                }
            }
        }

        for template in &self.section.fields {
            if template.min_cardinality == 0 {
                continue;
            }
            let count = self.fields.iter().filter(|f| f.id == template.id).count();
            if count < template.min_cardinality as usize {
                violations.push(format!(
                    "'{}' appears {count} times, at least {} required",
                    template.id, template.min_cardinality
                ));
            }
        }

        violations.sort();
        if !violations.is_empty() {
            debug!(section = %self.section.id, ?violations, "Cardinality check failed");
        }
        violations
    }

    /// Check the `follows` precedence constraints of every column
    #[must_use]
    pub fn validate_ordering(&self) -> bool {
        self.ordering_violations().is_empty()
    }

    /// Describe every precedence violation
    #[must_use]
    pub fn ordering_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for (i, field) in self.fields.iter().enumerate() {
            if field.follows.is_empty() {
                continue;
            }
            let previous = i.checked_sub(1).and_then(|p| self.fields.get(p));
            let ok = previous.is_some_and(|p| field.follows.iter().any(|id| *id == p.id));
            if !ok {
                violations.push(format!(
                    "'{}' in column {i} must follow one of {:?}",
                    field.dump(),
                    field.follows
                ));
            }
        }
        violations
    }

    /// Fail with a structure error when cardinality or ordering is violated
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::StructureError` listing the violations.
    pub fn check_structure(&self) -> Result<()> {
        let mut violations = self.cardinality_violations();
        violations.extend(self.ordering_violations());
        if violations.is_empty() {
            Ok(())
        } else {
            Err(IsaTabError::structure(&self.section.id, violations.join("; ")))
        }
    }
}

/// Instance of one [`Format`], usually one file
#[derive(Debug, Clone)]
pub struct FormatInstance {
    format: Arc<Format>,
    file_name: Option<String>,
    sections: Vec<SectionInstance>,
}

impl FormatInstance {
    /// Create an empty instance of a format
    #[must_use]
    pub fn new(format: Arc<Format>) -> Self {
        Self {
            format,
            file_name: None,
            sections: Vec::new(),
        }
    }

    /// Attach the file name this instance was read from or will be written to
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Format definition
    #[must_use]
    pub fn format(&self) -> &Arc<Format> {
        &self.format
    }

    /// Format identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.format.id
    }

    /// File name, if known
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Section instances in file order
    #[must_use]
    pub fn sections(&self) -> &[SectionInstance] {
        &self.sections
    }

    /// Append a section instance
    pub fn add_section(&mut self, section: SectionInstance) {
        self.sections.push(section);
    }

    /// Every instance of one section, in order
    pub fn sections_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a SectionInstance> + 'a {
        self.sections.iter().filter(move |s| s.id() == id)
    }

    /// First instance of one section
    #[must_use]
    pub fn first_section(&self, id: &str) -> Option<&SectionInstance> {
        self.sections.iter().find(|s| s.id() == id)
    }
}

/// Instance of a whole [`FormatSet`], usually one submission directory
#[derive(Debug, Clone)]
pub struct FormatSetInstance {
    format_set: Arc<FormatSet>,
    formats: Vec<FormatInstance>,
}

impl FormatSetInstance {
    /// Create an empty instance of a format set
    #[must_use]
    pub fn new(format_set: Arc<FormatSet>) -> Self {
        Self {
            format_set,
            formats: Vec::new(),
        }
    }

    /// Format set definition
    #[must_use]
    pub fn format_set(&self) -> &Arc<FormatSet> {
        &self.format_set
    }

    /// Format instances in insertion order
    #[must_use]
    pub fn formats(&self) -> &[FormatInstance] {
        &self.formats
    }

    /// Append a format instance
    pub fn add_format(&mut self, format: FormatInstance) {
        self.formats.push(format);
    }

    /// Every instance of one format
    pub fn instances_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FormatInstance> + 'a {
        self.formats.iter().filter(move |f| f.id() == id)
    }

    /// Instance read from (or written to) a file name
    #[must_use]
    pub fn by_file_name(&self, file_name: &str) -> Option<&FormatInstance> {
        self.formats
            .iter()
            .find(|f| f.file_name() == Some(file_name))
    }
}
