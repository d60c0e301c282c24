//! Delimited text to section instances

use csv::{ReaderBuilder, Trim};
use isatab_core::schema::{Format, Section};
use isatab_core::{FormatInstance, IsaTabError, Record, Result, SectionInstance, SectionType};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Options for reading tabular files
#[derive(Debug, Clone)]
pub struct TabOptions {
    /// Field delimiter (default: tab)
    pub delimiter: u8,

    /// Quote character
    pub quote: u8,

    /// Lines starting with this byte are ignored
    pub comment: Option<u8>,

    /// Match headers case-sensitively
    pub case_sensitive: bool,
}

impl Default for TabOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            quote: b'"',
            comment: Some(b'#'),
            case_sensitive: false,
        }
    }
}

impl TabOptions {
    /// Set case sensitivity
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set the delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Schema-driven parser of tabular files
#[derive(Debug, Clone, Default)]
pub struct TabParser {
    options: TabOptions,
}

impl TabParser {
    /// Create a parser
    #[must_use]
    pub fn new(options: TabOptions) -> Self {
        Self { options }
    }

    /// Parser options
    #[must_use]
    pub fn options(&self) -> &TabOptions {
        &self.options
    }

    /// Read non-blank rows, right-trimmed of empty cells
    fn read_rows(&self, content: &str) -> Result<Vec<Vec<String>>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .quote(self.options.quote)
            .comment(self.options.comment)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                IsaTabError::serialization(format!("Failed to read row {}: {e}", line + 1))
            })?;
            let mut row = record.iter().map(str::to_string).collect::<Vec<_>>();
            while row.last().is_some_and(String::is_empty) {
                row.pop();
            }
            if !row.is_empty() {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Parse a file of the given format
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::IoError` if the file cannot be read and the
    /// errors of [`parse_str`](Self::parse_str) otherwise.
    pub fn parse_file(&self, format: &Arc<Format>, path: &Path) -> Result<FormatInstance> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IsaTabError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {e}", path.display()),
            ))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.parse_str(format, &content, Some(&file_name))
    }

    /// Parse text of the given format
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::StructureError` on malformed or unmatched
    /// headers, and `IsaTabError::SerializationError` on unreadable rows.
    pub fn parse_str(
        &self,
        format: &Arc<Format>,
        content: &str,
        file_name: Option<&str>,
    ) -> Result<FormatInstance> {
        let rows = self.read_rows(content)?;

        let mut instance = FormatInstance::new(Arc::clone(format));
        if let Some(file_name) = file_name {
            instance = instance.with_file_name(file_name);
        }

        let labelled = format.sections.iter().any(|s| s.header.is_some());
        let row_oriented = format.sections.len() == 1 && !format.sections[0].section_type.is_column_oriented();

        if row_oriented {
            let section = self.parse_rows(&format.sections[0], &rows)?;
            instance.add_section(section);
        } else if labelled {
            for (section, lines) in self.split_labelled(format, &rows)? {
                instance.add_section(self.parse_columns(&section, &lines)?);
            }
        } else {
            for (section, lines) in self.split_unlabelled(format, &rows)? {
                instance.add_section(self.parse_columns(&section, &lines)?);
            }
        }

        info!(
            format = %format.id,
            file = file_name.unwrap_or_default(),
            sections = instance.sections().len(),
            "Parsed format"
        );
        Ok(instance)
    }

    /// Group lines under the section labels that introduce them
    fn split_labelled(
        &self,
        format: &Format,
        rows: &[Vec<String>],
    ) -> Result<Vec<(Arc<Section>, Vec<Vec<String>>)>> {
        let mut groups: Vec<(Arc<Section>, Vec<Vec<String>>)> = Vec::new();

        for row in rows {
            let opened = (row.len() == 1)
                .then(|| {
                    format
                        .sections
                        .iter()
                        .find(|s| s.is_introduced_by(&row[0], self.options.case_sensitive))
                })
                .flatten();

            if let Some(section) = opened {
                debug!(section = %section.id, "Opened section");
                groups.push((Arc::clone(section), Vec::new()));
                continue;
            }

            match groups.last_mut() {
                Some((_, lines)) => lines.push(row.clone()),
                None => {
                    return Err(IsaTabError::structure(
                        &format.id,
                        format!("line '{}' appears before any section label", row[0]),
                    ));
                }
            }
        }
        Ok(groups)
    }

    /// Route each line to the first section whose templates accept it
    fn split_unlabelled(
        &self,
        format: &Format,
        rows: &[Vec<String>],
    ) -> Result<Vec<(Arc<Section>, Vec<Vec<String>>)>> {
        let mut groups: Vec<(Arc<Section>, Vec<Vec<String>>)> = format
            .sections
            .iter()
            .map(|s| (Arc::clone(s), Vec::new()))
            .collect();

        for row in rows {
            let target = groups.iter_mut().find(|(section, _)| {
                section
                    .resolve_header(&row[0], 0, self.options.case_sensitive)
                    .is_ok()
            });
            match target {
                Some((_, lines)) => lines.push(row.clone()),
                None => {
                    return Err(IsaTabError::structure(
                        &format.id,
                        format!("no section accepts the line '{}'", row[0]),
                    ));
                }
            }
        }

        groups.retain(|(_, lines)| !lines.is_empty());
        Ok(groups)
    }

    /// One line per field, one record per value column
    fn parse_columns(&self, section: &Arc<Section>, lines: &[Vec<String>]) -> Result<SectionInstance> {
        let mut instance = SectionInstance::new(Arc::clone(section));
        for line in lines {
            instance.add_header(&line[0], self.options.case_sensitive)?;
        }

        let width = lines.iter().map(|l| l.len().saturating_sub(1)).max().unwrap_or(0);
        let count = match section.section_type {
            SectionType::OneInCol => 1,
            SectionType::ManyInCols | SectionType::ManyInRows => width,
        };

        for column in 0..count {
            let values = lines
                .iter()
                .map(|l| l.get(column + 1).cloned().unwrap_or_default())
                .collect();
            instance.add_record(Record::new(values));
        }

        debug!(section = %section.id, records = instance.record_count(), "Parsed column section");
        Ok(instance)
    }

    /// Header row, then one record per data row
    fn parse_rows(&self, section: &Arc<Section>, rows: &[Vec<String>]) -> Result<SectionInstance> {
        let mut instance = SectionInstance::new(Arc::clone(section));
        let Some((headers, data)) = rows.split_first() else {
            return Err(IsaTabError::structure(&section.id, "missing header row"));
        };

        for (column, header) in headers.iter().enumerate() {
            if header.is_empty() {
                return Err(IsaTabError::structure(
                    &section.id,
                    format!("empty header in column {column}"),
                ));
            }
            instance.add_header(header, self.options.case_sensitive)?;
        }

        let width = headers.len();
        for (index, row) in data.iter().enumerate() {
            if let Some(extra) = row.iter().skip(width).position(|cell| !cell.is_empty()) {
                return Err(IsaTabError::structure(
                    &section.id,
                    format!(
                        "row {} has a value in column {} beyond the {width} headers",
                        index + 1,
                        width + extra + 1
                    ),
                ));
            }
            let mut values = row.clone();
            values.resize(width, String::new());
            instance.add_record(Record::new(values));
        }

        debug!(section = %section.id, records = instance.record_count(), "Parsed row section");
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isatab_core::SchemaRegistry;
    use isatab_core::schema::{ISATAB_FORMAT_SET, MAGETAB_FORMAT_SET};
    use pretty_assertions::assert_eq;

    const INVESTIGATION: &str = "\
ONTOLOGY SOURCE REFERENCE
Term Source Name\tNCBITAXON\tOBI
Term Source File\thttp://purl.obolibrary.org/obo/ncbitaxon.owl\t
INVESTIGATION
Investigation Identifier\tINV1
# a comment line
STUDY
Study Identifier\tMTBLS1
Study File Name\ts_mtbls1.txt
STUDY
Study Identifier\tMTBLS2
Study File Name\ts_mtbls2.txt
";

    fn format(set: &str, id: &str) -> Arc<Format> {
        let registry = SchemaRegistry::with_builtin().unwrap();
        Arc::clone(registry.format_set(set).unwrap().require_format(id).unwrap())
    }

    #[test]
    fn test_investigation_sections_and_blocks() {
        let parser = TabParser::default();
        let instance = parser
            .parse_str(&format(ISATAB_FORMAT_SET, "investigation"), INVESTIGATION, Some("i_inv.txt"))
            .unwrap();

        let ids = instance.sections().iter().map(|s| s.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["ontology_sources", "investigation", "study", "study"]);

        let sources = &instance.sections()[0];
        assert_eq!(sources.record_count(), 2);
        assert_eq!(sources.records()[1].get(0), Some("OBI"));
        assert_eq!(sources.records()[1].get(1), None);

        let second_study = &instance.sections()[3];
        assert_eq!(second_study.record_count(), 1);
        assert_eq!(second_study.records()[0].get(0), Some("MTBLS2"));
    }

    #[test]
    fn test_row_section_and_case_insensitive_headers() {
        let parser = TabParser::default();
        let content = "source name\tSample Name\tCharacteristics[organism]\n\"src 1\"\tsmp1\tHomo sapiens\n\n";
        let instance = parser
            .parse_str(&format(ISATAB_FORMAT_SET, "study_sample"), content, Some("s_a.txt"))
            .unwrap();

        let table = &instance.sections()[0];
        assert_eq!(table.headers(), vec!["Source Name", "Sample Name", "Characteristics[organism]"]);
        assert_eq!(table.record_count(), 1);
        assert_eq!(table.records()[0].get(0), Some("src 1"));
    }

    #[test]
    fn test_cells_beyond_headers() {
        let parser = TabParser::default();
        let format = format(ISATAB_FORMAT_SET, "study_sample");

        let instance = parser
            .parse_str(&format, "Source Name\tSample Name\nsrc1\tsmp1\t\t\n", None)
            .unwrap();
        assert_eq!(instance.sections()[0].records()[0].values().len(), 2);

        let err = parser
            .parse_str(&format, "Source Name\tSample Name\nsrc1\tsmp1\nsrc2\tsmp2\t\tstray\n", None)
            .unwrap_err();
        assert!(matches!(err, IsaTabError::StructureError { .. }));
        assert!(err.to_string().contains("row 2 has a value in column 4"), "{err}");
    }

    #[test]
    fn test_case_sensitive_rejects_header() {
        let parser = TabParser::new(TabOptions::default().with_case_sensitive(true));
        let err = parser
            .parse_str(&format(ISATAB_FORMAT_SET, "study_sample"), "sample name\nx\n", None)
            .unwrap_err();
        assert!(matches!(err, IsaTabError::StructureError { .. }));
    }

    #[test]
    fn test_unmatched_header_is_structural() {
        let parser = TabParser::default();
        let err = parser
            .parse_str(&format(ISATAB_FORMAT_SET, "study_sample"), "Sample Name\tBogus Column\nx\ty\n", None)
            .unwrap_err();
        assert!(matches!(err, IsaTabError::StructureError { .. }));
    }

    #[test]
    fn test_unlabelled_format_routes_lines() {
        let parser = TabParser::default();
        let content = "MAGE-TAB Version\t1.1\nInvestigation Title\tdemo\nProtocol Name\tP1\tP2\n";
        let instance = parser
            .parse_str(&format(MAGETAB_FORMAT_SET, "idf"), content, Some("E1.idf.txt"))
            .unwrap();

        let ids = instance.sections().iter().map(|s| s.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["idf_header", "idf_protocols"]);
        assert_eq!(instance.sections()[1].record_count(), 2);
    }
}
