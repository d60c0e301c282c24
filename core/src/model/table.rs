//! Row-level entities of the study-sample and assay tables
//!
//! A table row is kept as the ordered list of [`Step`]s it was read from, so
//! that it can be written back with the same column layout.

use super::ontology::OntologyTerm;
use crate::schema::{RefFileType, split_header};
use serde::{Deserialize, Serialize};

/// Which companion columns a property carried in its table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermColumns {
    /// `Term Source REF` + `Term Accession Number` after the value
    pub term_refs: bool,
    /// `Unit` after the value
    pub unit: bool,
    /// `Term Source REF` + `Term Accession Number` after the unit
    pub unit_refs: bool,
}

/// A Characteristics, Parameter Value, Factor Value or Material Type cell
/// together with its unit and references
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    /// Column header, e.g. `Characteristics[organism]`
    pub header: String,
    /// Value; the label is empty for a blank cell
    pub value: OntologyTerm,
    /// Unit, when the column carries one
    pub unit: Option<OntologyTerm>,
    /// Companion column layout
    #[serde(default)]
    pub columns: TermColumns,
}

impl PropertyValue {
    /// Create a plain property without companion columns
    pub fn new(header: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            value: OntologyTerm::new(value),
            unit: None,
            columns: TermColumns::default(),
        }
    }

    /// The bracketed category (`organism` for `Characteristics[organism]`),
    /// or the header itself when it has none
    #[must_use]
    pub fn category(&self) -> &str {
        let Some(open) = self.header.find('[') else {
            return self.header.trim();
        };
        let rest = &self.header[open + 1..];
        rest.find(']').map_or(rest, |close| &rest[..close]).trim()
    }

    /// The header id (`Characteristics` for `Characteristics[organism]`)
    #[must_use]
    pub fn kind(&self) -> String {
        split_header(&self.header).map_or_else(|_| self.header.clone(), |(id, _, _)| id)
    }

    /// Column headers this property spans
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![self.header.clone()];
        if self.columns.term_refs {
            headers.push("Term Source REF".to_string());
            headers.push("Term Accession Number".to_string());
        }
        if self.columns.unit {
            headers.push("Unit".to_string());
            if self.columns.unit_refs {
                headers.push("Term Source REF".to_string());
                headers.push("Term Accession Number".to_string());
            }
        }
        headers
    }

    /// Cell values aligned with [`headers`](Self::headers)
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![self.value.label.clone()];
        if self.columns.term_refs {
            cells.push(self.value.source_text().to_string());
            cells.push(self.value.accession_text().to_string());
        }
        if self.columns.unit {
            let unit = self.unit.clone().unwrap_or_default();
            cells.push(unit.label.clone());
            if self.columns.unit_refs {
                cells.push(unit.source_text().to_string());
                cells.push(unit.accession_text().to_string());
            }
        }
        cells
    }
}

/// A material node (`Source Name`, `Sample Name`, `Extract Name`, ...) and
/// the properties that follow it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialNode {
    /// Node header, e.g. `Sample Name`
    pub header: String,
    /// Node name
    pub name: String,
    /// Characteristics, Material Type, Label
    #[serde(default)]
    pub attributes: Vec<PropertyValue>,
}

/// A `Protocol REF` cell and its parameter values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolApplication {
    /// Referenced protocol name
    pub protocol: String,
    /// Parameter values in column order
    #[serde(default)]
    pub parameters: Vec<PropertyValue>,
}

/// A data file reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFile {
    /// Column header, e.g. `Raw Spectral Data File`
    pub header: String,
    /// Path relative to the submission directory
    pub path: String,
    /// Raw, processed or generic, from the field definition
    pub kind: Option<RefFileType>,
}

/// One element of a table row in column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Material node
    Node(MaterialNode),
    /// Protocol application
    Protocol(ProtocolApplication),
    /// Data file
    Data(DataFile),
    /// Factor value
    FactorValue(PropertyValue),
    /// Any single-column attribute (`Performer`, `Date`, `Comment[...]`, ...)
    Attribute {
        /// Column header
        header: String,
        /// Cell value
        value: String,
    },
}

impl Step {
    /// Column headers this step spans
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        match self {
            Self::Node(node) => std::iter::once(node.header.clone())
                .chain(node.attributes.iter().flat_map(PropertyValue::headers))
                .collect(),
            Self::Protocol(application) => std::iter::once("Protocol REF".to_string())
                .chain(application.parameters.iter().flat_map(PropertyValue::headers))
                .collect(),
            Self::Data(file) => vec![file.header.clone()],
            Self::FactorValue(value) => value.headers(),
            Self::Attribute { header, .. } => vec![header.clone()],
        }
    }

    /// Cell values aligned with [`headers`](Self::headers)
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        match self {
            Self::Node(node) => std::iter::once(node.name.clone())
                .chain(node.attributes.iter().flat_map(PropertyValue::cells))
                .collect(),
            Self::Protocol(application) => std::iter::once(application.protocol.clone())
                .chain(application.parameters.iter().flat_map(PropertyValue::cells))
                .collect(),
            Self::Data(file) => vec![file.path.clone()],
            Self::FactorValue(value) => value.cells(),
            Self::Attribute { value, .. } => vec![value.clone()],
        }
    }
}

/// Shared read access to the steps of a table row
pub trait TableRow {
    /// Owning study accession
    fn study(&self) -> &str;

    /// Zero-based data row index in the source table
    fn row(&self) -> usize;

    /// Steps in column order
    fn steps(&self) -> &[Step];

    /// Name of the first node with the given header
    fn node_name(&self, header: &str) -> Option<&str> {
        self.steps().iter().find_map(|step| match step {
            Step::Node(node) if node.header.eq_ignore_ascii_case(header) => {
                Some(node.name.as_str())
            }
            _ => None,
        })
    }

    /// `Sample Name` of the row
    fn sample_name(&self) -> Option<&str> {
        self.node_name("Sample Name")
    }

    /// Every node property in column order
    fn characteristics(&self) -> Vec<&PropertyValue> {
        self.steps()
            .iter()
            .filter_map(|step| match step {
                Step::Node(node) => Some(node.attributes.iter()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Every factor value in column order
    fn factor_values(&self) -> Vec<&PropertyValue> {
        self.steps()
            .iter()
            .filter_map(|step| match step {
                Step::FactorValue(value) => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Every non-empty data file reference
    fn data_files(&self) -> Vec<&DataFile> {
        self.steps()
            .iter()
            .filter_map(|step| match step {
                Step::Data(file) if !file.path.trim().is_empty() => Some(file),
                _ => None,
            })
            .collect()
    }

    /// Every non-empty protocol reference in column order
    fn protocol_refs(&self) -> Vec<&str> {
        self.steps()
            .iter()
            .filter_map(|step| match step {
                Step::Protocol(application) if !application.protocol.trim().is_empty() => {
                    Some(application.protocol.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Flattened column headers
    fn headers(&self) -> Vec<String> {
        self.steps().iter().flat_map(Step::headers).collect()
    }

    /// Flattened cells aligned with [`headers`](Self::headers)
    fn cells(&self) -> Vec<String> {
        self.steps().iter().flat_map(Step::cells).collect()
    }
}

/// One row of a study-sample table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Owning study accession
    pub study: String,
    /// Zero-based data row index
    pub row: usize,
    /// Steps in column order
    pub steps: Vec<Step>,
}

impl Sample {
    /// Store key: study and row
    #[must_use]
    pub fn key(&self) -> Option<String> {
        Some(format!("{}:{:06}", self.study, self.row))
    }
}

impl TableRow for Sample {
    fn study(&self) -> &str {
        &self.study
    }

    fn row(&self) -> usize {
        self.row
    }

    fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// One row of an assay table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssayRecord {
    /// Owning study accession
    pub study: String,
    /// Assay file the row was read from
    pub assay_file: String,
    /// Zero-based data row index
    pub row: usize,
    /// Steps in column order
    pub steps: Vec<Step>,
}

impl AssayRecord {
    /// Store key: study, assay file and row
    #[must_use]
    pub fn key(&self) -> Option<String> {
        Some(format!("{}:{}:{:06}", self.study, self.assay_file, self.row))
    }
}

impl TableRow for AssayRecord {
    fn study(&self) -> &str {
        &self.study
    }

    fn row(&self) -> usize {
        self.row
    }

    fn steps(&self) -> &[Step] {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn organism() -> PropertyValue {
        PropertyValue {
            header: "Characteristics[organism]".to_string(),
            value: OntologyTerm::referenced("Homo sapiens", "9606", "NCBITAXON"),
            unit: None,
            columns: TermColumns {
                term_refs: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_property_layout() {
        let value = organism();
        assert_eq!(value.category(), "organism");
        assert_eq!(value.kind(), "Characteristics");
        assert_eq!(
            value.headers(),
            vec!["Characteristics[organism]", "Term Source REF", "Term Accession Number"]
        );
        assert_eq!(value.cells(), vec!["Homo sapiens", "NCBITAXON", "9606"]);

        let dose = PropertyValue {
            header: "Factor Value[dose]".to_string(),
            value: OntologyTerm::new("5"),
            unit: Some(OntologyTerm::referenced("milligram", "UO_0000022", "UO")),
            columns: TermColumns {
                term_refs: false,
                unit: true,
                unit_refs: true,
            },
        };
        assert_eq!(
            dose.headers(),
            vec!["Factor Value[dose]", "Unit", "Term Source REF", "Term Accession Number"]
        );
        assert_eq!(dose.cells(), vec!["5", "milligram", "UO", "UO_0000022"]);
    }

    #[test]
    fn test_row_accessors() {
        let sample = Sample {
            study: "S1".to_string(),
            row: 0,
            steps: vec![
                Step::Node(MaterialNode {
                    header: "Source Name".to_string(),
                    name: "src1".to_string(),
                    attributes: vec![organism()],
                }),
                Step::Protocol(ProtocolApplication {
                    protocol: "sample collection".to_string(),
                    parameters: vec![],
                }),
                Step::Node(MaterialNode {
                    header: "Sample Name".to_string(),
                    name: "smp1".to_string(),
                    attributes: vec![],
                }),
                Step::FactorValue(PropertyValue::new("Factor Value[genotype]", "wt")),
            ],
        };

        assert_eq!(sample.sample_name(), Some("smp1"));
        assert_eq!(sample.node_name("source name"), Some("src1"));
        assert_eq!(sample.protocol_refs(), vec!["sample collection"]);
        assert_eq!(sample.characteristics().len(), 1);
        assert_eq!(sample.factor_values()[0].category(), "genotype");
        assert_eq!(sample.headers().len(), sample.cells().len());
        assert_eq!(sample.key().as_deref(), Some("S1:000000"));
    }
}
