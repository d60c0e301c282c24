//! ISA configuration sets
//!
//! One YAML document per table configuration. Each names the
//! (measurement, technology) pair it applies to and lists, in column order,
//! the fields and protocol slots of the table:
//!
//! ```yaml
//! measurement: metabolite profiling
//! technology: mass spectrometry
//! table: assay
//! elements:
//!   - { field: Sample Name, required: true }
//!   - { protocol: extraction, required: true }
//!   - { field: Extract Name, required: true }
//!   - field: Parameter Value[Post Extraction]
//!     unit: true
//! ```

use isatab_core::schema::is_node_header;
use isatab_core::{IsaTabError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Measurement or technology matching any value
pub const WILDCARD: &str = "*";

const BUILTIN: &[(&str, &str)] = &[
    ("study_sample.yaml", include_str!("../../config/isaconfig/study_sample.yaml")),
    ("generic.yaml", include_str!("../../config/isaconfig/generic.yaml")),
    (
        "metabolite_profiling_ms.yaml",
        include_str!("../../config/isaconfig/metabolite_profiling_ms.yaml"),
    ),
    (
        "metabolite_profiling_nmr.yaml",
        include_str!("../../config/isaconfig/metabolite_profiling_nmr.yaml"),
    ),
    (
        "transcription_profiling_microarray.yaml",
        include_str!("../../config/isaconfig/transcription_profiling_microarray.yaml"),
    ),
];

/// Value type a field is checked against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Free text
    #[default]
    String,
    /// Ontology term with source and accession columns
    Ontology,
    /// ISO date
    Date,
    /// Number
    Numeric,
    /// One of `values`
    List,
}

/// Allowed ontologies of an ontology field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConstraint {
    /// Allowed term sources; empty allows any
    pub sources: Vec<String>,
    /// Accessions the term must fall under; empty allows any
    pub branches: Vec<String>,
}

/// A configured table column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Column header, e.g. `Characteristics[organism]`
    pub field: String,
    /// Column must exist and every row must carry a value
    #[serde(default)]
    pub required: bool,
    /// Value type
    #[serde(default)]
    pub data_type: DataType,
    /// Allowed values of a `list` field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Regular expression values must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Ontology restrictions of an `ontology` field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ontology: Option<OntologyConstraint>,
    /// Column must be followed by a `Unit` column
    #[serde(default)]
    pub unit: bool,
}

impl FieldConfig {
    /// Whether this column is a node (`... Name`, `... Data File`)
    #[must_use]
    pub fn is_node(&self) -> bool {
        is_node_header(&self.field)
    }
}

/// A configured protocol slot between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Required protocol type label
    pub protocol: String,
    /// Missing type is an error rather than allowed
    #[serde(default)]
    pub required: bool,
}

/// One element of a table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigElement {
    /// A column
    Field(FieldConfig),
    /// A protocol slot
    Protocol(ProtocolConfig),
}

/// Which table a configuration describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfiguredTable {
    /// Study-sample file
    StudySample,
    /// Assay file
    #[default]
    Assay,
}

/// Protocol slots preceding one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSpan {
    /// Header of the node that closes the span, empty after the last node
    pub node: String,
    /// Protocol slots in order
    pub protocols: Vec<ProtocolConfig>,
}

/// Configuration of one kind of table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfiguration {
    /// Measurement type label, `*` for any
    #[serde(default = "wildcard")]
    pub measurement: String,
    /// Technology type label, `*` for any
    #[serde(default = "wildcard")]
    pub technology: String,
    /// Described table
    #[serde(default)]
    pub table: ConfiguredTable,
    /// Fields and protocol slots in column order
    pub elements: Vec<ConfigElement>,
}

fn wildcard() -> String {
    WILDCARD.to_string()
}

impl TableConfiguration {
    /// `measurement/technology`
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}/{}", self.measurement, self.technology)
    }

    /// Whether this is the catch-all configuration
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.measurement == WILDCARD && self.technology == WILDCARD
    }

    /// Configured columns in order
    pub fn fields(&self) -> impl Iterator<Item = &FieldConfig> {
        self.elements.iter().filter_map(|e| match e {
            ConfigElement::Field(field) => Some(field),
            ConfigElement::Protocol(_) => None,
        })
    }

    /// Configured column by header, ignoring case
    #[must_use]
    pub fn field(&self, header: &str) -> Option<&FieldConfig> {
        self.fields().find(|f| f.field.eq_ignore_ascii_case(header))
    }

    /// Protocol slots grouped by the node that follows them
    #[must_use]
    pub fn protocol_spans(&self) -> Vec<ProtocolSpan> {
        let mut spans = Vec::new();
        let mut pending = Vec::new();
        for element in &self.elements {
            match element {
                ConfigElement::Protocol(protocol) => pending.push(protocol.clone()),
                ConfigElement::Field(field) if field.is_node() => {
                    spans.push(ProtocolSpan {
                        node: field.field.clone(),
                        protocols: std::mem::take(&mut pending),
                    });
                }
                ConfigElement::Field(_) => {}
            }
        }
        if !pending.is_empty() {
            spans.push(ProtocolSpan {
                node: String::new(),
                protocols: pending,
            });
        }
        spans
    }

    fn matches_exactly(&self, measurement: &str, technology: &str) -> bool {
        self.measurement.eq_ignore_ascii_case(measurement)
            && self.technology.eq_ignore_ascii_case(technology)
    }

    fn matches_partially(&self, measurement: &str, technology: &str) -> bool {
        let overlaps = |configured: &str, actual: &str| {
            let configured = configured.to_lowercase();
            let actual = actual.to_lowercase();
            !actual.is_empty() && (configured.contains(&actual) || actual.contains(&configured))
        };
        !self.is_generic()
            && overlaps(&self.measurement, measurement)
            && overlaps(&self.technology, technology)
    }
}

/// Every table configuration known to a validation run
#[derive(Debug, Clone, Default)]
pub struct IsaConfigurationSet {
    tables: Vec<TableConfiguration>,
}

impl IsaConfigurationSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configurations shipped with the toolkit
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` if a built-in document is invalid.
    pub fn builtin() -> Result<Self> {
        let mut set = Self::new();
        for (name, yaml) in BUILTIN {
            set.add(parse_table(name, yaml)?);
        }
        Ok(set)
    }

    /// Load every `.yaml`/`.yml` file of a directory
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::IoError` if the directory cannot be walked and
    /// `IsaTabError::ConfigError` for an invalid document.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut set = Self::new();
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).max_depth(1) {
            let entry = entry.map_err(|e| {
                IsaTabError::config(format!("Failed to list {}: {e}", dir.display()))
            })?;
            let is_yaml = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if entry.file_type().is_file() && is_yaml {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        for path in paths {
            let yaml = std::fs::read_to_string(&path)?;
            set.add(parse_table(&path.display().to_string(), &yaml)?);
        }
        info!(dir = %dir.display(), tables = set.len(), "Loaded ISA configuration");
        Ok(set)
    }

    /// Add a configuration
    pub fn add(&mut self, table: TableConfiguration) {
        debug!(configuration = %table.name(), "Registered table configuration");
        self.tables.push(table);
    }

    /// Number of configurations
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no configuration is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Study-sample table configuration
    #[must_use]
    pub fn study_sample(&self) -> Option<&TableConfiguration> {
        self.tables
            .iter()
            .find(|t| t.table == ConfiguredTable::StudySample)
    }

    /// Catch-all assay configuration
    #[must_use]
    pub fn generic(&self) -> Option<&TableConfiguration> {
        self.assays().find(|t| t.is_generic())
    }

    /// Assay configuration for a measurement and technology: exact match,
    /// then partial match, then the catch-all
    #[must_use]
    pub fn lookup(&self, measurement: &str, technology: &str) -> Option<&TableConfiguration> {
        self.assays()
            .find(|t| t.matches_exactly(measurement, technology))
            .or_else(|| {
                self.assays()
                    .find(|t| t.matches_partially(measurement, technology))
            })
            .or_else(|| self.generic())
    }

    fn assays(&self) -> impl Iterator<Item = &TableConfiguration> {
        self.tables.iter().filter(|t| t.table == ConfiguredTable::Assay)
    }
}

fn parse_table(name: &str, yaml: &str) -> Result<TableConfiguration> {
    serde_yaml::from_str(yaml)
        .map_err(|e| IsaTabError::config(format!("Invalid ISA configuration {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_lookup_order() {
        let set = IsaConfigurationSet::builtin().unwrap();

        let exact = set.lookup("Metabolite Profiling", "Mass Spectrometry").unwrap();
        assert_eq!(exact.name(), "metabolite profiling/mass spectrometry");

        let partial = set.lookup("metabolite profiling", "NMR").unwrap();
        assert_eq!(partial.name(), "metabolite profiling/NMR spectroscopy");

        let fallback = set.lookup("proteomics", "gel electrophoresis").unwrap();
        assert!(fallback.is_generic());

        assert!(set.study_sample().is_some());
    }

    #[test]
    fn test_protocol_spans_close_on_nodes() {
        let table: TableConfiguration = serde_yaml::from_str(
            "elements:\n  - { field: Sample Name }\n  - { protocol: extraction, required: true }\n  - { field: \"Parameter Value[Solvent]\" }\n  - { field: Extract Name }\n  - { protocol: mass spectrometry }\n  - { field: MS Assay Name }\n",
        )
        .unwrap();

        let spans = table.protocol_spans();
        let summary = spans
            .iter()
            .map(|s| (s.node.as_str(), s.protocols.len()))
            .collect::<Vec<_>>();
        assert_eq!(summary, vec![("Sample Name", 0), ("Extract Name", 1), ("MS Assay Name", 1)]);
        assert!(spans[1].protocols[0].required);
        assert!(table.is_generic());
    }

    #[test]
    fn test_load_dir_reads_yaml_only() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("custom.yml"),
            "measurement: m\ntechnology: t\nelements:\n  - { field: Sample Name, required: true }\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let set = IsaConfigurationSet::load_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.lookup("M", "T").unwrap().field("sample name").unwrap().required);
        assert!(set.generic().is_none());
    }

    #[test]
    fn test_invalid_document() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.yaml"), "elements: 3\n").unwrap();
        let err = IsaConfigurationSet::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, IsaTabError::ConfigError(_)));
    }
}
