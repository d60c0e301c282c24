//! State shared by the validators of one table

use super::configuration::TableConfiguration;
use super::ontology::OntologyLookup;
use isatab_core::model::{Factor, OntologySource, Protocol};
use isatab_core::{SectionInstance, Store};
use std::collections::{HashMap, HashSet};

/// What the investigation file declares about one study
#[derive(Debug, Clone, Default)]
pub struct StudyFacts {
    /// Study accession
    pub accession: String,
    /// Lower-cased protocol name -> lower-cased protocol type
    pub protocol_types: HashMap<String, String>,
    /// Declared factor names
    pub factors: Vec<String>,
    /// Lower-cased names from `ONTOLOGY SOURCE REFERENCE`
    pub ontology_sources: HashSet<String>,
}

impl StudyFacts {
    /// Collect the declarations of a study from the store
    #[must_use]
    pub fn collect(store: &Store, accession: &str) -> Self {
        let protocol_types = store
            .values_of_type::<Protocol>()
            .into_iter()
            .filter(|p| p.study == accession)
            .map(|p| {
                let kind = p
                    .protocol_type
                    .as_ref()
                    .map(|t| t.label.trim().to_lowercase())
                    .unwrap_or_default();
                (p.name.trim().to_lowercase(), kind)
            })
            .collect();

        let mut factors = store
            .values_of_type::<Factor>()
            .into_iter()
            .filter(|f| f.study == accession)
            .map(|f| f.name.trim().to_string())
            .collect::<Vec<_>>();
        factors.sort();

        let ontology_sources = store
            .values_of_type::<OntologySource>()
            .into_iter()
            .map(|s| s.name.trim().to_lowercase())
            .collect();

        Self {
            accession: accession.to_string(),
            protocol_types,
            factors,
            ontology_sources,
        }
    }
}

/// One table under validation
pub struct TableContext<'a> {
    /// File the table was read from
    pub file_name: &'a str,
    /// Parsed table
    pub table: &'a SectionInstance,
    /// Configuration it is checked against
    pub configuration: &'a TableConfiguration,
    /// Declarations of the owning study
    pub facts: &'a StudyFacts,
    /// Study-sample table, when `table` is an assay table
    pub samples: Option<&'a SectionInstance>,
    /// Ontology hierarchy, when one is configured
    pub lookup: Option<&'a dyn OntologyLookup>,
    headers: Vec<String>,
}

impl<'a> TableContext<'a> {
    /// Create a context for a table
    #[must_use]
    pub fn new(
        file_name: &'a str,
        table: &'a SectionInstance,
        configuration: &'a TableConfiguration,
        facts: &'a StudyFacts,
    ) -> Self {
        Self {
            file_name,
            table,
            configuration,
            facts,
            samples: None,
            lookup: None,
            headers: table.headers(),
        }
    }

    /// Attach the study-sample table of an assay table
    #[must_use]
    pub fn with_samples(mut self, samples: Option<&'a SectionInstance>) -> Self {
        self.samples = samples;
        self
    }

    /// Attach an ontology lookup
    #[must_use]
    pub fn with_lookup(mut self, lookup: Option<&'a dyn OntologyLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    /// Rendered column headers
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Header of a column
    #[must_use]
    pub fn header(&self, column: usize) -> Option<&str> {
        self.headers.get(column).map(String::as_str)
    }

    /// Whether a column carries the given header, ignoring case
    #[must_use]
    pub fn header_is(&self, column: usize, header: &str) -> bool {
        self.header(column)
            .is_some_and(|h| h.eq_ignore_ascii_case(header))
    }

    /// First column with a header, ignoring case
    #[must_use]
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(header.trim()))
    }

    /// (one-based row, trimmed cell) for every record, empty cells included
    pub fn cells(&self, column: usize) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let table = self.table;
        table
            .records()
            .iter()
            .enumerate()
            .map(move |(row, record)| (row + 1, record.raw(column).trim()))
    }
}

/// Comma-separated row numbers, shortened after ten
#[must_use]
pub fn row_list(rows: &[usize]) -> String {
    const SHOWN: usize = 10;
    let mut text = rows
        .iter()
        .take(SHOWN)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    if rows.len() > SHOWN {
        text.push_str(&format!(" and {} more", rows.len() - SHOWN));
    }
    text
}
