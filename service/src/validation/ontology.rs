//! Ontology hierarchy lookups

use isatab_core::{IsaTabError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Answers whether a term sits under a branch of its ontology
pub trait OntologyLookup {
    /// Whether `accession` is known to the lookup
    fn contains(&self, accession: &str) -> bool;

    /// Whether `accession` equals `branch` or descends from it
    fn is_under(&self, accession: &str, branch: &str) -> bool;
}

/// One term of an [`OntologyIndex`] document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTerm {
    /// Term accession, e.g. `NCBITaxon:9606`
    pub accession: String,
    /// Term label
    #[serde(default)]
    pub label: String,
    /// Source ontology
    #[serde(default)]
    pub source: String,
    /// Direct parents
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct IndexDocument {
    terms: Vec<IndexedTerm>,
}

/// In-memory ontology hierarchy loaded from YAML
///
/// ```yaml
/// terms:
///   - { accession: "NCBITaxon:9606", label: Homo sapiens, parents: ["NCBITaxon:9605"] }
/// ```
#[derive(Debug, Clone, Default)]
pub struct OntologyIndex {
    terms: HashMap<String, IndexedTerm>,
}

impl OntologyIndex {
    /// Create an empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an index document
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` if the YAML is invalid.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: IndexDocument = serde_yaml::from_str(yaml)
            .map_err(|e| IsaTabError::config(format!("Invalid ontology index: {e}")))?;
        let mut index = Self::new();
        for term in document.terms {
            index.insert(term);
        }
        Ok(index)
    }

    /// Load an index file
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::IoError` if the file cannot be read and the
    /// errors of [`from_yaml`](Self::from_yaml).
    pub fn load(path: &Path) -> Result<Self> {
        let index = Self::from_yaml(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), terms = index.len(), "Loaded ontology index");
        Ok(index)
    }

    /// Add or replace a term
    pub fn insert(&mut self, term: IndexedTerm) {
        self.terms.insert(term.accession.clone(), term);
    }

    /// Term by accession
    #[must_use]
    pub fn term(&self, accession: &str) -> Option<&IndexedTerm> {
        self.terms.get(accession)
    }

    /// Number of terms
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the index holds no term
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl OntologyLookup for OntologyIndex {
    fn contains(&self, accession: &str) -> bool {
        self.terms.contains_key(accession)
    }

    fn is_under(&self, accession: &str, branch: &str) -> bool {
        let mut pending = vec![accession];
        let mut seen = HashSet::new();
        while let Some(current) = pending.pop() {
            if current == branch {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(term) = self.terms.get(current) {
                pending.extend(term.parents.iter().map(String::as_str));
            }
        }
        false
    }
}
