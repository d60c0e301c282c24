//! Ontology terms and term sources

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (label, accession, source) triple referencing a controlled vocabulary
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OntologyTerm {
    /// Human readable label (cell text)
    pub label: String,

    /// Term accession, e.g. `NCBITaxon:9606` or a full IRI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accession: Option<String>,

    /// Term source REF, the name of an [`OntologySource`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl OntologyTerm {
    /// Create a free-text term without references
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            accession: None,
            source: None,
        }
    }

    /// Create a fully referenced term
    pub fn referenced(
        label: impl Into<String>,
        accession: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            accession: Some(accession.into()),
            source: Some(source.into()),
        }
    }

    /// Build a term from optional cell values; `None` when all three are empty
    #[must_use]
    pub fn from_cells(label: Option<&str>, accession: Option<&str>, source: Option<&str>) -> Option<Self> {
        let clean = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        let (label, accession, source) = (clean(label), clean(accession), clean(source));
        if label.is_none() && accession.is_none() && source.is_none() {
            return None;
        }
        Some(Self {
            label: label.unwrap_or_default(),
            accession,
            source,
        })
    }

    /// Whether the term carries no information at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.trim().is_empty() && self.accession.is_none() && self.source.is_none()
    }

    /// Whether both source and accession are set
    #[must_use]
    pub fn is_referenced(&self) -> bool {
        self.accession.is_some() && self.source.is_some()
    }

    /// Source REF or empty text
    #[must_use]
    pub fn source_text(&self) -> &str {
        self.source.as_deref().unwrap_or("")
    }

    /// Accession or empty text
    #[must_use]
    pub fn accession_text(&self) -> &str {
        self.accession.as_deref().unwrap_or("")
    }
}

impl fmt::Display for OntologyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, &self.accession) {
            (Some(source), Some(accession)) => write!(f, "{} ({source}:{accession})", self.label),
            (None, Some(accession)) => write!(f, "{} ({accession})", self.label),
            _ => write!(f, "{}", self.label),
        }
    }
}

/// A term source declared in the ONTOLOGY SOURCE REFERENCE section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologySource {
    /// Short name used as Term Source REF
    pub name: String,
    /// Location of the ontology file
    pub file: Option<String>,
    /// Ontology version
    pub version: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<super::Annotation>,
}

impl OntologySource {
    /// Store key: the source name
    #[must_use]
    pub fn key(&self) -> Option<String> {
        let name = self.name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cells() {
        assert_eq!(OntologyTerm::from_cells(None, Some(" "), None), None);

        let term = OntologyTerm::from_cells(Some("Homo sapiens"), Some("NCBITaxon:9606"), Some("NCBITAXON"))
            .unwrap();
        assert!(term.is_referenced());
        assert_eq!(term.to_string(), "Homo sapiens (NCBITAXON:NCBITaxon:9606)");

        let free = OntologyTerm::from_cells(Some("liver"), None, None).unwrap();
        assert!(!free.is_referenced());
        assert_eq!(free.to_string(), "liver");
    }
}
