//! Investigation-level entities: the content of the investigation file

use super::Annotation;
use super::ontology::OntologyTerm;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Key of an object scoped to a study (`None` scope = investigation level)
#[must_use]
pub fn scoped_key(study: Option<&str>, name: &str) -> String {
    format!("{}:{name}", study.unwrap_or("investigation"))
}

/// The investigation described by one submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    /// Investigation Identifier
    pub identifier: String,
    /// Investigation Title
    pub title: Option<String>,
    /// Investigation Description
    pub description: Option<String>,
    /// Investigation Submission Date
    pub submission_date: Option<NaiveDate>,
    /// Investigation Public Release Date
    pub release_date: Option<NaiveDate>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Investigation {
    /// Store key: the identifier, possibly empty
    #[must_use]
    pub fn key(&self) -> Option<String> {
        Some(self.identifier.trim().to_string())
    }
}

/// A study and its ownership
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Study {
    /// Study Identifier (accession)
    pub accession: String,
    /// Owning investigation key
    pub investigation: Option<String>,
    /// Study Title
    pub title: Option<String>,
    /// Study Description
    pub description: Option<String>,
    /// Study Submission Date
    pub submission_date: Option<NaiveDate>,
    /// Study Public Release Date
    pub release_date: Option<NaiveDate>,
    /// Study File Name (study-sample table)
    pub file_name: Option<String>,
    /// Logins of the users owning the study
    #[serde(default)]
    pub owners: BTreeSet<String>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Study {
    /// Store key: the accession
    #[must_use]
    pub fn key(&self) -> Option<String> {
        non_blank(&self.accession).map(str::to_string)
    }
}

/// One study design descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyDesign {
    /// Owning study accession
    pub study: String,
    /// Study Design Type
    pub design_type: OntologyTerm,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl StudyDesign {
    /// Store key: study and design label
    #[must_use]
    pub fn key(&self) -> Option<String> {
        non_blank(&self.design_type.label).map(|label| scoped_key(Some(&self.study), label))
    }
}

/// A person attached to the investigation or to one study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Owning study accession (`None` for investigation contacts)
    pub study: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// First name
    pub first_name: Option<String>,
    /// Mid initials
    pub mid_initials: Option<String>,
    /// Email
    pub email: Option<String>,
    /// Phone
    pub phone: Option<String>,
    /// Fax
    pub fax: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Affiliation
    pub affiliation: Option<String>,
    /// Roles (multi-valued)
    #[serde(default)]
    pub roles: Vec<OntologyTerm>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Contact {
    /// Store key: scope plus name and email; `None` for an anonymous contact
    #[must_use]
    pub fn key(&self) -> Option<String> {
        let parts = [&self.last_name, &self.first_name, &self.email]
            .iter()
            .map(|p| p.as_deref().unwrap_or("").trim().to_string())
            .collect::<Vec<_>>();
        if parts.iter().all(String::is_empty) {
            return None;
        }
        Some(scoped_key(self.study.as_deref(), &parts.join("|")))
    }
}

/// A publication attached to the investigation or to one study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// Owning study accession (`None` for investigation publications)
    pub study: Option<String>,
    /// PubMed ID
    pub pubmed_id: Option<String>,
    /// DOI
    pub doi: Option<String>,
    /// Author list
    pub author_list: Option<String>,
    /// Title
    pub title: Option<String>,
    /// Publication status
    pub status: Option<OntologyTerm>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Publication {
    /// Store key: scope plus the first of PubMed ID, DOI or title
    #[must_use]
    pub fn key(&self) -> Option<String> {
        [&self.pubmed_id, &self.doi, &self.title]
            .iter()
            .find_map(|p| p.as_deref().and_then(non_blank))
            .map(|id| scoped_key(self.study.as_deref(), id))
    }
}

/// A protocol declared by a study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    /// Owning study accession
    pub study: String,
    /// Protocol name, referenced by `Protocol REF` columns
    pub name: String,
    /// Protocol type
    pub protocol_type: Option<OntologyTerm>,
    /// Description
    pub description: Option<String>,
    /// URI
    pub uri: Option<String>,
    /// Version
    pub version: Option<String>,
    /// Parameter names
    #[serde(default)]
    pub parameters: Vec<OntologyTerm>,
    /// Component names
    #[serde(default)]
    pub components: Vec<String>,
    /// Component types
    #[serde(default)]
    pub component_types: Vec<OntologyTerm>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Protocol {
    /// Store key: study and protocol name
    #[must_use]
    pub fn key(&self) -> Option<String> {
        non_blank(&self.name).map(|name| scoped_key(Some(&self.study), name))
    }
}

/// A study factor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    /// Owning study accession
    pub study: String,
    /// Factor name, referenced by `Factor Value[...]` columns
    pub name: String,
    /// Factor type
    pub factor_type: Option<OntologyTerm>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Factor {
    /// Store key: study and factor name
    #[must_use]
    pub fn key(&self) -> Option<String> {
        non_blank(&self.name).map(|name| scoped_key(Some(&self.study), name))
    }
}

/// One assay file of a study and its measurement/technology pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssayGroup {
    /// Owning study accession
    pub study: String,
    /// Study Assay File Name
    pub file_name: String,
    /// Measurement type
    pub measurement: Option<OntologyTerm>,
    /// Technology type
    pub technology: Option<OntologyTerm>,
    /// Technology platform
    pub platform: Option<String>,
    /// Comment columns
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl AssayGroup {
    /// Store key: study and assay file name
    #[must_use]
    pub fn key(&self) -> Option<String> {
        non_blank(&self.file_name).map(|file| scoped_key(Some(&self.study), file))
    }

    /// Measurement label or empty text
    #[must_use]
    pub fn measurement_label(&self) -> &str {
        self.measurement.as_ref().map_or("", |t| t.label.as_str())
    }

    /// Technology label or empty text
    #[must_use]
    pub fn technology_label(&self) -> &str {
        self.technology.as_ref().map_or("", |t| t.label.as_str())
    }
}
