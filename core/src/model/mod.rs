//! Domain objects populated by the mapping engine
//!
//! Every object exposes a `key()` used as its identity in the
//! [`Store`](crate::store::Store). A `None` key means the object is
//! anonymous and is not stored.

pub mod investigation;
pub mod ontology;
pub mod table;

pub use investigation::{
    AssayGroup, Contact, Factor, Investigation, Protocol, Publication, Study, StudyDesign,
    scoped_key,
};
pub use ontology::{OntologySource, OntologyTerm};
pub use table::{
    AssayRecord, DataFile, MaterialNode, PropertyValue, ProtocolApplication, Sample, Step,
    TableRow, TermColumns,
};

use serde::{Deserialize, Serialize};

/// A `Comment[name]` column value attached to an object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Bracketed comment name
    pub name: String,
    /// Cell value
    pub value: String,
}

impl Annotation {
    /// Create an annotation
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Header the annotation is written under
    #[must_use]
    pub fn header(&self) -> String {
        format!("Comment[{}]", self.name)
    }
}
