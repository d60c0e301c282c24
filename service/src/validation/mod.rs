//! Validation engine
//!
//! Study-sample and assay tables are checked against an
//! [`IsaConfigurationSet`] chosen by the assay group's measurement and
//! technology. Validators run in a fixed order and their findings are
//! collected in a [`ValidationReport`]; an assay file that fails its own
//! configuration is retried once against the generic one.

pub mod configuration;
pub mod context;
pub mod engine;
pub mod ontology;
pub mod report;
pub mod validators;

pub use configuration::{
    ConfigElement, ConfiguredTable, DataType, FieldConfig, IsaConfigurationSet,
    OntologyConstraint, ProtocolConfig, ProtocolSpan, TableConfiguration,
};
pub use context::{StudyFacts, TableContext};
pub use engine::ValidationEngine;
pub use ontology::{IndexedTerm, OntologyIndex, OntologyLookup};
pub use report::{Severity, ValidationIssue, ValidationOutcome, ValidationReport, ValidationStats};
pub use validators::{TableValidator, default_validators};
