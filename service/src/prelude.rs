//! Prelude module for the curation toolkit
//!
//! This module re-exports commonly used types and functions for convenient import.

// Re-export core types
pub use isatab_core::prelude::*;

// Re-export the pipeline
pub use crate::pipeline::{ExportSummary, Pipeline, Submission};

// Re-export configuration
pub use crate::config::{ExportFormat, OrphanMode, ToolkitConfig};

// Re-export parser and mapping entry points
pub use crate::mapping::{FormatSetTabMapper, MappingContext};
pub use crate::parser::{IsaTabLoader, TabOptions, TabParser};

// Re-export validation types
pub use crate::validation::{Severity, ValidationEngine, ValidationOutcome, ValidationReport};

// Re-export export entry points
pub use crate::export::{FileTracker, FormatSetExporter, PrideXmlExporter, TabWriter};

pub use crate::file_system_adapter::{FileSystemOperations, LocalFileSystem};
pub use crate::ownership::OwnershipSpec;
