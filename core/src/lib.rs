//! # ISA-Tab Core
//!
//! Core types for reading, mapping, validating and exporting ISA-Tab
//! submissions.
//!
//! This crate provides the declarative schema model describing tabular
//! formats, the runtime instances produced by parsers, the domain objects
//! produced by mapping and the typed object store holding them.
//!
//! ## Design Principles
//!
//! - **Declarative formats**: file layouts are data, loaded from YAML
//! - **Immutable schemas**: definitions are shared behind `Arc` once loaded
//! - **One store per submission**: no shared mutable state between runs

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Core error types
pub mod error;

/// Format set, format, section and field definitions
pub mod schema;

/// Parsed instances of the schema tree
pub mod instance;

/// Domain objects
pub mod model;

/// Typed object store
pub mod store;

// Re-export commonly used types
pub use error::{IsaTabError, Result};
pub use instance::{FormatInstance, FormatSetInstance, Record, SectionInstance};
pub use schema::{Field, Format, FormatSet, RefFileType, SchemaRegistry, Section, SectionType};
pub use store::Store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{IsaTabError, Result};
    pub use crate::instance::*;
    pub use crate::model::*;
    pub use crate::schema::*;
    pub use crate::store::Store;
}
