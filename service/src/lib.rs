//! # ISA-Tab Service
//!
//! Parsing, mapping, validation and export of ISA-Tab submissions.
//!
//! ## Overview
//!
//! `isatab-service` reads an ISA-Tab directory (an investigation file and the
//! study-sample and assay tables it names) into format instances, maps them
//! into domain objects held in a [`Store`], validates the tables against ISA
//! configurations and writes the submission back out as ISA-Tab, MAGE-TAB or
//! PRIDE-XML. Data files referenced by the tables are dispatched into a
//! repository layout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use isatab_service::prelude::*;
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let pipeline = Pipeline::new(ToolkitConfig::default())?;
//!     let submission = pipeline.import(Path::new("MTBLS1"))?;
//!
//!     let report = pipeline.validate(&submission)?;
//!     if report.is_valid() {
//!         pipeline.export(&submission)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`Store`]: isatab_core::Store

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)] // subjective determination
#![allow(clippy::return_self_not_must_use)] // builder patterns
#![allow(clippy::doc_markdown)] // ISA-Tab, MAGE-TAB, PRIDE-XML are proper nouns
#![allow(clippy::format_push_string)] // format! macro is more readable than write!

/// Configuration loading and management
pub mod config;

/// Tabular parsing
pub mod parser;

/// Section instances to domain objects
pub mod mapping;

/// Table validation against ISA configurations
pub mod validation;

/// ISA-Tab, MAGE-TAB and PRIDE-XML export, data file dispatch
pub mod export;

/// File system adapter for clean abstraction
pub mod file_system_adapter;

/// Study ownership changes
pub mod ownership;

/// Import, validate and export a submission
pub mod pipeline;

/// Prelude module for convenient imports
pub mod prelude;

pub use isatab_core::error::IsaTabError;
pub use isatab_core::{Result, Store};
pub use pipeline::{ExportSummary, Pipeline, Submission};
