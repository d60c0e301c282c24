//! Tabular parsing of ISA-Tab and MAGE-TAB files
//!
//! [`TabParser`] turns delimited text into [`FormatInstance`]s following a
//! format definition; [`IsaTabLoader`] reads a whole submission directory.
//!
//! [`FormatInstance`]: isatab_core::FormatInstance

pub mod loader;
pub mod tab;

pub use loader::IsaTabLoader;
pub use tab::{TabOptions, TabParser};
