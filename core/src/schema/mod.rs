//! Declarative description of tabular formats
//!
//! A [`FormatSet`] owns [`Format`]s, which own [`Section`]s, which own
//! [`Field`] templates. Definitions are loaded once into a
//! [`SchemaRegistry`] and never mutated afterwards.

pub mod field;
pub mod format;
pub mod registry;
pub mod section;

pub use field::{Field, FieldSignature, RefFileType, is_node_header, split_header};
pub use format::{Format, FormatSet};
pub use registry::{ISATAB_FORMAT_SET, MAGETAB_FORMAT_SET, SchemaRegistry};
pub use section::{Section, SectionType};
