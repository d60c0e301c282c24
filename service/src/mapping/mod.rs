//! Mapping engine: from parsed section instances to domain objects
//!
//! Mappers are layered the way files are: [`ClassTabMapper`] maps one
//! section to objects of one type, [`RecordOrientedTabMapper`] dispatches a
//! format's sections by id, [`FormatTabMapper`] walks one file and
//! [`FormatSetTabMapper`] maps a whole submission.

pub mod class;
pub mod format;
pub mod helpers;
pub mod investigation;
pub mod table;

pub use class::ClassTabMapper;
pub use format::{FormatSetTabMapper, FormatTabMapper, RecordOrientedTabMapper};
pub use helpers::{HelperKind, HelperSpec, HelperTable, split_terms, split_values};
pub use table::{TableKind, TableRowMapper};

use isatab_core::{IsaTabError, Result, SectionInstance, Store};

/// State threaded through one mapping run
#[derive(Debug, Clone, Default)]
pub struct MappingContext {
    /// Match headers case-sensitively
    pub case_sensitive: bool,
    /// Key of the investigation being mapped
    pub investigation: Option<String>,
    /// Accession of the study whose block or files are being mapped
    pub current_study: Option<String>,
    /// Name of the assay file being mapped
    pub current_assay_file: Option<String>,
}

impl MappingContext {
    /// Create an empty context
    #[must_use]
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            case_sensitive,
            ..Default::default()
        }
    }

    /// Accession of the current study
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::Internal` if no study block has been opened.
    pub fn require_study(&self) -> Result<&str> {
        self.current_study
            .as_deref()
            .ok_or_else(|| IsaTabError::internal("no study context is open"))
    }

    /// Name of the current assay file
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::Internal` if no assay file is being mapped.
    pub fn require_assay_file(&self) -> Result<&str> {
        self.current_assay_file
            .as_deref()
            .ok_or_else(|| IsaTabError::internal("no assay file context is open"))
    }
}

/// Maps every record of one section instance into the store
pub trait SectionMapper {
    /// Id of the section this mapper handles
    fn section_id(&self) -> &str;

    /// Map the section and return the number of stored objects
    ///
    /// # Errors
    ///
    /// Returns a structure error for unclaimed columns or cardinality
    /// violations, and propagates value errors from the helpers.
    fn map(
        &self,
        instance: &SectionInstance,
        store: &mut Store,
        ctx: &mut MappingContext,
    ) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_study() {
        let mut ctx = MappingContext::new(false);
        assert!(matches!(ctx.require_study(), Err(IsaTabError::Internal(_))));

        ctx.current_study = Some("MTBLS1".to_string());
        assert_eq!(ctx.require_study().unwrap(), "MTBLS1");
    }
}
