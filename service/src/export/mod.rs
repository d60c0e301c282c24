//! Export engine: from the store back to tabular and XML formats
//!
//! Exporters are layered like the mappers they mirror. A
//! [`SectionExporter`] renders one section, a [`FormatExporter`] assembles
//! the files of one format and [`FormatSetExporter`] a whole submission.
//! [`TabWriter`] turns instances into text, [`FileDispatcher`] copies the
//! data files they reference into the repository and [`RepoFilesChecker`]
//! looks for repository files nothing references any more.

pub mod files;
pub mod format;
pub mod investigation;
pub mod magetab;
pub mod pride;
pub mod record;
pub mod renderers;
pub mod writer;

pub use files::{DispatchSummary, FileDispatcher, FileTracker, OrphanSummary, RepoFilesChecker, TrackedFile};
pub use format::{FormatSetExporter, InvestigationExporter, TableRowExporter, TableTarget};
pub use magetab::{IdfExporter, SdrfExporter};
pub use pride::PrideXmlExporter;
pub use record::{RecordOrientedExporter, SectionBlockTabExporter};
pub use renderers::{RendererKind, RendererSpec, RendererTable};
pub use writer::TabWriter;

use isatab_core::model::Study;
use isatab_core::schema::Format;
use isatab_core::{FormatInstance, Result, SectionInstance, Store};
use std::sync::Arc;

/// The part of the store a section export covers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportScope {
    /// Study whose block is being written, `None` for investigation level
    pub study: Option<String>,
}

impl ExportScope {
    /// Investigation-level scope
    #[must_use]
    pub fn investigation() -> Self {
        Self::default()
    }

    /// Scope of one study block
    #[must_use]
    pub fn study(accession: impl Into<String>) -> Self {
        Self {
            study: Some(accession.into()),
        }
    }

    /// Whether the scope is the block of a study
    #[must_use]
    pub fn is_study(&self, accession: &str) -> bool {
        self.study.as_deref() == Some(accession)
    }
}

/// Renders store objects into one section instance
pub trait SectionExporter {
    /// Id of the section this exporter writes
    fn section_id(&self) -> &str;

    /// Export the objects of a scope
    ///
    /// # Errors
    ///
    /// Returns a structure error when the format lacks the section or a
    /// rendered header is not accepted by it.
    fn export(&self, format: &Format, store: &Store, scope: &ExportScope) -> Result<SectionInstance>;
}

/// Assembles the files of one format
pub trait FormatExporter {
    /// Id of the format this exporter writes
    fn format_id(&self) -> &str;

    /// Export every file of the format found in the store
    ///
    /// # Errors
    ///
    /// Propagates section export errors.
    fn export(&self, format: &Arc<Format>, store: &Store) -> Result<Vec<FormatInstance>>;
}

/// Accessions of every study, in store order
#[must_use]
pub fn study_accessions(store: &Store) -> Vec<String> {
    store
        .values_of_type::<Study>()
        .into_iter()
        .map(|s| s.accession.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Directory-safe form of a measurement or technology label
#[must_use]
pub fn slug(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}
