//! Store objects of one type to one section

use super::renderers::RendererTable;
use super::{ExportScope, SectionExporter};
use isatab_core::schema::Format;
use isatab_core::{IsaTabError, Result, SectionInstance, SectionType, Store};
use std::any::{Any, type_name};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Selects the objects a scope exports
pub type Filter<T> = fn(&T, &ExportScope) -> bool;
/// Orders exported objects
pub type Comparator<T> = fn(&T, &T) -> Ordering;

/// Writes every store object of type `T` accepted by a filter as one record
pub struct RecordOrientedExporter<T> {
    section_id: &'static str,
    renderers: RendererTable<T>,
    filter: Filter<T>,
    comparator: Option<Comparator<T>>,
}

impl<T: Any> RecordOrientedExporter<T> {
    /// Create an exporter for a section
    #[must_use]
    pub fn new(section_id: &'static str, renderers: RendererTable<T>, filter: Filter<T>) -> Self {
        Self {
            section_id,
            renderers,
            filter,
            comparator: None,
        }
    }

    /// Order objects before rendering; store order is kept otherwise
    #[must_use]
    pub fn sorted_by(mut self, comparator: Comparator<T>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Renderer table
    #[must_use]
    pub fn renderers(&self) -> &RendererTable<T> {
        &self.renderers
    }
}

impl<T: Any> SectionExporter for RecordOrientedExporter<T> {
    fn section_id(&self) -> &str {
        self.section_id
    }

    fn export(&self, format: &Format, store: &Store, scope: &ExportScope) -> Result<SectionInstance> {
        let section = format.require_section(self.section_id)?;

        let mut objects = store
            .values_of_type::<T>()
            .into_iter()
            .filter(|object| (self.filter)(object, scope))
            .collect::<Vec<_>>();
        if let Some(comparator) = self.comparator {
            objects.sort_by(|a, b| comparator(a, b));
        }

        let mut instance = SectionInstance::new(Arc::clone(section));
        for column in self.renderers.static_columns() {
            instance.add_header(column, true)?;
        }
        let comment_names = self.renderers.comment_names(objects.iter().copied());
        for name in &comment_names {
            instance.add_header(&format!("Comment[{name}]"), true)?;
        }

        let mut dropped = 0;
        for object in objects {
            let record = self.renderers.render(object, &comment_names);
            if record.is_blank() {
                dropped += 1;
                continue;
            }
            instance.add_record(record);
        }

        if section.section_type == SectionType::OneInCol && instance.record_count() > 1 {
            return Err(IsaTabError::structure(
                &section.id,
                format!(
                    "{} objects of {} in a single-record section",
                    instance.record_count(),
                    type_name::<T>()
                ),
            ));
        }

        debug!(
            section = self.section_id,
            study = ?scope.study,
            records = instance.record_count(),
            dropped,
            "Exported section"
        );
        Ok(instance)
    }
}

/// Exports one block of sections per study, in store order
pub struct SectionBlockTabExporter {
    sections: Vec<Box<dyn SectionExporter>>,
}

impl SectionBlockTabExporter {
    /// Create a block exporter; sections are written in the given order
    #[must_use]
    pub fn new(sections: Vec<Box<dyn SectionExporter>>) -> Self {
        Self { sections }
    }

    /// Section exporters of one block
    #[must_use]
    pub fn sections(&self) -> &[Box<dyn SectionExporter>] {
        &self.sections
    }

    /// Export the block of one study
    ///
    /// # Errors
    ///
    /// Propagates the first section export error.
    pub fn export_study(&self, format: &Format, store: &Store, accession: &str) -> Result<Vec<SectionInstance>> {
        let scope = ExportScope::study(accession);
        self.sections
            .iter()
            .map(|exporter| exporter.export(format, store, &scope))
            .collect()
    }

    /// Export and concatenate the blocks of every study
    ///
    /// # Errors
    ///
    /// Propagates the first section export error.
    pub fn export(&self, format: &Format, store: &Store) -> Result<Vec<SectionInstance>> {
        let mut sections = Vec::new();
        for accession in super::study_accessions(store) {
            sections.extend(self.export_study(format, store, &accession)?);
        }
        Ok(sections)
    }
}
