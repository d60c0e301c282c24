//! Format-level mappers

use super::table::TableRowMapper;
use super::{MappingContext, SectionMapper, investigation};
use isatab_core::model::{AssayGroup, Study};
use isatab_core::{FormatInstance, FormatSetInstance, Result, SectionInstance, Store};
use std::cmp::Reverse;
use tracing::{debug, info, warn};

/// Dispatches the sections of a format to their mappers by section id
#[derive(Default)]
pub struct RecordOrientedTabMapper {
    mappers: Vec<Box<dyn SectionMapper>>,
}

impl RecordOrientedTabMapper {
    /// Create a dispatcher over section mappers
    #[must_use]
    pub fn new(mappers: Vec<Box<dyn SectionMapper>>) -> Self {
        Self { mappers }
    }

    /// Mapper registered for a section id
    #[must_use]
    pub fn mapper(&self, section_id: &str) -> Option<&dyn SectionMapper> {
        self.mappers
            .iter()
            .find(|m| m.section_id() == section_id)
            .map(|m| &**m)
    }

    /// Map one section instance. Sections without a mapper are skipped.
    ///
    /// # Errors
    ///
    /// Propagates the section mapper's error.
    pub fn map_section(
        &self,
        instance: &SectionInstance,
        store: &mut Store,
        ctx: &mut MappingContext,
    ) -> Result<usize> {
        match self.mapper(instance.id()) {
            Some(mapper) => mapper.map(instance, store, ctx),
            None => {
                warn!(section = instance.id(), "No mapper registered, section skipped");
                Ok(0)
            }
        }
    }
}

/// How a format finds the study its records belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyScope {
    /// Study blocks inside the file open the context (investigation)
    Blocks,
    /// The study whose `Study File Name` is this file
    StudyFile,
    /// The study whose assay group names this file
    AssayFile,
}

/// Maps every section of one format instance
pub struct FormatTabMapper {
    format_id: &'static str,
    priority: i32,
    scope: StudyScope,
    block_start: Option<&'static str>,
    sections: RecordOrientedTabMapper,
}

impl FormatTabMapper {
    /// Create a format mapper
    #[must_use]
    pub fn new(
        format_id: &'static str,
        priority: i32,
        scope: StudyScope,
        sections: RecordOrientedTabMapper,
    ) -> Self {
        Self {
            format_id,
            priority,
            scope,
            block_start: None,
            sections,
        }
    }

    /// Section that opens a new study block
    #[must_use]
    pub fn with_block_start(mut self, section_id: &'static str) -> Self {
        self.block_start = Some(section_id);
        self
    }

    /// Investigation file mapper
    #[must_use]
    pub fn investigation() -> Self {
        Self::new(
            "investigation",
            100,
            StudyScope::Blocks,
            RecordOrientedTabMapper::new(investigation::section_mappers()),
        )
        .with_block_start("study")
    }

    /// Study-sample file mapper
    #[must_use]
    pub fn study_sample() -> Self {
        Self::new(
            "study_sample",
            50,
            StudyScope::StudyFile,
            RecordOrientedTabMapper::new(vec![Box::new(TableRowMapper::study_sample())]),
        )
    }

    /// Assay file mapper
    #[must_use]
    pub fn assay() -> Self {
        Self::new(
            "assay",
            10,
            StudyScope::AssayFile,
            RecordOrientedTabMapper::new(vec![Box::new(TableRowMapper::assay())]),
        )
    }

    /// Id of the mapped format
    #[must_use]
    pub fn format_id(&self) -> &str {
        self.format_id
    }

    /// Mapping priority, higher runs first
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    fn open_scope(&self, instance: &FormatInstance, store: &Store, ctx: &mut MappingContext) {
        let file_name = instance.file_name().unwrap_or_default();
        match self.scope {
            StudyScope::Blocks => {
                ctx.current_study = None;
                ctx.current_assay_file = None;
            }
            StudyScope::StudyFile => {
                ctx.current_study = store
                    .values_of_type::<Study>()
                    .into_iter()
                    .find(|s| s.file_name.as_deref() == Some(file_name))
                    .and_then(Study::key);
                ctx.current_assay_file = None;
            }
            StudyScope::AssayFile => {
                let group = store
                    .values_of_type::<AssayGroup>()
                    .into_iter()
                    .find(|g| g.file_name == file_name);
                ctx.current_study = group.map(|g| g.study.clone());
                ctx.current_assay_file = group.map(|g| g.file_name.clone());
            }
        }
        debug!(
            format = self.format_id,
            file = file_name,
            study = ?ctx.current_study,
            "Opened mapping scope"
        );
    }

    /// Map every section of a format instance
    ///
    /// # Errors
    ///
    /// Propagates section mapping errors; fails with an internal error when
    /// a study-scoped section has no study context.
    pub fn map(
        &self,
        instance: &FormatInstance,
        store: &mut Store,
        ctx: &mut MappingContext,
    ) -> Result<usize> {
        self.open_scope(instance, store, ctx);

        let mut stored = 0;
        for section in instance.sections() {
            if self.block_start == Some(section.id()) {
                ctx.current_study = None;
            }
            stored += self.sections.map_section(section, store, ctx)?;
        }

        info!(
            format = self.format_id,
            file = instance.file_name().unwrap_or_default(),
            objects = stored,
            "Mapped format"
        );
        Ok(stored)
    }
}

/// Maps a whole submission, highest-priority format first
pub struct FormatSetTabMapper {
    mappers: Vec<FormatTabMapper>,
}

impl FormatSetTabMapper {
    /// Create a set mapper; mappers are sorted by priority, descending
    #[must_use]
    pub fn new(mut mappers: Vec<FormatTabMapper>) -> Self {
        mappers.sort_by_key(|m| Reverse(m.priority));
        Self { mappers }
    }

    /// Mapper for the ISA-Tab format set
    #[must_use]
    pub fn isatab() -> Self {
        Self::new(vec![
            FormatTabMapper::assay(),
            FormatTabMapper::study_sample(),
            FormatTabMapper::investigation(),
        ])
    }

    /// Format mappers in execution order
    #[must_use]
    pub fn mappers(&self) -> &[FormatTabMapper] {
        &self.mappers
    }

    /// Map every format instance of the submission into the store
    ///
    /// # Errors
    ///
    /// Propagates the first format mapping error.
    pub fn map(
        &self,
        instance: &FormatSetInstance,
        store: &mut Store,
        ctx: &mut MappingContext,
    ) -> Result<usize> {
        let mut stored = 0;
        for mapper in &self.mappers {
            for format in instance.instances_of(mapper.format_id()) {
                stored += mapper.map(format, store, ctx)?;
            }
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order() {
        let ids = FormatSetTabMapper::isatab()
            .mappers()
            .iter()
            .map(|m| m.format_id().to_string())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["investigation", "study_sample", "assay"]);
    }
}
