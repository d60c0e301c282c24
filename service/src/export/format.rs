//! Format-level exporters

use super::investigation;
use super::magetab::{IdfExporter, SdrfExporter};
use super::record::SectionBlockTabExporter;
use super::{ExportScope, FormatExporter, SectionExporter};
use isatab_core::model::{AssayGroup, AssayRecord, Investigation, Sample, Study, TableRow};
use isatab_core::schema::{Format, ISATAB_FORMAT_SET, MAGETAB_FORMAT_SET};
use isatab_core::{
    FormatInstance, FormatSetInstance, IsaTabError, Record, Result, SchemaRegistry, SectionInstance,
    Store,
};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Writes the investigation file: header sections, then one block per study
pub struct InvestigationExporter {
    header: Vec<Box<dyn SectionExporter>>,
    studies: SectionBlockTabExporter,
}

impl InvestigationExporter {
    /// Create an exporter from its header sections and study block
    #[must_use]
    pub fn new(header: Vec<Box<dyn SectionExporter>>, studies: SectionBlockTabExporter) -> Self {
        Self { header, studies }
    }

    /// Exporter of the ISA-Tab investigation file
    #[must_use]
    pub fn isatab() -> Self {
        Self::new(investigation::header_exporters(), investigation::study_block())
    }

    /// `i_<identifier>.txt`, or `i_investigation.txt` without an identifier
    #[must_use]
    pub fn file_name(store: &Store) -> String {
        let identifier = store
            .values_of_type::<Investigation>()
            .first()
            .map(|i| i.identifier.trim().to_string())
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| "investigation".to_string());
        format!("i_{identifier}.txt")
    }
}

impl FormatExporter for InvestigationExporter {
    fn format_id(&self) -> &str {
        "investigation"
    }

    fn export(&self, format: &Arc<Format>, store: &Store) -> Result<Vec<FormatInstance>> {
        let mut instance = FormatInstance::new(Arc::clone(format)).with_file_name(Self::file_name(store));
        let scope = ExportScope::investigation();
        for exporter in &self.header {
            instance.add_section(exporter.export(format, store, &scope)?);
        }
        for section in self.studies.export(format, store)? {
            instance.add_section(section);
        }
        Ok(vec![instance])
    }
}

/// One table file to export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    /// Owning study accession
    pub study: String,
    /// File name the table is written to
    pub file_name: String,
}

/// Lists the files a table exporter writes
pub type Targets = fn(&Store) -> Vec<TableTarget>;
/// Whether a row belongs to a file
pub type Member<T> = fn(&T, &TableTarget) -> bool;

/// Writes table rows back with the column layout they were read with
pub struct TableRowExporter<T> {
    format_id: &'static str,
    section_id: &'static str,
    targets: Targets,
    member: Member<T>,
}

impl<T: TableRow + Any> TableRowExporter<T> {
    /// Create a table exporter
    #[must_use]
    pub fn new(format_id: &'static str, section_id: &'static str, targets: Targets, member: Member<T>) -> Self {
        Self {
            format_id,
            section_id,
            targets,
            member,
        }
    }

    /// Export the rows of one file
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::StructureError` when rows of the file disagree
    /// on their column layout or a header is not accepted by the section.
    pub fn export_table(&self, format: &Format, store: &Store, target: &TableTarget) -> Result<SectionInstance> {
        let section = format.require_section(self.section_id)?;
        let mut rows = store
            .values_of_type::<T>()
            .into_iter()
            .filter(|row| (self.member)(row, target))
            .collect::<Vec<_>>();
        rows.sort_by_key(|row| row.row());

        let mut instance = SectionInstance::new(Arc::clone(section));
        let Some(first) = rows.first() else {
            warn!(file = %target.file_name, "No rows to export, writing an empty table");
            return Ok(instance);
        };

        let headers = first.headers();
        for header in &headers {
            instance.add_header(header, false)?;
        }
        for row in &rows {
            if row.headers() != headers {
                return Err(IsaTabError::structure(
                    self.section_id,
                    format!(
                        "row {} of '{}' does not share the column layout of the file",
                        row.row() + 1,
                        target.file_name
                    ),
                ));
            }
            let record = Record::new(row.cells());
            if !record.is_blank() {
                instance.add_record(record);
            }
        }

        debug!(file = %target.file_name, rows = instance.record_count(), "Exported table");
        Ok(instance)
    }
}

impl TableRowExporter<Sample> {
    /// Study-sample files: one per study with a `Study File Name`
    #[must_use]
    pub fn study_sample() -> Self {
        Self::new(
            "study_sample",
            "study_table",
            |store| {
                store
                    .values_of_type::<Study>()
                    .into_iter()
                    .filter_map(|s| {
                        s.file_name.as_ref().map(|file| TableTarget {
                            study: s.accession.clone(),
                            file_name: file.trim().to_string(),
                        })
                    })
                    .collect()
            },
            |sample, target| sample.study == target.study,
        )
    }
}

impl TableRowExporter<AssayRecord> {
    /// Assay files: one per assay group
    #[must_use]
    pub fn assay() -> Self {
        Self::new(
            "assay",
            "assay_table",
            |store| {
                store
                    .values_of_type::<AssayGroup>()
                    .into_iter()
                    .map(|g| TableTarget {
                        study: g.study.clone(),
                        file_name: g.file_name.clone(),
                    })
                    .collect()
            },
            |record, target| record.study == target.study && record.assay_file == target.file_name,
        )
    }
}

impl<T: TableRow + Any> FormatExporter for TableRowExporter<T> {
    fn format_id(&self) -> &str {
        self.format_id
    }

    fn export(&self, format: &Arc<Format>, store: &Store) -> Result<Vec<FormatInstance>> {
        (self.targets)(store)
            .iter()
            .map(|target| {
                let mut instance = FormatInstance::new(Arc::clone(format)).with_file_name(&target.file_name);
                instance.add_section(self.export_table(format, store, target)?);
                Ok(instance)
            })
            .collect()
    }
}

/// Exports a whole submission into one format set
pub struct FormatSetExporter {
    format_set_id: &'static str,
    exporters: Vec<Box<dyn FormatExporter>>,
}

impl FormatSetExporter {
    /// Create a set exporter; formats are written in the given order
    #[must_use]
    pub fn new(format_set_id: &'static str, exporters: Vec<Box<dyn FormatExporter>>) -> Self {
        Self {
            format_set_id,
            exporters,
        }
    }

    /// Investigation, study-sample and assay files
    #[must_use]
    pub fn isatab() -> Self {
        Self::new(
            ISATAB_FORMAT_SET,
            vec![
                Box::new(InvestigationExporter::isatab()),
                Box::new(TableRowExporter::study_sample()),
                Box::new(TableRowExporter::assay()),
            ],
        )
    }

    /// One IDF and one SDRF per study
    #[must_use]
    pub fn magetab() -> Self {
        Self::new(
            MAGETAB_FORMAT_SET,
            vec![Box::new(IdfExporter::new()), Box::new(SdrfExporter::new())],
        )
    }

    /// Id of the produced format set
    #[must_use]
    pub fn format_set_id(&self) -> &str {
        self.format_set_id
    }

    /// Export every format
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` when the registry lacks the format
    /// set or one of its formats, and propagates exporter errors.
    pub fn export(&self, registry: &SchemaRegistry, store: &Store) -> Result<FormatSetInstance> {
        let set = registry.format_set(self.format_set_id)?;
        let mut instance = FormatSetInstance::new(Arc::clone(&set));
        for exporter in &self.exporters {
            let format = set.require_format(exporter.format_id())?;
            let files = exporter.export(format, store)?;
            info!(
                format_set = self.format_set_id,
                format = exporter.format_id(),
                files = files.len(),
                "Exported format"
            );
            for file in files {
                instance.add_format(file);
            }
        }
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isatab_core::model::{MaterialNode, Step};
    use pretty_assertions::assert_eq;

    fn node(header: &str, name: &str) -> Step {
        Step::Node(MaterialNode {
            header: header.to_string(),
            name: name.to_string(),
            attributes: Vec::new(),
        })
    }

    fn store() -> Store {
        let mut store = Store::new();
        let study = Study {
            accession: "S1".to_string(),
            file_name: Some("s_S1.txt".to_string()),
            ..Default::default()
        };
        store.put(study.key(), study);
        for (row, name) in [(1, "smp2"), (0, "smp1")] {
            let sample = Sample {
                study: "S1".to_string(),
                row,
                steps: vec![node("Source Name", "src"), node("Sample Name", name)],
            };
            store.put(sample.key(), sample);
        }
        store
    }

    #[test]
    fn test_samples_written_in_row_order() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let submission = FormatSetExporter::new(
            ISATAB_FORMAT_SET,
            vec![Box::new(TableRowExporter::study_sample())],
        )
        .export(&registry, &store())
        .unwrap();

        let file = submission.by_file_name("s_S1.txt").unwrap();
        let table = file.first_section("study_table").unwrap();
        assert_eq!(table.headers(), vec!["Source Name", "Sample Name"]);
        assert_eq!(table.column_values(1), vec!["smp1", "smp2"]);
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let mut store = store();
        let odd = Sample {
            study: "S1".to_string(),
            row: 2,
            steps: vec![node("Sample Name", "smp3")],
        };
        store.put(odd.key(), odd);

        let registry = SchemaRegistry::with_builtin().unwrap();
        let format = registry.format(ISATAB_FORMAT_SET, "study_sample").unwrap();
        let err = TableRowExporter::study_sample().export(&format, &store).unwrap_err();
        assert!(matches!(err, IsaTabError::StructureError { .. }));
    }

    #[test]
    fn test_investigation_file_name() {
        let mut store = Store::new();
        assert_eq!(InvestigationExporter::file_name(&store), "i_investigation.txt");
        let investigation = Investigation {
            identifier: "MTBLS1".to_string(),
            ..Default::default()
        };
        store.put(investigation.key(), investigation);
        assert_eq!(InvestigationExporter::file_name(&store), "i_MTBLS1.txt");
    }
}
