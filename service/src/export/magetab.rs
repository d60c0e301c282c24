//! MAGE-TAB conversion: one IDF and one SDRF per study
//!
//! The IDF is rendered from the investigation-level objects of the study.
//! The SDRF joins each assay row to the study-sample row with the same
//! `Sample Name`; ISA-Tab headers without a MAGE-TAB counterpart are kept as
//! `Comment[...]` columns.

use super::record::{RecordOrientedExporter, SectionBlockTabExporter};
use super::renderers::RendererTable;
use super::{FormatExporter, study_accessions};
use isatab_core::model::{
    AssayGroup, AssayRecord, Contact, Factor, OntologySource, Protocol, Publication, Sample, Step,
    Study, StudyDesign, TableRow,
};
use isatab_core::schema::{Format, split_header};
use isatab_core::{FormatInstance, Record, Result, SectionInstance, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// MAGE-TAB version written to the IDF
pub const MAGETAB_VERSION: &str = "1.1";

/// `<accession>.idf.txt`
#[must_use]
pub fn idf_file_name(accession: &str) -> String {
    format!("{accession}.idf.txt")
}

/// `<accession>.sdrf.txt`
#[must_use]
pub fn sdrf_file_name(accession: &str) -> String {
    format!("{accession}.sdrf.txt")
}

/// Writes one IDF per study
pub struct IdfExporter {
    block: SectionBlockTabExporter,
}

impl Default for IdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IdfExporter {
    /// Create the IDF exporter
    #[must_use]
    pub fn new() -> Self {
        Self {
            block: SectionBlockTabExporter::new(vec![
                Box::new(idf_header()),
                Box::new(idf_design()),
                Box::new(idf_factors()),
                Box::new(idf_contacts()),
                Box::new(idf_publications()),
                Box::new(idf_protocols()),
                Box::new(idf_sources()),
            ]),
        }
    }
}

impl FormatExporter for IdfExporter {
    fn format_id(&self) -> &str {
        "idf"
    }

    fn export(&self, format: &Arc<Format>, store: &Store) -> Result<Vec<FormatInstance>> {
        study_accessions(store)
            .iter()
            .map(|accession| {
                let mut instance =
                    FormatInstance::new(Arc::clone(format)).with_file_name(idf_file_name(accession));
                for section in self.block.export_study(format, store, accession)? {
                    instance.add_section(section);
                }
                Ok(instance)
            })
            .collect()
    }
}

fn idf_header() -> RecordOrientedExporter<Study> {
    RecordOrientedExporter::new(
        "idf_header",
        RendererTable::<Study>::new()
            .text("MAGE-TAB Version", |_| Some(MAGETAB_VERSION.to_string()))
            .text("Investigation Title", |s| s.title.clone())
            .text("Experiment Description", |s| s.description.clone())
            .date("Date of Experiment", |s| s.submission_date)
            .date("Public Release Date", |s| s.release_date)
            .text("SDRF File", |s| Some(sdrf_file_name(&s.accession)))
            .comments(|s| &s.annotations),
        |s, scope| scope.is_study(&s.accession),
    )
}

fn idf_design() -> RecordOrientedExporter<StudyDesign> {
    RecordOrientedExporter::new(
        "idf_design",
        RendererTable::<StudyDesign>::new().term(
            "Experimental Design",
            "Experimental Design Term Accession Number",
            "Experimental Design Term Source REF",
            |d| Some(&d.design_type),
        ),
        |d, scope| scope.is_study(&d.study),
    )
}

fn idf_factors() -> RecordOrientedExporter<Factor> {
    RecordOrientedExporter::new(
        "idf_factors",
        RendererTable::<Factor>::new()
            .text("Experimental Factor Name", |f| Some(f.name.clone()))
            .term(
                "Experimental Factor Type",
                "Experimental Factor Type Term Accession Number",
                "Experimental Factor Type Term Source REF",
                |f| f.factor_type.as_ref(),
            ),
        |f, scope| scope.is_study(&f.study),
    )
}

fn idf_contacts() -> RecordOrientedExporter<Contact> {
    RecordOrientedExporter::new(
        "idf_contacts",
        RendererTable::<Contact>::new()
            .text("Person Last Name", |c| c.last_name.clone())
            .text("Person First Name", |c| c.first_name.clone())
            .text("Person Mid Initials", |c| c.mid_initials.clone())
            .text("Person Email", |c| c.email.clone())
            .text("Person Phone", |c| c.phone.clone())
            .text("Person Fax", |c| c.fax.clone())
            .text("Person Address", |c| c.address.clone())
            .text("Person Affiliation", |c| c.affiliation.clone())
            .terms(
                "Person Roles",
                "Person Roles Term Accession Number",
                "Person Roles Term Source REF",
                |c| &c.roles,
            ),
        |c, scope| c.study.as_deref() == scope.study.as_deref(),
    )
}

fn idf_publications() -> RecordOrientedExporter<Publication> {
    RecordOrientedExporter::new(
        "idf_publications",
        RendererTable::<Publication>::new()
            .text("PubMed ID", |p| p.pubmed_id.clone())
            .text("Publication DOI", |p| p.doi.clone())
            .text("Publication Author List", |p| p.author_list.clone())
            .text("Publication Title", |p| p.title.clone())
            .term(
                "Publication Status",
                "Publication Status Term Accession Number",
                "Publication Status Term Source REF",
                |p| p.status.as_ref(),
            ),
        |p, scope| p.study.as_deref() == scope.study.as_deref(),
    )
}

fn idf_protocols() -> RecordOrientedExporter<Protocol> {
    RecordOrientedExporter::new(
        "idf_protocols",
        RendererTable::<Protocol>::new()
            .text("Protocol Name", |p| Some(p.name.clone()))
            .term(
                "Protocol Type",
                "Protocol Type Term Accession Number",
                "Protocol Type Term Source REF",
                |p| p.protocol_type.as_ref(),
            )
            .text("Protocol Description", |p| p.description.clone())
            .text("Protocol Parameters", |p| {
                let names = p.parameters.iter().map(|t| t.label.trim()).collect::<Vec<_>>();
                (!names.is_empty()).then(|| names.join(";"))
            }),
        |p, scope| scope.is_study(&p.study),
    )
}

fn idf_sources() -> RecordOrientedExporter<OntologySource> {
    RecordOrientedExporter::new(
        "idf_sources",
        RendererTable::<OntologySource>::new()
            .text("Term Source Name", |s| Some(s.name.clone()))
            .text("Term Source File", |s| s.file.clone())
            .text("Term Source Version", |s| s.version.clone()),
        |_, _| true,
    )
}

/// MAGE-TAB name of an ISA-Tab table header
#[must_use]
pub fn sdrf_header(header: &str) -> String {
    let Ok((id, field_type, subtype)) = split_header(header) else {
        return header.to_string();
    };
    let id = match id.as_str() {
        "Hybridization Assay Name" => "Hybridization Name",
        "MS Assay Name" | "NMR Assay Name" => "Assay Name",
        "Raw Data File" | "Raw Spectral Data File" | "Free Induction Decay Data File" => "Array Data File",
        "Derived Data File" | "Derived Spectral Data File" => "Derived Array Data File",
        "Data Transformation Name" => "Normalization Name",
        other => other,
    };

    let mut renamed = id.to_string();
    if let Some(t) = field_type {
        renamed.push_str(&format!("[{t}]"));
    }
    if let Some(s) = subtype {
        renamed.push_str(&format!("({s})"));
    }
    renamed
}

/// Steps of an assay row without its leading `Sample Name` node
fn assay_steps(record: &AssayRecord) -> Vec<&Step> {
    let mut skipped = false;
    record
        .steps
        .iter()
        .filter(|step| {
            let is_sample = matches!(step, Step::Node(node) if node.header.eq_ignore_ascii_case("Sample Name"));
            if is_sample && !skipped {
                skipped = true;
                return false;
            }
            true
        })
        .collect()
}

fn flatten<'a>(steps: impl IntoIterator<Item = &'a Step>) -> (Vec<String>, Vec<String>) {
    let mut headers = Vec::new();
    let mut cells = Vec::new();
    for step in steps {
        headers.extend(step.headers());
        cells.extend(step.cells());
    }
    (headers, cells)
}

/// Writes one SDRF per study
#[derive(Debug, Default)]
pub struct SdrfExporter;

impl SdrfExporter {
    /// Create the SDRF exporter
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Joined (headers, rows) of one study. Assay files whose layout differs
    /// from the first one are skipped.
    #[must_use]
    pub fn rows(store: &Store, accession: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let mut samples = store
            .values_of_type::<Sample>()
            .into_iter()
            .filter(|s| s.study == accession)
            .collect::<Vec<_>>();
        samples.sort_by_key(|s| s.row);
        let by_name = samples
            .iter()
            .filter_map(|s| s.sample_name().map(|name| (name, *s)))
            .collect::<HashMap<_, _>>();
        let sample_headers = samples.first().map(|s| s.headers()).unwrap_or_default();
        let blank_sample = vec![String::new(); sample_headers.len()];

        let groups = store
            .values_of_type::<AssayGroup>()
            .into_iter()
            .filter(|g| g.study == accession)
            .collect::<Vec<_>>();

        let mut layout: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for group in groups {
            let mut records = store
                .values_of_type::<AssayRecord>()
                .into_iter()
                .filter(|r| r.study == accession && r.assay_file == group.file_name)
                .collect::<Vec<_>>();
            records.sort_by_key(|r| r.row);

            let mut joined = Vec::new();
            let mut consistent = true;
            for record in records {
                let (assay_headers, assay_cells) = flatten(assay_steps(record));
                let sample = record.sample_name().and_then(|name| by_name.get(name));
                if sample.is_none() {
                    warn!(
                        study = accession,
                        file = %group.file_name,
                        row = record.row + 1,
                        "Assay row names no known sample"
                    );
                }
                let mut cells = sample.map_or_else(|| blank_sample.clone(), |s| s.cells());
                let mut headers = sample_headers.clone();
                headers.extend(assay_headers);
                cells.extend(assay_cells);

                if *layout.get_or_insert_with(|| headers.clone()) != headers {
                    consistent = false;
                    break;
                }
                joined.push(cells);
            }

            if consistent {
                rows.extend(joined);
            } else {
                warn!(
                    study = accession,
                    file = %group.file_name,
                    "Assay file layout differs from the first assay, not converted to SDRF"
                );
            }
        }

        match layout {
            Some(headers) => (headers, rows),
            None => (
                sample_headers,
                samples.iter().map(|s| s.cells()).collect(),
            ),
        }
    }

    fn add_header(instance: &mut SectionInstance, header: &str) -> Result<()> {
        let renamed = sdrf_header(header);
        if instance.add_header(&renamed, false).is_ok() {
            return Ok(());
        }
        debug!(header, "No MAGE-TAB counterpart, kept as comment");
        instance.add_header(&format!("Comment[{header}]"), false)?;
        Ok(())
    }
}

impl FormatExporter for SdrfExporter {
    fn format_id(&self) -> &str {
        "sdrf"
    }

    fn export(&self, format: &Arc<Format>, store: &Store) -> Result<Vec<FormatInstance>> {
        let section = format.require_section("sdrf_table")?;
        let mut files = Vec::new();
        for accession in study_accessions(store) {
            let (headers, rows) = Self::rows(store, &accession);
            let mut table = SectionInstance::new(Arc::clone(section));
            for header in &headers {
                Self::add_header(&mut table, header)?;
            }
            for cells in rows {
                table.add_record(Record::new(cells));
            }

            let mut instance = FormatInstance::new(Arc::clone(format)).with_file_name(sdrf_file_name(&accession));
            instance.add_section(table);
            files.push(instance);
        }
        Ok(files)
    }
}
