//! Renderer tables for the sections of the investigation file

use super::record::{RecordOrientedExporter, SectionBlockTabExporter};
use super::renderers::RendererTable;
use super::SectionExporter;
use isatab_core::model::{
    AssayGroup, Contact, Factor, Investigation, OntologySource, Protocol, Publication, Study,
    StudyDesign,
};

/// Sections written once, before the study blocks
#[must_use]
pub fn header_exporters() -> Vec<Box<dyn SectionExporter>> {
    vec![
        Box::new(ontology_sources()),
        Box::new(investigation()),
        Box::new(investigation_publications()),
        Box::new(investigation_contacts()),
    ]
}

/// Sections written once per study
#[must_use]
pub fn study_block() -> SectionBlockTabExporter {
    SectionBlockTabExporter::new(vec![
        Box::new(study()),
        Box::new(study_design()),
        Box::new(study_publications()),
        Box::new(study_factors()),
        Box::new(study_assays()),
        Box::new(study_protocols()),
        Box::new(study_contacts()),
    ])
}

/// `ONTOLOGY SOURCE REFERENCE`
#[must_use]
pub fn ontology_sources() -> RecordOrientedExporter<OntologySource> {
    RecordOrientedExporter::new(
        "ontology_sources",
        RendererTable::<OntologySource>::new()
            .text("Term Source Name", |s| Some(s.name.clone()))
            .text("Term Source File", |s| s.file.clone())
            .text("Term Source Version", |s| s.version.clone())
            .text("Term Source Description", |s| s.description.clone())
            .comments(|s| &s.annotations),
        |_, _| true,
    )
}

/// `INVESTIGATION`
#[must_use]
pub fn investigation() -> RecordOrientedExporter<Investigation> {
    RecordOrientedExporter::new(
        "investigation",
        RendererTable::<Investigation>::new()
            .text("Investigation Identifier", |i| Some(i.identifier.clone()))
            .text("Investigation Title", |i| i.title.clone())
            .text("Investigation Description", |i| i.description.clone())
            .date("Investigation Submission Date", |i| i.submission_date)
            .date("Investigation Public Release Date", |i| i.release_date)
            .comments(|i| &i.annotations),
        |_, _| true,
    )
}

fn publications(
    section_id: &'static str,
    renderers: RendererTable<Publication>,
) -> RecordOrientedExporter<Publication> {
    RecordOrientedExporter::new(section_id, renderers, |p, scope| {
        p.study.as_deref() == scope.study.as_deref()
    })
}

/// `INVESTIGATION PUBLICATIONS`
#[must_use]
pub fn investigation_publications() -> RecordOrientedExporter<Publication> {
    publications(
        "investigation_publications",
        RendererTable::<Publication>::new()
            .text("Investigation PubMed ID", |p| p.pubmed_id.clone())
            .text("Investigation Publication DOI", |p| p.doi.clone())
            .text("Investigation Publication Author List", |p| p.author_list.clone())
            .text("Investigation Publication Title", |p| p.title.clone())
            .term(
                "Investigation Publication Status",
                "Investigation Publication Status Term Accession Number",
                "Investigation Publication Status Term Source REF",
                |p| p.status.as_ref(),
            )
            .comments(|p| &p.annotations),
    )
}

/// `STUDY PUBLICATIONS`
#[must_use]
pub fn study_publications() -> RecordOrientedExporter<Publication> {
    publications(
        "study_publications",
        RendererTable::<Publication>::new()
            .text("Study PubMed ID", |p| p.pubmed_id.clone())
            .text("Study Publication DOI", |p| p.doi.clone())
            .text("Study Publication Author List", |p| p.author_list.clone())
            .text("Study Publication Title", |p| p.title.clone())
            .term(
                "Study Publication Status",
                "Study Publication Status Term Accession Number",
                "Study Publication Status Term Source REF",
                |p| p.status.as_ref(),
            )
            .comments(|p| &p.annotations),
    )
}

fn contacts(section_id: &'static str, renderers: RendererTable<Contact>) -> RecordOrientedExporter<Contact> {
    RecordOrientedExporter::new(section_id, renderers, |c, scope| {
        c.study.as_deref() == scope.study.as_deref()
    })
}

/// `INVESTIGATION CONTACTS`
#[must_use]
pub fn investigation_contacts() -> RecordOrientedExporter<Contact> {
    contacts(
        "investigation_contacts",
        RendererTable::<Contact>::new()
            .text("Investigation Person Last Name", |c| c.last_name.clone())
            .text("Investigation Person First Name", |c| c.first_name.clone())
            .text("Investigation Person Mid Initials", |c| c.mid_initials.clone())
            .text("Investigation Person Email", |c| c.email.clone())
            .text("Investigation Person Phone", |c| c.phone.clone())
            .text("Investigation Person Fax", |c| c.fax.clone())
            .text("Investigation Person Address", |c| c.address.clone())
            .text("Investigation Person Affiliation", |c| c.affiliation.clone())
            .terms(
                "Investigation Person Roles",
                "Investigation Person Roles Term Accession Number",
                "Investigation Person Roles Term Source REF",
                |c| &c.roles,
            )
            .comments(|c| &c.annotations),
    )
}

/// `STUDY CONTACTS`
#[must_use]
pub fn study_contacts() -> RecordOrientedExporter<Contact> {
    contacts(
        "study_contacts",
        RendererTable::<Contact>::new()
            .text("Study Person Last Name", |c| c.last_name.clone())
            .text("Study Person First Name", |c| c.first_name.clone())
            .text("Study Person Mid Initials", |c| c.mid_initials.clone())
            .text("Study Person Email", |c| c.email.clone())
            .text("Study Person Phone", |c| c.phone.clone())
            .text("Study Person Fax", |c| c.fax.clone())
            .text("Study Person Address", |c| c.address.clone())
            .text("Study Person Affiliation", |c| c.affiliation.clone())
            .terms(
                "Study Person Roles",
                "Study Person Roles Term Accession Number",
                "Study Person Roles Term Source REF",
                |c| &c.roles,
            )
            .comments(|c| &c.annotations),
    )
}

/// `STUDY`
#[must_use]
pub fn study() -> RecordOrientedExporter<Study> {
    RecordOrientedExporter::new(
        "study",
        RendererTable::<Study>::new()
            .text("Study Identifier", |s| Some(s.accession.clone()))
            .text("Study Title", |s| s.title.clone())
            .text("Study Description", |s| s.description.clone())
            .date("Study Submission Date", |s| s.submission_date)
            .date("Study Public Release Date", |s| s.release_date)
            .text("Study File Name", |s| s.file_name.clone())
            .comments(|s| &s.annotations),
        |s, scope| scope.is_study(&s.accession),
    )
}

/// `STUDY DESIGN DESCRIPTORS`
#[must_use]
pub fn study_design() -> RecordOrientedExporter<StudyDesign> {
    RecordOrientedExporter::new(
        "study_design",
        RendererTable::<StudyDesign>::new()
            .term(
                "Study Design Type",
                "Study Design Type Term Accession Number",
                "Study Design Type Term Source REF",
                |d| Some(&d.design_type),
            )
            .comments(|d| &d.annotations),
        |d, scope| scope.is_study(&d.study),
    )
}

/// `STUDY FACTORS`
#[must_use]
pub fn study_factors() -> RecordOrientedExporter<Factor> {
    RecordOrientedExporter::new(
        "study_factors",
        RendererTable::<Factor>::new()
            .text("Study Factor Name", |f| Some(f.name.clone()))
            .term(
                "Study Factor Type",
                "Study Factor Type Term Accession Number",
                "Study Factor Type Term Source REF",
                |f| f.factor_type.as_ref(),
            )
            .comments(|f| &f.annotations),
        |f, scope| scope.is_study(&f.study),
    )
}

/// `STUDY ASSAYS`
#[must_use]
pub fn study_assays() -> RecordOrientedExporter<AssayGroup> {
    RecordOrientedExporter::new(
        "study_assays",
        RendererTable::<AssayGroup>::new()
            .text("Study Assay File Name", |a| Some(a.file_name.clone()))
            .term(
                "Study Assay Measurement Type",
                "Study Assay Measurement Type Term Accession Number",
                "Study Assay Measurement Type Term Source REF",
                |a| a.measurement.as_ref(),
            )
            .term(
                "Study Assay Technology Type",
                "Study Assay Technology Type Term Accession Number",
                "Study Assay Technology Type Term Source REF",
                |a| a.technology.as_ref(),
            )
            .text("Study Assay Technology Platform", |a| a.platform.clone())
            .comments(|a| &a.annotations),
        |a, scope| scope.is_study(&a.study),
    )
}

/// `STUDY PROTOCOLS`
#[must_use]
pub fn study_protocols() -> RecordOrientedExporter<Protocol> {
    RecordOrientedExporter::new(
        "study_protocols",
        RendererTable::<Protocol>::new()
            .text("Study Protocol Name", |p| Some(p.name.clone()))
            .term(
                "Study Protocol Type",
                "Study Protocol Type Term Accession Number",
                "Study Protocol Type Term Source REF",
                |p| p.protocol_type.as_ref(),
            )
            .text("Study Protocol Description", |p| p.description.clone())
            .text("Study Protocol URI", |p| p.uri.clone())
            .text("Study Protocol Version", |p| p.version.clone())
            .terms(
                "Study Protocol Parameters Name",
                "Study Protocol Parameters Name Term Accession Number",
                "Study Protocol Parameters Name Term Source REF",
                |p| &p.parameters,
            )
            .texts("Study Protocol Components Name", |p| &p.components)
            .terms(
                "Study Protocol Components Type",
                "Study Protocol Components Type Term Accession Number",
                "Study Protocol Components Type Term Source REF",
                |p| &p.component_types,
            )
            .comments(|p| &p.annotations),
        |p, scope| scope.is_study(&p.study),
    )
}
