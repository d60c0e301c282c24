//! Helper tables for the sections of the investigation file

use super::SectionMapper;
use super::class::{ClassTabMapper, Factory};
use super::helpers::HelperTable;
use isatab_core::model::{
    AssayGroup, Contact, Factor, Investigation, OntologySource, Protocol, Publication, Study,
    StudyDesign,
};

/// Every section mapper of the investigation format, by section id
#[must_use]
pub fn section_mappers() -> Vec<Box<dyn SectionMapper>> {
    vec![
        Box::new(ontology_sources()),
        Box::new(investigation()),
        Box::new(investigation_publications()),
        Box::new(investigation_contacts()),
        Box::new(study()),
        Box::new(study_design()),
        Box::new(study_publications()),
        Box::new(study_factors()),
        Box::new(study_assays()),
        Box::new(study_protocols()),
        Box::new(study_contacts()),
    ]
}

/// `ONTOLOGY SOURCE REFERENCE`
#[must_use]
pub fn ontology_sources() -> ClassTabMapper<OntologySource> {
    ClassTabMapper::new(
        "ontology_sources",
        HelperTable::<OntologySource>::new()
            .text("Term Source Name", |s, v| s.name = v)
            .text("Term Source File", |s, v| s.file = Some(v))
            .text("Term Source Version", |s, v| s.version = Some(v))
            .text("Term Source Description", |s, v| s.description = Some(v))
            .comments(|s, c| s.annotations.push(c)),
        |_| Ok(OntologySource::default()),
        OntologySource::key,
    )
}

/// `INVESTIGATION`
#[must_use]
pub fn investigation() -> ClassTabMapper<Investigation> {
    ClassTabMapper::new(
        "investigation",
        HelperTable::<Investigation>::new()
            .text("Investigation Identifier", |i, v| i.identifier = v)
            .text("Investigation Title", |i, v| i.title = Some(v))
            .text("Investigation Description", |i, v| i.description = Some(v))
            .date("Investigation Submission Date", |i, v| i.submission_date = Some(v))
            .date("Investigation Public Release Date", |i, v| i.release_date = Some(v))
            .comments(|i, c| i.annotations.push(c)),
        |_| Ok(Investigation::default()),
        Investigation::key,
    )
    .on_stored(|investigation, ctx| ctx.investigation = investigation.key())
}

fn publications(
    section_id: &'static str,
    in_study: bool,
    helpers: HelperTable<Publication>,
) -> ClassTabMapper<Publication> {
    let factory: Factory<Publication> = if in_study {
        |ctx| {
            Ok(Publication {
                study: Some(ctx.require_study()?.to_string()),
                ..Default::default()
            })
        }
    } else {
        |_| Ok(Publication::default())
    };
    ClassTabMapper::new(section_id, helpers, factory, Publication::key)
}

/// `INVESTIGATION PUBLICATIONS`
#[must_use]
pub fn investigation_publications() -> ClassTabMapper<Publication> {
    publications(
        "investigation_publications",
        false,
        HelperTable::<Publication>::new()
            .text("Investigation PubMed ID", |p, v| p.pubmed_id = Some(v))
            .text("Investigation Publication DOI", |p, v| p.doi = Some(v))
            .text("Investigation Publication Author List", |p, v| p.author_list = Some(v))
            .text("Investigation Publication Title", |p, v| p.title = Some(v))
            .term(
                "Investigation Publication Status",
                "Investigation Publication Status Term Accession Number",
                "Investigation Publication Status Term Source REF",
                |p, v| p.status = Some(v),
            )
            .comments(|p, c| p.annotations.push(c)),
    )
}

/// `STUDY PUBLICATIONS`
#[must_use]
pub fn study_publications() -> ClassTabMapper<Publication> {
    publications(
        "study_publications",
        true,
        HelperTable::<Publication>::new()
            .text("Study PubMed ID", |p, v| p.pubmed_id = Some(v))
            .text("Study Publication DOI", |p, v| p.doi = Some(v))
            .text("Study Publication Author List", |p, v| p.author_list = Some(v))
            .text("Study Publication Title", |p, v| p.title = Some(v))
            .term(
                "Study Publication Status",
                "Study Publication Status Term Accession Number",
                "Study Publication Status Term Source REF",
                |p, v| p.status = Some(v),
            )
            .comments(|p, c| p.annotations.push(c)),
    )
}

/// `INVESTIGATION CONTACTS`
#[must_use]
pub fn investigation_contacts() -> ClassTabMapper<Contact> {
    ClassTabMapper::new(
        "investigation_contacts",
        HelperTable::<Contact>::new()
            .text("Investigation Person Last Name", |c, v| c.last_name = Some(v))
            .text("Investigation Person First Name", |c, v| c.first_name = Some(v))
            .text("Investigation Person Mid Initials", |c, v| c.mid_initials = Some(v))
            .text("Investigation Person Email", |c, v| c.email = Some(v))
            .text("Investigation Person Phone", |c, v| c.phone = Some(v))
            .text("Investigation Person Fax", |c, v| c.fax = Some(v))
            .text("Investigation Person Address", |c, v| c.address = Some(v))
            .text("Investigation Person Affiliation", |c, v| c.affiliation = Some(v))
            .terms(
                "Investigation Person Roles",
                "Investigation Person Roles Term Accession Number",
                "Investigation Person Roles Term Source REF",
                |c, v| c.roles = v,
            )
            .comments(|c, a| c.annotations.push(a)),
        |_| Ok(Contact::default()),
        Contact::key,
    )
}

/// `STUDY CONTACTS`
#[must_use]
pub fn study_contacts() -> ClassTabMapper<Contact> {
    ClassTabMapper::new(
        "study_contacts",
        HelperTable::<Contact>::new()
            .text("Study Person Last Name", |c, v| c.last_name = Some(v))
            .text("Study Person First Name", |c, v| c.first_name = Some(v))
            .text("Study Person Mid Initials", |c, v| c.mid_initials = Some(v))
            .text("Study Person Email", |c, v| c.email = Some(v))
            .text("Study Person Phone", |c, v| c.phone = Some(v))
            .text("Study Person Fax", |c, v| c.fax = Some(v))
            .text("Study Person Address", |c, v| c.address = Some(v))
            .text("Study Person Affiliation", |c, v| c.affiliation = Some(v))
            .terms(
                "Study Person Roles",
                "Study Person Roles Term Accession Number",
                "Study Person Roles Term Source REF",
                |c, v| c.roles = v,
            )
            .comments(|c, a| c.annotations.push(a)),
        |ctx| {
            Ok(Contact {
                study: Some(ctx.require_study()?.to_string()),
                ..Default::default()
            })
        },
        Contact::key,
    )
}

/// `STUDY`: opens the study context for the rest of the block
#[must_use]
pub fn study() -> ClassTabMapper<Study> {
    ClassTabMapper::new(
        "study",
        HelperTable::<Study>::new()
            .text("Study Identifier", |s, v| s.accession = v)
            .text("Study Title", |s, v| s.title = Some(v))
            .text("Study Description", |s, v| s.description = Some(v))
            .date("Study Submission Date", |s, v| s.submission_date = Some(v))
            .date("Study Public Release Date", |s, v| s.release_date = Some(v))
            .text("Study File Name", |s, v| s.file_name = Some(v))
            .comments(|s, c| s.annotations.push(c)),
        |ctx| {
            Ok(Study {
                investigation: ctx.investigation.clone(),
                ..Default::default()
            })
        },
        Study::key,
    )
    .on_stored(|study, ctx| ctx.current_study = study.key())
}

/// `STUDY DESIGN DESCRIPTORS`
#[must_use]
pub fn study_design() -> ClassTabMapper<StudyDesign> {
    ClassTabMapper::new(
        "study_design",
        HelperTable::<StudyDesign>::new()
            .term(
                "Study Design Type",
                "Study Design Type Term Accession Number",
                "Study Design Type Term Source REF",
                |d, v| d.design_type = v,
            )
            .comments(|d, c| d.annotations.push(c)),
        |ctx| {
            Ok(StudyDesign {
                study: ctx.require_study()?.to_string(),
                ..Default::default()
            })
        },
        StudyDesign::key,
    )
}

/// `STUDY FACTORS`
#[must_use]
pub fn study_factors() -> ClassTabMapper<Factor> {
    ClassTabMapper::new(
        "study_factors",
        HelperTable::<Factor>::new()
            .text("Study Factor Name", |f, v| f.name = v)
            .term(
                "Study Factor Type",
                "Study Factor Type Term Accession Number",
                "Study Factor Type Term Source REF",
                |f, v| f.factor_type = Some(v),
            )
            .comments(|f, c| f.annotations.push(c)),
        |ctx| {
            Ok(Factor {
                study: ctx.require_study()?.to_string(),
                ..Default::default()
            })
        },
        Factor::key,
    )
}

/// `STUDY ASSAYS`
#[must_use]
pub fn study_assays() -> ClassTabMapper<AssayGroup> {
    ClassTabMapper::new(
        "study_assays",
        HelperTable::<AssayGroup>::new()
            .text("Study Assay File Name", |a, v| a.file_name = v)
            .term(
                "Study Assay Measurement Type",
                "Study Assay Measurement Type Term Accession Number",
                "Study Assay Measurement Type Term Source REF",
                |a, v| a.measurement = Some(v),
            )
            .term(
                "Study Assay Technology Type",
                "Study Assay Technology Type Term Accession Number",
                "Study Assay Technology Type Term Source REF",
                |a, v| a.technology = Some(v),
            )
            .text("Study Assay Technology Platform", |a, v| a.platform = Some(v))
            .comments(|a, c| a.annotations.push(c)),
        |ctx| {
            Ok(AssayGroup {
                study: ctx.require_study()?.to_string(),
                ..Default::default()
            })
        },
        AssayGroup::key,
    )
}

/// `STUDY PROTOCOLS`
#[must_use]
pub fn study_protocols() -> ClassTabMapper<Protocol> {
    ClassTabMapper::new(
        "study_protocols",
        HelperTable::<Protocol>::new()
            .text("Study Protocol Name", |p, v| p.name = v)
            .term(
                "Study Protocol Type",
                "Study Protocol Type Term Accession Number",
                "Study Protocol Type Term Source REF",
                |p, v| p.protocol_type = Some(v),
            )
            .text("Study Protocol Description", |p, v| p.description = Some(v))
            .text("Study Protocol URI", |p, v| p.uri = Some(v))
            .text("Study Protocol Version", |p, v| p.version = Some(v))
            .terms(
                "Study Protocol Parameters Name",
                "Study Protocol Parameters Name Term Accession Number",
                "Study Protocol Parameters Name Term Source REF",
                |p, v| p.parameters = v,
            )
            .texts("Study Protocol Components Name", |p, v| p.components = v)
            .terms(
                "Study Protocol Components Type",
                "Study Protocol Components Type Term Accession Number",
                "Study Protocol Components Type Term Source REF",
                |p, v| p.component_types = v,
            )
            .comments(|p, c| p.annotations.push(c)),
        |ctx| {
            Ok(Protocol {
                study: ctx.require_study()?.to_string(),
                ..Default::default()
            })
        },
        Protocol::key,
    )
}
