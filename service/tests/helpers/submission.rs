//! A small NMR metabolomics submission written to disk

#![allow(dead_code)]

use isatab_service::config::ToolkitConfig;
use std::fs;
use std::path::{Path, PathBuf};

pub const ACCESSION: &str = "MTBLS1";
pub const INVESTIGATION_FILE: &str = "i_MTBLS1.txt";
pub const STUDY_FILE: &str = "s_MTBLS1.txt";
pub const ASSAY_FILE: &str = "a_MTBLS1_nmr.txt";

/// Data files referenced by the assay table
pub const DATA_FILES: [&str; 3] = ["fid/run1.zip", "fid/run2.zip", "m_MTBLS1.tsv"];

fn tsv(lines: &[&[&str]]) -> String {
    lines.iter().map(|cells| cells.join("\t") + "\n").collect()
}

pub fn investigation() -> String {
    tsv(&[
        &["ONTOLOGY SOURCE REFERENCE"],
        &["Term Source Name", "NCBITAXON", "UO", "OBI"],
        &["Term Source File", "http://purl.obolibrary.org/obo/ncbitaxon.owl", "http://purl.obolibrary.org/obo/uo.owl", "http://purl.obolibrary.org/obo/obi.owl"],
        &["Term Source Version", "2024-01-01", "2023-05-25", "2023-09-20"],
        &["Term Source Description", "NCBI Taxonomy", "Units of measurement ontology", "Ontology for Biomedical Investigations"],
        &["INVESTIGATION"],
        &["Investigation Identifier", ACCESSION],
        &["Investigation Title", "Urinary metabolites of type 2 diabetes"],
        &["Investigation Description", "NMR profiling of urine"],
        &["Investigation Submission Date", "2024-01-15"],
        &["Investigation Public Release Date", "2024-06-01"],
        &["STUDY"],
        &["Study Identifier", ACCESSION],
        &["Study Title", "Urinary metabolites of type 2 diabetes"],
        &["Study Description", "NMR profiling of urine"],
        &["Study Submission Date", "2024-01-15"],
        &["Study Public Release Date", "2024-06-01"],
        &["Study File Name", STUDY_FILE],
        &["Comment[Study Grant Number]", "G-42"],
        &["STUDY DESIGN DESCRIPTORS"],
        &["Study Design Type", "metabolomics"],
        &["Study Design Type Term Accession Number", "http://purl.obolibrary.org/obo/OBI_0000366"],
        &["Study Design Type Term Source REF", "OBI"],
        &["STUDY PUBLICATIONS"],
        &["Study PubMed ID", "12345678"],
        &["Study Publication DOI", "10.1000/mtbls1"],
        &["Study Publication Author List", "Doe J, Roe R"],
        &["Study Publication Title", "Urine NMR in type 2 diabetes"],
        &["STUDY ASSAYS"],
        &["Study Assay File Name", ASSAY_FILE],
        &["Study Assay Measurement Type", "metabolite profiling"],
        &["Study Assay Measurement Type Term Accession Number", "http://purl.obolibrary.org/obo/OBI_0000366"],
        &["Study Assay Measurement Type Term Source REF", "OBI"],
        &["Study Assay Technology Type", "NMR spectroscopy"],
        &["Study Assay Technology Type Term Accession Number", "http://purl.obolibrary.org/obo/OBI_0000623"],
        &["Study Assay Technology Type Term Source REF", "OBI"],
        &["Study Assay Technology Platform", "Bruker Avance III"],
        &["STUDY PROTOCOLS"],
        &["Study Protocol Name", "Sample collection", "Extraction", "NMR spectroscopy", "Metabolite identification"],
        &["Study Protocol Type", "sample collection", "extraction", "nmr spectroscopy", "metabolite identification"],
        &["Study Protocol Description", "Mid-stream urine", "Buffered", "1D NOESY", "Chenomx"],
        &["Study Protocol Parameters Name", "", "", "Magnetic field strength", ""],
        &["STUDY CONTACTS"],
        &["Study Person Last Name", "Doe"],
        &["Study Person First Name", "Jane"],
        &["Study Person Email", "jane.doe@example.org"],
        &["Study Person Affiliation", "Example Institute"],
        &["Study Person Roles", "submitter"],
    ])
}

pub fn study_sample() -> String {
    tsv(&[
        &["Source Name", "Characteristics[Organism]", "Term Source REF", "Term Accession Number", "Protocol REF", "Sample Name"],
        &["donor1", "Homo sapiens", "NCBITAXON", "http://purl.obolibrary.org/obo/NCBITaxon_9606", "Sample collection", "urine1"],
        &["donor2", "Homo sapiens", "NCBITAXON", "http://purl.obolibrary.org/obo/NCBITaxon_9606", "Sample collection", "urine2"],
    ])
}

pub fn assay() -> String {
    tsv(&[
        &[
            "Sample Name",
            "Protocol REF",
            "Extract Name",
            "Protocol REF",
            "Parameter Value[Magnetic field strength]",
            "Unit",
            "Term Source REF",
            "Term Accession Number",
            "NMR Assay Name",
            "Free Induction Decay Data File",
            "Protocol REF",
            "Metabolite Assignment File",
        ],
        &[
            "urine1", "Extraction", "extract1", "NMR spectroscopy", "14.1", "tesla", "UO",
            "http://purl.obolibrary.org/obo/UO_0000228", "run1", "fid/run1.zip", "Metabolite identification", "m_MTBLS1.tsv",
        ],
        &[
            "urine2", "Extraction", "extract2", "NMR spectroscopy", "14.1", "tesla", "UO",
            "http://purl.obolibrary.org/obo/UO_0000228", "run2", "fid/run2.zip", "Metabolite identification", "m_MTBLS1.tsv",
        ],
    ])
}

/// Write the submission and its data files into a directory
pub fn write_submission(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(INVESTIGATION_FILE), investigation()).unwrap();
    fs::write(dir.join(STUDY_FILE), study_sample()).unwrap();
    fs::write(dir.join(ASSAY_FILE), assay()).unwrap();
    for file in DATA_FILES {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("content of {file}")).unwrap();
    }
}

/// Configuration dispatching data files and writing exports below `root`
pub fn config(root: &Path) -> ToolkitConfig {
    let mut config = ToolkitConfig::default();
    config.repository.raw_data_dir = root.join("raw");
    config.repository.processed_data_dir = root.join("processed");
    config.repository.generic_data_dir = root.join("generic");
    config.repository.study_dir_template = "study_${accession}".to_string();
    config.export.output_dir = root.join("export");
    config
}

/// Repository location of a raw file of the fixture
pub fn raw_path(root: &Path, file: &str) -> PathBuf {
    root.join("raw")
        .join(format!("study_{ACCESSION}"))
        .join("metabolite_profiling")
        .join("nmr_spectroscopy")
        .join(file)
}
