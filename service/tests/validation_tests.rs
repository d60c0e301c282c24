//! Validation of mapped submissions against ISA configurations

mod helpers;

use helpers::submission::{self, ASSAY_FILE};
use isatab_service::Pipeline;
use isatab_service::config::ToolkitConfig;
use isatab_service::validation::{Severity, ValidationReport};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn validate_with(dir: &Path, config: ToolkitConfig) -> ValidationReport {
    let pipeline = Pipeline::new(config).unwrap();
    let submission = pipeline.import(dir).unwrap();
    pipeline.validate(&submission).unwrap()
}

fn validate(dir: &Path) -> ValidationReport {
    validate_with(dir, submission::config(dir))
}

fn rewrite_assay(dir: &Path, assay: String) {
    fs::write(dir.join(ASSAY_FILE), assay).unwrap();
}

fn drop_column(tsv: &str, header: &str) -> String {
    let column = tsv
        .lines()
        .next()
        .and_then(|line| line.split('\t').position(|h| h == header))
        .unwrap();
    tsv.lines()
        .map(|line| {
            let cells = line
                .split('\t')
                .enumerate()
                .filter(|(i, _)| *i != column)
                .map(|(_, cell)| cell)
                .collect::<Vec<_>>();
            cells.join("\t") + "\n"
        })
        .collect()
}

fn messages(report: &ValidationReport, severity: Severity) -> Vec<String> {
    report
        .issues
        .iter()
        .filter(|i| i.severity == severity)
        .map(|i| i.message.clone())
        .collect()
}

#[test]
fn test_valid_submission() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());

    let report = validate(dir.path());
    assert!(report.is_valid(), "{:?}", messages(&report, Severity::Error));
    assert_eq!(report.investigation, submission::ACCESSION);
    assert_eq!(report.stats.tables_validated, 2);
    assert_eq!(report.stats.generic_fallbacks, 0);
}

#[test]
fn test_missing_required_column_falls_back_to_generic() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    rewrite_assay(dir.path(), drop_column(&submission::assay(), "NMR Assay Name"));

    let report = validate(dir.path());
    assert!(report.is_valid(), "{:?}", messages(&report, Severity::Error));
    assert_eq!(report.stats.generic_fallbacks, 1);
    assert!(
        messages(&report, Severity::Warning)
            .iter()
            .any(|m| m.contains("accepted under the generic configuration"))
    );
    assert!(
        messages(&report, Severity::Warning)
            .iter()
            .any(|m| m.contains("NMR Assay Name"))
    );
}

#[test]
fn test_missing_required_column_without_fallback() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    rewrite_assay(dir.path(), drop_column(&submission::assay(), "NMR Assay Name"));

    let mut config = submission::config(dir.path());
    config.validation.generic_fallback = false;
    let report = validate_with(dir.path(), config);

    assert!(!report.is_valid());
    assert_eq!(report.stats.generic_fallbacks, 0);
    assert!(
        messages(&report, Severity::Error)
            .iter()
            .any(|m| m.contains("NMR Assay Name"))
    );
}

#[test]
fn test_required_protocol_without_its_node_column() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    let assay = drop_column(&submission::assay(), "Extract Name");
    rewrite_assay(dir.path(), drop_column(&assay, "Protocol REF"));

    let mut config = submission::config(dir.path());
    config.validation.generic_fallback = false;
    let report = validate_with(dir.path(), config);

    assert!(!report.is_valid());
    let errors = messages(&report, Severity::Error);
    assert!(
        errors
            .iter()
            .any(|m| m == "no protocol of type 'extraction' before 'NMR Assay Name'"),
        "{errors:?}"
    );
}

#[test]
fn test_undeclared_protocol() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    rewrite_assay(
        dir.path(),
        submission::assay().replace("\tExtraction\t", "\tDialysis\t"),
    );

    let report = validate(dir.path());
    assert!(!report.is_valid());
    assert!(
        messages(&report, Severity::Error)
            .iter()
            .any(|m| m.contains("protocol 'Dialysis'") && m.contains("not declared"))
    );
}

#[test]
fn test_unknown_sample_reference() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    rewrite_assay(
        dir.path(),
        submission::assay().replace("urine2\t", "urine9\t"),
    );

    let report = validate(dir.path());
    assert!(!report.is_valid());
    let errors = messages(&report, Severity::Error);
    assert!(errors.iter().any(|m| m.contains("urine9")), "{errors:?}");
}

#[test]
fn test_undeclared_term_source_is_a_warning() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());
    rewrite_assay(dir.path(), submission::assay().replace("\tUO\t", "\tUCUM\t"));

    let report = validate(dir.path());
    assert!(report.is_valid());
    assert!(
        messages(&report, Severity::Warning)
            .iter()
            .any(|m| m.contains("'UCUM'"))
    );
}

const TAXON: &str = "http://purl.obolibrary.org/obo/NCBITaxon_";

fn branch_config(root: &Path, branch: &str) -> ToolkitConfig {
    let isa_config = root.join("isaconfig");
    fs::create_dir_all(&isa_config).unwrap();
    fs::write(
        isa_config.join("study_sample.yaml"),
        format!(
            "\
measurement: \"[sample]\"
technology: \"\"
table: study_sample
elements:
  - {{ field: Source Name, required: true }}
  - field: Characteristics[Organism]
    required: true
    data_type: ontology
    ontology:
      sources: [NCBITAXON]
      branches: [\"{TAXON}{branch}\"]
  - {{ protocol: sample collection, required: true }}
  - {{ field: Sample Name, required: true }}
"
        ),
    )
    .unwrap();
    fs::write(
        isa_config.join("generic.yaml"),
        "measurement: \"*\"\ntechnology: \"*\"\ntable: assay\nelements:\n  - { field: Sample Name, required: true }\n",
    )
    .unwrap();

    let index = root.join("ontology.yaml");
    fs::write(
        &index,
        format!(
            "\
terms:
  - {{ accession: '{TAXON}9606', label: Homo sapiens, parents: ['{TAXON}9605'] }}
  - {{ accession: '{TAXON}9605', label: Homo, parents: ['{TAXON}33208'] }}
  - {{ accession: '{TAXON}33208', label: Metazoa }}
  - {{ accession: '{TAXON}4751', label: Fungi }}
"
        ),
    )
    .unwrap();

    let mut config = submission::config(root);
    config.validation.config_dir = Some(isa_config);
    config.validation.ontology_index = Some(index);
    config
}

#[test]
fn test_ontology_branch_constraint() {
    let dir = TempDir::new().unwrap();
    submission::write_submission(dir.path());

    let report = validate_with(dir.path(), branch_config(dir.path(), "33208"));
    assert!(report.is_valid(), "{:?}", messages(&report, Severity::Error));

    let report = validate_with(dir.path(), branch_config(dir.path(), "4751"));
    assert!(!report.is_valid());
    assert!(
        messages(&report, Severity::Error)
            .iter()
            .any(|m| m.contains("Homo sapiens") && m.contains("is not under"))
    );
}
