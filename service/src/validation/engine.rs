//! Validation of a mapped submission against an ISA configuration set

use super::configuration::{IsaConfigurationSet, TableConfiguration};
use super::context::{StudyFacts, TableContext};
use super::ontology::OntologyLookup;
use super::report::{Severity, ValidationIssue, ValidationOutcome, ValidationReport};
use super::validators::{TableValidator, default_validators};
use isatab_core::model::{AssayGroup, Investigation, Study};
use isatab_core::{FormatSetInstance, Result, SectionInstance, Store};
use tracing::{debug, info, warn};

const STUDY_TABLE: &str = "study_table";
const ASSAY_TABLE: &str = "assay_table";
const ENGINE: &str = "engine";

/// Runs the table validators over every study and assay file
pub struct ValidationEngine {
    configurations: IsaConfigurationSet,
    lookup: Option<Box<dyn OntologyLookup>>,
    validators: Vec<Box<dyn TableValidator>>,
    generic_fallback: bool,
}

impl ValidationEngine {
    /// Create an engine with the default validators
    #[must_use]
    pub fn new(configurations: IsaConfigurationSet) -> Self {
        Self {
            configurations,
            lookup: None,
            validators: default_validators(),
            generic_fallback: true,
        }
    }

    /// Use an ontology hierarchy for branch checks
    #[must_use]
    pub fn with_lookup(mut self, lookup: Box<dyn OntologyLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Enable or disable the generic retry of failing assay files
    #[must_use]
    pub fn with_generic_fallback(mut self, enabled: bool) -> Self {
        self.generic_fallback = enabled;
        self
    }

    /// Configuration set in use
    #[must_use]
    pub fn configurations(&self) -> &IsaConfigurationSet {
        &self.configurations
    }

    /// Validate every study of a mapped submission
    ///
    /// Findings never abort the run: they are collected in the report, and
    /// a fatal report is one whose outcome is [`ValidationOutcome::Error`].
    ///
    /// # Errors
    ///
    /// Reserved for internal failures; the current validators do not fail.
    pub fn validate(&self, store: &Store, submission: &FormatSetInstance) -> Result<ValidationReport> {
        let investigation = store
            .values_of_type::<Investigation>()
            .first()
            .map(|i| i.identifier.clone())
            .unwrap_or_default();
        let mut report = ValidationReport::new(investigation);

        let mut studies = store.values_of_type::<Study>();
        studies.sort_by(|a, b| a.accession.cmp(&b.accession));
        if studies.is_empty() {
            report.add_issue(ValidationIssue::error(
                "the investigation declares no study",
                "investigation",
                ENGINE,
            ));
        }

        for study in studies {
            self.validate_study(store, submission, study, &mut report);
        }

        report.log();
        Ok(report)
    }

    fn validate_study(
        &self,
        store: &Store,
        submission: &FormatSetInstance,
        study: &Study,
        report: &mut ValidationReport,
    ) {
        let facts = StudyFacts::collect(store, &study.accession);
        debug!(study = %study.accession, "Validating study");

        let samples = match study.file_name.as_deref() {
            Some(file) => {
                let table = table_of(submission, file, STUDY_TABLE);
                if table.is_none() {
                    report.add_issue(ValidationIssue::error(
                        format!("study-sample file of '{}' was not loaded", study.accession),
                        file,
                        ENGINE,
                    ));
                }
                table.map(|t| (file, t))
            }
            None => {
                report.add_issue(ValidationIssue::error(
                    format!("study '{}' has no Study File Name", study.accession),
                    "investigation",
                    ENGINE,
                ));
                None
            }
        };

        if let (Some((file, table)), Some(configuration)) = (samples, self.configurations.study_sample()) {
            let ctx = self.context(file, table, configuration, &facts);
            let issues = self.run(&ctx, report);
            report.extend(issues);
        }

        let mut groups = store
            .values_of_type::<AssayGroup>()
            .into_iter()
            .filter(|g| g.study == study.accession)
            .collect::<Vec<_>>();
        groups.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        for group in groups {
            let Some(table) = table_of(submission, &group.file_name, ASSAY_TABLE) else {
                report.add_issue(ValidationIssue::error(
                    format!("assay file of study '{}' was not loaded", study.accession),
                    &group.file_name,
                    ENGINE,
                ));
                continue;
            };
            self.validate_assay(group, table, samples.map(|(_, t)| t), &facts, report);
        }
    }

    fn validate_assay(
        &self,
        group: &AssayGroup,
        table: &SectionInstance,
        samples: Option<&SectionInstance>,
        facts: &StudyFacts,
        report: &mut ValidationReport,
    ) {
        let (measurement, technology) = (group.measurement_label(), group.technology_label());
        let Some(configuration) = self.configurations.lookup(measurement, technology) else {
            report.add_issue(ValidationIssue::warning(
                format!("no configuration for {measurement}/{technology}, assay file not validated"),
                &group.file_name,
                ENGINE,
            ));
            return;
        };
        debug!(file = %group.file_name, configuration = %configuration.name(), "Validating assay file");

        let ctx = self
            .context(&group.file_name, table, configuration, facts)
            .with_samples(samples);
        let issues = self.run(&ctx, report);
        if ValidationOutcome::of(&issues) != ValidationOutcome::Error || !self.generic_fallback {
            report.extend(issues);
            return;
        }

        let Some(generic) = self.configurations.generic().filter(|g| *g != configuration) else {
            report.extend(issues);
            return;
        };

        warn!(
            file = %group.file_name,
            configuration = %configuration.name(),
            "Assay file failed its configuration, retrying with the generic one"
        );
        let ctx = self
            .context(&group.file_name, table, generic, facts)
            .with_samples(samples);
        let retry = self.run(&ctx, report);

        if ValidationOutcome::of(&retry) == ValidationOutcome::Error {
            report.extend(issues);
            report.extend(retry);
            return;
        }

        report.stats.generic_fallbacks += 1;
        report.add_issue(ValidationIssue::warning(
            format!(
                "assay file does not satisfy {}, accepted under the generic configuration",
                configuration.name()
            ),
            &group.file_name,
            ENGINE,
        ));
        report.extend(issues.into_iter().map(|issue| {
            let severity = issue.severity.min(Severity::Warning);
            issue.with_severity(severity)
        }));
        report.extend(retry);
    }

    fn context<'a>(
        &'a self,
        file_name: &'a str,
        table: &'a SectionInstance,
        configuration: &'a TableConfiguration,
        facts: &'a StudyFacts,
    ) -> TableContext<'a> {
        TableContext::new(file_name, table, configuration, facts).with_lookup(self.lookup.as_deref())
    }

    fn run(&self, ctx: &TableContext<'_>, report: &mut ValidationReport) -> Vec<ValidationIssue> {
        report.stats.tables_validated += 1;
        let mut issues = Vec::new();
        for validator in &self.validators {
            report.stats.validators_executed += 1;
            let found = validator.validate(ctx);
            debug!(
                validator = validator.name(),
                file = ctx.file_name,
                outcome = %ValidationOutcome::of(&found),
                "Validator finished"
            );
            issues.extend(found);
        }
        info!(
            file = ctx.file_name,
            configuration = %ctx.configuration.name(),
            outcome = %ValidationOutcome::of(&issues),
            "Validated table"
        );
        issues
    }
}

fn table_of<'a>(submission: &'a FormatSetInstance, file: &str, section: &str) -> Option<&'a SectionInstance> {
    submission
        .by_file_name(file)
        .and_then(|f| f.first_section(section))
}
