//! Validation report structures

use indexmap::IndexSet;
use isatab_core::{IsaTabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Severity level for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning that degrades the result
    Warning,
    /// Error that fails the file
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of one validator or of a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationOutcome {
    /// Nothing to report
    #[default]
    Success,
    /// Accepted with warnings
    Warning,
    /// Rejected
    Error,
}

impl ValidationOutcome {
    /// Outcome implied by a list of issues
    #[must_use]
    pub fn of(issues: &[ValidationIssue]) -> Self {
        issues.iter().fold(Self::Success, |outcome, issue| {
            outcome.max(match issue.severity {
                Severity::Info => Self::Success,
                Severity::Warning => Self::Warning,
                Severity::Error => Self::Error,
            })
        })
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A single validation issue
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Severity of the issue
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// File (and column) the issue was found in
    pub path: String,
    /// Name of the validator that detected this issue
    pub validator: String,
}

impl ValidationIssue {
    /// Create a new validation issue
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        path: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            path: path.into(),
            validator: validator.into(),
        }
    }

    /// Create an error issue
    pub fn error(
        message: impl Into<String>,
        path: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, message, path, validator)
    }

    /// Create a warning issue
    pub fn warning(
        message: impl Into<String>,
        path: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, message, path, validator)
    }

    /// Create an info issue
    pub fn info(
        message: impl Into<String>,
        path: impl Into<String>,
        validator: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, message, path, validator)
    }

    /// Same issue at another severity
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.path, self.message)
    }
}

/// Validation statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    /// Number of tables validated, fallback retries included
    pub tables_validated: usize,
    /// Number of errors
    pub error_count: usize,
    /// Number of warnings
    pub warning_count: usize,
    /// Number of info messages
    pub info_count: usize,
    /// Number of validator runs
    pub validators_executed: usize,
    /// Assay files accepted only by the generic configuration
    pub generic_fallbacks: usize,
}

/// Complete validation report
///
/// Issues form an ordered set: the same message reported twice for the same
/// file is kept once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Overall outcome
    pub outcome: ValidationOutcome,
    /// Issues in the order they were found
    pub issues: IndexSet<ValidationIssue>,
    /// Validation statistics
    pub stats: ValidationStats,
    /// Investigation that was validated
    pub investigation: String,
}

impl ValidationReport {
    /// Create a new validation report
    pub fn new(investigation: impl Into<String>) -> Self {
        Self {
            outcome: ValidationOutcome::Success,
            issues: IndexSet::new(),
            stats: ValidationStats::default(),
            investigation: investigation.into(),
        }
    }

    /// Add an issue to the report
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        let outcome = ValidationOutcome::of(std::slice::from_ref(&issue));
        let severity = issue.severity;
        if self.issues.insert(issue) {
            match severity {
                Severity::Error => self.stats.error_count += 1,
                Severity::Warning => self.stats.warning_count += 1,
                Severity::Info => self.stats.info_count += 1,
            }
        }
        self.outcome = self.outcome.max(outcome);
    }

    /// Add every issue of a list
    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.add_issue(issue);
        }
    }

    /// Whether the run passed, possibly with warnings
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.outcome != ValidationOutcome::Error
    }

    /// Get all errors
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    /// Get all warnings
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    /// Get a summary of the validation
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "Validation of '{}' passed with {} warnings",
                self.investigation, self.stats.warning_count
            )
        } else {
            format!(
                "Validation of '{}' failed with {} errors and {} warnings",
                self.investigation, self.stats.error_count, self.stats.warning_count
            )
        }
    }

    /// Emit every issue and the summary through `tracing`
    pub fn log(&self) {
        for issue in &self.issues {
            match issue.severity {
                Severity::Error => error!(validator = %issue.validator, "{issue}"),
                Severity::Warning => warn!(validator = %issue.validator, "{issue}"),
                Severity::Info => info!(validator = %issue.validator, "{issue}"),
            }
        }
        info!(outcome = %self.outcome, "{}", self.summary());
    }

    /// Turn a fatal report into an error
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ValidationError` carrying the summary and the
    /// error messages when the outcome is [`ValidationOutcome::Error`].
    pub fn ensure_valid(self) -> Result<Self> {
        if self.is_valid() {
            return Ok(self);
        }
        let errors = self
            .errors()
            .map(|i| format!("- {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        Err(IsaTabError::validation(format!("{}\n{errors}", self.summary())))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        if !self.issues.is_empty() {
            writeln!(f, "\nIssues:")?;
            for issue in &self.issues {
                writeln!(f, "  {issue}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_issues_counted_once() {
        let mut report = ValidationReport::new("INV1");
        report.add_issue(ValidationIssue::warning("unit missing", "a_x.txt", "units"));
        report.add_issue(ValidationIssue::warning("unit missing", "a_x.txt", "units"));

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.stats.warning_count, 1);
        assert_eq!(report.outcome, ValidationOutcome::Warning);
        assert!(report.is_valid());
    }

    #[test]
    fn test_error_is_fatal() {
        let mut report = ValidationReport::new("INV1");
        report.add_issue(ValidationIssue::warning("w", "s_x.txt", "values"));
        report.add_issue(ValidationIssue::error("e", "a_x.txt", "required"));

        assert_eq!(report.outcome, ValidationOutcome::Error);
        let err = report.ensure_valid().unwrap_err();
        assert!(matches!(err, IsaTabError::ValidationError(ref m) if m.contains("[ERROR] a_x.txt: e")));
    }

    #[test]
    fn test_outcome_of_issues() {
        assert_eq!(ValidationOutcome::of(&[]), ValidationOutcome::Success);
        assert_eq!(
            ValidationOutcome::of(&[ValidationIssue::info("i", "p", "v")]),
            ValidationOutcome::Success
        );
    }
}
