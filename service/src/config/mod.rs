//! Configuration loading for the curation toolkit
//!
//! This module provides configuration loading from YAML files with
//! environment variable substitution support.

use isatab_core::{IsaTabError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Placeholder replaced by the study accession in repository paths
pub const ACCESSION_PLACEHOLDER: &str = "${accession}";

// Upper-case names only, so `${accession}` templates survive substitution.
static ENV_VAR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").ok());

/// Load configuration from `YAML` file with environment variable substitution
///
/// # Errors
///
/// Returns `IsaTabError::IoError` if the file cannot be read
/// Returns `IsaTabError::ConfigError` if the YAML cannot be parsed
pub fn load_config<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse configuration text with environment variable substitution
///
/// # Errors
///
/// Returns `IsaTabError::ConfigError` if the YAML cannot be parsed
pub fn parse_config<T: for<'de> Deserialize<'de>>(contents: &str) -> Result<T> {
    let substituted = substitute_env_vars(contents);
    serde_yaml::from_str(&substituted)
        .map_err(|e| IsaTabError::config(format!("Failed to parse YAML config: {e}")))
}

/// Substitute environment variables in the format ${VAR:-default}
fn substitute_env_vars(content: &str) -> String {
    let Some(re) = ENV_VAR.as_ref() else {
        return content.to_string();
    };

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default_value = caps.get(2).map_or("", |m| m.as_str());

        env::var(var_name).unwrap_or_else(|_| default_value.to_string())
    })
    .to_string()
}

/// Complete toolkit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitConfig {
    /// Parser configuration
    pub parser: ParserConfig,
    /// Validation configuration
    pub validation: ValidationConfig,
    /// Data repository layout
    pub repository: RepositoryConfig,
    /// Export configuration
    pub export: ExportConfig,
}

impl ToolkitConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns the errors of [`load_config`] and [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` on the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if !self.repository.study_dir_template.contains(ACCESSION_PLACEHOLDER) {
            return Err(IsaTabError::config(format!(
                "repository.study_dir_template '{}' must contain {ACCESSION_PLACEHOLDER}",
                self.repository.study_dir_template
            )));
        }
        if self.parser.delimiter.len() != 1 {
            return Err(IsaTabError::config(format!(
                "parser.delimiter must be a single byte, got {:?}",
                self.parser.delimiter
            )));
        }
        if self.export.formats.is_empty() {
            return Err(IsaTabError::config("export.formats must not be empty"));
        }
        Ok(())
    }
}

/// Parser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Whether headers are matched case-sensitively
    pub case_sensitive: bool,
    /// Field delimiter, a single character
    pub delimiter: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            delimiter: "\t".to_string(),
        }
    }
}

impl ParserConfig {
    /// Delimiter byte, tab when unset
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b'\t')
    }
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Directory of ISA configuration YAML files
    pub config_dir: Option<PathBuf>,
    /// Ontology index YAML file
    pub ontology_index: Option<PathBuf>,
    /// Retry failing assay files against the generic configuration
    pub generic_fallback: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            config_dir: None,
            ontology_index: None,
            generic_fallback: true,
        }
    }
}

/// What to do with files in the repository that no submission references
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanMode {
    /// Log a warning
    #[default]
    Warn,
    /// Move into a sibling `original/` directory
    Backup,
}

/// Data repository layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Directory data files are copied from; the submission directory when unset
    pub source_dir: Option<PathBuf>,
    /// Root for raw data files
    pub raw_data_dir: PathBuf,
    /// Root for processed data files
    pub processed_data_dir: PathBuf,
    /// Root for generic data files
    pub generic_data_dir: PathBuf,
    /// Per-study directory name, must contain `${accession}`
    pub study_dir_template: String,
    /// Skip every repository side effect
    pub local_export: bool,
    /// Orphan handling
    pub orphan_mode: OrphanMode,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            raw_data_dir: PathBuf::from("repository/raw"),
            processed_data_dir: PathBuf::from("repository/processed"),
            generic_data_dir: PathBuf::from("repository/generic"),
            study_dir_template: ACCESSION_PLACEHOLDER.to_string(),
            local_export: false,
            orphan_mode: OrphanMode::Warn,
        }
    }
}

impl RepositoryConfig {
    /// Study directory name for an accession
    #[must_use]
    pub fn study_dir(&self, accession: &str) -> String {
        self.study_dir_template.replace(ACCESSION_PLACEHOLDER, accession)
    }

    /// Directory the data files of a submission read from `submission_dir`
    /// are copied from
    #[must_use]
    pub fn source_root<'a>(&'a self, submission_dir: &'a Path) -> &'a Path {
        self.source_dir.as_deref().unwrap_or(submission_dir)
    }
}

/// Downstream format produced by an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Re-serialized ISA-Tab
    Isatab,
    /// MAGE-TAB IDF and SDRF
    Magetab,
    /// PRIDE-XML, one document per assay group
    Pride,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Formats to produce
    pub formats: Vec<ExportFormat>,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            formats: vec![ExportFormat::Isatab],
            output_dir: PathBuf::from("export"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_env_var_substitution() {
        // Test with default values only since we can't set env vars without unsafe
        let content = "server: ${NONEXISTENT_ISATAB_VAR:-default_value}";
        let result = substitute_env_vars(content);
        assert_eq!(result, "server: default_value");

        let content = "${ISATAB_VAR1:-val1} and ${ISATAB_VAR2:-val2}";
        let result = substitute_env_vars(content);
        assert_eq!(result, "val1 and val2");
    }

    #[test]
    fn test_accession_placeholder_survives() {
        let content = "study_dir_template: \"${accession}\"";
        assert_eq!(substitute_env_vars(content), content);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ToolkitConfig = parse_config(
            "repository:\n  study_dir_template: \"study-${accession}\"\n  orphan_mode: backup\nexport:\n  formats: [isatab, magetab]\n",
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.repository.orphan_mode, OrphanMode::Backup);
        assert_eq!(config.repository.study_dir("MTBLS1"), "study-MTBLS1");
        assert_eq!(config.export.formats, vec![ExportFormat::Isatab, ExportFormat::Magetab]);
        assert_eq!(config.parser.delimiter_byte(), b'\t');
        assert!(config.validation.generic_fallback);
    }

    #[test]
    fn test_source_root_defaults_to_submission_dir() {
        let submission = Path::new("/submissions/MTBLS1");
        let mut repository = RepositoryConfig::default();
        assert_eq!(repository.source_root(submission), submission);

        repository.source_dir = Some(PathBuf::from("/staging"));
        assert_eq!(repository.source_root(submission), Path::new("/staging"));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let config: ToolkitConfig =
            parse_config("repository:\n  study_dir_template: fixed\n").unwrap();
        assert!(matches!(config.validate(), Err(IsaTabError::ConfigError(_))));
    }
}
