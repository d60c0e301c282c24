//! Import, validation and export of one submission
//!
//! [`Pipeline`] owns the schema registry and the configuration; every run
//! works on its own [`Submission`] and therefore its own [`Store`].

use crate::config::{ExportFormat, ToolkitConfig};
use crate::export::{
    DispatchSummary, FileDispatcher, FileTracker, FormatSetExporter, OrphanSummary, PrideXmlExporter,
    RepoFilesChecker, TabWriter, study_accessions,
};
use crate::file_system_adapter::{FileSystemOperations, LocalFileSystem};
use crate::mapping::{FormatSetTabMapper, MappingContext};
use crate::ownership::OwnershipSpec;
use crate::parser::{IsaTabLoader, TabOptions, TabParser};
use crate::validation::{IsaConfigurationSet, OntologyIndex, ValidationEngine, ValidationReport};
use isatab_core::schema::ISATAB_FORMAT_SET;
use isatab_core::{FormatSetInstance, Result, SchemaRegistry, Store};
use std::path::{Path, PathBuf};
use tracing::info;

/// A loaded submission: the parsed files and the objects mapped from them
#[derive(Debug)]
pub struct Submission {
    /// Directory the submission was read from
    pub dir: PathBuf,
    /// Parsed files
    pub instance: FormatSetInstance,
    /// Mapped objects
    pub store: Store,
}

/// What an export produced
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Files written to the output directory
    pub written: Vec<PathBuf>,
    /// Data file dispatch
    pub dispatch: DispatchSummary,
    /// Repository orphan check
    pub orphans: OrphanSummary,
}

/// Entry point of the toolkit
pub struct Pipeline<F: FileSystemOperations = LocalFileSystem> {
    registry: SchemaRegistry,
    config: ToolkitConfig,
    fs: F,
}

impl Pipeline<LocalFileSystem> {
    /// Create a pipeline over the local file system
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` for an invalid configuration or
    /// unloadable built-in format definitions.
    pub fn new(config: ToolkitConfig) -> Result<Self> {
        Self::with_file_system(config, LocalFileSystem::new())
    }
}

impl<F: FileSystemOperations> Pipeline<F> {
    /// Create a pipeline over a file system adapter
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` for an invalid configuration or
    /// unloadable built-in format definitions.
    pub fn with_file_system(config: ToolkitConfig, fs: F) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: SchemaRegistry::with_builtin()?,
            config,
            fs,
        })
    }

    /// Loaded format definitions
    #[must_use]
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ToolkitConfig {
        &self.config
    }

    fn parser(&self) -> TabParser {
        TabParser::new(
            TabOptions::default()
                .with_case_sensitive(self.config.parser.case_sensitive)
                .with_delimiter(self.config.parser.delimiter_byte()),
        )
    }

    /// Parse a submission directory and map it into a fresh store
    ///
    /// # Errors
    ///
    /// Returns loader errors for missing or malformed files and mapping
    /// errors for content the model rejects.
    pub fn import(&self, dir: &Path) -> Result<Submission> {
        let format_set = self.registry.format_set(ISATAB_FORMAT_SET)?;
        let instance = IsaTabLoader::new(self.parser(), format_set).load_dir(dir)?;

        let mut store = Store::new();
        let mut ctx = MappingContext::new(self.config.parser.case_sensitive);
        let stored = FormatSetTabMapper::isatab().map(&instance, &mut store, &mut ctx)?;
        info!(dir = %dir.display(), objects = stored, "Imported submission");

        Ok(Submission {
            dir: dir.to_path_buf(),
            instance,
            store,
        })
    }

    /// Build the validation engine from the configuration
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::ConfigError` for unreadable ISA configurations
    /// or ontology index.
    pub fn validation_engine(&self) -> Result<ValidationEngine> {
        let configurations = match &self.config.validation.config_dir {
            Some(dir) => IsaConfigurationSet::load_dir(dir)?,
            None => IsaConfigurationSet::builtin()?,
        };
        let mut engine =
            ValidationEngine::new(configurations).with_generic_fallback(self.config.validation.generic_fallback);
        if let Some(path) = &self.config.validation.ontology_index {
            engine = engine.with_lookup(Box::new(OntologyIndex::load(path)?));
        }
        Ok(engine)
    }

    /// Validate a submission
    ///
    /// # Errors
    ///
    /// Returns configuration errors; findings are reported, not raised.
    pub fn validate(&self, submission: &Submission) -> Result<ValidationReport> {
        self.validation_engine()?
            .validate(&submission.store, &submission.instance)
    }

    /// Apply ownership changes to the studies of a submission
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::MissingValue` for an unknown study; changes
    /// applied before it are kept.
    pub fn set_owners(&self, submission: &mut Submission, specs: &[OwnershipSpec]) -> Result<()> {
        for spec in specs {
            spec.apply(&mut submission.store)?;
        }
        Ok(())
    }

    /// Write every configured format, then dispatch the data files the
    /// exported ISA-Tab references into the repository and check it for
    /// orphans. Data files are read relative to the submission directory
    /// unless `repository.source_dir` overrides it.
    ///
    /// # Errors
    ///
    /// Returns exporter, serialization and file system errors.
    pub fn export(&self, submission: &Submission) -> Result<ExportSummary> {
        let output_dir = &self.config.export.output_dir;
        let writer = TabWriter::new(self.config.parser.delimiter_byte());
        let mut summary = ExportSummary::default();
        let isatab = FormatSetExporter::isatab().export(&self.registry, &submission.store)?;

        for format in &self.config.export.formats {
            let written = match format {
                ExportFormat::Isatab => writer.write_to_dir(&isatab, output_dir, &self.fs)?,
                ExportFormat::Magetab => {
                    let files = FormatSetExporter::magetab().export(&self.registry, &submission.store)?;
                    writer.write_to_dir(&files, output_dir, &self.fs)?
                }
                ExportFormat::Pride => {
                    PrideXmlExporter::new().write_to_dir(&submission.store, output_dir, &self.fs)?
                }
            };
            summary.written.extend(written);
        }

        let tracker = FileTracker::from_format_set(&submission.store, &isatab);
        let repository = &self.config.repository;
        let source = repository.source_root(&submission.dir);
        summary.dispatch = FileDispatcher::new(&self.fs, repository, source).dispatch(&tracker)?;
        summary.orphans =
            RepoFilesChecker::new(&self.fs, repository).check(&tracker, &study_accessions(&submission.store))?;

        info!(
            written = summary.written.len(),
            copied = summary.dispatch.copied,
            orphans = summary.orphans.orphans.len(),
            "Exported submission"
        );
        Ok(summary)
    }
}
