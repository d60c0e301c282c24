//! `isatab` command-line interface
//!
//! Thin wrapper over [`Pipeline`]: validate a submission, export it, or
//! change study owners.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use isatab_core::model::Study;
use isatab_service::config::{ExportFormat, ToolkitConfig};
use isatab_service::ownership::OwnershipSpec;
use isatab_service::Pipeline;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// ISA-Tab curation toolkit
#[derive(Parser, Debug)]
#[command(name = "isatab", version, about = "ISA-Tab validation and export")]
struct Cli {
    /// Toolkit configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a submission directory
    Validate {
        /// Submission directory
        dir: PathBuf,
        /// Directory of ISA configuration files
        #[arg(long)]
        isa_config: Option<PathBuf>,
    },

    /// Export a submission and dispatch its data files
    Export {
        /// Submission directory
        dir: PathBuf,
        /// Formats to write, overrides the configuration
        #[arg(short, long, value_enum)]
        format: Vec<FormatArg>,
        /// Output directory, overrides the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip repository dispatch and orphan checks
        #[arg(long)]
        local: bool,
        /// Export even if validation fails
        #[arg(long)]
        force: bool,
    },

    /// Change study owners and print the resulting owner sets as JSON
    SetOwners {
        /// Submission directory
        dir: PathBuf,
        /// Changes, e.g. `MTBLS1=+alice,bob`
        #[arg(required = true)]
        changes: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Isatab,
    Magetab,
    Pride,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Isatab => Self::Isatab,
            FormatArg::Magetab => Self::Magetab,
            FormatArg::Pride => Self::Pride,
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(cli: &Cli) -> anyhow::Result<ToolkitConfig> {
    match &cli.config {
        Some(path) => ToolkitConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(ToolkitConfig::default()),
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Command::Validate { dir, isa_config } => {
            if isa_config.is_some() {
                config.validation.config_dir = isa_config;
            }
            let pipeline = Pipeline::new(config)?;
            let submission = pipeline.import(&dir)?;
            let report = pipeline.validate(&submission)?;
            println!("{}", report.summary());
            Ok(if report.is_valid() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }

        Command::Export {
            dir,
            format,
            output,
            local,
            force,
        } => {
            if !format.is_empty() {
                config.export.formats = format.into_iter().map(ExportFormat::from).collect();
            }
            if let Some(output) = output {
                config.export.output_dir = output;
            }
            config.repository.local_export |= local;

            let pipeline = Pipeline::new(config)?;
            let submission = pipeline.import(&dir)?;
            let report = pipeline.validate(&submission)?;
            if !report.is_valid() && !force {
                eprintln!("{}", report.summary());
                eprintln!("Validation failed, nothing exported (use --force to export anyway)");
                return Ok(ExitCode::FAILURE);
            }

            let summary = pipeline.export(&submission)?;
            for path in &summary.written {
                println!("{}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::SetOwners { dir, changes } => {
            let specs = OwnershipSpec::parse_all(&changes)?;
            let pipeline = Pipeline::new(config)?;
            let mut submission = pipeline.import(&dir)?;
            pipeline.set_owners(&mut submission, &specs)?;

            let owners = submission
                .store
                .values_of_type::<Study>()
                .into_iter()
                .map(|s| (s.accession.clone(), s.owners.clone()))
                .collect::<BTreeMap<_, _>>();
            println!("{}", serde_json::to_string_pretty(&owners)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
