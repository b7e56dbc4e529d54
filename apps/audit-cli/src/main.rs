//! eco-audit binary
//!
//! Audits a dataset against an agency's air-quality standards and prints a
//! graded report.

use anyhow::Context;
use audit_cli::commands::{describe_agencies, emit, run_audit};
use audit_cli::{Config, OutputFormat, Overrides};
use clap::{Args, Parser, Subcommand};
use compliance_engine::RegulationCache;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static REGULATIONS: RegulationCache = RegulationCache::new();

#[derive(Parser, Debug)]
#[command(name = "eco-audit")]
#[command(
    version,
    about = "Environmental compliance audit for air-quality datasets and models"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Audit a dataset and print the final report
    Audit(AuditArgs),
    /// List loaded agencies and their regulated parameters
    Agencies {
        /// Directory of regulation documents
        #[arg(long)]
        regulations: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// Dataset to audit (.csv, .json or .xlsx)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Agency key, e.g. cpcb_standards
    #[arg(long)]
    agency: Option<String>,

    /// Directory of regulation documents
    #[arg(long)]
    regulations: Option<PathBuf>,

    /// Features the model was trained on (defaults to every dataset column)
    #[arg(long, value_delimiter = ',')]
    model_features: Option<Vec<String>>,

    /// JSON report produced by the model performance evaluator
    #[arg(long)]
    performance_report: Option<PathBuf>,

    /// JSON report produced by the explainability inspector
    #[arg(long)]
    explainability_report: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip narrative generation
    #[arg(long)]
    no_narrative: bool,

    /// TOML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl AuditArgs {
    fn into_config(self) -> anyhow::Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        Ok(base.merge(Overrides {
            regulations_dir: self.regulations,
            agency: self.agency,
            dataset: self.dataset,
            model_features: self.model_features,
            performance_report: self.performance_report,
            explainability_report: self.explainability_report,
            format: self.format,
            output_path: self.output,
            no_narrative: self.no_narrative,
        }))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the report; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting eco-audit v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Audit(args) => {
            let config = args.into_config()?;
            let store = REGULATIONS.get_or_load(&config.audit.regulations_dir);
            let report = run_audit(store, &config).context("Audit could not start")?;
            emit(&report, &config)?;
        }
        Command::Agencies { regulations } => {
            let dir = regulations.unwrap_or_else(|| Config::default().audit.regulations_dir);
            let store = REGULATIONS.get_or_load(&dir);
            print!("{}", describe_agencies(store)?);
        }
    }

    Ok(())
}
