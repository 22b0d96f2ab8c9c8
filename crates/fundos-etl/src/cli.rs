//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Fundos - fund-holdings percentage ETL
#[derive(Parser, Debug)]
#[command(name = "fundos")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log filter directive, overriding the config file (RUST_LOG wins over both)
    #[arg(long, global = true, env = "FUNDOS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, aggregate and store one reporting period
    Run(RunArgs),

    /// Check a config file and show the output layout
    Validate(ValidateArgs),
}

impl Commands {
    /// Path of the config file the command reads.
    pub fn config_path(&self) -> &PathBuf {
        match self {
            Commands::Run(args) => &args.config,
            Commands::Validate(args) => &args.config,
        }
    }
}

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML config file
    pub config: PathBuf,

    /// Reporting year, overriding source.year
    #[arg(long)]
    pub year: Option<u16>,

    /// Reporting month (1-12), overriding source.month
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
    pub month: Option<u8>,

    /// Aggregate without storing the output
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// YAML config file
    pub config: PathBuf,
}
