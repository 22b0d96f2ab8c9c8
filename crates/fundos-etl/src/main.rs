//! Fundos CLI - runs the fund-holdings percentage ETL.
//!
//! # Usage
//!
//! ```bash
//! # Process the period named in the config file
//! fundos run config/fundos.yaml
//!
//! # Process another period
//! fundos run config/fundos.yaml --year 2023 --month 6
//!
//! # Check the config and show the output columns
//! fundos validate config/fundos.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fundos_core::Validate;
use fundos_etl::{AppConfig, EtlJob};
use fundos_ext_file::InMemorySink;
use fundos_traits::SinkWriter;

mod cli;
mod logging;

use cli::{Cli, Commands, RunArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.command.config_path();
    let config = AppConfig::from_file(path)?;

    let level = cli.log_level.as_deref().unwrap_or(config.logging.level.as_str());
    logging::init(level, cli.json_logs || config.logging.json)?;

    match cli.command {
        Commands::Run(args) => run(&config, args),
        Commands::Validate(_) => validate(&config),
    }
}

fn run(config: &AppConfig, args: RunArgs) -> Result<()> {
    config
        .validate_or_error()
        .context("invalid configuration")?;
    let period = config.period(args.year, args.month)?;

    info!("Fundos ETL v{}", env!("CARGO_PKG_VERSION"));

    let sink: Box<dyn SinkWriter> = if args.dry_run {
        info!("dry run: output will not be stored");
        Box::new(InMemorySink::new())
    } else {
        Box::new(config.sink_writer()?)
    };

    let job = EtlJob::new(
        config.source_reader(),
        sink,
        config.transformer_args.clone(),
    )
    .with_key_prefix(config.target.key_prefix.clone());

    let report = job.run(period)?;
    print!("{}", serde_yaml::to_string(&report)?);
    Ok(())
}

fn validate(config: &AppConfig) -> Result<()> {
    config
        .validate_or_error()
        .context("invalid configuration")?;

    let columns = config.output_columns()?;
    println!("configuration is valid");
    println!("source: {:?}", config.source.kind);
    println!("output columns: {}", columns.names().join(", "));
    println!(
        "output format: {:?} under {}",
        config.target.format,
        config.target.root.display()
    );
    if let Ok(period) = config.period(None, None) {
        println!("reporting period: {period}");
    }
    Ok(())
}
