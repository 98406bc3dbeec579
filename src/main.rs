//! Funding Charts - Startup funding CSV cleaning & static chart generation
//!
//! Reads the funding CSV, cleans it and writes the summary charts.

use anyhow::{Context, Result};
use clap::Parser;
use funding_charts::config::PipelineConfig;
use funding_charts::pipeline;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Clean a startup funding CSV and render summary charts", long_about = None)]
struct Cli {
    /// Funding CSV to analyse
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory receiving the chart images (created if absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file overriding lookup tables and chart settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pixels per inch of figure size
    #[arg(long)]
    dpi: Option<u32>,

    /// Also write aggregations.json next to the images
    #[arg(long)]
    export_json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        config.export_json |= self.export_json;
        Ok(config)
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer().with_target(false).compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = cli.into_config()?;
    let report = pipeline::run(&config).with_context(|| {
        format!(
            "processing {} into {}",
            config.input_path.display(),
            config.output_dir.display()
        )
    })?;

    info!(
        images = report.images.len(),
        skipped = report.skipped.len(),
        output = %config.output_dir.display(),
        "finished"
    );
    Ok(())
}
