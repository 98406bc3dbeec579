//! End-to-end run: load, clean, aggregate, render.

use crate::charts::{ChartError, ChartKind, StaticChartRenderer};
use crate::config::{ConfigError, PipelineConfig};
use crate::data::schema::AMOUNT;
use crate::data::{CleanError, CleaningReport, DataCleaner, DataLoadError, DataLoader};
use crate::stats::{AggregateError, AmountSummary, FundingAggregations, FundingAggregator, StatsCalculator};
use image::RgbImage;
use polars::prelude::PolarsError;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const AGGREGATIONS_FILE: &str = "aggregations.json";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] DataLoadError),
    #[error(transparent)]
    Clean(#[from] CleanError),
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("Failed to read cleaned amounts: {0}")]
    Summary(#[from] PolarsError),
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize aggregations: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub cleaning: CleaningReport,
    pub summary: Option<AmountSummary>,
    pub aggregations: FundingAggregations,
    /// Chart images in the order they were written.
    pub images: Vec<PathBuf>,
    pub skipped: Vec<ChartKind>,
    pub export: Option<PathBuf>,
}

/// Run the whole pipeline for `config`.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport, PipelineError> {
    config.validate()?;

    fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let mut loader = DataLoader::new();
    loader.load_csv(&config.input_path)?;
    info!(
        columns = ?loader.get_columns(),
        rows = loader.get_row_count(),
        "column names in CSV"
    );
    let mut df = loader.into_dataframe()?;

    let cleaning = DataCleaner::clean(&mut df, &config.cleaning)?;

    let amounts = StatsCalculator::column_values(&df, AMOUNT)?;
    let summary = StatsCalculator::summarize(&amounts);
    if let Some(s) = &summary {
        info!(
            count = s.count,
            total = s.total,
            mean = s.mean,
            std = s.std,
            min = s.min,
            max = s.max,
            "amount summary"
        );
    }

    let aggregations =
        FundingAggregator::compute_all(&df, config.top_industries, config.top_cities)?;

    let renderer = StaticChartRenderer::new(config.dpi)
        .with_limits(config.top_industries, config.top_cities);
    let (images, skipped) = render_all(&renderer, &aggregations, &config.output_dir)?;

    let export = if config.export_json {
        Some(export_aggregations(&aggregations, &config.output_dir)?)
    } else {
        None
    };

    Ok(PipelineReport {
        cleaning,
        summary,
        aggregations,
        images,
        skipped,
        export,
    })
}

/// Render every available chart into `output_dir`.
///
/// Returns the written paths and the charts skipped for lack of data.
pub fn render_all(
    renderer: &StaticChartRenderer,
    aggregations: &FundingAggregations,
    output_dir: &Path,
) -> Result<(Vec<PathBuf>, Vec<ChartKind>), ChartError> {
    let mut images = Vec::with_capacity(ChartKind::ALL.len());
    let mut skipped = Vec::new();

    for kind in ChartKind::ALL {
        let image = match kind {
            ChartKind::FundingPerYear => renderer.funding_per_year(&aggregations.funding_per_year)?,
            ChartKind::StartupsPerYear => {
                renderer.startups_per_year(&aggregations.startups_per_year)?
            }
            ChartKind::IndustryFunding => renderer.industry_funding(&aggregations.top_industries)?,
            ChartKind::AverageFundingPerYear => {
                renderer.average_funding_per_year(&aggregations.average_funding_per_year)?
            }
            ChartKind::TopCities => match &aggregations.top_cities {
                Some(cities) => renderer.top_cities(cities)?,
                None => {
                    warn!("City column ('CityLocation') not found in the dataset; skipping city chart");
                    skipped.push(kind);
                    continue;
                }
            },
        };

        images.push(write_chart(&image, output_dir, kind)?);
    }

    Ok((images, skipped))
}

fn write_chart(image: &RgbImage, output_dir: &Path, kind: ChartKind) -> Result<PathBuf, ChartError> {
    let path = output_dir.join(kind.file_name());
    StaticChartRenderer::save(image, &path)?;
    info!(path = %path.display(), "wrote chart");
    Ok(path)
}

fn export_aggregations(
    aggregations: &FundingAggregations,
    output_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let path = output_dir.join(AGGREGATIONS_FILE);
    let json = serde_json::to_string_pretty(aggregations)?;
    fs::write(&path, json).map_err(|source| PipelineError::Export {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "exported aggregations");
    Ok(path)
}
