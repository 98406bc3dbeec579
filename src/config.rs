//! Pipeline configuration: paths, lookup tables and chart settings.
//!
//! Defaults come from the static tables in [`crate::data::schema`]; a JSON
//! file may override any subset of fields.

use crate::data::schema::{CITY_ALIASES, INDUSTRY, LEGACY_COLUMN_NAMES};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INPUT: &str = "data/startup_funding.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Lookup tables driving header and value normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    /// Legacy header → canonical header, matched after trimming.
    pub column_mapping: BTreeMap<String, String>,
    /// Title-cased city → canonical city.
    pub city_aliases: BTreeMap<String, String>,
    /// Columns whose missing values become the sentinel label.
    pub categorical_columns: Vec<String>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            column_mapping: to_table(&LEGACY_COLUMN_NAMES),
            city_aliases: to_table(&CITY_ALIASES),
            categorical_columns: vec![INDUSTRY.to_string()],
        }
    }
}

fn to_table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub cleaning: CleaningRules,
    /// Slices in the industry pie.
    pub top_industries: usize,
    /// Bars in the city chart.
    pub top_cities: usize,
    /// Pixels per inch of figure size.
    pub dpi: u32,
    /// Write `aggregations.json` alongside the images.
    pub export_json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            cleaning: CleaningRules::default(),
            top_industries: 5,
            top_cities: 10,
            dpi: 100,
            export_json: false,
        }
    }
}

impl PipelineConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Load a JSON config file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_industries == 0 {
            return Err(ConfigError::Invalid("top_industries must be at least 1".into()));
        }
        if self.top_cities == 0 {
            return Err(ConfigError::Invalid("top_cities must be at least 1".into()));
        }
        if !(10..=600).contains(&self.dpi) {
            return Err(ConfigError::Invalid(format!(
                "dpi must be between 10 and 600, got {}",
                self.dpi
            )));
        }
        Ok(())
    }
}
