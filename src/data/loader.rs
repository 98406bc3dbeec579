//! CSV Data Loader Module
//! Reads the funding CSV into a Polars DataFrame with every column as text.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load CSV {}: {source}", path.display())]
    CsvError {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("No data loaded")]
    NoData,
}

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a CSV file using Polars.
    ///
    /// Schema inference is disabled so amounts with thousands separators and
    /// free-form dates survive untouched until the cleaner coerces them.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, DataLoadError> {
        if !file_path.is_file() {
            return Err(DataLoadError::NotFound(file_path.to_path_buf()));
        }

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| DataLoadError::CsvError {
                path: file_path.to_path_buf(),
                source,
            })?;

        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded CSV"
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(DataLoadError::NoData)
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Hand the loaded DataFrame over to the cleaning stage.
    pub fn into_dataframe(self) -> Result<DataFrame, DataLoadError> {
        self.df.ok_or(DataLoadError::NoData)
    }
}
