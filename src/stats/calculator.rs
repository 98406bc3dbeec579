//! Statistics Calculator Module
//! Median for imputation and a descriptive summary of the amount column.

use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics of the cleaned amounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountSummary {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Median of `values`; mean of the two middle values for an even count.
    ///
    /// `None` when `values` is empty.
    pub fn median(values: &[f64]) -> Option<f64> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        Some(median)
    }

    /// Compute descriptive statistics for an array of values.
    pub fn summarize(values: &[f64]) -> Option<AmountSummary> {
        let count = values.len();
        if count == 0 {
            return None;
        }

        // Sample standard deviation, zero for a single value.
        let std = if count > 1 { values.std_dev() } else { 0.0 };

        Some(AmountSummary {
            count,
            total: values.iter().sum(),
            mean: values.mean(),
            std,
            min: Statistics::min(values),
            max: Statistics::max(values),
        })
    }

    /// Non-null values of a numeric column, cast to `f64`.
    pub fn column_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<f64>> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().flatten().collect())
    }
}
