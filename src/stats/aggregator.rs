//! Funding Aggregator Module
//! Group-by reductions feeding the five charts.

use crate::data::schema::{AMOUNT, CITY, INDUSTRY, STARTUP, YEAR};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

const VALUE: &str = "value";

/// Year → reduced value, ascending by year.
pub type YearSeries = BTreeMap<i32, f64>;
/// Key → reduced value, descending by value.
pub type RankedSeries = Vec<(String, f64)>;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Missing '{0}' column.")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Inputs for every chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingAggregations {
    pub funding_per_year: YearSeries,
    pub startups_per_year: YearSeries,
    pub top_industries: RankedSeries,
    pub average_funding_per_year: YearSeries,
    /// `None` when the table has no city column.
    pub top_cities: Option<RankedSeries>,
}

/// Computes grouped reductions over the cleaned table.
pub struct FundingAggregator;

impl FundingAggregator {
    pub fn compute_all(
        df: &DataFrame,
        top_industries: usize,
        top_cities: usize,
    ) -> Result<FundingAggregations, AggregateError> {
        let aggregations = FundingAggregations {
            funding_per_year: Self::funding_per_year(df)?,
            startups_per_year: Self::startups_per_year(df)?,
            top_industries: Self::top_industries(df, top_industries)?,
            average_funding_per_year: Self::average_funding_per_year(df)?,
            top_cities: Self::top_cities(df, top_cities)?,
        };
        debug!(
            years = aggregations.funding_per_year.len(),
            industries = aggregations.top_industries.len(),
            "computed aggregations"
        );
        Ok(aggregations)
    }

    /// Total funding per year.
    pub fn funding_per_year(df: &DataFrame) -> Result<YearSeries, AggregateError> {
        Self::by_year(df, AMOUNT, col(AMOUNT).sum())
    }

    /// Number of named startups funded per year.
    pub fn startups_per_year(df: &DataFrame) -> Result<YearSeries, AggregateError> {
        Self::by_year(df, STARTUP, col(STARTUP).count())
    }

    /// Mean funding per round per year.
    pub fn average_funding_per_year(df: &DataFrame) -> Result<YearSeries, AggregateError> {
        Self::by_year(df, AMOUNT, col(AMOUNT).mean())
    }

    /// The `n` industries with the largest total funding.
    pub fn top_industries(df: &DataFrame, n: usize) -> Result<RankedSeries, AggregateError> {
        Self::ranked(df, INDUSTRY, n)
    }

    /// The `n` cities with the largest total funding, if the table has cities.
    pub fn top_cities(df: &DataFrame, n: usize) -> Result<Option<RankedSeries>, AggregateError> {
        if df.get_column_index(CITY).is_none() {
            return Ok(None);
        }
        Self::ranked(df, CITY, n).map(Some)
    }

    /// Rows with a missing year are left out.
    fn by_year(df: &DataFrame, source: &str, agg: Expr) -> Result<YearSeries, AggregateError> {
        Self::require(df, YEAR)?;
        Self::require(df, source)?;

        let grouped = df
            .clone()
            .lazy()
            .filter(col(YEAR).is_not_null())
            .group_by([col(YEAR)])
            .agg([agg.alias(VALUE)])
            .collect()?;

        let years = grouped.column(YEAR)?.cast(&DataType::Int32)?;
        let values = grouped.column(VALUE)?.cast(&DataType::Float64)?;

        Ok(years
            .i32()?
            .into_iter()
            .zip(values.f64()?.into_iter())
            .filter_map(|(year, value)| Some((year?, value?)))
            .collect())
    }

    /// Sum of amounts per key, largest first; ties ordered by key.
    fn ranked(df: &DataFrame, key: &str, n: usize) -> Result<RankedSeries, AggregateError> {
        Self::require(df, key)?;
        Self::require(df, AMOUNT)?;

        let grouped = df
            .clone()
            .lazy()
            .group_by([col(key)])
            .agg([col(AMOUNT).sum().alias(VALUE)])
            .sort_by_exprs(
                [col(VALUE), col(key)],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .limit(IdxSize::try_from(n).unwrap_or(IdxSize::MAX))
            .collect()?;

        let keys = grouped.column(key)?.cast(&DataType::String)?;
        let values = grouped.column(VALUE)?.cast(&DataType::Float64)?;

        Ok(keys
            .str()?
            .into_iter()
            .zip(values.f64()?.into_iter())
            .filter_map(|(key, value)| Some((key?.to_string(), value?)))
            .collect())
    }

    fn require(df: &DataFrame, column: &str) -> Result<(), AggregateError> {
        match df.get_column_index(column) {
            Some(_) => Ok(()),
            None => Err(AggregateError::MissingColumn(column.to_string())),
        }
    }
}
