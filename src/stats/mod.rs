//! Stats module - Aggregations and descriptive statistics

mod aggregator;
mod calculator;

pub use aggregator::{AggregateError, FundingAggregations, FundingAggregator, RankedSeries, YearSeries};
pub use calculator::{AmountSummary, StatsCalculator};
