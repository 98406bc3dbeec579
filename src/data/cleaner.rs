//! Data Cleaner Module
//! Header normalization, type coercion and imputation for the funding table.

use crate::config::CleaningRules;
use crate::data::schema::{AMOUNT, CITY, DATE, UNKNOWN, YEAR};
use crate::stats::StatsCalculator;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Years outside this range are typos like "015", not real funding dates.
const MIN_YEAR: i32 = 1677;
const MAX_YEAR: i32 = 2262;

/// Day-first layouts, two-digit years first so `%Y` never swallows "15".
const DATE_FORMATS: [&str; 8] = [
    "%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d",
];

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Missing '{0}' column.")]
    MissingColumn(String),
    #[error("Duplicate column '{0}' after header normalization")]
    DuplicateColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// What the cleaning pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleaningReport {
    pub renamed_columns: usize,
    pub unparsed_dates: usize,
    pub imputed_amounts: usize,
    pub amount_median: Option<f64>,
    pub filled_categories: usize,
    pub has_city: bool,
}

/// Handles data cleaning operations on the loaded table.
pub struct DataCleaner;

impl DataCleaner {
    /// Run every cleaning step in order.
    pub fn clean(df: &mut DataFrame, rules: &CleaningRules) -> Result<CleaningReport, CleanError> {
        let renamed_columns = Self::normalize_columns(df, &rules.column_mapping)?;
        let unparsed_dates = Self::parse_dates(df)?;
        let (imputed_amounts, amount_median) = Self::normalize_amounts(df)?;

        let mut filled_categories = 0;
        for column in &rules.categorical_columns {
            filled_categories += Self::fill_categorical(df, column)?;
        }

        let has_city = Self::normalize_cities(df, &rules.city_aliases)?;

        let report = CleaningReport {
            renamed_columns,
            unparsed_dates,
            imputed_amounts,
            amount_median,
            filled_categories,
            has_city,
        };
        info!(
            rows = df.height(),
            renamed = report.renamed_columns,
            unparsed_dates = report.unparsed_dates,
            imputed_amounts = report.imputed_amounts,
            filled_categories = report.filled_categories,
            "cleaned funding table"
        );
        Ok(report)
    }

    /// Rename legacy headers, then strip whitespace and internal spaces.
    ///
    /// Returns how many headers changed.
    pub fn normalize_columns(
        df: &mut DataFrame,
        mapping: &BTreeMap<String, String>,
    ) -> Result<usize, CleanError> {
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(df.width());
        let mut renamed = 0;

        for name in df.get_column_names() {
            let canonical = canonical_header(name.as_str(), mapping);
            if canonical != name.as_str() {
                renamed += 1;
            }
            if !seen.insert(canonical.clone()) {
                return Err(CleanError::DuplicateColumn(canonical));
            }
            names.push(canonical);
        }

        df.set_column_names(names.iter().map(String::as_str))?;
        debug!(columns = ?names, "normalized headers");
        Ok(renamed)
    }

    /// Replace `Date` with a parsed date column and derive `Year`.
    ///
    /// Unparseable dates become null. Returns how many rows failed to parse.
    pub fn parse_dates(df: &mut DataFrame) -> Result<usize, CleanError> {
        Self::require(df, DATE)?;

        let (days, years): (Vec<Option<i32>>, Vec<Option<i32>>) = {
            let raw = df.column(DATE)?.cast(&DataType::String)?;
            raw.str()?
                .into_iter()
                .map(|value| {
                    let date = value.and_then(parse_day_first_date);
                    (
                        date.map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
                        date.map(|d| d.year()),
                    )
                })
                .unzip()
        };

        let unparsed = years.iter().filter(|year| year.is_none()).count();
        if unparsed > 0 {
            warn!(unparsed, "dates could not be parsed and were left missing");
        }

        let dates = Column::new(DATE.into(), days).cast(&DataType::Date)?;
        df.with_column(dates)?;
        df.with_column(Column::new(YEAR.into(), years))?;
        Ok(unparsed)
    }

    /// Coerce `AmountInUSD` to `f64` and impute missing values with the median.
    ///
    /// Returns the number of imputed cells and the median used.
    pub fn normalize_amounts(df: &mut DataFrame) -> Result<(usize, Option<f64>), CleanError> {
        Self::require(df, AMOUNT)?;

        let mut amounts: Vec<Option<f64>> = {
            let raw = df.column(AMOUNT)?.cast(&DataType::String)?;
            raw.str()?
                .into_iter()
                .map(|value| value.and_then(parse_amount))
                .collect()
        };

        let parsed: Vec<f64> = amounts.iter().flatten().copied().collect();
        let median = StatsCalculator::median(&parsed);

        let mut imputed = 0;
        match median {
            Some(median) => {
                for amount in amounts.iter_mut().filter(|amount| amount.is_none()) {
                    *amount = Some(median);
                    imputed += 1;
                }
                debug!(median, imputed, "imputed missing amounts");
            }
            None => warn!(column = AMOUNT, "no parseable amounts; column left missing"),
        }

        df.with_column(Column::new(AMOUNT.into(), amounts))?;
        Ok((imputed, median))
    }

    /// Replace null or whitespace-only values with the sentinel, creating
    /// the column when absent. Other values are kept verbatim.
    /// Returns how many cells were filled.
    pub fn fill_categorical(df: &mut DataFrame, column: &str) -> Result<usize, CleanError> {
        let height = df.height();
        if df.get_column_index(column).is_none() {
            debug!(column, "categorical column absent; filling with sentinel");
            df.with_column(Column::new(column.into(), vec![UNKNOWN; height]))?;
            return Ok(height);
        }

        let mut filled = 0;
        let values: Vec<String> = {
            let raw = df.column(column)?.cast(&DataType::String)?;
            raw.str()?
                .into_iter()
                .map(|value| match value {
                    Some(v) if !v.trim().is_empty() => v.to_string(),
                    _ => {
                        filled += 1;
                        UNKNOWN.to_string()
                    }
                })
                .collect()
        };

        df.with_column(Column::new(column.into(), values))?;
        Ok(filled)
    }

    /// Trim, title-case and alias `CityLocation`.
    ///
    /// Returns `false` without touching the table when the column is absent.
    pub fn normalize_cities(
        df: &mut DataFrame,
        aliases: &BTreeMap<String, String>,
    ) -> Result<bool, CleanError> {
        if df.get_column_index(CITY).is_none() {
            return Ok(false);
        }

        let cities: Vec<String> = {
            let raw = df.column(CITY)?.cast(&DataType::String)?;
            raw.str()?
                .into_iter()
                .map(|value| canonical_city(value, aliases))
                .collect()
        };

        df.with_column(Column::new(CITY.into(), cities))?;
        Ok(true)
    }

    fn require(df: &DataFrame, column: &str) -> Result<(), CleanError> {
        match df.get_column_index(column) {
            Some(_) => Ok(()),
            None => Err(CleanError::MissingColumn(column.to_string())),
        }
    }
}

/// Canonical form of a raw header.
pub fn canonical_header(raw: &str, mapping: &BTreeMap<String, String>) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    let renamed = mapping.get(trimmed).map(String::as_str).unwrap_or(trimmed);
    renamed.trim().replace(' ', "")
}

/// Parse a day-first date; a trailing time component is ignored.
pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw
        .trim()
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()?;
    if date_part.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .filter(|date| (MIN_YEAR..=MAX_YEAR).contains(&date.year()))
}

/// Parse an amount with optional thousands separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    digits.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Upper-case the first letter of every word, lower-case the rest.
///
/// A word starts at any letter not preceded by another letter.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_is_letter = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

fn canonical_city(raw: Option<&str>, aliases: &BTreeMap<String, String>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return UNKNOWN.to_string();
    }
    let titled = title_case(trimmed);
    aliases.get(&titled).cloned().unwrap_or(titled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{INDUSTRY, STARTUP};

    fn rules() -> CleaningRules {
        CleaningRules::default()
    }

    fn legacy_frame() -> DataFrame {
        df!(
            "Date dd/mm/yyyy" => ["01/08/2017", "05/11/2016", "bogus"],
            "Amount in USD" => [Some("1,300,000"), Some("undisclosed"), Some("500,000")],
            " Startup Name " => ["Acme", "Beta", "Gamma"],
            "Industry Vertical" => [Some("Fintech"), None, Some("  ")],
            "City  Location" => ["bangalore", "  new delhi ", "Gurgaon"]
        )
        .unwrap()
    }

    #[test]
    fn renames_legacy_headers_to_the_canonical_set() {
        let mut df = legacy_frame();
        let renamed = DataCleaner::normalize_columns(&mut df, &rules().column_mapping).unwrap();

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(
            names,
            vec![DATE, AMOUNT, STARTUP, INDUSTRY, CITY]
        );
        assert_eq!(renamed, 5);
    }

    #[test]
    fn duplicate_headers_after_normalization_are_rejected() {
        let mut df = df!(
            "Amount in USD" => ["1"],
            "AmountInUSD" => ["2"]
        )
        .unwrap();
        let err = DataCleaner::normalize_columns(&mut df, &rules().column_mapping).unwrap_err();
        assert!(matches!(err, CleanError::DuplicateColumn(name) if name == AMOUNT));
    }

    #[test]
    fn header_bom_and_spaces_are_stripped() {
        let mapping = rules().column_mapping;
        assert_eq!(canonical_header("\u{feff}Date dd/mm/yyyy", &mapping), "Date");
        assert_eq!(canonical_header(" Sub Vertical ", &mapping), "SubVertical");
    }

    #[test]
    fn dates_are_day_first_and_bad_ones_go_missing() {
        assert_eq!(
            parse_day_first_date("01/08/2017"),
            NaiveDate::from_ymd_opt(2017, 8, 1)
        );
        assert_eq!(
            parse_day_first_date("13-04-2015"),
            NaiveDate::from_ymd_opt(2015, 4, 13)
        );
        assert_eq!(
            parse_day_first_date("05/07/15"),
            NaiveDate::from_ymd_opt(2015, 7, 5)
        );
        assert_eq!(
            parse_day_first_date("2016-03-09 10:00"),
            NaiveDate::from_ymd_opt(2016, 3, 9)
        );
        assert_eq!(parse_day_first_date("05/072018"), None);
        assert_eq!(parse_day_first_date("01/07/015"), None);
        assert_eq!(parse_day_first_date("01/01/0999"), None);
        assert_eq!(parse_day_first_date("01/01/12015"), None);
        assert_eq!(parse_day_first_date("31/02/2017"), None);
        assert_eq!(parse_day_first_date(""), None);
    }

    #[test]
    fn parse_dates_derives_year_and_counts_failures() {
        let mut df = legacy_frame();
        DataCleaner::normalize_columns(&mut df, &rules().column_mapping).unwrap();

        let unparsed = DataCleaner::parse_dates(&mut df).unwrap();
        assert_eq!(unparsed, 1);
        assert_eq!(df.column(DATE).unwrap().dtype(), &DataType::Date);

        let years: Vec<Option<i32>> = df.column(YEAR).unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(years, vec![Some(2017), Some(2016), None]);
    }

    #[test]
    fn missing_required_columns_are_fatal() {
        let mut df = df!("AmountInUSD" => ["1"]).unwrap();
        let err = DataCleaner::parse_dates(&mut df).unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn(ref c) if c == DATE));
        assert_eq!(err.to_string(), "Missing 'Date' column.");

        let mut df = df!("Date" => ["01/01/2015"]).unwrap();
        let err = DataCleaner::normalize_amounts(&mut df).unwrap_err();
        assert!(matches!(err, CleanError::MissingColumn(ref c) if c == AMOUNT));
    }

    #[test]
    fn amounts_strip_separators() {
        assert_eq!(parse_amount("1,300,000"), Some(1_300_000.0));
        assert_eq!(parse_amount(" 250 "), Some(250.0));
        assert_eq!(parse_amount("undisclosed"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn unparseable_amounts_take_the_median() {
        let mut df = df!(
            "AmountInUSD" => [Some("100"), Some("n/a"), Some("300"), None, Some("1,000")]
        )
        .unwrap();

        let (imputed, median) = DataCleaner::normalize_amounts(&mut df).unwrap();
        assert_eq!(imputed, 2);
        assert_eq!(median, Some(300.0));

        let amounts: Vec<Option<f64>> = df.column(AMOUNT).unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(
            amounts,
            vec![Some(100.0), Some(300.0), Some(300.0), Some(300.0), Some(1000.0)]
        );
    }

    #[test]
    fn amounts_stay_missing_when_nothing_parses() {
        let mut df = df!("AmountInUSD" => ["x", "y"]).unwrap();
        let (imputed, median) = DataCleaner::normalize_amounts(&mut df).unwrap();
        assert_eq!(imputed, 0);
        assert_eq!(median, None);
        assert_eq!(df.column(AMOUNT).unwrap().null_count(), 2);
    }

    #[test]
    fn missing_industries_become_unknown() {
        let mut df = legacy_frame();
        DataCleaner::normalize_columns(&mut df, &rules().column_mapping).unwrap();

        let filled = DataCleaner::fill_categorical(&mut df, INDUSTRY).unwrap();
        assert_eq!(filled, 2);

        let industries: Vec<Option<&str>> =
            df.column(INDUSTRY).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(
            industries,
            vec![Some("Fintech"), Some(UNKNOWN), Some(UNKNOWN)]
        );
    }

    #[test]
    fn present_industries_are_kept_verbatim() {
        let mut df = df!(INDUSTRY => [Some(" Fintech "), Some(" "), None]).unwrap();
        let filled = DataCleaner::fill_categorical(&mut df, INDUSTRY).unwrap();
        assert_eq!(filled, 2);

        let industries: Vec<Option<&str>> =
            df.column(INDUSTRY).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(
            industries,
            vec![Some(" Fintech "), Some(UNKNOWN), Some(UNKNOWN)]
        );
    }

    #[test]
    fn typo_years_leave_the_year_missing() {
        let mut df = df!(DATE => ["01/07/015", "01/07/2015"]).unwrap();
        let unparsed = DataCleaner::parse_dates(&mut df).unwrap();
        assert_eq!(unparsed, 1);

        let years: Vec<Option<i32>> = df.column(YEAR).unwrap().i32().unwrap().into_iter().collect();
        assert_eq!(years, vec![None, Some(2015)]);
    }

    #[test]
    fn absent_industry_column_is_created() {
        let mut df = df!("Date" => ["01/01/2015", "02/01/2015"]).unwrap();
        let filled = DataCleaner::fill_categorical(&mut df, INDUSTRY).unwrap();
        assert_eq!(filled, 2);
        assert_eq!(df.column(INDUSTRY).unwrap().str().unwrap().get(1), Some(UNKNOWN));
    }

    #[test]
    fn cities_are_title_cased_and_aliased() {
        let mut df = legacy_frame();
        DataCleaner::normalize_columns(&mut df, &rules().column_mapping).unwrap();

        assert!(DataCleaner::normalize_cities(&mut df, &rules().city_aliases).unwrap());
        let cities: Vec<Option<&str>> = df.column(CITY).unwrap().str().unwrap().into_iter().collect();
        assert_eq!(
            cities,
            vec![Some("Bengaluru"), Some("New Delhi"), Some("Gurugram")]
        );
    }

    #[test]
    fn absent_city_column_is_skipped() {
        let mut df = df!("Date" => ["01/01/2015"]).unwrap();
        assert!(!DataCleaner::normalize_cities(&mut df, &rules().city_aliases).unwrap());
        assert!(df.get_column_index(CITY).is_none());
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("NEW DELHI"), "New Delhi");
        assert_eq!(title_case("bangalore/ mumbai"), "Bangalore/ Mumbai");
        assert_eq!(title_case("o'reilly"), "O'Reilly");
    }

    #[test]
    fn clean_reports_every_step() {
        let mut df = legacy_frame();
        let report = DataCleaner::clean(&mut df, &rules()).unwrap();

        assert_eq!(
            report,
            CleaningReport {
                renamed_columns: 5,
                unparsed_dates: 1,
                imputed_amounts: 1,
                amount_median: Some(900_000.0),
                filled_categories: 2,
                has_city: true,
            }
        );
    }
}
