//! Data module - CSV loading and cleaning

mod cleaner;
mod loader;
pub mod schema;

pub use cleaner::{
    canonical_header, parse_amount, parse_day_first_date, title_case, CleanError, CleaningReport,
    DataCleaner,
};
pub use loader::{DataLoadError, DataLoader};
