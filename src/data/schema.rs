//! Canonical column names and the default lookup tables.

/// Parsed funding date.
pub const DATE: &str = "Date";
/// Funding amount in USD.
pub const AMOUNT: &str = "AmountInUSD";
pub const STARTUP: &str = "StartupName";
pub const INDUSTRY: &str = "IndustryVertical";
pub const CITY: &str = "CityLocation";
/// Derived from `Date` during cleaning.
pub const YEAR: &str = "Year";

/// Placeholder for missing categorical values.
pub const UNKNOWN: &str = "Unknown";

/// Legacy header → canonical header.
pub const LEGACY_COLUMN_NAMES: [(&str, &str); 4] = [
    ("Date dd/mm/yyyy", DATE),
    ("Amount in USD", AMOUNT),
    ("Startup Name", STARTUP),
    ("Industry Vertical", INDUSTRY),
];

/// Title-cased city name → canonical city name.
pub const CITY_ALIASES: [(&str, &str); 5] = [
    ("Delhi", "New Delhi"),
    ("Bangalore", "Bengaluru"),
    ("Mumbai", "Mumbai"),
    ("Gurgaon", "Gurugram"),
    ("Hyderabad", "Hyderabad"),
];

/// Columns that must exist after header normalization.
pub const REQUIRED_COLUMNS: [&str; 2] = [DATE, AMOUNT];
