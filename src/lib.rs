//! Funding Charts - Startup funding CSV cleaning & static chart generation
//!
//! Loads a funding CSV, normalizes headers and values, aggregates funding by
//! year, industry and city, and renders a fixed set of PNG charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;
