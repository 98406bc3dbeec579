//! Charts module - Static chart rendering

pub mod palette;
mod renderer;

pub use renderer::{ChartError, ChartKind, StaticChartRenderer};
