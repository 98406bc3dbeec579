//! Static Chart Renderer
//! Draws each funding aggregation into an in-memory bitmap with plotters.
//!
//! Charts:
//! 1. Total funding per year: horizontal bars with `$` labels
//! 2. Startups funded per year: two-tone stacked bars with counts on top
//! 3. Top industries by funding: pie with percentages and a legend
//! 4. Average funding per year: line with markers and `$` labels
//! 5. Top cities by funding: horizontal bars, largest on top

use crate::charts::palette::{
    format_usd, format_usd_short, tab20_spread, viridis_spread, FIGURE_BG, GRID, LINE_COLOR,
    LINE_PANEL_BG, PANEL_BG, PIE_COLORS, STACK_BOTTOM, STACK_TOP, TEXT,
};
use crate::stats::{RankedSeries, YearSeries};
use image::RgbImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use thiserror::Error;

type DrawResult = Result<(), Box<dyn StdError>>;
type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Share of each stacked bar drawn in the bottom color.
const STACK_SPLIT: f64 = 0.4;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to draw {chart}: {message}")]
    Draw {
        chart: &'static str,
        message: String,
    },
    #[error("Pixel buffer size mismatch for {0}")]
    Buffer(&'static str),
    #[error("Failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// The fixed set of charts and their output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    FundingPerYear,
    StartupsPerYear,
    IndustryFunding,
    AverageFundingPerYear,
    TopCities,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::FundingPerYear,
        ChartKind::StartupsPerYear,
        ChartKind::IndustryFunding,
        ChartKind::AverageFundingPerYear,
        ChartKind::TopCities,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::FundingPerYear => "funding_per_year.png",
            ChartKind::StartupsPerYear => "stacked_startups_per_year.png",
            ChartKind::IndustryFunding => "industry_funding.png",
            ChartKind::AverageFundingPerYear => "avg_funding_per_year.png",
            ChartKind::TopCities => "top_cities_by_funding.png",
        }
    }

    /// Figure size in inches.
    fn figure_size(self) -> (f64, f64) {
        match self {
            ChartKind::FundingPerYear => (10.0, 8.0),
            ChartKind::StartupsPerYear => (12.0, 6.0),
            ChartKind::IndustryFunding => (10.0, 8.0),
            ChartKind::AverageFundingPerYear => (10.0, 6.0),
            ChartKind::TopCities => (10.0, 8.0),
        }
    }

    /// Pixel dimensions at `dpi`.
    pub fn pixel_size(self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.figure_size();
        ((w * dpi as f64).round() as u32, (h * dpi as f64).round() as u32)
    }
}

/// Renders funding charts at a fixed pixel density.
pub struct StaticChartRenderer {
    dpi: u32,
    top_industries: usize,
    top_cities: usize,
}

impl StaticChartRenderer {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            top_industries: 5,
            top_cities: 10,
        }
    }

    /// Ranking sizes quoted in the industry and city chart titles.
    pub fn with_limits(mut self, top_industries: usize, top_cities: usize) -> Self {
        self.top_industries = top_industries;
        self.top_cities = top_cities;
        self
    }

    pub fn title(&self, kind: ChartKind) -> String {
        match kind {
            ChartKind::FundingPerYear => "Total Funding per Year".to_string(),
            ChartKind::StartupsPerYear => "Number of Startups Funded per Year".to_string(),
            ChartKind::IndustryFunding => {
                format!("Top {} Industries by Funding", self.top_industries)
            }
            ChartKind::AverageFundingPerYear => "Average Funding per Startup per Year".to_string(),
            ChartKind::TopCities => format!("Top {} Cities by Total Funding", self.top_cities),
        }
    }

    pub fn funding_per_year(&self, data: &YearSeries) -> Result<RgbImage, ChartError> {
        let kind = ChartKind::FundingPerYear;
        let n = data.len();
        let bars: Vec<(String, f64, RGBColor)> = data
            .iter()
            .enumerate()
            .map(|(i, (year, total))| (year.to_string(), *total, tab20_spread(i, n)))
            .collect();

        self.render(kind, |root| {
            self.draw_horizontal_bars(root, kind, ("Total Funding (USD)", "Year"), &bars)
        })
    }

    pub fn startups_per_year(&self, data: &YearSeries) -> Result<RgbImage, ChartError> {
        let kind = ChartKind::StartupsPerYear;
        self.render(kind, |root| self.draw_stacked_counts(root, kind, data))
    }

    pub fn industry_funding(&self, data: &RankedSeries) -> Result<RgbImage, ChartError> {
        let kind = ChartKind::IndustryFunding;
        self.render(kind, |root| self.draw_pie(root, kind, data))
    }

    pub fn average_funding_per_year(&self, data: &YearSeries) -> Result<RgbImage, ChartError> {
        let kind = ChartKind::AverageFundingPerYear;
        self.render(kind, |root| self.draw_line(root, kind, data))
    }

    pub fn top_cities(&self, data: &RankedSeries) -> Result<RgbImage, ChartError> {
        let kind = ChartKind::TopCities;
        let n = data.len();
        // Listed bottom-up, so the largest city ends on top.
        let bars: Vec<(String, f64, RGBColor)> = data
            .iter()
            .rev()
            .enumerate()
            .map(|(i, (city, total))| (city.clone(), *total, viridis_spread(i, n, 0.2, 0.8)))
            .collect();

        self.render(kind, |root| {
            self.draw_horizontal_bars(root, kind, ("Total Funding (USD)", "City"), &bars)
        })
    }

    /// Write a rendered chart as PNG.
    pub fn save(image: &RgbImage, path: &Path) -> Result<(), ChartError> {
        image.save(path).map_err(|source| ChartError::Save {
            path: path.to_path_buf(),
            source,
        })
    }

    fn render<F>(&self, kind: ChartKind, draw: F) -> Result<RgbImage, ChartError>
    where
        F: FnOnce(&Canvas<'_>) -> DrawResult,
    {
        let (width, height) = kind.pixel_size(self.dpi);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        let draw_error = |message: String| ChartError::Draw {
            chart: kind.file_name(),
            message,
        };

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw(&root).map_err(|e| draw_error(e.to_string()))?;
            root.present().map_err(|e| draw_error(e.to_string()))?;
        }

        RgbImage::from_raw(width, height, buffer).ok_or(ChartError::Buffer(kind.file_name()))
    }

    /// Bars are listed bottom-up.
    fn draw_horizontal_bars(
        &self,
        root: &Canvas<'_>,
        kind: ChartKind,
        (x_desc, y_desc): (&str, &str),
        bars: &[(String, f64, RGBColor)],
    ) -> DrawResult {
        root.fill(&WHITE)?;
        if bars.is_empty() {
            return self.draw_no_data(root, kind);
        }

        let n = bars.len();
        let max = bars.iter().map(|(_, value, _)| *value).fold(0.0, f64::max);
        // Headroom for the value labels right of each bar.
        let x_max = if max > 0.0 { max * 1.25 } else { 1.0 };

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(kind), self.title_font())
            .margin(self.px(16.0))
            .x_label_area_size(self.px(50.0))
            .y_label_area_size(self.px(110.0))
            .build_cartesian_2d(0f64..x_max, -0.5f64..(n as f64 - 0.5))?;

        chart.plotting_area().fill(&PANEL_BG)?;

        let labels: Vec<&str> = bars.iter().map(|(label, _, _)| label.as_str()).collect();
        let y_formatter = |y: &f64| category_label(&labels, *y);
        let x_formatter = |x: &f64| format_usd_short(*x);
        chart
            .configure_mesh()
            .disable_y_mesh()
            .light_line_style(GRID.mix(0.15).stroke_width(1))
            .bold_line_style(GRID.mix(0.3).stroke_width(1))
            .y_labels(n)
            .y_label_formatter(&y_formatter)
            .x_labels(6)
            .x_label_formatter(&x_formatter)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .label_style(self.font(10.0))
            .axis_desc_style(self.font(12.0))
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, value, color))| {
            let y = i as f64;
            Rectangle::new([(0.0, y - 0.35), (*value, y + 0.35)], color.filled())
        }))?;
        chart.draw_series(bars.iter().enumerate().map(|(i, (_, value, _))| {
            let y = i as f64;
            Rectangle::new(
                [(0.0, y - 0.35), (*value, y + 0.35)],
                WHITE.stroke_width(self.stroke(1.5)),
            )
        }))?;

        let label_style = TextStyle::from(self.font(9.0)).pos(Pos::new(HPos::Left, VPos::Center));
        chart.draw_series(bars.iter().enumerate().map(|(i, (_, value, _))| {
            Text::new(
                format_usd(*value),
                (*value + x_max * 0.01, i as f64),
                label_style.clone(),
            )
        }))?;

        Ok(())
    }

    fn draw_stacked_counts(&self, root: &Canvas<'_>, kind: ChartKind, data: &YearSeries) -> DrawResult {
        root.fill(&FIGURE_BG)?;
        let (Some(first), Some(last)) = (data.keys().next(), data.keys().next_back()) else {
            return self.draw_no_data(root, kind);
        };

        let max = data.values().copied().fold(0.0, f64::max);
        let y_max = if max > 0.0 { max * 1.15 } else { 1.0 };
        let x_range = (*first as f64 - 0.6)..(*last as f64 + 0.6);

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(kind), self.title_font())
            .margin(self.px(16.0))
            .x_label_area_size(self.px(50.0))
            .y_label_area_size(self.px(60.0))
            .build_cartesian_2d(x_range, 0f64..y_max)?;

        let x_formatter = |x: &f64| year_label(*x);
        let y_formatter = |y: &f64| format!("{:.0}", y);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID.mix(0.15).stroke_width(1))
            .bold_line_style(GRID.mix(0.3).stroke_width(1))
            .x_labels(data.len() + 1)
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .x_desc("Year")
            .y_desc("Number of Startups")
            .label_style(self.font(10.0))
            .axis_desc_style(self.font(12.0))
            .draw()?;

        let half_width = 0.4;
        chart.draw_series(data.iter().map(|(year, count)| {
            let x = *year as f64;
            Rectangle::new(
                [(x - half_width, 0.0), (x + half_width, count * STACK_SPLIT)],
                STACK_BOTTOM.filled(),
            )
        }))?;
        chart.draw_series(data.iter().map(|(year, count)| {
            let x = *year as f64;
            Rectangle::new(
                [(x - half_width, count * STACK_SPLIT), (x + half_width, *count)],
                STACK_TOP.filled(),
            )
        }))?;

        let label_style = TextStyle::from(self.font(10.0).style(FontStyle::Bold))
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(data.iter().map(|(year, count)| {
            Text::new(
                format!("{}", count.round() as u64),
                (*year as f64, count + y_max * 0.01),
                label_style.clone(),
            )
        }))?;

        Ok(())
    }

    fn draw_pie(&self, root: &Canvas<'_>, kind: ChartKind, data: &RankedSeries) -> DrawResult {
        root.fill(&WHITE)?;
        let total: f64 = data.iter().map(|(_, value)| value).sum();
        if data.is_empty() || total <= 0.0 {
            return self.draw_no_data(root, kind);
        }

        let area = root.titled(&self.title(kind), self.title_font())?;
        let (width, _) = area.dim_in_pixel();
        let (plot, legend) = area.split_horizontally((width as f64 * 0.62) as i32);

        let (plot_w, plot_h) = plot.dim_in_pixel();
        let center = (plot_w as i32 / 2, plot_h as i32 / 2);
        let radius = plot_w.min(plot_h) as f64 * 0.42;
        let edge = WHITE.stroke_width(self.stroke(1.5));
        let pct_style = TextStyle::from(self.font(11.0)).pos(Pos::new(HPos::Center, VPos::Center));

        // Counter-clockwise from twelve o'clock.
        let mut start = 90.0_f64;
        for (i, (_, value)) in data.iter().enumerate() {
            let sweep = value / total * 360.0;
            let wedge = wedge_points(center, radius, start, sweep);

            plot.draw(&Polygon::new(wedge.clone(), PIE_COLORS[i % PIE_COLORS.len()].filled()))?;
            let mut outline = wedge;
            outline.push(center);
            plot.draw(&PathElement::new(outline, edge))?;

            let mid = (start + sweep / 2.0).to_radians();
            let label_at = (
                center.0 + (radius * 0.6 * mid.cos()).round() as i32,
                center.1 - (radius * 0.6 * mid.sin()).round() as i32,
            );
            plot.draw(&Text::new(
                format!("{:.1}%", value / total * 100.0),
                label_at,
                pct_style.clone(),
            ))?;

            start += sweep;
        }

        let (_, legend_h) = legend.dim_in_pixel();
        let swatch = self.px(14.0);
        let row = self.px(26.0);
        let top = legend_h as i32 / 2 - row * data.len() as i32 / 2;
        let legend_style = TextStyle::from(self.font(10.0)).pos(Pos::new(HPos::Left, VPos::Center));
        for (i, (label, _)) in data.iter().enumerate() {
            let y = top + row * i as i32;
            legend.draw(&Rectangle::new(
                [(0, y - swatch / 2), (swatch, y + swatch / 2)],
                PIE_COLORS[i % PIE_COLORS.len()].filled(),
            ))?;
            legend.draw(&Text::new(
                label.clone(),
                (swatch + self.px(8.0), y),
                legend_style.clone(),
            ))?;
        }

        Ok(())
    }

    fn draw_line(&self, root: &Canvas<'_>, kind: ChartKind, data: &YearSeries) -> DrawResult {
        root.fill(&WHITE)?;
        let (Some(first), Some(last)) = (data.keys().next(), data.keys().next_back()) else {
            return self.draw_no_data(root, kind);
        };

        let max = data.values().copied().fold(0.0, f64::max);
        let y_max = if max > 0.0 { max * 1.15 } else { 1.0 };
        let x_range = (*first as f64 - 0.5)..(*last as f64 + 0.5);

        let mut chart = ChartBuilder::on(root)
            .caption(self.title(kind), self.title_font())
            .margin(self.px(16.0))
            .x_label_area_size(self.px(50.0))
            .y_label_area_size(self.px(80.0))
            .build_cartesian_2d(x_range, 0f64..y_max)?;

        chart.plotting_area().fill(&LINE_PANEL_BG)?;

        let x_formatter = |x: &f64| year_label(*x);
        let y_formatter = |y: &f64| format_usd_short(*y);
        chart
            .configure_mesh()
            .light_line_style(GRID.mix(0.2).stroke_width(1))
            .bold_line_style(GRID.mix(0.4).stroke_width(1))
            .x_labels(data.len() + 1)
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .x_desc("Year")
            .y_desc("Average Funding (USD)")
            .label_style(self.font(10.0))
            .axis_desc_style(self.font(12.0))
            .draw()?;

        let points: Vec<(f64, f64)> = data.iter().map(|(year, avg)| (*year as f64, *avg)).collect();
        chart.draw_series(LineSeries::new(
            points.iter().copied(),
            LINE_COLOR.stroke_width(self.stroke(2.5)),
        ))?;
        chart.draw_series(
            points
                .iter()
                .map(|point| Circle::new(*point, self.px(4.0), LINE_COLOR.filled())),
        )?;

        let label_style = TextStyle::from(self.font(9.0)).pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(points.iter().map(|(x, y)| {
            Text::new(format_usd(*y), (*x, y + max * 0.015), label_style.clone())
        }))?;

        Ok(())
    }

    fn draw_no_data(&self, root: &Canvas<'_>, kind: ChartKind) -> DrawResult {
        let area = root.titled(&self.title(kind), self.title_font())?;
        let (w, h) = area.dim_in_pixel();
        let style = TextStyle::from(self.font(12.0).color(&TEXT)).pos(Pos::new(HPos::Center, VPos::Center));
        area.draw(&Text::new("No data available", (w as i32 / 2, h as i32 / 2), style))?;
        Ok(())
    }

    /// Font at a point size, scaled to the pixel density.
    fn font(&self, points: f64) -> FontDesc<'static> {
        ("sans-serif", points * self.dpi as f64 / 72.0).into_font()
    }

    fn title_font(&self) -> FontDesc<'static> {
        self.font(14.0).style(FontStyle::Bold)
    }

    /// Layout length given at 100 dpi, scaled.
    fn px(&self, length: f64) -> i32 {
        (length * self.dpi as f64 / 100.0).round().max(1.0) as i32
    }

    fn stroke(&self, width: f64) -> u32 {
        self.px(width) as u32
    }
}

/// Polygon for a pie wedge; angles in degrees, counter-clockwise.
fn wedge_points(center: (i32, i32), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = (sweep.abs().ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for step in 0..=steps {
        let angle = (start + sweep * step as f64 / steps as f64).to_radians();
        points.push((
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 - (radius * angle.sin()).round() as i32,
        ));
    }
    points
}

/// Label for an integer tick on a category axis; blank between categories.
fn category_label(labels: &[&str], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels
        .get(index as usize)
        .map(|label| label.to_string())
        .unwrap_or_default()
}

fn year_label(position: f64) -> String {
    let year = position.round();
    if (position - year).abs() > 1e-6 {
        String::new()
    } else {
        format!("{}", year as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Plotters needs a system font to draw text.
    fn fonts_available() -> bool {
        ("sans-serif", 12.0).into_font().box_size("0").is_ok()
    }

    #[test]
    fn file_names_are_fixed() {
        let names: Vec<&str> = ChartKind::ALL.iter().map(|kind| kind.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "funding_per_year.png",
                "stacked_startups_per_year.png",
                "industry_funding.png",
                "avg_funding_per_year.png",
                "top_cities_by_funding.png",
            ]
        );
    }

    #[test]
    fn pixel_size_follows_dpi() {
        assert_eq!(ChartKind::FundingPerYear.pixel_size(100), (1000, 800));
        assert_eq!(ChartKind::StartupsPerYear.pixel_size(50), (600, 300));
    }

    #[test]
    fn ranked_titles_follow_the_configured_limits() {
        let renderer = StaticChartRenderer::new(100);
        assert_eq!(
            renderer.title(ChartKind::IndustryFunding),
            "Top 5 Industries by Funding"
        );
        assert_eq!(
            renderer.title(ChartKind::TopCities),
            "Top 10 Cities by Total Funding"
        );

        let renderer = renderer.with_limits(3, 7);
        assert_eq!(
            renderer.title(ChartKind::IndustryFunding),
            "Top 3 Industries by Funding"
        );
        assert_eq!(
            renderer.title(ChartKind::TopCities),
            "Top 7 Cities by Total Funding"
        );
        assert_eq!(
            renderer.title(ChartKind::FundingPerYear),
            "Total Funding per Year"
        );
    }

    #[test]
    fn category_labels_only_on_integer_ticks() {
        let labels = ["2015", "2016"];
        assert_eq!(category_label(&labels, 0.0), "2015");
        assert_eq!(category_label(&labels, 1.0), "2016");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
        assert_eq!(year_label(2016.0), "2016");
        assert_eq!(year_label(2016.5), "");
    }

    #[test]
    fn wedge_starts_and_ends_on_the_rim() {
        let points = wedge_points((100, 100), 50.0, 90.0, 90.0);
        assert_eq!(points.first(), Some(&(100, 100)));
        assert_eq!(points[1], (100, 50));
        assert_eq!(points.last(), Some(&(50, 100)));
    }

    #[test]
    fn renders_every_chart_at_the_requested_size() {
        if !fonts_available() {
            eprintln!("skipping: no system font for plotters");
            return;
        }

        let renderer = StaticChartRenderer::new(40);
        let years: YearSeries = BTreeMap::from([(2015, 300.0), (2016, 300.0)]);
        let ranked: RankedSeries = vec![("Fintech".into(), 400.0), ("Ecommerce".into(), 200.0)];

        let images = [
            (ChartKind::FundingPerYear, renderer.funding_per_year(&years).unwrap()),
            (ChartKind::StartupsPerYear, renderer.startups_per_year(&years).unwrap()),
            (ChartKind::IndustryFunding, renderer.industry_funding(&ranked).unwrap()),
            (
                ChartKind::AverageFundingPerYear,
                renderer.average_funding_per_year(&years).unwrap(),
            ),
            (ChartKind::TopCities, renderer.top_cities(&ranked).unwrap()),
        ];

        for (kind, image) in images {
            assert_eq!(image.dimensions(), kind.pixel_size(40), "{kind:?}");
            // Something other than the background was drawn.
            let first = *image.get_pixel(0, 0);
            assert!(image.pixels().any(|pixel| *pixel != first), "{kind:?}");
        }
    }

    #[test]
    fn empty_series_render_a_placeholder() {
        if !fonts_available() {
            eprintln!("skipping: no system font for plotters");
            return;
        }

        let renderer = StaticChartRenderer::new(40);
        let image = renderer.funding_per_year(&YearSeries::new()).unwrap();
        assert_eq!(image.dimensions(), ChartKind::FundingPerYear.pixel_size(40));
        assert!(renderer.industry_funding(&Vec::new()).is_ok());
    }
}
