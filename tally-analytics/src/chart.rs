//! Chart rendering for category, monthly and daily series.
//!
//! Charts are drawn as SVG with plotters. The drawing area borrows the output
//! buffer, so it is confined to [`render_svg`] and always dropped before the
//! buffer is handed back, whether drawing succeeded or not.

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use tally_core::{format_currency, DEFAULT_SYMBOL};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("nothing to plot")]
    Empty,

    #[error("cannot draw a negative slice for {0}")]
    NegativeSlice(String),

    #[error("chart backend error: {0}")]
    Backend(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Backend(err.to_string())
    }
}

/// An encoded chart ready to hand to a transport or write to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: &'static str,
}

impl ChartImage {
    fn svg(name: &str, svg: String) -> Self {
        Self {
            bytes: svg.into_bytes(),
            file_name: format!("{name}.svg"),
            mime: "image/svg+xml",
        }
    }
}

/// Turns aggregated series into images.
pub trait ChartRenderer: Send + Sync {
    /// Pie of already-reduced `(category, total)` slices.
    fn category_chart(&self, slices: &[(String, f64)]) -> Result<ChartImage, ChartError>;

    /// Line over `(YYYY-MM, total)` points in the given order.
    fn monthly_chart(&self, months: &[(String, f64)]) -> Result<ChartImage, ChartError>;

    /// Bars per expense, plotted by date.
    fn daily_chart(&self, days: &[(NaiveDate, f64)]) -> Result<ChartImage, ChartError>;
}

const PALETTE: [RGBColor; 6] = [
    RGBColor(0x2e, 0xcc, 0x71),
    RGBColor(0x34, 0x98, 0xdb),
    RGBColor(0xe7, 0x4c, 0x3c),
    RGBColor(0xf3, 0x9c, 0x12),
    RGBColor(0x9b, 0x59, 0xb6),
    RGBColor(0x95, 0xa5, 0xa6),
];

const LINE: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const BAR: RGBColor = RGBColor(0xe6, 0x7e, 0x22);

pub struct SvgChartRenderer {
    symbol: String,
    width: u32,
    height: u32,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL)
    }
}

impl SvgChartRenderer {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            width: 1000,
            height: 700,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn category_chart(&self, slices: &[(String, f64)]) -> Result<ChartImage, ChartError> {
        if let Some((label, _)) = slices.iter().find(|(_, v)| *v < 0.0) {
            return Err(ChartError::NegativeSlice(label.clone()));
        }
        if slices.iter().map(|(_, v)| v).sum::<f64>() <= 0.0 {
            return Err(ChartError::Empty);
        }

        let labels: Vec<String> = slices.iter().map(|(c, _)| c.clone()).collect();
        let sizes: Vec<f64> = slices.iter().map(|(_, v)| *v).collect();
        let colors: Vec<RGBColor> = (0..sizes.len()).map(|i| PALETTE[i % PALETTE.len()]).collect();

        let svg = render_svg(self.size(), |root| {
            let area = root.titled("Expense Distribution by Category", ("sans-serif", 28))?;
            let (w, h) = area.dim_in_pixel();
            let center = ((w / 2) as i32, (h / 2) as i32);
            let radius = f64::from(w.min(h)) * 0.35;

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
            pie.percentages(("sans-serif", 15).into_font().color(&WHITE));
            area.draw(&pie)?;
            Ok(())
        })?;

        debug!(slices = slices.len(), "rendered category chart");
        Ok(ChartImage::svg("category_distribution", svg))
    }

    fn monthly_chart(&self, months: &[(String, f64)]) -> Result<ChartImage, ChartError> {
        if months.is_empty() {
            return Err(ChartError::Empty);
        }

        let labels: Vec<&str> = months.iter().map(|(m, _)| m.as_str()).collect();
        let values: Vec<f64> = months.iter().map(|(_, v)| *v).collect();
        let (y_min, y_max) = value_range(&values);
        let symbol = self.symbol.as_str();

        let svg = render_svg(self.size(), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Monthly Expense Trends", ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(100)
                .build_cartesian_2d((0..values.len()).into_segmented(), y_min..y_max)?;

            chart
                .configure_mesh()
                .x_labels(values.len())
                .x_label_formatter(&|x: &SegmentValue<usize>| segment_label(x, &labels))
                .y_label_formatter(&|y: &f64| format_currency(*y, symbol))
                .x_desc("Month")
                .y_desc(format!("Amount ({symbol})"))
                .draw()?;

            let points = values
                .iter()
                .enumerate()
                .map(|(i, v)| (SegmentValue::CenterOf(i), *v));
            chart.draw_series(LineSeries::new(points.clone(), LINE.stroke_width(2)))?;
            chart.draw_series(points.map(|p| Circle::new(p, 5, LINE.filled())))?;
            Ok(())
        })?;

        debug!(months = months.len(), "rendered monthly chart");
        Ok(ChartImage::svg("monthly_trend", svg))
    }

    fn daily_chart(&self, days: &[(NaiveDate, f64)]) -> Result<ChartImage, ChartError> {
        if days.is_empty() {
            return Err(ChartError::Empty);
        }

        let mut days = days.to_vec();
        days.sort_by_key(|(d, _)| *d);
        let labels: Vec<String> = days.iter().map(|(d, _)| d.format("%d %b %Y").to_string()).collect();
        let values: Vec<f64> = days.iter().map(|(_, v)| *v).collect();
        let (y_min, y_max) = value_range(&values);
        let total: f64 = values.iter().sum();
        let symbol = self.symbol.as_str();

        let svg = render_svg(self.size(), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Daily Expenses Overview", ("sans-serif", 28))
                .margin(20)
                .x_label_area_size(60)
                .y_label_area_size(100)
                .build_cartesian_2d((0..values.len()).into_segmented(), y_min..y_max)?;

            chart
                .configure_mesh()
                .x_labels(values.len().min(10))
                .x_label_formatter(&|x: &SegmentValue<usize>| segment_label(x, &labels))
                .y_label_formatter(&|y: &f64| format_currency(*y, symbol))
                .x_desc("Date")
                .y_desc(format!("Amount ({symbol})"))
                .draw()?;

            chart.draw_series(values.iter().enumerate().map(|(i, v)| {
                Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                    BAR.mix(0.7).filled(),
                )
            }))?;

            root.draw(&Text::new(
                format!("Total: {}", format_currency(total, symbol)),
                (30, 50),
                ("sans-serif", 18).into_font(),
            ))?;
            Ok(())
        })?;

        debug!(days = days.len(), "rendered daily chart");
        Ok(ChartImage::svg("daily_expenses", svg))
    }
}

/// Draw into an in-memory SVG document.
fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String, ChartError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<(), ChartError>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

fn segment_label<L: AsRef<str>>(x: &SegmentValue<usize>, labels: &[L]) -> String {
    match x {
        SegmentValue::CenterOf(i) => labels.get(*i).map(|l| l.as_ref().to_string()),
        _ => None,
    }
    .unwrap_or_default()
}

/// Y range that always contains zero, padded above the largest magnitude.
fn value_range(values: &[f64]) -> (f64, f64) {
    let max = values.iter().copied().fold(0.0, f64::max);
    let min = values.iter().copied().fold(0.0, f64::min);
    if max == min {
        return (0.0, 1.0);
    }
    let pad = (max - min) * 0.1;
    (if min < 0.0 { min - pad } else { 0.0 }, max + pad)
}
