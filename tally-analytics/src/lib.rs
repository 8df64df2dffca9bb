//! tally-analytics: report building over validated expenses and chart rendering

pub mod chart;
pub mod report;

pub use chart::{ChartError, ChartImage, ChartRenderer, SvgChartRenderer};
pub use report::Report;
