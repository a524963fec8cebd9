//! Series transforms over the forecast response.
//!
//! Pure helpers the presentation layer feeds into its charts: a trailing
//! moving average over the demand series and a fixed-bin demand histogram.

use chrono::NaiveDate;

use crate::models::forecast::ForecastPoint;

/// Window used by the dashboard's smoothed demand line.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

const HISTOGRAM_BINS: usize = 5;

/// A forecast point annotated with its trailing moving average.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedPoint {
    pub date: NaiveDate,
    pub demand: f64,
    pub moving_avg: f64,
}

/// Trailing moving average over the demand series.
///
/// The window grows from 1 at the start of the series up to `window`, so
/// early points average whatever history exists. Averages are rounded to
/// the nearest whole unit of demand.
pub fn with_moving_average(points: &[ForecastPoint], window: usize) -> Vec<SmoothedPoint> {
    let window = window.max(1);

    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let start = (index + 1).saturating_sub(window);
            let slice = &points[start..=index];
            let average = slice.iter().map(|p| p.demand).sum::<f64>() / slice.len() as f64;

            SmoothedPoint {
                date: point.date,
                demand: point.demand,
                moving_avg: average.round(),
            }
        })
        .collect()
}

/// A half-open demand range and how many forecast days fall into it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub range: String,
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Bucket the demand series into five equal-width bins.
///
/// Bin width is `ceil((max - min) / 5)`, floored at 1. Bins count over
/// `[start, end)`, so a value sitting exactly on the top edge of the last
/// bin is not counted.
pub fn demand_histogram(points: &[ForecastPoint]) -> Vec<HistogramBin> {
    if points.is_empty() {
        return Vec::new();
    }

    let demands: Vec<f64> = points.iter().map(|p| p.demand).collect();
    let min = demands.iter().copied().fold(f64::INFINITY, f64::min);
    let max = demands.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let bin_size = ((max - min) / HISTOGRAM_BINS as f64).ceil().max(1.0);

    (0..HISTOGRAM_BINS)
        .map(|i| {
            let start = min + i as f64 * bin_size;
            let end = start + bin_size;
            let count = demands.iter().filter(|&&d| d >= start && d < end).count();

            HistogramBin {
                range: format!("{start}-{end}"),
                start,
                end,
                count,
            }
        })
        .collect()
}
