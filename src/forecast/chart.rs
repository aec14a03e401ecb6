//! Chart presentation model
//!
//! Everything a plotting front-end needs to draw the history/forecast chart;
//! pixel rendering is left to the consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Forecast, ForecastPoint, HourlySeries, ModelKind, SeriesPoint};

/// Padding added above and below the plotted values.
const Y_PADDING: f64 = 5.0;

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub model: ModelKind,
    pub history: Vec<SeriesPoint>,
    pub forecast: Vec<SeriesPoint>,
    /// Confidence band, one entry per forecast point
    pub band: Vec<ForecastPoint>,
    /// Boundary between history and forecast
    pub prediction_start: Option<DateTime<Utc>>,
    pub peak: Option<SeriesPoint>,
    pub low: Option<SeriesPoint>,
    /// `[lower, upper]`
    #[cfg_attr(feature = "swagger", schema(value_type = Vec<f64>))]
    pub y_range: [f64; 2],
}

impl ChartSpec {
    pub fn new(
        series: &HourlySeries,
        forecast: &Forecast,
        zone: Option<&str>,
        history_window: usize,
    ) -> Self {
        let history: Vec<SeriesPoint> = series
            .tail(history_window)
            .iter()
            .map(|(time, y)| SeriesPoint { time, y })
            .collect();
        let prediction_start = series.last_time();
        let band = prediction_start
            .map(|last| forecast.points(last))
            .unwrap_or_default();
        let line: Vec<SeriesPoint> = band
            .iter()
            .map(|p| SeriesPoint { time: p.time, y: p.y })
            .collect();

        let peak = line
            .iter()
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .cloned();
        let low = line
            .iter()
            .min_by(|a, b| a.y.total_cmp(&b.y))
            .cloned();

        let y_range = y_range(history.iter().chain(line.iter()).map(|p| p.y));

        Self {
            title: title(zone),
            model: forecast.model,
            history,
            forecast: line,
            band,
            prediction_start,
            peak,
            low,
            y_range,
        }
    }
}

pub fn title(zone: Option<&str>) -> String {
    format!(
        "Parking Space Availability Prediction ({})",
        zone.unwrap_or("All Zones")
    )
}

fn y_range(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return [0.0, Y_PADDING];
    }
    [(min - Y_PADDING).max(0.0), max + Y_PADDING]
}
