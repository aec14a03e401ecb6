use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::series::HourlySeries;

/// Which predictor produced a forecast.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display, strum::AsRefStr,
)]
pub enum ModelKind {
    /// Recent mean shaped by a diurnal multiplier
    #[serde(rename = "Simple-Pattern")]
    #[strum(serialize = "Simple-Pattern")]
    SimplePattern,
    /// Random forest trained on calendar + lag features
    #[serde(rename = "RandomForest-ML")]
    #[strum(serialize = "RandomForest-ML")]
    RandomForest,
}

/// Where the history behind a forecast came from.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DataSource {
    /// Aggregated from upstream sensor records (possibly back-filled)
    Live,
    /// Fully generated demo series; upstream gave nothing usable
    Synthetic,
}

/// Raw output of a predictor: one value and bound per future hour.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub model: ModelKind,
    pub values: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Attach timestamps, starting one hour after `last_history`.
    pub fn points(&self, last_history: DateTime<Utc>) -> Vec<ForecastPoint> {
        self.values
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .enumerate()
            .map(|(h, (y, (lo, hi)))| ForecastPoint {
                time: last_history + Duration::hours(h as i64 + 1),
                y: *y,
                lo: *lo,
                hi: *hi,
            })
            .collect()
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub y: f64,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastPoint {
    pub time: DateTime<Utc>,
    pub y: f64,
    pub lo: f64,
    pub hi: f64,
}

/// Recent history window plus whole-series summary statistics.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySummary {
    /// Number of points in `series`
    pub points: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub series: Vec<SeriesPoint>,
}

impl HistorySummary {
    /// Statistics cover the whole series; `series` only the last `window` points.
    pub fn from_series(series: &HourlySeries, window: usize) -> Self {
        let recent: Vec<SeriesPoint> = series
            .tail(window)
            .iter()
            .map(|(time, y)| SeriesPoint { time, y })
            .collect();
        Self {
            points: recent.len(),
            avg: series.mean(),
            min: series.min(),
            max: series.max(),
            series: recent,
        }
    }
}

/// Body of `GET /predict`.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResponse {
    pub ok: bool,
    pub model: ModelKind,
    pub zone: Option<String>,
    pub data_source: DataSource,
    pub history: HistorySummary,
    pub predictions: Vec<ForecastPoint>,
}

impl ForecastResponse {
    pub fn new(
        series: &HourlySeries,
        forecast: &Forecast,
        zone: Option<String>,
        data_source: DataSource,
        history_window: usize,
    ) -> Self {
        let predictions = series
            .last_time()
            .map(|last| forecast.points(last))
            .unwrap_or_default();
        Self {
            ok: true,
            model: forecast.model,
            zone,
            data_source,
            history: HistorySummary::from_series(series, history_window),
            predictions,
        }
    }
}
