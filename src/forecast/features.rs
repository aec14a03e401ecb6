//! Feature engineering for availability forecasting
//!
//! Each hour becomes a row of calendar features plus lagged counts. The same
//! row layout is used for training and for the recursive forecast loop.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::HourlySeries;

/// Lags (in hours) fed to the model, in feature order.
pub const LAGS: [usize; 6] = [1, 2, 3, 6, 12, 24];

/// Total number of features per row.
pub const FEATURE_COUNT: usize = 3 + LAGS.len();

/// One supervised-learning row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Hour of day (0-23)
    pub hour_of_day: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: u32,
    /// Saturday or Sunday
    pub is_weekend: bool,
    /// Values at `LAGS` hours before this point
    pub lags: [f64; 6],
}

impl FeatureRow {
    /// Row for `timestamp` with the given lag values.
    pub fn new(timestamp: DateTime<Utc>, lags: [f64; 6]) -> Self {
        let day_of_week = timestamp.weekday().num_days_from_monday();
        Self {
            hour_of_day: timestamp.hour(),
            day_of_week,
            is_weekend: day_of_week >= 5,
            lags,
        }
    }

    /// Flatten into the model's input order.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(FEATURE_COUNT);
        out.push(self.hour_of_day as f64);
        out.push(self.day_of_week as f64);
        out.push(if self.is_weekend { 1.0 } else { 0.0 });
        out.extend_from_slice(&self.lags);
        out
    }

    pub fn feature_names() -> Vec<String> {
        let mut names = vec![
            "hour_of_day".to_string(),
            "day_of_week".to_string(),
            "is_weekend".to_string(),
        ];
        names.extend(LAGS.iter().map(|lag| format!("lag_{lag}")));
        names
    }
}

/// One row per series point plus the matching targets.
///
/// Lags that reach before the start of the series reuse the first value.
pub fn build_features(series: &HourlySeries) -> (Vec<FeatureRow>, Vec<f64>) {
    let values = series.values();
    let first = values.first().copied().unwrap_or_default();

    series
        .iter()
        .enumerate()
        .map(|(i, (time, target))| {
            let lags = LAGS.map(|lag| if i >= lag { values[i - lag] } else { first });
            (FeatureRow::new(time, lags), target)
        })
        .unzip()
}

/// Row for the hour after the end of `buffer`.
///
/// Lags are read from the tail of the buffer; a lag longer than the buffer
/// falls back to its last value.
pub fn next_step_features(buffer: &[f64], next_time: DateTime<Utc>) -> FeatureRow {
    let last = buffer.last().copied().unwrap_or_default();
    let lags = LAGS.map(|lag| {
        if buffer.len() >= lag {
            buffer[buffer.len() - lag]
        } else {
            last
        }
    });
    FeatureRow::new(next_time, lags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn saturday_midnight() -> DateTime<Utc> {
        // 2024-06-01 was a Saturday
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_calendar_features() {
        let row = FeatureRow::new(saturday_midnight() + Duration::hours(13), [0.0; 6]);
        assert_eq!(row.hour_of_day, 13);
        assert_eq!(row.day_of_week, 5);
        assert!(row.is_weekend);

        let monday = FeatureRow::new(saturday_midnight() + Duration::days(2), [0.0; 6]);
        assert_eq!(monday.day_of_week, 0);
        assert!(!monday.is_weekend);
    }

    #[test]
    fn test_to_vec_layout() {
        let row = FeatureRow::new(
            saturday_midnight() + Duration::hours(7),
            [1.0, 2.0, 3.0, 6.0, 12.0, 24.0],
        );
        assert_eq!(
            row.to_vec(),
            vec![7.0, 5.0, 1.0, 1.0, 2.0, 3.0, 6.0, 12.0, 24.0]
        );
        assert_eq!(FeatureRow::feature_names().len(), FEATURE_COUNT);
        assert_eq!(FeatureRow::feature_names()[8], "lag_24");
    }

    #[test]
    fn test_build_features_lags() {
        let values: Vec<f64> = (0..30).map(|v| v as f64 + 100.0).collect();
        let series = HourlySeries::new(saturday_midnight(), values);
        let (rows, targets) = build_features(&series);

        assert_eq!(rows.len(), 30);
        assert_eq!(targets.len(), 30);
        assert_eq!(targets[29], 129.0);

        // first row: every lag reuses the first value
        assert_eq!(rows[0].lags, [100.0; 6]);
        // row 4: lags 1..3 are real, 6..24 fall back
        assert_eq!(rows[4].lags, [103.0, 102.0, 101.0, 100.0, 100.0, 100.0]);
        // row 25: all lags available
        assert_eq!(rows[25].lags, [124.0, 123.0, 122.0, 119.0, 113.0, 101.0]);
        assert_eq!(rows[25].hour_of_day, 1);
        assert_eq!(rows[25].day_of_week, 6);
    }

    #[test]
    fn test_build_features_empty() {
        let (rows, targets) = build_features(&HourlySeries::empty());
        assert!(rows.is_empty());
        assert!(targets.is_empty());
    }

    #[test]
    fn test_next_step_features() {
        let buffer: Vec<f64> = (1..=30).map(|v| v as f64).collect();
        let row = next_step_features(&buffer, saturday_midnight());
        assert_eq!(row.lags, [30.0, 29.0, 28.0, 25.0, 19.0, 7.0]);

        let short = next_step_features(&[4.0, 5.0], saturday_midnight());
        assert_eq!(short.lags, [5.0, 4.0, 5.0, 5.0, 5.0, 5.0]);
    }
}
