//! Degraded-mode generators
//!
//! Used when upstream yields nothing usable (demo series) and when the
//! random forest is unavailable or the history is too short (Simple-Pattern).

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

use crate::domain::{floor_hour, Forecast, HourlySeries, ModelKind};

/// Days of hourly history in the demo series.
pub const DEMO_DAYS: i64 = 7;
const DEMO_LEVEL: f64 = 30.0;
const DEMO_DAILY_AMPLITUDE: f64 = 15.0;
const DEMO_WEEKLY_AMPLITUDE: f64 = 5.0;
const DEMO_NOISE_STD: f64 = 3.0;
const DEMO_FLOOR: f64 = 5.0;

/// Points of recent history the Simple-Pattern level is taken from.
pub const PATTERN_WINDOW: usize = 24;
const PATTERN_NOISE_SCALE: f64 = 0.1;

/// Hourly demo series from midnight `DEMO_DAYS` ago up to the current hour.
pub fn demo_series<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> HourlySeries {
    let end = floor_hour(now);
    let midnight = end - Duration::hours(i64::from(end.hour()));
    let start = midnight - Duration::days(DEMO_DAYS);
    let n_hours = (end - start).num_hours() + 1;

    let values = (0..n_hours)
        .map(|idx| {
            let idx = idx as f64;
            let daily = DEMO_DAILY_AMPLITUDE * (2.0 * PI * idx / 24.0 - PI / 2.0).sin();
            let weekly = DEMO_WEEKLY_AMPLITUDE * (2.0 * PI * idx / 168.0).sin();
            let z: f64 = StandardNormal.sample(rng);
            let noise = z * DEMO_NOISE_STD;
            (DEMO_LEVEL + daily + weekly + noise).max(DEMO_FLOOR)
        })
        .collect();

    HourlySeries::new(start, values)
}

/// Recent level shaped by a diurnal multiplier, with ±20% bounds.
pub fn simple_pattern<R: Rng + ?Sized>(
    series: &HourlySeries,
    horizon: usize,
    rng: &mut R,
) -> Forecast {
    let recent = series.tail(PATTERN_WINDOW);
    let mean = if recent.is_empty() { 0.0 } else { recent.mean() };
    let std = match recent.std_dev() {
        s if s.is_nan() => 1.0,
        s => s,
    };

    let values: Vec<f64> = (0..horizon)
        .map(|h| {
            let hour_factor = 0.9 + 0.2 * (2.0 * PI * h as f64 / 24.0).sin();
            let z: f64 = StandardNormal.sample(rng);
            let noise = z * std * PATTERN_NOISE_SCALE;
            (mean * hour_factor + noise).max(0.0)
        })
        .collect();

    Forecast {
        model: ModelKind::SimplePattern,
        lower: values.iter().map(|y| y * 0.8).collect(),
        upper: values.iter().map(|y| y * 1.2).collect(),
        values,
    }
}
