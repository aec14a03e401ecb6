//! Contiguous hourly availability series
//!
//! The series is stored as a start hour plus a dense value vector, so there is
//! no way to represent a gap: the point at index `i` is always `start + i` hours.

use chrono::{DateTime, Duration, DurationRound, Utc};
use statrs::statistics::Statistics;

/// Truncate an instant to the top of its hour.
pub fn floor_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(Duration::hours(1)).unwrap_or(ts)
}

/// Hour-aligned, gap-free sequence of availability counts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HourlySeries {
    start: Option<DateTime<Utc>>,
    values: Vec<f64>,
}

impl HourlySeries {
    /// Build a series whose first point sits at `start` (truncated to the hour).
    pub fn new(start: DateTime<Utc>, values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        Self {
            start: Some(floor_hour(start)),
            values,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Timestamp of the point at `index`. Indices past the end extrapolate hourly.
    pub fn time_at(&self, index: usize) -> Option<DateTime<Utc>> {
        self.start
            .map(|start| start + Duration::hours(index as i64))
    }

    pub fn last_time(&self) -> Option<DateTime<Utc>> {
        self.len().checked_sub(1).and_then(|i| self.time_at(i))
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Iterate `(time, value)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        let start = self.start;
        self.values.iter().enumerate().filter_map(move |(i, v)| {
            start.map(|s| (s + Duration::hours(i as i64), *v))
        })
    }

    /// The last `n` points (or all of them when shorter).
    pub fn tail(&self, n: usize) -> HourlySeries {
        let skip = self.len().saturating_sub(n);
        match self.time_at(skip) {
            Some(start) => HourlySeries::new(start, self.values[skip..].to_vec()),
            None => HourlySeries::empty(),
        }
    }

    /// Arithmetic mean; NaN when empty.
    pub fn mean(&self) -> f64 {
        Statistics::mean(self.values.iter())
    }

    /// Sample standard deviation (n - 1); NaN with fewer than two points.
    pub fn std_dev(&self) -> f64 {
        Statistics::std_dev(self.values.iter())
    }

    pub fn min(&self) -> f64 {
        Statistics::min(self.values.iter())
    }

    pub fn max(&self) -> f64 {
        Statistics::max(self.values.iter())
    }
}
