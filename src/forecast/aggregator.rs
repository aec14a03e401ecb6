//! Hourly availability aggregation
//!
//! Normalized sensor events are bucketed per hour and counted by distinct bay
//! id. Short histories (fewer than 24 observed hours) are padded with a
//! synthetic diurnal/weekly pattern around the observed level; longer ones
//! are forward-filled across gaps.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{floor_hour, HourlySeries, NormalizedRecord};

/// Observed hours below which the series is padded with synthetic data.
pub const SPARSE_HOURS_THRESHOLD: usize = 24;
/// Length of the synthetic backbone for sparse histories.
pub const BACKFILL_DAYS: i64 = 3;

const DEFAULT_BASE_LEVEL: f64 = 20.0;
const DEFAULT_STD: f64 = 5.0;
const NOISE_SCALE: f64 = 0.3;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("invalid noise distribution: {0}")]
    Noise(#[from] rand_distr::NormalError),
}

/// Build the hourly availability series for a batch of records.
///
/// Never fails: any internal error yields an empty series and the caller is
/// expected to substitute a demo series.
pub fn aggregate<R: Rng + ?Sized>(
    records: &[NormalizedRecord],
    zone: Option<&str>,
    rng: &mut R,
) -> HourlySeries {
    match try_aggregate(records, zone, rng) {
        Ok(series) => series,
        Err(e) => {
            warn!(error = %e, "aggregation failed, returning empty series");
            HourlySeries::empty()
        }
    }
}

fn try_aggregate<R: Rng + ?Sized>(
    records: &[NormalizedRecord],
    zone: Option<&str>,
    rng: &mut R,
) -> Result<HourlySeries, AggregateError> {
    let usable: Vec<&NormalizedRecord> = records.iter().filter(|r| r.is_usable()).collect();
    let scoped = filter_zone(usable, zone);

    let counts = hourly_distinct_counts(&scoped);
    if counts.is_empty() {
        return Ok(HourlySeries::empty());
    }

    if counts.len() < SPARSE_HOURS_THRESHOLD {
        debug!(observed_hours = counts.len(), "sparse history, synthesizing backbone");
        sparse_backfill(&counts, rng)
    } else {
        debug!(observed_hours = counts.len(), "dense history, forward-filling gaps");
        Ok(forward_fill(&counts))
    }
}

/// Narrow to the requested zone unless that would discard everything.
fn filter_zone<'a>(
    records: Vec<&'a NormalizedRecord>,
    zone: Option<&str>,
) -> Vec<&'a NormalizedRecord> {
    let zone = match zone.filter(|z| !z.is_empty()) {
        Some(zone) => zone,
        None => return records,
    };

    let filtered: Vec<&NormalizedRecord> =
        records.iter().copied().filter(|r| r.zone == zone).collect();
    if filtered.is_empty() {
        debug!(zone, "zone filter matched nothing, keeping all records");
        records
    } else {
        filtered
    }
}

/// Distinct bay ids per hour bucket. Rows with unparseable timestamps are dropped.
pub fn hourly_distinct_counts(records: &[&NormalizedRecord]) -> BTreeMap<DateTime<Utc>, f64> {
    let mut buckets: BTreeMap<DateTime<Utc>, HashSet<&str>> = BTreeMap::new();
    let mut dropped = 0usize;

    for record in records {
        match parse_timestamp(&record.timestamp) {
            Some(ts) => {
                buckets
                    .entry(floor_hour(ts))
                    .or_default()
                    .insert(record.entity_id.as_str());
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped records with unparseable timestamps");
    }

    buckets
        .into_iter()
        .map(|(hour, ids)| (hour, ids.len() as f64))
        .collect()
}

/// Synthesize a contiguous backbone ending at the latest observed hour and
/// overlay the real counts on it.
fn sparse_backfill<R: Rng + ?Sized>(
    counts: &BTreeMap<DateTime<Utc>, f64>,
    rng: &mut R,
) -> Result<HourlySeries, AggregateError> {
    let end = counts
        .keys()
        .next_back()
        .copied()
        .unwrap_or_else(|| floor_hour(Utc::now()));
    let window_start = end - Duration::days(BACKFILL_DAYS);
    // real hours older than the window stretch the backbone so it stays gap-free
    let start = counts
        .keys()
        .next()
        .copied()
        .map_or(window_start, |first| first.min(window_start));

    let (base, std) = if counts.is_empty() {
        (DEFAULT_BASE_LEVEL, DEFAULT_STD)
    } else {
        let std = Statistics::std_dev(counts.values());
        (
            Statistics::mean(counts.values()),
            if std.is_nan() { DEFAULT_STD } else { std },
        )
    };
    let noise = Normal::new(0.0, std * NOISE_SCALE)?;

    let n_hours = (end - start).num_hours() + 1;
    let values = (0..n_hours)
        .map(|i| {
            let hour = start + Duration::hours(i);
            match counts.get(&hour) {
                Some(real) => *real,
                None => synthetic_count(hour, base, noise.sample(rng)),
            }
        })
        .collect();

    Ok(HourlySeries::new(start, values))
}

fn synthetic_count(hour: DateTime<Utc>, base: f64, noise: f64) -> f64 {
    let daily = 0.8 + 0.4 * (2.0 * PI * (hour.hour() as f64 - 6.0) / 24.0).sin();
    let weekly = if hour.weekday().num_days_from_monday() < 5 {
        0.9
    } else {
        1.1
    };
    (base * daily * weekly + noise).trunc().max(1.0)
}

/// Contiguous min..max backbone, gaps carry the last known count forward.
fn forward_fill(counts: &BTreeMap<DateTime<Utc>, f64>) -> HourlySeries {
    let (start, end) = match (counts.keys().next(), counts.keys().next_back()) {
        (Some(s), Some(e)) => (*s, *e),
        _ => return HourlySeries::empty(),
    };

    let n_hours = (end - start).num_hours() + 1;
    let mut last = 0.0;
    let values = (0..n_hours)
        .map(|i| {
            if let Some(v) = counts.get(&(start + Duration::hours(i))) {
                last = *v;
            }
            last
        })
        .collect();

    HourlySeries::new(start, values)
}

/// Lenient timestamp parsing. Offset-less forms are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    // epoch seconds, or milliseconds for anything past the year 5138
    if let Ok(epoch) = s.parse::<i64>() {
        return if epoch.abs() >= 100_000_000_000 {
            Utc.timestamp_millis_opt(epoch).single()
        } else {
            Utc.timestamp_opt(epoch, 0).single()
        };
    }

    None
}
