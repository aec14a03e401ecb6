//! Hourly parking bay availability: upstream ingestion, series aggregation
//! and forecasting, served over HTTP.

pub mod api;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod ingest;
pub mod ml;
pub mod telemetry;
