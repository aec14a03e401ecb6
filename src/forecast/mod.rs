//! Availability forecasting pipeline
//!
//! Records are aggregated into an hourly series, turned into feature rows and
//! forecast by the engine; the service ties the stages together.

pub mod aggregator;
pub mod chart;
pub mod engine;
pub mod fallback;
pub mod features;
pub mod service;

pub use aggregator::aggregate;
pub use chart::ChartSpec;
pub use engine::{EngineSettings, ForecastEngine, ForecastError};
pub use features::{build_features, next_step_features, FeatureRow};
pub use service::{ForecastRun, ForecastService};
