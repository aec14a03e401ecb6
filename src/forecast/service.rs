//! Forecast service
//!
//! One request = fetch, normalize, aggregate, forecast. Every stage degrades
//! instead of failing: no records gives the demo series, a model failure gives
//! the Simple-Pattern forecast.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{info, warn};

use super::aggregator::aggregate;
use super::chart::ChartSpec;
use super::engine::{EngineSettings, ForecastEngine};
use super::fallback::{demo_series, simple_pattern};
use crate::config::Config;
use crate::domain::{DataSource, Forecast, ForecastResponse, HourlySeries};
use crate::ingest::{normalize_batch, RecordSource};

/// Intermediate result shared by the JSON and chart outputs.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub zone: Option<String>,
    pub series: HourlySeries,
    pub forecast: Forecast,
    pub data_source: DataSource,
}

pub struct ForecastService {
    source: Arc<dyn RecordSource>,
    engine: Arc<ForecastEngine>,
    max_records: usize,
    history_window: usize,
    default_horizon: usize,
    seed: Option<u64>,
}

impl ForecastService {
    pub fn new(source: Arc<dyn RecordSource>, cfg: &Config) -> Self {
        Self {
            source,
            engine: Arc::new(ForecastEngine::new(EngineSettings::from(&cfg.forecast))),
            max_records: cfg.upstream.max_records,
            history_window: cfg.forecast.history_window_hours,
            default_horizon: cfg.forecast.default_horizon_hours as usize,
            seed: cfg.forecast.seed,
        }
    }

    pub fn default_horizon(&self) -> usize {
        self.default_horizon
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub async fn run(&self, zone: Option<&str>, hours: usize) -> ForecastRun {
        let zone = zone.map(str::trim).filter(|z| !z.is_empty());

        let raw = self.source.fetch(zone, self.max_records).await;
        let records = normalize_batch(&raw);

        let mut rng = self.rng();
        let series = aggregate(&records, zone, &mut rng);

        let (series, data_source) = if series.is_empty() {
            warn!(
                raw = raw.len(),
                normalized = records.len(),
                "no usable history, using demo series"
            );
            (demo_series(Utc::now(), &mut rng), DataSource::Synthetic)
        } else {
            (series, DataSource::Live)
        };

        let forecast = self.forecast_blocking(&series, hours).await;

        info!(
            zone = zone.unwrap_or(""),
            history = series.len(),
            horizon = hours,
            model = %forecast.model,
            data_source = %data_source,
            "forecast ready"
        );

        ForecastRun {
            zone: zone.map(str::to_string),
            series,
            forecast,
            data_source,
        }
    }

    /// Runs the engine on the blocking pool; model training is CPU-bound.
    async fn forecast_blocking(&self, series: &HourlySeries, hours: usize) -> Forecast {
        let engine = Arc::clone(&self.engine);
        let work = series.clone();
        let mut rng = self.rng();

        let joined = tokio::task::spawn_blocking(move || {
            match engine.forecast(&work, hours, &mut rng) {
                Ok(forecast) => forecast,
                Err(e) => {
                    warn!(error = %e, "forecast failed, using simple pattern");
                    simple_pattern(&work, hours, &mut rng)
                }
            }
        })
        .await;

        match joined {
            Ok(forecast) => forecast,
            Err(e) => {
                warn!(error = %e, "forecast task aborted, using simple pattern");
                simple_pattern(series, hours, &mut self.rng())
            }
        }
    }

    pub async fn predict(&self, zone: Option<&str>, hours: usize) -> ForecastResponse {
        let run = self.run(zone, hours).await;
        ForecastResponse::new(
            &run.series,
            &run.forecast,
            run.zone,
            run.data_source,
            self.history_window,
        )
    }

    pub async fn chart(&self, zone: Option<&str>, hours: usize) -> ChartSpec {
        let run = self.run(zone, hours).await;
        ChartSpec::new(
            &run.series,
            &run.forecast,
            run.zone.as_deref(),
            self.history_window,
        )
    }
}
