//! Forecast engine
//!
//! Short histories get the Simple-Pattern heuristic. Longer ones train a
//! random forest on calendar + lag features and roll it forward one hour at a
//! time, feeding each prediction back in as the newest lag.

use chrono::Duration;
use rand::Rng;
use thiserror::Error;
use tracing::info;

use super::fallback;
use super::features::{next_step_features, FeatureRow};
use crate::config::ForecastConfig;
use crate::domain::{Forecast, HourlySeries, ModelKind};
use crate::ml::{FeatureVector, MLModel};

/// z-score of a two-sided 90% interval.
const Z_90: f64 = 1.645;
/// Share of the historical spread used for the interval half-width.
const INTERVAL_SPREAD: f64 = 0.3;
const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("cannot forecast an empty series")]
    EmptySeries,

    #[error("model training failed: {0}")]
    Training(String),

    #[error("prediction failed: {0}")]
    Prediction(String),
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Shortest history that trains the random forest
    pub min_ml_history: usize,
    pub train_ratio: f64,
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&ForecastConfig::default())
    }
}

impl From<&ForecastConfig> for EngineSettings {
    fn from(cfg: &ForecastConfig) -> Self {
        Self {
            min_ml_history: cfg.min_ml_history,
            train_ratio: cfg.train_ratio,
            n_trees: cfg.n_trees,
            seed: cfg.seed.unwrap_or(DEFAULT_SEED),
        }
    }
}

pub struct ForecastEngine {
    settings: EngineSettings,
}

impl ForecastEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// Model used for a history of `len` points.
    pub fn select_model(&self, len: usize) -> ModelKind {
        if len < self.settings.min_ml_history {
            ModelKind::SimplePattern
        } else {
            ModelKind::RandomForest
        }
    }

    /// Forecast `horizon` hours past the end of `series`.
    ///
    /// An `Err` means the selected model could not produce a forecast; callers
    /// fall back to [`fallback::simple_pattern`].
    pub fn forecast<R: Rng + ?Sized>(
        &self,
        series: &HourlySeries,
        horizon: usize,
        rng: &mut R,
    ) -> Result<Forecast, ForecastError> {
        if series.is_empty() {
            return Err(ForecastError::EmptySeries);
        }

        let model = self.select_model(series.len());
        info!(history = series.len(), horizon, model = %model, "forecasting");

        match model {
            ModelKind::SimplePattern => Ok(fallback::simple_pattern(series, horizon, rng)),
            ModelKind::RandomForest => self.forecast_random_forest(series, horizon),
        }
    }

    #[cfg(feature = "ml")]
    fn forecast_random_forest(
        &self,
        series: &HourlySeries,
        horizon: usize,
    ) -> Result<Forecast, ForecastError> {
        use super::features::{build_features, FEATURE_COUNT};
        use crate::ml::smartcore::SmartcoreRandomForest;
        use crate::ml::training::TrainingDataset;

        let (rows, targets) = build_features(series);
        let dataset = TrainingDataset::new(rows.iter().map(FeatureRow::to_vec).collect(), targets)
            .map_err(|e| ForecastError::Training(e.to_string()))?;
        let (train, holdout) = dataset
            .split(self.settings.train_ratio)
            .map_err(|e| ForecastError::Training(e.to_string()))?;

        let params =
            SmartcoreRandomForest::parameters(self.settings.n_trees, FEATURE_COUNT, self.settings.seed);
        let model = SmartcoreRandomForest::train(
            &train.features,
            &train.targets,
            params,
            FeatureRow::feature_names(),
        )
        .map_err(|e| ForecastError::Training(e.to_string()))?;

        log_holdout_fit(&model, &holdout);

        let values = recursive_forecast(&model, series, horizon)?;
        Ok(with_historical_interval(series, values))
    }

    #[cfg(not(feature = "ml"))]
    fn forecast_random_forest(
        &self,
        _series: &HourlySeries,
        _horizon: usize,
    ) -> Result<Forecast, ForecastError> {
        Err(ForecastError::Training(
            "built without the `ml` feature".to_string(),
        ))
    }
}

/// Score the untouched tail of the dataset. Informational only.
#[cfg(feature = "ml")]
fn log_holdout_fit(model: &dyn MLModel, holdout: &crate::ml::training::TrainingDataset) {
    if holdout.is_empty() {
        return;
    }
    let scored = model
        .predict_batch(&holdout.features)
        .and_then(|preds| crate::ml::training::calculate_metrics(&preds, &holdout.targets));
    match scored {
        Ok(m) => tracing::debug!(
            model_id = %model.metadata().model_id,
            samples = holdout.len(),
            mae = m.mae,
            rmse = m.rmse,
            r2 = m.r2,
            "hold-out fit"
        ),
        Err(e) => tracing::debug!(error = %e, "hold-out scoring skipped"),
    }
}

/// Roll `model` forward `horizon` hours.
///
/// The working buffer starts as a copy of the history and grows by one
/// (floored) prediction per step; lags for step `n` read from its tail.
pub fn recursive_forecast(
    model: &dyn MLModel,
    series: &HourlySeries,
    horizon: usize,
) -> Result<Vec<f64>, ForecastError> {
    let last_time = series.last_time().ok_or(ForecastError::EmptySeries)?;
    let names = FeatureRow::feature_names();

    let mut buffer: Vec<f64> = series.values().to_vec();
    buffer.reserve(horizon);
    let mut predictions = Vec::with_capacity(horizon);

    for step in 1..=horizon {
        let next_time = last_time + Duration::hours(step as i64);
        let row = next_step_features(&buffer, next_time);
        let features = FeatureVector::new(row.to_vec(), names.clone())
            .map_err(|e| ForecastError::Prediction(e.to_string()))?;

        let value = model
            .predict(&features)
            .map_err(|e| ForecastError::Prediction(e.to_string()))?
            .max(0.0);

        buffer.push(value);
        predictions.push(value);
    }

    Ok(predictions)
}

/// Fixed symmetric interval from the spread of the observed history.
pub fn with_historical_interval(series: &HourlySeries, values: Vec<f64>) -> Forecast {
    let std = match series.std_dev() {
        s if s.is_nan() => 1.0,
        s => s,
    };
    let margin = Z_90 * std * INTERVAL_SPREAD;

    Forecast {
        model: ModelKind::RandomForest,
        lower: values.iter().map(|y| y - margin).collect(),
        upper: values.iter().map(|y| y + margin).collect(),
        values,
    }
}
