//! Model abstraction shared by the forecast engine

use super::{FeatureVector, ModelMetadata};
use anyhow::Result;

/// Trait for ML models
pub trait MLModel: Send + Sync {
    /// Predict a single value from features
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Predict one value per row
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;
}
