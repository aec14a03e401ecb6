//! Machine Learning Module
//!
//! Regression models used by the forecast engine:
//! - Random forest regressor (SmartCore, behind the `ml` feature)
//! - Chronological train/hold-out split and validation metrics
//!
//! Models are trained per request and dropped afterwards; nothing here is
//! persisted.

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod models;
pub mod training;

#[cfg(feature = "ml")]
pub mod smartcore;

pub use models::MLModel;

/// ML Model Metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub training_samples: usize,
    pub feature_names: Vec<String>,
}

/// Validation Metrics
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub r2: f64,   // R-squared
}

/// Feature Vector for ML models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_creation() {
        let features = vec![1.0, 2.0, 3.0];
        let names = vec!["f1".to_string(), "f2".to_string(), "f3".to_string()];

        let fv = FeatureVector::new(features, names).unwrap();
        assert_eq!(fv.features.len(), 3);
        assert_eq!(fv.feature_names[2], "f3");
    }

    #[test]
    fn test_feature_vector_mismatch() {
        let names = vec!["f1".to_string()];
        assert!(FeatureVector::new(vec![1.0, 2.0], names).is_err());
    }
}
