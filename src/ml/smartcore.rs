//! SmartCore RandomForest wrapper
//!
//! Trained per request on a few hundred rows at most, so the forest uses
//! fully grown trees and considers every feature at each split.

use super::{FeatureVector, MLModel, ModelMetadata};
use anyhow::Result;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// SmartCore RandomForest Model Wrapper
pub struct SmartcoreRandomForest {
    pub metadata: ModelMetadata,
    model: Forest,
}

impl SmartcoreRandomForest {
    /// Parameters for an unpruned forest of `n_trees` trees.
    pub fn parameters(n_trees: usize, n_features: usize, seed: u64) -> RandomForestRegressorParameters {
        RandomForestRegressorParameters {
            max_depth: None,
            min_samples_leaf: 1,
            min_samples_split: 2,
            n_trees,
            m: Some(n_features),
            keep_samples: false,
            seed,
        }
    }

    /// Train a new RandomForest model
    pub fn train(
        x: &[Vec<f64>],
        y: &[f64],
        params: RandomForestRegressorParameters,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        if x.is_empty() || y.is_empty() {
            anyhow::bail!("Cannot train on empty dataset");
        }

        if x.len() != y.len() {
            anyhow::bail!(
                "Feature and target count mismatch: {} features, {} targets",
                x.len(),
                y.len()
            );
        }

        let x_matrix = to_matrix(x)?;
        let y_vec = y.to_vec();

        let model = RandomForestRegressor::fit(&x_matrix, &y_vec, params)
            .map_err(|e| anyhow::anyhow!("RandomForest training failed: {:?}", e))?;

        let metadata = ModelMetadata {
            model_id: format!("smartcore_rf_{}", uuid::Uuid::new_v4()),
            trained_at: chrono::Utc::now(),
            training_samples: x.len(),
            feature_names,
        };

        Ok(Self {
            metadata,
            model,
        })
    }
}

/// Row-major dense matrix from equally sized rows.
fn to_matrix(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let n_samples = rows.len();
    let n_features = rows.first().map(|r| r.len()).unwrap_or(0);
    if n_features == 0 {
        anyhow::bail!("Feature vectors must not be empty");
    }

    let mut flat_data = Vec::with_capacity(n_samples * n_features);
    for row in rows {
        if row.len() != n_features {
            anyhow::bail!("All feature vectors must have the same length");
        }
        flat_data.extend_from_slice(row);
    }

    Ok(DenseMatrix::new(n_samples, n_features, flat_data, false))
}

impl MLModel for SmartcoreRandomForest {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let values = self.predict_batch(std::slice::from_ref(&features.features))?;
        let value = values
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Model returned empty predictions"))?;

        if !value.is_finite() {
            anyhow::bail!("Invalid prediction: {}", value);
        }

        Ok(value)
    }

    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        let x = to_matrix(rows)?;
        self.model
            .predict(&x)
            .map_err(|e| anyhow::anyhow!("Prediction failed: {:?}", e))
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["x1".to_string(), "x2".to_string()]
    }

    #[test]
    fn test_parameters() {
        let params = SmartcoreRandomForest::parameters(100, 9, 42);
        assert_eq!(params.n_trees, 100);
        assert_eq!(params.m, Some(9));
        assert_eq!(params.max_depth, None);
        assert_eq!(params.seed, 42);
        assert!(!params.keep_samples);
    }

    #[test]
    fn test_train_random_forest() {
        // y = 2x1 + 3x2
        let x: Vec<Vec<f64>> = vec![
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![1.0, 2.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
            vec![4.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 1.0],
            vec![1.0, 3.0],
            vec![4.0, 4.0],
        ];
        let y: Vec<f64> = vec![5.0, 7.0, 8.0, 10.0, 15.0, 14.0, 14.0, 9.0, 11.0, 20.0];

        let params = SmartcoreRandomForest::parameters(10, 2, 42);
        let model = SmartcoreRandomForest::train(&x, &y, params, names()).unwrap();

        assert_eq!(model.metadata.training_samples, 10);
        assert!(model.metadata.model_id.starts_with("smartcore_rf_"));
    }

    #[test]
    fn test_predict() {
        let x: Vec<Vec<f64>> = vec![
            vec![1.0, 2.0],
            vec![2.0, 3.0],
            vec![3.0, 4.0],
            vec![4.0, 5.0],
            vec![5.0, 6.0],
        ];
        let y: Vec<f64> = vec![3.0, 5.0, 7.0, 9.0, 11.0];

        let params = SmartcoreRandomForest::parameters(20, 2, 42);
        let model = SmartcoreRandomForest::train(&x, &y, params, names()).unwrap();

        let test_features = FeatureVector::new(vec![3.0, 4.0], names()).unwrap();
        let pred = model.predict(&test_features).unwrap();

        // bagged trees average neighbouring targets
        assert!((3.0..=11.0).contains(&pred));

        let batch = model.predict_batch(&x).unwrap();
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_train_rejects_bad_input() {
        let params = SmartcoreRandomForest::parameters(5, 2, 42);
        assert!(SmartcoreRandomForest::train(&[], &[], params, names()).is_err());

        let params = SmartcoreRandomForest::parameters(5, 2, 42);
        let ragged = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(SmartcoreRandomForest::train(&ragged, &[1.0, 2.0], params, names()).is_err());
    }
}
