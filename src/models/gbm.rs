//! Gradient-boosted regression trees on the engineered feature matrix
//!
//! The supervised model consumes every feature column except the target (the
//! year key is the panel axis, never a feature). Boosting fits depth-limited
//! regression trees to squared-error residuals with shrinkage.
//!
//! Multi-step forecasting is an approximation: with no true future exogenous
//! features, each step after the first recycles the most recent feature row
//! and applies a circular left-shift before predicting. The shift reorders
//! existing feature values; it does not inject new information per step.

use crate::config::GbmParams;
use crate::error::{ForecastError, Result};
use crate::metrics::forecast_accuracy;
use crate::models::{Forecast, ForecastModel, TrainedModel};
use crate::panel::Panel;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

/// Gradient-boosted tree model specification
#[derive(Debug, Clone)]
pub struct GbmModel {
    name: String,
    params: GbmParams,
    target: String,
}

/// Fitted tree ensemble plus the exact feature-column ordering it was
/// trained on and the most recent feature row for forecasting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedGbmModel {
    name: String,
    params: GbmParams,
    target: String,
    /// Feature columns in training order; inference must match exactly
    feature_names: Vec<String>,
    /// Initial prediction (mean of the training target)
    base_prediction: f64,
    /// Boosted trees, applied with shrinkage
    trees: Vec<TreeNode>,
    /// Most recent training feature row, recycled for multi-step forecasts
    last_features: Vec<f64>,
    /// Last year of the training table
    last_year: i32,
}

/// Regression tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] <= *threshold {
                    left.predict(features)
                } else {
                    right.predict(features)
                }
            }
        }
    }
}

impl GbmModel {
    /// Create a gradient-boosted tree model over every feature column except
    /// `target`
    pub fn new(params: GbmParams, target: &str) -> Self {
        Self {
            name: format!("GBM({} trees)", params.n_trees),
            params,
            target: target.to_string(),
        }
    }
}

impl ForecastModel for GbmModel {
    type Trained = TrainedGbmModel;

    fn fit(&self, table: &Panel) -> Result<TrainedGbmModel> {
        self.params.validate()?;

        let targets = table.column(&self.target)?.to_vec();
        if targets.len() < 2 {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for {}: need at least 2 rows, got {}",
                self.name,
                targets.len()
            )));
        }
        let last_year = table.last_year().ok_or_else(|| {
            ForecastError::DataError("Training table has no year axis".to_string())
        })?;

        let feature_names: Vec<String> = table
            .columns()
            .iter()
            .filter(|(name, _)| *name != self.target)
            .map(|(name, _)| name.clone())
            .collect();
        if feature_names.is_empty() {
            return Err(ForecastError::ValidationError(
                "Feature table has no feature columns besides the target".to_string(),
            ));
        }

        let rows = table.len();
        let mut matrix: Vec<Vec<f64>> = vec![Vec::with_capacity(feature_names.len()); rows];
        for name in &feature_names {
            let values = table.column(name)?;
            for (row, &value) in values.iter().enumerate() {
                matrix[row].push(value);
            }
        }

        let base_prediction = targets.iter().sum::<f64>() / rows as f64;
        let mut predictions = vec![base_prediction; rows];
        let mut trees = Vec::with_capacity(self.params.n_trees);
        let all_rows: Vec<usize> = (0..rows).collect();

        for _ in 0..self.params.n_trees {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(predictions.iter())
                .map(|(t, p)| t - p)
                .collect();

            let tree = fit_tree(
                &matrix,
                &residuals,
                &all_rows,
                self.params.max_depth,
                self.params.min_samples_leaf,
            );
            for (row, prediction) in predictions.iter_mut().enumerate() {
                *prediction += self.params.learning_rate * tree.predict(&matrix[row]);
            }
            trees.push(tree);
        }

        let accuracy = forecast_accuracy(&predictions, &targets)?;
        info!(
            model = %self.name,
            rows,
            features = feature_names.len(),
            mse = accuracy.mse,
            rmse = accuracy.rmse,
            r2 = accuracy.r2,
            "tree ensemble fitted"
        );

        Ok(TrainedGbmModel {
            name: self.name.clone(),
            params: self.params.clone(),
            target: self.target.clone(),
            feature_names,
            base_prediction,
            trees,
            last_features: matrix.last().cloned().unwrap_or_default(),
            last_year,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedModel for TrainedGbmModel {
    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        if self.trees.is_empty() || self.last_features.is_empty() {
            return Err(ForecastError::ForecastingError(
                "GBM model has not been trained".to_string(),
            ));
        }

        // Recycle-and-shift: first step predicts on the latest known feature
        // row; each later step rotates the row left by one before predicting
        let mut latest = self.last_features.clone();
        let mut values = Vec::with_capacity(horizon);
        for step in 0..horizon {
            if step > 0 {
                latest.rotate_left(1);
            }
            values.push(self.predict_row(&latest));
        }

        Ok(Forecast::new(&self.name, self.last_year + 1, values))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedGbmModel {
    /// Feature columns in training order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Ensemble prediction for one feature row
    fn predict_row(&self, features: &[f64]) -> f64 {
        let boost: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict(features))
            .sum();
        self.base_prediction + self.params.learning_rate * boost
    }

    /// Predict the target for every row of a feature table.
    ///
    /// The table's feature columns (everything except the target) must match
    /// the training-time columns exactly, in name and order; a mismatch is a
    /// fatal error, never silently reordered or dropped.
    pub fn predict_table(&self, table: &Panel) -> Result<Vec<f64>> {
        let names: Vec<&str> = table
            .column_names()
            .into_iter()
            .filter(|name| *name != self.target)
            .collect();
        if names.len() != self.feature_names.len()
            || names
                .iter()
                .zip(self.feature_names.iter())
                .any(|(a, b)| *a != b.as_str())
        {
            return Err(ForecastError::ForecastingError(format!(
                "Feature schema mismatch: model was trained on {} columns, table provides {}",
                self.feature_names.len(),
                names.len()
            )));
        }

        let mut rows: Vec<Vec<f64>> = vec![Vec::with_capacity(names.len()); table.len()];
        for name in &self.feature_names {
            let values = table.column(name)?;
            for (row, &value) in values.iter().enumerate() {
                rows[row].push(value);
            }
        }

        Ok(rows.iter().map(|row| self.predict_row(row)).collect())
    }

    /// Persist the trained model as a JSON artifact
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::models::save_artifact(self, path)
    }

    /// Load a trained model from a JSON artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::models::load_artifact(path)
    }
}

/// Fit one regression tree to the residuals by greedy SSE minimization
fn fit_tree(
    matrix: &[Vec<f64>],
    targets: &[f64],
    rows: &[usize],
    depth_left: usize,
    min_leaf: usize,
) -> TreeNode {
    let mean = rows.iter().map(|&r| targets[r]).sum::<f64>() / rows.len() as f64;
    if depth_left == 0 || rows.len() < 2 * min_leaf || rows.len() < 2 {
        return TreeNode::Leaf { value: mean };
    }

    match best_split(matrix, targets, rows, min_leaf) {
        Some((feature, threshold)) => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .copied()
                .partition(|&r| matrix[r][feature] <= threshold);
            let left = fit_tree(matrix, targets, &left_rows, depth_left - 1, min_leaf);
            let right = fit_tree(matrix, targets, &right_rows, depth_left - 1, min_leaf);
            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        None => TreeNode::Leaf { value: mean },
    }
}

/// Best (feature, threshold) split by total within-node SSE, using prefix
/// sums over the rows sorted by feature value
fn best_split(
    matrix: &[Vec<f64>],
    targets: &[f64],
    rows: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let n_features = matrix.first()?.len();
    let total_sum: f64 = rows.iter().map(|&r| targets[r]).sum();
    let total_sq: f64 = rows.iter().map(|&r| targets[r] * targets[r]).sum();

    let mut best: Option<(usize, f64, f64)> = None;
    for feature in 0..n_features {
        let mut order = rows.to_vec();
        order.sort_by(|&a, &b| {
            matrix[a][feature]
                .partial_cmp(&matrix[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for i in 0..order.len() - 1 {
            let t = targets[order[i]];
            left_sum += t;
            left_sq += t * t;

            let here = matrix[order[i]][feature];
            let next = matrix[order[i + 1]][feature];
            if here == next {
                continue;
            }
            let left_n = i + 1;
            let right_n = order.len() - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if best.map_or(true, |(_, _, best_sse)| sse < best_sse) {
                best = Some((feature, (here + next) / 2.0, sse));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_splits_on_informative_feature() {
        let matrix = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
        ];
        let targets = vec![-1.0, -1.0, 1.0, 1.0];
        let rows: Vec<usize> = (0..4).collect();

        let tree = fit_tree(&matrix, &targets, &rows, 2, 1);
        assert!((tree.predict(&[1.5, 0.0]) - (-1.0)).abs() < 1e-12);
        assert!((tree.predict(&[10.5, 0.0]) - 1.0).abs() < 1e-12);
    }
}
