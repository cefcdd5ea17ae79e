//! Explicit stage configuration
//!
//! Every stage takes its parameters from these structs instead of ambient
//! module-level constants, so stages can be unit tested in isolation and a
//! whole pipeline run is described by a single serializable value.

use crate::error::{ForecastError, Result};
use crate::schema::PanelSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lag and rolling-window lists for the feature engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Lag offsets in years, e.g. `[1, 3, 6, 12]`
    pub lags: Vec<usize>,
    /// Trailing rolling-window sizes in years, e.g. `[3, 6, 12]`
    pub windows: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: vec![1, 3, 6, 12],
            windows: vec![3, 6, 12],
        }
    }
}

/// ARIMA model order (p, d, q)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving-average order
    pub q: usize,
}

impl ArimaOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(5, 1, 0)
    }
}

/// Gradient-boosted tree hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_trees: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.1,
            max_depth: 5,
            min_samples_leaf: 1,
        }
    }
}

impl GbmParams {
    /// Check that the hyperparameters describe a trainable model
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 || self.learning_rate > 1.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ensemble weights for the hybrid forecast
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HybridWeights {
    /// Weight of the autoregressive forecast
    pub arima: f64,
    /// Weight of the supervised (tree ensemble) forecast
    pub supervised: f64,
}

impl HybridWeights {
    pub const fn new(arima: f64, supervised: f64) -> Self {
        Self { arima, supervised }
    }

    /// Weights must be non-negative and sum to 1
    pub fn validate(&self) -> Result<()> {
        if self.arima < 0.0 || self.supervised < 0.0 {
            return Err(ForecastError::InvalidParameter(
                "Hybrid weights must be non-negative".to_string(),
            ));
        }
        let sum = self.arima + self.supervised;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ForecastError::InvalidParameter(format!(
                "Hybrid weights must sum to 1, got {}",
                sum
            )));
        }
        Ok(())
    }
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// File locations consumed and produced by the pipeline stages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinePaths {
    /// Raw input panel CSV
    pub input: PathBuf,
    /// Cleaned panel CSV (skipped when `None`)
    pub cleaned: Option<PathBuf>,
    /// Engineered feature table CSV (skipped when `None`)
    pub engineered: Option<PathBuf>,
    /// Persisted autoregressive model artifact
    pub arima_model: PathBuf,
    /// Persisted supervised model artifact
    pub supervised_model: PathBuf,
    /// Hybrid forecast output CSV (skipped when `None`)
    pub forecast: Option<PathBuf>,
}

impl PipelinePaths {
    /// Artifact paths rooted next to the input file
    pub fn rooted_at<P: AsRef<Path>>(input: P) -> Self {
        let input = input.as_ref().to_path_buf();
        let dir = input.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            input,
            cleaned: Some(dir.join("cleaned_data.csv")),
            engineered: Some(dir.join("feature_engineered.csv")),
            arima_model: dir.join("arima_model.json"),
            supervised_model: dir.join("gbm_model.json"),
            forecast: Some(dir.join("gdp_forecast.csv")),
        }
    }
}

/// Full configuration of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Column schema shared by every stage
    pub schema: PanelSchema,
    /// Feature engineering parameters
    pub features: FeatureConfig,
    /// Autoregressive model order
    pub arima: ArimaOrder,
    /// Supervised model hyperparameters
    pub gbm: GbmParams,
    /// Ensemble weights
    pub weights: HybridWeights,
    /// Number of future years to forecast
    pub horizon: usize,
    /// Apply min-max scaling to the schema's scale columns during
    /// preprocessing
    pub scale_features: bool,
    /// Stage file locations
    pub paths: PipelinePaths,
}

impl PipelineConfig {
    /// Default configuration reading the raw panel from `input`
    pub fn default_with_input<P: AsRef<Path>>(input: P) -> Self {
        Self {
            schema: PanelSchema::default(),
            features: FeatureConfig::default(),
            arima: ArimaOrder::default(),
            gbm: GbmParams::default(),
            weights: HybridWeights::default(),
            horizon: 5,
            scale_features: false,
            paths: PipelinePaths::rooted_at(input),
        }
    }
}
