//! Pipeline orchestration
//!
//! Each stage is a plain function taking the shared [`PipelineConfig`], so
//! stages can run individually or chained by [`run`]. Every stage consumes a
//! complete in-memory table and produces a complete result; re-running a
//! stage with identical inputs is idempotent.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::{FeatureEngine, FeatureReport};
use crate::hybrid::{self, HybridForecast};
use crate::models::arima::{ArimaModel, TrainedArimaModel};
use crate::models::gbm::{GbmModel, TrainedGbmModel};
use crate::models::{ForecastModel, TrainedModel};
use crate::panel::{CleanReport, Panel, PanelLoader};
use crate::scale::MinMaxScaler;
use tracing::info;

/// Load, clean, and optionally scale the raw input panel
pub fn run_preprocessing(config: &PipelineConfig) -> Result<(Panel, CleanReport)> {
    let (mut panel, report) = PanelLoader::from_csv(&config.paths.input, &config.schema)?;

    if config.scale_features {
        MinMaxScaler::fit_transform(&mut panel, &config.schema.scale_columns)?;
    }

    if let Some(path) = &config.paths.cleaned {
        panel.write_csv(path)?;
        info!(path = %path.display(), "cleaned panel written");
    }

    Ok((panel, report))
}

/// Derive the engineered feature table from a cleaned panel
pub fn run_feature_engineering(
    config: &PipelineConfig,
    panel: &Panel,
) -> Result<(Panel, FeatureReport)> {
    let engine = FeatureEngine::new(config.schema.clone(), config.features.clone());
    let (table, report) = engine.engineer(panel)?;

    if let Some(path) = &config.paths.engineered {
        table.write_csv(path)?;
        info!(path = %path.display(), "feature table written");
    }

    Ok((table, report))
}

/// Fit both base models on the feature table and persist their artifacts
pub fn run_training(
    config: &PipelineConfig,
    table: &Panel,
) -> Result<(TrainedArimaModel, TrainedGbmModel)> {
    let arima = ArimaModel::new(config.arima, &config.schema.target_column).fit(table)?;
    arima.save(&config.paths.arima_model)?;
    info!(path = %config.paths.arima_model.display(), "autoregressive model saved");

    let gbm = GbmModel::new(config.gbm.clone(), &config.schema.target_column).fit(table)?;
    gbm.save(&config.paths.supervised_model)?;
    info!(path = %config.paths.supervised_model.display(), "tree ensemble saved");

    Ok((arima, gbm))
}

/// Load the persisted model artifacts, forecast both, and compose the hybrid
pub fn run_forecast(config: &PipelineConfig) -> Result<HybridForecast> {
    let arima = TrainedArimaModel::load(&config.paths.arima_model)?;
    let gbm = TrainedGbmModel::load(&config.paths.supervised_model)?;

    let arima_forecast = arima.forecast(config.horizon)?;
    let gbm_forecast = gbm.forecast(config.horizon)?;

    let forecast = hybrid::compose(
        &config.schema.target_column,
        &arima_forecast,
        &gbm_forecast,
        config.weights,
    )?;

    if let Some(path) = &config.paths.forecast {
        forecast.write_csv(path)?;
        info!(path = %path.display(), "forecast written");
    }

    Ok(forecast)
}

/// Run the whole pipeline: preprocess, engineer features, train, forecast
pub fn run(config: &PipelineConfig) -> Result<HybridForecast> {
    let (panel, _) = run_preprocessing(config)?;
    let (table, _) = run_feature_engineering(config, &panel)?;
    run_training(config, &table)?;
    run_forecast(config)
}
