//! # GDP Forecast
//!
//! A Rust library for hybrid GDP growth forecasting from annual
//! macroeconomic panel data.
//!
//! ## Features
//!
//! - Panel loading and cleaning (numeric coercion, `%` stripping, year
//!   ordering, missing-value imputation)
//! - Deterministic feature engineering (lags, rolling statistics, growth
//!   rates, interaction ratios, cyclical year encoding)
//! - Two forecasting model families: an ARIMA model on the target series
//!   and gradient-boosted regression trees on the full feature set
//! - Weighted hybrid composition of both forecasts with consistent year
//!   labels
//!
//! Every stage takes explicit configuration and reports row counts, dropped
//! rows and imputation counts through `tracing`, so data loss is auditable
//! at each transform boundary.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gdp_forecast::config::PipelineConfig;
//! use gdp_forecast::pipeline;
//!
//! fn main() -> gdp_forecast::error::Result<()> {
//!     let config = PipelineConfig::default_with_input("data/national_indicators.csv");
//!     let forecast = pipeline::run(&config)?;
//!
//!     for record in forecast.records() {
//!         println!("{}: {:?}", record.year, record.hybrid);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod hybrid;
pub mod metrics;
pub mod models;
pub mod panel;
pub mod pipeline;
pub mod scale;
pub mod schema;

// Re-export commonly used types
pub use crate::config::{ArimaOrder, FeatureConfig, GbmParams, HybridWeights, PipelineConfig};
pub use crate::error::ForecastError;
pub use crate::features::FeatureEngine;
pub use crate::hybrid::HybridForecast;
pub use crate::models::{Forecast, ForecastModel, TrainedModel};
pub use crate::panel::{Panel, PanelLoader};
pub use crate::schema::PanelSchema;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
