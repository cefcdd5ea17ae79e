//! Forecasting models over the engineered feature table
//!
//! Two independently trained families share one protocol: a model is fitted
//! on the full historical table and produces a trained artifact, and the
//! trained artifact forecasts the `horizon` years immediately following the
//! last training year. Forecasting from an unfitted artifact fails fast; a
//! default prediction is never silently substituted.

use crate::error::{ForecastError, Result};
use crate::panel::Panel;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One forecast observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Future year label
    pub year: i32,
    /// Predicted target value
    pub value: f64,
}

/// Ordered per-year forecast produced by one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    /// Name of the producing model
    model: String,
    /// Forecast points, ascending by year
    points: Vec<ForecastPoint>,
}

impl Forecast {
    /// Label `values` with consecutive years starting at `first_year`
    pub fn new(model: &str, first_year: i32, values: Vec<f64>) -> Self {
        let points = values
            .into_iter()
            .enumerate()
            .map(|(offset, value)| ForecastPoint {
                year: first_year + offset as i32,
                value,
            })
            .collect();

        Self {
            model: model.to_string(),
            points,
        }
    }

    /// Name of the producing model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Forecast points, ascending by year
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Forecast years in order
    pub fn years(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.year).collect()
    }

    /// Forecast values in order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Predicted value for a specific year, if forecasted
    pub fn value_for(&self, year: i32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.year == year)
            .map(|p| p.value)
    }

    /// Number of forecasted periods
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the forecast is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Trained forecast model
pub trait TrainedModel: Debug {
    /// Forecast the `horizon` years immediately following the last training
    /// year
    fn forecast(&self, horizon: usize) -> Result<Forecast>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted on an engineered feature table
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedModel;

    /// Fit the model on the table
    fn fit(&self, table: &Panel) -> Result<Self::Trained>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Read a JSON model artifact
pub(crate) fn load_artifact<T, P>(path: P) -> Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<std::path::Path>,
{
    let file = std::fs::File::open(path.as_ref()).map_err(|e| {
        ForecastError::ForecastingError(format!(
            "Cannot load model artifact '{}': {}",
            path.as_ref().display(),
            e
        ))
    })?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

/// Write a JSON model artifact
pub(crate) fn save_artifact<T, P>(model: &T, path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<std::path::Path>,
{
    let file = std::fs::File::create(path)?;
    serde_json::to_writer(std::io::BufWriter::new(file), model)?;
    Ok(())
}

pub mod arima;
pub mod gbm;
