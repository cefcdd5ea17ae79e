//! Hybrid forecast composition
//!
//! Joins the two base forecasts on Year (left join keyed on the
//! autoregressive sequence) and computes the weighted ensemble. A year
//! missing from the supervised sequence yields a missing hybrid value for
//! that year; this is a reconciliation rule, not an error.

use crate::config::HybridWeights;
use crate::error::Result;
use crate::models::Forecast;
use crate::panel;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// One joined forecast row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridRecord {
    /// Future year label
    pub year: i32,
    /// Autoregressive forecast value
    pub arima: f64,
    /// Supervised forecast value, if that model covered the year
    pub supervised: Option<f64>,
    /// Weighted ensemble value, missing when the supervised side is
    pub hybrid: Option<f64>,
}

/// Joined per-year forecast of both base models and their weighted ensemble
#[derive(Debug, Clone)]
pub struct HybridForecast {
    target: String,
    weights: HybridWeights,
    records: Vec<HybridRecord>,
}

/// Compose the hybrid forecast from the two base forecasts
pub fn compose(
    target: &str,
    arima: &Forecast,
    supervised: &Forecast,
    weights: HybridWeights,
) -> Result<HybridForecast> {
    weights.validate()?;

    let mut records: Vec<HybridRecord> = arima
        .points()
        .iter()
        .map(|point| {
            let matched = supervised.value_for(point.year);
            HybridRecord {
                year: point.year,
                arima: point.value,
                supervised: matched,
                hybrid: matched.map(|s| weights.arima * point.value + weights.supervised * s),
            }
        })
        .collect();
    records.sort_by_key(|record| record.year);

    let unmatched = records.iter().filter(|r| r.supervised.is_none()).count();
    info!(
        years = records.len(),
        unmatched,
        w_arima = weights.arima,
        w_supervised = weights.supervised,
        "hybrid forecast composed"
    );

    Ok(HybridForecast {
        target: target.to_string(),
        weights,
        records,
    })
}

impl HybridForecast {
    /// Target column the forecasts cover
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Ensemble weights used
    pub fn weights(&self) -> HybridWeights {
        self.weights
    }

    /// Joined rows, ascending by year
    pub fn records(&self) -> &[HybridRecord] {
        &self.records
    }

    /// Forecast years in order
    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    /// Convert to the output-file frame: `Year`, `<target>_ARIMA`,
    /// `<target>_XGBoost`, `<target>_Hybrid`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        let arima: Vec<f64> = self.records.iter().map(|r| r.arima).collect();
        let supervised: Vec<Option<f64>> = self.records.iter().map(|r| r.supervised).collect();
        let hybrid: Vec<Option<f64>> = self.records.iter().map(|r| r.hybrid).collect();

        let df = DataFrame::new(vec![
            Series::new("Year", years),
            Series::new(&format!("{}_ARIMA", self.target), arima),
            Series::new(&format!("{}_XGBoost", self.target), supervised),
            Series::new(&format!("{}_Hybrid", self.target), hybrid),
        ])?;
        Ok(df)
    }

    /// Write the forecast table to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        panel::write_dataframe(self.to_dataframe()?, path)
    }
}
