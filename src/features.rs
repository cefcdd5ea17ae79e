//! Feature engineering over a cleaned panel
//!
//! Deterministic, pure transforms applied in a fixed order: lags, trailing
//! rolling statistics, percent growth, interaction ratios, cyclical year
//! encoding, then one final drop of rows that still carry a missing value
//! (the earliest rows, which lack full lag/rolling history).

use crate::config::FeatureConfig;
use crate::error::{ForecastError, Result};
use crate::panel::Panel;
use crate::schema::PanelSchema;
use statrs::statistics::Statistics;
use std::f64::consts::PI;
use tracing::info;

/// Row counts reported across the final missing-value drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureReport {
    /// Rows in the cleaned input panel
    pub rows_before: usize,
    /// Rows after dropping incomplete-history rows
    pub rows_after: usize,
    /// Derived columns appended to the panel
    pub columns_added: usize,
}

/// Derives model-ready features from a cleaned panel
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    schema: PanelSchema,
    config: FeatureConfig,
}

impl FeatureEngine {
    pub fn new(schema: PanelSchema, config: FeatureConfig) -> Self {
        Self { schema, config }
    }

    /// Build the engineered feature table.
    ///
    /// Stages only append columns; existing columns are never mutated. Rows
    /// with any remaining missing value are dropped at the end, and the
    /// report carries row counts from both sides of that drop.
    pub fn engineer(&self, panel: &Panel) -> Result<(Panel, FeatureReport)> {
        if panel.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot engineer features from an empty panel".to_string(),
            ));
        }

        let years = panel.years().to_vec();
        let n = years.len();

        // Source columns for lag/rolling/growth features: schema indicators
        // actually present in the panel, in schema order
        let sources: Vec<(String, Vec<f64>)> = self
            .schema
            .indicator_columns
            .iter()
            .filter_map(|name| {
                panel
                    .column(name)
                    .ok()
                    .map(|values| (name.clone(), values.to_vec()))
            })
            .collect();

        let mut table = panel.clone();
        let columns_before = table.columns().len();

        for &lag in &self.config.lags {
            for (name, values) in &sources {
                table.push_column(&format!("{}_lag{}", name, lag), lag_series(values, lag))?;
            }
        }

        for &window in &self.config.windows {
            for (name, values) in &sources {
                let (means, stds) = rolling_series(values, window);
                table.push_column(&format!("{}_roll_mean{}", name, window), means)?;
                table.push_column(&format!("{}_roll_std{}", name, window), stds)?;
            }
        }

        for (name, values) in &sources {
            table.push_column(&format!("{}_growth", name), growth_series(values))?;
        }

        for ratio in &self.schema.ratios {
            let numerator = match panel.column(&ratio.numerator) {
                Ok(values) => values,
                Err(_) => continue,
            };
            let denominator = match panel.column(&ratio.denominator) {
                Ok(values) => values,
                Err(_) => continue,
            };
            table.push_column(&ratio.name, ratio_series(numerator, denominator))?;
        }

        let max_year = *years.iter().max().unwrap() as f64;
        let (sines, cosines) = cyclical_series(&years, max_year);
        table.push_column(&self.schema.year_sin_column(), sines)?;
        table.push_column(&self.schema.year_cos_column(), cosines)?;

        // Final drop: any row still carrying a missing value goes
        let keep: Vec<usize> = (0..n)
            .filter(|&row| table.columns().iter().all(|(_, values)| !values[row].is_nan()))
            .collect();

        let kept_years: Vec<i32> = keep.iter().map(|&row| years[row]).collect();
        let kept_columns: Vec<(String, Vec<f64>)> = table
            .columns()
            .iter()
            .map(|(name, values)| {
                (
                    name.clone(),
                    keep.iter().map(|&row| values[row]).collect::<Vec<f64>>(),
                )
            })
            .collect();

        let report = FeatureReport {
            rows_before: n,
            rows_after: keep.len(),
            columns_added: kept_columns.len() - columns_before,
        };
        info!(
            rows_before = report.rows_before,
            rows_after = report.rows_after,
            columns_added = report.columns_added,
            "feature engineering complete"
        );

        let engineered = Panel::new(panel.year_column(), kept_years, kept_columns)?;
        Ok((engineered, report))
    }
}

/// `out[t] = values[t - lag]`, missing (NaN) for the first `lag` rows
fn lag_series(values: &[f64], lag: usize) -> Vec<f64> {
    (0..values.len())
        .map(|t| if t < lag { f64::NAN } else { values[t - lag] })
        .collect()
}

/// Trailing rolling mean and sample standard deviation over up to `window`
/// most recent observations. The window shrinks at the start of the series
/// (minimum 1), so the first mean equals the raw value; the sample standard
/// deviation is undefined over a single observation and stays missing there.
fn rolling_series(values: &[f64], window: usize) -> (Vec<f64>, Vec<f64>) {
    let window = window.max(1);
    let mut means = Vec::with_capacity(values.len());
    let mut stds = Vec::with_capacity(values.len());

    for t in 0..values.len() {
        let start = (t + 1).saturating_sub(window);
        let slice = &values[start..=t];
        means.push(slice.mean());
        stds.push(if slice.len() < 2 { f64::NAN } else { slice.std_dev() });
    }

    (means, stds)
}

/// Percent change from the prior row; the first row is 0 by definition, and
/// a zero prior value yields 0 rather than an infinity
fn growth_series(values: &[f64]) -> Vec<f64> {
    let mut growth = vec![0.0; values.len()];
    for t in 1..values.len() {
        let prev = values[t - 1];
        let rate = if prev == 0.0 {
            0.0
        } else {
            100.0 * (values[t] - prev) / prev
        };
        growth[t] = if rate.is_finite() { rate } else { 0.0 };
    }
    growth
}

/// Elementwise ratio with non-finite results replaced by 0
fn ratio_series(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator.iter())
        .map(|(n, d)| {
            let ratio = n / d;
            if ratio.is_finite() {
                ratio
            } else {
                0.0
            }
        })
        .collect()
}

/// `sin(2π·year/max_year)` and `cos(2π·year/max_year)`: a position-in-range
/// encoding, not a true periodic calendar cycle
fn cyclical_series(years: &[i32], max_year: f64) -> (Vec<f64>, Vec<f64>) {
    let sines = years
        .iter()
        .map(|&year| (2.0 * PI * year as f64 / max_year).sin())
        .collect();
    let cosines = years
        .iter()
        .map(|&year| (2.0 * PI * year as f64 / max_year).cos())
        .collect();
    (sines, cosines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lag_series_shifts_values() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let lagged = lag_series(&values, 2);
        assert!(lagged[0].is_nan());
        assert!(lagged[1].is_nan());
        assert_eq!(lagged[2], 1.0);
        assert_eq!(lagged[3], 2.0);
    }

    #[test]
    fn growth_handles_zero_denominator() {
        let growth = growth_series(&[0.0, 5.0, 10.0]);
        assert_eq!(growth, vec![0.0, 0.0, 100.0]);
    }

    #[test]
    fn ratio_replaces_non_finite() {
        let ratios = ratio_series(&[1.0, 2.0], &[0.0, 4.0]);
        assert_eq!(ratios, vec![0.0, 0.5]);
    }
}
