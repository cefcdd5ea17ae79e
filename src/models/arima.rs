//! Autoregressive integrated (ARIMA) model on the target series
//!
//! Fits on the full historical target series only: the series is differenced
//! `d` times, AR coefficients are estimated by ordinary least squares on the
//! lagged regression, and MA coefficients (when `q > 0`) come from the
//! two-stage Hannan-Rissanen regression against approximate residuals.
//! Forecasts iterate the fitted recursion with expected-zero future shocks
//! and integrate back to the original scale.

use crate::config::ArimaOrder;
use crate::error::{ForecastError, Result};
use crate::models::{Forecast, ForecastModel, TrainedModel};
use crate::panel::Panel;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// ARIMA model specification
#[derive(Debug, Clone)]
pub struct ArimaModel {
    name: String,
    order: ArimaOrder,
    target: String,
}

/// Fitted ARIMA state: coefficients plus the trailing history needed to
/// continue the recursion past the last training year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedArimaModel {
    name: String,
    order: ArimaOrder,
    target: String,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    constant: f64,
    /// Residuals of the fitted recursion on the differenced series
    residuals: Vec<f64>,
    /// Full historical target series, original scale
    history: Vec<f64>,
    /// Last year of the training table
    last_year: i32,
    /// Residual variance
    sigma2: f64,
}

impl ArimaModel {
    /// Create an ARIMA model of the given order over `target`
    pub fn new(order: ArimaOrder, target: &str) -> Self {
        Self {
            name: format!("ARIMA({},{},{})", order.p, order.d, order.q),
            order,
            target: target.to_string(),
        }
    }
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn fit(&self, table: &Panel) -> Result<TrainedArimaModel> {
        let series = table.column(&self.target)?;
        let ArimaOrder { p, d, q } = self.order;

        if series.len() < p + d + q + 2 {
            return Err(ForecastError::ValidationError(format!(
                "Insufficient data for {}: need at least {} observations, got {}",
                self.name,
                p + d + q + 2,
                series.len()
            )));
        }
        let last_year = table.last_year().ok_or_else(|| {
            ForecastError::DataError("Training table has no year axis".to_string())
        })?;

        let differenced = difference(series, d);
        let (ar_coefficients, ma_coefficients, constant, residuals) = if q == 0 {
            let (ar, constant, residuals) = estimate_ar(&differenced, p)?;
            (ar, Vec::new(), constant, residuals)
        } else {
            estimate_arma(&differenced, p, q)?
        };

        let sigma2 = if residuals.is_empty() {
            0.0
        } else {
            residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64
        };

        info!(
            model = %self.name,
            observations = series.len(),
            sigma2,
            "autoregressive model fitted"
        );

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            order: self.order,
            target: self.target.clone(),
            ar_coefficients,
            ma_coefficients,
            constant,
            residuals,
            history: series.to_vec(),
            last_year,
            sigma2,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedModel for TrainedArimaModel {
    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        if self.history.is_empty() {
            return Err(ForecastError::ForecastingError(
                "ARIMA model has not been trained".to_string(),
            ));
        }

        let differenced = difference(&self.history, self.order.d);
        let mut extended = differenced;
        let mut shocks = self.residuals.clone();
        let mut forecasts = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let mut next = self.constant;
            for (i, coefficient) in self.ar_coefficients.iter().enumerate() {
                if i < extended.len() {
                    next += coefficient * extended[extended.len() - 1 - i];
                }
            }
            for (i, coefficient) in self.ma_coefficients.iter().enumerate() {
                if i < shocks.len() {
                    next += coefficient * shocks[shocks.len() - 1 - i];
                }
            }
            extended.push(next);
            // Expected value of future shocks is zero
            shocks.push(0.0);
            forecasts.push(next);
        }

        // Integrate back through each differencing level
        let mut values = forecasts;
        for level in (0..self.order.d).rev() {
            let base = difference(&self.history, level);
            let start = *base.last().unwrap();
            values = integrate(&values, start);
        }

        Ok(Forecast::new(&self.name, self.last_year + 1, values))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    /// Target column the model was fitted on
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Fitted AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Fitted MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Residual variance of the fitted recursion
    pub fn sigma2(&self) -> f64 {
        self.sigma2
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

/// Difference a series `d` times
pub(crate) fn difference(data: &[f64], d: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Cumulative sum starting from `start` (inverse of one differencing level)
fn integrate(diff: &[f64], start: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(diff.len());
    let mut cumulative = start;
    for &step in diff {
        cumulative += step;
        result.push(cumulative);
    }
    result
}

/// OLS estimation of an AR(p) model with intercept.
/// Returns (ar coefficients, constant, residuals aligned to indices `p..n`).
fn estimate_ar(data: &[f64], p: usize) -> Result<(Vec<f64>, f64, Vec<f64>)> {
    let n = data.len();
    if n < p + 2 {
        return Err(ForecastError::ValidationError(format!(
            "AR({}) estimation needs at least {} observations, got {}",
            p,
            p + 2,
            n
        )));
    }

    let rows = n - p;
    let mut x_data = Vec::with_capacity(rows * (p + 1));
    for t in p..n {
        x_data.push(1.0);
        for i in 1..=p {
            x_data.push(data[t - i]);
        }
    }

    let x = DMatrix::from_row_slice(rows, p + 1, &x_data);
    let y = DVector::from_vec(data[p..].to_vec());
    let beta = solve_ols(&x, &y)?;

    let fitted = &x * &beta;
    let residuals: Vec<f64> = (&y - fitted).iter().copied().collect();
    let constant = beta[0];
    let ar_coefficients: Vec<f64> = beta.iter().skip(1).copied().collect();

    Ok((ar_coefficients, constant, residuals))
}

/// Two-stage Hannan-Rissanen estimation of an ARMA(p, q) model.
/// A long autoregression yields approximate shocks, then one regression over
/// lagged values and lagged shocks gives the final coefficients.
fn estimate_arma(data: &[f64], p: usize, q: usize) -> Result<(Vec<f64>, Vec<f64>, f64, Vec<f64>)> {
    let n = data.len();
    let mean = data.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();

    let long_order = (p + q).max(10).min(n / 4).max(p.max(q)).max(1);
    let start = long_order.max(p).max(q);
    if n < start + p + q + 2 {
        return Err(ForecastError::ValidationError(format!(
            "ARMA({},{}) estimation needs at least {} observations, got {}",
            p,
            q,
            start + p + q + 2,
            n
        )));
    }

    let (_, _, approx_shocks) = estimate_ar(&centered, long_order)?;
    // approx_shocks[i] corresponds to index long_order + i of `centered`
    let shock_at = |t: usize| -> f64 {
        t.checked_sub(long_order)
            .and_then(|i| approx_shocks.get(i))
            .copied()
            .unwrap_or(0.0)
    };

    let rows = n - start;
    let cols = 1 + p + q;
    let mut x_data = Vec::with_capacity(rows * cols);
    let mut y_data = Vec::with_capacity(rows);
    for t in start..n {
        y_data.push(centered[t]);
        x_data.push(1.0);
        for i in 1..=p {
            x_data.push(centered[t - i]);
        }
        for i in 1..=q {
            x_data.push(shock_at(t - i));
        }
    }

    let x = DMatrix::from_row_slice(rows, cols, &x_data);
    let y = DVector::from_vec(y_data);
    let beta = solve_ols(&x, &y)?;

    let fitted = &x * &beta;
    let residuals: Vec<f64> = (&y - fitted).iter().copied().collect();
    let ar_coefficients: Vec<f64> = beta.iter().skip(1).take(p).copied().collect();
    let ma_coefficients: Vec<f64> = beta.iter().skip(1 + p).take(q).copied().collect();
    // Map the centered intercept back to the original scale
    let ar_sum: f64 = ar_coefficients.iter().sum();
    let constant = beta[0] + mean * (1.0 - ar_sum);

    Ok((ar_coefficients, ma_coefficients, constant, residuals))
}

/// Solve the normal equations `(X'X) beta = X'y`
fn solve_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;
    let inverse = xtx.try_inverse().ok_or_else(|| {
        ForecastError::MathError("Singular design matrix in autoregressive estimation".to_string())
    })?;
    Ok(inverse * xty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_and_integrate_are_inverse() {
        let data = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        let diff = difference(&data, 1);
        assert_eq!(diff, vec![2.0, 3.0, 4.0, 5.0]);

        let back = integrate(&diff, data[0]);
        assert_eq!(back, data[1..].to_vec());
    }

    #[test]
    fn ar_estimation_recovers_coefficient() {
        // Deterministic AR(1) process with small pseudo-noise
        let phi = 0.7;
        let mut data = vec![0.0];
        for i in 1..200 {
            let noise = ((i * 7919) % 1000) as f64 / 5000.0 - 0.1;
            data.push(phi * data[i - 1] + noise);
        }

        let (coefficients, _, residuals) = estimate_ar(&data, 1).unwrap();
        assert!((coefficients[0] - phi).abs() < 0.2);
        assert_eq!(residuals.len(), data.len() - 1);
    }
}
