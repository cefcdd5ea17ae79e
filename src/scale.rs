//! Min-max scaling of selected indicator columns

use crate::error::{ForecastError, Result};
use crate::panel::Panel;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Min-max scaler fitted per column, mapping observed ranges onto [0, 1]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Per-column fitted (min, max) ranges
    ranges: Vec<(String, f64, f64)>,
}

impl MinMaxScaler {
    /// Fit ranges over the requested columns. Columns absent from the panel
    /// are silently skipped, mirroring the cleaning stage's policy.
    pub fn fit(panel: &Panel, columns: &[String]) -> Result<Self> {
        let mut ranges = Vec::new();
        for name in columns {
            let values = match panel.column(name) {
                Ok(values) => values,
                Err(_) => continue,
            };
            if values.is_empty() {
                return Err(ForecastError::DataError(format!(
                    "Cannot fit scaler on empty column '{}'",
                    name
                )));
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            ranges.push((name.clone(), min, max));
        }

        info!(columns = ranges.len(), "min-max scaler fitted");
        Ok(Self { ranges })
    }

    /// Scale the fitted columns in place. Constant columns map to 0.
    pub fn transform(&self, panel: &mut Panel) -> Result<()> {
        for (name, min, max) in &self.ranges {
            let span = max - min;
            let values = panel.column_mut(name)?;
            for value in values.iter_mut() {
                *value = if span == 0.0 { 0.0 } else { (*value - min) / span };
            }
        }
        Ok(())
    }

    /// Fit and scale in one step
    pub fn fit_transform(panel: &mut Panel, columns: &[String]) -> Result<Self> {
        let scaler = Self::fit(panel, columns)?;
        scaler.transform(panel)?;
        Ok(scaler)
    }

    /// Fitted per-column ranges
    pub fn ranges(&self) -> &[(String, f64, f64)] {
        &self.ranges
    }
}
