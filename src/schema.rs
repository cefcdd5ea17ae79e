//! Shared panel schema consumed by every pipeline stage
//!
//! The cleaning stage, the scaler, the feature engine and the models all read
//! their column lists from one `PanelSchema` value, so the stages cannot
//! drift out of sync about which columns are percentages, which are
//! indicators, and which ratios to derive.

use serde::{Deserialize, Serialize};

/// An interaction-ratio feature: `name = numerator / denominator`,
/// computed elementwise with non-finite results replaced by 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioSpec {
    /// Name of the derived column
    pub name: String,
    /// Numerator column
    pub numerator: String,
    /// Denominator column
    pub denominator: String,
}

impl RatioSpec {
    pub fn new(name: &str, numerator: &str, denominator: &str) -> Self {
        Self {
            name: name.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }
}

/// Column schema of an annual macroeconomic panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSchema {
    /// Name of the integer year key column
    pub year_column: String,
    /// Name of the forecast target column; its absence from an input panel
    /// is fatal
    pub target_column: String,
    /// Columns whose raw values may carry a trailing `%` to strip
    pub percentage_columns: Vec<String>,
    /// Columns eligible for lag / rolling / growth features
    pub indicator_columns: Vec<String>,
    /// Columns to min-max scale during preprocessing (never the target)
    pub scale_columns: Vec<String>,
    /// Fixed interaction ratios derived by the feature engine
    pub ratios: Vec<RatioSpec>,
}

impl PanelSchema {
    /// Schema of the national economic indicators panel (annual, 1980-2024)
    pub fn national_accounts() -> Self {
        let strings = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();

        Self {
            year_column: "Year".to_string(),
            target_column: "GDP Growth (%)".to_string(),
            percentage_columns: strings(&[
                "GDP Growth (%)",
                "Inflation Rate (%)",
                "Money Supply (M3) Growth (%)",
                "Bank Credit Growth (%)",
                "Fiscal Deficit (% of GDP)",
                "Private Consumption (% of GDP)",
                "Fixed Capital Formation (% of GDP)",
                "Unemployment Rate (%)",
            ]),
            indicator_columns: strings(&[
                "GDP Growth (%)",
                "Inflation Rate (%)",
                "Interest Rate (%)",
                "Exchange Rate (USD/INR)",
                "Fiscal Deficit (% of GDP)",
                "Exports (Billion USD)",
                "Imports (Billion USD)",
                "FDI (Billion USD)",
                "Money Supply (M3) Growth (%)",
                "Bank Credit Growth (%)",
                "Unemployment Rate (%)",
                "Private Consumption (% of GDP)",
                "Fixed Capital Formation (% of GDP)",
                "Trade Balance (Billion USD)",
                "^NSEI Close Price",
                "^BSESN Close Price",
                "CCI",
                "Manufacturing PMI",
            ]),
            scale_columns: strings(&[
                "Inflation Rate (%)",
                "Interest Rate (%)",
                "Exchange Rate (USD/INR)",
                "Fiscal Deficit (% of GDP)",
                "Exports (Billion USD)",
                "Imports (Billion USD)",
                "FDI (Billion USD)",
                "Money Supply (M3) Growth (%)",
                "Bank Credit Growth (%)",
                "Unemployment Rate (%)",
                "Private Consumption (% of GDP)",
                "Fixed Capital Formation (% of GDP)",
                "Trade Balance (Billion USD)",
                "^NSEI Close Price",
                "^BSESN Close Price",
                "CCI",
                "Manufacturing PMI",
            ]),
            ratios: vec![
                RatioSpec::new("FDI_to_GDP", "FDI (Billion USD)", "GDP Growth (%)"),
                RatioSpec::new("Exports_to_Imports", "Exports (Billion USD)", "Imports (Billion USD)"),
                RatioSpec::new(
                    "MoneySupply_to_GDP",
                    "Money Supply (M3) Growth (%)",
                    "GDP Growth (%)",
                ),
            ],
        }
    }

    /// Whether a column should have `%` suffixes stripped during cleaning
    pub fn is_percentage(&self, column: &str) -> bool {
        self.percentage_columns.iter().any(|c| c == column)
    }

    /// Name of the cyclical sine feature derived from the year key
    pub fn year_sin_column(&self) -> String {
        format!("{}_sin", self.year_column)
    }

    /// Name of the cyclical cosine feature derived from the year key
    pub fn year_cos_column(&self) -> String {
        format!("{}_cos", self.year_column)
    }
}

impl Default for PanelSchema {
    fn default() -> Self {
        Self::national_accounts()
    }
}
