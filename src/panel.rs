//! Annual panel data handling: loading, coercion, cleaning

use crate::error::{ForecastError, Result};
use crate::schema::PanelSchema;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// A cleaned annual panel: strictly increasing unique years plus named
/// numeric indicator columns of equal length with no missing cells
#[derive(Debug, Clone)]
pub struct Panel {
    /// Name of the year key column, kept for round-tripping to CSV
    year_column: String,
    /// Year keys, strictly increasing
    years: Vec<i32>,
    /// Named indicator columns, each aligned to `years`
    columns: Vec<(String, Vec<f64>)>,
}

/// Audit counters emitted by the cleaning stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Rows in the raw input
    pub rows_in: usize,
    /// Rows in the cleaned panel
    pub rows_out: usize,
    /// Rows dropped because the year key was unparsable
    pub bad_year_rows: usize,
    /// Rows dropped as duplicate years (first record per year wins)
    pub duplicate_rows: usize,
    /// Cells filled by carrying the last known value forward
    pub cells_forward_filled: usize,
    /// Leading-gap cells filled backward from the first known value
    pub cells_backward_filled: usize,
    /// Cells still missing after both fills, set to the column mean
    pub cells_mean_filled: usize,
}

/// Loader that turns a raw panel file into a cleaned [`Panel`]
#[derive(Debug)]
pub struct PanelLoader;

impl PanelLoader {
    /// Load and clean a panel from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, schema: &PanelSchema) -> Result<(Panel, CleanReport)> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df, schema)
    }

    /// Clean a panel already held in a DataFrame
    pub fn from_dataframe(df: DataFrame, schema: &PanelSchema) -> Result<(Panel, CleanReport)> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        if !names.iter().any(|n| *n == schema.year_column) {
            return Err(ForecastError::DataError(format!(
                "Year column '{}' not found in input panel",
                schema.year_column
            )));
        }
        if !names.iter().any(|n| *n == schema.target_column) {
            return Err(ForecastError::DataError(format!(
                "Required target column '{}' not found in input panel",
                schema.target_column
            )));
        }

        let mut report = CleanReport {
            rows_in: df.height(),
            ..CleanReport::default()
        };

        let raw_years = series_to_years(df.column(&schema.year_column)?)?;
        let mut raw_columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();
        for name in &names {
            if *name == schema.year_column {
                continue;
            }
            let values = series_to_values(df.column(name)?, schema.is_percentage(name))?;
            raw_columns.push((name.clone(), values));
        }

        // Keep rows with a parsable year, sorted ascending, first record per
        // year wins
        let mut order: Vec<usize> = (0..raw_years.len())
            .filter(|&i| raw_years[i].is_some())
            .collect();
        report.bad_year_rows = raw_years.len() - order.len();
        order.sort_by_key(|&i| raw_years[i]);

        let mut keep: Vec<usize> = Vec::with_capacity(order.len());
        let mut last_year: Option<i32> = None;
        for i in order {
            let year = raw_years[i];
            if year == last_year {
                report.duplicate_rows += 1;
                continue;
            }
            last_year = year;
            keep.push(i);
        }

        let years: Vec<i32> = keep.iter().map(|&i| raw_years[i].unwrap()).collect();
        let mut columns: Vec<(String, Vec<f64>)> = Vec::with_capacity(raw_columns.len());
        for (name, values) in raw_columns {
            let mut reordered: Vec<Option<f64>> = keep.iter().map(|&i| values[i]).collect();
            let filled = impute_column(&name, &mut reordered, &mut report);
            columns.push((name, filled));
        }

        report.rows_out = years.len();
        info!(
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            bad_year_rows = report.bad_year_rows,
            duplicate_rows = report.duplicate_rows,
            forward_filled = report.cells_forward_filled,
            backward_filled = report.cells_backward_filled,
            mean_filled = report.cells_mean_filled,
            "panel cleaned"
        );

        let panel = Panel::new(&schema.year_column, years, columns)?;
        Ok((panel, report))
    }
}

impl Panel {
    /// Create a panel from year keys and named columns.
    ///
    /// Fails when years are not strictly increasing, column lengths do not
    /// match the year axis, or a column name repeats.
    pub fn new(year_column: &str, years: Vec<i32>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if years.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::DataError(
                "Panel years must be strictly increasing and unique".to_string(),
            ));
        }
        for (name, values) in &columns {
            if values.len() != years.len() {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    years.len()
                )));
            }
        }
        for (i, (name, _)) in columns.iter().enumerate() {
            if columns[i + 1..].iter().any(|(other, _)| other == name) {
                return Err(ForecastError::DataError(format!(
                    "Duplicate column name '{}'",
                    name
                )));
            }
        }

        Ok(Self {
            year_column: year_column.to_string(),
            years,
            columns,
        })
    }

    /// Name of the year key column
    pub fn year_column(&self) -> &str {
        &self.year_column
    }

    /// Year keys
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Last (most recent) year in the panel
    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.years.len()
    }

    /// Whether the panel has no rows
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Named columns in panel order
    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    /// Column names in panel order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    /// Values of a column
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .ok_or_else(|| ForecastError::DataError(format!("Column '{}' not found", name)))
    }

    /// Mutable values of a column
    pub fn column_mut(&mut self, name: &str) -> Result<&mut Vec<f64>> {
        self.columns
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
            .ok_or_else(|| ForecastError::DataError(format!("Column '{}' not found", name)))
    }

    /// Append a derived column aligned to the year axis
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.years.len() {
            return Err(ForecastError::DataError(format!(
                "Column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.years.len()
            )));
        }
        if self.has_column(name) {
            return Err(ForecastError::DataError(format!(
                "Duplicate column name '{}'",
                name
            )));
        }
        self.columns.push((name.to_string(), values));
        Ok(())
    }

    /// Convert the panel into a polars DataFrame
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut series = Vec::with_capacity(self.columns.len() + 1);
        series.push(Series::new(&self.year_column, self.years.clone()));
        for (name, values) in &self.columns {
            series.push(Series::new(name, values.clone()));
        }
        Ok(DataFrame::new(series)?)
    }

    /// Write the panel to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_dataframe(self.to_dataframe()?, path)
    }
}

/// Write a DataFrame to CSV through a temporary sibling file, so a failed
/// write never leaves partial output behind
pub(crate) fn write_dataframe<P: AsRef<Path>>(mut df: DataFrame, path: P) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");

    let result = (|| -> Result<()> {
        let mut file = File::create(&tmp)?;
        CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
        Ok(())
    })();

    if let Err(err) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(err);
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Coerce a year key series to integers; unparsable cells become `None`
fn series_to_years(series: &Series) -> Result<Vec<Option<i32>>> {
    let values = series_to_values(series, false)?;
    Ok(values
        .into_iter()
        .map(|v| v.and_then(|v| if v.is_finite() { Some(v as i32) } else { None }))
        .collect())
}

/// Coerce a series to floats, keeping missing/unparsable cells as `None`.
/// `strip_percent` removes a trailing `%` before parsing string cells.
fn series_to_values(series: &Series, strip_percent: bool) -> Result<Vec<Option<f64>>> {
    match series.dtype() {
        DataType::Float64 => Ok(series.f64()?.into_iter().collect()),
        DataType::Float32 => Ok(series
            .f32()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::Int64 => Ok(series
            .i64()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::Int32 => Ok(series
            .i32()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::UInt64 => Ok(series
            .u64()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::UInt32 => Ok(series
            .u32()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::Utf8 => Ok(series
            .utf8()?
            .into_iter()
            .map(|opt| opt.and_then(|raw| parse_cell(raw, strip_percent)))
            .collect()),
        _ => Ok(vec![None; series.len()]),
    }
}

fn parse_cell(raw: &str, strip_percent: bool) -> Option<f64> {
    let mut cell = raw.trim();
    if strip_percent {
        cell = cell.trim_end_matches('%').trim_end();
    }
    cell.parse::<f64>().ok()
}

/// Forward-fill, then backward-fill, then replace any still-missing cell with
/// the column mean. Counts each fill in the report.
fn impute_column(name: &str, values: &mut [Option<f64>], report: &mut CleanReport) -> Vec<f64> {
    let mut last_seen: Option<f64> = None;
    for value in values.iter_mut() {
        match *value {
            Some(v) => last_seen = Some(v),
            None => {
                if let Some(fill) = last_seen {
                    *value = Some(fill);
                    report.cells_forward_filled += 1;
                }
            }
        }
    }

    let mut next_seen: Option<f64> = None;
    for value in values.iter_mut().rev() {
        match *value {
            Some(v) => next_seen = Some(v),
            None => {
                if let Some(fill) = next_seen {
                    *value = Some(fill);
                    report.cells_backward_filled += 1;
                }
            }
        }
    }

    let known: Vec<f64> = values.iter().flatten().copied().collect();
    let mean = if known.is_empty() {
        warn!(column = name, "column has no observations, filling with 0");
        0.0
    } else {
        known.iter().sum::<f64>() / known.len() as f64
    };

    values
        .iter()
        .map(|value| match value {
            Some(v) => *v,
            None => {
                report.cells_mean_filled += 1;
                mean
            }
        })
        .collect()
}
