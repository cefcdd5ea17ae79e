use gdp_forecast::config::{FeatureConfig, PipelineConfig, PipelinePaths};
use gdp_forecast::pipeline;
use gdp_forecast::schema::{PanelSchema, RatioSpec};
use assert_approx_eq::assert_approx_eq;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const TARGET: &str = "GDP Growth (%)";

fn integration_schema() -> PanelSchema {
    let strings = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
    PanelSchema {
        year_column: "Year".to_string(),
        target_column: TARGET.to_string(),
        percentage_columns: strings(&[TARGET]),
        indicator_columns: strings(&[
            TARGET,
            "Exports (Billion USD)",
            "Imports (Billion USD)",
            "FDI (Billion USD)",
            "Money Supply (M3) Growth (%)",
        ]),
        scale_columns: strings(&["Exports (Billion USD)", "Imports (Billion USD)"]),
        ratios: vec![
            RatioSpec::new("FDI_to_GDP", "FDI (Billion USD)", TARGET),
            RatioSpec::new(
                "Exports_to_Imports",
                "Exports (Billion USD)",
                "Imports (Billion USD)",
            ),
        ],
    }
}

/// 40-year synthetic panel, 1985-2024, with a deterministic wiggle so the
/// autoregressive design matrix stays well conditioned
fn write_input_panel(path: &Path) {
    let mut file = File::create(path).unwrap();
    writeln!(
        file,
        "Year,{},Exports (Billion USD),Imports (Billion USD),FDI (Billion USD),Money Supply (M3) Growth (%)",
        TARGET
    )
    .unwrap();

    for i in 0..40usize {
        let year = 1985 + i as i32;
        let noise = ((i * 7919) % 1000) as f64 / 2000.0;
        let gdp = 5.0 + 2.0 * (i as f64 * 0.7).sin() + noise;
        let exports = 10.0 + i as f64 + (i as f64 * 0.5).cos();
        let imports = 12.0 + i as f64;
        let fdi = 2.0 + 0.1 * i as f64 + (i as f64 * 0.9).sin();
        let money = 8.0 + (i as f64 * 0.4).sin();
        writeln!(
            file,
            "{},{:.4}%,{:.4},{:.4},{:.4},{:.4}",
            year, gdp, exports, imports, fdi, money
        )
        .unwrap();
    }
}

fn integration_config(dir: &Path) -> PipelineConfig {
    let input = dir.join("national_indicators.csv");
    write_input_panel(&input);

    let mut config = PipelineConfig::default_with_input(&input);
    config.schema = integration_schema();
    config
}

#[test]
fn test_full_pipeline_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = integration_config(dir.path());

    let forecast = pipeline::run(&config).unwrap();

    // Horizon years immediately following the last training year
    assert_eq!(forecast.years(), vec![2025, 2026, 2027, 2028, 2029]);
    for record in forecast.records() {
        let supervised = record.supervised.expect("horizons match");
        let hybrid = record.hybrid.expect("horizons match");
        assert_approx_eq!(hybrid, 0.5 * record.arima + 0.5 * supervised);
        assert!(hybrid.is_finite());
    }

    // Every stage left its artifact behind
    assert!(config.paths.cleaned.as_ref().unwrap().exists());
    assert!(config.paths.engineered.as_ref().unwrap().exists());
    assert!(config.paths.arima_model.exists());
    assert!(config.paths.supervised_model.exists());
    assert!(config.paths.forecast.as_ref().unwrap().exists());
}

#[test]
fn test_engineered_table_shape() {
    let dir = tempfile::tempdir().unwrap();
    let config = integration_config(dir.path());

    let (panel, report) = pipeline::run_preprocessing(&config).unwrap();
    assert_eq!(report.rows_out, 40);

    let (table, feature_report) = pipeline::run_feature_engineering(&config, &panel).unwrap();

    // The 12-year lag costs the first 12 rows
    assert_eq!(feature_report.rows_before, 40);
    assert_eq!(feature_report.rows_after, 28);
    assert_eq!(table.years().first().copied(), Some(1997));
    assert_eq!(table.last_year(), Some(2024));

    // Engineered CSV round-trips through polars with the derived columns
    let engineered = config.paths.engineered.as_ref().unwrap();
    let df = CsvReader::new(File::open(engineered).unwrap())
        .infer_schema(None)
        .has_header(true)
        .finish()
        .unwrap();
    assert_eq!(df.height(), 28);
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert!(names.contains(&format!("{}_lag12", TARGET)));
    assert!(names.contains(&format!("{}_roll_std12", TARGET)));
    assert!(names.contains(&"Year_sin".to_string()));
    assert!(names.contains(&"Year_cos".to_string()));
}

#[test]
fn test_forecast_output_file_columns() {
    let dir = tempfile::tempdir().unwrap();
    let config = integration_config(dir.path());

    pipeline::run(&config).unwrap();

    let path = config.paths.forecast.as_ref().unwrap();
    let df = CsvReader::new(File::open(path).unwrap())
        .infer_schema(None)
        .has_header(true)
        .finish()
        .unwrap();

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "Year".to_string(),
            format!("{}_ARIMA", TARGET),
            format!("{}_XGBoost", TARGET),
            format!("{}_Hybrid", TARGET),
        ]
    );
    assert_eq!(df.height(), 5);
}

#[test]
fn test_pipeline_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = integration_config(dir.path());

    let first = pipeline::run(&config).unwrap();
    let second = pipeline::run(&config).unwrap();

    assert_eq!(first.years(), second.years());
    for (a, b) in first.records().iter().zip(second.records().iter()) {
        assert_approx_eq!(a.arima, b.arima, 1e-12);
        assert_approx_eq!(a.hybrid.unwrap(), b.hybrid.unwrap(), 1e-12);
    }
}

#[test]
fn test_forecast_stage_requires_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = integration_config(dir.path());

    // No training ran, so the artifacts are missing
    assert!(pipeline::run_forecast(&config).is_err());
}

#[test]
fn test_smaller_lags_keep_more_rows() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = integration_config(dir.path());
    config.features = FeatureConfig {
        lags: vec![1, 3],
        windows: vec![3],
    };

    let (panel, _) = pipeline::run_preprocessing(&config).unwrap();
    let (_, report) = pipeline::run_feature_engineering(&config, &panel).unwrap();
    assert_eq!(report.rows_after, 37);
}

#[test]
fn test_paths_rooted_at_input() {
    let paths = PipelinePaths::rooted_at("data/panel.csv");
    assert_eq!(paths.input, Path::new("data/panel.csv"));
    assert_eq!(
        paths.arima_model,
        Path::new("data").join("arima_model.json")
    );
}
