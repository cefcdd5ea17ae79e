use gdp_forecast::config::FeatureConfig;
use gdp_forecast::features::FeatureEngine;
use gdp_forecast::panel::Panel;
use gdp_forecast::schema::{PanelSchema, RatioSpec};
use assert_approx_eq::assert_approx_eq;
use pretty_assertions::assert_eq;

fn schema_for(indicators: &[&str]) -> PanelSchema {
    PanelSchema {
        year_column: "Year".to_string(),
        target_column: "GDP Growth (%)".to_string(),
        percentage_columns: vec![],
        indicator_columns: indicators.iter().map(|s| s.to_string()).collect(),
        scale_columns: vec![],
        ratios: vec![],
    }
}

fn make_panel(years: std::ops::RangeInclusive<i32>, values: Vec<f64>) -> Panel {
    let years: Vec<i32> = years.collect();
    assert_eq!(years.len(), values.len());
    Panel::new(
        "Year",
        years,
        vec![("GDP Growth (%)".to_string(), values)],
    )
    .unwrap()
}

#[test]
fn test_lag_feature_property() {
    let raw: Vec<f64> = (0..10).map(|i| i as f64 * 1.5).collect();
    let panel = make_panel(2000..=2009, raw.clone());

    let config = FeatureConfig {
        lags: vec![2],
        windows: vec![],
    };
    let engine = FeatureEngine::new(schema_for(&["GDP Growth (%)"]), config);
    let (table, report) = engine.engineer(&panel).unwrap();

    // Two rows lack lag-2 history and are dropped
    assert_eq!(report.rows_before, 10);
    assert_eq!(report.rows_after, 8);
    assert_eq!(table.years()[0], 2002);

    // Kept row i corresponds to raw index i + 2, so lag2[i] == raw[i]
    let lagged = table.column("GDP Growth (%)_lag2").unwrap();
    for (i, &value) in lagged.iter().enumerate() {
        assert_eq!(value, raw[i]);
    }
}

#[test]
fn test_rolling_window_shrinks_at_start() {
    let raw = vec![4.0, 6.0, 8.0, 10.0, 12.0];
    let panel = make_panel(2000..=2004, raw);

    let config = FeatureConfig {
        lags: vec![],
        windows: vec![3],
    };
    let engine = FeatureEngine::new(schema_for(&["GDP Growth (%)"]), config);
    let (table, report) = engine.engineer(&panel).unwrap();

    // Only the first row is dropped: its single-observation rolling std is
    // undefined
    assert_eq!(report.rows_before, 5);
    assert_eq!(report.rows_after, 4);
    assert_eq!(table.years()[0], 2001);

    // First kept row's mean covers the two available observations
    let means = table.column("GDP Growth (%)_roll_mean3").unwrap();
    assert_approx_eq!(means[0], 5.0);
    // From the third row on, the full 3-observation window applies
    assert_approx_eq!(means[1], 6.0);
    assert_approx_eq!(means[2], 8.0);

    // Sample standard deviation over the trailing window
    let stds = table.column("GDP Growth (%)_roll_std3").unwrap();
    assert_approx_eq!(stds[0], std::f64::consts::SQRT_2);
    assert_approx_eq!(stds[1], 2.0);
}

#[test]
fn test_growth_rate_properties() {
    let raw = vec![10.0, 0.0, 5.0, 10.0];
    let panel = make_panel(2000..=2003, raw);

    let config = FeatureConfig {
        lags: vec![],
        windows: vec![],
    };
    let engine = FeatureEngine::new(schema_for(&["GDP Growth (%)"]), config);
    let (table, _) = engine.engineer(&panel).unwrap();

    let growth = table.column("GDP Growth (%)_growth").unwrap();
    // First row is 0 by definition
    assert_eq!(growth[0], 0.0);
    // 10 -> 0 is a -100% change
    assert_approx_eq!(growth[1], -100.0);
    // Zero denominator yields 0, not infinity
    assert_eq!(growth[2], 0.0);
    // 5 -> 10 is +100%
    assert_approx_eq!(growth[3], 100.0);
}

#[test]
fn test_interaction_ratio_handles_division_by_zero() {
    let mut schema = schema_for(&["GDP Growth (%)"]);
    schema.ratios = vec![RatioSpec::new("FDI_to_GDP", "FDI", "GDP Growth (%)")];

    let panel = Panel::new(
        "Year",
        vec![2000, 2001, 2002],
        vec![
            ("GDP Growth (%)".to_string(), vec![2.0, 0.0, 4.0]),
            ("FDI".to_string(), vec![1.0, 3.0, 2.0]),
        ],
    )
    .unwrap();

    let config = FeatureConfig {
        lags: vec![],
        windows: vec![],
    };
    let engine = FeatureEngine::new(schema, config);
    let (table, _) = engine.engineer(&panel).unwrap();

    let ratios = table.column("FDI_to_GDP").unwrap();
    assert_approx_eq!(ratios[0], 0.5);
    assert_eq!(ratios[1], 0.0);
    assert_approx_eq!(ratios[2], 0.5);
}

#[test]
fn test_ratio_with_absent_column_is_skipped() {
    let mut schema = schema_for(&["GDP Growth (%)"]);
    schema.ratios = vec![RatioSpec::new("FDI_to_GDP", "FDI", "GDP Growth (%)")];

    let panel = make_panel(2000..=2002, vec![2.0, 3.0, 4.0]);
    let config = FeatureConfig {
        lags: vec![],
        windows: vec![],
    };
    let (table, _) = FeatureEngine::new(schema, config).engineer(&panel).unwrap();
    assert!(!table.has_column("FDI_to_GDP"));
}

#[test]
fn test_cyclical_features_encode_position_in_range() {
    let panel = make_panel(2000..=2002, vec![1.0, 2.0, 3.0]);
    let config = FeatureConfig {
        lags: vec![],
        windows: vec![],
    };
    let engine = FeatureEngine::new(schema_for(&["GDP Growth (%)"]), config);
    let (table, _) = engine.engineer(&panel).unwrap();

    let sines = table.column("Year_sin").unwrap();
    let cosines = table.column("Year_cos").unwrap();

    let angle = 2.0 * std::f64::consts::PI * 2000.0 / 2002.0;
    assert_approx_eq!(sines[0], angle.sin());
    assert_approx_eq!(cosines[0], angle.cos());

    // Max year sits at a full turn
    assert_approx_eq!(sines[2], 0.0, 1e-9);
    assert_approx_eq!(cosines[2], 1.0, 1e-9);
}

#[test]
fn test_quarter_century_panel_scenario() {
    // 25-year panel, default lags/windows: rows lost to the 12-year lag
    let values: Vec<f64> = (0..25).map(|i| 5.0 + (i as f64 * 0.7).sin()).collect();
    let panel = make_panel(2000..=2024, values);

    let engine = FeatureEngine::new(schema_for(&["GDP Growth (%)"]), FeatureConfig::default());
    let (table, report) = engine.engineer(&panel).unwrap();

    assert!(report.rows_after < report.rows_before);
    assert_eq!(report.rows_after, 13);
    assert_eq!(table.years().first().copied(), Some(2012));
    assert_eq!(table.last_year(), Some(2024));

    assert!(table.has_column("GDP Growth (%)_lag12"));
    assert!(table.has_column("GDP Growth (%)_roll_std12"));
    assert!(table.has_column("Year_sin"));
    assert!(table.has_column("Year_cos"));
}
