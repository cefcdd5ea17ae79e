use gdp_forecast::metrics::{forecast_accuracy, train_test_split};
use assert_approx_eq::assert_approx_eq;
use pretty_assertions::assert_eq;

#[test]
fn test_forecast_accuracy() {
    let forecast = vec![105.0, 106.0, 107.0];
    let actual = vec![106.0, 107.0, 108.0];

    let accuracy = forecast_accuracy(&forecast, &actual).unwrap();
    assert_approx_eq!(accuracy.mae, 1.0);
    assert_approx_eq!(accuracy.mse, 1.0);
    assert_approx_eq!(accuracy.rmse, 1.0);
    assert!(accuracy.mape > 0.0 && accuracy.mape < 1.0);
}

#[test]
fn test_perfect_forecast() {
    let values = vec![5.0, 6.0, 7.0];
    let accuracy = forecast_accuracy(&values, &values).unwrap();
    assert_eq!(accuracy.mae, 0.0);
    assert_eq!(accuracy.rmse, 0.0);
    assert_approx_eq!(accuracy.r2, 1.0);
}

#[test]
fn test_length_mismatch_rejected() {
    assert!(forecast_accuracy(&[1.0, 2.0], &[1.0]).is_err());
    assert!(forecast_accuracy(&[], &[]).is_err());
}

#[test]
fn test_train_test_split() {
    let data: Vec<f64> = (0..10).map(|i| i as f64).collect();
    let (train, test) = train_test_split(&data, 0.2);

    assert_eq!(train.len(), 8);
    assert_eq!(test, vec![8.0, 9.0]);
}

#[test]
fn test_split_with_degenerate_ratio() {
    let data = vec![1.0, 2.0, 3.0];
    let (train, test) = train_test_split(&data, 0.0);
    assert_eq!(train, data);
    assert!(test.is_empty());
}
