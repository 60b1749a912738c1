use log::warn;

use crate::ledger::SeriesPair;

/// Regression errors of a forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorMetrics {
    pub rmse: f64,
    /// RMSE over the range of the actual values.
    pub nrmse: f64,
    pub mae: f64,
}

impl ErrorMetrics {
    /// Computes the errors of `predicted` against `actual`.
    ///
    /// Every metric is NaN if there are no values, and so is NRMSE if the actual values are
    /// constant.
    pub fn compute(actual: &[f32], predicted: &[f32]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            warn!("computing error metrics without values");
            return Self {
                rmse: f64::NAN,
                nrmse: f64::NAN,
                mae: f64::NAN,
            };
        }

        let (squared, absolute) = actual
            .iter()
            .zip(predicted)
            .map(|(&a, &p)| f64::from(a) - f64::from(p))
            .fold((0.0, 0.0), |(sq, abs), e| (sq + e * e, abs + e.abs()));

        let rmse = (squared / n as f64).sqrt();
        let mae = absolute / n as f64;

        let (min, max) = actual[..n]
            .iter()
            .map(|&a| f64::from(a))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), a| {
                (min.min(a), max.max(a))
            });

        let range = max - min;
        let nrmse = if range > 0.0 {
            rmse / range
        } else {
            warn!(rmse = rmse; "actual values are constant, NRMSE is undefined");
            f64::NAN
        };

        Self { rmse, nrmse, mae }
    }

    pub fn from_pair(pair: &SeriesPair) -> Self {
        Self::compute(pair.actual(), pair.predicted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn known_values() {
        let metrics = ErrorMetrics::compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]);

        assert!(close(metrics.rmse, 1.0 / 3f64.sqrt()));
        assert!(close(metrics.mae, 1.0 / 3.0));
        assert!(close(metrics.nrmse, metrics.rmse / 2.0));
    }

    #[test]
    fn perfect_forecast() {
        let metrics = ErrorMetrics::compute(&[1.0, 5.0], &[1.0, 5.0]);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.nrmse, 0.0);
        assert_eq!(metrics.mae, 0.0);
    }

    #[test]
    fn degenerate_inputs_give_nan() {
        assert!(ErrorMetrics::compute(&[2.0, 2.0], &[1.0, 3.0]).nrmse.is_nan());
        assert!(ErrorMetrics::compute(&[], &[]).rmse.is_nan());
    }
}
