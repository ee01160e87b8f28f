// Forecasting strategies over a gap-free trailing window
use super::primitives::{exponential_smoothing, linear_regression, moving_average};
use crate::domain::error::ForecastError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smoothing factor for the exponential method
pub const SMOOTHING_ALPHA: f64 = 0.3;

/// Number of trailing moving-average points the trend is read from
const MA_TREND_SPAN: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtrapolationMethod {
    #[default]
    Linear,
    Exponential,
    MovingAverage,
}

impl ExtrapolationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtrapolationMethod::Linear => "linear",
            ExtrapolationMethod::Exponential => "exponential",
            ExtrapolationMethod::MovingAverage => "moving-average",
        }
    }

    /// Project `points` future values from `recent`.
    /// `start_index` is the position of `recent[0]` within the full series.
    pub fn project(
        self,
        recent: &[f64],
        points: usize,
        window_size: usize,
        start_index: usize,
    ) -> Vec<f64> {
        match self {
            ExtrapolationMethod::Linear => extrapolate_linear(recent, points, start_index),
            ExtrapolationMethod::Exponential => {
                extrapolate_exponential(recent, points, SMOOTHING_ALPHA)
            }
            ExtrapolationMethod::MovingAverage => {
                extrapolate_moving_average(recent, points, window_size)
            }
        }
    }
}

impl fmt::Display for ExtrapolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtrapolationMethod {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(ExtrapolationMethod::Linear),
            "exponential" => Ok(ExtrapolationMethod::Exponential),
            "moving-average" => Ok(ExtrapolationMethod::MovingAverage),
            other => Err(ForecastError::UnknownMethod(other.to_string())),
        }
    }
}

fn flat(recent: &[f64], points: usize) -> Vec<f64> {
    match recent.last() {
        Some(&last) => vec![last; points],
        None => Vec::new(),
    }
}

/// Evaluate the least-squares line at the positions following the window
pub fn extrapolate_linear(recent: &[f64], points: usize, start_index: usize) -> Vec<f64> {
    if recent.len() < 2 {
        return flat(recent, points);
    }
    let fit = linear_regression(recent, start_index);
    let next_x = start_index + recent.len();
    (0..points).map(|i| fit.at((next_x + i) as f64)).collect()
}

/// Continue the last smoothed value along the last smoothed step
pub fn extrapolate_exponential(recent: &[f64], points: usize, alpha: f64) -> Vec<f64> {
    let smoothed = exponential_smoothing(recent, alpha);
    let Some(&last) = smoothed.last() else {
        return Vec::new();
    };
    let trend = match smoothed.len() {
        0 | 1 => 0.0,
        n => smoothed[n - 1] - smoothed[n - 2],
    };
    (1..=points).map(|step| last + trend * step as f64).collect()
}

/// Continue the last moving-average value along the average step of the
/// last few moving-average points
pub fn extrapolate_moving_average(recent: &[f64], points: usize, window_size: usize) -> Vec<f64> {
    let ma = moving_average(recent, window_size);
    let Some(&last) = ma.last() else {
        return Vec::new();
    };
    let span = ma.len().min(MA_TREND_SPAN);
    let trend = if span < 2 {
        0.0
    } else {
        let tail = &ma[ma.len() - span..];
        (tail[span - 1] - tail[0]) / (span - 1) as f64
    };
    (1..=points).map(|step| last + trend * step as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_linear_continues_line() {
        let forecast = extrapolate_linear(&[1.0, 3.0, 5.0, 7.0, 9.0], 3, 0);
        assert_all_close(&forecast, &[11.0, 13.0, 15.0]);

        // Window taken from the middle of a longer series
        let offset = extrapolate_linear(&[7.0, 9.0], 3, 3);
        assert_all_close(&offset, &[11.0, 13.0, 15.0]);
    }

    #[test]
    fn test_linear_single_point_is_flat() {
        assert_eq!(extrapolate_linear(&[4.0], 3, 9), vec![4.0, 4.0, 4.0]);
        assert!(extrapolate_linear(&[], 3, 0).is_empty());
    }

    #[test]
    fn test_exponential_trend_from_smoothed_tail() {
        // smoothed: 10, 13, 15.1 -> trend 2.1
        let forecast = extrapolate_exponential(&[10.0, 20.0, 20.0], 2, SMOOTHING_ALPHA);
        assert_all_close(&forecast, &[17.2, 19.3]);
    }

    #[test]
    fn test_exponential_single_point_is_flat() {
        assert_eq!(extrapolate_exponential(&[5.0], 2, SMOOTHING_ALPHA), vec![5.0, 5.0]);
    }

    #[test]
    fn test_moving_average_trend() {
        // ma(2): 2, 3, 5, 7 -> tail 3, 5, 7 -> trend 2
        let forecast = extrapolate_moving_average(&[2.0, 4.0, 6.0, 8.0], 2, 2);
        assert_all_close(&forecast, &[9.0, 11.0]);
    }

    #[test]
    fn test_moving_average_single_point_is_flat() {
        assert_eq!(extrapolate_moving_average(&[3.0], 2, 4), vec![3.0, 3.0]);
    }

    #[test]
    fn test_method_names() {
        for method in [
            ExtrapolationMethod::Linear,
            ExtrapolationMethod::Exponential,
            ExtrapolationMethod::MovingAverage,
        ] {
            assert_eq!(method.as_str().parse::<ExtrapolationMethod>().unwrap(), method);
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{method}\""));
        }
        assert!(matches!(
            "cubic".parse::<ExtrapolationMethod>(),
            Err(ForecastError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_zero_points() {
        assert!(ExtrapolationMethod::Linear.project(&[1.0, 2.0], 0, 2, 0).is_empty());
    }
}
