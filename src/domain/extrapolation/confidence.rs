// Advisory forecast confidence from the stability of recent samples
use super::primitives::recent_valid_values;

/// `1 - stddev / |mean|` over the recent valid window, clamped to [0, 1].
///
/// Fewer than two samples give 0. A constant window gives 1, including an
/// all-zero one; a window that varies around a zero mean gives 0.
pub fn extrapolation_confidence(data: &[Option<f64>], window_size: usize) -> f64 {
    let recent = recent_valid_values(data, window_size);
    if recent.len() < 2 {
        return 0.0;
    }

    let n = recent.len() as f64;
    let mean = recent.iter().sum::<f64>() / n;
    let variance = recent.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return 1.0;
    }
    if mean == 0.0 {
        return 0.0;
    }

    let coefficient_of_variation = std_dev / mean.abs();
    let score = 1.0 - coefficient_of_variation;
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}
