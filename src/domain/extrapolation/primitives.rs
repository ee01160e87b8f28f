//! Numeric building blocks shared by the forecasting methods.
//!
//! Everything here works on gap-free slices; `recent_valid_values` is the one
//! place where missing samples are dropped.

/// Least-squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Up to `window` most recent present values, oldest first.
pub fn recent_valid_values(data: &[Option<f64>], window: usize) -> Vec<f64> {
    let mut recent: Vec<f64> = data.iter().rev().flatten().copied().take(window).collect();
    recent.reverse();
    recent
}

/// Fit a line over `data`, with x starting at `start_index`.
/// Fewer than two points (or a degenerate x spread) yields a flat line through the last value.
pub fn linear_regression(data: &[f64], start_index: usize) -> LinearFit {
    let flat = LinearFit {
        slope: 0.0,
        intercept: data.last().copied().unwrap_or(0.0),
    };
    if data.len() < 2 {
        return flat;
    }

    let n = data.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in data.iter().enumerate() {
        let x = (start_index + i) as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return flat;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    LinearFit { slope, intercept }
}

/// Simple exponential smoothing seeded with the first observation.
pub fn exponential_smoothing(data: &[f64], alpha: f64) -> Vec<f64> {
    let mut smoothed = Vec::with_capacity(data.len());
    for &value in data {
        let next = match smoothed.last() {
            Some(&prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        smoothed.push(next);
    }
    smoothed
}

/// Trailing mean over at most `window` points ending at each index.
pub fn moving_average(data: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..data.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &data[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}
