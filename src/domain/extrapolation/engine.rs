// Extends a grouped dataset with forecast samples
use super::method::ExtrapolationMethod;
use super::primitives::recent_valid_values;
use super::timestamps::extrapolate_timestamps;
use crate::domain::error::ForecastError;
use crate::domain::metric::Metric;
use crate::domain::series::{DeviceSeries, GroupedDataset};
use serde::{Deserialize, Serialize};

/// Upper bound for the derived trailing window
const MAX_DERIVED_WINDOW: usize = 10;

/// Window used when the series is too short to derive one
const FALLBACK_WINDOW: usize = 5;

/// Upper bound on appended samples per series
pub const MAX_FORECAST_POINTS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrapolationConfig {
    pub enabled: bool,
    pub method: ExtrapolationMethod,
    /// Number of future samples to append
    pub points: usize,
    /// Trailing history that informs the forecast; derived from the series length when unset
    pub window_size: Option<usize>,
}

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            method: ExtrapolationMethod::Linear,
            points: 5,
            window_size: None,
        }
    }
}

impl ExtrapolationConfig {
    pub fn is_active(&self) -> bool {
        self.enabled && self.points > 0
    }

    /// Reject point counts past `MAX_FORECAST_POINTS`
    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.points > MAX_FORECAST_POINTS {
            return Err(ForecastError::TooManyPoints {
                requested: self.points,
                max: MAX_FORECAST_POINTS,
            });
        }
        Ok(())
    }

    /// Configured window, or `min(10, series_len / 2)` (5 when that is zero)
    pub fn effective_window_size(&self, series_len: usize) -> usize {
        match self.window_size {
            Some(window) if window > 0 => window,
            _ => match (series_len / 2).min(MAX_DERIVED_WINDOW) {
                0 => FALLBACK_WINDOW,
                window => window,
            },
        }
    }
}

/// Return a new dataset with `config.points` forecast samples appended to every
/// device and metric, plus the matching future axis labels.
///
/// Inactive configs and datasets with an empty axis come back unchanged.
/// Entries at `index >= dataset.axis().len()` of the result are forecasts.
pub fn extrapolate(
    dataset: &GroupedDataset,
    config: &ExtrapolationConfig,
) -> Result<GroupedDataset, ForecastError> {
    if !config.is_active() {
        return Ok(dataset.clone());
    }
    config.validate()?;
    dataset.validate()?;

    let axis = dataset.axis();
    if axis.is_empty() {
        return Ok(dataset.clone());
    }

    let window = config.effective_window_size(axis.len());
    let extended_axis = extend_axis(axis, config.points);

    tracing::debug!(
        "Extrapolating {} devices by {} points ({}, window {})",
        dataset.len(),
        config.points,
        config.method,
        window
    );

    Ok(dataset
        .devices()
        .map(|(device, series)| {
            let extended =
                extrapolate_series(series, &extended_axis, config.method, config.points, window);
            (device.to_string(), extended)
        })
        .collect())
}

/// Existing labels followed by `points` projected ones
pub(crate) fn extend_axis(axis: &[String], points: usize) -> Vec<String> {
    let mut extended = Vec::with_capacity(axis.len() + points);
    extended.extend_from_slice(axis);
    extended.extend(extrapolate_timestamps(axis, points));
    extended
}

/// Extend every metric of one device; each metric is forecast independently.
pub(crate) fn extrapolate_series(
    series: &DeviceSeries,
    extended_axis: &[String],
    method: ExtrapolationMethod,
    points: usize,
    window: usize,
) -> DeviceSeries {
    let mut extended = DeviceSeries {
        timestamps: extended_axis.to_vec(),
        ..DeviceSeries::default()
    };
    for metric in Metric::ALL {
        *extended.values_mut(metric) =
            extrapolate_metric(series.values(metric), method, points, window);
    }
    extended
}

/// Append `points` forecasts to one metric array.
///
/// With fewer than two valid samples the last known value is repeated
/// (or `None` when there is none).
pub(crate) fn extrapolate_metric(
    values: &[Option<f64>],
    method: ExtrapolationMethod,
    points: usize,
    window: usize,
) -> Vec<Option<f64>> {
    let recent = recent_valid_values(values, window);
    let mut extended = Vec::with_capacity(values.len() + points);
    extended.extend_from_slice(values);

    if recent.len() < 2 {
        let last = recent.last().copied();
        extended.extend(std::iter::repeat_n(last, points));
        return extended;
    }

    // The window is treated as the contiguous tail of the series
    let start_index = values.len() - recent.len();
    extended.extend(
        method
            .project(&recent, points, window, start_index)
            .into_iter()
            .map(|v| v.is_finite().then_some(v)),
    );
    extended
}

/// One flag per index, true where the entry is a forecast
pub fn forecast_markers(original_len: usize, total_len: usize) -> Vec<bool> {
    (0..total_len).map(|i| i >= original_len).collect()
}
