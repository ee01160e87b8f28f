// Caller contract violations raised by the domain layer
use crate::domain::metric::Metric;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("device {device}: {} has {actual} values but the time axis has {expected}", .metric.key())]
    LengthMismatch {
        device: String,
        metric: Metric,
        expected: usize,
        actual: usize,
    },

    #[error("device {device}: time axis has {actual} labels but the dataset axis has {expected}")]
    AxisMismatch {
        device: String,
        expected: usize,
        actual: usize,
    },

    #[error("{requested} forecast points requested, at most {max} allowed")]
    TooManyPoints { requested: usize, max: usize },

    #[error("unknown extrapolation method: {0}")]
    UnknownMethod(String),

    #[error("unknown time range: {0}")]
    UnknownTimeRange(String),

    #[error("malformed device mapping: {0} (expected id:name)")]
    MalformedMapping(String),
}
