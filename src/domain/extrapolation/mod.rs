//! Time-series extrapolation: projects future samples and axis labels for
//! every device and metric of a grouped dataset.
pub mod confidence;
pub mod engine;
pub mod method;
pub mod primitives;
pub mod timestamps;

pub use confidence::extrapolation_confidence;
pub use engine::{ExtrapolationConfig, MAX_FORECAST_POINTS, extrapolate, forecast_markers};
pub use method::ExtrapolationMethod;
