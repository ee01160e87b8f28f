// Domain layer - Sensor data model and forecasting, no I/O
pub mod device_names;
pub mod error;
pub mod extrapolation;
pub mod metric;
pub mod reading;
pub mod series;
pub mod time_range;
