//! Home sensor dashboard backend: bucket readings grouped per device, with
//! linear, exponential and moving-average forecasts projected past the data.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
