// Application layer - Use cases over the sensor repository
pub mod data_source;
pub mod history_service;
pub mod readings_service;
pub mod sensor_repository;
pub mod streaming_service;
