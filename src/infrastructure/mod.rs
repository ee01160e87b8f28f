// Infrastructure layer - External dependencies and adapters
pub mod bucket_repository;
pub mod chunked_json;
pub mod config;
pub mod http_response;
pub mod mock_repository;
