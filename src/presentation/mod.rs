// Presentation layer - HTTP surface
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_mock_data, health_check, history, latest_readings, put_mock_data, stream_history,
    toggle_mock,
};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/readings/latest", get(latest_readings))
        .route("/history", get(history))
        .route("/history/stream", get(stream_history))
        .route("/mock/toggle", post(toggle_mock))
        .route("/mock/data", get(get_mock_data).put(put_mock_data))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
