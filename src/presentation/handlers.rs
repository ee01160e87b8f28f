// HTTP request handlers
use crate::domain::device_names::DeviceNames;
use crate::domain::error::ForecastError;
use crate::domain::extrapolation::ExtrapolationConfig;
use crate::domain::reading::BucketEntry;
use crate::domain::time_range::TimeRange;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

/// Query string shared by the history endpoints
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub range: Option<String>,
    pub compare: Option<bool>,
    pub extrapolate: Option<bool>,
    pub method: Option<String>,
    pub points: Option<usize>,
    pub window: Option<usize>,
    /// `id:name;id:name` overrides for device display names
    pub mappings: Option<String>,
}

/// Query string of the latest-readings endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ReadingsQuery {
    pub mappings: Option<String>,
}

/// Configured names overlaid with the request's `mappings` parameter
fn device_names(
    mappings: Option<&str>,
    configured: &DeviceNames,
) -> Result<DeviceNames, ForecastError> {
    match mappings {
        Some(mappings) => Ok(configured.merged(&mappings.parse()?)),
        None => Ok(configured.clone()),
    }
}

impl HistoryQuery {
    /// Overlay request parameters on the configured extrapolation defaults
    pub fn resolve(
        &self,
        defaults: ExtrapolationConfig,
    ) -> Result<(TimeRange, ExtrapolationConfig), ForecastError> {
        let range = match &self.range {
            Some(range) => range.parse()?,
            None => TimeRange::default(),
        };
        let method = match &self.method {
            Some(method) => method.parse()?,
            None => defaults.method,
        };
        let config = ExtrapolationConfig {
            enabled: self.extrapolate.unwrap_or(defaults.enabled),
            method,
            points: self.points.unwrap_or(defaults.points),
            window_size: self.window.or(defaults.window_size),
        };
        config.validate()?;
        Ok((range, config))
    }
}

fn resolve_history(
    query: &HistoryQuery,
    state: &AppState,
) -> Result<(TimeRange, ExtrapolationConfig, DeviceNames), ForecastError> {
    let (range, config) = query.resolve(state.default_extrapolation)?;
    let names = device_names(query.mappings.as_deref(), &state.device_names)?;
    Ok((range, config, names))
}

fn respond(result: Result<Response<Body>, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Caller mistakes are 400; anything else is an upstream failure
fn error_response(context: &str, e: &anyhow::Error) -> Response {
    let status = if e.downcast_ref::<ForecastError>().is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    tracing::error!("{}: {:#}", context, e);
    (status, e.to_string()).into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current readings per device
pub async fn latest_readings(
    Query(query): Query<ReadingsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let names = match device_names(query.mappings.as_deref(), &state.device_names) {
        Ok(names) => names,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.readings_service.latest(&names).await {
        Ok(readings) => respond(json_response(&readings, accepts_brotli(&headers)).await),
        Err(e) => error_response("Error fetching latest readings", &e),
    }
}

/// Grouped history, extended with forecasts when requested
pub async fn history(
    Query(query): Query<HistoryQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (range, config, names) = match resolve_history(&query, &state) {
        Ok(resolved) => resolved,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let compare = query.compare.unwrap_or(false);

    match state.history_service.forecast(range, compare, config, &names).await {
        Ok(view) => respond(json_response(&view, accepts_brotli(&headers)).await),
        Err(e) => error_response("Error building history", &e),
    }
}

/// Stream history per device (progressive loading)
pub async fn stream_history(
    Query(query): Query<HistoryQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (range, config, names) = match resolve_history(&query, &state) {
        Ok(resolved) => resolved,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let compare = query.compare.unwrap_or(false);

    match state
        .streaming_service
        .stream_forecast(range, compare, config, &names)
        .await
    {
        Ok(rx) => stream_from_receiver(rx, accepts_brotli(&headers))
            .await
            .into_response(),
        Err(e) => error_response("Error streaming history", &e),
    }
}

/// Switch between mock and live data
pub async fn toggle_mock(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let use_mock = state.data_source.toggle_mock();
    tracing::info!("Mock data {}", if use_mock { "enabled" } else { "disabled" });
    Json(serde_json::json!({ "use_mock": use_mock }))
}

pub async fn get_mock_data(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.mock_repository.mock_data().await {
        Ok(entries) => respond(json_response(&entries, accepts_brotli(&headers)).await),
        Err(e) => {
            tracing::error!("Error reading mock data: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn put_mock_data(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<BucketEntry>>,
) -> StatusCode {
    match state.mock_repository.set_mock_data(&entries).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!("Error storing mock data: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
