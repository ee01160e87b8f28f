// Application state for HTTP handlers
use crate::application::data_source::DataSource;
use crate::application::history_service::HistoryService;
use crate::application::readings_service::ReadingsService;
use crate::application::streaming_service::StreamingForecastService;
use crate::domain::device_names::DeviceNames;
use crate::domain::extrapolation::ExtrapolationConfig;
use crate::infrastructure::mock_repository::MockRepository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub readings_service: ReadingsService,
    pub history_service: HistoryService,
    pub streaming_service: StreamingForecastService,
    pub data_source: Arc<DataSource>,
    pub mock_repository: Arc<MockRepository>,
    /// Extrapolation settings used when a request does not override them
    pub default_extrapolation: ExtrapolationConfig,
    /// Configured display names; requests may add or override entries
    pub device_names: DeviceNames,
}
