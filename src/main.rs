// Main entry point - Dependency injection and server setup
use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use sensor_dashboard::application::data_source::DataSource;
use sensor_dashboard::application::history_service::HistoryService;
use sensor_dashboard::application::readings_service::ReadingsService;
use sensor_dashboard::application::sensor_repository::SensorRepository;
use sensor_dashboard::application::streaming_service::StreamingForecastService;
use sensor_dashboard::infrastructure::bucket_repository::BucketRepository;
use sensor_dashboard::infrastructure::config::{load_bucket_config, load_dashboard_config};
use sensor_dashboard::infrastructure::mock_repository::MockRepository;
use sensor_dashboard::presentation::app_state::AppState;
use sensor_dashboard::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let dashboard_config = load_dashboard_config()?;
    let bucket_config = load_bucket_config()?;

    // Create repositories (infrastructure layer)
    let live: Option<Arc<dyn SensorRepository>> = match bucket_config.bucket {
        Some(settings) => Some(Arc::new(BucketRepository::new(settings))),
        None => {
            tracing::warn!("No bucket credentials configured; only mock data is available");
            None
        }
    };
    let mock_repository = Arc::new(MockRepository::new(dashboard_config.mock.store_path.clone()));
    tracing::info!(
        "Mock store at {} (mock data {})",
        mock_repository.path().display(),
        if dashboard_config.mock.enabled { "on" } else { "off" }
    );
    let data_source = Arc::new(DataSource::new(
        live,
        mock_repository.clone(),
        dashboard_config.mock.enabled,
    ));

    // Create services (application layer)
    let state = Arc::new(AppState {
        readings_service: ReadingsService::new(data_source.clone()),
        history_service: HistoryService::new(data_source.clone()),
        streaming_service: StreamingForecastService::new(data_source.clone()),
        data_source,
        mock_repository,
        default_extrapolation: dashboard_config.extrapolation,
        device_names: dashboard_config.mappings,
    });

    // Build router (presentation layer)
    // Note: responses are compressed by our own builders, so no CompressionLayer
    let router = router(state);

    // Start server
    let addr: SocketAddr = dashboard_config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", dashboard_config.server.listen_addr))?;
    tracing::info!("Starting sensor-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
