// Live/mock repository selection
use crate::application::sensor_repository::SensorRepository;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct DataSource {
    live: Option<Arc<dyn SensorRepository>>,
    mock: Arc<dyn SensorRepository>,
    use_mock: AtomicBool,
}

impl DataSource {
    /// `live` is `None` when no bucket credentials are configured
    pub fn new(
        live: Option<Arc<dyn SensorRepository>>,
        mock: Arc<dyn SensorRepository>,
        use_mock: bool,
    ) -> Self {
        Self {
            live,
            mock,
            use_mock: AtomicBool::new(use_mock),
        }
    }

    pub fn use_mock(&self) -> bool {
        self.use_mock.load(Ordering::SeqCst)
    }

    /// Flip between mock and live data, returning the new state
    pub fn toggle_mock(&self) -> bool {
        !self.use_mock.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn repository(&self) -> anyhow::Result<Arc<dyn SensorRepository>> {
        if self.use_mock() {
            return Ok(self.mock.clone());
        }
        match &self.live {
            Some(live) => Ok(live.clone()),
            None => anyhow::bail!("Missing API parameters or token."),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::{FailingRepository, fixed};
    use super::*;
    use crate::domain::reading::default_readings;

    #[tokio::test]
    async fn test_without_credentials_only_mock_works() {
        let source = DataSource::new(None, fixed(default_readings()), false);

        let err = source.repository().err().unwrap();
        assert_eq!(err.to_string(), "Missing API parameters or token.");

        assert!(source.toggle_mock());
        let readings = source.repository().unwrap().latest_readings().await.unwrap();
        assert_eq!(readings.len(), 5);
    }

    #[tokio::test]
    async fn test_toggle_switches_repository() {
        let source = DataSource::new(Some(Arc::new(FailingRepository)), fixed(Vec::new()), true);
        assert!(source.use_mock());
        assert!(source.repository().unwrap().latest_readings().await.is_ok());

        assert!(!source.toggle_mock());
        assert!(source.repository().unwrap().latest_readings().await.is_err());
    }
}
