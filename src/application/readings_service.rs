// Readings service - Use case for the current per-device readings
use crate::application::data_source::DataSource;
use crate::domain::device_names::DeviceNames;
use crate::domain::reading::SensorReading;
use serde::Serialize;
use std::sync::Arc;

/// A current reading with the device's display name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReading {
    pub display_name: String,
    #[serde(flatten)]
    pub reading: SensorReading,
}

#[derive(Clone)]
pub struct ReadingsService {
    source: Arc<DataSource>,
}

impl ReadingsService {
    pub fn new(source: Arc<DataSource>) -> Self {
        Self { source }
    }

    pub async fn latest(&self, names: &DeviceNames) -> anyhow::Result<Vec<LatestReading>> {
        let mut readings = self.source.repository()?.latest_readings().await?;
        readings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(readings
            .into_iter()
            .map(|reading| LatestReading {
                display_name: names.display_name(&reading.name).to_string(),
                reading,
            })
            .collect())
    }
}
