// Mock data repository over a JSON key-value file
use crate::application::sensor_repository::SensorRepository;
use crate::domain::reading::{BucketEntry, SensorReading, default_readings};
use crate::domain::time_range::TimeRange;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Key the mock entries are stored under
pub const MOCK_DATA_KEY: &str = "mockSensorData";

pub struct MockRepository {
    path: PathBuf,
    // Serializes read-modify-write of the store file
    write_lock: Mutex<()>,
}

impl MockRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_store(&self) -> Result<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse mock store {}", self.path.display()))
    }

    /// Stored mock entries, or the built-in defaults when nothing is stored
    pub async fn mock_data(&self) -> Result<Vec<BucketEntry>> {
        let mut store = self.load_store().await?;
        match store.remove(MOCK_DATA_KEY) {
            Some(value) => serde_json::from_value(value).context("Stored mock data is malformed"),
            None => Ok(default_readings()),
        }
    }

    pub async fn set_mock_data(&self, entries: &[BucketEntry]) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut store = self.load_store().await?;
        store.insert(MOCK_DATA_KEY.to_string(), serde_json::to_value(entries)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(&store)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::info!("Stored {} mock entries in {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SensorRepository for MockRepository {
    async fn latest_readings(&self) -> Result<Vec<SensorReading>> {
        let entries = self.mock_data().await?;
        match entries.into_iter().next() {
            Some(entry) => Ok(entry.val.readings),
            None => Ok(vec![SensorReading::placeholder()]),
        }
    }

    async fn history(&self, _range: TimeRange, _compare: bool) -> Result<Vec<BucketEntry>> {
        self.mock_data().await
    }
}
