// Repository trait for bucket data access
use crate::domain::reading::{BucketEntry, SensorReading};
use crate::domain::time_range::TimeRange;
use async_trait::async_trait;

#[async_trait]
pub trait SensorRepository: Send + Sync {
    /// Readings from the most recent bucket entry
    async fn latest_readings(&self) -> anyhow::Result<Vec<SensorReading>>;

    /// Bucket entries within the range, oldest first.
    /// `compare` doubles the range so the previous period can be overlaid.
    async fn history(&self, range: TimeRange, compare: bool) -> anyhow::Result<Vec<BucketEntry>>;
}
