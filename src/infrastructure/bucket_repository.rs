// Bucket-storage REST API repository implementation
use crate::application::sensor_repository::SensorRepository;
use crate::domain::reading::{BucketEntry, SensorReading};
use crate::domain::time_range::TimeRange;
use crate::infrastructure::config::BucketSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;

const HOUR_MS: i64 = 3600 * 1000;

#[derive(Debug, Clone)]
pub struct BucketRepository {
    client: reqwest::Client,
    base_url: String,
    user: String,
    bucket: String,
    token: String,
    items_per_hour: u32,
}

impl BucketRepository {
    pub fn new(settings: BucketSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            user: settings.user,
            bucket: settings.bucket,
            token: settings.token,
            items_per_hour: settings.items_per_hour,
        }
    }

    fn data_url(&self) -> String {
        format!(
            "{}/v1/users/{}/buckets/{}/data",
            self.base_url,
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.bucket)
        )
    }

    async fn fetch_entries(&self, params: &[(&str, String)]) -> Result<Vec<BucketEntry>> {
        if self.user.is_empty() || self.bucket.is_empty() || self.token.is_empty() {
            anyhow::bail!("Missing API parameters or token.");
        }

        let url = self.data_url();
        tracing::debug!("Fetching bucket data from {} with {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await
            .context("Failed to send request to bucket API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Bucket query failed with status {}: {}", status, body);
        }

        response
            .json::<Vec<BucketEntry>>()
            .await
            .context("Failed to parse bucket response")
    }
}

/// Query parameters for a history window ending at `now_ms`.
/// Entries come back newest first.
pub fn history_params(
    now_ms: i64,
    range: TimeRange,
    compare: bool,
    items_per_hour: u32,
) -> Vec<(&'static str, String)> {
    let mut range_ms = range.duration_ms();
    if compare {
        range_ms *= 2;
    }
    let items = i64::from(items_per_hour) * range_ms / HOUR_MS;

    vec![
        ("sort", "desc".to_string()),
        ("items", items.to_string()),
        ("min_ts", (now_ms - range_ms).to_string()),
        ("max_ts", now_ms.to_string()),
    ]
}

#[async_trait]
impl SensorRepository for BucketRepository {
    async fn latest_readings(&self) -> Result<Vec<SensorReading>> {
        let params = [("items", "1".to_string()), ("sort", "desc".to_string())];
        let entries = self.fetch_entries(&params).await?;

        match entries.into_iter().next() {
            Some(entry) => Ok(entry.val.readings),
            None => anyhow::bail!("Empty bucket."),
        }
    }

    async fn history(&self, range: TimeRange, compare: bool) -> Result<Vec<BucketEntry>> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let params = history_params(now_ms, range, compare, self.items_per_hour);
        let mut entries = self.fetch_entries(&params).await?;

        tracing::debug!("Bucket returned {} entries for {}", entries.len(), range);
        entries.reverse();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> BucketSettings {
        BucketSettings {
            base_url: "https://backend.example.io/".to_string(),
            user: "alice smith".to_string(),
            bucket: "home".to_string(),
            token: "secret".to_string(),
            items_per_hour: 4,
        }
    }

    #[test]
    fn test_data_url_encodes_segments() {
        let repo = BucketRepository::new(settings());
        assert_eq!(
            repo.data_url(),
            "https://backend.example.io/v1/users/alice%20smith/buckets/home/data"
        );
    }

    #[test]
    fn test_history_params() {
        let now = 10 * HOUR_MS;
        let params = history_params(now, TimeRange::SixHours, false, 4);
        assert_eq!(
            params,
            vec![
                ("sort", "desc".to_string()),
                ("items", "24".to_string()),
                ("min_ts", (4 * HOUR_MS).to_string()),
                ("max_ts", now.to_string()),
            ]
        );
    }

    #[test]
    fn test_history_params_compare_doubles_range() {
        let now = 100 * HOUR_MS;
        let params = history_params(now, TimeRange::OneDay, true, 4);
        assert_eq!(params[1], ("items", "192".to_string()));
        assert_eq!(params[2], ("min_ts", (52 * HOUR_MS).to_string()));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_request() {
        let repo = BucketRepository::new(BucketSettings {
            token: String::new(),
            ..settings()
        });
        let err = repo.latest_readings().await.unwrap_err();
        assert_eq!(err.to_string(), "Missing API parameters or token.");
    }
}
