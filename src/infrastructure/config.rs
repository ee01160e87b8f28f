use crate::domain::device_names::DeviceNames;
use crate::domain::extrapolation::ExtrapolationConfig;
use anyhow::Context;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

const DASHBOARD_CONFIG: &str = "config/dashboard";
const BUCKET_CONFIG: &str = "config/bucket";
const ENV_PREFIX: &str = "SENSOR";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BucketConfig {
    #[serde(default)]
    pub bucket: Option<BucketSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BucketSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub user: String,
    pub bucket: String,
    pub token: String,
    /// Samples requested per hour of history
    #[serde(default = "default_items_per_hour")]
    pub items_per_hour: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub mock: MockSettings,
    #[serde(default)]
    pub extrapolation: ExtrapolationConfig,
    /// Device id -> display name
    #[serde(default)]
    pub mappings: DeviceNames,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MockSettings {
    /// Serve mock data at startup
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl DashboardConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.extrapolation
            .validate()
            .context("Invalid [extrapolation] settings")
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            store_path: default_store_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://backend.thinger.io".to_string()
}

fn default_items_per_hour() -> u32 {
    4
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/mock_store.json")
}

fn load<T, S>(file: S) -> anyhow::Result<T>
where
    T: DeserializeOwned,
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let config: DashboardConfig = load(config::File::with_name(DASHBOARD_CONFIG).required(false))?;
    config.validate()?;
    Ok(config)
}

/// Bucket credentials are optional; without them only mock data can be served
pub fn load_bucket_config() -> anyhow::Result<BucketConfig> {
    load(config::File::with_name(BUCKET_CONFIG).required(false))
}
