// Display names for device ids
use crate::domain::error::ForecastError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Device id -> display name. Ids without an entry are shown as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceNames(BTreeMap<String, String>);

impl DeviceNames {
    pub fn new(names: BTreeMap<String, String>) -> Self {
        Self(names)
    }

    pub fn display_name<'a>(&'a self, device: &'a str) -> &'a str {
        self.0.get(device).map(String::as_str).unwrap_or(device)
    }

    /// Display name for each of `devices`, falling back to the id
    pub fn for_devices<'a>(
        &self,
        devices: impl IntoIterator<Item = &'a str>,
    ) -> BTreeMap<String, String> {
        devices
            .into_iter()
            .map(|device| (device.to_string(), self.display_name(device).to_string()))
            .collect()
    }

    /// Entries of `overrides` win over ours
    pub fn merged(&self, overrides: &DeviceNames) -> DeviceNames {
        let mut names = self.0.clone();
        names.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses `Sensor_0:Room1;Sensor_1:Room2`. Empty items are ignored.
impl FromStr for DeviceNames {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut names = BTreeMap::new();
        for item in s.split(';').map(str::trim).filter(|item| !item.is_empty()) {
            let Some((device, name)) = item.split_once(':') else {
                return Err(ForecastError::MalformedMapping(item.to_string()));
            };
            let (device, name) = (device.trim(), name.trim());
            if device.is_empty() || name.is_empty() {
                return Err(ForecastError::MalformedMapping(item.to_string()));
            }
            names.insert(device.to_string(), name.to_string());
        }
        Ok(Self(names))
    }
}
