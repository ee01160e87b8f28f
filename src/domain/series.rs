// Per-device metric series aligned to a shared time axis
use crate::domain::error::ForecastError;
use crate::domain::metric::Metric;
use crate::domain::reading::BucketEntry;
use crate::domain::time_range::TimeRange;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Three parallel metric arrays plus the axis labels they align to.
/// `None` marks a missing sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSeries {
    pub timestamps: Vec<String>,
    #[serde(rename = "hum")]
    pub humidity: Vec<Option<f64>>,
    #[serde(rename = "tmp")]
    pub temperature: Vec<Option<f64>>,
    #[serde(rename = "bat")]
    pub battery: Vec<Option<f64>>,
}

impl DeviceSeries {
    /// All-missing series over the given axis
    pub fn empty(timestamps: Vec<String>) -> Self {
        let len = timestamps.len();
        Self {
            timestamps,
            humidity: vec![None; len],
            temperature: vec![None; len],
            battery: vec![None; len],
        }
    }

    pub fn values(&self, metric: Metric) -> &[Option<f64>] {
        match metric {
            Metric::Humidity => &self.humidity,
            Metric::Temperature => &self.temperature,
            Metric::Battery => &self.battery,
        }
    }

    pub fn values_mut(&mut self, metric: Metric) -> &mut Vec<Option<f64>> {
        match metric {
            Metric::Humidity => &mut self.humidity,
            Metric::Temperature => &mut self.temperature,
            Metric::Battery => &mut self.battery,
        }
    }

    fn validate(&self, device: &str) -> Result<(), ForecastError> {
        for metric in Metric::ALL {
            let actual = self.values(metric).len();
            if actual != self.timestamps.len() {
                return Err(ForecastError::LengthMismatch {
                    device: device.to_string(),
                    metric,
                    expected: self.timestamps.len(),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Device id -> series, every series sharing one time axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedDataset {
    devices: BTreeMap<String, DeviceSeries>,
}

impl GroupedDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device: impl Into<String>, series: DeviceSeries) {
        self.devices.insert(device.into(), series);
    }

    pub fn get(&self, device: &str) -> Option<&DeviceSeries> {
        self.devices.get(device)
    }

    pub fn devices(&self) -> impl Iterator<Item = (&str, &DeviceSeries)> {
        self.devices.iter().map(|(id, series)| (id.as_str(), series))
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// The shared axis, taken from the first device
    pub fn axis(&self) -> &[String] {
        self.devices
            .values()
            .next()
            .map(|series| series.timestamps.as_slice())
            .unwrap_or(&[])
    }

    /// Check that every device's arrays match the shared axis length
    pub fn validate(&self) -> Result<(), ForecastError> {
        let expected = self.axis().len();
        for (device, series) in &self.devices {
            if series.timestamps.len() != expected {
                return Err(ForecastError::AxisMismatch {
                    device: device.clone(),
                    expected,
                    actual: series.timestamps.len(),
                });
            }
            series.validate(device)?;
        }
        Ok(())
    }
}

impl FromIterator<(String, DeviceSeries)> for GroupedDataset {
    fn from_iter<I: IntoIterator<Item = (String, DeviceSeries)>>(iter: I) -> Self {
        Self {
            devices: iter.into_iter().collect(),
        }
    }
}

/// Align readings from every bucket entry onto one sorted axis of distinct instants.
/// Readings with skewed clocks are moved to their entry's instant first.
pub fn group_readings(entries: &[BucketEntry], range: TimeRange) -> GroupedDataset {
    let mut readings = Vec::new();
    let mut fixed = 0usize;
    for entry in entries {
        for reading in &entry.val.readings {
            let mut reading = reading.clone();
            if reading.fix_timestamp(entry.ts) {
                fixed += 1;
            }
            readings.push(reading);
        }
    }
    if fixed > 0 {
        tracing::warn!("Replaced {} skewed reading timestamps with bucket timestamps", fixed);
    }

    let instants: Vec<i64> = readings
        .iter()
        .filter_map(|r| r.timestamp_ms())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let labels: Vec<String> = instants.iter().map(|ts| range.format_label(*ts)).collect();

    let mut devices: BTreeMap<String, DeviceSeries> = BTreeMap::new();
    for reading in &readings {
        if reading.name.is_empty() {
            continue;
        }
        let series = devices
            .entry(reading.name.clone())
            .or_insert_with(|| DeviceSeries::empty(labels.clone()));

        let Some(ts) = reading.timestamp_ms() else {
            continue;
        };
        let Ok(index) = instants.binary_search(&ts) else {
            continue;
        };

        let values = &reading.values;
        for (metric, value) in [
            (Metric::Humidity, values.hum),
            (Metric::Temperature, values.tmp),
            (Metric::Battery, values.bat),
        ] {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                series.values_mut(metric)[index] = Some(v);
            }
        }
    }

    tracing::debug!(
        "Grouped {} readings into {} devices over {} instants",
        readings.len(),
        devices.len(),
        instants.len()
    );

    GroupedDataset { devices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::{BucketValue, ReadingTime, ReadingValues, SensorReading};

    fn reading(name: &str, hum: Option<f64>, tmp: Option<f64>, ts: &str) -> SensorReading {
        SensorReading {
            name: name.to_string(),
            values: ReadingValues {
                hum,
                tmp,
                ..Default::default()
            },
            ts: Some(ReadingTime::Text(ts.to_string())),
        }
    }

    fn entry(ts: i64, readings: Vec<SensorReading>) -> BucketEntry {
        BucketEntry {
            ts,
            val: BucketValue { readings },
        }
    }

    #[test]
    fn test_group_readings_aligns_devices() {
        // 2025-01-01T10:00:00Z and 2025-01-01T11:00:00Z
        let first = 1_735_725_600_000;
        let second = first + 3_600_000;
        let entries = vec![
            entry(
                first,
                vec![
                    reading("A", Some(40.0), Some(20.0), "2025-01-01T10:00:00Z"),
                    reading("B", Some(50.0), None, "2025-01-01T10:00:00Z"),
                ],
            ),
            entry(second, vec![reading("A", Some(42.0), None, "2025-01-01T11:00:00Z")]),
        ];

        let grouped = group_readings(&entries, TimeRange::SixHours);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.axis(), ["10:00", "11:00"]);
        let a = grouped.get("A").unwrap();
        assert_eq!(a.humidity, vec![Some(40.0), Some(42.0)]);
        assert_eq!(a.temperature, vec![Some(20.0), None]);
        assert_eq!(a.battery, vec![None, None]);
        let b = grouped.get("B").unwrap();
        assert_eq!(b.humidity, vec![Some(50.0), None]);
        assert!(grouped.validate().is_ok());
    }

    #[test]
    fn test_group_readings_applies_clock_fix() {
        let root = 1_735_725_600_000;
        let entries = vec![entry(
            root,
            vec![reading("A", Some(40.0), None, "2000-01-01T00:00:00Z")],
        )];

        let grouped = group_readings(&entries, TimeRange::OneWeek);

        assert_eq!(grouped.axis(), ["01.01 10:00"]);
        assert_eq!(grouped.get("A").unwrap().humidity, vec![Some(40.0)]);
    }

    #[test]
    fn test_group_readings_skips_unnamed() {
        let entries = vec![entry(
            1_735_725_600_000,
            vec![reading("", Some(1.0), None, "2025-01-01T10:00:00Z")],
        )];

        let grouped = group_readings(&entries, TimeRange::OneHour);

        assert!(grouped.is_empty());
        assert!(grouped.axis().is_empty());
    }

    #[test]
    fn test_validate_reports_length_mismatch() {
        let mut series = DeviceSeries::empty(vec!["08:00".into(), "09:00".into()]);
        series.battery.pop();
        let mut dataset = GroupedDataset::new();
        dataset.insert("A", series);

        assert_eq!(
            dataset.validate(),
            Err(ForecastError::LengthMismatch {
                device: "A".to_string(),
                metric: Metric::Battery,
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_validate_reports_axis_mismatch() {
        let mut dataset = GroupedDataset::new();
        dataset.insert("A", DeviceSeries::empty(vec!["08:00".into(), "09:00".into()]));
        dataset.insert("B", DeviceSeries::empty(vec!["08:00".into()]));

        assert!(matches!(
            dataset.validate(),
            Err(ForecastError::AxisMismatch { device, expected: 2, actual: 1 }) if device == "B"
        ));
    }

    #[test]
    fn test_serializes_with_metric_keys() {
        let mut dataset = GroupedDataset::new();
        dataset.insert("A", DeviceSeries::empty(vec!["08:00".into()]));

        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"A": {"timestamps": ["08:00"], "hum": [null], "tmp": [null], "bat": [null]}})
        );
    }
}
