// History service - Use case for grouped history with forecasts
use crate::application::data_source::DataSource;
use crate::domain::device_names::DeviceNames;
use crate::domain::error::ForecastError;
use crate::domain::extrapolation::{
    ExtrapolationConfig, extrapolate, extrapolation_confidence, forecast_markers,
};
use crate::domain::metric::Metric;
use crate::domain::reading::BucketEntry;
use crate::domain::series::{GroupedDataset, group_readings};
use crate::domain::time_range::TimeRange;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type ConfidenceScores = BTreeMap<Metric, f64>;

/// History grouped per device, optionally extended with forecasts.
/// Indices at or past `original_len` are forecasts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub range: TimeRange,
    pub extrapolation: ExtrapolationConfig,
    pub original_len: usize,
    pub markers: Vec<bool>,
    pub dataset: GroupedDataset,
    pub confidence: BTreeMap<String, ConfidenceScores>,
    /// Display name per device id
    pub names: BTreeMap<String, String>,
}

#[derive(Clone)]
pub struct HistoryService {
    source: Arc<DataSource>,
}

impl HistoryService {
    pub fn new(source: Arc<DataSource>) -> Self {
        Self { source }
    }

    pub async fn forecast(
        &self,
        range: TimeRange,
        compare: bool,
        config: ExtrapolationConfig,
        names: &DeviceNames,
    ) -> anyhow::Result<ForecastView> {
        let entries = self.source.repository()?.history(range, compare).await?;
        tracing::debug!("Fetched {} bucket entries for {}", entries.len(), range);
        Ok(build_forecast_view(&entries, range, config, names)?)
    }
}

/// Confidence per metric over the window the forecast would use
pub fn confidence_scores(
    dataset: &GroupedDataset,
    config: &ExtrapolationConfig,
) -> BTreeMap<String, ConfidenceScores> {
    let window = config.effective_window_size(dataset.axis().len());
    dataset
        .devices()
        .map(|(device, series)| {
            let scores: ConfidenceScores = Metric::ALL
                .into_iter()
                .map(|metric| (metric, extrapolation_confidence(series.values(metric), window)))
                .collect();
            (device.to_string(), scores)
        })
        .collect()
}

pub fn build_forecast_view(
    entries: &[BucketEntry],
    range: TimeRange,
    config: ExtrapolationConfig,
    names: &DeviceNames,
) -> Result<ForecastView, ForecastError> {
    let grouped = group_readings(entries, range);
    let original_len = grouped.axis().len();
    let confidence = confidence_scores(&grouped, &config);
    let dataset = extrapolate(&grouped, &config)?;
    let markers = forecast_markers(original_len, dataset.axis().len());
    let names = names.for_devices(dataset.devices().map(|(device, _)| device));

    Ok(ForecastView {
        range,
        extrapolation: config,
        original_len,
        markers,
        dataset,
        confidence,
        names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_source::fakes::{FailingRepository, fixed};
    use crate::domain::extrapolation::ExtrapolationMethod;
    use crate::domain::reading::{BucketValue, ReadingTime, ReadingValues, SensorReading};

    // 2025-01-01T08:00:00Z
    const EIGHT_AM: i64 = 1_735_718_400_000;
    const HOUR: i64 = 3_600_000;

    fn hourly_entries(humidity: &[f64]) -> Vec<BucketEntry> {
        humidity
            .iter()
            .enumerate()
            .map(|(i, hum)| {
                let ts = EIGHT_AM + i as i64 * HOUR;
                BucketEntry {
                    ts,
                    val: BucketValue {
                        readings: vec![SensorReading {
                            name: "A".to_string(),
                            values: ReadingValues {
                                hum: Some(*hum),
                                ..Default::default()
                            },
                            ts: Some(ReadingTime::Millis(ts)),
                        }],
                    },
                }
            })
            .collect()
    }

    fn linear(points: usize) -> ExtrapolationConfig {
        ExtrapolationConfig {
            enabled: true,
            method: ExtrapolationMethod::Linear,
            points,
            window_size: None,
        }
    }

    #[test]
    fn test_view_marks_forecast_entries() {
        let entries = hourly_entries(&[40.0, 42.0, 44.0, 46.0, 48.0]);
        let names = DeviceNames::default();
        let view = build_forecast_view(&entries, TimeRange::TwelveHours, linear(2), &names).unwrap();

        assert_eq!(view.original_len, 5);
        assert_eq!(view.names["A"], "A");
        assert_eq!(view.markers, [false, false, false, false, false, true, true]);
        let a = view.dataset.get("A").unwrap();
        assert_eq!(a.timestamps[5..], ["13:00", "14:00"]);
        let forecast: Vec<f64> = a.humidity[5..].iter().map(|v| v.unwrap()).collect();
        assert!((forecast[0] - 50.0).abs() < 1e-9);
        assert!((forecast[1] - 52.0).abs() < 1e-9);
        assert!(view.confidence["A"][&Metric::Humidity] > 0.9);
        assert_eq!(view.confidence["A"][&Metric::Battery], 0.0);
    }

    #[test]
    fn test_view_without_extrapolation() {
        let entries = hourly_entries(&[40.0, 42.0]);
        let config = ExtrapolationConfig::default();
        let names = DeviceNames::default();
        let view = build_forecast_view(&entries, TimeRange::OneHour, config, &names).unwrap();

        assert_eq!(view.original_len, 2);
        assert_eq!(view.markers, [false, false]);
        assert_eq!(view.dataset.axis().len(), 2);
    }

    #[test]
    fn test_view_serializes_for_the_ui() {
        let entries = hourly_entries(&[40.0, 42.0]);
        let names: DeviceNames = "A:Living room".parse().unwrap();
        let view = build_forecast_view(&entries, TimeRange::SixHours, linear(1), &names).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["range"], "6h");
        assert_eq!(json["extrapolation"]["method"], "linear");
        assert_eq!(json["dataset"]["A"]["timestamps"][2], "10:00");
        assert!(json["confidence"]["A"]["hum"].is_number());
        assert_eq!(json["names"]["A"], "Living room");
    }

    #[test]
    fn test_view_rejects_oversized_point_count() {
        let entries = hourly_entries(&[40.0, 42.0]);
        let names = DeviceNames::default();
        let err = build_forecast_view(&entries, TimeRange::SixHours, linear(usize::MAX), &names)
            .unwrap_err();
        assert!(matches!(err, ForecastError::TooManyPoints { .. }));
    }

    #[tokio::test]
    async fn test_forecast_from_mock_source() {
        let source = DataSource::new(
            Some(Arc::new(FailingRepository)),
            fixed(hourly_entries(&[10.0, 10.0, 10.0, 10.0])),
            true,
        );
        let service = HistoryService::new(Arc::new(source));

        let view = service
            .forecast(TimeRange::SixHours, false, linear(3), &DeviceNames::default())
            .await
            .unwrap();
        let a = view.dataset.get("A").unwrap();
        assert_eq!(a.humidity[4..], [Some(10.0), Some(10.0), Some(10.0)]);
        assert_eq!(view.confidence["A"][&Metric::Humidity], 1.0);
    }

    #[tokio::test]
    async fn test_forecast_propagates_upstream_errors() {
        let source = DataSource::new(Some(Arc::new(FailingRepository)), fixed(Vec::new()), false);
        let service = HistoryService::new(Arc::new(source));

        let err = service
            .forecast(TimeRange::SixHours, false, linear(1), &DeviceNames::default())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ForecastError>().is_none());
    }
}
