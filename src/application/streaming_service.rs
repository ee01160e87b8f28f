// Streaming forecast service - Progressive per-device loading
use crate::application::data_source::DataSource;
use crate::application::history_service::{ConfidenceScores, confidence_scores};
use crate::domain::device_names::DeviceNames;
use crate::domain::extrapolation::ExtrapolationConfig;
use crate::domain::extrapolation::engine::{extend_axis, extrapolate_series};
use crate::domain::series::{DeviceSeries, group_readings};
use crate::domain::time_range::TimeRange;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Messages of the progressive stream: the axis first, then one message per
/// device as its forecast completes, then a completion marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    Axis {
        timestamps: Vec<String>,
        original_len: usize,
        devices: Vec<String>,
        /// Display name per device id
        names: BTreeMap<String, String>,
    },
    Device {
        device: String,
        series: DeviceSeries,
        confidence: ConfidenceScores,
    },
    Complete {
        devices: usize,
        duration_ms: i64,
    },
}

#[derive(Clone)]
pub struct StreamingForecastService {
    source: Arc<DataSource>,
}

impl StreamingForecastService {
    pub fn new(source: Arc<DataSource>) -> Self {
        Self { source }
    }

    pub async fn stream_forecast(
        &self,
        range: TimeRange,
        compare: bool,
        config: ExtrapolationConfig,
        names: &DeviceNames,
    ) -> anyhow::Result<mpsc::Receiver<StreamMessage>> {
        let start_time = Instant::now();
        config.validate()?;

        // 0. Fetch and group before anything is sent so upstream failures surface as errors
        let entries = self.source.repository()?.history(range, compare).await?;
        let grouped = group_readings(&entries, range);
        grouped.validate()?;

        let axis = grouped.axis().to_vec();
        let original_len = axis.len();
        let active = config.is_active() && original_len > 0;
        let window = config.effective_window_size(original_len);
        let extended_axis = Arc::new(if active {
            extend_axis(&axis, config.points)
        } else {
            axis
        });
        let mut confidence = confidence_scores(&grouped, &config);

        let (tx, rx) = mpsc::channel(100);

        // 1. Send the axis immediately
        let axis_msg = StreamMessage::Axis {
            timestamps: extended_axis.to_vec(),
            original_len,
            devices: grouped.device_ids(),
            names: names.for_devices(grouped.devices().map(|(device, _)| device)),
        };
        let _ = tx.send(axis_msg).await;

        // 2. One task per device; devices are independent
        let mut tasks = Vec::with_capacity(grouped.len());
        for (device, series) in grouped.devices() {
            let tx = tx.clone();
            let device = device.to_string();
            let series = series.clone();
            let extended_axis = extended_axis.clone();
            let scores = confidence.remove(&device).unwrap_or_default();

            tasks.push(tokio::spawn(async move {
                let series = if active {
                    extrapolate_series(&series, &extended_axis, config.method, config.points, window)
                } else {
                    series
                };
                let msg = StreamMessage::Device {
                    device,
                    series,
                    confidence: scores,
                };
                let _ = tx.send(msg).await;
            }));
        }

        tracing::debug!(
            "Streaming {} devices for {} ({} forecast points)",
            tasks.len(),
            range,
            if active { config.points } else { 0 }
        );

        // 3. Completion once every device task has finished
        let total_devices = tasks.len();
        tokio::spawn(async move {
            for result in futures::future::join_all(tasks).await {
                if let Err(e) = result {
                    tracing::error!("Device forecast task failed: {}", e);
                }
            }
            let duration_ms = start_time.elapsed().as_millis() as i64;
            let msg = StreamMessage::Complete {
                devices: total_devices,
                duration_ms,
            };
            let _ = tx.send(msg).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_source::fakes::{FailingRepository, fixed};
    use crate::domain::error::ForecastError;
    use crate::domain::extrapolation::ExtrapolationMethod;
    use crate::domain::reading::default_readings;

    fn service(use_mock: bool) -> StreamingForecastService {
        let source = DataSource::new(
            Some(Arc::new(FailingRepository)),
            fixed(default_readings()),
            use_mock,
        );
        StreamingForecastService::new(Arc::new(source))
    }

    async fn collect(mut rx: mpsc::Receiver<StreamMessage>) -> Vec<StreamMessage> {
        let mut messages = Vec::new();
        while let Some(msg) = rx.recv().await {
            messages.push(msg);
        }
        messages
    }

    #[tokio::test]
    async fn test_stream_sends_axis_devices_then_completion() {
        let config = ExtrapolationConfig {
            enabled: true,
            method: ExtrapolationMethod::Exponential,
            points: 3,
            window_size: None,
        };
        let names: DeviceNames = "Room1:Kitchen".parse().unwrap();
        let rx = service(true)
            .stream_forecast(TimeRange::OneWeek, false, config, &names)
            .await
            .unwrap();
        let messages = collect(rx).await;

        assert_eq!(messages.len(), 7);
        let StreamMessage::Axis {
            timestamps,
            original_len,
            devices,
            names,
        } = &messages[0]
        else {
            panic!("expected axis first, got {:?}", messages[0]);
        };
        assert_eq!(*original_len, 2);
        assert_eq!(timestamps.len(), 5);
        assert_eq!(devices.len(), 5);
        assert_eq!(names["Room1"], "Kitchen");
        assert_eq!(names["Room2"], "Room2");

        for msg in &messages[1..6] {
            let StreamMessage::Device { series, .. } = msg else {
                panic!("expected device message, got {msg:?}");
            };
            assert_eq!(series.humidity.len(), 5);
            assert_eq!(&series.timestamps, timestamps);
        }
        assert!(matches!(messages[6], StreamMessage::Complete { devices: 5, .. }));
    }

    #[tokio::test]
    async fn test_stream_without_extrapolation_keeps_history() {
        let rx = service(true)
            .stream_forecast(
                TimeRange::OneWeek,
                false,
                ExtrapolationConfig::default(),
                &DeviceNames::default(),
            )
            .await
            .unwrap();
        let messages = collect(rx).await;

        assert!(matches!(&messages[0], StreamMessage::Axis { timestamps, .. } if timestamps.len() == 2));
    }

    #[tokio::test]
    async fn test_stream_surfaces_upstream_errors() {
        let result = service(false)
            .stream_forecast(
                TimeRange::SixHours,
                false,
                ExtrapolationConfig::default(),
                &DeviceNames::default(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stream_rejects_oversized_point_count() {
        let config = ExtrapolationConfig {
            enabled: true,
            points: usize::MAX,
            ..Default::default()
        };
        let err = service(true)
            .stream_forecast(TimeRange::OneWeek, false, config, &DeviceNames::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ForecastError>(),
            Some(ForecastError::TooManyPoints { .. })
        ));
    }

    #[test]
    fn test_messages_are_tagged() {
        let msg = StreamMessage::Complete {
            devices: 2,
            duration_ms: 15,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({"type": "complete", "devices": 2, "duration_ms": 15})
        );
    }
}
