// Raw bucket payload: entries of per-device sensor readings
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Devices that fail to sync with NTP report instants far in the past (year 2000).
/// Any reading further than this from its bucket entry takes the entry's instant.
/// The 24h cutoff is a policy choice; late batch uploads beyond it get rewritten too.
pub const CLOCK_SKEW_LIMIT_MS: i64 = 24 * 60 * 60 * 1000;

/// One stored bucket item: the upload instant and the readings it carried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub ts: i64,
    #[serde(default)]
    pub val: BucketValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketValue {
    #[serde(default)]
    pub readings: Vec<SensorReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "n", default)]
    pub name: String,
    #[serde(rename = "r", default)]
    pub values: ReadingValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<ReadingTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp: Option<f64>,
}

/// Devices report either an ISO-8601 string or epoch milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingTime {
    Millis(i64),
    Text(String),
}

impl ReadingTime {
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            ReadingTime::Millis(ms) => Some(*ms),
            ReadingTime::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.timestamp_millis())
                .ok()
                .or_else(|| text.parse::<i64>().ok()),
        }
    }
}

impl SensorReading {
    /// Placeholder shown when a bucket holds no readings at all
    pub fn placeholder() -> Self {
        Self {
            name: "Name".to_string(),
            values: ReadingValues {
                bat: Some(0.0),
                hum: Some(0.0),
                operating: Some(0.0),
                pow: Some(0.0),
                tmp: Some(0.0),
            },
            ts: Some(ReadingTime::Millis(0)),
        }
    }

    pub fn timestamp_ms(&self) -> Option<i64> {
        self.ts.as_ref().and_then(ReadingTime::to_millis)
    }

    /// Replace a skewed reading instant with the bucket entry's instant.
    /// Returns true when the timestamp was rewritten.
    pub fn fix_timestamp(&mut self, root_ts: i64) -> bool {
        let Some(reading_ts) = self.timestamp_ms() else {
            return false;
        };
        if (root_ts - reading_ts).abs() <= CLOCK_SKEW_LIMIT_MS {
            return false;
        }
        match DateTime::<Utc>::from_timestamp_millis(root_ts) {
            Some(root) => {
                self.ts = Some(ReadingTime::Text(
                    root.to_rfc3339_opts(SecondsFormat::Millis, true),
                ));
                true
            }
            None => false,
        }
    }
}

fn room(name: &str, bat: f64, hum: f64, tmp: f64, power: Option<f64>, ts: &str) -> SensorReading {
    SensorReading {
        name: name.to_string(),
        values: ReadingValues {
            bat: Some(bat),
            hum: Some(hum),
            operating: power.map(|_| 1.0),
            pow: power,
            tmp: Some(tmp),
        },
        ts: Some(ReadingTime::Text(ts.to_string())),
    }
}

/// Built-in mock dataset used when no mock data has been stored
pub fn default_readings() -> Vec<BucketEntry> {
    const EVENING: &str = "2025-01-01T18:15:20Z";
    const MORNING: &str = "2025-01-01T08:44:41Z";

    vec![
        BucketEntry {
            ts: 1_736_241_322_343,
            val: BucketValue {
                readings: vec![
                    room("Room1", 83.0, 61.1, 19.71, Some(2.868), EVENING),
                    room("Room2", 91.0, 64.52, 21.24, Some(2.93), EVENING),
                    room("Room3", 20.0, 64.11, 20.37, Some(2.363), EVENING),
                    room("Room4", 66.0, 57.95, 19.7, None, EVENING),
                    room("Room5", 87.0, 66.95, 22.93, None, EVENING),
                ],
            },
        },
        BucketEntry {
            ts: 1_736_239_482_779,
            val: BucketValue {
                readings: vec![
                    room("Room2", 90.0, 65.1, 19.32, None, MORNING),
                    room("Room1", 84.0, 61.81, 21.84, None, MORNING),
                    room("Room3", 15.0, 64.81, 20.38, Some(2.324), MORNING),
                    room("Room4", 67.0, 60.47, 18.78, Some(2.741), MORNING),
                    room("Room5", 87.0, 66.42, 22.95, Some(2.899), MORNING),
                ],
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_payload() {
        let json = r#"[{"ts":1736241322343,"val":{"readings":[
            {"n":"Room1","r":{"bat":83,"hum":61.1,"tmp":19.71},"ts":"2025-01-01T18:15:20Z"},
            {"n":"Room2","r":{"hum":64.5},"ts":1735755320000}
        ]}}]"#;
        let entries: Vec<BucketEntry> = serde_json::from_str(json).unwrap();
        let readings = &entries[0].val.readings;

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].values.bat, Some(83.0));
        assert_eq!(readings[0].timestamp_ms(), Some(1_735_755_320_000));
        assert_eq!(readings[1].values.tmp, None);
        assert_eq!(readings[1].timestamp_ms(), Some(1_735_755_320_000));
    }

    #[test]
    fn test_fix_timestamp_replaces_unsynced_clock() {
        let mut reading = room("Room1", 1.0, 1.0, 1.0, None, "2000-01-01T00:00:00Z");
        let root = 1_735_755_320_000;

        assert!(reading.fix_timestamp(root));
        assert_eq!(reading.timestamp_ms(), Some(root));
        assert_eq!(
            reading.ts,
            Some(ReadingTime::Text("2025-01-01T18:15:20.000Z".to_string()))
        );
    }

    #[test]
    fn test_fix_timestamp_keeps_readings_within_a_day() {
        let mut reading = room("Room1", 1.0, 1.0, 1.0, None, "2025-01-01T08:44:41Z");
        let root = 1_735_755_320_000;

        assert!(!reading.fix_timestamp(root));
        assert_eq!(
            reading.ts,
            Some(ReadingTime::Text("2025-01-01T08:44:41Z".to_string()))
        );
    }

    #[test]
    fn test_fix_timestamp_ignores_unparseable() {
        let mut reading = room("Room1", 1.0, 1.0, 1.0, None, "garbage");
        assert!(!reading.fix_timestamp(0));

        let mut missing = SensorReading { ts: None, ..reading.clone() };
        assert!(!missing.fix_timestamp(0));
    }

    #[test]
    fn test_default_readings_cover_five_rooms() {
        let entries = default_readings();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.val.readings.len() == 5));
    }
}
