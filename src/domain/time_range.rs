// History window selection and axis label formatting
use crate::domain::error::ForecastError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HOUR_MS: i64 = 3600 * 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    OneHour,
    #[default]
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "48h")]
    TwoDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "2w")]
    TwoWeeks,
    #[serde(rename = "1m")]
    OneMonth,
}

impl TimeRange {
    pub fn hours(self) -> i64 {
        match self {
            TimeRange::OneHour => 1,
            TimeRange::SixHours => 6,
            TimeRange::TwelveHours => 12,
            TimeRange::OneDay => 24,
            TimeRange::TwoDays => 48,
            TimeRange::OneWeek => 7 * 24,
            TimeRange::TwoWeeks => 14 * 24,
            TimeRange::OneMonth => 30 * 24,
        }
    }

    pub fn duration_ms(self) -> i64 {
        self.hours() * HOUR_MS
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::SixHours => "6h",
            TimeRange::TwelveHours => "12h",
            TimeRange::OneDay => "24h",
            TimeRange::TwoDays => "48h",
            TimeRange::OneWeek => "1w",
            TimeRange::TwoWeeks => "2w",
            TimeRange::OneMonth => "1m",
        }
    }

    /// Ranges spanning more than a day carry the date in their labels
    pub fn shows_date(self) -> bool {
        self.hours() >= 48
    }

    /// Format an instant (ms since epoch, UTC) as an axis label.
    /// `HH:MM` for short ranges, `MM.DD HH:MM` otherwise.
    pub fn format_label(self, ts_ms: i64) -> String {
        let Some(instant) = DateTime::<Utc>::from_timestamp_millis(ts_ms) else {
            return ts_ms.to_string();
        };
        if self.shows_date() {
            instant.format("%m.%d %H:%M").to_string()
        } else {
            instant.format("%H:%M").to_string()
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(TimeRange::OneHour),
            "6h" => Ok(TimeRange::SixHours),
            "12h" => Ok(TimeRange::TwelveHours),
            "24h" => Ok(TimeRange::OneDay),
            "48h" => Ok(TimeRange::TwoDays),
            "1w" => Ok(TimeRange::OneWeek),
            "2w" => Ok(TimeRange::TwoWeeks),
            "1m" => Ok(TimeRange::OneMonth),
            other => Err(ForecastError::UnknownTimeRange(other.to_string())),
        }
    }
}
