// Tracked sensor metrics
use serde::{Deserialize, Serialize};

/// The three metrics every device series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "hum")]
    Humidity,
    #[serde(rename = "tmp")]
    Temperature,
    #[serde(rename = "bat")]
    Battery,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Humidity, Metric::Temperature, Metric::Battery];

    /// Short key used by the bucket payload and the JSON surface
    pub fn key(self) -> &'static str {
        match self {
            Metric::Humidity => "hum",
            Metric::Temperature => "tmp",
            Metric::Battery => "bat",
        }
    }
}
