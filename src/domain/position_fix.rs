use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One reported position sample.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        PositionFix {
            latitude,
            longitude,
            timestamp: Utc::now(),
        }
    }

    pub fn at(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        PositionFix {
            latitude,
            longitude,
            timestamp,
        }
    }
}
