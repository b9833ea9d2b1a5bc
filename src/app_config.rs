use crate::domain::ReferencePoint;
use crate::geofence::GeofenceConfig;
use crate::position::AccuracyMode;
use config::{Config, ConfigError};
use serde::de::Error;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    geofence: Geofence,
    replay: Replay,
    camera: Camera,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::with_prefix("PRESENCE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn geofence(&self) -> &Geofence {
        &self.geofence
    }

    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

#[derive(Debug, Deserialize)]
pub struct Geofence {
    reference: ReferencePoint,
    #[serde(default = "default_max_distance_m", deserialize_with = "positive_distance")]
    max_distance_m: f64,
    #[serde(default)]
    accuracy: AccuracyMode,
    #[serde(default = "default_fix_timeout_ms")]
    fix_timeout_ms: u64,
    #[serde(default)]
    max_fix_age_ms: u64,
}

impl Geofence {
    pub fn reference(&self) -> ReferencePoint {
        self.reference
    }

    pub fn max_distance_m(&self) -> f64 {
        self.max_distance_m
    }

    pub fn fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fix_timeout_ms)
    }

    pub fn max_fix_age(&self) -> Duration {
        Duration::from_millis(self.max_fix_age_ms)
    }

    pub fn to_config(&self) -> GeofenceConfig {
        GeofenceConfig {
            reference_point: self.reference,
            max_distance_meters: self.max_distance_m,
            accuracy: self.accuracy,
            fix_timeout: self.fix_timeout(),
            max_fix_age: self.max_fix_age(),
        }
    }
}

fn default_max_distance_m() -> f64 {
    150.0
}

fn default_fix_timeout_ms() -> u64 {
    10_000
}

fn positive_distance<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let distance = f64::deserialize(deserializer)?;
    if !(distance.is_finite() && distance > 0.0) {
        return Err(Error::custom(format!("invalid max distance: {}, must be a positive number of meters", distance)));
    }
    Ok(distance)
}

#[derive(Debug, Deserialize)]
pub struct Replay {
    fixes_file: String,
    #[serde(with = "humantime_serde")]
    interval: Duration,
}

impl Replay {
    pub fn fixes_file(&self) -> &Path {
        Path::new(&self.fixes_file)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[derive(Debug, Deserialize)]
pub struct Camera {
    width: u32,
    height: u32,
}

impl Camera {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                geofence: Geofence {
                    reference: ReferencePoint::new(-7.3106665, 112.7735401),
                    max_distance_m: 150.0,
                    accuracy: AccuracyMode::High,
                    fix_timeout_ms: 10_000,
                    max_fix_age_ms: 0,
                },
                replay: Replay {
                    fixes_file: "tests/resources/fixes/office_walk.json".to_string(),
                    interval: Duration::from_secs(1),
                },
                camera: Camera { width: 640, height: 480 },
            },
        }
    }

    pub fn max_distance_m(mut self, max_distance_m: f64) -> Self {
        self.config.geofence.max_distance_m = max_distance_m;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
