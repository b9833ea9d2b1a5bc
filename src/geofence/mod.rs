mod tracker;

pub use tracker::{GeofenceConfig, GeofenceTracker};
