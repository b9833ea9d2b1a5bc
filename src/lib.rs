pub mod app_config;
pub mod attendance;
pub mod capture;
pub mod domain;
pub mod geo;
pub mod geofence;
pub mod position;
mod reference_point_deserializer;
