/// The fixed point the geofence is centered on, in degrees.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct ReferencePoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl ReferencePoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        ReferencePoint { latitude, longitude }
    }
}
