use crate::domain::PositionFix;
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

pub const LOCATING_MESSAGE: &str = "Getting your location...";
pub const TOO_FAR_MESSAGE: &str = "You are too far from the office location.";

/// The tracker's judgement of the latest fix.
///
/// Only the most recent fix is kept. `is_valid` is true exactly when a distance is known and lies within the
/// configured radius. A fix inside the radius clears the error message; a later failure records its message next to
/// the stale validity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationState {
    last_fix: Option<PositionFix>,
    distance_meters: Option<f64>,
    is_valid: bool,
    error_message: Option<String>,
    is_tracking: bool,
    last_updated_at: Option<DateTime<Utc>>,
}

impl ValidationState {
    pub fn last_fix(&self) -> Option<&PositionFix> {
        self.last_fix.as_ref()
    }

    pub fn distance_meters(&self) -> Option<f64> {
        self.distance_meters
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated_at
    }

    pub(crate) fn begin_tracking(&mut self) {
        self.is_tracking = true;
        self.error_message = if self.is_valid { None } else { Some(LOCATING_MESSAGE.to_string()) };
    }

    pub(crate) fn end_tracking(&mut self) {
        self.is_tracking = false;
    }

    pub(crate) fn apply_fix(&mut self, fix: PositionFix, distance_meters: f64, max_distance_meters: f64, now: DateTime<Utc>) {
        self.is_valid = distance_meters <= max_distance_meters;
        self.error_message = if self.is_valid { None } else { Some(TOO_FAR_MESSAGE.to_string()) };
        self.last_fix = Some(fix);
        self.distance_meters = Some(distance_meters);
        self.last_updated_at = Some(now);
    }

    /// Records a failure. The last known fix and its validity are kept for display, but a consumer should treat
    /// them as stale once tracking has stopped.
    pub(crate) fn apply_error(&mut self, message: impl Into<String>) {
        self.is_tracking = false;
        self.error_message = Some(message.into());
    }
}

impl Display for ValidationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.distance_meters {
            Some(distance) => {
                let validity = if self.is_valid { "valid" } else { "invalid" };
                write!(f, "{}, {:.2} meter from the reference point", validity, distance)?;
            }
            None => write!(f, "unknown")?,
        }

        match &self.error_message {
            Some(message) => write!(f, ": {}", message),
            None => Ok(()),
        }
    }
}
