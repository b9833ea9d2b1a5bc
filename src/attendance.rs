use crate::domain::{CapturedPhoto, PositionFix, ValidationState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Whether an attendance can be submitted: the position must be validated and a photo taken.
pub fn can_submit(state: &ValidationState, photo: Option<&CapturedPhoto>) -> bool {
    state.is_valid() && photo.is_some()
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttendanceRecord {
    pub photo: CapturedPhoto,
    pub fix: Option<PositionFix>,
    pub distance_meters: Option<f64>,
    pub submitted_at: DateTime<Utc>,
}

/// The end of the line for an attendance. No transport is defined yet.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, record: AttendanceRecord) -> Result<(), AttendanceError>;
}

/// Accepts every attendance and only logs it.
#[derive(Debug, Default)]
pub struct LoggingSubmitter;

#[async_trait]
impl Submitter for LoggingSubmitter {
    async fn submit(&self, record: AttendanceRecord) -> Result<(), AttendanceError> {
        info!(
            distance = ?record.distance_meters,
            width = record.photo.width(),
            height = record.photo.height(),
            "✅ Attendance submitted (frontend only)"
        );
        Ok(())
    }
}

#[instrument(skip_all)]
pub async fn submit(submitter: &dyn Submitter, state: &ValidationState, photo: Option<&CapturedPhoto>) -> Result<AttendanceRecord, AttendanceError> {
    let (Some(photo), true) = (photo, state.is_valid()) else {
        let error = AttendanceError::NotReady {
            location_valid: state.is_valid(),
            photo_taken: photo.is_some(),
        };
        warn!("⚠️ {}", error);
        return Err(error);
    };

    let record = AttendanceRecord {
        photo: photo.clone(),
        fix: state.last_fix().cloned(),
        distance_meters: state.distance_meters(),
        submitted_at: Utc::now(),
    };
    submitter.submit(record.clone()).await?;
    Ok(record)
}

#[derive(Error, Debug, PartialEq)]
pub enum AttendanceError {
    #[error("attendance not ready, location valid: {location_valid}, photo taken: {photo_taken}")]
    NotReady { location_valid: bool, photo_taken: bool },
    #[error("submission failed: {0}")]
    Submission(String),
}
