//! Camera access and still capture.
//!
//! The camera itself sits behind [`CaptureDevice`]; once access is granted it hands out a [`LiveStream`] that a
//! renderer can draw and that [`CaptureSession`] can copy the current frame from.

mod session;
pub mod test_pattern;

use async_trait::async_trait;
use image::RgbaImage;
pub use session::CaptureSession;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FacingMode {
    /// The camera facing the user.
    #[default]
    User,
    Environment,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing_mode: FacingMode,
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn request_access(&self, constraints: CaptureConstraints) -> Result<Box<dyn LiveStream>, CaptureError>;
}

pub trait LiveStream: Send + Sync {
    /// The current frame's width and height. `(0, 0)` until the first frame arrives.
    fn dimensions(&self) -> (u32, u32);

    /// Copies the current frame into `buffer`, which must match [`dimensions`](Self::dimensions).
    fn copy_frame(&self, buffer: &mut RgbaImage) -> Result<(), CaptureError>;

    /// False once the device ended the stream on its own.
    fn is_live(&self) -> bool;

    /// Stops every hardware track, releasing the device.
    fn stop_all_tracks(&mut self);
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture capability unavailable")]
    CapabilityUnavailable,
    #[error("Camera access denied")]
    PermissionDenied,
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("the capture session is not open")]
    NotOpen,
    #[error("no frame available yet")]
    FrameUnavailable,
    #[error("unable to encode the photo: {0}")]
    Encode(#[from] image::ImageError),
}
