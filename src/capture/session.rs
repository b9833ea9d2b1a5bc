use crate::capture::{CaptureConstraints, CaptureDevice, CaptureError, FacingMode, LiveStream};
use crate::domain::{CaptureSessionState, CapturedPhoto};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Owns the camera while it is open and the most recent still taken from it.
///
/// Dropping the session closes it.
pub struct CaptureSession {
    device: Arc<dyn CaptureDevice>,
    stream: Option<Box<dyn LiveStream>>,
    photo: Option<CapturedPhoto>,
}

impl CaptureSession {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        CaptureSession {
            device,
            stream: None,
            photo: None,
        }
    }

    pub fn state(&self) -> CaptureSessionState {
        CaptureSessionState {
            is_open: self.stream.is_some(),
        }
    }

    pub fn photo(&self) -> Option<&CapturedPhoto> {
        self.photo.as_ref()
    }

    /// The live stream for a renderer to draw, while open.
    pub fn live_stream(&self) -> Option<&dyn LiveStream> {
        self.stream.as_deref()
    }

    #[instrument(skip(self))]
    pub async fn open(&mut self) -> Result<(), CaptureError> {
        if self.stream.is_some() {
            debug!("📷 Camera already open");
            return Ok(());
        }

        info!("📷 Opening camera...");
        let constraints = CaptureConstraints {
            facing_mode: FacingMode::User,
        };
        match self.device.request_access(constraints).await {
            Ok(stream) => {
                self.stream = Some(stream);
                info!("📷 Opening camera... OK");
                Ok(())
            }
            Err(error) => {
                warn!("📷 Opening camera... failed, {}", error);
                Err(error)
            }
        }
    }

    /// Stops every track and releases the device. Does nothing when not open.
    #[instrument(skip(self))]
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
            info!("📷 Camera closed");
        }
    }

    /// Freezes the current frame into a PNG still, replacing any earlier one.
    #[instrument(skip(self))]
    pub fn snapshot(&mut self) -> Result<&CapturedPhoto, CaptureError> {
        let stream = self.stream.as_deref().ok_or(CaptureError::NotOpen)?;

        if !stream.is_live() {
            warn!("📷 Camera stream ended, closing the session");
            self.close();
            return Err(CaptureError::DeviceUnavailable("the camera stream ended".to_string()));
        }

        let (width, height) = stream.dimensions();
        if width == 0 || height == 0 {
            return Err(CaptureError::FrameUnavailable);
        }

        let mut buffer = RgbaImage::new(width, height);
        stream.copy_frame(&mut buffer)?;

        let mut image_bytes = Vec::new();
        buffer.write_to(&mut Cursor::new(&mut image_bytes), ImageFormat::Png)?;

        info!(width, height, bytes = image_bytes.len(), "📸 Photo taken");
        Ok(&*self.photo.insert(CapturedPhoto::new(image_bytes, width, height)))
    }

    pub fn discard_photo(&mut self) {
        self.photo = None;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
