use crate::capture::{CaptureConstraints, CaptureDevice, CaptureError, FacingMode, LiveStream};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
    Absent,
}

/// A synthetic front camera that renders a moving gradient. Used where no real camera is attached.
#[derive(Debug)]
pub struct TestPatternDevice {
    access: Access,
    resolution: Arc<Mutex<(u32, u32)>>,
    live: Arc<AtomicBool>,
    open_tracks: Arc<AtomicUsize>,
}

impl TestPatternDevice {
    pub fn new(width: u32, height: u32) -> Self {
        TestPatternDevice {
            access: Access::Granted,
            resolution: Arc::new(Mutex::new((width, height))),
            live: Arc::new(AtomicBool::new(true)),
            open_tracks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Changes the frame size of the running stream, like a camera switching orientation.
    pub fn set_resolution(&self, width: u32, height: u32) {
        *self.resolution.lock().unwrap_or_else(PoisonError::into_inner) = (width, height);
    }

    /// Ends every stream as if the camera was unplugged.
    pub fn disconnect(&self) {
        self.live.store(false, Ordering::Relaxed);
    }

    /// The number of tracks that were started and not stopped yet.
    pub fn open_tracks(&self) -> usize {
        self.open_tracks.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CaptureDevice for TestPatternDevice {
    async fn request_access(&self, constraints: CaptureConstraints) -> Result<Box<dyn LiveStream>, CaptureError> {
        match self.access {
            Access::Denied => return Err(CaptureError::PermissionDenied),
            Access::Absent => return Err(CaptureError::DeviceUnavailable("no camera found".to_string())),
            Access::Granted => {}
        }

        if constraints.facing_mode != FacingMode::User {
            return Err(CaptureError::DeviceUnavailable(format!("no camera facing {:?}", constraints.facing_mode)));
        }

        self.live.store(true, Ordering::Relaxed);
        self.open_tracks.fetch_add(1, Ordering::Relaxed);
        info!("📷 Test pattern camera started");

        Ok(Box::new(TestPatternStream {
            resolution: self.resolution.clone(),
            live: self.live.clone(),
            open_tracks: self.open_tracks.clone(),
            frame_count: AtomicU64::new(0),
            stopped: false,
        }))
    }
}

struct TestPatternStream {
    resolution: Arc<Mutex<(u32, u32)>>,
    live: Arc<AtomicBool>,
    open_tracks: Arc<AtomicUsize>,
    frame_count: AtomicU64,
    stopped: bool,
}

impl LiveStream for TestPatternStream {
    fn dimensions(&self) -> (u32, u32) {
        *self.resolution.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn copy_frame(&self, buffer: &mut RgbaImage) -> Result<(), CaptureError> {
        if buffer.dimensions() != self.dimensions() || buffer.width() == 0 || buffer.height() == 0 {
            return Err(CaptureError::FrameUnavailable);
        }

        let frame = self.frame_count.fetch_add(1, Ordering::Relaxed);
        let (width, height) = buffer.dimensions();
        for (x, y, pixel) in buffer.enumerate_pixels_mut() {
            let red = (x * 255 / width) as u8;
            let green = (y * 255 / height) as u8;
            let blue = ((x as u64 + y as u64 + frame) % 256) as u8;
            *pixel = Rgba([red, green, blue, 255]);
        }

        Ok(())
    }

    fn is_live(&self) -> bool {
        !self.stopped && self.live.load(Ordering::Relaxed)
    }

    fn stop_all_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_tracks.fetch_sub(1, Ordering::Relaxed);
            debug!("📷 Test pattern camera track stopped");
        }
    }
}
