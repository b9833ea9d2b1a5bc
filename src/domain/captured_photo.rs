use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A still taken from the live stream, encoded as PNG.
#[derive(Clone, PartialEq)]
pub struct CapturedPhoto {
    image_bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl CapturedPhoto {
    pub(crate) fn new(image_bytes: Vec<u8>, width: u32, height: u32) -> Self {
        CapturedPhoto {
            image_bytes,
            width,
            height,
        }
    }

    pub fn image_bytes(&self) -> &[u8] {
        &self.image_bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the photo as a `data:` URL, ready for an image preview.
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.image_bytes))
    }
}

impl std::fmt::Debug for CapturedPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedPhoto")
            .field("bytes", &self.image_bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureSessionState {
    pub is_open: bool,
}
