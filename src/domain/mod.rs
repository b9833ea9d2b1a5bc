mod captured_photo;
mod position_fix;
mod reference_point;
mod validation_state;

pub use captured_photo::{CaptureSessionState, CapturedPhoto};
pub use position_fix::PositionFix;
pub use reference_point::ReferencePoint;
pub use validation_state::{LOCATING_MESSAGE, TOO_FAR_MESSAGE, ValidationState};
