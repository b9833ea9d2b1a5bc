use crate::domain::PositionFix;
use crate::position::PositionError;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type FixCallback = Arc<dyn Fn(PositionFix) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(PositionError) + Send + Sync>;

/// Where a [`PositionSource`](crate::position::PositionSource) delivers its results.
#[derive(Clone)]
pub struct FixSink {
    on_fix: FixCallback,
    on_error: ErrorCallback,
}

impl FixSink {
    pub fn new(on_fix: impl Fn(PositionFix) + Send + Sync + 'static, on_error: impl Fn(PositionError) + Send + Sync + 'static) -> Self {
        FixSink {
            on_fix: Arc::new(on_fix),
            on_error: Arc::new(on_error),
        }
    }

    pub fn fix(&self, fix: PositionFix) {
        (self.on_fix)(fix)
    }

    pub fn error(&self, error: PositionError) {
        (self.on_error)(error)
    }
}

impl Debug for FixSink {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("FixSink")
    }
}
