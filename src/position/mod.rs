//! The seam to whatever reports the device's position.
//!
//! A [`PositionSource`] delivers fixes asynchronously through a [`FixSink`]. It never calls back synchronously from
//! `subscribe` or `request_once`; those only register the request and report whether the capability exists at all.

#[cfg(test)]
pub mod manual;
pub mod replay;
mod sink;

use serde::Deserialize;
pub use sink::FixSink;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use thiserror::Error;

pub trait PositionSource: Send + Sync {
    /// Starts a continuous subscription. Fixes and errors are delivered to `sink` until `unsubscribe` is called.
    fn subscribe(&self, options: PositionOptions, sink: FixSink) -> Result<SubscriptionId, PositionError>;

    /// Cancels a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Requests a single fix, delivered to `sink` exactly once as either a fix or an error.
    fn request_once(&self, options: PositionOptions, sink: FixSink) -> Result<(), PositionError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyMode {
    #[default]
    High,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// How long the source may take to produce a fix before reporting [`PositionError::Timeout`].
    pub timeout: Duration,
    /// The maximum age of a cached fix the source may hand out. Zero means always acquire a fresh fix.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        PositionOptions {
            high_accuracy: true,
            timeout: Duration::from_millis(10_000),
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PositionError {
    #[error("position capability unavailable")]
    CapabilityUnavailable,
    #[error("User denied Geolocation")]
    PermissionDenied,
    #[error("Timeout expired")]
    Timeout,
    #[error("{0}")]
    PositionUnavailable(String),
}
