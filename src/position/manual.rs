use crate::domain::PositionFix;
use crate::position::{FixSink, PositionError, PositionOptions, PositionSource, SubscriptionId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A position source driven by hand from tests.
///
/// Cancelled subscriptions keep their sink around so a test can play a driver that still fires after being told
/// to stop.
#[derive(Debug, Default)]
pub struct ManualSource {
    unavailable: bool,
    next_id: AtomicU64,
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    subscriptions: Vec<(SubscriptionId, FixSink)>,
    cancelled: Vec<FixSink>,
    once: Vec<FixSink>,
    last_options: Option<PositionOptions>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        ManualSource {
            unavailable: true,
            ..Self::default()
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner().subscriptions.len()
    }

    pub fn pending_requests(&self) -> usize {
        self.inner().once.len()
    }

    pub fn last_options(&self) -> Option<PositionOptions> {
        self.inner().last_options
    }

    pub fn deliver_fix(&self, fix: PositionFix) {
        let sinks: Vec<FixSink> = self.inner().subscriptions.iter().map(|(_, sink)| sink.clone()).collect();
        sinks.into_iter().for_each(|sink| sink.fix(fix.clone()));
    }

    pub fn deliver_error(&self, error: PositionError) {
        let sinks: Vec<FixSink> = self.inner().subscriptions.iter().map(|(_, sink)| sink.clone()).collect();
        sinks.into_iter().for_each(|sink| sink.error(error.clone()));
    }

    /// Delivers a fix through subscriptions that were already cancelled.
    pub fn deliver_stale_fix(&self, fix: PositionFix) {
        let sinks = self.inner().cancelled.clone();
        sinks.into_iter().for_each(|sink| sink.fix(fix.clone()));
    }

    pub fn resolve_once(&self, fix: PositionFix) {
        let sinks = std::mem::take(&mut self.inner().once);
        sinks.into_iter().for_each(|sink| sink.fix(fix.clone()));
    }

    pub fn fail_once(&self, error: PositionError) {
        let sinks = std::mem::take(&mut self.inner().once);
        sinks.into_iter().for_each(|sink| sink.error(error.clone()));
    }
}

impl PositionSource for ManualSource {
    fn subscribe(&self, options: PositionOptions, sink: FixSink) -> Result<SubscriptionId, PositionError> {
        if self.unavailable {
            return Err(PositionError::CapabilityUnavailable);
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let mut inner = self.inner();
        inner.last_options = Some(options);
        inner.subscriptions.push((id, sink));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner();
        if let Some(index) = inner.subscriptions.iter().position(|(subscription_id, _)| *subscription_id == id) {
            let (_, sink) = inner.subscriptions.remove(index);
            inner.cancelled.push(sink);
        }
    }

    fn request_once(&self, options: PositionOptions, sink: FixSink) -> Result<(), PositionError> {
        if self.unavailable {
            return Err(PositionError::CapabilityUnavailable);
        }

        let mut inner = self.inner();
        inner.last_options = Some(options);
        inner.once.push(sink);
        Ok(())
    }
}
