use crate::domain::{PositionFix, ReferencePoint, ValidationState};
use crate::geo::distance_in_meters;
use crate::position::{AccuracyMode, FixSink, PositionError, PositionOptions, PositionSource, SubscriptionId};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

const NOT_LIVE: u64 = 0;

#[derive(Clone, Debug, PartialEq)]
pub struct GeofenceConfig {
    pub reference_point: ReferencePoint,
    pub max_distance_meters: f64,
    pub accuracy: AccuracyMode,
    pub fix_timeout: Duration,
    /// Zero rejects cached fixes.
    pub max_fix_age: Duration,
}

impl GeofenceConfig {
    pub fn new(reference_point: ReferencePoint) -> Self {
        GeofenceConfig {
            reference_point,
            max_distance_meters: 150.0,
            accuracy: AccuracyMode::High,
            fix_timeout: Duration::from_millis(10_000),
            max_fix_age: Duration::ZERO,
        }
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.accuracy == AccuracyMode::High,
            timeout: self.fix_timeout,
            maximum_age: self.max_fix_age,
        }
    }
}

/// Keeps a live judgement of whether the device is within `max_distance_meters` of the reference point.
///
/// Whoever calls [`start`](Self::start) owns the subscription; dropping the tracker stops it.
pub struct GeofenceTracker {
    shared: Arc<Shared>,
    source: Arc<dyn PositionSource>,
    options: PositionOptions,
    subscription: Option<(SubscriptionId, u64)>,
    next_epoch: u64,
}

impl GeofenceTracker {
    pub fn new(config: GeofenceConfig, source: Arc<dyn PositionSource>) -> Self {
        let (state, _) = watch::channel(ValidationState::default());
        GeofenceTracker {
            options: config.position_options(),
            shared: Arc::new(Shared {
                reference_point: config.reference_point,
                max_distance_meters: config.max_distance_meters,
                state,
                live: AtomicU64::new(NOT_LIVE),
            }),
            source,
            subscription: None,
            next_epoch: NOT_LIVE,
        }
    }

    pub fn state(&self) -> ValidationState {
        self.shared.state.borrow().clone()
    }

    /// Returns a receiver that is notified on every state change.
    pub fn watch(&self) -> watch::Receiver<ValidationState> {
        self.shared.state.subscribe()
    }

    #[instrument(skip(self))]
    pub fn start(&mut self) {
        if let Some((id, epoch)) = self.subscription
            && self.shared.is_tracking_with(epoch)
        {
            debug!(subscription = %id, "📍 Already tracking");
            return;
        }

        self.release_subscription();
        self.next_epoch += 1;
        let epoch = self.next_epoch;

        info!("📍 Start tracking...");
        self.shared.state.send_modify(|state| {
            self.shared.live.store(epoch, Ordering::Relaxed);
            state.begin_tracking();
        });

        let sink = Shared::sink(&self.shared, Some(epoch));
        match self.source.subscribe(self.options, sink) {
            Ok(id) => {
                self.subscription = Some((id, epoch));
                info!(subscription = %id, "📍 Start tracking... OK");
            }
            Err(error) => {
                warn!("📍 Start tracking... failed, {}", error);
                self.shared.handle_error(error, Some(epoch));
            }
        }
    }

    /// Cancels the subscription. Once this returns, nothing the source still delivers for it changes the state.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        self.shared.state.send_if_modified(|state| {
            self.shared.live.store(NOT_LIVE, Ordering::Relaxed);
            let was_tracking = state.is_tracking();
            state.end_tracking();
            was_tracking
        });

        if self.release_subscription() {
            info!("📍 Stopped tracking");
        }
    }

    /// Requests one fresh fix next to the continuous subscription, whether or not tracking is active.
    ///
    /// A failed request records its message and marks tracking as ended, but the subscription keeps delivering
    /// until [`stop`](Self::stop). A later [`start`](Self::start) subscribes anew.
    #[instrument(skip(self))]
    pub fn refresh_once(&self) {
        debug!("📍 Requesting a single fix...");
        let sink = Shared::sink(&self.shared, None);
        if let Err(error) = self.source.request_once(self.options, sink) {
            warn!("📍 Requesting a single fix... failed, {}", error);
            self.shared.handle_error(error, None);
        }
    }

    fn release_subscription(&mut self) -> bool {
        match self.subscription.take() {
            Some((id, _)) => {
                self.source.unsubscribe(id);
                true
            }
            None => false,
        }
    }
}

impl Drop for GeofenceTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Shared {
    reference_point: ReferencePoint,
    max_distance_meters: f64,
    state: watch::Sender<ValidationState>,
    /// The epoch of the subscription whose deliveries are accepted. Only touched while holding the state lock.
    live: AtomicU64,
}

impl Shared {
    /// A sink for the subscription with `epoch`, or for a single request when `None`.
    fn sink(shared: &Arc<Shared>, epoch: Option<u64>) -> FixSink {
        let on_fix = Arc::downgrade(shared);
        let on_error = Arc::downgrade(shared);
        FixSink::new(
            move |fix| {
                if let Some(shared) = Weak::upgrade(&on_fix) {
                    shared.handle_fix(fix, epoch);
                }
            },
            move |error| {
                if let Some(shared) = Weak::upgrade(&on_error) {
                    shared.handle_error(error, epoch);
                }
            },
        )
    }

    fn is_tracking_with(&self, epoch: u64) -> bool {
        let state = self.state.borrow();
        state.is_tracking() && self.live.load(Ordering::Relaxed) == epoch
    }

    fn accepts(&self, epoch: Option<u64>) -> bool {
        epoch.is_none_or(|epoch| self.live.load(Ordering::Relaxed) == epoch)
    }

    fn handle_fix(&self, fix: PositionFix, epoch: Option<u64>) {
        let reference = self.reference_point;
        let distance = distance_in_meters(fix.latitude, fix.longitude, reference.latitude, reference.longitude);
        let (latitude, longitude) = (fix.latitude, fix.longitude);

        let applied = self.state.send_if_modified(|state| {
            if !self.accepts(epoch) {
                return false;
            }
            state.apply_fix(fix, distance, self.max_distance_meters, Utc::now());
            true
        });

        if applied {
            info!(latitude, longitude, "📍 Location updated, {:.2} meter from the reference point", distance);
        } else {
            debug!(latitude, longitude, "📍 Ignoring fix from a cancelled subscription");
        }
    }

    fn handle_error(&self, error: PositionError, epoch: Option<u64>) {
        let message = error.to_string();
        let applied = self.state.send_if_modified(|state| {
            if !self.accepts(epoch) {
                return false;
            }
            if epoch.is_some() {
                self.live.store(NOT_LIVE, Ordering::Relaxed);
            }
            state.apply_error(message);
            true
        });

        if applied {
            warn!("⚠️ Position error: {}", error);
        }
    }
}
