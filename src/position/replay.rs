use crate::domain::PositionFix;
use crate::position::{FixSink, PositionError, PositionOptions, PositionSource, SubscriptionId};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

/// A position source that replays recorded fixes, one per `interval`, as if they were reported live.
///
/// Every replayed fix is stamped with the time it is delivered. A subscription whose timeout is shorter than the
/// interval reports [`PositionError::Timeout`] instead and ends. Needs a running tokio runtime.
#[derive(Debug)]
pub struct ReplaySource {
    fixes: Arc<Vec<PositionFix>>,
    interval: Duration,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
    last_delivered: Arc<Mutex<Option<(PositionFix, Instant)>>>,
}

impl ReplaySource {
    pub fn new(fixes: Vec<PositionFix>, interval: Duration) -> Self {
        ReplaySource {
            fixes: Arc::new(fixes),
            interval,
            next_id: AtomicU64::new(0),
            tasks: Mutex::new(HashMap::new()),
            last_delivered: Arc::new(Mutex::new(None)),
        }
    }

    /// Loads a JSON array of `{"latitude": .., "longitude": ..}` objects.
    #[instrument]
    pub async fn load(path: &Path, interval: Duration) -> Result<Self, ReplayError> {
        info!("📁 Loading recorded fixes...");
        let content = fs::read_to_string(path).await.map_err(|source| ReplayError::Io {
            source,
            path: path.to_path_buf(),
        })?;

        let fixes: Vec<PositionFix> = serde_json::from_str(&content).map_err(|source| ReplayError::Json {
            source,
            path: path.to_path_buf(),
        })?;

        if fixes.is_empty() {
            return Err(ReplayError::Empty(path.to_path_buf()));
        }

        info!("📁 Loading recorded fixes... OK, {} loaded", fixes.len());
        Ok(Self::new(fixes, interval))
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<SubscriptionId, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn runtime() -> Result<Handle, PositionError> {
        Handle::try_current().map_err(|_| PositionError::CapabilityUnavailable)
    }
}

impl PositionSource for ReplaySource {
    #[instrument(skip(self, sink))]
    fn subscribe(&self, options: PositionOptions, sink: FixSink) -> Result<SubscriptionId, PositionError> {
        let runtime = Self::runtime()?;
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        let fixes = self.fixes.clone();
        let interval = self.interval;
        let last_delivered = self.last_delivered.clone();
        let handle = runtime.spawn(async move {
            for recorded in fixes.iter() {
                if interval > options.timeout {
                    sleep(options.timeout).await;
                    warn!(subscription = %id, "⏳ No fix within {:?}", options.timeout);
                    sink.error(PositionError::Timeout);
                    return;
                }

                sleep(interval).await;
                let fix = PositionFix::new(recorded.latitude, recorded.longitude);
                debug!(subscription = %id, "📍 Replaying fix ({}, {})", fix.latitude, fix.longitude);
                *last_delivered.lock().unwrap_or_else(PoisonError::into_inner) = Some((fix.clone(), Instant::now()));
                sink.fix(fix);
            }
            debug!(subscription = %id, "📍 Replay finished");
        });

        let mut tasks = self.tasks();
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.insert(id, handle);
        Ok(id)
    }

    #[instrument(skip(self))]
    fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(handle) = self.tasks().remove(&id) {
            handle.abort();
            debug!("📍 Cancelled replay subscription {}", id);
        }
    }

    #[instrument(skip(self, sink))]
    fn request_once(&self, options: PositionOptions, sink: FixSink) -> Result<(), PositionError> {
        let runtime = Self::runtime()?;

        let last_delivered = self.last_delivered.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let cached = last_delivered
            .as_ref()
            .filter(|(_, delivered_at)| delivered_at.elapsed() <= options.maximum_age && !options.maximum_age.is_zero())
            .map(|(fix, _)| fix.clone());

        let current = last_delivered.map(|(fix, _)| fix).or_else(|| self.fixes.first().cloned());
        let interval = self.interval;
        runtime.spawn(async move {
            if let Some(fix) = cached {
                debug!("📍 Serving cached fix");
                sink.fix(fix);
                return;
            }

            if interval > options.timeout {
                sleep(options.timeout).await;
                sink.error(PositionError::Timeout);
                return;
            }

            sleep(interval).await;
            match current {
                Some(fix) => sink.fix(PositionFix::new(fix.latitude, fix.longitude)),
                None => sink.error(PositionError::PositionUnavailable("No recorded fixes to replay".to_string())),
            }
        });

        Ok(())
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        for (_, handle) in self.tasks().drain() {
            handle.abort();
        }
    }
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("unable to read '{}': {}", path.display(), source)]
    Io { source: io::Error, path: PathBuf },
    #[error("invalid fixes in '{}': {}", path.display(), source)]
    Json { source: serde_json::Error, path: PathBuf },
    #[error("no fixes recorded in '{}'", .0.display())]
    Empty(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;
    use tokio::sync::mpsc;

    fn channel_sink() -> (FixSink, mpsc::UnboundedReceiver<Result<PositionFix, PositionError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let error_tx = tx.clone();
        let sink = FixSink::new(
            move |fix| {
                let _ = tx.send(Ok(fix));
            },
            move |error| {
                let _ = error_tx.send(Err(error));
            },
        );
        (sink, rx)
    }

    fn options(timeout_ms: u64) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_millis(timeout_ms),
            ..PositionOptions::default()
        }
    }

    fn fixes() -> Vec<PositionFix> {
        vec![PositionFix::new(-7.3106665, 112.7735401), PositionFix::new(-7.32, 112.78)]
    }

    #[test(tokio::test(start_paused = true))]
    async fn subscribe_replays_fixes_in_order() {
        let source = ReplaySource::new(fixes(), Duration::from_millis(100));
        let (sink, mut rx) = channel_sink();

        source.subscribe(options(1_000), sink).unwrap();

        let first = rx.recv().await.unwrap().unwrap();
        let second = rx.recv().await.unwrap().unwrap();
        assert_eq!((first.latitude, first.longitude), (-7.3106665, 112.7735401));
        assert_eq!((second.latitude, second.longitude), (-7.32, 112.78));
    }

    #[test(tokio::test(start_paused = true))]
    async fn subscribe_reports_timeout_when_interval_exceeds_it() {
        let source = ReplaySource::new(fixes(), Duration::from_millis(500));
        let (sink, mut rx) = channel_sink();

        source.subscribe(options(100), sink).unwrap();

        assert_eq!(rx.recv().await.unwrap(), Err(PositionError::Timeout));
        assert!(rx.recv().await.is_none(), "the subscription ends after a timeout");
    }

    #[test(tokio::test(start_paused = true))]
    async fn unsubscribe_stops_the_replay() {
        let source = ReplaySource::new(fixes(), Duration::from_millis(100));
        let (sink, mut rx) = channel_sink();

        let id = source.subscribe(options(1_000), sink).unwrap();
        source.unsubscribe(id);

        assert!(rx.recv().await.is_none());
    }

    #[test(tokio::test(start_paused = true))]
    async fn finished_replays_are_forgotten_on_the_next_subscribe() {
        let source = ReplaySource::new(fixes(), Duration::from_millis(500));
        let (sink, mut rx) = channel_sink();
        source.subscribe(options(100), sink).unwrap();
        assert_eq!(rx.recv().await.unwrap(), Err(PositionError::Timeout));
        assert!(rx.recv().await.is_none());
        tokio::task::yield_now().await;

        let (sink, _rx) = channel_sink();
        let id = source.subscribe(options(100), sink).unwrap();

        let tasks = source.tasks();
        assert_eq!(tasks.len(), 1);
        assert!(tasks.contains_key(&id));
    }

    #[test(tokio::test(start_paused = true))]
    async fn request_once_delivers_a_single_fix() {
        let source = ReplaySource::new(fixes(), Duration::from_millis(100));
        let (sink, mut rx) = channel_sink();

        source.request_once(options(1_000), sink).unwrap();

        let fix = rx.recv().await.unwrap().unwrap();
        assert_eq!(fix.latitude, -7.3106665);
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn subscribe_without_a_runtime_reports_missing_capability() {
        let source = ReplaySource::new(fixes(), Duration::from_millis(100));
        let (sink, _rx) = channel_sink();

        let result = source.subscribe(options(1_000), sink);

        assert_eq!(result, Err(PositionError::CapabilityUnavailable));
    }

    #[test(tokio::test)]
    async fn load_reads_recorded_fixes() -> Result<(), ReplayError> {
        let path = PathBuf::from(format!("{}/tests/resources/fixes/office_walk.json", env!("CARGO_MANIFEST_DIR")));

        let source = ReplaySource::load(&path, Duration::from_secs(1)).await?;

        assert_eq!(source.len(), 5);
        Ok(())
    }

    #[test(tokio::test)]
    async fn load_rejects_an_empty_recording() {
        let path = PathBuf::from(format!("{}/tests/resources/fixes/empty.json", env!("CARGO_MANIFEST_DIR")));

        let result = ReplaySource::load(&path, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(ReplayError::Empty(_))));
    }

    #[test(tokio::test)]
    async fn load_reports_a_missing_file() {
        let path = PathBuf::from("does/not/exist.json");

        let result = ReplaySource::load(&path, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(ReplayError::Io { .. })));
    }
}
