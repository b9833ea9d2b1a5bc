use presence::app_config::AppConfig;
use presence::attendance::{LoggingSubmitter, can_submit, submit};
use presence::capture::CaptureSession;
use presence::capture::test_pattern::TestPatternDevice;
use presence::geofence::GeofenceTracker;
use presence::position::replay::ReplaySource;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let replay = config.replay();
    let source = Arc::new(ReplaySource::load(replay.fixes_file(), replay.interval()).await?);
    let give_up_after = replay.interval() * (source.len() as u32 + 2);

    let mut tracker = GeofenceTracker::new(config.geofence().to_config(), source);
    let mut states = WatchStream::new(tracker.watch());
    tracker.start();
    info!("✅  Started location tracking");

    let device = Arc::new(TestPatternDevice::new(config.camera().width(), config.camera().height()));
    let mut session = CaptureSession::new(device);
    session.open().await?;
    session.snapshot()?;
    session.close();
    info!("✅  Took the attendance photo");

    let deadline = sleep(give_up_after);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            Some(state) = states.next() => {
                info!(tracking = state.is_tracking(), "📍 {}", state);
                if can_submit(&state, session.photo()) {
                    break;
                }
                if !state.is_tracking() && state.last_updated_at().is_some() {
                    warn!("⚠️ Tracking stopped before reaching the office");
                    break;
                }
            }
            _ = &mut deadline => {
                warn!("⏳ No valid location within {:?}", give_up_after);
                break;
            }
        }
    }

    match submit(&LoggingSubmitter, &tracker.state(), session.photo()).await {
        Ok(record) => info!(submitted_at = %record.submitted_at, "🔥 Attendance recorded"),
        Err(error) => warn!("⚠️ Could not submit attendance: {}", error),
    }

    tracker.stop();
    Ok(())
}
