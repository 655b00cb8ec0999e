//! Background tasks for the Centraleta server.
//!
//! Includes:
//! - Sweeping expired audio assets.
//! - Evicting idle call sessions.

use centraleta_dialog::SessionStore;
use centraleta_voice::AssetStore;
use std::time::Duration;
use tokio::time::sleep;

/// Starts the audio asset sweep task.
///
/// This task runs indefinitely, deleting assets older than `retention`
/// every `interval_seconds`. Sweep failures are logged and the task waits
/// for the next tick; they never surface to any caller.
pub async fn start_asset_sweep_task(store: AssetStore, interval_seconds: u64, retention: Duration) {
    if interval_seconds == 0 {
        tracing::warn!("asset sweep task disabled (interval=0)");
        return;
    }

    let interval = Duration::from_secs(interval_seconds);
    tracing::info!(
        interval_seconds,
        retention_seconds = retention.as_secs(),
        "starting asset sweep task"
    );

    loop {
        // Sleep first so startup settles before the first sweep.
        sleep(interval).await;

        match store.sweep(retention).await {
            Ok(count) => {
                if count > 0 {
                    tracing::info!(count, "deleted expired audio assets");
                } else {
                    tracing::debug!("no expired audio assets to delete");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "asset sweep failed");
            }
        }
    }
}

/// Starts the idle call-session eviction task.
///
/// Calls have no explicit end event; sessions idle longer than `max_idle`
/// are dropped so that dialogue state does not accumulate for the process
/// lifetime. A zero timeout disables the task.
pub async fn start_session_eviction_task(sessions: SessionStore, max_idle: Duration) {
    if max_idle.is_zero() {
        tracing::warn!("session eviction task disabled (timeout=0)");
        return;
    }

    // Check every max_idle/2, clamped to between 1 second and 1 minute.
    let interval = Duration::from_secs((max_idle.as_secs() / 2).clamp(1, 60));
    tracing::info!(
        max_idle_seconds = max_idle.as_secs(),
        interval_seconds = interval.as_secs(),
        "starting session eviction task"
    );

    loop {
        sleep(interval).await;

        let evicted = sessions.evict_idle(max_idle);
        if evicted > 0 {
            tracing::info!(count = evicted, "evicted idle call sessions");
        }
    }
}
