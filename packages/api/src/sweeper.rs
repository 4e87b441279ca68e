use std::sync::Arc;
use std::time::Duration;

use arena_core::services::room_service::RoomService;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodically removes rooms idle for longer than `max_idle` until `cancel` fires.
pub fn spawn_idle_sweeper(
    room_service: Arc<RoomService>,
    every: Duration,
    max_idle: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        info!(every_secs = every.as_secs(), max_idle_secs = max_idle.as_secs(), "Idle room sweeper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = room_service.sweep_idle(max_idle).await;
                    if !removed.is_empty() {
                        info!(rooms = ?removed, "Swept idle rooms");
                    } else {
                        debug!("No idle rooms to sweep");
                    }
                }
            }
        }
        info!("Idle room sweeper stopped");
    })
}
