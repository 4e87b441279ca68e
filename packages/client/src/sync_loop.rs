use std::sync::Arc;
use std::time::Duration;

use arena_core::models::snapshot::RoomSnapshot;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fetcher::{FetchError, RoomFetcher};

const EVENT_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Left,
    Disbanded,
    Cancelled,
    /// The server no longer knows the room.
    RoomGone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Snapshot(Box<RoomSnapshot>),
    TransientError(String),
    Stopped(StopReason),
}

/// Polls one room on a fixed interval and forwards what it sees.
pub struct SyncLoop;

impl SyncLoop {
    pub fn spawn(
        fetcher: Arc<dyn RoomFetcher>,
        room_id: &str,
        username: &str,
        poll_interval: Duration,
    ) -> (SyncHandle, mpsc::Receiver<SyncEvent>) {
        let (events, receiver) = mpsc::channel(EVENT_BUFFER);
        let (control, commands) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(
            fetcher.clone(),
            room_id.to_string(),
            poll_interval,
            events,
            commands,
            cancel.clone(),
        ));

        let handle = SyncHandle {
            fetcher,
            room_id: room_id.to_string(),
            username: username.to_string(),
            control,
            cancel,
            task: Some(task),
        };
        (handle, receiver)
    }
}

async fn run(
    fetcher: Arc<dyn RoomFetcher>,
    room_id: String,
    poll_interval: Duration,
    events: mpsc::Sender<SyncEvent>,
    mut commands: mpsc::Receiver<StopReason>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(room_id = %room_id, "Room sync started");

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => break StopReason::Cancelled,
            Some(reason) = commands.recv() => break reason,
            _ = ticker.tick() => {
                let event = match fetcher.fetch_room(&room_id).await {
                    Ok(snapshot) => SyncEvent::Snapshot(Box::new(snapshot)),
                    Err(FetchError::NotFound) => break StopReason::RoomGone,
                    Err(err) => {
                        warn!(room_id = %room_id, error = %err, "Room sync fetch failed");
                        SyncEvent::TransientError(err.to_string())
                    }
                };
                if events.send(event).await.is_err() {
                    // Nobody is listening any more.
                    break StopReason::Cancelled;
                }
            }
        }
    };

    info!(room_id = %room_id, reason = ?reason, "Room sync stopped");
    let _ = events.send(SyncEvent::Stopped(reason)).await;
}

/// Owns a running sync loop. Dropping it cancels the loop.
pub struct SyncHandle {
    fetcher: Arc<dyn RoomFetcher>,
    room_id: String,
    username: String,
    control: mpsc::Sender<StopReason>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stops polling without telling the server anything.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Leaves the room on the server, then stops. A room that is already
    /// gone counts as left.
    pub async fn leave(&mut self) -> Result<(), FetchError> {
        match self.fetcher.leave_room(&self.room_id, &self.username).await {
            Ok(()) | Err(FetchError::NotFound) => {}
            Err(err) => return Err(err),
        }
        self.finish(StopReason::Left).await;
        Ok(())
    }

    /// Deletes the room on the server (owner only), then stops.
    pub async fn disband(&mut self) -> Result<(), FetchError> {
        match self.fetcher.delete_room(&self.room_id, &self.username).await {
            Ok(()) | Err(FetchError::NotFound) => {}
            Err(err) => return Err(err),
        }
        self.finish(StopReason::Disbanded).await;
        Ok(())
    }

    async fn finish(&mut self, reason: StopReason) {
        // The loop may already have exited on its own.
        let _ = self.control.send(reason).await;
        self.join().await;
    }

    async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(room_id = %self.room_id, "Room sync task failed: {}", e);
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use arena_core::{config::GameSettings, models::room::Room};
    use async_trait::async_trait;

    fn snapshot() -> RoomSnapshot {
        Room::with_id("room-1", "alice", GameSettings::default()).snapshot()
    }

    /// Replays scripted fetch results, then keeps returning the last snapshot.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<Result<RoomSnapshot, FetchError>>>,
        fetches: AtomicUsize,
        leaves: AtomicUsize,
        deletes: AtomicUsize,
        delete_result: Result<(), FetchError>,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Result<RoomSnapshot, FetchError>>) -> Self {
            ScriptedFetcher {
                script: Mutex::new(script.into()),
                fetches: AtomicUsize::new(0),
                leaves: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
                delete_result: Ok(()),
            }
        }
    }

    #[async_trait]
    impl RoomFetcher for ScriptedFetcher {
        async fn fetch_room(&self, _room_id: &str) -> Result<RoomSnapshot, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(snapshot()))
        }

        async fn leave_room(&self, _room_id: &str, _username: &str) -> Result<(), FetchError> {
            self.leaves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete_room(&self, _room_id: &str, _username: &str) -> Result<(), FetchError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.delete_result.clone()
        }
    }

    async fn next_stop(receiver: &mut mpsc::Receiver<SyncEvent>) -> StopReason {
        while let Some(event) = receiver.recv().await {
            if let SyncEvent::Stopped(reason) = event {
                return reason;
            }
        }
        panic!("event stream closed without a stop notice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling_until_room_gone() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Err(FetchError::Transient("connection refused".to_string())),
            Ok(snapshot()),
            Err(FetchError::NotFound),
        ]));
        let (handle, mut receiver) =
            SyncLoop::spawn(fetcher.clone(), "room-1", "alice", Duration::from_secs(2));

        assert!(matches!(
            receiver.recv().await,
            Some(SyncEvent::TransientError(_))
        ));
        match receiver.recv().await {
            Some(SyncEvent::Snapshot(room)) => assert_eq!(room.id, "room-1"),
            other => panic!("expected snapshot, got {:?}", other),
        }
        assert_eq!(
            receiver.recv().await,
            Some(SyncEvent::Stopped(StopReason::RoomGone))
        );
        assert_eq!(receiver.recv().await, None);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 3);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let (handle, mut receiver) =
            SyncLoop::spawn(fetcher.clone(), "room-1", "alice", Duration::from_secs(2));

        for _ in 0..3 {
            assert!(matches!(receiver.recv().await, Some(SyncEvent::Snapshot(_))));
        }
        handle.stop().await;

        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(next_stop(&mut receiver).await, StopReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_notifies_server_and_stops() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let (mut handle, mut receiver) =
            SyncLoop::spawn(fetcher.clone(), "room-1", "bob", Duration::from_secs(2));
        assert!(matches!(receiver.recv().await, Some(SyncEvent::Snapshot(_))));

        handle.leave().await.unwrap();

        assert_eq!(fetcher.leaves.load(Ordering::SeqCst), 1);
        assert_eq!(next_stop(&mut receiver).await, StopReason::Left);
        assert_eq!(receiver.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_disband_keeps_polling() {
        let mut fetcher = ScriptedFetcher::new(vec![]);
        fetcher.delete_result = Err(FetchError::Rejected {
            code: "NotOwner".to_string(),
            message: "Only the room owner can do that".to_string(),
        });
        let fetcher = Arc::new(fetcher);
        let (mut handle, mut receiver) =
            SyncLoop::spawn(fetcher.clone(), "room-1", "bob", Duration::from_secs(2));
        assert!(matches!(receiver.recv().await, Some(SyncEvent::Snapshot(_))));

        let err = handle.disband().await.unwrap_err();

        assert!(matches!(err, FetchError::Rejected { .. }));
        assert_eq!(fetcher.deletes.load(Ordering::SeqCst), 1);
        assert!(matches!(receiver.recv().await, Some(SyncEvent::Snapshot(_))));

        handle.stop().await;
        assert_eq!(next_stop(&mut receiver).await, StopReason::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disband_stops_loop() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let (mut handle, mut receiver) =
            SyncLoop::spawn(fetcher.clone(), "room-1", "alice", Duration::from_secs(2));
        assert!(matches!(receiver.recv().await, Some(SyncEvent::Snapshot(_))));

        handle.disband().await.unwrap();

        assert_eq!(fetcher.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(next_stop(&mut receiver).await, StopReason::Disbanded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_loop() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let (handle, mut receiver) =
            SyncLoop::spawn(fetcher.clone(), "room-1", "alice", Duration::from_secs(2));
        assert!(matches!(receiver.recv().await, Some(SyncEvent::Snapshot(_))));

        drop(handle);

        assert_eq!(next_stop(&mut receiver).await, StopReason::Cancelled);
        assert_eq!(receiver.recv().await, None);
    }
}
