use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    config::GameSettings,
    models::{
        ai_config::AiConfig,
        board::Stone,
        room::Room,
        snapshot::{RoomSnapshot, RoomSummary},
    },
    repositories::room_registry::{lock_open, RoomRepository},
    services::{
        errors::{move_suggester_errors::SuggesterError, room_service_errors::RoomServiceError},
        move_suggester::MoveSuggester,
        turn_service::TurnService,
    },
};

#[derive(Clone)]
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    suggester: Arc<dyn MoveSuggester + Send + Sync>,
    turns: TurnService,
    suggester_timeout: Duration,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository + Send + Sync>,
        suggester: Arc<dyn MoveSuggester + Send + Sync>,
        settings: &GameSettings,
    ) -> Self {
        RoomService {
            repository,
            suggester,
            turns: TurnService::new(settings.require_all_ready),
            suggester_timeout: settings.suggester_timeout,
        }
    }

    /// Runs `apply` under the room lock and returns the resulting snapshot.
    /// `apply` must validate before it mutates.
    async fn mutate<F>(&self, room_id: &str, apply: F) -> Result<RoomSnapshot, RoomServiceError>
    where
        F: FnOnce(&mut Room) -> Result<(), RoomServiceError> + Send,
    {
        let handle = self.repository.get_room(room_id).await?;
        let mut room = lock_open(&handle).await?;
        apply(&mut *room)?;
        room.touch();
        Ok(room.snapshot())
    }

    pub async fn create_room(&self, owner: &str) -> Result<RoomSnapshot, RoomServiceError> {
        let handle = self.repository.create_room(owner).await?;
        let room = lock_open(&handle).await?;
        Ok(room.snapshot())
    }

    pub async fn join_room(
        &self,
        room_id: &str,
        username: &str,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        let handle = self.repository.join_room(room_id, username).await?;
        let room = lock_open(&handle).await?;
        Ok(room.snapshot())
    }

    pub async fn leave_room(&self, room_id: &str, username: &str) -> Result<(), RoomServiceError> {
        let departure = self.repository.leave_room(room_id, username).await?;
        if let Some(owner) = departure.new_owner {
            info!(room_id = %room_id, new_owner = %owner, "Room ownership transferred");
        }
        Ok(())
    }

    pub async fn delete_room(&self, room_id: &str, requester: &str) -> Result<(), RoomServiceError> {
        self.repository
            .delete_room(room_id, requester)
            .await
            .map_err(RoomServiceError::from)
    }

    pub async fn get_room(&self, room_id: &str) -> Result<RoomSnapshot, RoomServiceError> {
        let handle = self.repository.get_room(room_id).await?;
        let room = lock_open(&handle).await?;
        Ok(room.snapshot())
    }

    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        self.repository.list_rooms().await
    }

    pub async fn sweep_idle(&self, max_idle: Duration) -> Vec<String> {
        self.repository.sweep_idle(max_idle).await
    }

    pub async fn set_ai_config(
        &self,
        room_id: &str,
        username: &str,
        config: AiConfig,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        self.mutate(room_id, |room| {
            let seat = room.seat_by_name_mut(username)?;
            seat.negotiation.set_config(config)?;
            room.push_log(format!("{} updated their AI configuration", username));
            Ok(())
        })
        .await
    }

    /// `locked = true` locks the working config, `locked = false` spends an
    /// edit to unlock it. `cancel_unlock` takes precedence and restores the
    /// config committed before the last unlock.
    pub async fn lock_config(
        &self,
        room_id: &str,
        username: &str,
        locked: bool,
        cancel_unlock: bool,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        self.mutate(room_id, |room| {
            let seat = room.seat_by_name_mut(username)?;
            let message = if cancel_unlock {
                seat.negotiation.cancel_unlock()?;
                format!("{} cancelled their unlock", username)
            } else if locked {
                seat.negotiation.lock()?;
                format!("{} locked their AI configuration", username)
            } else {
                seat.negotiation.unlock()?;
                format!(
                    "{} unlocked their AI configuration ({} edits left)",
                    username,
                    seat.negotiation.edits_remaining()
                )
            };
            room.push_log(message);
            Ok(())
        })
        .await
    }

    pub async fn set_ready(
        &self,
        room_id: &str,
        username: &str,
        ready: bool,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        self.mutate(room_id, |room| {
            let seat = room.seat_by_name_mut(username)?;
            let was_ready = seat.negotiation.is_ready();
            seat.negotiation.set_ready(ready)?;
            if !was_ready {
                room.push_log(format!("{} is ready", username));
            }
            if room.all_ready() && room.occupied_count() == 2 && room.moves().is_empty() {
                room.push_log("Every seat is ready, the game can start".to_string());
            }
            Ok(())
        })
        .await
    }

    pub async fn set_owner_color(
        &self,
        room_id: &str,
        username: &str,
        color: Stone,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        self.mutate(room_id, |room| {
            room.set_owner_color(username, color)
                .map_err(RoomServiceError::from)
        })
        .await
    }

    pub async fn send_message(
        &self,
        room_id: &str,
        username: &str,
        text: &str,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        self.mutate(room_id, |room| {
            room.push_chat(username, text).map_err(RoomServiceError::from)
        })
        .await
    }

    pub async fn reset_game(
        &self,
        room_id: &str,
        username: &str,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        self.mutate(room_id, |room| {
            room.reset_game(username).map_err(RoomServiceError::from)
        })
        .await
    }

    /// Asks the seat's suggester for a move and stores it as pending.
    pub async fn step(&self, room_id: &str, username: &str) -> Result<RoomSnapshot, RoomServiceError> {
        self.propose(room_id, username, false).await
    }

    pub async fn confirm_move(
        &self,
        room_id: &str,
        username: &str,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        self.mutate(room_id, |room| {
            self.turns.confirm(room, username)?;
            Ok(())
        })
        .await
    }

    /// Propose and, only if that succeeds, confirm within the same critical section.
    pub async fn play(&self, room_id: &str, username: &str) -> Result<RoomSnapshot, RoomServiceError> {
        self.propose(room_id, username, true).await
    }

    async fn propose(
        &self,
        room_id: &str,
        username: &str,
        confirm: bool,
    ) -> Result<RoomSnapshot, RoomServiceError> {
        let handle = self.repository.get_room(room_id).await?;

        let ticket = {
            let room = lock_open(&handle).await?;
            self.turns.begin_proposal(&room, username)?
        };

        debug!(room_id = %room_id, username = %username, "Requesting move suggestion");
        let suggestion = tokio::time::timeout(
            self.suggester_timeout,
            self.suggester.suggest_move(&ticket.request),
        )
        .await
        .unwrap_or(Err(SuggesterError::Timeout));

        let mut room = lock_open(&handle).await?;
        if let Err(err) = self.turns.ensure_current(&room, &ticket) {
            warn!(room_id = %room_id, username = %username, "Room changed during move suggestion");
            return Err(err);
        }

        match suggestion {
            Ok(coord) => {
                self.turns.accept_suggestion(&mut room, &ticket, coord)?;
                if confirm {
                    self.turns.confirm(&mut room, username)?;
                }
            }
            Err(err) => {
                warn!(room_id = %room_id, username = %username, error = %err, "Move suggestion failed");
                self.turns.record_failure(&mut room, &ticket, &err);
                room.touch();
                return Err(RoomServiceError::MoveSuggester(err));
            }
        }

        room.touch();
        Ok(room.snapshot())
    }
}
