use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::GameSettings;
use crate::models::room::{Departure, Room, RoomError};
use crate::models::snapshot::RoomSummary;
use crate::repositories::errors::room_registry_errors::RoomRegistryError;

pub const MAX_USERNAME_CHARS: usize = 32;

pub type RoomHandle = Arc<Mutex<Room>>;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Returns the room `owner` already sits in, or creates one.
    async fn create_room(&self, owner: &str) -> Result<RoomHandle, RoomRegistryError>;
    async fn get_room(&self, room_id: &str) -> Result<RoomHandle, RoomRegistryError>;
    async fn join_room(&self, room_id: &str, username: &str) -> Result<RoomHandle, RoomRegistryError>;
    async fn leave_room(&self, room_id: &str, username: &str) -> Result<Departure, RoomRegistryError>;
    async fn delete_room(&self, room_id: &str, requester: &str) -> Result<(), RoomRegistryError>;
    async fn list_rooms(&self) -> Vec<RoomSummary>;
    /// Removes rooms with no activity for longer than `max_idle` and returns their ids.
    async fn sweep_idle(&self, max_idle: Duration) -> Vec<String>;
    fn room_of(&self, username: &str) -> Option<String>;
}

/// Locks a room handle, treating a room that was removed after the handle
/// was taken as gone.
pub async fn lock_open(handle: &RoomHandle) -> Result<MutexGuard<'_, Room>, RoomRegistryError> {
    let room = handle.lock().await;
    if room.is_closed() {
        return Err(RoomRegistryError::RoomNotFound);
    }
    Ok(room)
}

pub fn validate_username(username: &str) -> Result<(), RoomRegistryError> {
    if username.trim().is_empty() {
        return Err(RoomRegistryError::InvalidUsername(
            "Username cannot be empty".to_string(),
        ));
    }
    if username.trim() != username {
        return Err(RoomRegistryError::InvalidUsername(
            "Username cannot start or end with whitespace".to_string(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(RoomRegistryError::InvalidUsername(format!(
            "Username cannot exceed {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(RoomRegistryError::InvalidUsername(
            "Username cannot contain control characters".to_string(),
        ));
    }
    Ok(())
}

/// In-memory directory of rooms. Each room sits behind its own mutex so
/// unrelated rooms never contend; `members` maps a username to the one room
/// it is seated in.
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    members: DashMap<String, String>,
    settings: GameSettings,
}

impl RoomRegistry {
    pub fn new(settings: GameSettings) -> Self {
        RoomRegistry {
            rooms: DashMap::new(),
            members: DashMap::new(),
            settings,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn handle(&self, room_id: &str) -> Result<RoomHandle, RoomRegistryError> {
        self.rooms
            .get(room_id)
            .map(|entry| entry.value().clone())
            .ok_or(RoomRegistryError::RoomNotFound)
    }

    fn release(&self, username: &str, room_id: &str) {
        self.members.remove_if(username, |_, seated_in| seated_in == room_id);
    }

    /// Drops a closed room from the directory along with its memberships.
    fn evict(&self, room: &Room) {
        for username in room.players() {
            self.release(&username, room.id());
        }
        self.rooms.remove(room.id());
    }
}

#[async_trait]
impl RoomRepository for RoomRegistry {
    async fn create_room(&self, owner: &str) -> Result<RoomHandle, RoomRegistryError> {
        validate_username(owner)?;

        let room = Room::new(owner, self.settings.clone());
        let room_id = room.id().to_string();
        let handle: RoomHandle = Arc::new(Mutex::new(room));

        let existing = match self.members.entry(owner.to_string()) {
            Entry::Occupied(mut seated) => match self.rooms.get(seated.get()) {
                Some(current) => Some(current.value().clone()),
                None => {
                    self.rooms.insert(room_id.clone(), handle.clone());
                    seated.insert(room_id.clone());
                    None
                }
            },
            Entry::Vacant(vacant) => {
                self.rooms.insert(room_id.clone(), handle.clone());
                vacant.insert(room_id.clone());
                None
            }
        };

        match existing {
            Some(current) => {
                debug!(owner = %owner, "Owner already seated, returning existing room");
                Ok(current)
            }
            None => {
                info!(room_id = %room_id, owner = %owner, "Room created");
                Ok(handle)
            }
        }
    }

    async fn get_room(&self, room_id: &str) -> Result<RoomHandle, RoomRegistryError> {
        self.handle(room_id)
    }

    async fn join_room(&self, room_id: &str, username: &str) -> Result<RoomHandle, RoomRegistryError> {
        validate_username(username)?;
        let handle = self.handle(room_id)?;

        match self.members.entry(username.to_string()) {
            Entry::Occupied(seated) if seated.get() != room_id => {
                return Err(RoomRegistryError::AlreadySeated);
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(vacant) => {
                vacant.insert(room_id.to_string());
            }
        }

        let mut room = handle.lock().await;
        if room.is_closed() {
            self.release(username, room_id);
            return Err(RoomRegistryError::RoomNotFound);
        }
        let was_member = room.is_member(username);
        if let Err(err) = room.add_player(username) {
            if !was_member {
                self.release(username, room_id);
            }
            return Err(err.into());
        }

        // A leave queued ahead of us on this lock may have released the entry.
        match self.members.entry(username.to_string()) {
            Entry::Occupied(seated) if seated.get() != room_id => {
                if !was_member {
                    let _ = room.remove_player(username);
                }
                return Err(RoomRegistryError::AlreadySeated);
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(vacant) => {
                vacant.insert(room_id.to_string());
            }
        }
        drop(room);

        info!(room_id = %room_id, username = %username, "Player joined room");
        Ok(handle)
    }

    async fn leave_room(&self, room_id: &str, username: &str) -> Result<Departure, RoomRegistryError> {
        let handle = self.handle(room_id)?;
        let mut room = lock_open(&handle).await?;

        let departure = room.remove_player(username)?;
        self.release(username, room_id);
        if departure.room_empty {
            room.close();
            self.evict(&room);
            info!(room_id = %room_id, "Last player left, room removed");
        } else {
            info!(room_id = %room_id, username = %username, "Player left room");
        }
        Ok(departure)
    }

    async fn delete_room(&self, room_id: &str, requester: &str) -> Result<(), RoomRegistryError> {
        let handle = self.handle(room_id)?;
        let mut room = lock_open(&handle).await?;

        if room.owner() != requester {
            return Err(RoomRegistryError::Room(RoomError::NotOwner));
        }
        room.close();
        self.evict(&room);
        info!(room_id = %room_id, requester = %requester, "Room disbanded");
        Ok(())
    }

    async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.iter().map(|entry| entry.value().clone()).collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let room = handle.lock().await;
            if !room.is_closed() {
                summaries.push(room.summary());
            }
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        summaries
    }

    async fn sweep_idle(&self, max_idle: Duration) -> Vec<String> {
        let max_idle = match chrono::Duration::from_std(max_idle) {
            Ok(max_idle) => max_idle,
            Err(_) => return Vec::new(),
        };
        let cutoff = Utc::now() - max_idle;
        let handles: Vec<RoomHandle> = self.rooms.iter().map(|entry| entry.value().clone()).collect();

        let mut removed = Vec::new();
        for handle in handles {
            // A room whose lock is held right now is not idle.
            let Ok(mut room) = handle.try_lock() else {
                continue;
            };
            if room.is_closed() || room.updated_at() > cutoff {
                continue;
            }
            room.close();
            self.evict(&room);
            removed.push(room.id().to_string());
        }

        if !removed.is_empty() {
            info!(count = removed.len(), "Removed idle rooms");
        }
        removed
    }

    fn room_of(&self, username: &str) -> Option<String> {
        self.members.get(username).map(|entry| entry.value().clone())
    }
}
