pub mod config;
pub mod fetcher;
pub mod sync_loop;

pub use config::SyncConfig;
pub use fetcher::{FetchError, HttpRoomFetcher, RoomFetcher};
pub use sync_loop::{StopReason, SyncEvent, SyncHandle, SyncLoop};
