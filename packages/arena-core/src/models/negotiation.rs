use serde::{Deserialize, Serialize};

use crate::models::ai_config::AiConfig;

pub const DEFAULT_EDIT_BUDGET: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigState {
    Editable,
    Locked,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    ConfigLocked,
    ConfigMissing,
    ConfigNotLocked,
    AlreadyLocked,
    AlreadyReady,
    NoEditsRemaining,
    NoUnlockToCancel,
    ReadyIrreversible,
    InvalidConfig(String),
}

impl std::fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationError::ConfigLocked => write!(f, "Configuration is locked, unlock it first"),
            NegotiationError::ConfigMissing => write!(f, "Set an AI configuration before locking"),
            NegotiationError::ConfigNotLocked => write!(f, "Configuration must be locked first"),
            NegotiationError::AlreadyLocked => write!(f, "Configuration is already locked"),
            NegotiationError::AlreadyReady => write!(f, "Seat is already ready"),
            NegotiationError::NoEditsRemaining => write!(f, "No configuration edits remaining"),
            NegotiationError::NoUnlockToCancel => write!(f, "There is no unlock to cancel"),
            NegotiationError::ReadyIrreversible => write!(f, "Readiness cannot be withdrawn"),
            NegotiationError::InvalidConfig(msg) => write!(f, "Invalid AI configuration: {}", msg),
        }
    }
}

impl std::error::Error for NegotiationError {}

/// Pre-game configuration negotiation for one seat.
///
/// `working` is the draft the player edits, `committed` is what the last
/// successful lock froze and what move suggestion uses. `rollback` exists only
/// between an unlock and the next lock, and is what cancelling restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatNegotiation {
    state: ConfigState,
    working: Option<AiConfig>,
    committed: Option<AiConfig>,
    rollback: Option<AiConfig>,
    edits_remaining: u8,
    edit_budget: u8,
}

impl SeatNegotiation {
    pub fn new(edit_budget: u8) -> Self {
        SeatNegotiation {
            state: ConfigState::Editable,
            working: None,
            committed: None,
            rollback: None,
            edits_remaining: edit_budget,
            edit_budget,
        }
    }

    pub fn state(&self) -> ConfigState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, ConfigState::Locked | ConfigState::Ready)
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConfigState::Ready
    }

    pub fn edits_remaining(&self) -> u8 {
        self.edits_remaining
    }

    pub fn working(&self) -> Option<&AiConfig> {
        self.working.as_ref()
    }

    pub fn committed(&self) -> Option<&AiConfig> {
        self.committed.as_ref()
    }

    pub fn has_rollback(&self) -> bool {
        self.rollback.is_some()
    }

    pub fn set_config(&mut self, config: AiConfig) -> Result<(), NegotiationError> {
        if self.state != ConfigState::Editable {
            return Err(NegotiationError::ConfigLocked);
        }
        config.validate().map_err(NegotiationError::InvalidConfig)?;
        self.working = Some(config);
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), NegotiationError> {
        match self.state {
            ConfigState::Locked => return Err(NegotiationError::AlreadyLocked),
            ConfigState::Ready => return Err(NegotiationError::AlreadyReady),
            ConfigState::Editable => {}
        }
        let working = self.working.clone().ok_or(NegotiationError::ConfigMissing)?;
        self.committed = Some(working);
        self.rollback = None;
        self.state = ConfigState::Locked;
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<(), NegotiationError> {
        match self.state {
            ConfigState::Ready => return Err(NegotiationError::AlreadyReady),
            ConfigState::Editable => return Err(NegotiationError::ConfigNotLocked),
            ConfigState::Locked => {}
        }
        if self.edits_remaining == 0 {
            return Err(NegotiationError::NoEditsRemaining);
        }
        self.edits_remaining -= 1;
        self.rollback = self.committed.clone();
        self.working = self.committed.clone();
        self.state = ConfigState::Editable;
        Ok(())
    }

    /// Discards edits made since the last unlock and re-locks the previously
    /// committed config without charging the edit budget.
    pub fn cancel_unlock(&mut self) -> Result<(), NegotiationError> {
        if self.state != ConfigState::Editable {
            return Err(NegotiationError::NoUnlockToCancel);
        }
        let previous = self.rollback.take().ok_or(NegotiationError::NoUnlockToCancel)?;
        self.working = Some(previous.clone());
        self.committed = Some(previous);
        self.state = ConfigState::Locked;
        Ok(())
    }

    pub fn set_ready(&mut self, ready: bool) -> Result<(), NegotiationError> {
        if !ready {
            return Err(NegotiationError::ReadyIrreversible);
        }
        match self.state {
            ConfigState::Ready => Ok(()),
            ConfigState::Editable => Err(NegotiationError::ConfigNotLocked),
            ConfigState::Locked => {
                self.state = ConfigState::Ready;
                Ok(())
            }
        }
    }

    /// Back to Locked with the committed config and a fresh edit budget.
    /// Used when a finished room is reset for a rematch.
    pub fn reset_for_rematch(&mut self) {
        if self.committed.is_some() {
            self.working = self.committed.clone();
            self.state = ConfigState::Locked;
        } else {
            self.state = ConfigState::Editable;
        }
        self.rollback = None;
        self.edits_remaining = self.edit_budget;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str) -> AiConfig {
        AiConfig::new("https://llm.example.com/v1", "sk-test", model)
    }

    fn locked_seat() -> SeatNegotiation {
        let mut seat = SeatNegotiation::new(DEFAULT_EDIT_BUDGET);
        seat.set_config(config("model-a")).unwrap();
        seat.lock().unwrap();
        seat
    }

    #[test]
    fn test_new_seat_is_editable() {
        let seat = SeatNegotiation::new(2);

        assert_eq!(seat.state(), ConfigState::Editable);
        assert_eq!(seat.edits_remaining(), 2);
        assert!(seat.committed().is_none());
    }

    #[test]
    fn test_lock_requires_config() {
        let mut seat = SeatNegotiation::new(2);

        assert_eq!(seat.lock(), Err(NegotiationError::ConfigMissing));
        assert_eq!(seat.state(), ConfigState::Editable);
    }

    #[test]
    fn test_lock_commits_working_config() {
        let seat = locked_seat();

        assert_eq!(seat.state(), ConfigState::Locked);
        assert_eq!(seat.committed().unwrap().model, "model-a");
    }

    #[test]
    fn test_set_config_rejected_while_locked() {
        let mut seat = locked_seat();

        assert_eq!(
            seat.set_config(config("model-b")),
            Err(NegotiationError::ConfigLocked)
        );
        assert_eq!(seat.committed().unwrap().model, "model-a");
    }

    #[test]
    fn test_set_config_validates() {
        let mut seat = SeatNegotiation::new(2);
        let bad = config("m").with_custom_prompt(&"x".repeat(201));

        assert!(matches!(
            seat.set_config(bad),
            Err(NegotiationError::InvalidConfig(_))
        ));
        assert!(seat.working().is_none());
    }

    #[test]
    fn test_unlock_decrements_budget_until_exhausted() {
        let mut seat = locked_seat();

        seat.unlock().unwrap();
        assert_eq!(seat.edits_remaining(), 1);
        seat.lock().unwrap();
        seat.unlock().unwrap();
        assert_eq!(seat.edits_remaining(), 0);
        seat.lock().unwrap();

        assert_eq!(seat.unlock(), Err(NegotiationError::NoEditsRemaining));
        assert_eq!(seat.state(), ConfigState::Locked);
        assert_eq!(seat.edits_remaining(), 0);
    }

    #[test]
    fn test_cancel_unlock_restores_committed_without_charge() {
        let mut seat = locked_seat();
        seat.unlock().unwrap();
        seat.set_config(config("model-b")).unwrap();
        assert_eq!(seat.working().unwrap().model, "model-b");

        seat.cancel_unlock().unwrap();

        assert_eq!(seat.state(), ConfigState::Locked);
        assert_eq!(seat.committed().unwrap(), &config("model-a"));
        assert_eq!(seat.working().unwrap(), &config("model-a"));
        assert_eq!(seat.edits_remaining(), 1);
        assert!(!seat.has_rollback());
    }

    #[test]
    fn test_relock_after_unlock_commits_new_config() {
        let mut seat = locked_seat();
        seat.unlock().unwrap();
        seat.set_config(config("model-b")).unwrap();
        seat.lock().unwrap();

        assert_eq!(seat.committed().unwrap().model, "model-b");
        assert_eq!(seat.cancel_unlock(), Err(NegotiationError::NoUnlockToCancel));
    }

    #[test]
    fn test_cancel_without_unlock_fails() {
        let mut fresh = SeatNegotiation::new(2);
        let mut locked = locked_seat();

        assert_eq!(fresh.cancel_unlock(), Err(NegotiationError::NoUnlockToCancel));
        assert_eq!(locked.cancel_unlock(), Err(NegotiationError::NoUnlockToCancel));
    }

    #[test]
    fn test_ready_requires_lock_and_is_irreversible() {
        let mut seat = SeatNegotiation::new(2);
        seat.set_config(config("m")).unwrap();
        assert_eq!(seat.set_ready(true), Err(NegotiationError::ConfigNotLocked));

        seat.lock().unwrap();
        seat.set_ready(true).unwrap();
        assert!(seat.is_ready());
        assert!(seat.set_ready(true).is_ok());

        assert_eq!(seat.set_ready(false), Err(NegotiationError::ReadyIrreversible));
        assert_eq!(seat.unlock(), Err(NegotiationError::AlreadyReady));
        assert_eq!(seat.lock(), Err(NegotiationError::AlreadyReady));
        assert!(seat.is_locked());
    }

    #[test]
    fn test_reset_for_rematch_restores_budget() {
        let mut seat = locked_seat();
        seat.unlock().unwrap();
        seat.lock().unwrap();
        seat.set_ready(true).unwrap();

        seat.reset_for_rematch();

        assert_eq!(seat.state(), ConfigState::Locked);
        assert_eq!(seat.edits_remaining(), DEFAULT_EDIT_BUDGET);
    }
}
