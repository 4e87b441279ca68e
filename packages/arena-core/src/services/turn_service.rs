use chrono::Utc;

use crate::{
    models::{
        board::{Coord, Move, Outcome, Stone},
        room::{PendingMove, Room},
    },
    services::{
        errors::{move_suggester_errors::SuggesterError, room_service_errors::RoomServiceError},
        move_suggester::SuggestionRequest,
    },
};

/// What a proposal captured when it was validated. The suggester runs without
/// the room lock, so the room is checked against this again before writing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposalTicket {
    pub username: String,
    pub seat_index: u8,
    pub move_count: usize,
    pub request: SuggestionRequest,
}

/// Two-phase move protocol: a seat proposes (the suggester picks a cell), then
/// confirms to place it.
#[derive(Debug, Clone, Default)]
pub struct TurnService {
    require_all_ready: bool,
}

impl TurnService {
    pub fn new(require_all_ready: bool) -> Self {
        TurnService { require_all_ready }
    }

    /// Validates that `username` may propose now and snapshots what the
    /// suggester needs.
    pub fn begin_proposal(
        &self,
        room: &Room,
        username: &str,
    ) -> Result<ProposalTicket, RoomServiceError> {
        let seat_index = room
            .seat_index_of(username)
            .ok_or(RoomServiceError::NotInRoom)?;

        if room.outcome().is_finished() {
            return Err(RoomServiceError::GameFinished);
        }
        if room.occupied_count() < 2 {
            return Err(RoomServiceError::WaitingForOpponent);
        }
        if room.current_seat() != seat_index {
            return Err(RoomServiceError::NotYourTurn);
        }

        let seat = room.seat(seat_index).ok_or(RoomServiceError::NotInRoom)?;
        let config = seat
            .negotiation
            .committed()
            .filter(|_| seat.negotiation.is_locked())
            .ok_or(RoomServiceError::ConfigNotLocked)?;

        if self.require_all_ready && !room.all_ready() {
            return Err(RoomServiceError::OpponentNotReady);
        }

        let stone = Stone::from_seat_index(seat_index).ok_or(RoomServiceError::NotInRoom)?;
        Ok(ProposalTicket {
            username: username.to_string(),
            seat_index,
            move_count: room.moves().len(),
            request: SuggestionRequest {
                room_id: room.id().to_string(),
                board: room.board().grid(),
                board_size: room.board().size(),
                win_length: room.board().win_length(),
                stone,
                config: config.clone(),
                last_error: room.last_error().map(str::to_string),
            },
        })
    }

    /// Fails with `StaleProposal` when the room moved on since `ticket` was issued.
    pub fn ensure_current(&self, room: &Room, ticket: &ProposalTicket) -> Result<(), RoomServiceError> {
        let seat_locked = room
            .seat(ticket.seat_index)
            .is_some_and(|seat| seat.negotiation.is_locked());
        let unchanged = !room.outcome().is_finished()
            && room.occupied_count() == 2
            && seat_locked
            && room.current_seat() == ticket.seat_index
            && room.moves().len() == ticket.move_count
            && room.seat_index_of(&ticket.username) == Some(ticket.seat_index);
        if unchanged {
            Ok(())
        } else {
            Err(RoomServiceError::StaleProposal)
        }
    }

    /// Stores the suggested cell as the pending move. A suggestion that is off
    /// the board or on an occupied cell counts as a failed proposal.
    pub fn accept_suggestion(
        &self,
        room: &mut Room,
        ticket: &ProposalTicket,
        coord: Coord,
    ) -> Result<(), RoomServiceError> {
        self.ensure_current(room, ticket)?;

        if let Err(board_err) = room.board().check_placeable(coord) {
            let err = SuggesterError::IllegalMove(board_err.to_string());
            self.record_failure(room, ticket, &err);
            return Err(RoomServiceError::MoveSuggester(err));
        }

        room.pending_move = Some(PendingMove {
            row: coord.row,
            col: coord.col,
            seat_index: ticket.seat_index,
            proposed_at: Utc::now(),
        });
        room.last_error = None;
        room.push_log(format!(
            "Player {} ({}) proposes {}",
            ticket.seat_index, ticket.request.stone, coord
        ));
        Ok(())
    }

    /// Clears any pending move and records why the proposal failed. The turn
    /// stays with the same seat.
    pub fn record_failure(&self, room: &mut Room, ticket: &ProposalTicket, err: &SuggesterError) {
        room.pending_move = None;
        room.last_error = Some(err.to_string());
        room.push_log(format!("Player {} error: {}", ticket.seat_index, err));
    }

    pub fn confirm(&self, room: &mut Room, username: &str) -> Result<Move, RoomServiceError> {
        let seat_index = room
            .seat_index_of(username)
            .ok_or(RoomServiceError::NotInRoom)?;

        if room.outcome().is_finished() {
            return Err(RoomServiceError::GameFinished);
        }
        if room.occupied_count() < 2 {
            return Err(RoomServiceError::WaitingForOpponent);
        }
        if room.current_seat() != seat_index {
            return Err(RoomServiceError::NotYourTurn);
        }

        let pending = room
            .pending_move
            .as_ref()
            .filter(|pending| pending.seat_index == seat_index)
            .map(PendingMove::coord)
            .ok_or(RoomServiceError::NoPendingMove)?;
        let stone = Stone::from_seat_index(seat_index).ok_or(RoomServiceError::NotInRoom)?;

        let placed = match room.board.apply(pending, stone) {
            Ok(placed) => placed,
            Err(_) => {
                room.pending_move = None;
                return Err(RoomServiceError::StaleProposal);
            }
        };

        room.moves.push(placed.clone());
        room.pending_move = None;
        room.push_log(format!("Player {} ({}) plays {}", seat_index, stone, pending));

        room.outcome = room.board().detect_outcome(pending);
        match room.outcome() {
            Outcome::Winner(winner) => {
                room.push_log(format!("Player {} ({}) wins", winner.seat_index(), winner));
            }
            Outcome::Draw => room.push_log("The board is full, the game is a draw".to_string()),
            Outcome::Ongoing => room.current_seat = stone.opponent().seat_index(),
        }
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSettings;
    use crate::models::ai_config::AiConfig;
    use crate::models::room::Phase;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn seat_config(room: &mut Room, username: &str, ready: bool) {
        let seat = room.seat_by_name_mut(username).unwrap();
        seat.negotiation
            .set_config(AiConfig::new("", "sk-test", "gpt-4o-mini"))
            .unwrap();
        seat.negotiation.lock().unwrap();
        if ready {
            seat.negotiation.set_ready(true).unwrap();
        }
    }

    fn playing_room() -> Room {
        let mut room = Room::with_id("room-1", "alice", GameSettings::default());
        room.add_player("bob").unwrap();
        seat_config(&mut room, "alice", true);
        seat_config(&mut room, "bob", true);
        room
    }

    fn propose(service: &TurnService, room: &mut Room, username: &str, coord: Coord) {
        let ticket = service.begin_proposal(room, username).unwrap();
        service.accept_suggestion(room, &ticket, coord).unwrap();
    }

    #[test]
    fn test_begin_proposal_requires_opponent() {
        let mut room = Room::with_id("room-1", "alice", GameSettings::default());
        seat_config(&mut room, "alice", true);

        let result = TurnService::default().begin_proposal(&room, "alice");

        assert!(matches!(result, Err(RoomServiceError::WaitingForOpponent)));
    }

    #[test]
    fn test_begin_proposal_checks_membership_and_turn() {
        let room = playing_room();
        let service = TurnService::default();

        assert!(matches!(
            service.begin_proposal(&room, "mallory"),
            Err(RoomServiceError::NotInRoom)
        ));
        assert!(matches!(
            service.begin_proposal(&room, "bob"),
            Err(RoomServiceError::NotYourTurn)
        ));

        let ticket = service.begin_proposal(&room, "alice").unwrap();
        assert_eq!(ticket.seat_index, 1);
        assert_eq!(ticket.request.stone, Stone::Black);
        assert_eq!(ticket.request.config.model, "gpt-4o-mini");
    }

    #[test]
    fn test_begin_proposal_requires_locked_config() {
        let mut room = Room::with_id("room-1", "alice", GameSettings::default());
        room.add_player("bob").unwrap();

        assert!(matches!(
            TurnService::default().begin_proposal(&room, "alice"),
            Err(RoomServiceError::ConfigNotLocked)
        ));
    }

    #[test]
    fn test_ready_policy() {
        let mut room = Room::with_id("room-1", "alice", GameSettings::default());
        room.add_player("bob").unwrap();
        seat_config(&mut room, "alice", false);

        assert!(TurnService::new(false).begin_proposal(&room, "alice").is_ok());
        assert!(matches!(
            TurnService::new(true).begin_proposal(&room, "alice"),
            Err(RoomServiceError::OpponentNotReady)
        ));
    }

    #[test]
    fn test_confirm_places_and_advances() {
        let mut room = playing_room();
        let service = TurnService::default();
        propose(&service, &mut room, "alice", Coord::new(7, 7));

        assert!(matches!(
            service.confirm(&mut room, "bob"),
            Err(RoomServiceError::NotYourTurn)
        ));
        let placed = service.confirm(&mut room, "alice").unwrap();

        assert_eq!(placed.coord(), Coord::new(7, 7));
        assert_eq!(room.current_seat(), 2);
        assert_eq!(room.moves().len(), 1);
        assert!(room.pending_move().is_none());
        assert_eq!(room.phase(), Phase::Active);
    }

    #[test]
    fn test_confirm_without_pending_move() {
        let mut room = playing_room();
        let service = TurnService::default();

        assert!(matches!(
            service.confirm(&mut room, "alice"),
            Err(RoomServiceError::NoPendingMove)
        ));
        assert_eq!(room.board().occupied(), 0);
    }

    #[test]
    fn test_occupied_suggestion_is_recorded_as_failure() {
        let mut room = playing_room();
        let service = TurnService::default();
        propose(&service, &mut room, "alice", Coord::new(7, 7));
        service.confirm(&mut room, "alice").unwrap();

        let ticket = service.begin_proposal(&room, "bob").unwrap();
        let result = service.accept_suggestion(&mut room, &ticket, Coord::new(7, 7));

        assert!(matches!(
            result,
            Err(RoomServiceError::MoveSuggester(SuggesterError::IllegalMove(_)))
        ));
        assert!(room.pending_move().is_none());
        assert_eq!(room.current_seat(), 2);
        assert!(room.last_error().unwrap().contains("occupied"));

        let retry = service.begin_proposal(&room, "bob").unwrap();
        assert!(retry.request.last_error.is_some());
    }

    #[test]
    fn test_failure_clears_previous_pending_move() {
        let mut room = playing_room();
        let service = TurnService::default();
        propose(&service, &mut room, "alice", Coord::new(3, 3));

        let ticket = service.begin_proposal(&room, "alice").unwrap();
        service.record_failure(&mut room, &ticket, &SuggesterError::Timeout);

        assert!(room.pending_move().is_none());
        assert_eq!(room.current_seat(), 1);
        assert_eq!(room.last_error(), Some("Move suggester timed out"));
    }

    #[test]
    fn test_ticket_goes_stale_after_turn_changes() {
        let mut room = playing_room();
        let service = TurnService::default();
        let stale = service.begin_proposal(&room, "alice").unwrap();

        propose(&service, &mut room, "alice", Coord::new(0, 0));
        service.confirm(&mut room, "alice").unwrap();

        assert!(matches!(
            service.accept_suggestion(&mut room, &stale, Coord::new(1, 1)),
            Err(RoomServiceError::StaleProposal)
        ));
        assert!(room.pending_move().is_none());
        assert_eq!(room.moves().len(), 1);
    }

    #[test]
    fn test_five_in_a_row_finishes_game_once() {
        let mut room = playing_room();
        let service = TurnService::default();

        for i in 0..4 {
            propose(&service, &mut room, "alice", Coord::new(0, i));
            service.confirm(&mut room, "alice").unwrap();
            propose(&service, &mut room, "bob", Coord::new(5, i));
            service.confirm(&mut room, "bob").unwrap();
        }
        propose(&service, &mut room, "alice", Coord::new(0, 4));
        service.confirm(&mut room, "alice").unwrap();

        assert_eq!(room.outcome(), Outcome::Winner(Stone::Black));
        assert_eq!(room.phase(), Phase::Finished);
        assert!(matches!(
            service.begin_proposal(&room, "bob"),
            Err(RoomServiceError::GameFinished)
        ));
        assert!(matches!(
            service.confirm(&mut room, "alice"),
            Err(RoomServiceError::GameFinished)
        ));
        assert_eq!(room.snapshot().winner, 1);
    }

    #[test]
    fn test_confirm_waits_for_opponent() {
        let mut room = playing_room();
        let service = TurnService::default();
        propose(&service, &mut room, "alice", Coord::new(7, 7));
        room.remove_player("bob").unwrap();

        assert!(matches!(
            service.confirm(&mut room, "alice"),
            Err(RoomServiceError::WaitingForOpponent)
        ));
        assert!(room.moves().is_empty());
        assert_eq!(room.board().occupied(), 0);
        assert_eq!(room.current_seat(), 1);
        assert_eq!(room.phase(), Phase::WaitingForPlayers);
    }

    #[test]
    fn test_ticket_goes_stale_when_opponent_leaves() {
        let mut room = playing_room();
        let service = TurnService::default();
        let ticket = service.begin_proposal(&room, "alice").unwrap();
        room.remove_player("bob").unwrap();

        assert!(matches!(
            service.accept_suggestion(&mut room, &ticket, Coord::new(7, 7)),
            Err(RoomServiceError::StaleProposal)
        ));
        assert!(room.pending_move().is_none());
    }

    #[test]
    fn test_ticket_goes_stale_when_config_unlocked() {
        let mut room = Room::with_id("room-1", "alice", GameSettings::default());
        room.add_player("bob").unwrap();
        seat_config(&mut room, "alice", false);
        seat_config(&mut room, "bob", false);
        let service = TurnService::default();
        let ticket = service.begin_proposal(&room, "alice").unwrap();

        room.seat_by_name_mut("alice").unwrap().negotiation.unlock().unwrap();

        assert!(matches!(
            service.accept_suggestion(&mut room, &ticket, Coord::new(7, 7)),
            Err(RoomServiceError::StaleProposal)
        ));
        assert!(room.pending_move().is_none());
    }

    proptest! {
        #[test]
        fn prop_turn_passes_only_on_successful_confirm(
            steps in proptest::collection::vec((any::<bool>(), 0u8..3, 0usize..5, 0usize..5), 0..80)
        ) {
            let mut room = playing_room();
            let service = TurnService::default();

            for (by_alice, action, row, col) in steps {
                let username = if by_alice { "alice" } else { "bob" };
                let seat_before = room.current_seat();
                let moves_before = room.moves().len();

                match action {
                    0 => {
                        if let Ok(ticket) = service.begin_proposal(&room, username) {
                            let _ = service.accept_suggestion(&mut room, &ticket, Coord::new(row, col));
                        }
                        prop_assert_eq!(room.current_seat(), seat_before);
                        prop_assert_eq!(room.moves().len(), moves_before);
                    }
                    1 => match service.confirm(&mut room, username) {
                        Ok(_) => {
                            prop_assert_eq!(room.moves().len(), moves_before + 1);
                            if room.outcome().is_finished() {
                                prop_assert_eq!(room.current_seat(), seat_before);
                            } else {
                                prop_assert_ne!(room.current_seat(), seat_before);
                            }
                        }
                        Err(_) => {
                            prop_assert_eq!(room.current_seat(), seat_before);
                            prop_assert_eq!(room.moves().len(), moves_before);
                        }
                    },
                    _ => {
                        if let Ok(ticket) = service.begin_proposal(&room, username) {
                            service.record_failure(&mut room, &ticket, &SuggesterError::Timeout);
                            prop_assert!(room.pending_move().is_none());
                        }
                        prop_assert_eq!(room.current_seat(), seat_before);
                        prop_assert_eq!(room.moves().len(), moves_before);
                    }
                }

                let cells: HashSet<Coord> = room.moves().iter().map(Move::coord).collect();
                prop_assert_eq!(cells.len(), room.moves().len());
                prop_assert_eq!(room.board().occupied(), room.moves().len());
            }
        }
    }
}
