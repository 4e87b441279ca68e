use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BOARD_SIZE: usize = 15;
pub const DEFAULT_WIN_LENGTH: usize = 5;

/// Horizontal, vertical, diagonal and anti-diagonal.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    /// Seat index that plays this colour. Black always moves first.
    pub fn seat_index(self) -> u8 {
        match self {
            Stone::Black => 1,
            Stone::White => 2,
        }
    }

    pub fn from_seat_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Stone::Black),
            2 => Some(Stone::White),
            _ => None,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }
}

impl std::fmt::Display for Stone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stone::Black => write!(f, "black"),
            Stone::White => write!(f, "white"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// A committed placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub seat_index: u8,
    pub placed_at: DateTime<Utc>,
}

impl Move {
    pub fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "stone")]
pub enum Outcome {
    Ongoing,
    Winner(Stone),
    Draw,
}

impl Outcome {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Outcome::Ongoing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    OutOfBounds { row: usize, col: usize, size: usize },
    Occupied { row: usize, col: usize },
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardError::OutOfBounds { row, col, size } => {
                write!(f, "Cell ({},{}) is outside the {}x{} board", row, col, size, size)
            }
            BoardError::Occupied { row, col } => write!(f, "Cell ({},{}) is already occupied", row, col),
        }
    }
}

impl std::error::Error for BoardError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    win_length: usize,
    cells: Vec<Option<Stone>>,
    occupied: usize,
}

impl Board {
    pub fn new(size: usize, win_length: usize) -> Self {
        Board {
            size,
            win_length,
            cells: vec![None; size * size],
            occupied: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    pub fn stone_at(&self, coord: Coord) -> Option<Stone> {
        if !self.in_bounds(coord) {
            return None;
        }
        self.cells[coord.row * self.size + coord.col]
    }

    pub fn placeable(&self, coord: Coord) -> bool {
        self.in_bounds(coord) && self.stone_at(coord).is_none()
    }

    pub fn check_placeable(&self, coord: Coord) -> Result<(), BoardError> {
        if !self.in_bounds(coord) {
            return Err(BoardError::OutOfBounds {
                row: coord.row,
                col: coord.col,
                size: self.size,
            });
        }
        if self.stone_at(coord).is_some() {
            return Err(BoardError::Occupied {
                row: coord.row,
                col: coord.col,
            });
        }
        Ok(())
    }

    /// Places a stone and returns the resulting move. The board is untouched on error.
    pub fn apply(&mut self, coord: Coord, stone: Stone) -> Result<Move, BoardError> {
        self.check_placeable(coord)?;
        self.cells[coord.row * self.size + coord.col] = Some(stone);
        self.occupied += 1;
        Ok(Move {
            row: coord.row,
            col: coord.col,
            seat_index: stone.seat_index(),
            placed_at: Utc::now(),
        })
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.cells.len()
    }

    /// Outcome after a stone landed on `last`. Only the four lines through
    /// `last` are scanned, so a win is reported for the placing colour only.
    pub fn detect_outcome(&self, last: Coord) -> Outcome {
        if let Some(stone) = self.stone_at(last) {
            let wins = AXES
                .iter()
                .any(|&(dr, dc)| self.run_length(last, dr, dc) >= self.win_length);
            if wins {
                return Outcome::Winner(stone);
            }
        }
        if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::Ongoing
        }
    }

    /// Length of the contiguous same-colour run through `origin` along one axis,
    /// counting both directions and the origin itself.
    pub fn run_length(&self, origin: Coord, dr: isize, dc: isize) -> usize {
        let Some(stone) = self.stone_at(origin) else {
            return 0;
        };
        1 + self.count_direction(origin, stone, dr, dc) + self.count_direction(origin, stone, -dr, -dc)
    }

    fn count_direction(&self, origin: Coord, stone: Stone, dr: isize, dc: isize) -> usize {
        let mut count = 0;
        let mut row = origin.row as isize + dr;
        let mut col = origin.col as isize + dc;
        while row >= 0 && col >= 0 {
            let coord = Coord::new(row as usize, col as usize);
            if self.stone_at(coord) != Some(stone) {
                break;
            }
            count += 1;
            row += dr;
            col += dc;
        }
        count
    }

    /// Row-major grid where 0 is empty, 1 black and 2 white.
    pub fn grid(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.size)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map(Stone::seat_index).unwrap_or(0))
                    .collect()
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = None);
        self.occupied = 0;
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new(DEFAULT_BOARD_SIZE, DEFAULT_WIN_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::default();

        assert_eq!(board.size(), 15);
        assert_eq!(board.occupied(), 0);
        assert!(board.placeable(Coord::new(7, 7)));
        assert!(board.grid().iter().flatten().all(|&cell| cell == 0));
    }

    #[test]
    fn test_apply_rejects_occupied_and_out_of_bounds() {
        let mut board = Board::default();
        board.apply(Coord::new(7, 7), Stone::Black).unwrap();

        assert_eq!(
            board.apply(Coord::new(7, 7), Stone::White),
            Err(BoardError::Occupied { row: 7, col: 7 })
        );
        assert_eq!(
            board.apply(Coord::new(15, 0), Stone::White),
            Err(BoardError::OutOfBounds {
                row: 15,
                col: 0,
                size: 15
            })
        );
        assert_eq!(board.occupied(), 1);
        assert_eq!(board.grid()[7][7], 1);
    }

    #[rstest]
    #[case::horizontal((7, 3), (0, 1))]
    #[case::vertical((3, 7), (1, 0))]
    #[case::diagonal((3, 3), (1, 1))]
    #[case::anti_diagonal((3, 11), (1, -1))]
    fn test_five_in_a_row_wins(#[case] start: (usize, usize), #[case] step: (isize, isize)) {
        let mut board = Board::default();
        let cells: Vec<Coord> = (0..5)
            .map(|i| {
                Coord::new(
                    (start.0 as isize + step.0 * i) as usize,
                    (start.1 as isize + step.1 * i) as usize,
                )
            })
            .collect();

        // Fill the ends first so the winning stone lands in the middle of the line.
        for coord in [cells[0], cells[1], cells[3], cells[4]] {
            board.apply(coord, Stone::White).unwrap();
            assert_eq!(board.detect_outcome(coord), Outcome::Ongoing);
        }
        board.apply(cells[2], Stone::White).unwrap();

        assert_eq!(board.detect_outcome(cells[2]), Outcome::Winner(Stone::White));
    }

    #[test]
    fn test_four_in_a_row_does_not_win() {
        let mut board = Board::default();
        for col in 0..4 {
            board.apply(Coord::new(0, col), Stone::Black).unwrap();
        }
        board.apply(Coord::new(0, 4), Stone::White).unwrap();

        assert_eq!(board.detect_outcome(Coord::new(0, 3)), Outcome::Ongoing);
        assert_eq!(board.run_length(Coord::new(0, 0), 0, 1), 4);
    }

    #[test]
    fn test_broken_line_does_not_win() {
        let mut board = Board::default();
        for col in [0, 1, 3, 4, 5] {
            board.apply(Coord::new(2, col), Stone::Black).unwrap();
        }

        assert_eq!(board.detect_outcome(Coord::new(2, 5)), Outcome::Ongoing);
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        // X O X
        // X O O
        // O X X
        let mut board = Board::new(3, 3);
        let placements = [
            ((0, 0), Stone::Black),
            ((0, 1), Stone::White),
            ((0, 2), Stone::Black),
            ((1, 1), Stone::White),
            ((1, 0), Stone::Black),
            ((1, 2), Stone::White),
            ((2, 1), Stone::Black),
            ((2, 0), Stone::White),
            ((2, 2), Stone::Black),
        ];

        let mut last = Outcome::Ongoing;
        for ((row, col), stone) in placements {
            let coord = Coord::new(row, col);
            board.apply(coord, stone).unwrap();
            last = board.detect_outcome(coord);
            if board.is_full() {
                break;
            }
            assert_eq!(last, Outcome::Ongoing);
        }

        assert!(board.is_full());
        assert_eq!(last, Outcome::Draw);
    }

    #[test]
    fn test_clear_resets_cells() {
        let mut board = Board::default();
        board.apply(Coord::new(1, 1), Stone::Black).unwrap();
        board.clear();

        assert_eq!(board.occupied(), 0);
        assert!(board.placeable(Coord::new(1, 1)));
    }

    #[test]
    fn test_stone_seat_mapping() {
        assert_eq!(Stone::Black.seat_index(), 1);
        assert_eq!(Stone::White.seat_index(), 2);
        assert_eq!(Stone::from_seat_index(2), Some(Stone::White));
        assert_eq!(Stone::from_seat_index(0), None);
        assert_eq!(Stone::Black.opponent(), Stone::White);
    }

    proptest! {
        #[test]
        fn prop_no_cell_is_occupied_twice(
            placements in proptest::collection::vec((0usize..15, 0usize..15), 0..120)
        ) {
            let mut board = Board::default();
            let mut applied = std::collections::HashSet::new();
            for (i, (row, col)) in placements.into_iter().enumerate() {
                let stone = if i % 2 == 0 { Stone::Black } else { Stone::White };
                let result = board.apply(Coord::new(row, col), stone);
                prop_assert_eq!(result.is_ok(), applied.insert((row, col)));
            }
            prop_assert_eq!(board.occupied(), applied.len());
            let stones = board.grid().iter().flatten().filter(|&&cell| cell != 0).count();
            prop_assert_eq!(stones, applied.len());
        }
    }
}
