//! The board grid and its move rules.
//!
//! Validation and application are separate: the session checks
//! a move (possibly under the jump-only constraint of a chain) and only
//! mutates the grid once the check has passed.

use serde::Serialize;

use crate::{Coord, Piece, Player};

/// Cells of Player 1's starting corner. Player 2's corner is the point
/// mirror of this set through the board centre.
const PLAYER_ONE_HOME: [Coord; 9] = [
    Coord::new(0, 0),
    Coord::new(0, 1),
    Coord::new(0, 2),
    Coord::new(1, 0),
    Coord::new(1, 1),
    Coord::new(1, 2),
    Coord::new(2, 0),
    Coord::new(2, 1),
    Coord::new(3, 0),
];

/// The eight jump vectors: two cells along a row, column, or diagonal.
const JUMP_VECTORS: [(i32, i32); 8] = [
    (-2, -2),
    (-2, 0),
    (-2, 2),
    (0, -2),
    (0, 2),
    (2, -2),
    (2, 0),
    (2, 2),
];

/// Geometric shape of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// One cell in any of the eight directions.
    Step,
    /// Two cells along a row, column, or diagonal, over the midpoint.
    Jump,
}

/// An 8×8 Halma board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    grid: [[Option<Piece>; Board::SIZE]; Board::SIZE],
}

impl Board {
    /// Side length of the square grid.
    pub const SIZE: usize = 8;

    /// Creates a board with both players' pieces on their home corners.
    pub fn new() -> Self {
        let mut board = Self::empty();
        for player in Player::ALL {
            for cell in Self::home_region(player) {
                board.place(cell, Some(Piece::new(player)));
            }
        }
        board
    }

    /// Creates a board with no pieces. Useful for building positions.
    pub fn empty() -> Self {
        Self {
            grid: [[None; Self::SIZE]; Self::SIZE],
        }
    }

    /// The cells `player` starts on.
    pub fn home_region(player: Player) -> [Coord; 9] {
        match player {
            Player::One => PLAYER_ONE_HOME,
            Player::Two => {
                let last = Self::SIZE as i32 - 1;
                PLAYER_ONE_HOME.map(|c| Coord::new(last - c.row, last - c.col))
            }
        }
    }

    /// The cells `player` must fill to win: the opponent's home.
    pub fn goal_region(player: Player) -> [Coord; 9] {
        Self::home_region(player.opponent())
    }

    /// Returns `true` if `coord` lies on the grid.
    pub fn in_bounds(coord: Coord) -> bool {
        let size = Self::SIZE as i32;
        (0..size).contains(&coord.row) && (0..size).contains(&coord.col)
    }

    /// Reads a cell. Off-grid coordinates read as empty.
    pub fn piece_at(&self, coord: Coord) -> Option<Piece> {
        if Self::in_bounds(coord) {
            self.grid[coord.row as usize][coord.col as usize]
        } else {
            None
        }
    }

    /// Overwrites a cell. Off-grid coordinates are ignored.
    pub fn place(&mut self, coord: Coord, piece: Option<Piece>) {
        if Self::in_bounds(coord) {
            self.grid[coord.row as usize][coord.col as usize] = piece;
        }
    }

    /// Classifies a move by geometry alone, ignoring occupancy.
    pub fn classify(start: Coord, end: Coord) -> Option<MoveKind> {
        let d_row = (end.row - start.row).abs();
        let d_col = (end.col - start.col).abs();
        match (d_row, d_col) {
            (0, 0) => None,
            (0..=1, 0..=1) => Some(MoveKind::Step),
            (2, 0) | (0, 2) | (2, 2) => Some(MoveKind::Jump),
            _ => None,
        }
    }

    /// Checks whether `player` may move the piece at `start` to `end`.
    ///
    /// A jump needs an occupied midpoint; whose piece sits there does not
    /// matter. With `jump_only` set, steps are rejected.
    pub fn is_legal_move(
        &self,
        start: Coord,
        end: Coord,
        player: Player,
        jump_only: bool,
    ) -> bool {
        if !Self::in_bounds(start) || !Self::in_bounds(end) {
            return false;
        }
        if self.piece_at(end).is_some() {
            return false;
        }
        match self.piece_at(start) {
            Some(piece) if piece.owner == player => {}
            _ => return false,
        }

        match Self::classify(start, end) {
            Some(MoveKind::Jump) => {
                self.piece_at(start.midpoint(end)).is_some()
            }
            Some(MoveKind::Step) => !jump_only,
            None => false,
        }
    }

    /// Moves whatever is at `start` to `end` and clears `start`.
    ///
    /// Does not validate; call [`is_legal_move`](Self::is_legal_move)
    /// first. An empty `start` leaves the board untouched.
    pub fn apply_move(&mut self, start: Coord, end: Coord) {
        if let Some(piece) = self.piece_at(start) {
            self.place(start, None);
            self.place(end, Some(piece));
        }
    }

    /// Returns `true` if a piece at `from` would have any legal jump.
    pub fn can_jump_from(&self, from: Coord) -> bool {
        JUMP_VECTORS.iter().any(|&(d_row, d_col)| {
            let dest = from.offset(d_row, d_col);
            let over = from.offset(d_row / 2, d_col / 2);
            Self::in_bounds(dest)
                && self.piece_at(dest).is_none()
                && self.piece_at(over).is_some()
        })
    }

    /// Returns `true` if every goal cell holds one of `player`'s pieces.
    pub fn has_player_reached_goal(&self, player: Player) -> bool {
        Self::goal_region(player).iter().all(|&cell| {
            self.piece_at(cell).is_some_and(|p| p.owner == player)
        })
    }

    /// Iterates over every occupied cell.
    pub fn pieces(&self) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        self.grid.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().filter_map(move |(c, cell)| {
                cell.map(|p| (Coord::new(r as i32, c as i32), p))
            })
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(row: i32, col: i32) -> Coord {
        Coord::new(row, col)
    }

    fn with_pieces(cells: &[(i32, i32, Player)]) -> Board {
        let mut board = Board::empty();
        for &(row, col, owner) in cells {
            board.place(c(row, col), Some(Piece::new(owner)));
        }
        board
    }

    // =====================================================================
    // Setup
    // =====================================================================

    #[test]
    fn test_new_board_has_nine_pieces_per_side() {
        let board = Board::new();
        let ones = board.pieces().filter(|(_, p)| p.owner == Player::One).count();
        let twos = board.pieces().filter(|(_, p)| p.owner == Player::Two).count();
        assert_eq!(ones, 9);
        assert_eq!(twos, 9);
    }

    #[test]
    fn test_new_board_places_pieces_on_home_regions_only() {
        let board = Board::new();
        for (cell, piece) in board.pieces() {
            assert!(
                Board::home_region(piece.owner).contains(&cell),
                "{cell} is not in {}'s home",
                piece.owner
            );
        }
    }

    #[test]
    fn test_player_two_home_mirrors_player_one() {
        let home = Board::home_region(Player::Two);
        assert!(home.contains(&c(7, 7)));
        assert!(home.contains(&c(4, 7)));
        assert!(home.contains(&c(6, 5)));
        assert!(!home.contains(&c(7, 4)));
    }

    // =====================================================================
    // piece_at
    // =====================================================================

    #[test]
    fn test_piece_at_out_of_bounds_is_empty() {
        let board = Board::new();
        assert_eq!(board.piece_at(c(-1, 0)), None);
        assert_eq!(board.piece_at(c(0, 8)), None);
        assert_eq!(board.piece_at(c(8, 8)), None);
        assert_eq!(board.piece_at(c(0, 0)), Some(Piece::new(Player::One)));
    }

    // =====================================================================
    // is_legal_move
    // =====================================================================

    #[test]
    fn test_step_to_adjacent_empty_cell_is_legal() {
        let board = Board::new();
        assert!(board.is_legal_move(c(0, 2), c(1, 3), Player::One, false));
        assert!(board.is_legal_move(c(3, 0), c(4, 0), Player::One, false));
    }

    #[test]
    fn test_step_rejected_when_jump_only() {
        let board = Board::new();
        assert!(!board.is_legal_move(c(0, 2), c(1, 3), Player::One, true));
    }

    #[test]
    fn test_rejects_occupied_destination() {
        let board = Board::new();
        assert!(!board.is_legal_move(c(0, 0), c(0, 1), Player::One, false));
    }

    #[test]
    fn test_rejects_out_of_bounds_coordinates() {
        let board = Board::new();
        assert!(!board.is_legal_move(c(0, 0), c(-1, 0), Player::One, false));
        assert!(!board.is_legal_move(c(-1, 0), c(0, 0), Player::One, false));
        assert!(!board.is_legal_move(c(7, 7), c(8, 8), Player::Two, false));
    }

    #[test]
    fn test_rejects_empty_or_foreign_source() {
        let board = Board::new();
        assert!(!board.is_legal_move(c(4, 4), c(4, 5), Player::One, false));
        assert!(!board.is_legal_move(c(7, 7), c(6, 4), Player::One, false));
        assert!(!board.is_legal_move(c(4, 7), c(3, 7), Player::One, false));
    }

    #[test]
    fn test_rejects_long_and_knight_shapes() {
        let board = with_pieces(&[(3, 3, Player::One)]);
        assert!(!board.is_legal_move(c(3, 3), c(6, 3), Player::One, false));
        assert!(!board.is_legal_move(c(3, 3), c(5, 4), Player::One, false));
        assert!(!board.is_legal_move(c(3, 3), c(3, 3), Player::One, false));
    }

    #[test]
    fn test_jump_requires_occupied_midpoint() {
        let board = with_pieces(&[(3, 3, Player::One)]);
        assert!(!board.is_legal_move(c(3, 3), c(5, 3), Player::One, false));

        let board = with_pieces(&[(3, 3, Player::One), (4, 3, Player::Two)]);
        assert!(board.is_legal_move(c(3, 3), c(5, 3), Player::One, false));
        assert!(board.is_legal_move(c(3, 3), c(5, 3), Player::One, true));
    }

    #[test]
    fn test_jump_over_own_or_opponent_piece_is_equally_legal() {
        for owner in Player::ALL {
            let board = with_pieces(&[(2, 2, Player::One), (3, 3, owner)]);
            assert!(
                board.is_legal_move(c(2, 2), c(4, 4), Player::One, false),
                "jump over {owner} should be legal"
            );
        }
    }

    #[test]
    fn test_jump_along_every_direction() {
        let centre = c(4, 4);
        for &(d_row, d_col) in &JUMP_VECTORS {
            let mut board = with_pieces(&[(4, 4, Player::Two)]);
            board.place(centre.offset(d_row / 2, d_col / 2), Some(Piece::new(Player::One)));
            assert!(
                board.is_legal_move(centre, centre.offset(d_row, d_col), Player::Two, true),
                "vector ({d_row},{d_col})"
            );
        }
    }

    // =====================================================================
    // apply_move
    // =====================================================================

    #[test]
    fn test_apply_move_relocates_piece() {
        let mut board = Board::new();
        let before = board.piece_at(c(0, 2));
        board.apply_move(c(0, 2), c(1, 3));
        assert_eq!(board.piece_at(c(0, 2)), None);
        assert_eq!(board.piece_at(c(1, 3)), before);
    }

    #[test]
    fn test_apply_move_from_empty_cell_is_noop() {
        let mut board = Board::new();
        let snapshot = board.clone();
        board.apply_move(c(4, 4), c(4, 5));
        assert_eq!(board, snapshot);
    }

    // =====================================================================
    // can_jump_from
    // =====================================================================

    #[test]
    fn test_can_jump_from_detects_continuation() {
        // (0,0) can hop over (0,1) into the empty (0,2).
        let board = with_pieces(&[(0, 0, Player::One), (0, 1, Player::Two)]);
        assert!(board.can_jump_from(c(0, 0)));
    }

    #[test]
    fn test_can_jump_from_false_when_landing_blocked_or_no_midpoint() {
        let board = with_pieces(&[
            (0, 0, Player::One),
            (0, 1, Player::Two),
            (0, 2, Player::Two),
        ]);
        assert!(!board.can_jump_from(c(0, 0)));

        let lonely = with_pieces(&[(4, 4, Player::One)]);
        assert!(!lonely.can_jump_from(c(4, 4)));
    }

    #[test]
    fn test_can_jump_from_ignores_off_board_destinations() {
        // Midpoint (0,6) is occupied but (0,8) is off the grid.
        let board = with_pieces(&[(0, 7, Player::One), (0, 6, Player::Two), (0, 5, Player::Two)]);
        assert!(!board.can_jump_from(c(0, 7)));
    }

    // =====================================================================
    // has_player_reached_goal
    // =====================================================================

    #[test]
    fn test_goal_not_reached_at_start() {
        let board = Board::new();
        assert!(!board.has_player_reached_goal(Player::One));
        assert!(!board.has_player_reached_goal(Player::Two));
    }

    #[test]
    fn test_goal_reached_when_opponent_home_filled() {
        let mut board = Board::empty();
        for cell in Board::goal_region(Player::One) {
            board.place(cell, Some(Piece::new(Player::One)));
        }
        assert!(board.has_player_reached_goal(Player::One));
        assert!(!board.has_player_reached_goal(Player::Two));
    }

    #[test]
    fn test_goal_not_reached_with_gap_or_opponent_piece() {
        let goal = Board::goal_region(Player::One);
        let mut board = Board::empty();
        for cell in goal {
            board.place(cell, Some(Piece::new(Player::One)));
        }

        let mut gap = board.clone();
        gap.place(goal[4], None);
        assert!(!gap.has_player_reached_goal(Player::One));

        let mut blocked = board;
        blocked.place(goal[8], Some(Piece::new(Player::Two)));
        assert!(!blocked.has_player_reached_goal(Player::One));
    }

    #[test]
    fn test_board_snapshot_serializes() {
        let json = serde_json::to_value(Board::new()).unwrap();
        assert_eq!(json["grid"][0][0]["owner"], 1);
        assert!(json["grid"][4][4].is_null());
    }
}
