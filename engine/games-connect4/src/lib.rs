//! Connect 4 position oracle for the arbor engine
//!
//! Connect 4 is a two-player connection game where players drop colored discs
//! into a 7-column, 6-row vertically suspended grid. The objective is to be
//! the first to form a horizontal, vertical, or diagonal line of four discs.
//!
//! Red moves first and plays the White role of the engine; Yellow plays Black.
//!
//! # Board Layout
//!
//! The board is stored in row-major order, with row 0 at the bottom:
//! ```text
//! Row 5: [35][36][37][38][39][40][41]  <- Top
//! Row 4: [28][29][30][31][32][33][34]
//! Row 3: [21][22][23][24][25][26][27]
//! Row 2: [14][15][16][17][18][19][20]
//! Row 1: [ 7][ 8][ 9][10][11][12][13]
//! Row 0: [ 0][ 1][ 2][ 3][ 4][ 5][ 6]  <- Bottom
//!         Col 0  1  2  3  4  5  6
//! ```
//!
//! # Usage
//!
//! ```rust
//! use engine_core::{Conclusion, Position, Side};
//! use games_connect4::{Action, State};
//!
//! let state = State::new().apply(Action::Drop(3));
//! assert_eq!(state.side_to_move(), Side::Black);
//! assert_eq!(state.conclusion(), Conclusion::Ongoing);
//! ```

use engine_core::{Conclusion, Position, Side, Symmetry};

pub mod features;

pub use features::{CompactCodec, Connect4Codec, ExtendedCodec};

/// Board dimensions
pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const BOARD_SIZE: usize = COLS * ROWS; // 42

/// Cell values
pub const EMPTY: u8 = 0;
pub const RED: u8 = 1;
pub const YELLOW: u8 = 2;

const DRAW: u8 = 3;

/// Direction vectors: horizontal, vertical, diagonal /, diagonal \
const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Weight of a window of four that holds 1, 2 or 3 discs of a single color.
const WINDOW_WEIGHTS: [f64; 4] = [0.0, 0.01, 0.05, 0.25];
/// Bonus per disc in the center column.
const CENTER_WEIGHT: f64 = 0.03;

/// Connect4 game state
///
/// Represents the complete state of a Connect4 game including the board,
/// current player, and winner information. Equality covers the board and the
/// player to move, so it doubles as the transposition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    /// Board representation: 0=empty, 1=Red (player 1), 2=Yellow (player 2)
    /// Stored in row-major order with row 0 at the bottom
    board: [u8; BOARD_SIZE],
    /// Current player: 1=Red, 2=Yellow. Switches on every move, including the
    /// winning one, so a decided position has the loser to move.
    current_player: u8,
    /// Winner: 0=none/ongoing, 1=Red, 2=Yellow, 3=draw
    winner: u8,
    /// Height of each column (0-6 means number of pieces in column)
    column_heights: [u8; COLS],
}

impl State {
    /// Create a new initial game state
    pub fn new() -> Self {
        Self {
            board: [EMPTY; BOARD_SIZE],
            current_player: RED, // Red goes first
            winner: 0,
            column_heights: [0; COLS],
        }
    }

    /// Replay a sequence of columns from the initial position.
    ///
    /// Moves into full columns or after the game ended are ignored.
    pub fn from_columns(columns: &[u8]) -> Self {
        columns
            .iter()
            .fold(Self::new(), |state, &col| state.drop_piece(col))
    }

    /// Check if the game is over
    pub fn is_done(&self) -> bool {
        self.winner != 0
    }

    /// Cell value at (col, row)
    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> u8 {
        self.board[Self::pos(col, row)]
    }

    /// Player to move: 1=Red, 2=Yellow
    pub fn current_player(&self) -> u8 {
        self.current_player
    }

    /// Number of discs on the board
    pub fn moves_played(&self) -> usize {
        self.column_heights.iter().map(|&h| h as usize).sum()
    }

    /// Columns that are not full, ascending
    pub fn open_columns(&self) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }

        (0..COLS as u8)
            .filter(|&col| self.column_heights[col as usize] < ROWS as u8)
            .collect()
    }

    /// Bit-mask representation of legal moves.
    ///
    /// Bits 0-6 correspond to columns 0-6. A bit set to 1 indicates the
    /// column is not full and a piece can be dropped there.
    pub fn legal_moves_mask(&self) -> u8 {
        if self.is_done() {
            return 0;
        }

        self.column_heights
            .iter()
            .enumerate()
            .fold(0u8, |mask, (col, &height)| {
                if height < ROWS as u8 {
                    mask | (1u8 << col)
                } else {
                    mask
                }
            })
    }

    /// Convert column and row to board index
    #[inline]
    pub fn pos(col: usize, row: usize) -> usize {
        row * COLS + col
    }

    /// Row a disc dropped into `col` would land on, if the column has room
    #[inline]
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        let h = self.column_heights[col] as usize;
        (h < ROWS).then_some(h)
    }

    /// Drop a piece in the given column and return the new state
    pub fn drop_piece(&self, column: u8) -> State {
        let col = column as usize;

        // Check if move is valid
        if self.is_done() || col >= COLS || self.column_heights[col] >= ROWS as u8 {
            return self.clone(); // Invalid move, return unchanged state
        }

        let mut new_state = self.clone();
        let row = self.column_heights[col] as usize;

        new_state.board[Self::pos(col, row)] = self.current_player;
        new_state.column_heights[col] += 1;
        new_state.winner = new_state.check_winner_at(col, row);
        new_state.current_player = opponent_of(self.current_player);

        new_state
    }

    /// Length of the longest line through (col, row) for `player`, counting
    /// the cell itself as if it held a `player` disc.
    fn line_length(&self, col: usize, row: usize, player: u8) -> usize {
        let mut best = 0;
        for (dc, dr) in DIRECTIONS {
            let mut count = 1;

            for sign in [1, -1] {
                let (mut c, mut r) = (col as i32 + sign * dc, row as i32 + sign * dr);
                while in_bounds(c, r) && self.board[Self::pos(c as usize, r as usize)] == player {
                    count += 1;
                    c += sign * dc;
                    r += sign * dr;
                }
            }

            best = best.max(count);
        }
        best
    }

    /// Check if the piece at (col, row) creates a winning line
    fn check_winner_at(&self, col: usize, row: usize) -> u8 {
        let player = self.board[Self::pos(col, row)];
        if player == EMPTY {
            return 0;
        }

        if self.line_length(col, row, player) >= 4 {
            return player;
        }

        // Check for draw (board full but no winner)
        if self.column_heights.iter().all(|&h| h >= ROWS as u8) {
            return DRAW;
        }

        0 // Game ongoing
    }

    /// Whether an empty (col, row) would complete four for `player`.
    ///
    /// The cell does not need to be playable yet.
    pub fn is_threat(&self, col: usize, row: usize, player: u8) -> bool {
        self.cell(col, row) == EMPTY && self.line_length(col, row, player) >= 4
    }

    /// Columns where `player` would win by dropping a disc right now
    pub fn winning_columns(&self, player: u8) -> Vec<u8> {
        if self.is_done() {
            return Vec::new();
        }
        (0..COLS)
            .filter_map(|col| {
                let row = self.landing_row(col)?;
                self.is_threat(col, row, player).then_some(col as u8)
            })
            .collect()
    }

    /// Left-right mirror image of the board
    pub fn mirrored(&self) -> State {
        let mut mirror = self.clone();
        for row in 0..ROWS {
            for col in 0..COLS {
                mirror.board[Self::pos(col, row)] = self.board[Self::pos(COLS - 1 - col, row)];
            }
        }
        for col in 0..COLS {
            mirror.column_heights[col] = self.column_heights[COLS - 1 - col];
        }
        mirror
    }

    /// Heuristic Red-positive balance from open windows of four and center control
    fn window_balance(&self) -> f64 {
        let mut score = 0.0;

        for row in 0..ROWS {
            for col in 0..COLS {
                for (dc, dr) in DIRECTIONS {
                    let end_c = col as i32 + 3 * dc;
                    let end_r = row as i32 + 3 * dr;
                    if !in_bounds(end_c, end_r) {
                        continue;
                    }

                    let (mut red, mut yellow) = (0usize, 0usize);
                    for k in 0..4 {
                        let c = (col as i32 + k * dc) as usize;
                        let r = (row as i32 + k * dr) as usize;
                        match self.cell(c, r) {
                            RED => red += 1,
                            YELLOW => yellow += 1,
                            _ => {}
                        }
                    }

                    if yellow == 0 && red < 4 {
                        score += WINDOW_WEIGHTS[red];
                    } else if red == 0 && yellow < 4 {
                        score -= WINDOW_WEIGHTS[yellow];
                    }
                }
            }
        }

        let center = COLS / 2;
        for row in 0..ROWS {
            match self.cell(center, row) {
                RED => score += CENTER_WEIGHT,
                YELLOW => score -= CENTER_WEIGHT,
                _ => {}
            }
        }

        score
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn in_bounds(c: i32, r: i32) -> bool {
    c >= 0 && c < COLS as i32 && r >= 0 && r < ROWS as i32
}

#[inline]
fn opponent_of(player: u8) -> u8 {
    if player == RED {
        YELLOW
    } else {
        RED
    }
}

/// Engine role of a player value
#[inline]
pub fn side_of(player: u8) -> Side {
    if player == RED {
        Side::White
    } else {
        Side::Black
    }
}

/// Player value of an engine role
#[inline]
pub fn player_of(side: Side) -> u8 {
    match side {
        Side::White => RED,
        Side::Black => YELLOW,
    }
}

/// Connect4 action - drop a piece in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Drop a piece in the given column (0-6)
    Drop(u8),
}

impl Action {
    /// Get the column for this action
    pub fn column(&self) -> u8 {
        match self {
            Action::Drop(col) => *col,
        }
    }
}

impl Position for State {
    type Move = Action;

    fn side_to_move(&self) -> Side {
        side_of(self.current_player)
    }

    fn legal_moves(&self) -> Vec<Action> {
        self.open_columns().into_iter().map(Action::Drop).collect()
    }

    fn apply(&self, mv: Action) -> Self {
        self.drop_piece(mv.column())
    }

    fn conclusion(&self) -> Conclusion {
        match self.winner {
            0 => Conclusion::Ongoing,
            DRAW => Conclusion::Draw,
            player => Conclusion::Decisive {
                winner: side_of(player),
            },
        }
    }

    fn static_balance(&self) -> f64 {
        self.window_balance()
    }

    fn symmetries(&self) -> Vec<Symmetry<Self>> {
        let mirror = self.mirrored();
        if mirror == *self {
            return Vec::new();
        }
        vec![Symmetry {
            position: mirror,
            swaps_sides: false,
        }]
    }
}
