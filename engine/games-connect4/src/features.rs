//! Sparse feature codecs for Connect 4 positions
//!
//! Feature layout (all ranges are cell indices in board order):
//!
//! | range      | meaning                                          |
//! |------------|--------------------------------------------------|
//! | 0..42      | Red disc on cell                                 |
//! | 42..84     | Yellow disc on cell                              |
//! | 84..126    | empty cell that would complete four for Red      |
//! | 126..168   | empty cell that would complete four for Yellow   |
//! | 168..210   | cell a disc would land on next (playable)        |
//! | 210        | Yellow to move                                   |
//! | 211        | player to move has an immediate win              |
//! | 212        | opponent has two or more immediate wins          |
//!
//! The compact codec emits only the first two blocks.

use engine_core::FeatureCodec;

use crate::{State, BOARD_SIZE, COLS, RED, ROWS, YELLOW};

const RED_DISCS: usize = 0;
const YELLOW_DISCS: usize = BOARD_SIZE;
const RED_THREATS: usize = 2 * BOARD_SIZE;
const YELLOW_THREATS: usize = 3 * BOARD_SIZE;
const LANDING: usize = 4 * BOARD_SIZE;
const YELLOW_TO_MOVE: usize = 5 * BOARD_SIZE;
const MOVER_CAN_WIN: usize = YELLOW_TO_MOVE + 1;
const OPPONENT_DOUBLE_THREAT: usize = YELLOW_TO_MOVE + 2;

pub const COMPACT_FEATURES: usize = 2 * BOARD_SIZE;
pub const EXTENDED_FEATURES: usize = OPPONENT_DOUBLE_THREAT + 1;

/// Disc occupancy only: 84 features, at most 42 active.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactCodec;

/// Occupancy plus threat maps, playable cells and tactical flags: 213
/// features, at most 94 active.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedCodec;

fn encode_discs(state: &State, out: &mut Vec<u16>) {
    for (block, player) in [(RED_DISCS, RED), (YELLOW_DISCS, YELLOW)] {
        for idx in 0..BOARD_SIZE {
            if state.board[idx] == player {
                out.push((block + idx) as u16);
            }
        }
    }
}

impl FeatureCodec<State> for CompactCodec {
    fn feature_count(&self) -> usize {
        COMPACT_FEATURES
    }

    fn max_active(&self) -> usize {
        BOARD_SIZE
    }

    fn encode(&self, state: &State, out: &mut Vec<u16>) {
        out.clear();
        encode_discs(state, out);
    }
}

impl FeatureCodec<State> for ExtendedCodec {
    fn feature_count(&self) -> usize {
        EXTENDED_FEATURES
    }

    fn max_active(&self) -> usize {
        // discs + both threat maps cover each cell at most twice, plus one
        // landing cell per column and the three flags
        2 * BOARD_SIZE + COLS + 3
    }

    fn encode(&self, state: &State, out: &mut Vec<u16>) {
        out.clear();
        encode_discs(state, out);

        for (block, player) in [(RED_THREATS, RED), (YELLOW_THREATS, YELLOW)] {
            for row in 0..ROWS {
                for col in 0..COLS {
                    if state.is_threat(col, row, player) {
                        out.push((block + State::pos(col, row)) as u16);
                    }
                }
            }
        }

        if state.is_done() {
            return;
        }

        let mut landing: Vec<usize> = (0..COLS)
            .filter_map(|col| state.landing_row(col).map(|row| State::pos(col, row)))
            .collect();
        landing.sort_unstable();
        out.extend(landing.into_iter().map(|idx| (LANDING + idx) as u16));

        let mover = state.current_player();
        let opponent = if mover == RED { YELLOW } else { RED };
        if mover == YELLOW {
            out.push(YELLOW_TO_MOVE as u16);
        }
        if !state.winning_columns(mover).is_empty() {
            out.push(MOVER_CAN_WIN as u16);
        }
        if state.winning_columns(opponent).len() >= 2 {
            out.push(OPPONENT_DOUBLE_THREAT as u16);
        }
    }
}

/// Runtime choice between the two codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connect4Codec {
    Compact,
    Extended,
}

impl Connect4Codec {
    pub fn from_extended(extended: bool) -> Self {
        if extended {
            Connect4Codec::Extended
        } else {
            Connect4Codec::Compact
        }
    }
}

impl FeatureCodec<State> for Connect4Codec {
    fn feature_count(&self) -> usize {
        match self {
            Connect4Codec::Compact => CompactCodec.feature_count(),
            Connect4Codec::Extended => ExtendedCodec.feature_count(),
        }
    }

    fn max_active(&self) -> usize {
        match self {
            Connect4Codec::Compact => CompactCodec.max_active(),
            Connect4Codec::Extended => ExtendedCodec.max_active(),
        }
    }

    fn encode(&self, state: &State, out: &mut Vec<u16>) {
        match self {
            Connect4Codec::Compact => CompactCodec.encode(state, out),
            Connect4Codec::Extended => ExtendedCodec.encode(state, out),
        }
    }
}

