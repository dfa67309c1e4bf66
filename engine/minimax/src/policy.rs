//! Move selection policies
//!
//! Everything that can pick a move in a game implements [`Policy`]: the
//! full search engine, the greedy one-ply heuristic used for rollouts and as
//! an arena baseline, and a uniform random player.

use engine_core::{Conclusion, Position};
use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::search::SearchError;

/// Score given to moves that end the game in a draw. Draws are treated as
/// nearly as bad as losing so the greedy player keeps games going.
const DRAW_SCORE: f64 = -1.0e6;

/// Multiplier applied to the material term before subtracting the reply
/// count, so mobility only breaks ties between equal material outcomes.
const MOBILITY_SCALE: f64 = 8064.0;

/// Trait for move selection policies.
pub trait Policy<P: Position>: Send + Sync {
    /// Pick a move for the side to move.
    fn select_move(&self, position: &P, rng: &mut ChaCha20Rng) -> Result<P::Move, SearchError>;
}

/// Uniformly random legal move.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl<P: Position> Policy<P> for RandomPolicy {
    fn select_move(&self, position: &P, rng: &mut ChaCha20Rng) -> Result<P::Move, SearchError> {
        let moves = position.legal_moves();
        if moves.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }
        Ok(moves[rng.gen_range(0..moves.len())])
    }
}

/// One-ply greedy player with worst-case reply lookahead.
///
/// Each move is scored by the lowest static balance (from the mover's point
/// of view) the opponent can reach with a single reply. An immediate win
/// scores best; a move that allows the opponent an immediate win scores
/// worst. Ties are broken uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyPolicy {
    /// Prefer moves that leave the opponent fewer replies.
    pub mobility_penalty: bool,
}

impl GreedyPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variant that also minimizes the opponent's number of replies.
    pub fn mobility_minimizing() -> Self {
        Self {
            mobility_penalty: true,
        }
    }

    /// Greedy score of `mv` for the side to move in `position`.
    pub fn score_move<P: Position>(&self, position: &P, mv: P::Move) -> f64 {
        let mover = position.side_to_move();
        let next = position.apply(mv);

        match next.conclusion() {
            Conclusion::Decisive { winner } if winner == mover => return f64::INFINITY,
            Conclusion::Decisive { .. } => return f64::NEG_INFINITY,
            Conclusion::Draw => return DRAW_SCORE,
            Conclusion::Ongoing => {}
        }

        let sign = mover.sign();
        let mut worst = f64::INFINITY;
        let mut replies = 0usize;

        for reply in next.legal_moves() {
            replies += 1;
            let after = next.apply(reply);
            let value = match after.conclusion() {
                Conclusion::Decisive { winner } if winner != mover => return f64::NEG_INFINITY,
                Conclusion::Decisive { .. } => f64::INFINITY,
                Conclusion::Draw => DRAW_SCORE,
                Conclusion::Ongoing => after.static_balance() * sign,
            };
            worst = worst.min(value);
        }

        if self.mobility_penalty {
            worst * MOBILITY_SCALE - replies as f64
        } else {
            worst
        }
    }
}

impl<P: Position> Policy<P> for GreedyPolicy {
    fn select_move(&self, position: &P, rng: &mut ChaCha20Rng) -> Result<P::Move, SearchError> {
        let moves = position.legal_moves();
        match moves.len() {
            0 => return Err(SearchError::NoLegalMoves),
            1 => return Ok(moves[0]),
            _ => {}
        }

        let mut best = f64::NEG_INFINITY;
        let mut candidates = Vec::with_capacity(moves.len());
        for mv in moves {
            let score = self.score_move(position, mv);
            if score > best {
                best = score;
                candidates.clear();
            }
            if score >= best {
                candidates.push(mv);
            }
        }

        match candidates.len() {
            0 => Err(SearchError::EmptyCandidates),
            n => Ok(candidates[rng.gen_range(0..n)]),
        }
    }
}
