//! Head-to-head matches between two move selection policies.

use engine_core::{outcome_value, Position, Side};
use minimax::{Policy, SearchError};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use tracing::debug;

use crate::selfplay::GameLimits;

/// Result of an arena run, from the candidate's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArenaResult {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl ArenaResult {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Wins plus half the draws, over games played.
    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            n => (self.wins as f64 + 0.5 * self.draws as f64) / n as f64,
        }
    }
}

/// Play one game and return its White-positive outcome.
pub fn play_match<P, W, B>(
    white: &W,
    black: &B,
    start: P,
    limits: &GameLimits,
    rng: &mut ChaCha20Rng,
) -> Result<f64, SearchError>
where
    P: Position,
    W: Policy<P> + ?Sized,
    B: Policy<P> + ?Sized,
{
    let mut position = start;
    let mut plies = 0u32;
    let mut quiet = 0u32;

    loop {
        let conclusion = position.conclusion();
        if conclusion.is_terminal() {
            return Ok(outcome_value(conclusion));
        }
        if quiet >= limits.quiet_ply_limit || plies >= limits.max_game_plies {
            return Ok(0.0);
        }

        let mv = if position.side_to_move() == Side::White {
            white.select_move(&position, rng)?
        } else {
            black.select_move(&position, rng)?
        };

        quiet = if position.is_irreversible(mv) { 0 } else { quiet + 1 };
        position = position.apply(mv);
        plies += 1;
    }
}

/// Play `games` games between `candidate` and `baseline`, alternating colors.
/// The candidate takes White in even-numbered games.
pub fn run_arena<P, C, B>(
    candidate: &C,
    baseline: &B,
    start: &P,
    games: u32,
    limits: &GameLimits,
    rng: &mut ChaCha20Rng,
) -> Result<ArenaResult, SearchError>
where
    P: Position,
    C: Policy<P> + ?Sized,
    B: Policy<P> + ?Sized,
{
    let mut result = ArenaResult::default();

    for game in 0..games {
        let candidate_white = game % 2 == 0;
        let outcome = if candidate_white {
            play_match(candidate, baseline, start.clone(), limits, rng)?
        } else {
            -play_match(baseline, candidate, start.clone(), limits, rng)?
        };

        if outcome > 0.0 {
            result.wins += 1;
        } else if outcome < 0.0 {
            result.losses += 1;
        } else {
            result.draws += 1;
        }
        debug!(game, candidate_white, outcome, "Arena game finished");
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_connect4::State;
    use minimax::{GreedyPolicy, MinimaxEngine, RandomPolicy, SearchConfig, StaticEvaluator};
    use rand::SeedableRng;

    fn limits() -> GameLimits {
        GameLimits {
            quiet_ply_limit: 50,
            max_game_plies: 512,
        }
    }

    #[test]
    fn test_win_rate() {
        let result = ArenaResult {
            wins: 3,
            losses: 1,
            draws: 2,
        };
        assert_eq!(result.games(), 6);
        assert!((result.win_rate() - 4.0 / 6.0).abs() < 1e-12);
        assert_eq!(ArenaResult::default().win_rate(), 0.0);
    }

    #[test]
    fn test_play_match_reports_winner() {
        // Red wins with column 3 as soon as the greedy player is to move
        let start = State::from_columns(&[0, 0, 1, 1, 2, 5]);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let outcome = play_match(&GreedyPolicy::new(), &RandomPolicy, start, &limits(), &mut rng).unwrap();
        assert_eq!(outcome, 1.0);
    }

    #[test]
    fn test_play_match_ply_limit_draws() {
        let short = GameLimits {
            quiet_ply_limit: 50,
            max_game_plies: 3,
        };
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let outcome = play_match(&RandomPolicy, &RandomPolicy, State::new(), &short, &mut rng).unwrap();
        assert_eq!(outcome, 0.0);
    }

    #[test]
    fn test_search_beats_random() {
        let engine = MinimaxEngine::new(SearchConfig::for_testing(), StaticEvaluator);
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let result = run_arena(&engine, &RandomPolicy, &State::new(), 6, &limits(), &mut rng).unwrap();

        assert_eq!(result.games(), 6);
        assert!(result.wins > result.losses, "{:?}", result);
    }

    #[test]
    fn test_colors_alternate() {
        let column_zero = |position: &State, _rng: &mut ChaCha20Rng| -> Result<_, SearchError> {
            position
                .legal_moves()
                .first()
                .copied()
                .ok_or(SearchError::NoLegalMoves)
        };
        let leftmost = FnPolicy(column_zero);
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let result = run_arena(&leftmost, &leftmost, &State::new(), 4, &limits(), &mut rng).unwrap();

        // Filling columns left to right makes every row one color, and White
        // completes the bottom row first
        assert_eq!(result.wins, 2);
        assert_eq!(result.losses, 2);
    }

    struct FnPolicy<F>(F);

    impl<P, F> Policy<P> for FnPolicy<F>
    where
        P: Position,
        F: Fn(&P, &mut ChaCha20Rng) -> Result<P::Move, SearchError> + Send + Sync,
    {
        fn select_move(&self, position: &P, rng: &mut ChaCha20Rng) -> Result<P::Move, SearchError> {
            (self.0)(position, rng)
        }
    }
}
