//! Self-play games and the worker/harvest protocol.
//!
//! Each worker plays one game on a blocking thread and streams its labeled
//! positions over a bounded channel, followed by a single `Finished` message.
//! The orchestrator counts `Finished` messages to know when a batch is done.

use engine_core::{outcome_value, Conclusion, Position};
use indicatif::ProgressBar;
use minimax::{Evaluator, MinimaxEngine, SearchError};
use rand_chacha::ChaCha20Rng;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Game length limits.
#[derive(Debug, Clone, Copy)]
pub struct GameLimits {
    /// Consecutive reversible plies after which the game is drawn
    pub quiet_ply_limit: u32,
    /// Plies after which the game is drawn regardless
    pub max_game_plies: u32,
}

/// How a self-play game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    Finished(Conclusion),
    QuietPlyLimit,
    MaxPlies,
}

/// A completed game: every non-terminal position reached, plus the result.
#[derive(Debug, Clone)]
pub struct PlayedGame<P> {
    pub positions: Vec<P>,
    pub end: GameEnd,
    /// White-positive outcome label
    pub outcome: f64,
    pub plies: u32,
    pub searches: u32,
    pub nodes: u64,
}

/// A training position with its outcome label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPosition<P> {
    pub position: P,
    pub target: f64,
}

/// Summary sent with the `Finished` sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub game: usize,
    pub plies: u32,
    pub outcome: f64,
    pub records: usize,
    pub searches: u32,
    pub nodes: u64,
}

/// Messages from self-play workers.
#[derive(Debug)]
pub enum WorkerMessage<P> {
    Record(LabeledPosition<P>),
    /// Sent exactly once per worker, after its records. `None` when the game
    /// failed; the error comes back through the worker's join handle.
    Finished(usize, Option<GameSummary>),
}

/// Play one game from `start` with `engine` on both sides.
pub fn play_game<P, E>(
    engine: &MinimaxEngine<E>,
    start: P,
    limits: &GameLimits,
    rng: &mut ChaCha20Rng,
) -> Result<PlayedGame<P>, SearchError>
where
    P: Position,
    E: Evaluator<P>,
{
    let mut position = start;
    let mut positions = Vec::new();
    let mut plies = 0u32;
    let mut quiet = 0u32;
    let mut searches = 0u32;
    let mut nodes = 0u64;

    let end = loop {
        let conclusion = position.conclusion();
        if conclusion.is_terminal() {
            break GameEnd::Finished(conclusion);
        }
        positions.push(position.clone());

        // A win on the last allowed ply still stands
        if quiet >= limits.quiet_ply_limit {
            break GameEnd::QuietPlyLimit;
        }
        if plies >= limits.max_game_plies {
            break GameEnd::MaxPlies;
        }

        let moves = position.legal_moves();
        let mv = match moves.len() {
            0 => return Err(SearchError::NoLegalMoves),
            1 => moves[0],
            _ => {
                let result = engine.search(&position, rng)?;
                searches += 1;
                nodes += result.stats.nodes as u64;
                trace!(ply = plies, mv = ?result.mv, score = ?result.score, "Move chosen");
                result.mv
            }
        };

        if position.is_irreversible(mv) {
            quiet = 0;
        } else {
            quiet += 1;
        }
        position = position.apply(mv);
        plies += 1;
    };

    let outcome = match end {
        GameEnd::Finished(conclusion) => outcome_value(conclusion),
        GameEnd::QuietPlyLimit | GameEnd::MaxPlies => 0.0,
    };

    Ok(PlayedGame {
        positions,
        end,
        outcome,
        plies,
        searches,
        nodes,
    })
}

/// Label every position with the game outcome, adding symmetry variants
/// when `augment` is set. Side-swapping variants get the negated label.
pub fn label_positions<P: Position>(game: &PlayedGame<P>, augment: bool) -> Vec<LabeledPosition<P>> {
    let mut records = Vec::with_capacity(game.positions.len() * if augment { 2 } else { 1 });
    for position in &game.positions {
        if augment {
            for variant in position.symmetries() {
                let target = if variant.swaps_sides {
                    -game.outcome
                } else {
                    game.outcome
                };
                records.push(LabeledPosition {
                    position: variant.position,
                    target,
                });
            }
        }
        records.push(LabeledPosition {
            position: position.clone(),
            target: game.outcome,
        });
    }
    records
}

/// Play one game and stream its records to `tx`.
///
/// Runs on a blocking thread. The `Finished` sentinel is sent whether or not
/// the game succeeded.
pub fn run_worker<P, E>(
    game: usize,
    engine: &MinimaxEngine<E>,
    start: P,
    limits: &GameLimits,
    augment: bool,
    mut rng: ChaCha20Rng,
    tx: &mpsc::Sender<WorkerMessage<P>>,
) -> Result<GameSummary, SearchError>
where
    P: Position,
    E: Evaluator<P>,
{
    let played = match play_game(engine, start, limits, &mut rng) {
        Ok(played) => played,
        Err(e) => {
            let _ = tx.blocking_send(WorkerMessage::Finished(game, None));
            return Err(e);
        }
    };

    let records = label_positions(&played, augment);
    let summary = GameSummary {
        game,
        plies: played.plies,
        outcome: played.outcome,
        records: records.len(),
        searches: played.searches,
        nodes: played.nodes,
    };
    debug!(
        game,
        plies = played.plies,
        outcome = played.outcome,
        end = ?played.end,
        records = records.len(),
        "Game finished"
    );

    for record in records {
        if tx.blocking_send(WorkerMessage::Record(record)).is_err() {
            warn!(game, "Record channel closed, dropping remaining positions");
            break;
        }
    }
    let _ = tx.blocking_send(WorkerMessage::Finished(game, Some(summary.clone())));
    Ok(summary)
}

/// Everything received for one batch of games.
#[derive(Debug)]
pub struct Harvest<P> {
    pub records: Vec<LabeledPosition<P>>,
    pub summaries: Vec<GameSummary>,
    pub finished: usize,
}

/// Receive until `expected` sentinels have arrived or the channel closes.
pub async fn harvest<P>(
    rx: &mut mpsc::Receiver<WorkerMessage<P>>,
    expected: usize,
    progress: Option<&ProgressBar>,
) -> Harvest<P> {
    let mut harvest = Harvest {
        records: Vec::new(),
        summaries: Vec::new(),
        finished: 0,
    };

    while harvest.finished < expected {
        match rx.recv().await {
            Some(WorkerMessage::Record(record)) => harvest.records.push(record),
            Some(WorkerMessage::Finished(_, summary)) => {
                harvest.finished += 1;
                harvest.summaries.extend(summary);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
            }
            None => break,
        }
    }

    harvest
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Side;
    use games_connect4::State;
    use minimax::{SearchConfig, StaticEvaluator};
    use rand::SeedableRng;

    fn engine() -> MinimaxEngine<StaticEvaluator> {
        MinimaxEngine::new(SearchConfig::for_testing(), StaticEvaluator)
    }

    fn limits() -> GameLimits {
        GameLimits {
            quiet_ply_limit: 50,
            max_game_plies: 512,
        }
    }

    #[test]
    fn test_play_game_reaches_conclusion() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let game = play_game(&engine(), State::new(), &limits(), &mut rng).unwrap();

        assert!(matches!(game.end, GameEnd::Finished(_)));
        assert_eq!(game.positions.len() as u32, game.plies);
        assert!(game.searches > 0);
        assert!(game.positions.iter().all(|p| !p.conclusion().is_terminal()));

        match game.end {
            GameEnd::Finished(Conclusion::Decisive { winner: Side::White }) => {
                assert_eq!(game.outcome, 1.0)
            }
            GameEnd::Finished(Conclusion::Decisive { winner: Side::Black }) => {
                assert_eq!(game.outcome, -1.0)
            }
            _ => assert_eq!(game.outcome, 0.0),
        }
    }

    #[test]
    fn test_play_game_is_deterministic() {
        let a = play_game(&engine(), State::new(), &limits(), &mut ChaCha20Rng::seed_from_u64(3)).unwrap();
        let b = play_game(&engine(), State::new(), &limits(), &mut ChaCha20Rng::seed_from_u64(3)).unwrap();
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn test_max_plies_draws() {
        let short = GameLimits {
            quiet_ply_limit: 50,
            max_game_plies: 4,
        };
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let game = play_game(&engine(), State::new(), &short, &mut rng).unwrap();

        assert_eq!(game.end, GameEnd::MaxPlies);
        assert_eq!(game.plies, 4);
        assert_eq!(game.positions.len(), 5);
        assert_eq!(game.outcome, 0.0);
    }

    #[test]
    fn test_labels_and_augmentation() {
        let game = PlayedGame {
            positions: vec![State::new(), State::from_columns(&[0])],
            end: GameEnd::Finished(Conclusion::Decisive { winner: Side::Black }),
            outcome: -1.0,
            plies: 2,
            searches: 0,
            nodes: 0,
        };

        let plain = label_positions(&game, false);
        assert_eq!(plain.len(), 2);
        assert!(plain.iter().all(|r| r.target == -1.0));

        // The empty board is symmetric; the second position gains its mirror
        let augmented = label_positions(&game, true);
        assert_eq!(augmented.len(), 3);
        assert!(augmented.iter().any(|r| r.position == State::from_columns(&[6])));
        assert!(augmented.iter().all(|r| r.target == -1.0));
    }

    #[tokio::test]
    async fn test_harvest_stops_after_expected_sentinels() {
        let (tx, mut rx) = mpsc::channel(8);
        let workers = 3;

        for game in 0..workers {
            let tx = tx.clone();
            tokio::spawn(async move {
                for i in 0..game + 1 {
                    let record = LabeledPosition {
                        position: i as u32,
                        target: 1.0,
                    };
                    tx.send(WorkerMessage::Record(record)).await.unwrap();
                }
                let summary = GameSummary {
                    game,
                    plies: 1,
                    outcome: 1.0,
                    records: game + 1,
                    searches: 0,
                    nodes: 0,
                };
                tx.send(WorkerMessage::Finished(game, Some(summary))).await.unwrap();
            });
        }

        // `tx` is still alive here, so only the sentinel count ends the loop
        let harvest = harvest(&mut rx, workers, None).await;
        assert_eq!(harvest.finished, 3);
        assert_eq!(harvest.records.len(), 1 + 2 + 3);
        assert_eq!(harvest.summaries.len(), 3);
        drop(tx);
    }

    #[tokio::test]
    async fn test_harvest_ends_when_channel_closes() {
        let (tx, mut rx) = mpsc::channel::<WorkerMessage<u32>>(4);
        tx.send(WorkerMessage::Finished(0, None)).await.unwrap();
        drop(tx);

        let harvest = harvest(&mut rx, 5, None).await;
        assert_eq!(harvest.finished, 1);
        assert!(harvest.summaries.is_empty());
    }

    #[tokio::test]
    async fn test_worker_streams_records_then_sentinel() {
        let (tx, mut rx) = mpsc::channel(4096);
        let summary = tokio::task::spawn_blocking(move || {
            run_worker(
                7,
                &engine(),
                State::new(),
                &limits(),
                true,
                ChaCha20Rng::seed_from_u64(9),
                &tx,
            )
        })
        .await
        .unwrap()
        .unwrap();

        let harvest = harvest(&mut rx, 1, None).await;
        assert_eq!(harvest.finished, 1);
        assert_eq!(harvest.records.len(), summary.records);
        assert_eq!(harvest.summaries, vec![summary]);
    }
}
