//! Training loop: self-play, residual fitting, model persistence, arena.

use anyhow::{anyhow, Context, Result};
use engine_core::FeatureCodec;
use games_connect4::{Connect4Codec, State};
use indicatif::{ProgressBar, ProgressStyle};
use minimax::{GreedyPolicy, MinimaxEngine, StaticEvaluator};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use regression_tree::{train_boosted, views, BoostingOutcome, Ensemble, SampleBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::arena::{run_arena, ArenaResult};
use crate::config::Config;
use crate::model::{ModelStore, TrainedEvaluator};
use crate::selfplay::{harvest, run_worker, LabeledPosition};
use crate::stats::TrainingStats;

type TrainedEngine = MinimaxEngine<TrainedEvaluator<Connect4Codec>>;

/// Stream reserved for the arena so its games never share a stream with
/// self-play.
const ARENA_STREAM: u64 = u64::MAX;

/// RNG for one game, derived from the base seed, or from entropy.
pub fn game_rng(base_seed: Option<u64>, iteration: u32, stream: u64) -> ChaCha20Rng {
    match base_seed {
        Some(seed) => {
            let mut rng = ChaCha20Rng::seed_from_u64(seed.wrapping_add(iteration as u64));
            rng.set_stream(stream);
            rng
        }
        None => ChaCha20Rng::from_entropy(),
    }
}

/// Encode records and make their targets residual against `model`.
pub fn residual_samples<C>(
    codec: &C,
    model: &Ensemble,
    records: &[LabeledPosition<State>],
) -> Vec<SampleBuf>
where
    C: FeatureCodec<State>,
{
    records
        .iter()
        .map(|record| {
            let features = codec.features(&record.position);
            let target = record.target - model.predict(&features);
            SampleBuf::new(features, target)
        })
        .collect()
}

/// Shuffle `rows` and fit a boosted ensemble, holding out
/// `validation_fraction` of them for early stopping.
pub fn fit_residuals(
    config: &Config,
    max_features: usize,
    mut rows: Vec<SampleBuf>,
    rng: &mut ChaCha20Rng,
) -> BoostingOutcome {
    rows.shuffle(rng);
    let held_out = (rows.len() as f64 * config.validation_fraction) as usize;
    let (validation, train) = rows.split_at(held_out);

    let train = views(train);
    let validation = views(validation);
    let validation = if validation.is_empty() {
        None
    } else {
        Some(validation.as_slice())
    };

    train_boosted(&config.boosting_params(max_features), &train, validation)
}

pub struct Orchestrator {
    config: Config,
    codec: Connect4Codec,
    store: ModelStore,
    stats: TrainingStats,
    shutdown_signal: AtomicBool,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        let codec = Connect4Codec::from_extended(config.extended_features);
        let store = ModelStore::new(config.data_path());
        let stats = TrainingStats::new(&config.data_path());

        Self {
            config,
            codec,
            store,
            stats,
            shutdown_signal: AtomicBool::new(false),
        }
    }

    /// Request a stop after the current iteration.
    pub fn shutdown(&self) {
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    fn build_engine(&self, model: Arc<Ensemble>) -> TrainedEngine {
        let evaluator = TrainedEvaluator::new(model, self.codec, self.config.blend_static_eval);
        let policy = if self.config.greedy_mobility {
            GreedyPolicy::mobility_minimizing()
        } else {
            GreedyPolicy::new()
        };
        MinimaxEngine::new(self.config.search_config(), evaluator).with_rollout_policy(policy)
    }

    fn progress_bar(&self, iteration: u32) -> Option<ProgressBar> {
        if !self.config.progress || !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            return None;
        }
        let pb = ProgressBar::new(self.config.games_per_iteration as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} games {msg} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("iteration {}", iteration));
        Some(pb)
    }

    /// Run training iterations until the limit or a shutdown request.
    /// Returns the final model.
    pub async fn run(&self) -> Result<Arc<Ensemble>> {
        let mut model = Arc::new(self.store.try_load_existing()?.unwrap_or_default());
        let seed = self.config.base_seed();
        info!(
            iterations = self.config.iterations,
            games_per_iteration = self.config.games_per_iteration,
            extended_features = self.config.extended_features,
            seed = ?seed,
            trees = model.len(),
            "Starting training"
        );

        let mut iteration = 0u32;
        loop {
            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!("Shutdown requested, stopping before iteration {}", iteration);
                break;
            }
            if self.config.iterations > 0 && iteration >= self.config.iterations {
                info!("Reached {} iterations, stopping", iteration);
                break;
            }

            model = self
                .run_iteration(iteration, Arc::clone(&model))
                .await
                .with_context(|| format!("Iteration {} failed", iteration))?;
            iteration += 1;

            if self.config.eval_interval > 0
                && self.config.eval_games > 0
                && iteration % self.config.eval_interval == 0
            {
                let result = self
                    .evaluate(iteration, Arc::clone(&model))
                    .await
                    .with_context(|| format!("Arena after iteration {} failed", iteration))?;
                self.stats.record_win_rate(result.win_rate());
            }

            self.stats.write_stats();
        }

        Ok(model)
    }

    /// One iteration: play a batch of games with the current model, fit new
    /// trees to the residual and save the extended model.
    pub async fn run_iteration(&self, iteration: u32, model: Arc<Ensemble>) -> Result<Arc<Ensemble>> {
        let start = Instant::now();
        let games = self.config.games_per_iteration;
        let limits = self.config.game_limits();
        let seed = self.config.base_seed();
        let engine = Arc::new(self.build_engine(Arc::clone(&model)));

        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity);
        let mut handles = Vec::with_capacity(games);
        for game in 0..games {
            let engine = Arc::clone(&engine);
            let tx = tx.clone();
            let rng = game_rng(seed, iteration, game as u64);
            let augment = self.config.augment;
            handles.push(tokio::task::spawn_blocking(move || {
                run_worker(game, &*engine, State::new(), &limits, augment, rng, &tx)
            }));
        }
        // Workers hold the only senders so a lost worker closes the channel
        drop(tx);

        let progress = self.progress_bar(iteration);
        let batch = harvest(&mut rx, games, progress.as_ref()).await;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        for (game, handle) in handles.into_iter().enumerate() {
            handle
                .await
                .map_err(|e| anyhow!("Self-play worker {} panicked: {}", game, e))?
                .with_context(|| format!("Self-play game {} failed", game))?;
        }
        for summary in &batch.summaries {
            self.stats.record_game(summary);
        }

        let plies: u32 = batch.summaries.iter().map(|s| s.plies).sum();
        info!(
            iteration,
            games = batch.finished,
            plies,
            records = batch.records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Self-play finished"
        );

        if batch.records.is_empty() {
            warn!(iteration, "No positions recorded, keeping the current model");
            return Ok(model);
        }

        let records = batch.records.len();
        let codec = self.codec;
        let config = self.config.clone();
        let current = Arc::clone(&model);
        let mut rng = game_rng(seed, iteration, games as u64);
        let outcome = tokio::task::spawn_blocking(move || {
            let rows = residual_samples(&codec, &current, &batch.records);
            fit_residuals(&config, FeatureCodec::<State>::feature_count(&codec), rows, &mut rng)
        })
        .await
        .map_err(|e| anyhow!("Training task panicked: {}", e))?;

        if let Some(last) = outcome.history.last() {
            debug!(
                rounds = outcome.history.len(),
                train_rmse = last.train_rmse,
                validation_rmse = ?last.validation_rmse,
                stopped_early = outcome.stopped_early,
                "Boosting finished"
            );
        }
        if outcome.ensemble.len() <= 1 {
            info!(iteration, "No trees beyond the bias were produced");
        }

        let mut next = (*model).clone();
        let added = outcome.ensemble.len();
        next.extend(outcome.ensemble);

        let path = self.store.save(&next)?;
        self.stats.record_iteration(records, next.len());
        info!(
            iteration,
            added,
            trees = next.len(),
            nodes = next.node_count(),
            path = %path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Iteration complete"
        );

        Ok(Arc::new(next))
    }

    /// Pit the current model against a static-evaluation engine.
    pub async fn evaluate(&self, iteration: u32, model: Arc<Ensemble>) -> Result<ArenaResult> {
        let candidate = self.build_engine(model);
        let baseline = MinimaxEngine::new(self.config.search_config(), StaticEvaluator);
        let games = self.config.eval_games;
        let limits = self.config.game_limits();
        let mut rng = game_rng(self.config.base_seed(), iteration, ARENA_STREAM);

        let result = tokio::task::spawn_blocking(move || {
            run_arena(&candidate, &baseline, &State::new(), games, &limits, &mut rng)
        })
        .await
        .map_err(|e| anyhow!("Arena task panicked: {}", e))??;

        info!(
            iteration,
            wins = result.wins,
            losses = result.losses,
            draws = result.draws,
            win_rate = format!("{:.3}", result.win_rate()),
            "Arena finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rand::Rng;
    use tempfile::tempdir;

    fn test_config(data_dir: &str) -> Config {
        let mut config = Config::try_parse_from(["actor"]).unwrap();
        config.data_dir = data_dir.to_string();
        config.seed = Some(42);
        config.iterations = 1;
        config.games_per_iteration = 2;
        config.dilution_limit = 16.0;
        config.rollouts = 4;
        config.rollout_depth = 2;
        config.search_max_depth = 8;
        config.max_trees = 3;
        config.tree_max_depth = 2;
        config.min_leaf_size = 4;
        config.validation_fraction = 0.2;
        config.channel_capacity = 16;
        config.progress = false;
        config.eval_interval = 1;
        config.eval_games = 2;
        config
    }

    #[test]
    fn test_game_rng_is_deterministic_per_stream() {
        let mut a = game_rng(Some(1), 0, 3);
        let mut b = game_rng(Some(1), 0, 3);
        let mut c = game_rng(Some(1), 0, 4);
        let (x, y, z): (u64, u64, u64) = (a.gen(), b.gen(), c.gen());
        assert_eq!(x, y);
        assert_ne!(x, z);
    }

    #[test]
    fn test_residual_samples() {
        let model = Ensemble::new(vec![regression_tree::TreeNode::leaf(0.25)]);
        let records = vec![
            LabeledPosition {
                position: State::from_columns(&[3]),
                target: 1.0,
            },
            LabeledPosition {
                position: State::new(),
                target: -1.0,
            },
        ];

        let rows = residual_samples(&Connect4Codec::Compact, &model, &records);
        assert_eq!(rows.len(), 2);
        assert!((rows[0].target - 0.75).abs() < 1e-12);
        assert!((rows[1].target + 1.25).abs() < 1e-12);
        assert!(rows[1].features.is_empty());
    }

    #[test]
    fn test_fit_residuals_learns_sign() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path().to_str().unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(0);

        let mut rows = Vec::new();
        for i in 0..40u16 {
            rows.push(SampleBuf::new(vec![0, i % 5 + 1], 1.0));
            rows.push(SampleBuf::new(vec![i % 5 + 1], -1.0));
        }

        let outcome = fit_residuals(&config, 8, rows, &mut rng);
        assert!(outcome.ensemble.len() >= 2);
        assert!(outcome.ensemble.predict(&[0, 1]) > outcome.ensemble.predict(&[1]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_iteration_saves_model_and_stats() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path().to_str().unwrap());
        let orchestrator = Orchestrator::new(config.clone());

        // Validation may roll the run back to nothing, but the model is saved
        let model = orchestrator.run().await.unwrap();
        assert!(config.model_path().exists());

        let loaded = Ensemble::load_json(config.model_path()).unwrap();
        assert_eq!(&loaded, model.as_ref());

        let snapshot = orchestrator.stats().snapshot();
        assert_eq!(snapshot.iterations_completed, 1);
        assert_eq!(snapshot.games_completed, 2);
        assert!(snapshot.last_win_rate.is_some());
        assert!(dir.path().join("training_stats.json").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_resumes_from_saved_model() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path().to_str().unwrap());

        let first = Orchestrator::new(config.clone()).run().await.unwrap();
        let second = Orchestrator::new(config).run().await.unwrap();
        assert!(second.len() >= first.len());
        assert_eq!(&second.trees[..first.len()], &first.trees[..]);
    }

    #[tokio::test]
    async fn test_shutdown_before_first_iteration() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path().to_str().unwrap());
        let orchestrator = Orchestrator::new(config.clone());

        orchestrator.shutdown();
        let model = orchestrator.run().await.unwrap();
        assert!(model.is_empty());
        assert!(!config.model_path().exists());
    }
}
