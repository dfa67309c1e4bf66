//! Configuration for the self-play trainer
//!
//! Defaults come from the central config.toml (with `ARBOR_*` overrides),
//! then `ACTOR_*` environment variables, then CLI arguments, which take
//! highest priority.

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use engine_config::{load_config, CentralConfig};
use minimax::SearchConfig;
use once_cell::sync::Lazy;
use regression_tree::BoostingParams;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use crate::selfplay::GameLimits;

static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn default_data_dir() -> String {
    std::env::var("ACTOR_DATA_DIR").unwrap_or_else(|_| CENTRAL_CONFIG.common.data_dir.clone())
}

fn default_log_level() -> String {
    std::env::var("ACTOR_LOG_LEVEL").unwrap_or_else(|_| CENTRAL_CONFIG.common.log_level.clone())
}

fn default_seed() -> Option<u64> {
    std::env::var("ACTOR_SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .or(CENTRAL_CONFIG.common.seed)
}

fn default_iterations() -> u32 {
    env_or("ACTOR_ITERATIONS", CENTRAL_CONFIG.training.iterations)
}

fn default_games_per_iteration() -> usize {
    env_or(
        "ACTOR_GAMES_PER_ITERATION",
        CENTRAL_CONFIG.selfplay.games_per_iteration,
    )
}

fn default_dilution_limit() -> f64 {
    env_or("ACTOR_DILUTION_LIMIT", CENTRAL_CONFIG.search.dilution_limit)
}

fn default_rollouts() -> u32 {
    env_or("ACTOR_ROLLOUTS", CENTRAL_CONFIG.search.rollouts)
}

fn default_rollout_depth() -> u32 {
    env_or("ACTOR_ROLLOUT_DEPTH", CENTRAL_CONFIG.search.rollout_depth)
}

fn default_search_max_depth() -> u32 {
    env_or("ACTOR_SEARCH_MAX_DEPTH", CENTRAL_CONFIG.search.max_depth)
}

fn default_greedy_mobility() -> bool {
    env_or("ACTOR_GREEDY_MOBILITY", CENTRAL_CONFIG.search.greedy_mobility)
}

fn default_extended_features() -> bool {
    env_or(
        "ACTOR_EXTENDED_FEATURES",
        CENTRAL_CONFIG.training.extended_features,
    )
}

fn default_max_trees() -> usize {
    env_or("ACTOR_MAX_TREES", CENTRAL_CONFIG.training.max_trees)
}

fn default_tree_max_depth() -> u32 {
    env_or("ACTOR_TREE_MAX_DEPTH", CENTRAL_CONFIG.training.max_depth)
}

fn default_min_leaf_size() -> usize {
    env_or("ACTOR_MIN_LEAF_SIZE", CENTRAL_CONFIG.training.min_leaf_size)
}

fn default_learning_rate() -> f64 {
    env_or("ACTOR_LEARNING_RATE", CENTRAL_CONFIG.training.learning_rate)
}

fn default_l2_decay() -> f64 {
    env_or("ACTOR_L2_DECAY", CENTRAL_CONFIG.training.l2_decay)
}

fn default_patience() -> u32 {
    env_or("ACTOR_PATIENCE", CENTRAL_CONFIG.training.patience)
}

fn default_validation_fraction() -> f64 {
    env_or(
        "ACTOR_VALIDATION_FRACTION",
        CENTRAL_CONFIG.training.validation_fraction,
    )
}

fn default_blend_static_eval() -> bool {
    env_or(
        "ACTOR_BLEND_STATIC_EVAL",
        CENTRAL_CONFIG.training.blend_static_eval,
    )
}

fn default_quiet_ply_limit() -> u32 {
    env_or("ACTOR_QUIET_PLY_LIMIT", CENTRAL_CONFIG.selfplay.quiet_ply_limit)
}

fn default_max_game_plies() -> u32 {
    env_or("ACTOR_MAX_GAME_PLIES", CENTRAL_CONFIG.selfplay.max_game_plies)
}

fn default_augment() -> bool {
    env_or("ACTOR_AUGMENT", CENTRAL_CONFIG.selfplay.augment)
}

fn default_channel_capacity() -> usize {
    env_or(
        "ACTOR_CHANNEL_CAPACITY",
        CENTRAL_CONFIG.selfplay.channel_capacity,
    )
}

fn default_progress() -> bool {
    env_or("ACTOR_PROGRESS", CENTRAL_CONFIG.selfplay.progress)
}

fn default_eval_interval() -> u32 {
    env_or("ACTOR_EVAL_INTERVAL", CENTRAL_CONFIG.evaluation.interval)
}

fn default_eval_games() -> u32 {
    env_or("ACTOR_EVAL_GAMES", CENTRAL_CONFIG.evaluation.games)
}

#[derive(Parser, Debug, Clone)]
#[command(name = "actor")]
#[command(about = "arbor actor - Self-play trainer for the minimax evaluation ensemble")]
#[command(
    long_about = "Plays Connect 4 against itself with a budgeted minimax search, labels every
position with the game result and fits boosted regression trees to the residual
of the current model. The model is saved to <data_dir>/models/latest.json.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Data directory for models and stats
    #[arg(long, default_value_t = default_data_dir())]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Base seed for self-play (omit for entropy)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Training iterations to run (0 for unlimited)
    #[arg(long, default_value_t = default_iterations())]
    pub iterations: u32,

    /// Self-play games per iteration
    #[arg(long, default_value_t = default_games_per_iteration())]
    pub games_per_iteration: usize,

    /// Expansion credit handed to each root child
    #[arg(long, default_value_t = default_dilution_limit())]
    pub dilution_limit: f64,

    /// Greedy rollouts per search
    #[arg(long, default_value_t = default_rollouts())]
    pub rollouts: u32,

    /// New plies a rollout may add
    #[arg(long, default_value_t = default_rollout_depth())]
    pub rollout_depth: u32,

    /// Hard cap on expansion depth
    #[arg(long, default_value_t = default_search_max_depth())]
    pub search_max_depth: u32,

    /// Rollouts prefer moves that leave the opponent fewer replies
    #[arg(long, default_value_t = default_greedy_mobility(), action = ArgAction::Set)]
    pub greedy_mobility: bool,

    /// Use the extended Connect 4 feature set
    #[arg(long, default_value_t = default_extended_features(), action = ArgAction::Set)]
    pub extended_features: bool,

    /// Trees per boosting run, bias tree included
    #[arg(long, default_value_t = default_max_trees())]
    pub max_trees: usize,

    /// Maximum depth of a single tree
    #[arg(long, default_value_t = default_tree_max_depth())]
    pub tree_max_depth: u32,

    /// Minimum samples on each side of a split
    #[arg(long, default_value_t = default_min_leaf_size())]
    pub min_leaf_size: usize,

    #[arg(long, default_value_t = default_learning_rate())]
    pub learning_rate: f64,

    /// Per-round decay of the running prediction (1.0 disables)
    #[arg(long, default_value_t = default_l2_decay())]
    pub l2_decay: f64,

    /// Non-improving validation rounds tolerated
    #[arg(long, default_value_t = default_patience())]
    pub patience: u32,

    /// Share of positions held out for early stopping
    #[arg(long, default_value_t = default_validation_fraction())]
    pub validation_fraction: f64,

    /// Add the static balance to the ensemble score during search
    #[arg(long, default_value_t = default_blend_static_eval(), action = ArgAction::Set)]
    pub blend_static_eval: bool,

    /// Consecutive reversible plies before a game is drawn
    #[arg(long, default_value_t = default_quiet_ply_limit())]
    pub quiet_ply_limit: u32,

    /// Plies before a game is drawn regardless
    #[arg(long, default_value_t = default_max_game_plies())]
    pub max_game_plies: u32,

    /// Add symmetry variants of every recorded position
    #[arg(long, default_value_t = default_augment(), action = ArgAction::Set)]
    pub augment: bool,

    /// Capacity of the record channel between workers and the trainer
    #[arg(long, default_value_t = default_channel_capacity())]
    pub channel_capacity: usize,

    /// Show a progress bar while games are running
    #[arg(long, default_value_t = default_progress(), action = ArgAction::Set)]
    pub progress: bool,

    /// Run the arena every N iterations (0 to disable)
    #[arg(long, default_value_t = default_eval_interval())]
    pub eval_interval: u32,

    /// Games per arena run
    #[arg(long, default_value_t = default_eval_games())]
    pub eval_games: u32,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.is_empty() {
            return Err(anyhow!("data_dir cannot be empty"));
        }

        if self.games_per_iteration == 0 {
            return Err(anyhow!("games_per_iteration must be greater than 0"));
        }

        if !(self.dilution_limit.is_finite() && self.dilution_limit >= 1.0) {
            return Err(anyhow!("dilution_limit must be a finite value of at least 1"));
        }

        if self.max_trees == 0 {
            return Err(anyhow!("max_trees must be greater than 0"));
        }

        if self.min_leaf_size == 0 {
            return Err(anyhow!("min_leaf_size must be greater than 0"));
        }

        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(anyhow!("learning_rate must be in (0, 1]"));
        }

        if !(self.l2_decay > 0.0 && self.l2_decay <= 1.0) {
            return Err(anyhow!("l2_decay must be in (0, 1]"));
        }

        if !(0.0..1.0).contains(&self.validation_fraction) {
            return Err(anyhow!("validation_fraction must be in [0, 1)"));
        }

        if self.channel_capacity == 0 {
            return Err(anyhow!("channel_capacity must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    /// CLI seed, else `ACTOR_SEED`, else the central config.
    pub fn base_seed(&self) -> Option<u64> {
        self.seed.or_else(default_seed)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            dilution_limit: self.dilution_limit,
            rollouts: self.rollouts,
            rollout_depth: self.rollout_depth,
            max_depth: self.search_max_depth,
        }
    }

    pub fn boosting_params(&self, max_features: usize) -> BoostingParams {
        BoostingParams {
            max_features,
            min_leaf_size: self.min_leaf_size,
            max_depth: self.tree_max_depth,
            max_trees: self.max_trees,
            learning_rate: self.learning_rate,
            l2_decay: self.l2_decay,
            patience: self.patience,
        }
    }

    pub fn game_limits(&self) -> GameLimits {
        GameLimits {
            quiet_ply_limit: self.quiet_ply_limit,
            max_game_plies: self.max_game_plies,
        }
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Path to the latest model file
    pub fn model_path(&self) -> PathBuf {
        self.data_path().join("models").join("latest.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            data_dir: "../data".into(),
            log_level: "info".into(),
            seed: Some(7),
            iterations: 3,
            games_per_iteration: 4,
            dilution_limit: 64.0,
            rollouts: 8,
            rollout_depth: 3,
            search_max_depth: 16,
            greedy_mobility: false,
            extended_features: true,
            max_trees: 8,
            tree_max_depth: 4,
            min_leaf_size: 16,
            learning_rate: 0.5,
            l2_decay: 1.0,
            patience: 2,
            validation_fraction: 0.1,
            blend_static_eval: true,
            quiet_ply_limit: 50,
            max_game_plies: 512,
            augment: true,
            channel_capacity: 64,
            progress: false,
            eval_interval: 5,
            eval_games: 10,
        }
    }

    #[test]
    fn validate_accepts_valid_configuration() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_games() {
        let mut cfg = base_config();
        cfg.games_per_iteration = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("games_per_iteration"));
    }

    #[test]
    fn validate_rejects_small_dilution_limit() {
        let mut cfg = base_config();
        cfg.dilution_limit = 0.5;
        assert!(cfg.validate().unwrap_err().to_string().contains("dilution_limit"));

        cfg.dilution_limit = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_learning_rate() {
        let mut cfg = base_config();
        cfg.learning_rate = 0.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("learning_rate"));

        cfg.learning_rate = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_l2_decay() {
        let mut cfg = base_config();
        cfg.l2_decay = 0.0;
        assert!(cfg.validate().unwrap_err().to_string().contains("l2_decay"));
    }

    #[test]
    fn validate_rejects_bad_validation_fraction() {
        let mut cfg = base_config();
        cfg.validation_fraction = 1.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("validation_fraction"));

        cfg.validation_fraction = 0.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let mut cfg = base_config();
        cfg.max_trees = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("max_trees"));

        let mut cfg = base_config();
        cfg.min_leaf_size = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("min_leaf_size"));

        let mut cfg = base_config();
        cfg.channel_capacity = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("channel_capacity"));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "nope".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn cli_seed_wins() {
        assert_eq!(base_config().base_seed(), Some(7));
    }

    #[test]
    fn search_config_maps_fields() {
        let search = base_config().search_config();
        assert_eq!(search, SearchConfig::for_testing());
    }

    #[test]
    fn boosting_params_map_fields() {
        let params = base_config().boosting_params(213);
        assert_eq!(params.max_features, 213);
        assert_eq!(params.max_trees, 8);
        assert_eq!(params.max_depth, 4);
        assert_eq!(params.min_leaf_size, 16);
        assert_eq!(params.patience, 2);
    }

    #[test]
    fn model_path_constructs_correctly() {
        let cfg = base_config();
        assert_eq!(cfg.model_path(), PathBuf::from("../data/models/latest.json"));
        assert_eq!(cfg.game_limits().max_game_plies, 512);
    }

    #[test]
    fn parses_bool_flags_with_values() {
        let cfg = Config::try_parse_from([
            "actor",
            "--augment",
            "false",
            "--games-per-iteration",
            "2",
            "--seed",
            "11",
        ])
        .unwrap();
        assert!(!cfg.augment);
        assert_eq!(cfg.games_per_iteration, 2);
        assert_eq!(cfg.seed, Some(11));
    }
}
