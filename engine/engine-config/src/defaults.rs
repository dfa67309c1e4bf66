//! Default configuration values loaded from config.defaults.toml.
//!
//! This module loads defaults from the shared TOML file at compile time,
//! so the documented defaults file and the binary never disagree.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    search: SearchDefaults,
    training: TrainingDefaults,
    selfplay: SelfPlayDefaults,
    evaluation: EvaluationDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    data_dir: String,
    log_level: String,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchDefaults {
    dilution_limit: f64,
    rollouts: u32,
    rollout_depth: u32,
    max_depth: u32,
    greedy_mobility: bool,
}

#[derive(Debug, Deserialize)]
struct TrainingDefaults {
    iterations: u32,
    extended_features: bool,
    max_trees: usize,
    max_depth: u32,
    min_leaf_size: usize,
    learning_rate: f64,
    l2_decay: f64,
    patience: u32,
    validation_fraction: f64,
    blend_static_eval: bool,
}

#[derive(Debug, Deserialize)]
struct SelfPlayDefaults {
    games_per_iteration: usize,
    quiet_ply_limit: u32,
    max_game_plies: u32,
    augment: bool,
    channel_capacity: usize,
    progress: bool,
}

#[derive(Debug, Deserialize)]
struct EvaluationDefaults {
    interval: u32,
    games: u32,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn data_dir() -> &'static str {
    &DEFAULTS.common.data_dir
}
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}
pub fn seed() -> Option<u64> {
    DEFAULTS.common.seed
}

// Search
pub fn dilution_limit() -> f64 {
    DEFAULTS.search.dilution_limit
}
pub fn rollouts() -> u32 {
    DEFAULTS.search.rollouts
}
pub fn rollout_depth() -> u32 {
    DEFAULTS.search.rollout_depth
}
pub fn search_max_depth() -> u32 {
    DEFAULTS.search.max_depth
}
pub fn greedy_mobility() -> bool {
    DEFAULTS.search.greedy_mobility
}

// Training
pub fn iterations() -> u32 {
    DEFAULTS.training.iterations
}
pub fn extended_features() -> bool {
    DEFAULTS.training.extended_features
}
pub fn max_trees() -> usize {
    DEFAULTS.training.max_trees
}
pub fn tree_max_depth() -> u32 {
    DEFAULTS.training.max_depth
}
pub fn min_leaf_size() -> usize {
    DEFAULTS.training.min_leaf_size
}
pub fn learning_rate() -> f64 {
    DEFAULTS.training.learning_rate
}
pub fn l2_decay() -> f64 {
    DEFAULTS.training.l2_decay
}
pub fn patience() -> u32 {
    DEFAULTS.training.patience
}
pub fn validation_fraction() -> f64 {
    DEFAULTS.training.validation_fraction
}
pub fn blend_static_eval() -> bool {
    DEFAULTS.training.blend_static_eval
}

// Self-play
pub fn games_per_iteration() -> usize {
    DEFAULTS.selfplay.games_per_iteration
}
pub fn quiet_ply_limit() -> u32 {
    DEFAULTS.selfplay.quiet_ply_limit
}
pub fn max_game_plies() -> u32 {
    DEFAULTS.selfplay.max_game_plies
}
pub fn augment() -> bool {
    DEFAULTS.selfplay.augment
}
pub fn channel_capacity() -> usize {
    DEFAULTS.selfplay.channel_capacity
}
pub fn progress() -> bool {
    DEFAULTS.selfplay.progress
}

// Evaluation
pub fn eval_interval() -> u32 {
    DEFAULTS.evaluation.interval
}
pub fn eval_games() -> u32 {
    DEFAULTS.evaluation.games
}
