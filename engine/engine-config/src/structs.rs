//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_data_dir() -> String {
    defaults::data_dir().into()
}
fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_seed() -> Option<u64> {
    defaults::seed()
}
fn d_dilution_limit() -> f64 {
    defaults::dilution_limit()
}
fn d_rollouts() -> u32 {
    defaults::rollouts()
}
fn d_rollout_depth() -> u32 {
    defaults::rollout_depth()
}
fn d_search_max_depth() -> u32 {
    defaults::search_max_depth()
}
fn d_greedy_mobility() -> bool {
    defaults::greedy_mobility()
}
fn d_iterations() -> u32 {
    defaults::iterations()
}
fn d_extended_features() -> bool {
    defaults::extended_features()
}
fn d_max_trees() -> usize {
    defaults::max_trees()
}
fn d_tree_max_depth() -> u32 {
    defaults::tree_max_depth()
}
fn d_min_leaf_size() -> usize {
    defaults::min_leaf_size()
}
fn d_lr() -> f64 {
    defaults::learning_rate()
}
fn d_l2_decay() -> f64 {
    defaults::l2_decay()
}
fn d_patience() -> u32 {
    defaults::patience()
}
fn d_validation_fraction() -> f64 {
    defaults::validation_fraction()
}
fn d_blend_static_eval() -> bool {
    defaults::blend_static_eval()
}
fn d_games_per_iteration() -> usize {
    defaults::games_per_iteration()
}
fn d_quiet_ply_limit() -> u32 {
    defaults::quiet_ply_limit()
}
fn d_max_game_plies() -> u32 {
    defaults::max_game_plies()
}
fn d_augment() -> bool {
    defaults::augment()
}
fn d_channel_capacity() -> usize {
    defaults::channel_capacity()
}
fn d_progress() -> bool {
    defaults::progress()
}
fn d_eval_interval() -> u32 {
    defaults::eval_interval()
}
fn d_eval_games() -> u32 {
    defaults::eval_games()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub selfplay: SelfPlayConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_data_dir")]
    pub data_dir: String,
    #[serde(default = "d_log_level")]
    pub log_level: String,
    /// Base seed for self-play RNGs (None = entropy)
    #[serde(default = "d_seed")]
    pub seed: Option<u64>,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir().into(),
            log_level: defaults::log_level().into(),
            seed: defaults::seed(),
        }
    }
}

/// Budgeted search configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(default = "d_dilution_limit")]
    pub dilution_limit: f64,
    #[serde(default = "d_rollouts")]
    pub rollouts: u32,
    #[serde(default = "d_rollout_depth")]
    pub rollout_depth: u32,
    #[serde(default = "d_search_max_depth")]
    pub max_depth: u32,
    #[serde(default = "d_greedy_mobility")]
    pub greedy_mobility: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dilution_limit: defaults::dilution_limit(),
            rollouts: defaults::rollouts(),
            rollout_depth: defaults::rollout_depth(),
            max_depth: defaults::search_max_depth(),
            greedy_mobility: defaults::greedy_mobility(),
        }
    }
}

/// Boosted tree training configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrainingConfig {
    #[serde(default = "d_iterations")]
    pub iterations: u32,
    #[serde(default = "d_extended_features")]
    pub extended_features: bool,
    #[serde(default = "d_max_trees")]
    pub max_trees: usize,
    #[serde(default = "d_tree_max_depth")]
    pub max_depth: u32,
    #[serde(default = "d_min_leaf_size")]
    pub min_leaf_size: usize,
    #[serde(default = "d_lr")]
    pub learning_rate: f64,
    #[serde(default = "d_l2_decay")]
    pub l2_decay: f64,
    #[serde(default = "d_patience")]
    pub patience: u32,
    #[serde(default = "d_validation_fraction")]
    pub validation_fraction: f64,
    #[serde(default = "d_blend_static_eval")]
    pub blend_static_eval: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            iterations: defaults::iterations(),
            extended_features: defaults::extended_features(),
            max_trees: defaults::max_trees(),
            max_depth: defaults::tree_max_depth(),
            min_leaf_size: defaults::min_leaf_size(),
            learning_rate: defaults::learning_rate(),
            l2_decay: defaults::l2_decay(),
            patience: defaults::patience(),
            validation_fraction: defaults::validation_fraction(),
            blend_static_eval: defaults::blend_static_eval(),
        }
    }
}

/// Self-play generation configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SelfPlayConfig {
    #[serde(default = "d_games_per_iteration")]
    pub games_per_iteration: usize,
    #[serde(default = "d_quiet_ply_limit")]
    pub quiet_ply_limit: u32,
    #[serde(default = "d_max_game_plies")]
    pub max_game_plies: u32,
    #[serde(default = "d_augment")]
    pub augment: bool,
    #[serde(default = "d_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "d_progress")]
    pub progress: bool,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            games_per_iteration: defaults::games_per_iteration(),
            quiet_ply_limit: defaults::quiet_ply_limit(),
            max_game_plies: defaults::max_game_plies(),
            augment: defaults::augment(),
            channel_capacity: defaults::channel_capacity(),
            progress: defaults::progress(),
        }
    }
}

/// Arena evaluation configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EvaluationConfig {
    #[serde(default = "d_eval_interval")]
    pub interval: u32,
    #[serde(default = "d_eval_games")]
    pub games: u32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            interval: defaults::eval_interval(),
            games: defaults::eval_games(),
        }
    }
}
