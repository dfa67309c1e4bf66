//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",      // Current directory
    "../config.toml",   // Parent directory (when running from subdirectory)
    "/app/config.toml", // Docker container
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by ARBOR_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
/// 4. Docker container path (/app/config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    if let Ok(path) = std::env::var("ARBOR_CONFIG") {
        let path = Path::new(&path);
        if path.exists() {
            info!("Loading config from ARBOR_CONFIG: {}", path.display());
            return load_from_path(path);
        }
        warn!(
            "ARBOR_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// Unreadable or malformed files fall back to the built-in defaults.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u32, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
    // Optional parseable field (Option<u64>, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, optional_parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = Some(v);
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: ARBOR_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.data_dir, "ARBOR_COMMON_DATA_DIR");
    env_override!(config, common.log_level, "ARBOR_COMMON_LOG_LEVEL");
    env_override!(config, common.seed, "ARBOR_COMMON_SEED", optional_parse);

    // Search
    env_override!(
        config,
        search.dilution_limit,
        "ARBOR_SEARCH_DILUTION_LIMIT",
        parse
    );
    env_override!(config, search.rollouts, "ARBOR_SEARCH_ROLLOUTS", parse);
    env_override!(
        config,
        search.rollout_depth,
        "ARBOR_SEARCH_ROLLOUT_DEPTH",
        parse
    );
    env_override!(config, search.max_depth, "ARBOR_SEARCH_MAX_DEPTH", parse);
    env_override!(
        config,
        search.greedy_mobility,
        "ARBOR_SEARCH_GREEDY_MOBILITY",
        parse
    );

    // Training
    env_override!(
        config,
        training.iterations,
        "ARBOR_TRAINING_ITERATIONS",
        parse
    );
    env_override!(
        config,
        training.extended_features,
        "ARBOR_TRAINING_EXTENDED_FEATURES",
        parse
    );
    env_override!(config, training.max_trees, "ARBOR_TRAINING_MAX_TREES", parse);
    env_override!(config, training.max_depth, "ARBOR_TRAINING_MAX_DEPTH", parse);
    env_override!(
        config,
        training.min_leaf_size,
        "ARBOR_TRAINING_MIN_LEAF_SIZE",
        parse
    );
    env_override!(
        config,
        training.learning_rate,
        "ARBOR_TRAINING_LEARNING_RATE",
        parse
    );
    env_override!(config, training.l2_decay, "ARBOR_TRAINING_L2_DECAY", parse);
    env_override!(config, training.patience, "ARBOR_TRAINING_PATIENCE", parse);
    env_override!(
        config,
        training.validation_fraction,
        "ARBOR_TRAINING_VALIDATION_FRACTION",
        parse
    );
    env_override!(
        config,
        training.blend_static_eval,
        "ARBOR_TRAINING_BLEND_STATIC_EVAL",
        parse
    );

    // Self-play
    env_override!(
        config,
        selfplay.games_per_iteration,
        "ARBOR_SELFPLAY_GAMES_PER_ITERATION",
        parse
    );
    env_override!(
        config,
        selfplay.quiet_ply_limit,
        "ARBOR_SELFPLAY_QUIET_PLY_LIMIT",
        parse
    );
    env_override!(
        config,
        selfplay.max_game_plies,
        "ARBOR_SELFPLAY_MAX_GAME_PLIES",
        parse
    );
    env_override!(config, selfplay.augment, "ARBOR_SELFPLAY_AUGMENT", parse);
    env_override!(
        config,
        selfplay.channel_capacity,
        "ARBOR_SELFPLAY_CHANNEL_CAPACITY",
        parse
    );
    env_override!(config, selfplay.progress, "ARBOR_SELFPLAY_PROGRESS", parse);

    // Evaluation
    env_override!(
        config,
        evaluation.interval,
        "ARBOR_EVALUATION_INTERVAL",
        parse
    );
    env_override!(config, evaluation.games, "ARBOR_EVALUATION_GAMES", parse);

    config
}
