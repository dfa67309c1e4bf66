//! Tests for the configuration module.

use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.data_dir, "./data");
    assert_eq!(config.common.log_level, "info");
    assert!(config.common.seed.is_none());
    assert_eq!(config.selfplay.games_per_iteration, 16);
    assert_eq!(config.evaluation.interval, 5);
}

#[test]
fn test_search_defaults() {
    let config = CentralConfig::default();
    assert!((config.search.dilution_limit - 256.0).abs() < f64::EPSILON);
    assert_eq!(config.search.rollouts, 64);
    assert_eq!(config.search.rollout_depth, 5);
    assert_eq!(config.search.max_depth, 64);
    assert!(!config.search.greedy_mobility);
}

#[test]
fn test_training_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.training.iterations, 100);
    assert!(config.training.extended_features);
    assert_eq!(config.training.max_trees, 8);
    assert_eq!(config.training.max_depth, 4);
    assert_eq!(config.training.min_leaf_size, 16);
    assert!((config.training.learning_rate - 0.5).abs() < f64::EPSILON);
    assert!((config.training.l2_decay - 1.0).abs() < f64::EPSILON);
    assert_eq!(config.training.patience, 2);
    assert!((config.training.validation_fraction - 0.1).abs() < f64::EPSILON);
    assert!(config.training.blend_static_eval);
}

#[test]
fn test_selfplay_defaults() {
    let config = CentralConfig::default();
    assert_eq!(config.selfplay.quiet_ply_limit, 50);
    assert_eq!(config.selfplay.max_game_plies, 512);
    assert!(config.selfplay.augment);
    assert_eq!(config.selfplay.channel_capacity, 1024);
}

// Each env test touches its own keys so parallel tests don't interfere.

#[test]
fn test_arbor_env_overrides() {
    std::env::set_var("ARBOR_COMMON_DATA_DIR", "/tmp/arbor-data");
    std::env::set_var("ARBOR_SEARCH_ROLLOUTS", "7");
    std::env::set_var("ARBOR_TRAINING_L2_DECAY", "0.5");

    let config = load_config();
    assert_eq!(config.common.data_dir, "/tmp/arbor-data");
    assert_eq!(config.search.rollouts, 7);
    assert!((config.training.l2_decay - 0.5).abs() < f64::EPSILON);

    std::env::remove_var("ARBOR_COMMON_DATA_DIR");
    std::env::remove_var("ARBOR_SEARCH_ROLLOUTS");
    std::env::remove_var("ARBOR_TRAINING_L2_DECAY");
}

#[test]
fn test_optional_and_bool_env_overrides() {
    std::env::set_var("ARBOR_COMMON_SEED", "1234");
    std::env::set_var("ARBOR_SELFPLAY_AUGMENT", "false");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.common.seed, Some(1234));
    assert!(!config.selfplay.augment);

    std::env::remove_var("ARBOR_COMMON_SEED");
    std::env::remove_var("ARBOR_SELFPLAY_AUGMENT");
}

#[test]
fn test_unparseable_env_override_is_ignored() {
    std::env::set_var("ARBOR_EVALUATION_GAMES", "many");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.evaluation.games, 20);

    std::env::remove_var("ARBOR_EVALUATION_GAMES");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
data_dir = "/custom/data"
seed = 99

[search]
dilution_limit = 1024.0
rollouts = 0

[training]
iterations = 50
max_trees = 32
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.data_dir, "/custom/data");
    assert_eq!(config.common.seed, Some(99));
    assert!((config.search.dilution_limit - 1024.0).abs() < f64::EPSILON);
    assert_eq!(config.search.rollouts, 0);
    assert_eq!(config.training.iterations, 50);
    assert_eq!(config.training.max_trees, 32);
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[selfplay]
games_per_iteration = 4
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.selfplay.games_per_iteration, 4);
    assert_eq!(config.selfplay.quiet_ply_limit, 50); // Default
    assert_eq!(config.common.data_dir, "./data"); // Default
    assert_eq!(config.search.rollout_depth, 5); // Default
}

#[test]
fn test_load_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[evaluation]\ninterval = 2\ngames = 8").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.evaluation.interval, 2);
    assert_eq!(config.evaluation.games, 8);
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[training\niterations = ").unwrap();

    let config = load_from_path(file.path());
    assert_eq!(config.training.max_depth, 4);
}

#[test]
fn test_config_clone() {
    let config = CentralConfig::default();
    let cloned = config.clone();
    assert_eq!(config.common.data_dir, cloned.common.data_dir);
    assert_eq!(config.search.max_depth, cloned.search.max_depth);
}
