//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared
//! across the workspace.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Environment variables (`ARBOR_<SECTION>_<KEY>`)
//! 2. config.toml file
//! 3. Built-in defaults (config.defaults.toml, embedded at compile time)
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! ARBOR_<SECTION>_<KEY>=value
//!
//! Examples:
//!     ARBOR_COMMON_DATA_DIR=/data
//!     ARBOR_COMMON_SEED=42
//!     ARBOR_SEARCH_DILUTION_LIMIT=512
//!     ARBOR_TRAINING_ITERATIONS=50
//!     ARBOR_SELFPLAY_GAMES_PER_ITERATION=32
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;

#[cfg(test)]
mod tests;
