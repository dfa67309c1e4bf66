//! Core traits and types for the arbor engine
//!
//! This crate provides the abstractions the search and training crates are
//! written against:
//! - `Position`: the position oracle (legal moves, move application, terminal
//!   classification, static balance, symmetries)
//! - `FeatureCodec`: position to sorted sparse feature indices
//! - `Side` / `Conclusion`: who is to move and how a game ended
//!
//! Concrete games live in their own crates (see `games-connect4`).

pub mod codec;
pub mod game_utils;
pub mod position;

pub use codec::{is_strictly_ascending, FeatureCodec};
pub use game_utils::{outcome_value, terminal_score};
pub use position::{Conclusion, Position, Side, Symmetry};
