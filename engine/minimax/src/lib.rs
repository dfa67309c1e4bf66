//! Budgeted minimax search over deduplicated position graphs.
//!
//! This crate provides a game-agnostic search engine that works with any
//! position implementing the `engine-core` `Position` trait.
//!
//! # Overview
//!
//! Instead of a fixed-depth tree, the engine grows a graph under a
//! *dilution budget*: every root move starts with the same credit, and each
//! expanded node divides its credit evenly among its legal moves. Forcing
//! lines with few replies are therefore searched deeper than wide, quiet
//! positions. Positions reached by several move orders share one node
//! (transpositions), so the structure is a DAG with parent lists.
//!
//! After expansion a number of greedy rollouts extend single lines from the
//! root. The graph is then resolved bottom-up: leaves are scored by the
//! [`Evaluator`], decided positions keep ±inf (or 0 for draws), and scores
//! flow to parents in topological order.
//!
//! # Usage
//!
//! ```rust
//! use minimax::{MinimaxEngine, SearchConfig, StaticEvaluator};
//! use games_connect4::State;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let engine = MinimaxEngine::new(SearchConfig::for_testing(), StaticEvaluator);
//! let mut rng = ChaCha20Rng::seed_from_u64(42);
//! let result = engine.search(&State::new(), &mut rng).unwrap();
//! println!("Best move: {:?} ({} nodes)", result.mv, result.stats.nodes);
//! ```
//!
//! # Configuration
//!
//! The [`SearchConfig`] struct controls search size:
//!
//! - `dilution_limit`: expansion credit per root move (default: 256)
//! - `rollouts`: greedy rollouts per search (default: 64)
//! - `rollout_depth`: new plies per rollout (default: 5)
//! - `max_depth`: hard expansion depth cap (default: 64)
//!
//! # Score convention
//!
//! Scores are White-positive. A node whose children are still unsolved
//! starts at -inf with White to move and +inf with Black to move; each
//! finalized child is merged into its parents with `max` when the child has
//! Black to move and `min` otherwise.

pub mod config;
pub mod evaluator;
pub mod graph;
pub mod node;
pub mod policy;
mod rollout;
pub mod search;

// Re-export main types
pub use config::SearchConfig;
pub use evaluator::{Evaluator, StaticEvaluator, SumEvaluator};
pub use graph::{ExplorationGraph, GraphStats, ResolveStats};
pub use node::{ExplorationNode, NodeId};
pub use policy::{GreedyPolicy, Policy, RandomPolicy};
pub use search::{MinimaxEngine, SearchError, SearchResult, SearchStats};
