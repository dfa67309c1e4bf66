//! Budgeted minimax search implementation.
//!
//! One call to [`MinimaxEngine::search`] runs four phases over a fresh graph:
//! 1. Expansion: every root move is expanded with the full dilution budget,
//!    each node splitting its budget evenly among its moves
//! 2. Rollouts: greedy lines from the root add sparse deep coverage
//! 3. Resolution: leaves are evaluated and scores propagated to the root
//! 4. Selection: the best root move for the side to move, ties broken at random

use std::time::Instant;

use engine_core::Position;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::SearchConfig;
use crate::evaluator::Evaluator;
use crate::graph::ExplorationGraph;
use crate::node::NodeId;
use crate::policy::{GreedyPolicy, Policy};
use crate::rollout::run_rollouts;

/// Internal invariant violations raised during search. None of these are
/// retried; they indicate a broken position oracle or a search bug.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Non-terminal node {node} has no legal moves")]
    NonTerminalWithoutMoves { node: u32 },

    #[error("Cyclic dependency in minimax graph ({unresolved} nodes unresolved)")]
    CyclicDependency { unresolved: usize },

    #[error("Node {child} has the same side to move as its parent {parent}")]
    DoubleTurn { parent: u32, child: u32 },

    #[error("Move selection produced no candidates")]
    EmptyCandidates,
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchResult<M> {
    /// Move to play
    pub mv: M,

    /// Resolved score of the chosen move from the mover's point of view
    /// (higher is better). `None` when the only legal move was returned
    /// without searching.
    pub score: Option<f64>,

    pub stats: SearchStats,
}

/// Counters describing one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    pub nodes: usize,
    pub terminal_nodes: usize,
    pub evaluations: usize,
    pub rollout_nodes: usize,
    pub requeues: usize,
    pub root_moves: usize,
    pub candidates: usize,
    pub elapsed_us: u64,
}

/// Dilution-budgeted minimax engine over a pluggable evaluator.
#[derive(Debug, Clone)]
pub struct MinimaxEngine<E> {
    config: SearchConfig,
    evaluator: E,
    rollout_policy: GreedyPolicy,
}

impl<E> MinimaxEngine<E> {
    pub fn new(config: SearchConfig, evaluator: E) -> Self {
        Self {
            config,
            evaluator,
            rollout_policy: GreedyPolicy::new(),
        }
    }

    /// Builder pattern: set the policy followed by rollouts.
    pub fn with_rollout_policy(mut self, policy: GreedyPolicy) -> Self {
        self.rollout_policy = policy;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Pick a move for the side to move in `position`.
    pub fn choose_move<P>(&self, position: &P, rng: &mut ChaCha20Rng) -> Result<P::Move, SearchError>
    where
        P: Position,
        E: Evaluator<P>,
    {
        self.search(position, rng).map(|result| result.mv)
    }

    /// Run a full search and return the chosen move with statistics.
    pub fn search<P>(
        &self,
        position: &P,
        rng: &mut ChaCha20Rng,
    ) -> Result<SearchResult<P::Move>, SearchError>
    where
        P: Position,
        E: Evaluator<P>,
    {
        let start = Instant::now();

        let mut moves = position.legal_moves();
        match moves.len() {
            0 => return Err(SearchError::NoLegalMoves),
            1 => {
                return Ok(SearchResult {
                    mv: moves[0],
                    score: None,
                    stats: SearchStats {
                        root_moves: 1,
                        candidates: 1,
                        ..SearchStats::default()
                    },
                })
            }
            _ => {}
        }
        moves.shuffle(rng);

        let mut graph = ExplorationGraph::new(position.clone());
        let root = graph.root();
        {
            let root_node = graph.get_mut(root);
            root_node.moves = Some(moves.clone());
            root_node.dilution = self.config.dilution_limit;
        }

        let mut root_children = Vec::with_capacity(moves.len());
        {
            let mut expansion = Expansion {
                graph: &mut graph,
                path: vec![root],
                max_depth: self.config.max_depth,
                rng: &mut *rng,
            };
            for &mv in &moves {
                let child = expansion.expand(position.apply(mv), root, self.config.dilution_limit, 0)?;
                root_children.push((mv, child));
            }
        }
        let expanded = graph.len();

        let rollout_nodes = run_rollouts(&mut graph, &self.rollout_policy, &self.config, rng)?;
        let resolve = graph.resolve(&self.evaluator)?;

        let sign = position.side_to_move().sign();
        let mut best = f64::NEG_INFINITY;
        let mut candidates = Vec::with_capacity(root_children.len());
        for &(mv, child) in &root_children {
            let score = graph.get(child).score * sign;
            if score > best {
                best = score;
                candidates.clear();
            }
            if score >= best {
                candidates.push(mv);
            }
        }
        if candidates.is_empty() {
            return Err(SearchError::EmptyCandidates);
        }
        let mv = candidates[rng.gen_range(0..candidates.len())];

        let graph_stats = graph.stats();
        let stats = SearchStats {
            nodes: graph_stats.total_nodes,
            terminal_nodes: graph_stats.terminal_nodes,
            evaluations: resolve.evaluations,
            rollout_nodes,
            requeues: resolve.requeues,
            root_moves: root_children.len(),
            candidates: candidates.len(),
            elapsed_us: start.elapsed().as_micros() as u64,
        };

        debug!(
            nodes = stats.nodes,
            expanded,
            rollout_nodes,
            evaluations = stats.evaluations,
            candidates = stats.candidates,
            score = best,
            elapsed_us = stats.elapsed_us,
            "Search complete"
        );

        Ok(SearchResult {
            mv,
            score: Some(best),
            stats,
        })
    }
}

impl<P, E> Policy<P> for MinimaxEngine<E>
where
    P: Position,
    E: Evaluator<P>,
{
    fn select_move(&self, position: &P, rng: &mut ChaCha20Rng) -> Result<P::Move, SearchError> {
        self.choose_move(position, rng)
    }
}

/// Recursive expansion state for one search.
struct Expansion<'a, P: Position> {
    graph: &'a mut ExplorationGraph<P>,
    /// Nodes on the current expansion path, root first
    path: Vec<NodeId>,
    max_depth: u32,
    rng: &'a mut ChaCha20Rng,
}

impl<P: Position> Expansion<'_, P> {
    /// Expand `position` as a child of `parent` with the given budget.
    ///
    /// Returns the node holding `position`, whether or not it was expanded.
    fn expand(
        &mut self,
        position: P,
        parent: NodeId,
        dilution: f64,
        depth: u32,
    ) -> Result<NodeId, SearchError> {
        let id = match self.graph.lookup(&position) {
            Some(id) => {
                if self.path.contains(&id) || self.graph.is_ancestor_or_self(id, parent) {
                    return Ok(id);
                }
                self.graph.link(id, parent);

                let node = self.graph.get(id);
                if node.is_terminal || node.dilution >= dilution {
                    return Ok(id);
                }
                trace!(node = id.0, old = node.dilution, new = dilution, "Re-expanding transposition");
                id
            }
            None => {
                let (id, _) = self.graph.insert(position);
                self.graph.link(id, parent);
                if self.graph.get(id).is_terminal {
                    return Ok(id);
                }
                id
            }
        };

        self.graph.get_mut(id).dilution = dilution;
        let moves = self.moves_of(id);
        if moves.is_empty() {
            return Err(SearchError::NonTerminalWithoutMoves { node: id.0 });
        }

        let budget = dilution / moves.len() as f64;
        if budget < 1.0 || depth >= self.max_depth {
            return Ok(id);
        }

        let position = self.graph.get(id).position.clone();
        self.path.push(id);
        for mv in moves {
            self.expand(position.apply(mv), id, budget, depth + 1)?;
        }
        self.path.pop();

        Ok(id)
    }

    /// Legal moves of a node, materialized once in a shuffled order.
    fn moves_of(&mut self, id: NodeId) -> Vec<P::Move> {
        let node = self.graph.get_mut(id);
        if let Some(moves) = &node.moves {
            return moves.clone();
        }
        let mut moves = node.position.legal_moves();
        moves.shuffle(&mut *self.rng);
        node.moves = Some(moves.clone());
        moves
    }
}
