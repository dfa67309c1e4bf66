//! Exploration graph node representation.
//!
//! Each node is one position (side to move included) reached during a single
//! move decision. Transpositions and rollouts can reach a position from
//! several parents, so nodes keep a parent list instead of a single parent.

use engine_core::{terminal_score, Position, Side};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the exploration graph.
#[derive(Debug, Clone)]
pub struct ExplorationNode<P: Position> {
    /// Position at this node
    pub position: P,

    /// Side to move, cached from `position`
    pub side: Side,

    /// White-positive score. Fixed at ±inf or 0 for terminals, otherwise
    /// assigned during resolution.
    pub score: f64,

    /// Largest expansion credit this node has been expanded with
    pub dilution: f64,

    /// Legal moves in the randomized order used for expansion.
    /// `None` until the node is first expanded.
    pub moves: Option<Vec<P::Move>>,

    /// Terminal nodes keep their fixed score and are never evaluated
    pub is_terminal: bool,

    /// Child relations not yet backed up during resolution
    pub unsolved_children: u32,

    /// Distinct parents, in discovery order
    pub parents: Vec<NodeId>,
}

impl<P: Position> ExplorationNode<P> {
    /// Create a node and classify its position.
    pub fn new(position: P) -> Self {
        let side = position.side_to_move();
        let fixed = terminal_score(position.conclusion());
        Self {
            position,
            side,
            score: fixed.unwrap_or(0.0),
            dilution: 0.0,
            moves: None,
            is_terminal: fixed.is_some(),
            unsolved_children: 0,
            parents: Vec::new(),
        }
    }

    /// Record `parent` unless it is already present. Returns true if added.
    pub fn add_parent(&mut self, parent: NodeId) -> bool {
        if self.parents.contains(&parent) {
            return false;
        }
        self.parents.push(parent);
        true
    }

    /// Whether expansion has materialized the move list.
    #[inline]
    pub fn has_moves(&self) -> bool {
        self.moves.is_some()
    }
}
